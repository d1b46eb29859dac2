/*!
 * Data exchanged between the scanner, the providers and the merger.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::ProviderError;
use crate::language_utils::codes_match;

/// A row with one or more missing translations, before batching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCandidate {
    pub key: String,
    pub source_text: String,
    /// Missing language codes, in header order
    pub missing_language_codes: Vec<String>,
    /// Note attached to the key cell
    pub context: Option<String>,
    pub row_index: usize,
    /// Sheet title
    pub category: Option<String>,
}

/// One unit of provider work: a key and a subset of its missing languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub key: String,
    pub source_text: String,
    pub target_language_codes: Vec<String>,
    pub context: Option<String>,
    pub row_index: usize,
    pub category: Option<String>,
}

impl WorkItem {
    /// Short label for logs, e.g. `greet[es,fr]`
    pub fn label(&self) -> String {
        format!("{}[{}]", self.key, self.target_language_codes.join(","))
    }
}

/// Localized names of one game feature, plus an optional usage note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLocalization {
    /// Language code to feature name
    #[serde(flatten)]
    pub names: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Run-wide context steering every translation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub description: String,
    pub features: BTreeMap<String, FeatureLocalization>,
}

impl GameContext {
    pub fn is_empty(&self) -> bool {
        self.description.trim().is_empty() && self.features.is_empty()
    }
}

/// What is sent to a provider for one work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub key: String,
    /// Code of the source language; names the field carrying the source text
    pub source_language: String,
    pub source_text: String,
    pub context: Option<String>,
    pub languages_to_retrieve: Vec<String>,
    pub category: Option<String>,
}

impl TranslationRequest {
    pub fn from_item(item: &WorkItem, source_language: &str) -> Self {
        Self {
            key: item.key.clone(),
            source_language: source_language.to_string(),
            source_text: item.source_text.clone(),
            context: item.context.clone(),
            languages_to_retrieve: item.target_language_codes.clone(),
            category: item.category.clone(),
        }
    }

    /// JSON payload of the user message:
    /// `{key, <source>: text, context, languagesToRetrieve, featureNames, category?}`
    pub fn payload(&self, game_context: Option<&GameContext>) -> Value {
        let mut map = Map::new();
        map.insert("key".to_string(), Value::String(self.key.clone()));
        map.insert(self.source_language.clone(), Value::String(self.source_text.clone()));
        map.insert(
            "context".to_string(),
            self.context.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert(
            "languagesToRetrieve".to_string(),
            Value::Array(self.languages_to_retrieve.iter().cloned().map(Value::String).collect()),
        );
        let features = game_context
            .and_then(|c| serde_json::to_value(&c.features).ok())
            .unwrap_or_else(|| Value::Object(Map::new()));
        map.insert("featureNames".to_string(), features);
        if let Some(category) = &self.category {
            map.insert("category".to_string(), Value::String(category.clone()));
        }
        Value::Object(map)
    }
}

/// A translation the provider declined to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingTranslation {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default = "default_missing_reason")]
    pub reason: String,
}

fn default_missing_reason() -> String {
    "no reason given".to_string()
}

/// Validated provider output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationResult {
    /// Language code to (key to translated text)
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
    pub missing: Vec<MissingTranslation>,
}

impl TranslationResult {
    /// Translated text for a key in one language
    pub fn get(&self, language_code: &str, key: &str) -> Option<&str> {
        self.translations.get(language_code)?.get(key).map(String::as_str)
    }

    /// Parse and validate a raw provider response
    ///
    /// The response must be a JSON object whose members are requested
    /// language codes (each an object of key to string or null) and an
    /// optional `missing` array. Anything else is a parse error.
    pub fn parse(raw: &str, request: &TranslationRequest) -> Result<Self, ProviderError> {
        let json = extract_json_object(raw)
            .ok_or_else(|| ProviderError::ParseError(format!("No JSON object in response: {}", raw)))?;

        let value: Value = serde_json::from_str(json)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, raw)))?;

        let Value::Object(members) = value else {
            return Err(ProviderError::ParseError(format!("Response is not a JSON object: {}", raw)));
        };

        let mut result = TranslationResult::default();
        for (name, member) in members {
            if name == "missing" {
                result.missing = serde_json::from_value(member)
                    .map_err(|e| ProviderError::ParseError(format!("Invalid 'missing' section: {}", e)))?;
                continue;
            }

            let Some(requested) = request
                .languages_to_retrieve
                .iter()
                .find(|code| codes_match(code, &name))
            else {
                return Err(ProviderError::ParseError(format!(
                    "Unrequested language '{}' in response (requested: {})",
                    name,
                    request.languages_to_retrieve.join(", ")
                )));
            };

            let Value::Object(entries) = member else {
                return Err(ProviderError::ParseError(format!("Language '{}' is not an object", name)));
            };

            let mut texts = BTreeMap::new();
            for (key, text) in entries {
                match text {
                    Value::String(text) => {
                        texts.insert(key, text);
                    }
                    Value::Null => {}
                    other => {
                        return Err(ProviderError::ParseError(format!(
                            "Translation of '{}' in '{}' is not a string: {}",
                            key, name, other
                        )));
                    }
                }
            }
            // Stored under the requested spelling so header lookups find it
            result.translations.insert(requested.clone(), texts);
        }

        Ok(result)
    }
}

/// Slice from the first `{` to the last `}`, dropping code fences or chatter
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}
