/*!
 * Prompt templates for spreadsheet localization.
 *
 * The conversation is a fixed set of system messages followed by one user
 * message carrying the JSON translation request.
 */

use crate::translation::model::{GameContext, TranslationRequest};

/// System prompt template for key translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Role of the assistant.
    pub const TRANSLATOR_ROLE: &'static str = "You are a helpful assistant tasked with translating {source_language} \
localization keys into specified language codes for a video game. \
Your translations should be accurate and context-appropriate.";

    /// Shape of the expected answer.
    pub const RESPONSE_FORMAT: &'static str = r#"Respond with a JSON object in the format {"languageCode": {"key":"translatedValue", ...}}. Only use the language codes listed in languagesToRetrieve. Ensure the JSON object is minified."#;

    /// How to report keys that cannot be translated.
    pub const MISSING_SECTION: &'static str = r#"If unable to translate a key, include it in a "missing" section like this: "missing":[{"key":"originalKey", "languageCode":"languageCode", "reason":"explanation"}]. Provide a reason for each untranslated key."#;

    /// Shape of the incoming request.
    pub const REQUEST_FORMAT: &'static str = r#"Expect translation requests in JSON format: {"key":"localizationKey", "{source_language}":"sourceText", "context":"contextForTheText", "languagesToRetrieve":["languageCode1", ...], "featureNames": {"featureKey":{"languageCode":"Feature Translation", ...}}, "category":"sheetName"}. Translate the {source_language} text into the requested languages. The context and category, when present, describe where the text is shown."#;

    /// How to use the feature glossary.
    pub const FEATURE_NAMES: &'static str = r#"The featureNames variable contains translations for feature names in the format {"featureKey":{"languageCode":"Feature Translation", ..., "context":"usage note"}}. Always use the provided translations for feature names in the appropriate language if the text contains any feature name."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template for a source language.
    pub fn render(&self, source_language: &str) -> String {
        self.template.replace("{source_language}", source_language)
    }
}

/// Builds the messages sent to a chat provider.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder<'a> {
    request: &'a TranslationRequest,
    game_context: Option<&'a GameContext>,
}

impl<'a> TranslationPromptBuilder<'a> {
    /// Create a new prompt builder.
    pub fn new(request: &'a TranslationRequest) -> Self {
        Self {
            request,
            game_context: None,
        }
    }

    /// Attach the run-wide game context.
    pub fn with_game_context(mut self, game_context: Option<&'a GameContext>) -> Self {
        self.game_context = game_context;
        self
    }

    /// System messages, in order.
    pub fn system_messages(&self) -> Vec<String> {
        let source = self.request.source_language.as_str();
        let mut messages = vec![PromptTemplate::new(PromptTemplate::TRANSLATOR_ROLE).render(source)];

        if let Some(description) = self
            .game_context
            .map(|c| c.description.trim())
            .filter(|d| !d.is_empty())
        {
            messages.push(description.to_string());
        }

        messages.push(PromptTemplate::RESPONSE_FORMAT.to_string());
        messages.push(PromptTemplate::MISSING_SECTION.to_string());
        messages.push(PromptTemplate::new(PromptTemplate::REQUEST_FORMAT).render(source));
        messages.push(PromptTemplate::FEATURE_NAMES.to_string());
        messages
    }

    /// System messages joined into one prompt, for providers with a single system field.
    pub fn system_prompt(&self) -> String {
        self.system_messages().join("\n\n")
    }

    /// The user message: the minified JSON request.
    pub fn user_message(&self) -> String {
        self.request.payload(self.game_context).to_string()
    }
}
