/*!
 * Result merger: writes provider output back into the sheet.
 *
 * Only the languages requested by the work item are written, at the column
 * the header assigns to each code. Languages the provider reported as
 * missing, or silently left out, are logged and returned as unresolved.
 */

use log::{debug, warn};

use crate::language_utils::{codes_match, describe};
use crate::table::{CellStyle, Table};

use super::model::{TranslationResult, WorkItem};
use super::scanner::HeaderLayout;

/// Reason used when a requested language is absent from the response
pub const NOT_RETURNED_REASON: &str = "not returned by provider";

/// A requested translation that was not written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedTranslation {
    pub key: String,
    pub language_code: String,
    pub row_index: usize,
    pub source_text: String,
    pub reason: String,
}

/// What a merge wrote and what it could not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Language codes written, in header order
    pub written: Vec<String>,
    pub unresolved: Vec<UnresolvedTranslation>,
}

/// Maps a translation result onto the cells of one sheet
#[derive(Debug)]
pub struct ResultMerger<'a> {
    table: &'a dyn Table,
    layout: &'a HeaderLayout,
    style: Option<CellStyle>,
}

impl<'a> ResultMerger<'a> {
    /// Create a merger; `style` is applied to every written cell
    pub fn new(table: &'a dyn Table, layout: &'a HeaderLayout, style: Option<CellStyle>) -> Self {
        Self { table, layout, style }
    }

    /// Write the translations of `result` for `item`
    pub fn merge(&self, item: &WorkItem, result: &TranslationResult) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for entry in result.missing.iter().filter(|m| m.key != item.key) {
            warn!(
                "Provider reported unrelated missing key '{}' ({}) while translating '{}': {}",
                entry.key,
                entry.language_code.as_deref().unwrap_or("all languages"),
                item.key,
                entry.reason
            );
        }

        for entry in result.missing.iter().filter(|m| m.key == item.key) {
            if let Some(code) = entry.language_code.as_deref() {
                if !item.target_language_codes.iter().any(|c| codes_match(c, code)) {
                    debug!(
                        "Provider reported unrequested language '{}' missing for '{}': {}",
                        code, item.key, entry.reason
                    );
                }
            }
        }

        for column in &self.layout.language_columns {
            if !item.target_language_codes.iter().any(|c| codes_match(c, &column.code)) {
                continue;
            }

            let text = result.get(&column.code, &item.key).filter(|t| !t.trim().is_empty());
            if let Some(text) = text {
                self.table.set_cell(item.row_index, column.index, text, self.style);
                debug!("'{}' {} -> row {}, column {}", item.key, describe(&column.code), item.row_index, column.index);
                outcome.written.push(column.code.clone());
                continue;
            }

            let reason = result
                .missing
                .iter()
                .find(|m| {
                    m.key == item.key
                        && m.language_code.as_deref().is_none_or(|code| codes_match(code, &column.code))
                })
                .map(|m| m.reason.clone())
                .unwrap_or_else(|| NOT_RETURNED_REASON.to_string());

            warn!(
                "Missing translation for '{}' in {}: {}",
                item.key,
                describe(&column.code),
                reason
            );
            outcome.unresolved.push(UnresolvedTranslation {
                key: item.key.clone(),
                language_code: column.code.clone(),
                row_index: item.row_index,
                source_text: item.source_text.clone(),
                reason,
            });
        }

        outcome
    }
}
