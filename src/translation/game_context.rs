/*!
 * Game context builder.
 *
 * The context document holds two sheets:
 * - a game-context sheet whose first-column cells, joined by newlines, form
 *   the free-text description given to the provider;
 * - a feature sheet with a key column, one column per language (`[xx]`
 *   labels) and an optional `context` column, giving the localized names of
 *   game features.
 */

use log::{debug, info};
use std::collections::BTreeMap;

use crate::errors::{ScanError, TranslationError};
use crate::language_utils::language_code;
use crate::table::{SheetId, Table, Workbook};

use super::model::{FeatureLocalization, GameContext};
use super::scanner::is_key_label;

/// Builds a `GameContext` from a context document
#[derive(Debug)]
pub struct GameContextBuilder<'a> {
    workbook: &'a dyn Workbook,
    feature_sheet: Option<SheetId>,
    context_sheet: Option<SheetId>,
}

impl<'a> GameContextBuilder<'a> {
    pub fn new(workbook: &'a dyn Workbook) -> Self {
        Self {
            workbook,
            feature_sheet: None,
            context_sheet: None,
        }
    }

    /// Sheet holding the feature names
    pub fn feature_sheet(mut self, sheet_id: Option<SheetId>) -> Self {
        self.feature_sheet = sheet_id;
        self
    }

    /// Sheet holding the game description
    pub fn context_sheet(mut self, sheet_id: Option<SheetId>) -> Self {
        self.context_sheet = sheet_id;
        self
    }

    /// Load both sheets; an unset sheet leaves its part empty
    pub async fn build(&self) -> Result<GameContext, TranslationError> {
        let description = match self.context_sheet {
            Some(id) => read_description(self.workbook.open_sheet(id).await?.as_ref()),
            None => String::new(),
        };

        let features = match self.feature_sheet {
            Some(id) => read_features(self.workbook.open_sheet(id).await?.as_ref())?,
            None => BTreeMap::new(),
        };

        info!(
            "Game context from {}: {} description line(s), {} feature(s)",
            self.workbook.document_id(),
            description.lines().count(),
            features.len()
        );

        Ok(GameContext { description, features })
    }
}

/// Non-empty first-column cells, joined by newlines
pub fn read_description(table: &dyn Table) -> String {
    (0..table.row_count())
        .filter_map(|row| table.cell(row, 0).and_then(|c| c.text().map(str::to_string)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Feature key to localized names, from a feature sheet
pub fn read_features(table: &dyn Table) -> Result<BTreeMap<String, FeatureLocalization>, ScanError> {
    let header = table.header_row();
    if header.is_empty() {
        return Err(ScanError::EmptyHeader(table.title()));
    }

    let key_column = header
        .iter()
        .position(|l| is_key_label(l))
        .ok_or_else(|| ScanError::MissingKeyColumn { sheet: table.title() })?;
    let context_column = header.iter().position(|l| l.trim().eq_ignore_ascii_case("context"));
    let language_columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != key_column)
        .map(|(i, l)| (i, language_code(l)))
        .filter(|(_, code)| !code.is_empty())
        .collect();

    let text_at = |row: usize, col: usize| table.cell(row, col).and_then(|c| c.text().map(str::to_string));

    let mut features = BTreeMap::new();
    for row in 1..table.row_count() {
        let Some(key) = text_at(row, key_column) else {
            continue;
        };

        let names: BTreeMap<String, String> = language_columns
            .iter()
            .filter_map(|(col, code)| text_at(row, *col).map(|name| (code.clone(), name)))
            .collect();
        if names.is_empty() {
            debug!("Feature '{}' has no localized name, skipped", key);
            continue;
        }

        let context = context_column.and_then(|col| text_at(row, col));
        features.entry(key).or_insert(FeatureLocalization { names, context });
    }

    Ok(features)
}
