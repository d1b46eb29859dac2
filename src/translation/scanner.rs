/*!
 * Missing-translation scanner.
 *
 * Reads the header row of a sheet to find the key column, the source
 * language column and every target language column, then walks the data
 * rows lazily and yields one candidate per row that has at least one empty
 * target cell.
 */

use log::{debug, info, warn};

use crate::errors::ScanError;
use crate::language_utils::{codes_match, describe, is_known_language, language_code};
use crate::table::Table;

use super::model::TranslationCandidate;

/// A target language column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageColumn {
    pub index: usize,
    pub code: String,
}

/// Column roles derived from a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    pub key_column: usize,
    pub source_column: usize,
    pub source_language: String,
    /// Target columns in header order, key and source excluded
    pub language_columns: Vec<LanguageColumn>,
}

/// Whether a label designates the key column
pub fn is_key_label(label: &str) -> bool {
    let label = label.trim();
    label.eq_ignore_ascii_case("key") || label.eq_ignore_ascii_case("keys")
}

impl HeaderLayout {
    /// Derive column roles from header labels
    ///
    /// # Arguments
    /// * `labels` - Header labels, up to the first empty one
    /// * `sheet` - Sheet title, for error messages
    /// * `source_language` - Code of the source column, matched case-insensitively
    pub fn parse(labels: &[String], sheet: &str, source_language: &str) -> Result<Self, ScanError> {
        if labels.is_empty() {
            return Err(ScanError::EmptyHeader(sheet.to_string()));
        }

        let key_column = labels
            .iter()
            .position(|l| is_key_label(l))
            .ok_or_else(|| ScanError::MissingKeyColumn { sheet: sheet.to_string() })?;

        let source_column = labels
            .iter()
            .enumerate()
            .position(|(i, l)| i != key_column && codes_match(&language_code(l), source_language))
            .ok_or_else(|| ScanError::MissingSourceColumn {
                sheet: sheet.to_string(),
                language: source_language.to_string(),
            })?;

        let mut language_columns: Vec<LanguageColumn> = Vec::new();
        for (index, label) in labels.iter().enumerate() {
            if index == key_column || index == source_column {
                continue;
            }
            let code = language_code(label);
            if code.is_empty() {
                continue;
            }
            if codes_match(&code, source_language) {
                warn!("Sheet '{}': column {} repeats the source language '{}', ignored", sheet, index, code);
                continue;
            }
            if let Some(first) = language_columns.iter().find(|c| codes_match(&c.code, &code)) {
                warn!(
                    "Sheet '{}': column {} repeats language '{}' already in column {}, ignored",
                    sheet, index, code, first.index
                );
                continue;
            }
            if !is_known_language(&code) {
                debug!("Sheet '{}': column {} has unrecognised language code '{}'", sheet, index, code);
            }
            language_columns.push(LanguageColumn { index, code });
        }

        info!(
            "Sheet '{}': key column {}, source column {} ({}), {} target language(s): {}",
            sheet,
            key_column,
            source_column,
            describe(source_language),
            language_columns.len(),
            language_columns.iter().map(|c| c.code.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            key_column,
            source_column,
            source_language: source_language.to_string(),
            language_columns,
        })
    }

    /// Column index of a target language code
    pub fn column_for(&self, code: &str) -> Option<usize> {
        self.language_columns
            .iter()
            .find(|c| codes_match(&c.code, code))
            .map(|c| c.index)
    }
}

/// Lazy iterator over the rows of a sheet that lack translations
pub struct MissingTranslationScanner<'a> {
    table: &'a dyn Table,
    layout: &'a HeaderLayout,
    category: Option<String>,
    next_row: usize,
    row_count: usize,
    skipped_rows: usize,
}

impl<'a> MissingTranslationScanner<'a> {
    pub fn new(table: &'a dyn Table, layout: &'a HeaderLayout) -> Self {
        Self {
            category: Some(table.title()).filter(|t| !t.is_empty()),
            row_count: table.row_count(),
            table,
            layout,
            next_row: 1,
            skipped_rows: 0,
        }
    }

    /// Rows skipped so far for lacking a key or a source text
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    fn text_at(&self, row: usize, col: usize) -> Option<String> {
        self.table.cell(row, col).and_then(|c| c.text().map(str::to_string))
    }

    fn scan_row(&mut self, row: usize) -> Option<TranslationCandidate> {
        let key = self.text_at(row, self.layout.key_column);
        let source = self.text_at(row, self.layout.source_column);

        let (key, source_text) = match (key, source) {
            (Some(key), Some(source)) => (key, source),
            (None, None) => {
                self.skipped_rows += 1;
                debug!("Row {}: empty, skipped", row);
                return None;
            }
            (Some(key), None) => {
                self.skipped_rows += 1;
                info!("Row {}: key '{}' has no source text, skipped", row, key);
                return None;
            }
            (None, Some(_)) => {
                self.skipped_rows += 1;
                info!("Row {}: source text without a key, skipped", row);
                return None;
            }
        };

        let missing_language_codes: Vec<String> = self
            .layout
            .language_columns
            .iter()
            .filter(|c| self.table.cell(row, c.index).is_none_or(|cell| cell.is_empty()))
            .map(|c| c.code.clone())
            .collect();

        if missing_language_codes.is_empty() {
            return None;
        }

        Some(TranslationCandidate {
            key,
            source_text,
            missing_language_codes,
            context: self.table.note(row, self.layout.key_column),
            row_index: row,
            category: self.category.clone(),
        })
    }
}

impl Iterator for MissingTranslationScanner<'_> {
    type Item = TranslationCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_row < self.row_count {
            let row = self.next_row;
            self.next_row += 1;
            if let Some(candidate) = self.scan_row(row) {
                return Some(candidate);
            }
        }
        None
    }
}
