/*!
 * Tests for header parsing and missing-cell detection
 */

use sheet_translator::errors::{ScanError, TranslationError};
use sheet_translator::providers::mock::MockProvider;
use sheet_translator::table::Table;
use sheet_translator::table::memory::MemorySheet;
use sheet_translator::translation::{HeaderLayout, MissingTranslationScanner, TranslationService, WorkItem};
use std::sync::Arc;

use crate::common;

fn layout_of(sheet: &MemorySheet) -> HeaderLayout {
    HeaderLayout::parse(&sheet.header_row(), &sheet.title(), "en").unwrap()
}

#[test]
fn test_plan_withGreetRow_shouldYieldSingleSpanishItem() {
    let sheet = common::sheet(0, "UI", &[["greet", "Hello", "", "Bonjour"]]);
    let service = TranslationService::new(Arc::new(MockProvider::working()), common::settings(5));

    let plan = service.plan(&sheet).unwrap();

    assert_eq!(plan.candidates, 1);
    assert_eq!(plan.items.len(), 1);
    let item: &WorkItem = &plan.items[0];
    assert_eq!(item.key, "greet");
    assert_eq!(item.source_text, "Hello");
    assert_eq!(item.target_language_codes, vec!["es".to_string()]);
    assert_eq!(item.row_index, 1);
}

#[test]
fn test_scanner_withCompleteRows_shouldYieldNothing() {
    let sheet = common::sheet(
        0,
        "UI",
        &[["greet", "Hello", "Hola", "Bonjour"], ["bye", "Bye", "Adiós", "Au revoir"]],
    );
    let layout = layout_of(&sheet);

    assert_eq!(MissingTranslationScanner::new(&sheet, &layout).count(), 0);
}

#[test]
fn test_scanner_shouldSkipRowsWithoutKeyOrSource() {
    let sheet = common::sheet(
        0,
        "UI",
        &[
            ["", "Orphan text", "", ""],
            ["no_source", "", "", ""],
            ["", "", "", ""],
            ["ok", "Fine", "", ""],
        ],
    );
    let layout = layout_of(&sheet);

    let mut scanner = MissingTranslationScanner::new(&sheet, &layout);
    let candidates: Vec<_> = scanner.by_ref().collect();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].key, "ok");
    assert_eq!(candidates[0].row_index, 4);
    assert_eq!(candidates[0].missing_language_codes, vec!["es", "fr"]);
    assert_eq!(scanner.skipped_rows(), 3);
}

#[test]
fn test_scanner_shouldReadKeyNoteAsContextAndTitleAsCategory() {
    let sheet = common::sheet(0, "Shop", &[["jar_gift", "Gift jar", "", ""]]).with_note(1, 0, "Item in the shop");
    let layout = layout_of(&sheet);

    let candidate = MissingTranslationScanner::new(&sheet, &layout).next().unwrap();

    assert_eq!(candidate.context.as_deref(), Some("Item in the shop"));
    assert_eq!(candidate.category.as_deref(), Some("Shop"));
}

#[test]
fn test_scanner_withShortRow_shouldTreatMissingCellsAsEmpty() {
    let sheet = MemorySheet::from_values(
        0,
        "UI",
        vec![common::HEADER.to_vec(), vec!["short", "Short row"]],
    );
    let layout = layout_of(&sheet);

    let candidate = MissingTranslationScanner::new(&sheet, &layout).next().unwrap();

    assert_eq!(candidate.missing_language_codes, vec!["es", "fr"]);
}

#[test]
fn test_plan_withoutSourceColumn_shouldReturnScanError() {
    let sheet = MemorySheet::from_values(0, "Broken", vec![vec!["Key", "[es] Spanish"], vec!["greet", ""]]);
    let service = TranslationService::new(Arc::new(MockProvider::working()), common::settings(5));

    let result = service.plan(&sheet);

    assert!(matches!(
        result,
        Err(TranslationError::Scan(ScanError::MissingSourceColumn { .. }))
    ));
}

#[test]
fn test_headerLayout_shouldIgnoreNonLanguageColumns() {
    let labels: Vec<String> = ["Key", "Notes", "[en] English", "Max length", "[pt-BR] Portuguese"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let layout = HeaderLayout::parse(&labels, "UI", "en").unwrap();

    assert_eq!(layout.source_column, 2);
    assert_eq!(layout.language_columns.len(), 1);
    assert_eq!(layout.column_for("pt-br"), Some(4));
}
