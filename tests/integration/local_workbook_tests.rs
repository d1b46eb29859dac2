/*!
 * Runs against local JSON workbooks on disk
 */

use sheet_translator::app_controller::Controller;
use sheet_translator::database::Repository;
use sheet_translator::providers::mock::MockProvider;
use sheet_translator::table::SheetLocator;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common;

const STRINGS: &str = r#"{"sheets": [
    {"id": 0, "title": "UI", "rows": [
        ["Key", "[en] English", "[es] Spanish", "[fr] French"],
        [{"value": "greet", "note": "Title screen"}, "Hello", "", "Bonjour"],
        ["bye", "Goodbye", "Adiós", "Au revoir"]
    ]},
    {"id": 5, "title": "Shop", "rows": [
        ["Keys", "[en] English", "[de] German"],
        ["buy", "Buy", ""]
    ]}
]}"#;

const CONTEXT: &str = r#"{"sheets": [
    {"id": 1, "title": "Features", "rows": [
        ["Key", "[en] English", "[es] Spanish", "Context"],
        ["cash", "Cash", "Dinero", "Main currency"]
    ]},
    {"id": 2, "title": "Game", "rows": [
        ["A cozy farming game."],
        ["Tone: warm and playful."]
    ]}
]}"#;

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_run_localWorkbook_shouldRewriteFileWithTranslations() {
    let dir = TempDir::new().unwrap();
    let path = common::write_workbook(dir.path(), "strings.json", STRINGS).unwrap();
    let provider = MockProvider::working();
    let controller = Controller::with_provider(common::test_config(), Arc::new(provider.clone()))
        .with_journal_repository(Repository::new_in_memory().unwrap());

    let locator: SheetLocator = path.display().to_string().parse().unwrap();
    let report = controller.run(&locator).await.unwrap();

    assert_eq!(report.sheets.len(), 2);
    assert_eq!(report.counters().cells_written, 2);

    let saved = read_json(&path);
    let ui_rows = &saved["sheets"][0]["rows"];
    assert_eq!(ui_rows[1][2], "[es] Hello");
    assert_eq!(ui_rows[1][0]["note"], "Title screen");
    assert_eq!(ui_rows[2][2], "Adiós");
    assert_eq!(saved["sheets"][1]["rows"][1][2], "[de] Buy");
}

#[tokio::test(start_paused = true)]
async fn test_run_localWorkbookWithGid_shouldLeaveOtherSheetsAlone() {
    let dir = TempDir::new().unwrap();
    let path = common::write_workbook(dir.path(), "strings.json", STRINGS).unwrap();
    let provider = MockProvider::working();
    let controller = Controller::with_provider(common::test_config(), Arc::new(provider.clone()))
        .with_journal_repository(Repository::new_in_memory().unwrap());

    let locator: SheetLocator = format!("{}#gid=5", path.display()).parse().unwrap();
    controller.run(&locator).await.unwrap();

    let saved = read_json(&path);
    assert_eq!(saved["sheets"][0]["rows"][1][2], "");
    assert_eq!(saved["sheets"][1]["rows"][1][2], "[de] Buy");
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_withHighlight_shouldStoreBackgroundColor() {
    let dir = TempDir::new().unwrap();
    let path = common::write_workbook(dir.path(), "strings.json", STRINGS).unwrap();
    let mut config = common::test_config();
    config.sheets.highlight_translations = true;
    config.sheets.highlight_color = "#d9ead3".to_string();
    let controller = Controller::with_provider(config, Arc::new(MockProvider::working()))
        .with_journal_repository(Repository::new_in_memory().unwrap());

    let locator: SheetLocator = format!("{}#gid=0", path.display()).parse().unwrap();
    controller.run(&locator).await.unwrap();

    let cell = &read_json(&path)["sheets"][0]["rows"][1][2];
    assert_eq!(cell["value"], "[es] Hello");
    assert_eq!(cell["background"], "#d9ead3");
}

#[tokio::test]
async fn test_loadGameContext_fromLocalDocument_shouldReadBothSheets() {
    let dir = TempDir::new().unwrap();
    let context_path = common::write_workbook(dir.path(), "context.json", CONTEXT).unwrap();
    let mut config = common::test_config();
    config.context.document = Some(context_path.display().to_string());
    config.context.feature_sheet = Some(1);
    config.context.game_context_sheet = Some(2);
    let controller = Controller::with_provider(config, Arc::new(MockProvider::working()));

    let context = controller.load_game_context().await.unwrap();

    assert_eq!(context.description, "A cozy farming game.\nTone: warm and playful.");
    assert_eq!(context.features["cash"].names["es"], "Dinero");
    assert_eq!(context.features["cash"].context.as_deref(), Some("Main currency"));
}

#[tokio::test]
async fn test_loadGameContext_missingDocument_shouldRunWithoutContext() {
    let dir = TempDir::new().unwrap();
    let mut config = common::test_config();
    config.context.document = Some(dir.path().join("absent.json").display().to_string());
    config.context.game_context_sheet = Some(2);
    let controller = Controller::with_provider(config, Arc::new(MockProvider::working()));

    assert!(controller.load_game_context().await.is_none());
}

#[tokio::test]
async fn test_loadGameContext_ignored_shouldSkipDocument() {
    let dir = TempDir::new().unwrap();
    let context_path = common::write_workbook(dir.path(), "context.json", CONTEXT).unwrap();
    let mut config = common::test_config();
    config.context.document = Some(context_path.display().to_string());
    config.context.game_context_sheet = Some(2);
    config.context.ignore = true;
    let controller = Controller::with_provider(config, Arc::new(MockProvider::working()));

    assert!(controller.load_game_context().await.is_none());
}
