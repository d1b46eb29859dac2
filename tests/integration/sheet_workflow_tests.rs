/*!
 * End-to-end runs of the controller over in-memory workbooks
 */

use sheet_translator::app_controller::{Controller, report_lines};
use sheet_translator::database::{Repository, RunStatus, UnresolvedKind};
use sheet_translator::providers::mock::MockProvider;
use sheet_translator::table::memory::{MemorySheet, MemoryWorkbook};
use std::sync::Arc;
use std::time::Duration;

use crate::common;

fn controller(provider: &MockProvider, repo: &Repository) -> Controller {
    common::init_logging();
    Controller::with_provider(common::test_config(), Arc::new(provider.clone())).with_journal_repository(repo.clone())
}

fn game_workbook() -> MemoryWorkbook {
    MemoryWorkbook::new("game")
        .with_sheet(common::sheet(
            0,
            "UI",
            &[
                ["greet", "Hello", "", "Bonjour"],
                ["bye", "Goodbye", "Adiós", "Au revoir"],
                ["play", "Play", "", ""],
            ],
        ))
        .with_sheet(MemorySheet::from_values(
            1,
            "Broken",
            vec![vec!["Key", "Comment"], vec!["orphan", "no language columns"]],
        ))
        .with_sheet(common::sheet(2, "Items", &[["sword", "Sword", "", "Épée"]]))
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_shouldFillEverySheetAndSkipBrokenOne() {
    let provider = MockProvider::working();
    let repo = Repository::new_in_memory().unwrap();
    let workbook = game_workbook();

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(report.document, "memory:game");
    assert_eq!(report.sheets.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].sheet_id, 1);
    assert_eq!(report.status(), RunStatus::CompletedWithErrors);

    let ui = workbook.sheet(0).unwrap();
    assert_eq!(ui.committed_value(1, 2).as_deref(), Some("[es] Hello"));
    assert_eq!(ui.committed_value(3, 2).as_deref(), Some("[es] Play"));
    assert_eq!(ui.committed_value(3, 3).as_deref(), Some("[fr] Play"));
    assert_eq!(ui.committed_value(2, 2), None);
    assert_eq!(ui.pending_count(), 0);

    let items = workbook.sheet(2).unwrap();
    assert_eq!(items.committed_value(1, 2).as_deref(), Some("[es] Sword"));

    let counters = report.counters();
    assert_eq!(counters.sheet_count, 3);
    assert_eq!(counters.cells_written, 4);
    assert_eq!(counters.failed_items, 0);

    let run = repo.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::CompletedWithErrors);
    assert_eq!(run.counters, counters);
    assert_eq!(run.provider, "mock");
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_singleGid_shouldOnlyTouchThatSheet() {
    let provider = MockProvider::working();
    let repo = Repository::new_in_memory().unwrap();
    let workbook = game_workbook();

    let report = controller(&provider, &repo).run_workbook(&workbook, Some(2)).await.unwrap();

    assert_eq!(report.sheets.len(), 1);
    assert!(report.skipped.is_empty());
    assert_eq!(report.status(), RunStatus::Completed);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(workbook.sheet(0).unwrap().committed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_unknownGid_shouldBeSkipped() {
    let provider = MockProvider::working();
    let repo = Repository::new_in_memory().unwrap();

    let report = controller(&provider, &repo)
        .run_workbook(&game_workbook(), Some(42))
        .await
        .unwrap();

    assert!(report.sheets.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("42"));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_rateLimitedProvider_shouldStillFillSheet() {
    let provider = MockProvider::rate_limited(3, Some(2000));
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("limited").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        common::rows_missing_spanish(4),
    ));

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(report.status(), RunStatus::Completed);
    assert_eq!(report.counters().cells_written, 4);
    assert_eq!(provider.request_count(), 7);
    assert_eq!(workbook.sheet(0).unwrap().committed_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_failedCheckpoint_shouldBeRecoveredByLaterOne() {
    let provider = MockProvider::working();
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("flaky").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        common::rows_missing_spanish(8),
    ));
    let sheet = workbook.sheet(0).unwrap();
    sheet.fail_next_persists(1);

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    // 5 + 3 items: two window checkpoints, the first one failing
    assert_eq!(report.sheets[0].checkpoints.attempts, 2);
    assert_eq!(report.sheets[0].checkpoints.failures, 1);
    assert_eq!(sheet.committed_count(), 8);
    assert_eq!(sheet.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_failedLastCheckpoint_shouldBeFlushedAtSheetEnd() {
    let provider = MockProvider::working();
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("flaky").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        common::rows_missing_spanish(2),
    ));
    let sheet = workbook.sheet(0).unwrap();
    sheet.fail_next_persists(1);

    controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(sheet.persist_instants().len(), 2);
    assert_eq!(sheet.committed_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_failingKey_shouldJournalFailedItem() {
    let provider = MockProvider::failing_key("key_1");
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("partial").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        common::rows_missing_spanish(3),
    ));

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(report.status(), RunStatus::CompletedWithErrors);
    assert_eq!(report.counters().failed_items, 1);
    assert_eq!(workbook.sheet(0).unwrap().committed_count(), 2);

    let run = repo.latest_run().await.unwrap().unwrap();
    let items = repo.list_unresolved(&run.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, UnresolvedKind::Failed);
    assert_eq!(items[0].key, "key_1");
    assert_eq!(items[0].row_index, 2);
    assert_eq!(items[0].sheet, "UI");
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_reportedMissing_shouldAppearInReport() {
    let provider = MockProvider::reporting_missing("fr", "ambiguous");
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("missing").with_sheet(common::sheet(0, "Items", &[["jar_gift", "Jar gift", "", ""]]));

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(report.counters().unresolved_translations, 1);
    // Unresolved translations alone do not fail the run
    assert_eq!(report.status(), RunStatus::Completed);

    let lines = report_lines(&repo).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "  [missing] Items row 1 'jar_gift' (fr): ambiguous");
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_shouldPaceWindowsAcrossWholeSheet() {
    let provider = MockProvider::working().with_latency(Duration::from_millis(1000));
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("paced").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        common::rows_missing_spanish(6),
    ));

    controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    // Default window of 5, then one more after the cool-down
    let calls = provider.call_instants();
    let persists = workbook.sheet(0).unwrap().persist_instants();
    assert_eq!(provider.peak_in_flight(), 5);
    assert!(calls[5] - persists[0] >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_shouldCheckConnectionOnceBeforeDispatch() {
    let provider = MockProvider::working();
    let repo = Repository::new_in_memory().unwrap();
    let workbook = game_workbook();

    controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(provider.connection_checks(), 1);
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_failedConnectionCheck_shouldNotAbortRun() {
    let provider = MockProvider::failing();
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("offline").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        common::rows_missing_spanish(2),
    ));

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(provider.connection_checks(), 1);
    assert_eq!(provider.request_count(), 6);
    assert_eq!(report.counters().failed_items, 2);
    assert_eq!(report.status(), RunStatus::CompletedWithErrors);
}

#[tokio::test(start_paused = true)]
async fn test_runWorkbook_upperCaseHeaderCode_shouldRequestAndFillColumn() {
    let provider = MockProvider::working().with_custom_response(|request| {
        format!(r#"{{"es":{{"{}":"Hola"}}}}"#, request.key)
    });
    let repo = Repository::new_in_memory().unwrap();
    let workbook = MemoryWorkbook::new("caps").with_sheet(MemorySheet::from_values(
        0,
        "UI",
        vec![vec!["Key", "[en] English", "[ES] Spanish"], vec!["greet", "Hello", ""]],
    ));

    let report = controller(&provider, &repo).run_workbook(&workbook, None).await.unwrap();

    assert_eq!(provider.requests()[0].languages_to_retrieve, vec!["ES".to_string()]);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(report.counters().failed_items, 0);
    assert_eq!(workbook.sheet(0).unwrap().committed_value(1, 2).as_deref(), Some("Hola"));
}
