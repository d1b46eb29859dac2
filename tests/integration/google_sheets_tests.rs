/*!
 * Google Sheets store against a mock Sheets API
 */

use serde_json::json;
use sheet_translator::providers::mock::MockProvider;
use sheet_translator::table::google::GoogleSpreadsheet;
use sheet_translator::table::{Table, Workbook};
use sheet_translator::translation::TranslationService;
use sheet_translator::TableError;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

const DOCUMENT: &str = "1AbCdEfGhIjKlMnOp";

async fn mount_document(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v4/spreadsheets/{}", DOCUMENT)))
        .and(query_param("fields", "sheets.properties(sheetId,title)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [
                {"properties": {"sheetId": 0, "title": "UI"}},
                {"properties": {"sheetId": 17, "title": "Items"}}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v4/spreadsheets/{}", DOCUMENT)))
        .and(query_param("includeGridData", "true"))
        .and(query_param("ranges", "'UI'"))
        .and(header("authorization", "Bearer sheets-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [{
                "properties": {"sheetId": 0, "title": "UI"},
                "data": [{"rowData": [
                    {"values": [{"formattedValue": "Key"}, {"formattedValue": "[en] English"}, {"formattedValue": "[es] Spanish"}]},
                    {"values": [{"formattedValue": "greet", "note": "Title screen"}, {"formattedValue": "Hello"}, {}]}
                ]}]
            }]
        })))
        .mount(server)
        .await;
}

fn spreadsheet(server: &MockServer) -> GoogleSpreadsheet {
    GoogleSpreadsheet::new(DOCUMENT, "sheets-token", server.uri(), 5)
}

#[tokio::test]
async fn test_googleSpreadsheet_shouldListAndLoadSheets() {
    let server = MockServer::start().await;
    mount_document(&server).await;
    let workbook = spreadsheet(&server);

    assert_eq!(workbook.sheet_ids().await.unwrap(), vec![0, 17]);

    let sheet = workbook.open_sheet(0).await.unwrap();
    assert_eq!(sheet.title(), "UI");
    assert_eq!(sheet.header_row(), vec!["Key", "[en] English", "[es] Spanish"]);
    assert_eq!(sheet.note(1, 0).as_deref(), Some("Title screen"));
    assert!(sheet.cell(1, 2).map(|c| c.is_empty()).unwrap_or(true));
}

#[tokio::test]
async fn test_googleSpreadsheet_unknownGid_shouldBeSheetNotFound() {
    let server = MockServer::start().await;
    mount_document(&server).await;

    let result = spreadsheet(&server).open_sheet(99).await;

    assert!(matches!(result, Err(TableError::SheetNotFound(_))));
}

#[tokio::test]
async fn test_googleSheet_translation_shouldBeSentInBatchUpdate() {
    let server = MockServer::start().await;
    mount_document(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/v4/spreadsheets/{}:batchUpdate", DOCUMENT)))
        .and(body_string_contains("[es] Hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = spreadsheet(&server).open_sheet(0).await.unwrap();
    let mut settings = common::settings(5);
    settings.dispatch.stagger = std::time::Duration::ZERO;
    let service = TranslationService::new(Arc::new(MockProvider::working()), settings);

    let report = service.translate_sheet(sheet, |_, _| {}).await.unwrap();

    assert_eq!(report.checkpoints.cells_persisted, 1);
    assert_eq!(report.checkpoints.failures, 0);
}

#[tokio::test]
async fn test_googleSheet_rejectedBatchUpdate_shouldKeepWritesPending() {
    let server = MockServer::start().await;
    mount_document(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let sheet = spreadsheet(&server).open_sheet(0).await.unwrap();
    sheet.set_cell(1, 2, "Hola", None);

    let error = sheet.persist_pending_writes().await.unwrap_err();
    assert!(matches!(error, TableError::Persist { pending: 1, .. }));

    // The failed write is retried by the next flush
    let again = sheet.persist_pending_writes().await.unwrap_err();
    assert!(matches!(again, TableError::Persist { pending: 1, .. }));
}
