/*!
 * Google Sheets v4 store.
 *
 * Sheets are loaded with their formatted values and notes in a single
 * `includeGridData` request. Pending writes are flushed with one
 * `spreadsheets.batchUpdate` call made of `updateCells` requests.
 *
 * Authentication is a bearer access token obtained elsewhere.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use super::{Cell, CellStyle, PendingWrite, SheetGrid, SheetId, Table, Workbook};
use crate::errors::TableError;

/// Default Sheets API endpoint
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetResponse>,
}

#[derive(Debug, Deserialize)]
struct SheetResponse {
    properties: SheetProperties,
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: SheetId,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    #[serde(default)]
    values: Vec<CellData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    formatted_value: Option<String>,
    note: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchUpdateRequest {
    requests: Vec<Value>,
}

/// Shared HTTP plumbing for one spreadsheet document
#[derive(Clone)]
struct SheetsClient {
    client: Client,
    endpoint: String,
    access_token: String,
    document_id: String,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"<redacted>")
            .field("document_id", &self.document_id)
            .finish()
    }
}

impl SheetsClient {
    fn spreadsheet_url(&self) -> String {
        format!("{}/v4/spreadsheets/{}", self.endpoint.trim_end_matches('/'), self.document_id)
    }

    async fn get(&self, query: &[(&str, &str)]) -> Result<SpreadsheetResponse, TableError> {
        let response = self
            .client
            .get(self.spreadsheet_url())
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| TableError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TableError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<SpreadsheetResponse>()
            .await
            .map_err(|e| TableError::Malformed(format!("Failed to decode spreadsheet response: {}", e)))
    }

    async fn batch_update(&self, requests: Vec<Value>) -> Result<(), TableError> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&BatchUpdateRequest { requests })
            .send()
            .await
            .map_err(|e| TableError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Sheets batchUpdate failed ({}): {}", status, message);
            return Err(TableError::Api {
                status_code: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Build the `updateCells` request for one pending write
fn update_cells_request(sheet_id: SheetId, write: &PendingWrite) -> Value {
    let mut cell = json!({ "userEnteredValue": { "stringValue": write.value } });
    let fields = match write.style {
        Some(style) => {
            cell["userEnteredFormat"] = json!({ "backgroundColor": style.background });
            "userEnteredValue,userEnteredFormat.backgroundColor"
        }
        None => "userEnteredValue",
    };

    json!({
        "updateCells": {
            "start": { "sheetId": sheet_id, "rowIndex": write.row, "columnIndex": write.col },
            "rows": [{ "values": [cell] }],
            "fields": fields,
        }
    })
}

/// A Google Sheets spreadsheet document
#[derive(Debug, Clone)]
pub struct GoogleSpreadsheet {
    sheets: SheetsClient,
}

impl GoogleSpreadsheet {
    /// Create a client for the given document
    pub fn new(
        document_id: impl Into<String>,
        access_token: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            sheets: SheetsClient {
                client: Client::builder()
                    .timeout(Duration::from_secs(timeout_secs))
                    .build()
                    .unwrap_or_default(),
                endpoint: endpoint.into(),
                access_token: access_token.into(),
                document_id: document_id.into(),
            },
        }
    }

    async fn title_for(&self, sheet_id: SheetId) -> Result<String, TableError> {
        let doc = self.sheets.get(&[("fields", "sheets.properties(sheetId,title)")]).await?;
        doc.sheets
            .into_iter()
            .find(|s| s.properties.sheet_id == sheet_id)
            .map(|s| s.properties.title)
            .ok_or_else(|| TableError::SheetNotFound(format!("gid {} in {}", sheet_id, self.sheets.document_id)))
    }
}

#[async_trait]
impl Workbook for GoogleSpreadsheet {
    fn document_id(&self) -> String {
        self.sheets.document_id.clone()
    }

    async fn sheet_ids(&self) -> Result<Vec<SheetId>, TableError> {
        let doc = self.sheets.get(&[("fields", "sheets.properties(sheetId,title)")]).await?;
        Ok(doc.sheets.iter().map(|s| s.properties.sheet_id).collect())
    }

    async fn open_sheet(&self, sheet_id: SheetId) -> Result<Arc<dyn Table>, TableError> {
        let title = self.title_for(sheet_id).await?;
        let range = format!("'{}'", title.replace('\'', "''"));

        let doc = self
            .sheets
            .get(&[
                ("includeGridData", "true"),
                ("ranges", range.as_str()),
                ("fields", "sheets(properties(sheetId,title),data(rowData(values(formattedValue,note))))"),
            ])
            .await?;

        let sheet = doc
            .sheets
            .into_iter()
            .next()
            .ok_or_else(|| TableError::SheetNotFound(title.clone()))?;

        let rows: Vec<Vec<Cell>> = sheet
            .data
            .into_iter()
            .flat_map(|d| d.row_data)
            .map(|row| {
                row.values
                    .into_iter()
                    .map(|c| Cell {
                        value: c.formatted_value,
                        note: c.note,
                        style: None,
                    })
                    .collect()
            })
            .collect();

        debug!("Loaded sheet '{}' (gid {}) with {} row(s)", title, sheet_id, rows.len());

        Ok(Arc::new(GoogleSheet {
            grid: SheetGrid::new(sheet_id, title, rows),
            sheets: self.sheets.clone(),
        }))
    }
}

/// One tab of a Google Sheets document
#[derive(Debug)]
pub struct GoogleSheet {
    grid: SheetGrid,
    sheets: SheetsClient,
}

#[async_trait]
impl Table for GoogleSheet {
    fn sheet_id(&self) -> SheetId {
        self.grid.sheet_id()
    }

    fn title(&self) -> String {
        self.grid.title().to_string()
    }

    fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    fn header_row(&self) -> Vec<String> {
        self.grid.header_row()
    }

    fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.grid.cell(row, col)
    }

    fn note(&self, row: usize, col: usize) -> Option<String> {
        self.grid.note(row, col)
    }

    fn set_cell(&self, row: usize, col: usize, value: &str, style: Option<CellStyle>) {
        self.grid.set_cell(row, col, value, style);
    }

    async fn persist_pending_writes(&self) -> Result<usize, TableError> {
        let writes = self.grid.take_pending();
        if writes.is_empty() {
            return Ok(0);
        }

        let requests = writes
            .iter()
            .map(|w| update_cells_request(self.grid.sheet_id(), w))
            .collect();

        match self.sheets.batch_update(requests).await {
            Ok(()) => Ok(writes.len()),
            Err(e) => {
                let pending = writes.len();
                self.grid.restore_pending(writes);
                Err(TableError::Persist {
                    pending,
                    message: e.to_string(),
                })
            }
        }
    }
}
