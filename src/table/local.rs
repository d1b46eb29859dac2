/*!
 * Local JSON workbook.
 *
 * The document is a JSON file with a list of sheets, each holding rows of
 * cells. A cell is either a plain string or an object with `value`, `note` and
 * `background` (hex color):
 *
 * ```json
 * {"sheets": [{"id": 0, "title": "UI", "rows": [
 *     ["Key", "[en] English", "[es] Spanish"],
 *     [{"value": "greet", "note": "Main menu title"}, "Hello", ""]
 * ]}]}
 * ```
 *
 * Persisting rewrites the whole file atomically through a temporary file in
 * the same directory.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Cell, CellStyle, Color, SheetGrid, SheetId, Table, Workbook};
use crate::errors::TableError;

/// On-disk cell representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LocalCell {
    Text(String),
    Full {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background: Option<String>,
    },
}

impl From<LocalCell> for Cell {
    fn from(cell: LocalCell) -> Self {
        match cell {
            LocalCell::Text(text) if text.is_empty() => Cell::default(),
            LocalCell::Text(text) => Cell::with_value(text),
            LocalCell::Full { value, note, background } => Cell {
                value,
                note,
                style: background
                    .as_deref()
                    .and_then(Color::from_hex)
                    .map(CellStyle::highlight),
            },
        }
    }
}

impl From<&Cell> for LocalCell {
    fn from(cell: &Cell) -> Self {
        match (&cell.note, &cell.style) {
            (None, None) => LocalCell::Text(cell.value.clone().unwrap_or_default()),
            _ => LocalCell::Full {
                value: cell.value.clone(),
                note: cell.note.clone(),
                background: cell.style.map(|s| s.background.to_hex()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalSheetData {
    id: SheetId,
    title: String,
    #[serde(default)]
    rows: Vec<Vec<LocalCell>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalDocument {
    #[serde(default)]
    sheets: Vec<LocalSheetData>,
}

impl LocalDocument {
    fn write_atomically(&self, path: &Path) -> Result<(), TableError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| TableError::Malformed(e.to_string()))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|e| TableError::Io(e.error))?;
        Ok(())
    }
}

/// Workbook stored in a local JSON file
#[derive(Debug, Clone)]
pub struct LocalWorkbook {
    path: PathBuf,
    document: Arc<Mutex<LocalDocument>>,
}

impl LocalWorkbook {
    /// Load a workbook from disk
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TableError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        let document: LocalDocument =
            serde_json::from_str(&content).map_err(|e| TableError::Malformed(format!("{}: {}", path.display(), e)))?;

        debug!("Loaded local workbook {} with {} sheet(s)", path.display(), document.sheets.len());

        Ok(Self {
            path,
            document: Arc::new(Mutex::new(document)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Workbook for LocalWorkbook {
    fn document_id(&self) -> String {
        self.path.display().to_string()
    }

    async fn sheet_ids(&self) -> Result<Vec<SheetId>, TableError> {
        Ok(self.document.lock().sheets.iter().map(|s| s.id).collect())
    }

    async fn open_sheet(&self, sheet_id: SheetId) -> Result<Arc<dyn Table>, TableError> {
        let document = self.document.lock();
        let data = document
            .sheets
            .iter()
            .find(|s| s.id == sheet_id)
            .ok_or_else(|| TableError::SheetNotFound(format!("{} in {}", sheet_id, self.path.display())))?;

        let rows = data
            .rows
            .iter()
            .map(|row| row.iter().cloned().map(Cell::from).collect())
            .collect();

        Ok(Arc::new(LocalSheet {
            grid: SheetGrid::new(data.id, data.title.clone(), rows),
            workbook: self.clone(),
        }))
    }
}

/// A sheet of a local workbook
#[derive(Debug)]
pub struct LocalSheet {
    grid: SheetGrid,
    workbook: LocalWorkbook,
}

#[async_trait]
impl Table for LocalSheet {
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

        let rows: Vec<Vec<LocalCell>> = self
            .grid
            .snapshot()
            .iter()
            .map(|row| row.iter().map(LocalCell::from).collect())
            .collect();

        let result = {
            let mut document = self.workbook.document.lock();
            match document.sheets.iter_mut().find(|s| s.id == self.grid.sheet_id()) {
                Some(sheet) => {
                    sheet.rows = rows;
                    document.write_atomically(&self.workbook.path)
                }
                None => Err(TableError::SheetNotFound(self.grid.title().to_string())),
            }
        };

        match result {
            Ok(()) => {
                debug!("Saved {} cell(s) of '{}' to {}", writes.len(), self.grid.title(), self.workbook.path.display());
                Ok(writes.len())
            }
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
