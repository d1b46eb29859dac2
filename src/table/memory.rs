/*!
 * In-memory workbook.
 *
 * Persisting copies pending writes into a "committed" snapshot. The store can
 * be told to fail its next persists and records when each persist happened,
 * which makes it the table of choice for tests.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

use super::{Cell, CellStyle, SheetGrid, SheetId, Table, Workbook};
use crate::errors::TableError;

/// A sheet that lives only in memory
#[derive(Debug)]
pub struct MemorySheet {
    grid: SheetGrid,
    committed: Mutex<BTreeMap<(usize, usize), String>>,
    persist_instants: Mutex<Vec<Instant>>,
    failures_left: AtomicUsize,
}

impl MemorySheet {
    /// Create a sheet from string rows; row 0 is the header
    pub fn from_values<R, S>(sheet_id: SheetId, title: &str, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_grid(SheetGrid::from_values(sheet_id, title, rows))
    }

    /// Create a sheet around an existing grid
    pub fn from_grid(grid: SheetGrid) -> Self {
        Self {
            grid,
            committed: Mutex::new(BTreeMap::new()),
            persist_instants: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Attach a note to a cell without marking it pending
    pub fn with_note(self, row: usize, col: usize, note: &str) -> Self {
        let mut rows = self.grid.snapshot();
        if let Some(cell) = rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            cell.note = Some(note.to_string());
        }
        Self::from_grid(SheetGrid::new(self.grid.sheet_id(), self.grid.title(), rows))
    }

    /// Make the next `count` persists fail
    pub fn fail_next_persists(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Value durably written to a cell, if any
    pub fn committed_value(&self, row: usize, col: usize) -> Option<String> {
        self.committed.lock().get(&(row, col)).cloned()
    }

    /// Number of durably written cells
    pub fn committed_count(&self) -> usize {
        self.committed.lock().len()
    }

    /// When each persist attempt started, failed ones included
    pub fn persist_instants(&self) -> Vec<Instant> {
        self.persist_instants.lock().clone()
    }

    /// Number of cells still waiting for a persist
    pub fn pending_count(&self) -> usize {
        self.grid.pending_count()
    }
}

#[async_trait]
impl Table for MemorySheet {
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
        self.persist_instants.lock().push(Instant::now());

        let writes = self.grid.take_pending();
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            let pending = writes.len();
            self.grid.restore_pending(writes);
            return Err(TableError::Persist {
                pending,
                message: "simulated persist failure".to_string(),
            });
        }

        let count = writes.len();
        let mut committed = self.committed.lock();
        for write in writes {
            committed.insert((write.row, write.col), write.value);
        }
        Ok(count)
    }
}

/// Workbook made of memory sheets
#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    name: String,
    sheets: Vec<Arc<MemorySheet>>,
}

impl MemoryWorkbook {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sheets: Vec::new(),
        }
    }

    /// Add a sheet to the workbook
    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.push(Arc::new(sheet));
        self
    }

    /// Typed handle to a sheet, for inspecting committed values
    pub fn sheet(&self, sheet_id: SheetId) -> Option<Arc<MemorySheet>> {
        self.sheets.iter().find(|s| s.sheet_id() == sheet_id).cloned()
    }
}

#[async_trait]
impl Workbook for MemoryWorkbook {
    fn document_id(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn sheet_ids(&self) -> Result<Vec<SheetId>, TableError> {
        Ok(self.sheets.iter().map(|s| s.sheet_id()).collect())
    }

    async fn open_sheet(&self, sheet_id: SheetId) -> Result<Arc<dyn Table>, TableError> {
        self.sheet(sheet_id)
            .map(|s| s as Arc<dyn Table>)
            .ok_or_else(|| TableError::SheetNotFound(sheet_id.to_string()))
    }
}
