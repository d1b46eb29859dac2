/*!
 * In-memory sheet grid shared by every table store.
 *
 * Stores keep the loaded cells here and only differ in how they flush the
 * pending write set.
 */

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

use super::{Cell, CellStyle, SheetId};

/// A cell write waiting for the next checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub row: usize,
    pub col: usize,
    pub value: String,
    pub style: Option<CellStyle>,
}

/// Grid of cells plus the set of cells written since the last flush
#[derive(Debug)]
pub struct SheetGrid {
    sheet_id: SheetId,
    title: String,
    rows: RwLock<Vec<Vec<Cell>>>,
    /// Keyed by (row, col) so a cell written twice is flushed once, last value wins
    pending: Mutex<BTreeMap<(usize, usize), PendingWrite>>,
}

impl SheetGrid {
    /// Create a grid from loaded rows
    pub fn new(sheet_id: SheetId, title: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            sheet_id,
            title: title.into(),
            rows: RwLock::new(rows),
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a grid from plain string rows; empty strings become empty cells
    pub fn from_values<R, S>(sheet_id: SheetId, title: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| {
                        let v = v.as_ref();
                        if v.is_empty() { Cell::default() } else { Cell::with_value(v) }
                    })
                    .collect()
            })
            .collect();
        Self::new(sheet_id, title, rows)
    }

    pub fn sheet_id(&self) -> SheetId {
        self.sheet_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Header labels up to the first empty one
    pub fn header_row(&self) -> Vec<String> {
        let rows = self.rows.read();
        rows.first()
            .map(|header| {
                header
                    .iter()
                    .map_while(|cell| cell.text().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.read().get(row).and_then(|r| r.get(col)).cloned()
    }

    pub fn note(&self, row: usize, col: usize) -> Option<String> {
        self.rows
            .read()
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.note.clone())
            .filter(|n| !n.is_empty())
    }

    /// Write a value in memory, growing the grid if needed, and mark it pending
    pub fn set_cell(&self, row: usize, col: usize, value: &str, style: Option<CellStyle>) {
        {
            let mut rows = self.rows.write();
            if rows.len() <= row {
                rows.resize_with(row + 1, Vec::new);
            }
            let cells = &mut rows[row];
            if cells.len() <= col {
                cells.resize_with(col + 1, Cell::default);
            }
            let cell = &mut cells[col];
            cell.value = Some(value.to_string());
            if style.is_some() {
                cell.style = style;
            }
        }

        self.pending.lock().insert(
            (row, col),
            PendingWrite {
                row,
                col,
                value: value.to_string(),
                style,
            },
        );
    }

    /// Number of cells waiting for a flush
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Take every pending write, leaving the set empty
    pub fn take_pending(&self) -> Vec<PendingWrite> {
        std::mem::take(&mut *self.pending.lock()).into_values().collect()
    }

    /// Put writes back after a failed flush; newer writes to the same cell are kept
    pub fn restore_pending(&self, writes: Vec<PendingWrite>) {
        let mut pending = self.pending.lock();
        for write in writes {
            pending.entry((write.row, write.col)).or_insert(write);
        }
    }

    /// Copy of all rows
    pub fn snapshot(&self) -> Vec<Vec<Cell>> {
        self.rows.read().clone()
    }
}
