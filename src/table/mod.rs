/*!
 * Table stores for localization spreadsheets.
 *
 * A `Workbook` is a document holding several sheets; opening a sheet yields a
 * `Table`, an in-memory grid of cells with a pending write set that is flushed
 * by `persist_pending_writes`.
 *
 * - `grid`: shared in-memory grid and pending write tracking
 * - `google`: Google Sheets v4 store
 * - `local`: JSON workbook on disk
 * - `memory`: in-memory workbook, used by tests
 * - `locator`: parses sheet URLs, ids and local paths
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::TableError;

pub mod google;
pub mod grid;
pub mod local;
pub mod locator;
pub mod memory;

pub use self::grid::{PendingWrite, SheetGrid};
pub use self::locator::SheetLocator;

/// Numeric sheet identifier (the `gid` of a Google Sheets tab)
pub type SheetId = u64;

/// A single cell: its displayed value and the note attached to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Displayed value, `None` when the cell was never filled
    pub value: Option<String>,

    /// Annotation attached to the cell
    pub note: Option<String>,

    /// Style applied by the last write
    pub style: Option<CellStyle>,
}

impl Cell {
    /// Create a cell holding a value
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Attach a note to the cell
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Whether the cell holds no value or an empty string
    pub fn is_empty(&self) -> bool {
        self.value.as_deref().is_none_or(str::is_empty)
    }

    /// The value if it is present and non-empty
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// RGB color with channels in the 0.0..=1.0 range, as the Sheets API expects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    /// Parse a `#rrggbb` hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| f32::from(v) / 255.0);
        Some(Self {
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }

    /// Format as a `#rrggbb` hex string
    pub fn to_hex(&self) -> String {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", to_byte(self.red), to_byte(self.green), to_byte(self.blue))
    }
}

/// Formatting applied when writing a cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    /// Background color of the cell
    pub background: Color,
}

impl CellStyle {
    /// Background highlight style
    pub fn highlight(background: Color) -> Self {
        Self { background }
    }
}

/// One worksheet, loaded in memory
///
/// Cell accessors are synchronous and never suspend; only persistence talks to
/// the backing store. Writes stay pending until `persist_pending_writes` returns
/// successfully.
#[async_trait]
pub trait Table: Send + Sync + Debug {
    /// Identifier of the sheet inside its document
    fn sheet_id(&self) -> SheetId;

    /// Human readable sheet title
    fn title(&self) -> String;

    /// Number of rows in the grid, header included
    fn row_count(&self) -> usize;

    /// Header labels, up to the first empty label
    fn header_row(&self) -> Vec<String>;

    /// Read a cell, `None` if it lies outside the grid
    fn cell(&self, row: usize, col: usize) -> Option<Cell>;

    /// Read the note attached to a cell
    fn note(&self, row: usize, col: usize) -> Option<String>;

    /// Write a value and mark the cell pending
    fn set_cell(&self, row: usize, col: usize, value: &str, style: Option<CellStyle>);

    /// Flush every pending write to the backing store
    ///
    /// # Returns
    /// * `Result<usize, TableError>` - Number of cells persisted
    async fn persist_pending_writes(&self) -> Result<usize, TableError>;
}

/// A document made of several sheets
#[async_trait]
pub trait Workbook: Send + Sync + Debug {
    /// Human readable document identifier, for logs and the run journal
    fn document_id(&self) -> String;

    /// Ids of all sheets, in document order
    async fn sheet_ids(&self) -> Result<Vec<SheetId>, TableError>;

    /// Load a sheet and all its cells
    async fn open_sheet(&self, sheet_id: SheetId) -> Result<Arc<dyn Table>, TableError>;
}
