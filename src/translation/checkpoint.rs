/*!
 * Checkpoint controller.
 *
 * A checkpoint persists every pending write of a table. It is invoked at the
 * end of each dispatch window and from every task failure path. Failures are
 * counted and logged, never retried here: the writes stay pending and the
 * next checkpoint picks them up.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::TableError;
use crate::table::Table;

/// Why a checkpoint was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointReason {
    /// All tasks of a window settled
    WindowComplete { window: usize },
    /// A task failed; best effort
    TaskFailure { window: usize },
}

impl std::fmt::Display for CheckpointReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointReason::WindowComplete { window } => write!(f, "end of window {}", window + 1),
            CheckpointReason::TaskFailure { window } => write!(f, "task failure in window {}", window + 1),
        }
    }
}

/// Counters of the checkpoints taken on one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointStats {
    pub attempts: usize,
    pub failures: usize,
    pub cells_persisted: usize,
}

/// Persists a table's pending writes on demand
#[derive(Debug)]
pub struct CheckpointController {
    table: Arc<dyn Table>,
    attempts: AtomicUsize,
    failures: AtomicUsize,
    cells_persisted: AtomicUsize,
}

impl CheckpointController {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self {
            table,
            attempts: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            cells_persisted: AtomicUsize::new(0),
        }
    }

    /// Persist all pending writes since the previous checkpoint
    ///
    /// # Returns
    /// * `Result<usize, TableError>` - Cells persisted; on error the writes stay pending
    pub async fn checkpoint(&self, reason: CheckpointReason) -> Result<usize, TableError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match self.table.persist_pending_writes().await {
            Ok(count) => {
                self.cells_persisted.fetch_add(count, Ordering::SeqCst);
                debug!("Checkpoint ({}) on '{}': {} cell(s) saved", reason, self.table.title(), count);
                Ok(count)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                warn!("Checkpoint ({}) on '{}' failed: {}", reason, self.table.title(), e);
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> CheckpointStats {
        CheckpointStats {
            attempts: self.attempts.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            cells_persisted: self.cells_persisted.load(Ordering::SeqCst),
        }
    }
}
