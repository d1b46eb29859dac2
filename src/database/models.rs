/*!
 * Journal records.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    /// Every work item succeeded
    Completed,
    /// Finished, but some items failed or sheets were skipped
    CompletedWithErrors,
    /// Aborted before all sheets were processed
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::CompletedWithErrors => write!(f, "completed_with_errors"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "completed_with_errors" => Ok(RunStatus::CompletedWithErrors),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid run status: {}", s)),
        }
    }
}

/// Why an item is in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedKind {
    /// The whole work item failed
    Failed,
    /// The provider answered but left this translation out
    Missing,
}

impl fmt::Display for UnresolvedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedKind::Failed => write!(f, "failed"),
            UnresolvedKind::Missing => write!(f, "missing"),
        }
    }
}

impl std::str::FromStr for UnresolvedKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failed" => Ok(UnresolvedKind::Failed),
            "missing" => Ok(UnresolvedKind::Missing),
            _ => Err(anyhow::anyhow!("Invalid unresolved kind: {}", s)),
        }
    }
}

/// Totals of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub sheet_count: i64,
    pub work_items: i64,
    pub cells_written: i64,
    pub failed_items: i64,
    pub unresolved_translations: i64,
}

/// Row of the `runs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// UUID v4
    pub id: String,
    /// Document id or local path
    pub document: String,
    pub provider: String,
    pub model: String,
    pub status: RunStatus,
    pub counters: RunCounters,
    /// RFC 3339
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl RunRecord {
    /// A fresh running record
    pub fn new(document: &str, provider: &str, model: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document: document.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            status: RunStatus::Running,
            counters: RunCounters::default(),
            started_at: chrono::Utc::now().to_rfc3339(),
            finished_at: None,
        }
    }
}

impl fmt::Display for RunRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {} on {} ({} / {}) started {}: {}, {} sheet(s), {} request(s), {} cell(s) written, {} failed request(s), {} unresolved translation(s)",
            self.id,
            self.document,
            self.provider,
            self.model,
            self.started_at,
            self.status,
            self.counters.sheet_count,
            self.counters.work_items,
            self.counters.cells_written,
            self.counters.failed_items,
            self.counters.unresolved_translations
        )
    }
}

/// Row of the `unresolved_items` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedRecord {
    /// Database id, `None` until inserted
    pub id: Option<i64>,
    pub run_id: String,
    /// Sheet title
    pub sheet: String,
    pub key: String,
    /// Empty for failed items spanning several languages
    pub language_code: Option<String>,
    pub row_index: i64,
    pub kind: UnresolvedKind,
    pub reason: String,
    /// SHA-256 of the source text
    pub source_fingerprint: String,
    pub created_at: String,
}

impl fmt::Display for UnresolvedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} row {} '{}'{}: {}",
            self.kind,
            self.sheet,
            self.row_index,
            self.key,
            self.language_code
                .as_ref()
                .map(|c| format!(" ({})", c))
                .unwrap_or_default(),
            self.reason
        )
    }
}
