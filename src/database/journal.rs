/*!
 * Best-effort run journal.
 *
 * Wraps the repository so that a broken or disabled journal never stops a
 * run: every failure is logged and the operation becomes a no-op.
 */

use log::{info, warn};

use crate::app_config::JournalConfig;
use crate::translation::SheetReport;

use super::models::{RunCounters, RunRecord, RunStatus, UnresolvedKind, UnresolvedRecord};
use super::repository::Repository;

/// Journal of the current run
#[derive(Debug, Default)]
pub struct RunJournal {
    repo: Option<Repository>,
    run: Option<RunRecord>,
}

impl RunJournal {
    /// Open the journal described by `config`; disabled or unusable gives a no-op journal
    pub fn open(config: &JournalConfig) -> Self {
        if !config.enabled {
            info!("Run journal disabled");
            return Self::default();
        }

        let repo = match &config.path {
            Some(path) => super::DatabaseConnection::new(path).map(Repository::new),
            None => Repository::new_default(),
        };

        match repo {
            Ok(repo) => Self::with_repository(repo),
            Err(e) => {
                warn!("Run journal unavailable, continuing without it: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn with_repository(repo: Repository) -> Self {
        Self {
            repo: Some(repo),
            run: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.repo.is_some()
    }

    /// Id of the started run, if any
    pub fn run_id(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.id.as_str())
    }

    /// Insert a `running` row for this run
    pub async fn start(&mut self, document: &str, provider: &str, model: &str) {
        let Some(repo) = &self.repo else {
            return;
        };

        let run = RunRecord::new(document, provider, model);
        match repo.create_run(&run).await {
            Ok(()) => {
                info!("Journal run {}", run.id);
                self.run = Some(run);
            }
            Err(e) => warn!("Failed to journal run start: {:#}", e),
        }
    }

    /// Journal the failed items and unresolved translations of a sheet
    pub async fn record_sheet(&self, report: &SheetReport) {
        let (Some(repo), Some(run)) = (&self.repo, &self.run) else {
            return;
        };

        let records = unresolved_records(&run.id, report);
        if let Err(e) = repo.record_unresolved(records).await {
            warn!("Failed to journal unresolved items of '{}': {:#}", report.title, e);
        }
    }

    /// Store the final status and counters
    pub async fn finish(&self, status: RunStatus, counters: RunCounters) {
        let (Some(repo), Some(run)) = (&self.repo, &self.run) else {
            return;
        };

        if let Err(e) = repo.finish_run(&run.id, status, counters).await {
            warn!("Failed to journal run end: {:#}", e);
        }
    }
}

/// Journal rows for one sheet report
pub fn unresolved_records(run_id: &str, report: &SheetReport) -> Vec<UnresolvedRecord> {
    let now = chrono::Utc::now().to_rfc3339();

    let failed = report.dispatch.failed.iter().map(|failed| UnresolvedRecord {
        id: None,
        run_id: run_id.to_string(),
        sheet: report.title.clone(),
        key: failed.item.key.clone(),
        language_code: Some(failed.item.target_language_codes.join(",")),
        row_index: failed.item.row_index as i64,
        kind: UnresolvedKind::Failed,
        reason: failed.error.clone(),
        source_fingerprint: Repository::hash_text(&failed.item.source_text),
        created_at: now.clone(),
    });

    let missing = report.dispatch.unresolved.iter().map(|missing| UnresolvedRecord {
        id: None,
        run_id: run_id.to_string(),
        sheet: report.title.clone(),
        key: missing.key.clone(),
        language_code: Some(missing.language_code.clone()),
        row_index: missing.row_index as i64,
        kind: UnresolvedKind::Missing,
        reason: missing.reason.clone(),
        source_fingerprint: Repository::hash_text(&missing.source_text),
        created_at: now.clone(),
    });

    failed.chain(missing).collect()
}
