/*!
 * Repository layer for the run journal.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};

use super::connection::DatabaseConnection;
use super::models::{RunCounters, RunRecord, RunStatus, UnresolvedKind, UnresolvedRecord};

const RUN_COLUMNS: &str = "id, document, provider, model, status, sheet_count, work_items, \
     cells_written, failed_items, unresolved_translations, started_at, finished_at";

/// Repository for journal operations
#[derive(Clone, Debug)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Repository over the default journal location
    pub fn new_default() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// SHA-256 of `text`, hex encoded
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    // =========================================================================
    // Runs
    // =========================================================================

    pub async fn create_run(&self, run: &RunRecord) -> Result<()> {
        let run = run.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO runs (
                        id, document, provider, model, status, sheet_count, work_items,
                        cells_written, failed_items, unresolved_translations, started_at, finished_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    "#,
                    params![
                        run.id,
                        run.document,
                        run.provider,
                        run.model,
                        run.status.to_string(),
                        run.counters.sheet_count,
                        run.counters.work_items,
                        run.counters.cells_written,
                        run.counters.failed_items,
                        run.counters.unresolved_translations,
                        run.started_at,
                        run.finished_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Store final status and counters, stamping `finished_at`
    pub async fn finish_run(&self, run_id: &str, status: RunStatus, counters: RunCounters) -> Result<()> {
        let run_id = run_id.to_string();
        let finished_at = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    r#"
                    UPDATE runs SET status = ?1, sheet_count = ?2, work_items = ?3, cells_written = ?4,
                        failed_items = ?5, unresolved_translations = ?6, finished_at = ?7
                    WHERE id = ?8
                    "#,
                    params![
                        status.to_string(),
                        counters.sheet_count,
                        counters.work_items,
                        counters.cells_written,
                        counters.failed_items,
                        counters.unresolved_translations,
                        finished_at,
                        run_id,
                    ],
                )?;
                if updated == 0 {
                    return Err(anyhow::anyhow!("Run not found: {}", run_id));
                }
                Ok(())
            })
            .await
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let run_id = run_id.to_string();

        self.db
            .execute_async(move |conn| {
                let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
                Ok(conn.query_row(&sql, [run_id], Self::run_from_row).optional()?)
            })
            .await
    }

    /// Most recently started run
    pub async fn latest_run(&self) -> Result<Option<RunRecord>> {
        self.db
            .execute_async(|conn| Self::latest_run_sync(conn))
            .await
    }

    fn latest_run_sync(conn: &Connection) -> Result<Option<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM runs ORDER BY started_at DESC, rowid DESC LIMIT 1",
            RUN_COLUMNS
        );
        Ok(conn.query_row(&sql, [], Self::run_from_row).optional()?)
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            document: row.get(1)?,
            provider: row.get(2)?,
            model: row.get(3)?,
            status: row.get::<_, String>(4)?.parse().unwrap_or(RunStatus::Failed),
            counters: RunCounters {
                sheet_count: row.get(5)?,
                work_items: row.get(6)?,
                cells_written: row.get(7)?,
                failed_items: row.get(8)?,
                unresolved_translations: row.get(9)?,
            },
            started_at: row.get(10)?,
            finished_at: row.get(11)?,
        })
    }

    // =========================================================================
    // Unresolved items
    // =========================================================================

    /// Insert items in one transaction, returns the number inserted
    pub async fn record_unresolved(&self, items: Vec<UnresolvedRecord>) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        self.db
            .transaction_async(move |tx| {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO unresolved_items (
                        run_id, sheet, key, language_code, row_index, kind, reason,
                        source_fingerprint, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )?;

                for item in &items {
                    stmt.execute(params![
                        item.run_id,
                        item.sheet,
                        item.key,
                        item.language_code,
                        item.row_index,
                        item.kind.to_string(),
                        item.reason,
                        item.source_fingerprint,
                        item.created_at,
                    ])?;
                }

                debug!("Journaled {} unresolved item(s)", items.len());
                Ok(items.len())
            })
            .await
    }

    /// Items of a run, in insertion order
    pub async fn list_unresolved(&self, run_id: &str) -> Result<Vec<UnresolvedRecord>> {
        let run_id = run_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, run_id, sheet, key, language_code, row_index, kind, reason,
                           source_fingerprint, created_at
                    FROM unresolved_items WHERE run_id = ?1 ORDER BY id
                    "#,
                )?;

                let items = stmt
                    .query_map([run_id], |row| {
                        Ok(UnresolvedRecord {
                            id: row.get(0)?,
                            run_id: row.get(1)?,
                            sheet: row.get(2)?,
                            key: row.get(3)?,
                            language_code: row.get(4)?,
                            row_index: row.get(5)?,
                            kind: row
                                .get::<_, String>(6)?
                                .parse()
                                .unwrap_or(UnresolvedKind::Failed),
                            reason: row.get(7)?,
                            source_fingerprint: row.get(8)?,
                            created_at: row.get(9)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(items)
            })
            .await
    }
}
