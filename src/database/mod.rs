/*!
 * Run journal persistence.
 *
 * A SQLite database recording every translation run and the items it could
 * not resolve:
 * - `runs`: one row per run with the document, provider, model, status and
 *   counters
 * - `unresolved_items`: failed work items and translations the provider
 *   reported as missing, with a fingerprint of the source text
 */

pub mod connection;
pub mod journal;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use journal::RunJournal;
pub use models::{RunCounters, RunRecord, RunStatus, UnresolvedKind, UnresolvedRecord};
pub use repository::Repository;
