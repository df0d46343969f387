//! Schema versioning for the SQLite backend.
//!
//! Each step is applied in its own transaction and recorded in
//! `schema_history`, so a database is either at a known version or untouched.

use tokio_rusqlite::{Connection, params, rusqlite};

use super::Error;

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "cache_entries keyed by variant digest",
    sql: include_str!("../../migrations/001_cache_entries.sql"),
}];

const HISTORY_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_history (
    version     INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at  TEXT NOT NULL
)";

/// Bring the schema up to the latest version.
///
/// # Errors
///
/// `MigrationFailed` names the step whose SQL was rejected; earlier steps
/// stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(HISTORY_TABLE, [])?;
        let current = current_version(conn)?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            apply(conn, migration)?;
        }
        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn current_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_history", [], |row| row.get(0))
}

fn apply(conn: &mut rusqlite::Connection, migration: &Migration) -> Result<(), Error> {
    let failed = |e: rusqlite::Error| {
        Error::MigrationFailed(format!("v{} ({}): {}", migration.version, migration.description, e))
    };

    let tx = conn.transaction().map_err(failed)?;
    tx.execute_batch(migration.sql).map_err(failed)?;
    tx.execute(
        "INSERT INTO schema_history (version, description, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.description, chrono::Utc::now().to_rfc3339()],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)?;

    tracing::debug!(version = migration.version, description = migration.description, "schema migrated");
    Ok(())
}
