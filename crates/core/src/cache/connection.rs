//! SQLite storage handle with pragma configuration.
//!
//! Opens the database, applies pragmas for concurrent access (WAL mode) and
//! runs migrations. The `CacheStorage` operations live in `entries`.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA temp_store=MEMORY;
                       PRAGMA foreign_keys=ON;";

/// Persistent cache storage.
///
/// Wraps a tokio-rusqlite Connection that runs every statement on one
/// background thread, so operations on a key never interleave.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub(crate) conn: Connection,
    pub(crate) max_entries: Option<usize>,
}

impl SqliteStorage {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Bound the number of stored variants; the oldest are purged after each insert.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, max_entries: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
        assert_eq!(db.max_entries, None);
    }

    #[tokio::test]
    async fn test_with_max_entries() {
        let db = SqliteStorage::open_in_memory().await.unwrap().with_max_entries(Some(10));
        assert_eq!(db.max_entries, Some(10));
    }
}
