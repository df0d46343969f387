//! Cache entry CRUD for the SQLite backend.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use super::connection::SqliteStorage;
use super::item::{CacheItem, refreshed_at};
use super::key::{CacheKey, Vary};
use super::{CacheStorage, Error};
use crate::http::uri::cache_uri;
use crate::http::{Headers, HttpRequest, HttpResponse, Method, Payload, Status};

/// A row as stored, before decoding.
struct EntryRow {
    uri: String,
    method: String,
    vary_json: String,
    status: i64,
    headers_json: String,
    payload_mime: Option<String>,
    payload_bytes: Option<Vec<u8>>,
    cached_at: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uri: row.get(0)?,
            method: row.get(1)?,
            vary_json: row.get(2)?,
            status: row.get(3)?,
            headers_json: row.get(4)?,
            payload_mime: row.get(5)?,
            payload_bytes: row.get(6)?,
            cached_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<CacheItem, Error> {
        let method: Method = self.method.parse()?;
        let vary: Vary = serde_json::from_str(&self.vary_json)?;
        let headers: Headers = serde_json::from_str(&self.headers_json)?;
        let status = u16::try_from(self.status)
            .map(Status::new)
            .map_err(|_| Error::Storage(format!("invalid stored status {}", self.status)))?;
        let payload = self
            .payload_bytes
            .map(|bytes| Payload::new(self.payload_mime.unwrap_or_default(), bytes));
        let cached_at = parse_timestamp(&self.cached_at)?;

        let key = CacheKey::from_parts(self.uri, method, vary);
        Ok(CacheItem::new(key, HttpResponse::new(status, headers, payload), cached_at))
    }
}

/// Column values for an insert or update, encoded ahead of the database call.
struct EncodedEntry {
    key_hash: String,
    uri: String,
    method: String,
    vary_json: String,
    status: i64,
    headers_json: String,
    payload_mime: Option<String>,
    payload_bytes: Option<Vec<u8>>,
}

impl EncodedEntry {
    fn new(key: &CacheKey, response: &HttpResponse) -> Result<Self, Error> {
        Ok(Self {
            key_hash: key.digest(),
            uri: key.uri().to_string(),
            method: key.method().to_string(),
            vary_json: serde_json::to_string(key.vary())?,
            status: i64::from(response.status().code()),
            headers_json: serde_json::to_string(response.headers())?,
            payload_mime: response.payload().map(|p| p.mime_type().to_string()),
            payload_bytes: response.payload().map(|p| p.bytes().to_vec()),
        })
    }
}

fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("invalid cached_at {value}: {e}")))
}

const SELECT_COLUMNS: &str = "SELECT uri, method, vary_json, status, headers_json, payload_mime, payload_bytes, cached_at
     FROM cache_entries";

impl SqliteStorage {
    /// Purge oldest entries until count <= max_entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn evict_oldest(&self, max_entries: usize) -> Result<u64, Error> {
        let max = row_limit(max_entries);
        self.conn
            .call(move |conn| -> Result<u64, Error> { Ok(evict_oldest_in(conn, max)?) })
            .await
            .map_err(Error::from)
    }
}

/// SQLite counts rows as `i64`; larger bounds mean unbounded.
fn row_limit(max_entries: usize) -> i64 {
    i64::try_from(max_entries).unwrap_or(i64::MAX)
}

fn evict_oldest_in(conn: &rusqlite::Connection, max: i64) -> Result<u64, rusqlite::Error> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
    if count <= max {
        return Ok(0);
    }

    let to_delete = count - max;
    let deleted = conn.execute(
        "DELETE FROM cache_entries WHERE key_hash IN (
            SELECT key_hash FROM cache_entries ORDER BY cached_at ASC LIMIT ?1
        )",
        params![to_delete],
    )?;
    tracing::debug!("evicted {} cache entries", deleted);
    Ok(deleted as u64)
}

#[async_trait]
impl CacheStorage for SqliteStorage {
    async fn insert(&self, request: &HttpRequest, response: HttpResponse) -> Result<CacheItem, Error> {
        let key = CacheKey::new(request, &response);
        let entry = EncodedEntry::new(&key, &response)?;
        let cached_at = Utc::now();
        let cached_at_text = format_timestamp(&cached_at);
        let max_entries = self.max_entries.map(row_limit);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (
                        key_hash, uri, method, vary_json, status, headers_json,
                        payload_mime, payload_bytes, cached_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        uri = excluded.uri,
                        method = excluded.method,
                        vary_json = excluded.vary_json,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        payload_mime = excluded.payload_mime,
                        payload_bytes = excluded.payload_bytes,
                        cached_at = excluded.cached_at",
                    params![
                        &entry.key_hash,
                        &entry.uri,
                        &entry.method,
                        &entry.vary_json,
                        entry.status,
                        &entry.headers_json,
                        &entry.payload_mime,
                        &entry.payload_bytes,
                        &cached_at_text,
                    ],
                )?;
                if let Some(max) = max_entries {
                    evict_oldest_in(conn, max)?;
                }
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheItem::new(key, response, cached_at))
    }

    async fn get(&self, request: &HttpRequest) -> Result<Option<CacheItem>, Error> {
        let uri = cache_uri(request.uri());
        let method = request.method().to_string();

        let candidates = self
            .conn
            .call(move |conn| -> Result<Vec<CacheItem>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE uri = ?1 AND method = ?2 ORDER BY cached_at DESC"
                ))?;
                let rows = stmt
                    .query_map(params![uri, method], EntryRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows.into_iter().map(EntryRow::decode).collect()
            })
            .await
            .map_err(Error::from)?;

        Ok(candidates.into_iter().find(|item| item.key().matches(request)))
    }

    async fn update(&self, request: &HttpRequest, response: HttpResponse) -> Result<CacheItem, Error> {
        let key = CacheKey::new(request, &response);
        let entry = EncodedEntry::new(&key, &response)?;
        let missing = format!("{} {}", key.method(), key.uri());

        let cached_at = self
            .conn
            .call(move |conn| -> Result<DateTime<Utc>, Error> {
                let previous = conn.query_row(
                    "SELECT cached_at FROM cache_entries WHERE key_hash = ?1",
                    params![&entry.key_hash],
                    |row| row.get::<_, String>(0),
                );
                let previous = match previous {
                    Ok(text) => parse_timestamp(&text)?,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Err(Error::NotFound(missing)),
                    Err(e) => return Err(e.into()),
                };

                let cached_at = refreshed_at(previous);
                conn.execute(
                    "UPDATE cache_entries SET
                        status = ?2,
                        headers_json = ?3,
                        payload_mime = ?4,
                        payload_bytes = ?5,
                        cached_at = ?6
                    WHERE key_hash = ?1",
                    params![
                        &entry.key_hash,
                        entry.status,
                        &entry.headers_json,
                        &entry.payload_mime,
                        &entry.payload_bytes,
                        format_timestamp(&cached_at),
                    ],
                )?;
                Ok(cached_at)
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheItem::new(key, response, cached_at))
    }

    async fn invalidate(&self, uri: &Url) -> Result<u64, Error> {
        let uri = cache_uri(uri);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE uri = ?1", params![uri])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn size(&self) -> Result<usize, Error> {
        self.conn
            .call(|conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    async fn clear(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                conn.execute("DELETE FROM cache_entries", [])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::contract;

    #[tokio::test]
    async fn test_storage_contract() {
        contract::run_all(|| async { SqliteStorage::open_in_memory().await.unwrap() }).await;
    }

    #[tokio::test]
    async fn test_round_trip_preserves_response() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        let req = contract::request("https://example.com/page");
        let resp = contract::response(
            &[("ETag", "\"abc\""), ("Set-Cookie", "a=1"), ("Set-Cookie", "b=2")],
            "hello",
        )
        .with_status(Status::NON_AUTHORITATIVE_INFORMATION);

        let inserted = db.insert(&req, resp.clone()).await.unwrap();
        let stored = db.get(&req).await.unwrap().unwrap();

        assert_eq!(stored.response(), &resp);
        assert_eq!(stored.cached_at(), inserted.cached_at());
        assert_eq!(stored.key(), inserted.key());
    }

    #[tokio::test]
    async fn test_response_without_payload() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        let req = contract::request("https://example.com/empty");
        let resp = HttpResponse::new(Status::NO_CONTENT, Headers::new(), None);

        db.insert(&req, resp).await.unwrap();
        let stored = db.get(&req).await.unwrap().unwrap();
        assert!(stored.response().payload().is_none());
    }

    #[tokio::test]
    async fn test_evict_oldest() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        for path in ["a", "b", "c"] {
            let req = contract::request(&format!("https://example.com/{path}"));
            db.insert(&req, contract::response(&[], "x")).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let deleted = db.evict_oldest(1).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(db.get(&contract::request("https://example.com/c")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_max_entries_applied_on_insert() {
        let db = SqliteStorage::open_in_memory().await.unwrap().with_max_entries(Some(2));
        for path in ["a", "b", "c"] {
            let req = contract::request(&format!("https://example.com/{path}"));
            db.insert(&req, contract::response(&[], "x")).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert_eq!(db.size().await.unwrap(), 2);
        assert!(db.get(&contract::request("https://example.com/a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_huge_max_entries_keeps_everything() {
        let db = SqliteStorage::open_in_memory().await.unwrap().with_max_entries(Some(usize::MAX));
        for path in ["a", "b"] {
            let req = contract::request(&format!("https://example.com/{path}"));
            db.insert(&req, contract::response(&[], "x")).await.unwrap();
        }
        assert_eq!(db.size().await.unwrap(), 2);
        assert_eq!(db.evict_oldest(usize::MAX).await.unwrap(), 0);
        assert_eq!(row_limit(usize::MAX), i64::MAX);
    }

    #[tokio::test]
    async fn test_corrupt_row_surfaces_storage_error() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        let req = contract::request("https://example.com/bad");
        db.insert(&req, contract::response(&[], "x")).await.unwrap();

        db.conn
            .call(|conn| conn.execute("UPDATE cache_entries SET headers_json = 'not json'", []))
            .await
            .unwrap();

        let result = db.get(&req).await;
        assert!(matches!(result, Err(e) if e.is_storage()));
    }
}
