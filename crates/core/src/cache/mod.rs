//! Cache storage abstraction and backends.
//!
//! [`CacheStorage`] is the capability every backend provides. Two backends
//! ship with the crate:
//!
//! - [`MemoryStorage`]: a bounded map behind a tokio `RwLock`
//! - [`SqliteStorage`]: a persistent store using tokio-rusqlite, WAL mode and
//!   versioned migrations
//!
//! Both guarantee that mutations of one key are linearizable and that `get`
//! only ever observes complete entries.

pub mod connection;
pub mod entries;
pub mod freshness;
pub mod item;
pub mod key;
pub mod memory;
pub mod migrations;

use async_trait::async_trait;
use url::Url;

pub use crate::Error;

pub use connection::SqliteStorage;
pub use item::CacheItem;
pub use key::{CacheKey, Vary};
pub use memory::MemoryStorage;

use crate::http::{HttpRequest, HttpResponse};

/// Key-value store for cached responses.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Store `response` under the key derived from `request` and the
    /// response's `Vary` field, replacing any entry at that key.
    async fn insert(&self, request: &HttpRequest, response: HttpResponse) -> Result<CacheItem, Error>;

    /// Find the stored variant that answers `request`.
    async fn get(&self, request: &HttpRequest) -> Result<Option<CacheItem>, Error>;

    /// Replace an existing entry and refresh its cached-at time.
    ///
    /// Fails with [`Error::NotFound`] when nothing is stored at the key.
    async fn update(&self, request: &HttpRequest, response: HttpResponse) -> Result<CacheItem, Error>;

    /// Remove every variant stored for `uri`. Returns how many were removed.
    async fn invalidate(&self, uri: &Url) -> Result<u64, Error>;

    /// Number of stored variants.
    async fn size(&self) -> Result<usize, Error>;

    /// Remove everything.
    async fn clear(&self) -> Result<(), Error>;
}
