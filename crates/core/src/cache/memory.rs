//! In-memory cache storage.
//!
//! Entries are grouped per normalized URI so invalidation drops every variant
//! in one step. A tokio `RwLock` serialises writers, which makes mutations of
//! a key linearizable; readers clone complete items out of the map.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use url::Url;

use super::item::{CacheItem, refreshed_at};
use super::key::CacheKey;
use super::{CacheStorage, Error};
use crate::http::uri::cache_uri;
use crate::http::{HttpRequest, HttpResponse};

/// Default number of variants kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Variants keyed by digest, grouped by URI.
type Variants = HashMap<String, CacheItem>;

/// Bounded in-memory storage. Clones share the same entries.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, Variants>>>,
    capacity: Option<usize>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryStorage {
    /// Storage without an upper bound.
    pub fn unbounded() -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), capacity: None }
    }

    /// Storage holding at most `capacity` variants; the entry with the oldest
    /// cached-at time goes first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), capacity: Some(capacity.max(1)) }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn evict(&self, entries: &mut HashMap<String, Variants>) {
        let Some(capacity) = self.capacity else {
            return;
        };

        let mut total: usize = entries.values().map(HashMap::len).sum();
        while total > capacity {
            let oldest = entries
                .iter()
                .flat_map(|(uri, variants)| variants.iter().map(move |(digest, item)| (uri, digest, item.cached_at())))
                .min_by_key(|(_, _, cached_at)| *cached_at)
                .map(|(uri, digest, _)| (uri.clone(), digest.clone()));

            let Some((uri, digest)) = oldest else {
                break;
            };

            if let Some(variants) = entries.get_mut(&uri) {
                variants.remove(&digest);
                if variants.is_empty() {
                    entries.remove(&uri);
                }
            }
            tracing::debug!("evicted oldest cache entry for {}", uri);
            total -= 1;
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn insert(&self, request: &HttpRequest, response: HttpResponse) -> Result<CacheItem, Error> {
        let key = CacheKey::new(request, &response);
        let digest = key.digest();
        let uri = key.uri().to_string();
        let item = CacheItem::new(key, response, Utc::now());

        let mut entries = self.entries.write().await;
        entries.entry(uri).or_default().insert(digest, item.clone());
        self.evict(&mut entries);

        Ok(item)
    }

    async fn get(&self, request: &HttpRequest) -> Result<Option<CacheItem>, Error> {
        let entries = self.entries.read().await;
        let found = entries.get(&cache_uri(request.uri())).and_then(|variants| {
            variants
                .values()
                .filter(|item| item.key().matches(request))
                .max_by_key(|item| item.cached_at())
                .cloned()
        });
        Ok(found)
    }

    async fn update(&self, request: &HttpRequest, response: HttpResponse) -> Result<CacheItem, Error> {
        let key = CacheKey::new(request, &response);
        let digest = key.digest();

        let mut entries = self.entries.write().await;
        let existing = entries
            .get_mut(key.uri())
            .and_then(|variants| variants.get_mut(&digest))
            .ok_or_else(|| Error::NotFound(format!("{} {}", key.method(), key.uri())))?;

        let item = CacheItem::new(key, response, refreshed_at(existing.cached_at()));
        *existing = item.clone();

        Ok(item)
    }

    async fn invalidate(&self, uri: &Url) -> Result<u64, Error> {
        let mut entries = self.entries.write().await;
        let removed = entries
            .remove(&cache_uri(uri))
            .map_or(0, |variants| variants.len() as u64);
        Ok(removed)
    }

    async fn size(&self) -> Result<usize, Error> {
        let entries = self.entries.read().await;
        Ok(entries.values().map(HashMap::len).sum())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.entries.write().await.clear();
        Ok(())
    }
}
