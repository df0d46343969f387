//! Cache decision engine.
//!
//! [`HttpCache`] sits between a caller and a [`NetworkExchanger`]. For every
//! request it decides whether storage can answer, whether the stored answer
//! must be revalidated with the origin, or whether the cache stays out of the
//! way entirely. Storage is updated as a side effect of that decision.
//!
//! The engine holds no per-request state and may be shared between tasks
//! behind an `Arc`. Concurrent misses on the same key are not coalesced; each
//! caller reaches the origin and the last insert wins.

pub mod exchange;
pub mod stats;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

pub use exchange::NetworkExchanger;
pub use stats::{CacheStatistics, StatisticsSnapshot};

use crate::Error;
use crate::cache::freshness::{is_cacheable, is_stale};
use crate::cache::{CacheItem, CacheStorage};
use crate::http::header::names;
use crate::http::uri::{normalize, same_origin};
use crate::http::{CacheControl, Conditionals, Headers, HttpRequest, HttpResponse, Status};

/// Request headers that make a request the caller's own conditional request.
const CALLER_PRECONDITIONS: &[&str] = &[
    names::IF_MATCH,
    names::IF_NONE_MATCH,
    names::IF_MODIFIED_SINCE,
    names::IF_UNMODIFIED_SINCE,
    names::IF_RANGE,
];

/// Terminal state of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Method is never cached; the request went straight to the origin.
    Bypass,
    /// The caller asked for something the cache must not interpret
    /// (its own preconditions, or `no-store`).
    PassThrough,
    /// Nothing usable was stored; the origin answered.
    Miss,
    /// Stored response returned without contacting the origin.
    FreshHit,
    /// Stored response revalidated with a 304.
    NotModified,
    /// Stored response revalidated and the origin sent a new one.
    Changed,
    /// `only-if-cached` could not be honoured; a 504 was synthesized.
    Unsatisfiable,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Bypass => "bypass",
            Outcome::PassThrough => "pass_through",
            Outcome::Miss => "miss",
            Outcome::FreshHit => "fresh_hit",
            Outcome::NotModified => "not_modified",
            Outcome::Changed => "changed",
            Outcome::Unsatisfiable => "unsatisfiable",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response handed back to the caller plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub response: HttpResponse,
    pub outcome: Outcome,
}

impl Resolved {
    fn new(response: HttpResponse, outcome: Outcome) -> Self {
        Self { response, outcome }
    }
}

/// Caching layer in front of a network exchanger.
#[derive(Clone)]
pub struct HttpCache {
    storage: Arc<dyn CacheStorage>,
    exchanger: Arc<dyn NetworkExchanger>,
    stats: Arc<CacheStatistics>,
}

impl HttpCache {
    pub fn new(storage: Arc<dyn CacheStorage>, exchanger: Arc<dyn NetworkExchanger>) -> Self {
        Self { storage, exchanger, stats: Arc::new(CacheStatistics::new()) }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.stats.reset();
    }

    /// Answer `request`, returning only the response.
    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.resolve(request).await.map(|resolved| resolved.response)
    }

    /// Answer `request` and report which path produced the response.
    ///
    /// # Errors
    ///
    /// Exchanger and storage failures are returned unchanged. A failure never
    /// leaves a partially written entry behind, and a stale entry whose
    /// revalidation failed stays in storage.
    pub async fn resolve(&self, request: &HttpRequest) -> Result<Resolved, Error> {
        let resolved = self.decide(request).await?;
        tracing::debug!(
            uri = %request.uri(),
            method = %request.method(),
            outcome = %resolved.outcome,
            status = resolved.response.status().code(),
            "cache decision"
        );
        self.stats.record(resolved.outcome);
        Ok(resolved)
    }

    async fn decide(&self, request: &HttpRequest) -> Result<Resolved, Error> {
        if !request.method().is_cacheable() {
            return self.bypass(request).await;
        }

        if has_caller_preconditions(request) {
            tracing::debug!(uri = %request.uri(), "caller preconditions present, passing through");
            return self.pass_through(request).await;
        }

        let request_cc = CacheControl::from_headers(&request.all_headers());
        if request_cc.no_store {
            tracing::debug!(uri = %request.uri(), "request no-store, passing through");
            return self.pass_through(request).await;
        }

        let Some(item) = self.storage.get(request).await? else {
            return self.miss(request, &request_cc).await;
        };

        if !is_stale(&item, request, Utc::now()) {
            tracing::debug!(uri = %request.uri(), cached_at = %item.cached_at(), "fresh entry");
            return Ok(Resolved::new(item.into_response(), Outcome::FreshHit));
        }

        if request_cc.only_if_cached {
            tracing::debug!(uri = %request.uri(), "stale entry and only-if-cached");
            return Ok(unsatisfiable());
        }

        self.revalidate(request, item).await
    }

    async fn bypass(&self, request: &HttpRequest) -> Result<Resolved, Error> {
        let response = self.exchanger.exchange(request).await?;
        if !request.method().is_safe() && response.status().is_non_error() {
            self.invalidate_affected(request, &response).await?;
        }
        Ok(Resolved::new(response, Outcome::Bypass))
    }

    async fn pass_through(&self, request: &HttpRequest) -> Result<Resolved, Error> {
        let response = self.exchanger.exchange(request).await?;
        Ok(Resolved::new(response, Outcome::PassThrough))
    }

    async fn miss(&self, request: &HttpRequest, request_cc: &CacheControl) -> Result<Resolved, Error> {
        if request_cc.only_if_cached {
            tracing::debug!(uri = %request.uri(), "miss and only-if-cached");
            return Ok(unsatisfiable());
        }

        tracing::debug!(uri = %request.uri(), "miss, exchanging");
        let response = self.exchanger.exchange(request).await?;
        if is_cacheable(request, &response) {
            self.storage.insert(request, response.clone()).await?;
            self.stats.record_store();
        } else {
            tracing::debug!(uri = %request.uri(), status = response.status().code(), "response not cacheable");
        }
        Ok(Resolved::new(response, Outcome::Miss))
    }

    async fn revalidate(&self, request: &HttpRequest, item: CacheItem) -> Result<Resolved, Error> {
        let conditional = request.with_conditionals(validators(item.response())?);
        tracing::debug!(uri = %request.uri(), cached_at = %item.cached_at(), "stale entry, revalidating");

        let response = self.exchanger.exchange(&conditional).await?;

        if response.status() == Status::NOT_MODIFIED {
            let stored = item.into_response();
            let merged = HttpResponse::new(stored.status(), response.headers().clone(), stored.payload().cloned());
            if merged.cache_control().no_store {
                self.drop_entry(request, "origin answered no-store").await?;
            } else {
                self.store_revalidated(request, &merged).await?;
            }
            return Ok(Resolved::new(merged, Outcome::NotModified));
        }

        if is_cacheable(request, &response) {
            self.store_revalidated(request, &response).await?;
        } else if response.cache_control().no_store {
            self.drop_entry(request, "origin answered no-store").await?;
        } else if !response.status().is_server_error() {
            self.drop_entry(request, "replacement not storable").await?;
        }
        Ok(Resolved::new(response, Outcome::Changed))
    }

    /// Write a revalidated response back, inserting when its key moved.
    async fn store_revalidated(&self, request: &HttpRequest, response: &HttpResponse) -> Result<(), Error> {
        match self.storage.update(request, response.clone()).await {
            Ok(_) => {}
            Err(Error::NotFound(_)) => {
                tracing::debug!(uri = %request.uri(), "key moved during revalidation, inserting");
                self.storage.insert(request, response.clone()).await?;
            }
            Err(e) => return Err(e),
        }
        self.stats.record_store();
        Ok(())
    }

    async fn drop_entry(&self, request: &HttpRequest, reason: &str) -> Result<(), Error> {
        let removed = self.storage.invalidate(request.uri()).await?;
        tracing::debug!(uri = %request.uri(), removed, reason, "stale entry dropped");
        Ok(())
    }

    /// Drop entries an unsafe request may have changed: the target itself and
    /// any same-origin `Location` or `Content-Location`.
    async fn invalidate_affected(&self, request: &HttpRequest, response: &HttpResponse) -> Result<(), Error> {
        let mut targets: Vec<Url> = vec![normalize(request.uri())];

        for name in [names::LOCATION, names::CONTENT_LOCATION] {
            let Some(value) = response.headers().first(name) else {
                continue;
            };
            match request.uri().join(value) {
                Ok(target) if same_origin(request.uri(), &target) => {
                    let target = normalize(&target);
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
                Ok(target) => tracing::debug!(%target, "skipping cross-origin invalidation"),
                Err(e) => tracing::debug!(header = name, value, "unresolvable location: {}", e),
            }
        }

        for target in &targets {
            let removed = self.storage.invalidate(target).await?;
            tracing::debug!(uri = %target, removed, method = %request.method(), "invalidated");
        }
        Ok(())
    }
}

fn has_caller_preconditions(request: &HttpRequest) -> bool {
    if !request.conditionals().is_unconditional() {
        return true;
    }
    let headers = request.headers();
    CALLER_PRECONDITIONS.iter().any(|name| headers.has_header(name))
}

/// Conditionals built from the validators of a stored response.
fn validators(stored: &HttpResponse) -> Result<Conditionals, Error> {
    let mut conditionals = Conditionals::new();
    if let Some(tag) = stored.etag() {
        conditionals = conditionals.add_if_none_match(tag)?;
    }
    if let Some(last_modified) = stored.last_modified() {
        conditionals = conditionals.if_modified_since(last_modified)?;
    }
    Ok(conditionals)
}

fn unsatisfiable() -> Resolved {
    Resolved::new(
        HttpResponse::new(Status::GATEWAY_TIMEOUT, Headers::new(), None),
        Outcome::Unsatisfiable,
    )
}
