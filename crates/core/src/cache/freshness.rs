//! Cacheability and freshness rules (RFC 7234 §3 and §4.2) for a private cache.

use chrono::{DateTime, Duration, Utc};

use super::item::CacheItem;
use crate::http::{CacheControl, HttpRequest, HttpResponse};

/// Fraction of `Date - Last-Modified` used as heuristic lifetime.
const HEURISTIC_DIVISOR: i32 = 10;

/// Upper bound for heuristic lifetimes.
fn heuristic_cap() -> Duration {
    Duration::hours(24)
}

/// Whether `response` to `request` may be written to storage.
///
/// Requires a GET/HEAD request, a status cacheable by default, no `no-store`
/// on either side, no `Vary: *`, and at least one validator or an explicit
/// freshness directive.
pub fn is_cacheable(request: &HttpRequest, response: &HttpResponse) -> bool {
    if !request.method().is_cacheable() || !response.status().is_cacheable_by_default() {
        return false;
    }
    if response.cache_control().no_store || CacheControl::from_headers(&request.all_headers()).no_store {
        return false;
    }
    if response.varies_on_everything() {
        return false;
    }

    has_explicit_freshness(response) || response.has_validators()
}

/// `max-age` or `Expires` present.
pub fn has_explicit_freshness(response: &HttpResponse) -> bool {
    response.cache_control().max_age.is_some() || response.has_expires()
}

/// How long `response` stays fresh after `cached_at`.
///
/// Explicit `max-age` wins over `Expires`; `Expires` is measured from the
/// response `Date` (or `cached_at` without one); otherwise a heuristic based
/// on `Last-Modified` applies; otherwise the entry is immediately stale.
pub fn freshness_lifetime(response: &HttpResponse, cached_at: DateTime<Utc>) -> Duration {
    if let Some(max_age) = response.cache_control().max_age {
        return max_age;
    }

    let date = response.date().unwrap_or(cached_at);

    if response.has_expires() {
        return response
            .expires()
            .map(|expires| (expires - date).max(Duration::zero()))
            .unwrap_or_else(Duration::zero);
    }

    if let Some(last_modified) = response.last_modified() {
        let heuristic = (date - last_modified) / HEURISTIC_DIVISOR;
        return heuristic.clamp(Duration::zero(), heuristic_cap());
    }

    Duration::zero()
}

/// Whether `item` must be revalidated before answering `request` at `now`.
pub fn is_stale(item: &CacheItem, request: &HttpRequest, now: DateTime<Utc>) -> bool {
    let response_cc = item.response().cache_control();
    let request_cc = CacheControl::from_headers(&request.all_headers());

    if response_cc.no_cache || request_cc.no_cache {
        return true;
    }

    let age = item.age(now);
    if let Some(max_age) = request_cc.max_age
        && age > max_age
    {
        return true;
    }

    let lifetime = freshness_lifetime(item.response(), item.cached_at());
    let threshold = lifetime - request_cc.min_fresh.unwrap_or_else(Duration::zero);
    if age < threshold {
        return false;
    }

    if response_cc.must_revalidate {
        return true;
    }
    match request_cc.max_stale {
        Some(None) => false,
        Some(Some(allowed)) => age >= lifetime + allowed,
        None => true,
    }
}
