//! Stored cache entries.

use chrono::{DateTime, Duration, Utc};

use super::key::CacheKey;
use crate::http::HttpResponse;

/// A stored response together with the time it entered storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    key: CacheKey,
    response: HttpResponse,
    cached_at: DateTime<Utc>,
}

impl CacheItem {
    pub fn new(key: CacheKey, response: HttpResponse, cached_at: DateTime<Utc>) -> Self {
        Self { key, response, cached_at }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Time spent in storage; never negative.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.cached_at).max(Duration::zero())
    }
}

/// Timestamp for a refreshed entry: now, but strictly after `previous` even
/// if the wall clock stalled or stepped backwards.
pub(crate) fn refreshed_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous { now } else { previous + Duration::microseconds(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refreshed_at_strictly_later() {
        let future = Utc::now() + Duration::hours(1);
        assert!(refreshed_at(future) > future);

        let past = Utc::now() - Duration::hours(1);
        assert!(refreshed_at(past) > past);
    }
}
