//! Decision counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::Outcome;

/// Running totals per outcome. Updated with relaxed atomics; totals are
/// eventually consistent with each other, never torn individually.
#[derive(Debug, Default)]
pub struct CacheStatistics {
    bypasses: AtomicU64,
    pass_throughs: AtomicU64,
    misses: AtomicU64,
    hits: AtomicU64,
    not_modified: AtomicU64,
    changed: AtomicU64,
    unsatisfiable: AtomicU64,
    stores: AtomicU64,
}

/// Plain copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StatisticsSnapshot {
    pub bypasses: u64,
    pub pass_throughs: u64,
    pub misses: u64,
    pub hits: u64,
    pub not_modified: u64,
    pub changed: u64,
    pub unsatisfiable: u64,
    pub stores: u64,
}

impl StatisticsSnapshot {
    /// Requests answered without transferring a body from the origin,
    /// as a fraction of all cache-eligible requests.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.not_modified;
        let total = served + self.misses + self.changed;
        if total == 0 { 0.0 } else { served as f64 / total as f64 }
    }
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Bypass => &self.bypasses,
            Outcome::PassThrough => &self.pass_throughs,
            Outcome::Miss => &self.misses,
            Outcome::FreshHit => &self.hits,
            Outcome::NotModified => &self.not_modified,
            Outcome::Changed => &self.changed,
            Outcome::Unsatisfiable => &self.unsatisfiable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            bypasses: self.bypasses.load(Ordering::Relaxed),
            pass_throughs: self.pass_throughs.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            changed: self.changed.load(Ordering::Relaxed),
            unsatisfiable: self.unsatisfiable.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.bypasses,
            &self.pass_throughs,
            &self.misses,
            &self.hits,
            &self.not_modified,
            &self.changed,
            &self.unsatisfiable,
            &self.stores,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = CacheStatistics::new();
        stats.record(Outcome::FreshHit);
        stats.record(Outcome::FreshHit);
        stats.record(Outcome::Miss);
        stats.record(Outcome::NotModified);
        stats.record_store();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.stores, 1);
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let stats = CacheStatistics::new();
        stats.record(Outcome::Bypass);
        stats.reset();
        assert_eq!(stats.snapshot(), StatisticsSnapshot::default());
        assert_eq!(stats.snapshot().hit_rate(), 0.0);
    }
}
