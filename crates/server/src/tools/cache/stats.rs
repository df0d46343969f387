//! cache_stats tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use httpcache_core::{HttpCache, StatisticsSnapshot};

use crate::tools::json_result;

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    /// Stored variants.
    pub entries: usize,
    /// Decision counters since start or the last reset.
    pub counters: StatisticsSnapshot,
    /// Fraction of cache-eligible requests answered from storage.
    pub hit_rate: f64,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(cache: &HttpCache) -> Result<CallToolResult, McpError> {
    let entries = cache.storage().size().await?;
    let counters = cache.statistics();

    json_result(&CacheStatsOutput { entries, counters, hit_rate: counters.hit_rate() })
}
