//! cache_clear tool implementation.
//!
//! Empties storage and optionally resets the decision counters.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use httpcache_core::HttpCache;

use crate::tools::json_result;

/// Parameters for the cache_clear tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {
    /// Also reset hit/miss counters.
    #[serde(default)]
    pub reset_statistics: bool,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Variants stored before the clear.
    pub removed: usize,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(cache: &HttpCache, params: CacheClearParams) -> Result<CallToolResult, McpError> {
    let removed = cache.storage().size().await?;
    cache.storage().clear().await?;
    if params.reset_statistics {
        cache.reset_statistics();
    }
    tracing::info!(removed, reset_statistics = params.reset_statistics, "cache cleared");

    json_result(&CacheClearOutput { removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::http_fetch::{HttpFetchParams, fetch_impl};
    use crate::tools::testing::{cache, output};

    async fn warm(cache: &HttpCache, url: &str) {
        let params = HttpFetchParams {
            url: url.into(),
            method: "GET".into(),
            headers: Vec::new(),
            body: None,
            content_type: None,
        };
        fetch_impl(cache, params).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_keeps_statistics_by_default() {
        let (cache, _) = cache();
        warm(&cache, "https://example.com/a").await;
        warm(&cache, "https://example.com/b").await;

        let out: CacheClearOutput = output(&clear_impl(&cache, CacheClearParams::default()).await.unwrap());
        assert_eq!(out.removed, 2);
        assert_eq!(cache.storage().size().await.unwrap(), 0);
        assert_eq!(cache.statistics().misses, 2);
    }

    #[tokio::test]
    async fn test_clear_with_reset() {
        let (cache, _) = cache();
        warm(&cache, "https://example.com/a").await;

        clear_impl(&cache, CacheClearParams { reset_statistics: true }).await.unwrap();
        assert_eq!(cache.statistics().misses, 0);
    }
}
