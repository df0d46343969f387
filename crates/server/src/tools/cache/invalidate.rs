//! cache_invalidate tool implementation.
//!
//! Drops every stored variant of one URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use httpcache_core::HttpCache;
use httpcache_core::http::uri::canonicalize;

use crate::tools::json_result;

/// Parameters for the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// URL whose stored responses should be removed.
    pub url: String,
}

/// Output from the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateOutput {
    /// The normalized URL.
    pub url: String,
    /// Number of variants removed.
    pub removed: u64,
}

/// Implementation of the cache_invalidate tool.
pub async fn invalidate_impl(cache: &HttpCache, params: CacheInvalidateParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url)?;
    let removed = cache.storage().invalidate(&url).await?;
    tracing::debug!(url = %url, removed, "invalidated via tool");

    json_result(&CacheInvalidateOutput { url: url.to_string(), removed })
}
