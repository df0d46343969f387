//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{CacheClearParams, CacheInvalidateParams, clear_impl, invalidate_impl, stats_impl};
use crate::tools::http_fetch::{HttpFetchParams, fetch_impl};

use httpcache_core::HttpCache;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mcp-httpcache.
#[derive(Clone)]
pub struct HttpCacheServer {
    cache: HttpCache,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl HttpCacheServer {
    /// Create a new server handler around a configured cache.
    pub fn new(cache: HttpCache) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    /// Send an HTTP request through the cache.
    #[tool(
        description = "Send an HTTP request through the cache. Returns status, headers, body and the cache outcome (miss, fresh_hit, not_modified, changed, bypass, pass_through, unsatisfiable)."
    )]
    async fn http_fetch(&self, params: Parameters<HttpFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.cache, params.0).await
    }

    /// Remove every stored variant of a URL.
    #[tool(description = "Remove every cached variant of a URL. Returns the number of entries removed.")]
    async fn cache_invalidate(&self, params: Parameters<CacheInvalidateParams>) -> Result<CallToolResult, McpError> {
        invalidate_impl(&self.cache, params.0).await
    }

    /// Report storage size and decision counters.
    #[tool(description = "Report the number of cached entries and hit/miss/revalidation counters.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.cache).await
    }

    /// Empty the cache.
    #[tool(description = "Remove all cached entries, optionally resetting the counters.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        clear_impl(&self.cache, params.0).await
    }
}

impl ServerHandler for HttpCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-httpcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::cache;

    #[test]
    fn test_lists_all_tools() {
        let (cache, _) = cache();
        let server = HttpCacheServer::new(cache);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["cache_clear", "cache_invalidate", "cache_stats", "http_fetch"]);
    }

    #[test]
    fn test_server_info() {
        let (cache, _) = cache();
        let info = HttpCacheServer::new(cache).get_info();
        assert_eq!(info.server_info.name, "mcp-httpcache");
        assert!(info.capabilities.tools.is_some());
    }
}
