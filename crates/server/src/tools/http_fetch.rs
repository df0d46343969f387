//! http_fetch tool implementation.
//!
//! Sends a request through the cache and reports how it was answered.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use httpcache_core::http::uri::canonicalize;
use httpcache_core::{Headers, HttpCache, HttpRequest, Method, Outcome, Payload};

use super::json_result;
use crate::error::ToolError;

/// A single header field as passed over MCP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

/// Input parameters for http_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HttpFetchParams {
    /// The URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers, in order. Repeated names are kept.
    /// `If-*` precondition headers turn the request into a pass-through.
    #[serde(default)]
    pub headers: Vec<HeaderField>,

    /// Optional request body, sent as-is.
    #[serde(default)]
    pub body: Option<String>,

    /// Media type of `body` (default: text/plain; charset=utf-8).
    #[serde(default)]
    pub content_type: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for http_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HttpFetchOutput {
    /// The normalized URL that was requested.
    pub url: String,
    /// How the cache answered.
    pub outcome: Outcome,
    /// Response status code.
    pub status: u16,
    /// Response headers, in order.
    pub headers: Vec<HeaderField>,
    /// Media type of the response body.
    pub content_type: Option<String>,
    /// Response body decoded as UTF-8 (lossy).
    pub body: Option<String>,
    /// Body size in bytes.
    pub body_bytes: usize,
}

/// Implementation of the http_fetch tool.
pub async fn fetch_impl(cache: &HttpCache, params: HttpFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url)?;
    let method: Method = params.method.parse()?;

    let headers = params
        .headers
        .into_iter()
        .try_fold(Headers::new(), |headers, field| headers.add(field.name, field.value))?;

    let payload = params.body.map(|body| {
        let mime = params.content_type.unwrap_or_else(|| "text/plain; charset=utf-8".into());
        Payload::new(mime, body)
    });

    let request = HttpRequest::new(url, method)
        .with_headers(headers)
        .with_payload(payload)
        .lift_conditionals()?;

    let resolved = cache.resolve(&request).await?;
    let response = resolved.response;

    let output = HttpFetchOutput {
        url: request.uri().to_string(),
        outcome: resolved.outcome,
        status: response.status().code(),
        headers: response
            .headers()
            .iter()
            .map(|h| HeaderField { name: h.name().to_string(), value: h.value().to_string() })
            .collect(),
        content_type: response.payload().map(|p| p.mime_type().to_string()),
        body: response
            .payload()
            .map(|p| String::from_utf8_lossy(p.bytes()).into_owned()),
        body_bytes: response.payload().map_or(0, Payload::len),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::tools::testing::{cache, output};

    fn params(url: &str) -> HttpFetchParams {
        HttpFetchParams { url: url.into(), method: default_method(), headers: Vec::new(), body: None, content_type: None }
    }

    #[tokio::test]
    async fn test_fetch_miss_then_hit() {
        let (cache, exchanger) = cache();

        let first: HttpFetchOutput = output(&fetch_impl(&cache, params("example.com/page")).await.unwrap());
        assert_eq!(first.outcome, Outcome::Miss);
        assert_eq!(first.url, "https://example.com/page");
        assert_eq!(first.status, 200);
        assert_eq!(first.body.as_deref(), Some("static body"));
        assert_eq!(first.body_bytes, 11);

        let second: HttpFetchOutput = output(&fetch_impl(&cache, params("https://example.com/page#top")).await.unwrap());
        assert_eq!(second.outcome, Outcome::FreshHit);
        assert_eq!(second.headers, first.headers);
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_precondition_header_passes_through() {
        let (cache, _) = cache();
        let mut p = params("https://example.com/page");
        p.headers.push(HeaderField { name: "If-None-Match".into(), value: "\"static\"".into() });

        let out: HttpFetchOutput = output(&fetch_impl(&cache, p).await.unwrap());
        assert_eq!(out.outcome, Outcome::PassThrough);
        assert_eq!(cache.storage().size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_post_bypasses() {
        let (cache, _) = cache();
        let mut p = params("https://example.com/items");
        p.method = "post".into();
        p.body = Some("{}".into());
        p.content_type = Some("application/json".into());

        let out: HttpFetchOutput = output(&fetch_impl(&cache, p).await.unwrap());
        assert_eq!(out.outcome, Outcome::Bypass);
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_input() {
        let (cache, _) = cache();
        assert!(fetch_impl(&cache, params("  ")).await.is_err());
        assert!(fetch_impl(&cache, params("ftp://example.com/")).await.is_err());

        let mut p = params("https://example.com/");
        p.headers.push(HeaderField { name: "Bad Name".into(), value: "x".into() });
        assert!(fetch_impl(&cache, p).await.is_err());

        let mut p = params("https://example.com/");
        p.method = "G(T".into();
        assert!(fetch_impl(&cache, p).await.is_err());
    }
}
