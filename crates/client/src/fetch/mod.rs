//! HTTP exchange with origin servers.
//!
//! ### Requests
//! - Method, every header from `HttpRequest::all_headers`, payload as body
//! - A challenge is sent as HTTP basic credentials
//!
//! ### Limits
//! - Timeout: 20s (configurable), reported as `TRANSPORT_TIMEOUT`
//! - Redirects: none followed by default, so 3xx answers reach the cache
//! - Max body bytes: 5MB (configurable), reported as `RESPONSE_TOO_LARGE`
//!
//! Non-2xx statuses are ordinary responses, never errors.

pub mod convert;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use httpcache_core::engine::NetworkExchanger;
use httpcache_core::http::{HttpRequest, HttpResponse, Status};
use httpcache_core::{AppConfig, Error};

use convert::{from_header_map, to_payload, to_reqwest_method};

/// Configuration for the exchanger.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// User agent string (default: "httpcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 0)
    pub max_redirects: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            user_agent: "httpcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 0,
        }
    }
}

impl From<&AppConfig> for ExchangeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// `NetworkExchanger` backed by a shared reqwest client.
pub struct ReqwestExchanger {
    http: Client,
    config: ExchangeConfig,
}

impl ReqwestExchanger {
    /// Create a new exchanger with the given configuration.
    pub fn new(config: ExchangeConfig) -> Result<Self, Error> {
        let redirect = match config.max_redirects {
            0 => reqwest::redirect::Policy::none(),
            n => reqwest::redirect::Policy::limited(n),
        };

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Translate `request` into a reqwest request without sending it.
    pub fn prepare(&self, request: &HttpRequest) -> Result<reqwest::Request, Error> {
        let method = to_reqwest_method(request.method())?;
        let mut builder = self.http.request(method, request.uri().as_str());

        for header in &request.all_headers() {
            builder = builder.header(header.name(), header.value());
        }
        if let Some(challenge) = request.challenge() {
            builder = builder.basic_auth(&challenge.identifier, Some(&challenge.secret));
        }
        if let Some(payload) = request.payload() {
            builder = builder.body(payload.bytes().clone());
        }

        builder.build().map_err(|e| Error::InvalidArgument(format!("invalid request: {}", e)))
    }

    fn too_large(&self, len: u64) -> Error {
        Error::ResponseTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

fn transport_error(context: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::TransportTimeout(format!("{}: {}", context, e))
    } else {
        Error::Transport(format!("{}: {}", context, e))
    }
}

#[async_trait]
impl NetworkExchanger for ReqwestExchanger {
    async fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let start = Instant::now();
        let prepared = self.prepare(request)?;

        let response = self
            .http
            .execute(prepared)
            .await
            .map_err(|e| transport_error("network error", e))?;

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes as u64
        {
            return Err(self.too_large(len));
        }

        let status = Status::new(response.status().as_u16());
        let header_map = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("failed to read response", e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(self.too_large(bytes.len() as u64));
        }

        tracing::debug!(
            "exchanged {} {} -> {} in {}ms ({} bytes)",
            request.method(),
            request.uri(),
            status.code(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        let headers = from_header_map(&header_map);
        let payload = to_payload(&header_map, bytes);
        Ok(HttpResponse::new(status, headers, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpcache_core::http::{Challenge, Conditionals, Method, Payload, Tag};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    /// Serve one canned response on a local port and hand back the raw
    /// request head that was received.
    async fn serve_once(response: &'static str) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).to_lowercase()
        });
        (Url::parse(&format!("http://{addr}/resource")).unwrap(), handle)
    }

    #[test]
    fn test_exchange_config_default() {
        let config = ExchangeConfig::default();
        assert_eq!(config.user_agent, "httpcache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 0);
    }

    #[test]
    fn test_exchange_config_from_app_config() {
        let app = AppConfig { user_agent: "custom/1.0".into(), timeout_ms: 1500, max_redirects: 3, ..Default::default() };
        let config = ExchangeConfig::from(&app);
        assert_eq!(config.user_agent, "custom/1.0");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_redirects, 3);
    }

    #[tokio::test]
    async fn test_exchanger_new() {
        assert!(ReqwestExchanger::new(ExchangeConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_prepare_carries_everything() {
        let exchanger = ReqwestExchanger::new(ExchangeConfig::default()).unwrap();
        let conditionals = Conditionals::new().add_if_none_match(Tag::strong("abc")).unwrap();
        let request = HttpRequest::new(Url::parse("https://example.com/items").unwrap(), Method::Put)
            .with_header("X-Trace", "1")
            .unwrap()
            .with_conditionals(conditionals)
            .with_challenge(Some(Challenge { identifier: "user".into(), secret: "pass".into() }))
            .with_payload(Some(Payload::new("application/json", "{}")));

        let prepared = exchanger.prepare(&request).unwrap();
        assert_eq!(prepared.method(), reqwest::Method::PUT);
        assert_eq!(prepared.url().as_str(), "https://example.com/items");

        let headers = prepared.headers();
        assert_eq!(headers.get("x-trace").unwrap(), "1");
        assert_eq!(headers.get("if-none-match").unwrap(), "\"abc\"");
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert!(headers.get("authorization").unwrap().to_str().unwrap().starts_with("Basic "));
        assert_eq!(prepared.body().and_then(|b| b.as_bytes()), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_exchange_round_trip() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nETag: \"v1\"\r\n\
             Cache-Control: max-age=60\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;
        let exchanger = ReqwestExchanger::new(ExchangeConfig::default()).unwrap();

        let response = exchanger.exchange(&HttpRequest::get(url)).await.unwrap();
        assert_eq!(response.status(), Status::OK);
        assert_eq!(response.headers().first("etag"), Some("\"v1\""));
        assert_eq!(response.cache_control().max_age.map(|d| d.num_seconds()), Some(60));
        let payload = response.payload().unwrap();
        assert_eq!(payload.mime_type(), "text/plain");
        assert_eq!(payload.bytes().as_ref(), b"hello");

        let received = server.await.unwrap();
        assert!(received.starts_with("get /resource http/1.1"));
        assert!(received.contains("user-agent: httpcache/0.1"));
    }

    #[tokio::test]
    async fn test_exchange_does_not_follow_redirects() {
        let (url, server) = serve_once(
            "HTTP/1.1 301 Moved Permanently\r\nLocation: /elsewhere\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let exchanger = ReqwestExchanger::new(ExchangeConfig::default()).unwrap();

        let response = exchanger.exchange(&HttpRequest::get(url)).await.unwrap();
        assert_eq!(response.status(), Status::MOVED_PERMANENTLY);
        assert_eq!(response.headers().first("Location"), Some("/elsewhere"));
        assert!(response.payload().is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_exchange_rejects_large_body() {
        let (url, server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\n0123456789").await;
        let exchanger = ReqwestExchanger::new(ExchangeConfig { max_bytes: 4, ..Default::default() }).unwrap();

        let result = exchanger.exchange(&HttpRequest::get(url)).await;
        assert!(matches!(result, Err(Error::ResponseTooLarge(_))));
        let _ = server.await;
    }

    #[tokio::test]
    async fn test_exchange_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let exchanger = ReqwestExchanger::new(ExchangeConfig::default()).unwrap();
        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let result = exchanger.exchange(&HttpRequest::get(url)).await;
        assert!(matches!(result, Err(e) if e.is_transport()));
    }
}
