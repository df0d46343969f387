//! Conversions between reqwest types and the cache's value objects.

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

use httpcache_core::Error;
use httpcache_core::http::payload::DEFAULT_MIME_TYPE;
use httpcache_core::http::{Header, Headers, Method, Payload};

pub fn to_reqwest_method(method: &Method) -> Result<reqwest::Method, Error> {
    reqwest::Method::from_bytes(method.as_str().as_bytes())
        .map_err(|e| Error::InvalidArgument(format!("method {method}: {e}")))
}

/// Copy a reqwest header map into [`Headers`], keeping repeated fields.
///
/// Values that are not visible ASCII are dropped with a debug log; the cache
/// cannot compare them anyway.
pub fn from_header_map(map: &HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(value) => Header::new(name.as_str(), value).ok(),
            Err(_) => {
                tracing::debug!(header = %name, "skipping non-text header value");
                None
            }
        })
        .collect()
}

/// Body of a response, or `None` for an empty body without a declared type.
pub fn to_payload(headers: &HeaderMap, bytes: Bytes) -> Option<Payload> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if bytes.is_empty() && content_type.is_none() {
        return None;
    }
    Some(Payload::new(content_type.unwrap_or(DEFAULT_MIME_TYPE), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_method_conversion() {
        assert_eq!(to_reqwest_method(&Method::Get).unwrap(), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(&Method::Patch).unwrap(), reqwest::Method::PATCH);
        let custom: Method = "PURGE".parse().unwrap();
        assert_eq!(to_reqwest_method(&custom).unwrap().as_str(), "PURGE");
    }

    #[test]
    fn test_from_header_map_keeps_repeats() {
        let mut map = HeaderMap::new();
        map.append("cache-control", HeaderValue::from_static("max-age=60"));
        map.append("cache-control", HeaderValue::from_static("must-revalidate"));
        map.insert("etag", HeaderValue::from_static("\"abc\""));
        map.insert("x-binary", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        let headers = from_header_map(&map);
        assert_eq!(headers.get_all("Cache-Control").count(), 2);
        assert_eq!(headers.first("ETag"), Some("\"abc\""));
        assert!(!headers.has_header("x-binary"));
    }

    #[test]
    fn test_to_payload() {
        let mut map = HeaderMap::new();
        assert!(to_payload(&map, Bytes::new()).is_none());

        let payload = to_payload(&map, Bytes::from_static(b"raw")).unwrap();
        assert_eq!(payload.mime_type(), DEFAULT_MIME_TYPE);

        map.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        let payload = to_payload(&map, Bytes::new()).unwrap();
        assert_eq!(payload.mime_type(), "text/html");
        assert!(payload.is_empty());
    }
}
