//! Cache key derivation.
//!
//! A key is the normalized request URI, the method and, when the stored
//! response carries `Vary`, the request's values for exactly those fields.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::http::uri::cache_uri;
use crate::http::{HttpRequest, HttpResponse, Method};

/// Request header values selected by a response's `Vary` field.
///
/// Field names are lower-cased and sorted. An absent request header is
/// `None`, which is distinct from an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vary {
    fields: Vec<(String, Option<String>)>,
}

impl Vary {
    /// Select the values of `names` from `request`.
    pub fn select(names: &[String], request: &HttpRequest) -> Self {
        let headers = request.all_headers();
        let mut fields: Vec<(String, Option<String>)> = names
            .iter()
            .map(|name| (name.to_ascii_lowercase(), headers.joined(name)))
            .collect();
        fields.sort();
        fields.dedup_by(|a, b| a.0 == b.0);
        Self { fields }
    }

    /// Selection driven by `response`'s `Vary` header.
    pub fn from_response(response: &HttpResponse, request: &HttpRequest) -> Self {
        Self::select(&response.vary(), request)
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn fields(&self) -> &[(String, Option<String>)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when `request` carries the same values for the recorded fields.
    pub fn matches(&self, request: &HttpRequest) -> bool {
        *self == Self::select(&self.names(), request)
    }

    fn canonical(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| match value {
                Some(v) => format!("{name}={v}"),
                None => format!("{name}!"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Identity of one stored variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    uri: String,
    method: Method,
    vary: Vary,
}

impl CacheKey {
    /// Key under which `response` to `request` is stored.
    pub fn new(request: &HttpRequest, response: &HttpResponse) -> Self {
        Self {
            uri: cache_uri(request.uri()),
            method: request.method().clone(),
            vary: Vary::from_response(response, request),
        }
    }

    pub(crate) fn from_parts(uri: String, method: Method, vary: Vary) -> Self {
        Self { uri, method, vary }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn vary(&self) -> &Vary {
        &self.vary
    }

    /// Whether `request` would be answered by the entry stored under this key.
    pub fn matches(&self, request: &HttpRequest) -> bool {
        self.uri == cache_uri(request.uri()) && &self.method == request.method() && self.vary.matches(request)
    }

    /// Stable hex digest, used as the storage identity.
    pub fn digest(&self) -> String {
        compute_cache_key(&self.uri, self.method.as_str(), &self.vary.canonical())
    }
}

/// Compute a content-addressed cache key.
pub fn compute_cache_key(uri: &str, method: &str, vary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uri.as_bytes());
    hasher.update(b"\n");
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(vary.as_bytes());
    hex::encode(hasher.finalize())
}
