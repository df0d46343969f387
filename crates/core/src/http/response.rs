//! Origin and cached responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cache_control::CacheControl;
use super::date::parse_http_date;
use super::header::{Headers, names};
use super::payload::Payload;
use super::status::Status;
use super::tag::Tag;

/// An immutable HTTP response. Header accessors parse on demand; nothing is
/// derived or injected implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    status: Status,
    headers: Headers,
    payload: Option<Payload>,
}

impl HttpResponse {
    pub fn new(status: Status, headers: Headers, payload: Option<Payload>) -> Self {
        Self { status, headers, payload }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn with_status(&self, status: Status) -> Self {
        Self { status, ..self.clone() }
    }

    pub fn with_headers(&self, headers: Headers) -> Self {
        Self { headers, ..self.clone() }
    }

    pub fn with_payload(&self, payload: Option<Payload>) -> Self {
        Self { payload, ..self.clone() }
    }

    /// Parsed `ETag`; malformed tags are treated as absent.
    pub fn etag(&self) -> Option<Tag> {
        self.headers.first(names::ETAG).and_then(|v| Tag::parse(v).ok())
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.date_header(names::LAST_MODIFIED)
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date_header(names::DATE)
    }

    /// Raw `Expires` presence; an unparsable value still counts as "already expired".
    pub fn has_expires(&self) -> bool {
        self.headers.has_header(names::EXPIRES)
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.date_header(names::EXPIRES)
    }

    pub fn cache_control(&self) -> CacheControl {
        CacheControl::from_headers(&self.headers)
    }

    /// Lower-cased field names listed in `Vary`, sorted and deduplicated.
    pub fn vary(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .headers
            .get_all(names::VARY)
            .flat_map(|v| v.split(','))
            .map(|f| f.trim().to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }

    /// `Vary: *` can never be matched by a later request.
    pub fn varies_on_everything(&self) -> bool {
        self.vary().iter().any(|f| f == "*")
    }

    pub fn has_validators(&self) -> bool {
        self.etag().is_some() || self.last_modified().is_some()
    }

    fn date_header(&self, name: &str) -> Option<DateTime<Utc>> {
        self.headers.first(name).and_then(parse_http_date)
    }
}
