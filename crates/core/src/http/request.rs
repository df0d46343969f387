//! Outbound request snapshots.

use chrono::{DateTime, Utc};
use url::Url;

use super::conditionals::Conditionals;
use super::header::{Header, Headers, names};
use super::method::Method;
use super::payload::Payload;
use super::preferences::Preferences;
use crate::Error;

/// Credentials attached to a request. Carried opaquely; negotiating a
/// challenge is up to the exchanger.
#[derive(Clone, PartialEq, Eq)]
pub struct Challenge {
    pub identifier: String,
    pub secret: String,
}

impl std::fmt::Debug for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Challenge")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// An immutable HTTP request.
///
/// Headers may be set directly or through the convenience objects
/// (`Conditionals`, `Preferences`, payload). When both define the same field,
/// the convenience object wins in [`HttpRequest::all_headers`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    uri: Url,
    method: Method,
    headers: Headers,
    conditionals: Conditionals,
    preferences: Preferences,
    challenge: Option<Challenge>,
    payload: Option<Payload>,
    request_time: DateTime<Utc>,
}

impl HttpRequest {
    pub fn new(uri: Url, method: Method) -> Self {
        Self {
            uri,
            method,
            headers: Headers::new(),
            conditionals: Conditionals::new(),
            preferences: Preferences::new(),
            challenge: None,
            payload: None,
            request_time: Utc::now(),
        }
    }

    pub fn get(uri: Url) -> Self {
        Self::new(uri, Method::Get)
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Explicitly set headers only.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn conditionals(&self) -> &Conditionals {
        &self.conditionals
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn request_time(&self) -> DateTime<Utc> {
        self.request_time
    }

    /// Explicit headers merged with the ones implied by conditionals,
    /// preferences and payload content type.
    pub fn all_headers(&self) -> Headers {
        let mut headers = self
            .headers
            .clone()
            .merge(&self.conditionals.to_headers())
            .merge(&self.preferences.to_headers());

        if let Some(payload) = &self.payload
            && !headers.has_header(names::CONTENT_TYPE)
        {
            headers = headers.with(Header::trusted(names::CONTENT_TYPE, payload.mime_type()));
        }

        headers
    }

    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let headers = self.headers.clone().add(name, value)?;
        Ok(Self { headers, ..self.clone() })
    }

    pub fn with_headers(&self, headers: Headers) -> Self {
        Self { headers, ..self.clone() }
    }

    pub fn with_method(&self, method: Method) -> Self {
        Self { method, ..self.clone() }
    }

    pub fn with_conditionals(&self, conditionals: Conditionals) -> Self {
        Self { conditionals, ..self.clone() }
    }

    pub fn with_preferences(&self, preferences: Preferences) -> Self {
        Self { preferences, ..self.clone() }
    }

    pub fn with_challenge(&self, challenge: Option<Challenge>) -> Self {
        Self { challenge, ..self.clone() }
    }

    pub fn with_payload(&self, payload: Option<Payload>) -> Self {
        Self { payload, ..self.clone() }
    }

    /// Move any validator fields out of the plain header set into
    /// `Conditionals`, so caller preconditions are recognised regardless of
    /// how they were supplied.
    pub fn lift_conditionals(&self) -> Result<Self, Error> {
        let parsed = Conditionals::from_headers(&self.headers)?;
        if parsed.is_unconditional() {
            return Ok(self.clone());
        }
        if !self.conditionals.is_unconditional() {
            return Err(Error::InvalidArgument(
                "preconditions supplied both as headers and as conditionals".into(),
            ));
        }

        let headers = [names::IF_MATCH, names::IF_NONE_MATCH, names::IF_MODIFIED_SINCE, names::IF_UNMODIFIED_SINCE]
            .iter()
            .fold(self.headers.clone(), |h, name| h.remove(name));

        Ok(Self { headers, conditionals: parsed, ..self.clone() })
    }
}
