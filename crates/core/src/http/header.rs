//! Header fields and ordered, multi-valued header collections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Well-known header names used by the cache.
pub mod names {
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_CHARSET: &str = "Accept-Charset";
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
    pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
    pub const AGE: &str = "Age";
    pub const CACHE_CONTROL: &str = "Cache-Control";
    pub const CONTENT_LOCATION: &str = "Content-Location";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const DATE: &str = "Date";
    pub const ETAG: &str = "ETag";
    pub const EXPIRES: &str = "Expires";
    pub const IF_MATCH: &str = "If-Match";
    pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
    pub const IF_NONE_MATCH: &str = "If-None-Match";
    pub const IF_RANGE: &str = "If-Range";
    pub const IF_UNMODIFIED_SINCE: &str = "If-Unmodified-Since";
    pub const LAST_MODIFIED: &str = "Last-Modified";
    pub const LOCATION: &str = "Location";
    pub const PRAGMA: &str = "Pragma";
    pub const VARY: &str = "Vary";
}

/// Headers that may only appear once; `add` replaces instead of appending.
const SINGLE_VALUED: &[&str] = &[names::CONTENT_TYPE];

/// A single header field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Create a header, validating the name as an HTTP token and rejecting
    /// line breaks in the value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        let value = value.into();

        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(Error::InvalidArgument(format!("invalid header name: {name:?}")));
        }
        if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
            return Err(Error::InvalidArgument(format!("invalid value for header {name}")));
        }

        Ok(Self { name, value: value.trim().to_string() })
    }

    /// Header built from a known-good name and a value produced by this crate.
    pub(crate) fn trusted(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Ordered, case-insensitive, multi-valued header collection.
///
/// All mutators consume `self` and return the updated collection, so a
/// `Headers` reachable from a request or response is never changed in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validated header field.
    pub fn add(self, name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        Ok(self.with(Header::new(name, value)?))
    }

    /// Append a header; single-valued fields replace any previous value.
    pub fn with(mut self, header: Header) -> Self {
        if SINGLE_VALUED.iter().any(|n| header.is(n)) {
            self.entries.retain(|h| !h.is(header.name()));
        }
        self.entries.push(header);
        self
    }

    /// Replace every value of `name` with a single new value.
    pub fn set(self, name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let header = Header::new(name, value)?;
        Ok(self.remove(header.name()).with(header))
    }

    /// Drop every field called `name`.
    pub fn remove(mut self, name: &str) -> Self {
        self.entries.retain(|h| !h.is(name));
        self
    }

    /// Merge `other` into this collection. Names present in `other` replace
    /// the ones already here; everything else is kept in order.
    pub fn merge(mut self, other: &Headers) -> Self {
        self.entries
            .retain(|h| !other.entries.iter().any(|o| o.is(h.name())));
        self.entries.extend(other.entries.iter().cloned());
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.entries.iter().any(|h| h.is(name))
    }

    /// First value of `name`, if present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|h| h.is(name)).map(Header::value)
    }

    /// Every value of `name` in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries.iter().filter(move |h| h.is(name)).map(Header::value)
    }

    /// All values of `name` joined with `", "`, the way HTTP folds repeated fields.
    pub fn joined(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self.get_all(name).collect();
        if values.is_empty() { None } else { Some(values.join(", ")) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        iter.into_iter().fold(Headers::new(), Headers::with)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let headers = Headers::new().add("ETag", "\"abc\"").unwrap();
        assert!(headers.has_header("etag"));
        assert!(headers.has_header("ETAG"));
        assert_eq!(headers.first("eTaG"), Some("\"abc\""));
    }

    #[test]
    fn test_add_keeps_duplicates_in_order() {
        let headers = Headers::new()
            .add("Cache-Control", "max-age=60")
            .unwrap()
            .add("X-Other", "1")
            .unwrap()
            .add("cache-control", "must-revalidate")
            .unwrap();

        let values: Vec<&str> = headers.get_all("Cache-Control").collect();
        assert_eq!(values, vec!["max-age=60", "must-revalidate"]);
        assert_eq!(headers.joined("cache-control").as_deref(), Some("max-age=60, must-revalidate"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_content_type_single_valued() {
        let headers = Headers::new()
            .add("Content-Type", "text/plain")
            .unwrap()
            .add("content-type", "text/html")
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.first("Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_invalid_header_name() {
        assert!(matches!(Header::new("", "x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Header::new("Bad Name", "x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Header::new("X:Y", "x"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_header_value() {
        let result = Headers::new().add("X-Injected", "a\r\nSet-Cookie: b");
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_merge_other_wins() {
        let base = Headers::new()
            .add("If-None-Match", "\"old\"")
            .unwrap()
            .add("X-Keep", "1")
            .unwrap();
        let convenience = Headers::new().add("if-none-match", "\"new\"").unwrap();

        let merged = base.merge(&convenience);
        let values: Vec<&str> = merged.get_all("If-None-Match").collect();
        assert_eq!(values, vec!["\"new\""]);
        assert_eq!(merged.first("X-Keep"), Some("1"));
    }

    #[test]
    fn test_set_replaces_all_values() {
        let headers = Headers::new()
            .add("Vary", "Accept")
            .unwrap()
            .add("Vary", "Accept-Language")
            .unwrap()
            .set("vary", "Accept-Encoding")
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.first("Vary"), Some("Accept-Encoding"));
    }

    #[test]
    fn test_remove() {
        let headers = Headers::new()
            .add("X-A", "1")
            .unwrap()
            .add("X-B", "2")
            .unwrap()
            .remove("x-a");
        assert!(!headers.has_header("X-A"));
        assert_eq!(headers.len(), 1);
    }
}
