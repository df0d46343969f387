//! Parsed `Cache-Control` directives.

use chrono::Duration;

use super::header::{Headers, names};

/// The subset of `Cache-Control` a private cache acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: Option<Duration>,
    pub s_maxage: Option<Duration>,
    /// `max-stale` with no value means "any staleness"; that is `Some(None)`.
    pub max_stale: Option<Option<Duration>>,
    pub min_fresh: Option<Duration>,
    pub no_cache: bool,
    pub no_store: bool,
    pub must_revalidate: bool,
    pub proxy_revalidate: bool,
    pub private: bool,
    pub public: bool,
    pub only_if_cached: bool,
}

impl CacheControl {
    /// Parse every `Cache-Control` field in `headers`. `Pragma: no-cache` is
    /// honoured only when no `Cache-Control` field is present.
    pub fn from_headers(headers: &Headers) -> Self {
        let mut cc = CacheControl::default();

        for value in headers.get_all(names::CACHE_CONTROL) {
            for directive in value.split(',') {
                cc.apply(directive);
            }
        }

        if !headers.has_header(names::CACHE_CONTROL)
            && headers
                .get_all(names::PRAGMA)
                .any(|v| v.split(',').any(|d| d.trim().eq_ignore_ascii_case("no-cache")))
        {
            cc.no_cache = true;
        }

        cc
    }

    fn apply(&mut self, directive: &str) {
        let directive = directive.trim();
        let (name, value) = match directive.split_once('=') {
            Some((n, v)) => (n.trim(), Some(v.trim().trim_matches('"'))),
            None => (directive, None),
        };

        match name.to_ascii_lowercase().as_str() {
            "max-age" => self.max_age = value.and_then(seconds),
            "s-maxage" => self.s_maxage = value.and_then(seconds),
            "max-stale" => self.max_stale = Some(value.and_then(seconds)),
            "min-fresh" => self.min_fresh = value.and_then(seconds),
            "no-cache" => self.no_cache = true,
            "no-store" => self.no_store = true,
            "must-revalidate" => self.must_revalidate = true,
            "proxy-revalidate" => self.proxy_revalidate = true,
            "private" => self.private = true,
            "public" => self.public = true,
            "only-if-cached" => self.only_if_cached = true,
            _ => {}
        }
    }
}

/// Delta-seconds; negative or malformed values yield `None`, overflow saturates.
fn seconds(value: &str) -> Option<Duration> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs = value.parse::<i64>().unwrap_or(i64::from(i32::MAX));
    Some(Duration::seconds(secs.min(i64::from(i32::MAX))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(values: &[&str]) -> CacheControl {
        let headers = values
            .iter()
            .fold(Headers::new(), |h, v| h.add("Cache-Control", *v).unwrap());
        CacheControl::from_headers(&headers)
    }

    #[test]
    fn test_parse_max_age_and_flags() {
        let cc = parse(&["public, max-age=60, must-revalidate"]);
        assert_eq!(cc.max_age, Some(Duration::seconds(60)));
        assert!(cc.public);
        assert!(cc.must_revalidate);
        assert!(!cc.no_store);
    }

    #[test]
    fn test_parse_across_multiple_fields() {
        let cc = parse(&["no-cache", "MAX-AGE=\"30\""]);
        assert!(cc.no_cache);
        assert_eq!(cc.max_age, Some(Duration::seconds(30)));
    }

    #[test]
    fn test_invalid_max_age_ignored() {
        assert_eq!(parse(&["max-age=-1"]).max_age, None);
        assert_eq!(parse(&["max-age=abc"]).max_age, None);
    }

    #[test]
    fn test_huge_max_age_saturates() {
        let cc = parse(&["max-age=999999999999999999999"]);
        assert_eq!(cc.max_age, Some(Duration::seconds(i64::from(i32::MAX))));
    }

    #[test]
    fn test_max_stale_forms() {
        assert_eq!(parse(&["max-stale"]).max_stale, Some(None));
        assert_eq!(parse(&["max-stale=10"]).max_stale, Some(Some(Duration::seconds(10))));
        assert_eq!(parse(&[]).max_stale, None);
    }

    #[test]
    fn test_pragma_fallback() {
        let headers = Headers::new().add("Pragma", "no-cache").unwrap();
        assert!(CacheControl::from_headers(&headers).no_cache);

        let headers = headers.add("Cache-Control", "max-age=5").unwrap();
        assert!(!CacheControl::from_headers(&headers).no_cache);
    }
}
