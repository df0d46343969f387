//! Content-negotiation preferences (`Accept*` headers).

use super::header::{Header, Headers, names};

/// A single weighted preference, e.g. `text/html;q=0.8`.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    value: String,
    quality: f32,
}

impl Preference {
    /// Quality is clamped into `0.0..=1.0`.
    pub fn new(value: impl Into<String>, quality: f32) -> Self {
        Self { value: value.into(), quality: quality.clamp(0.0, 1.0) }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    fn render(&self) -> String {
        if (self.quality - 1.0).abs() < f32::EPSILON {
            self.value.clone()
        } else {
            let q = format!("{:.3}", self.quality);
            let q = q.trim_end_matches('0').trim_end_matches('.');
            format!("{};q={}", self.value, q)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    media_types: Vec<Preference>,
    languages: Vec<Preference>,
    charsets: Vec<Preference>,
    encodings: Vec<Preference>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&self, preference: Preference) -> Self {
        let mut next = self.clone();
        next.media_types.push(preference);
        next
    }

    pub fn accept_language(&self, preference: Preference) -> Self {
        let mut next = self.clone();
        next.languages.push(preference);
        next
    }

    pub fn accept_charset(&self, preference: Preference) -> Self {
        let mut next = self.clone();
        next.charsets.push(preference);
        next
    }

    pub fn accept_encoding(&self, preference: Preference) -> Self {
        let mut next = self.clone();
        next.encodings.push(preference);
        next
    }

    pub fn is_empty(&self) -> bool {
        self.media_types.is_empty() && self.languages.is_empty() && self.charsets.is_empty() && self.encodings.is_empty()
    }

    pub fn to_headers(&self) -> Headers {
        [
            (names::ACCEPT, &self.media_types),
            (names::ACCEPT_LANGUAGE, &self.languages),
            (names::ACCEPT_CHARSET, &self.charsets),
            (names::ACCEPT_ENCODING, &self.encodings),
        ]
        .into_iter()
        .filter(|(_, prefs)| !prefs.is_empty())
        .map(|(name, prefs)| {
            let value = prefs.iter().map(Preference::render).collect::<Vec<_>>().join(", ");
            Header::trusted(name, value)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_preferences_produce_no_headers() {
        assert!(Preferences::new().to_headers().is_empty());
    }

    #[test]
    fn test_render_with_quality() {
        let prefs = Preferences::new()
            .accept(Preference::new("text/html", 1.0))
            .accept(Preference::new("application/json", 0.5))
            .accept_language(Preference::new("nb", 1.0));

        let headers = prefs.to_headers();
        assert_eq!(headers.first("Accept"), Some("text/html, application/json;q=0.5"));
        assert_eq!(headers.first("Accept-Language"), Some("nb"));
        assert!(!headers.has_header("Accept-Charset"));
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(Preference::new("x", 3.0).quality(), 1.0);
        assert_eq!(Preference::new("x", -1.0).quality(), 0.0);
    }
}
