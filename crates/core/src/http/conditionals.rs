//! Request preconditions (`If-Match`, `If-None-Match`, `If-Modified-Since`,
//! `If-Unmodified-Since`) and their header form.
//!
//! The combination rules follow RFC 7232: an entity-tag condition and its
//! date counterpart of the opposite polarity are never sent together.

use chrono::{DateTime, Utc};

use super::date::{format_http_date, parse_http_date, truncate_to_seconds};
use super::header::{Header, Headers, names};
use super::tag::Tag;
use crate::Error;

/// Validator preconditions for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditionals {
    matches: Vec<Tag>,
    none_match: Vec<Tag>,
    modified_since: Option<DateTime<Utc>>,
    unmodified_since: Option<DateTime<Utc>>,
}

impl Conditionals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag to `If-Match`.
    pub fn add_if_match(&self, tag: Tag) -> Result<Self, Error> {
        if !self.none_match.is_empty() {
            return Err(conflict("If-Match", "If-None-Match"));
        }
        if self.modified_since.is_some() {
            return Err(conflict("If-Match", "If-Modified-Since"));
        }
        let mut next = self.clone();
        push_tag(&mut next.matches, tag);
        Ok(next)
    }

    /// Add a tag to `If-None-Match`.
    pub fn add_if_none_match(&self, tag: Tag) -> Result<Self, Error> {
        if !self.matches.is_empty() {
            return Err(conflict("If-None-Match", "If-Match"));
        }
        if self.unmodified_since.is_some() {
            return Err(conflict("If-None-Match", "If-Unmodified-Since"));
        }
        let mut next = self.clone();
        push_tag(&mut next.none_match, tag);
        Ok(next)
    }

    /// Set `If-Modified-Since`, truncated to whole seconds.
    pub fn if_modified_since(&self, time: DateTime<Utc>) -> Result<Self, Error> {
        if !self.matches.is_empty() {
            return Err(conflict("If-Modified-Since", "If-Match"));
        }
        if self.unmodified_since.is_some() {
            return Err(conflict("If-Modified-Since", "If-Unmodified-Since"));
        }
        Ok(Self { modified_since: Some(truncate_to_seconds(time)), ..self.clone() })
    }

    /// Set `If-Unmodified-Since`, truncated to whole seconds.
    pub fn if_unmodified_since(&self, time: DateTime<Utc>) -> Result<Self, Error> {
        if !self.none_match.is_empty() {
            return Err(conflict("If-Unmodified-Since", "If-None-Match"));
        }
        if self.modified_since.is_some() {
            return Err(conflict("If-Unmodified-Since", "If-Modified-Since"));
        }
        Ok(Self { unmodified_since: Some(truncate_to_seconds(time)), ..self.clone() })
    }

    pub fn matches(&self) -> &[Tag] {
        &self.matches
    }

    pub fn none_match(&self) -> &[Tag] {
        &self.none_match
    }

    pub fn modified_since(&self) -> Option<DateTime<Utc>> {
        self.modified_since
    }

    pub fn unmodified_since(&self) -> Option<DateTime<Utc>> {
        self.unmodified_since
    }

    /// True when no precondition is set.
    pub fn is_unconditional(&self) -> bool {
        self.matches.is_empty()
            && self.none_match.is_empty()
            && self.modified_since.is_none()
            && self.unmodified_since.is_none()
    }

    /// Header form, in a fixed order.
    pub fn to_headers(&self) -> Headers {
        let mut headers = Headers::new();
        if !self.matches.is_empty() {
            headers = headers.with(Header::trusted(names::IF_MATCH, join_tags(&self.matches)));
        }
        if !self.none_match.is_empty() {
            headers = headers.with(Header::trusted(names::IF_NONE_MATCH, join_tags(&self.none_match)));
        }
        if let Some(time) = &self.modified_since {
            headers = headers.with(Header::trusted(names::IF_MODIFIED_SINCE, format_http_date(time)));
        }
        if let Some(time) = &self.unmodified_since {
            headers = headers.with(Header::trusted(names::IF_UNMODIFIED_SINCE, format_http_date(time)));
        }
        headers
    }

    /// Read the four validator fields out of `headers`. Any other header is
    /// ignored; repeated tag fields are concatenated.
    pub fn from_headers(headers: &Headers) -> Result<Self, Error> {
        let mut conditionals = Conditionals::new();

        for value in headers.get_all(names::IF_MATCH) {
            for tag in Tag::parse_list(value)? {
                conditionals = conditionals.add_if_match(tag)?;
            }
        }
        for value in headers.get_all(names::IF_NONE_MATCH) {
            for tag in Tag::parse_list(value)? {
                conditionals = conditionals.add_if_none_match(tag)?;
            }
        }
        if let Some(value) = headers.first(names::IF_MODIFIED_SINCE) {
            conditionals = conditionals.if_modified_since(parse_date(names::IF_MODIFIED_SINCE, value)?)?;
        }
        if let Some(value) = headers.first(names::IF_UNMODIFIED_SINCE) {
            conditionals = conditionals.if_unmodified_since(parse_date(names::IF_UNMODIFIED_SINCE, value)?)?;
        }

        Ok(conditionals)
    }
}

/// `*` replaces a tag list; concrete tags are ignored once `*` is present.
fn push_tag(list: &mut Vec<Tag>, tag: Tag) {
    if tag == Tag::Any {
        list.clear();
        list.push(tag);
    } else if !list.contains(&Tag::Any) && !list.contains(&tag) {
        list.push(tag);
    }
}

fn join_tags(tags: &[Tag]) -> String {
    tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(", ")
}

fn parse_date(name: &str, value: &str) -> Result<DateTime<Utc>, Error> {
    parse_http_date(value).ok_or_else(|| Error::InvalidArgument(format!("invalid {name} date: {value}")))
}

fn conflict(adding: &str, existing: &str) -> Error {
    Error::InvalidArgument(format!("cannot combine {adding} with {existing}"))
}
