//! Entity tags as carried by `ETag`, `If-Match` and `If-None-Match`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An entity tag: strong (`"abc"`), weak (`W/"abc"`) or the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Strong(String),
    Weak(String),
    Any,
}

impl Tag {
    pub fn strong(value: impl Into<String>) -> Self {
        Tag::Strong(value.into())
    }

    pub fn weak(value: impl Into<String>) -> Self {
        Tag::Weak(value.into())
    }

    /// Parse a single tag from its wire form.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let s = input.trim();
        if s == "*" {
            return Ok(Tag::Any);
        }

        let (weak, quoted) = match s.strip_prefix("W/").or_else(|| s.strip_prefix("w/")) {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let opaque = quoted
            .strip_prefix('"')
            .and_then(|q| q.strip_suffix('"'))
            .filter(|v| !v.contains('"'))
            .ok_or_else(|| Error::InvalidArgument(format!("invalid entity tag: {input}")))?;

        Ok(if weak { Tag::Weak(opaque.to_string()) } else { Tag::Strong(opaque.to_string()) })
    }

    /// Parse a comma separated tag list (`"a", W/"b"`), respecting quotes.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, Error> {
        let mut tags = Vec::new();
        let mut start = 0;
        let mut in_quotes = false;

        for (i, c) in input.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    push_tag(&mut tags, &input[start..i])?;
                    start = i + 1;
                }
                _ => {}
            }
        }
        push_tag(&mut tags, &input[start..])?;

        Ok(tags)
    }

    /// Opaque value without quotes; `*` for the wildcard.
    pub fn opaque(&self) -> &str {
        match self {
            Tag::Strong(v) | Tag::Weak(v) => v,
            Tag::Any => "*",
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, Tag::Weak(_))
    }

    /// Weak comparison: opaque values match regardless of weakness.
    pub fn weak_eq(&self, other: &Tag) -> bool {
        match (self, other) {
            (Tag::Any, _) | (_, Tag::Any) => true,
            _ => self.opaque() == other.opaque(),
        }
    }
}

fn push_tag(tags: &mut Vec<Tag>, part: &str) -> Result<(), Error> {
    if !part.trim().is_empty() {
        tags.push(Tag::parse(part)?);
    }
    Ok(())
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Strong(v) => write!(f, "\"{v}\""),
            Tag::Weak(v) => write!(f, "W/\"{v}\""),
            Tag::Any => f.write_str("*"),
        }
    }
}
