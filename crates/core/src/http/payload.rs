//! Opaque message bodies.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A body plus its media type. Cloning is cheap; the cache never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    mime_type: String,
    bytes: Bytes,
}

impl Payload {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { mime_type: mime_type.into(), bytes: bytes.into() }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
