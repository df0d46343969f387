//! HTTP status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A response status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(u16);

impl Status {
    pub const OK: Status = Status(200);
    pub const NON_AUTHORITATIVE_INFORMATION: Status = Status(203);
    pub const NO_CONTENT: Status = Status(204);
    pub const PARTIAL_CONTENT: Status = Status(206);
    pub const MULTIPLE_CHOICES: Status = Status(300);
    pub const MOVED_PERMANENTLY: Status = Status(301);
    pub const FOUND: Status = Status(302);
    pub const NOT_MODIFIED: Status = Status(304);
    pub const NOT_FOUND: Status = Status(404);
    pub const METHOD_NOT_ALLOWED: Status = Status(405);
    pub const PRECONDITION_FAILED: Status = Status(412);
    pub const GONE: Status = Status(410);
    pub const URI_TOO_LONG: Status = Status(414);
    pub const INTERNAL_SERVER_ERROR: Status = Status(500);
    pub const NOT_IMPLEMENTED: Status = Status(501);
    pub const GATEWAY_TIMEOUT: Status = Status(504);

    pub const fn new(code: u16) -> Self {
        Status(code)
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Anything below 400.
    pub fn is_non_error(self) -> bool {
        self.0 < 400
    }

    /// 5xx: the origin failed rather than answered.
    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Codes a cache may store without an explicit freshness directive.
    pub fn is_cacheable_by_default(self) -> bool {
        matches!(self.0, 200 | 203 | 204 | 300 | 301 | 404 | 405 | 410 | 414 | 501)
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
