//! HTTP request methods.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Trace,
    Connect,
    /// Any other token, kept verbatim (upper-cased).
    Extension(String),
}

impl Method {
    /// Safe methods do not change origin state.
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options | Method::Trace)
    }

    /// Only GET and HEAD responses are ever stored.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
            Method::Extension(name) => name,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let method = match upper.as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            "CONNECT" => Method::Connect,
            "" => return Err(Error::InvalidArgument("empty method".into())),
            other if other.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-' || b == b'_') => {
                Method::Extension(upper)
            }
            other => return Err(Error::InvalidArgument(format!("invalid method: {other}"))),
        };
        Ok(method)
    }
}

impl TryFrom<String> for Method {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_methods() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" HEAD ".parse::<Method>().unwrap(), Method::Head);
        assert_eq!("Put".parse::<Method>().unwrap(), Method::Put);
    }

    #[test]
    fn test_parse_extension_method() {
        let method: Method = "propfind".parse().unwrap();
        assert_eq!(method, Method::Extension("PROPFIND".into()));
        assert_eq!(method.to_string(), "PROPFIND");
        assert!(!method.is_safe());
    }

    #[test]
    fn test_parse_invalid_method() {
        assert!(matches!("".parse::<Method>(), Err(Error::InvalidArgument(_))));
        assert!(matches!("GE T".parse::<Method>(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_safety_and_cacheability() {
        assert!(Method::Get.is_cacheable());
        assert!(Method::Head.is_cacheable());
        assert!(Method::Options.is_safe());
        assert!(!Method::Options.is_cacheable());
        assert!(!Method::Post.is_safe());
        assert!(!Method::Delete.is_cacheable());
    }
}
