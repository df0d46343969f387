//! Unified error types for httpcache.
//!
//! Every variant renders with a stable code prefix so callers (and the MCP
//! surface) can classify failures without matching on message text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error type for the cache core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value object rejected its input (conflicting conditionals, bad header name, ...).
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    /// A request URI could not be parsed or normalised.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// `update` was called for a key with no stored entry.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The network exchange failed before a response was received.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// The network exchange timed out.
    #[error("TRANSPORT_TIMEOUT: {0}")]
    TransportTimeout(String),

    /// The origin response body exceeded the configured limit.
    #[error("RESPONSE_TOO_LARGE: {0}")]
    ResponseTooLarge(String),

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded or encoded.
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),
}

impl Error {
    /// True for failures raised by the network exchanger.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::TransportTimeout(_) | Error::ResponseTooLarge(_))
    }

    /// True for failures raised by a storage backend.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::Storage(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidArgument(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::Transport(msg) => (-32008, msg.clone()),
            Error::TransportTimeout(msg) => (-32006, msg.clone()),
            Error::ResponseTooLarge(msg) => (-32007, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Storage(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("https://example.com/".to_string());
        assert!(err.to_string().starts_with("NOT_FOUND"));
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidArgument("bad header".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::Transport("reset".into()).is_transport());
        assert!(Error::TransportTimeout("20s".into()).is_transport());
        assert!(Error::Storage("corrupt row".into()).is_storage());
        assert!(!Error::NotFound("x".into()).is_storage());
    }

    #[test]
    fn test_serde_error_is_storage() {
        let err: Error = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert!(err.is_storage());
    }
}
