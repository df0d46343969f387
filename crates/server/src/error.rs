//! Structured errors raised by the tool layer itself.
//!
//! Cache and transport failures arrive as `httpcache_core::Error` and carry
//! their own MCP mapping; these cover tool input and output handling.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the mcp-httpcache server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The tool result could not be encoded.
    #[error("OUTPUT_FAILED: {0}")]
    OutputFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::OutputFailed(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
