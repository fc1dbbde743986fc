//! Structured errors for tool inputs the core error type does not cover.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised by the server's own tools.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid input parameters (e.g., an empty request URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let code = match &err {
            ServerError::InvalidInput(_) => -32602,
            ServerError::Serialize(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err: McpError = ServerError::InvalidInput("url cannot be empty".into()).into();
        assert_eq!(err.code, ErrorCode(-32602));
        assert_eq!(err.message, "INVALID_INPUT: url cannot be empty");

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: McpError = ServerError::Serialize(json_err).into();
        assert_eq!(err.code, ErrorCode(-32603));
        assert!(err.message.starts_with("SERIALIZE_FAILED"));
    }
}
