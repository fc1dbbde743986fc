//! Unified error types for postmirror.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::remote::RemoteError;

/// Unified error type for the store, the sync engine and the relay surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The remote content API failed.
    #[error("REMOTE_ERROR: {0}")]
    Remote(#[from] RemoteError),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    Corrupt(String),

    /// No signed-in user is known.
    #[error("MISSING_IDENTITY: no signed-in user")]
    MissingIdentity,

    /// A cross-surface request came from an untrusted origin.
    #[error("ORIGIN_MISMATCH: {0}")]
    OriginMismatch(String),

    /// A cross-surface request had no recognised type.
    #[error("UNKNOWN_REQUEST: {0}")]
    UnknownRequest(String),

    /// The sync engine task is gone.
    #[error("ENGINE_CLOSED")]
    EngineClosed,
}

impl Error {
    /// Short error name used in relay responses.
    pub fn name(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "InvalidInput",
            Error::Remote(_) => "RemoteError",
            Error::Database(_) | Error::MigrationFailed(_) | Error::Corrupt(_) => "CacheError",
            Error::MissingIdentity => "MissingIdentity",
            Error::OriginMismatch(_) => "OriginMismatch",
            Error::UnknownRequest(_) => "UnknownRequest",
            Error::EngineClosed => "EngineClosed",
        }
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
        Error::Corrupt(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::Remote(_) => -32008,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Corrupt(_) => -32002,
            Error::MissingIdentity => -32020,
            Error::OriginMismatch(_) => -32021,
            Error::UnknownRequest(_) => -32601,
            Error::EngineClosed => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
