//! Unified error types for pjax.
//!
//! The first four variants form the failure taxonomy shared by the
//! navigation engine and the worker; the rest cover storage and input.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the navigation and cache engines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetch rejected or timed out before a response arrived.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// Non-2xx response where a successful one was required.
    #[error("BAD_STATUS: {0}")]
    BadStatus(u16),

    /// Response parsed but the content container was missing.
    #[error("MALFORMED_RESPONSE: {0}")]
    MalformedResponse(String),

    /// A precache write failed; the generation never becomes active.
    #[error("INSTALL_FAILURE: {0}")]
    InstallFailure(String),

    /// Invalid input parameters (e.g., an unknown selector).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// No cache entry found for the given request.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl Error {
    /// Whether the failure happened before any response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::NetworkFailure(_))
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

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::NetworkFailure(msg) => (-32000, msg.clone()),
            Error::BadStatus(status) => (-32001, format!("status {status}")),
            Error::MalformedResponse(msg) => (-32002, msg.clone()),
            Error::InstallFailure(msg) => (-32003, msg.clone()),
            Error::InvalidUrl(msg) => (-32004, msg.clone()),
            Error::FetchTooLarge(msg) => (-32005, msg.clone()),
            Error::CacheMiss(msg) => (-32006, msg.clone()),
            Error::Database(e) => (-32007, e.to_string()),
            Error::MigrationFailed(msg) => (-32007, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
