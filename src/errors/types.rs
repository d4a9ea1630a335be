//! Error type definitions for the collector
//!
//! Per-item failures (one source, one endpoint, one channel) are expressed as
//! typed errors so callers can match on the failure kind and skip the item.
//! Only configuration and persistence failures are allowed to end a run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Final playlist could not be written
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failures raised by the HTTP transport collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established or the request could not be sent
    #[error("Connection failed: {url} - {message}")]
    Connect { url: String, message: String },

    /// The call exceeded its time budget
    #[error("Timed out: {url}")]
    Timeout { url: String },

    /// Upstream answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read to completion
    #[error("Body read failed: {url} - {message}")]
    Body { url: String, message: String },
}

/// Failures while probing a single endpoint
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Fetching the endpoint failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body could not be decoded
    #[error("Parse error: {url} - {message}")]
    Parse { url: String, message: String },

    /// The body decoded but does not have the expected structure
    #[error("Invalid data shape: {url} - {message}")]
    InvalidShape { url: String, message: String },
}

/// A candidate string that cannot be turned into a probe URL
#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("Unparseable URL '{raw}': {source}")]
    Unparseable {
        raw: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failures while writing the final playlist
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Existing file {} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl TransportError {
    /// Whether another attempt might succeed
    ///
    /// Connection failures and timeouts are transient; status failures are
    /// retryable only for the statuses listed in `retry_statuses`.
    pub fn is_retryable(&self, retry_statuses: &[u16]) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => retry_statuses.contains(status),
            Self::Body { .. } => false,
        }
    }
}

impl PersistenceError {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
