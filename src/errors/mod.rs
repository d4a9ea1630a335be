//! Centralized error handling for the collector
//!
//! # Error Categories
//!
//! - **Transport Errors**: connect/timeout/status failures, always recoverable
//! - **Probe Errors**: endpoint bodies that are malformed or have the wrong shape
//! - **Normalization Errors**: candidate strings that are not URLs
//! - **Persistence Errors**: the final write failed, fatal to the run

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for endpoint probing results
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Convenience type alias for transport results
pub type TransportResult<T> = Result<T, TransportError>;
