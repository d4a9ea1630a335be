//! Utility modules shared across the pipeline

pub mod http_client;
pub mod retry;
pub mod url;

pub use http_client::{ByteStream, HttpTransport, ReqwestTransport};
pub use retry::{RetryConfig, with_retry};
