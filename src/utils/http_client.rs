use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{AppError, AppResult, TransportError, TransportResult};
use crate::utils::retry::{RetryConfig, timeout_error, with_retry};
use crate::utils::url::UrlUtils;

/// Body chunks of a streaming GET
pub type ByteStream = BoxStream<'static, TransportResult<Bytes>>;

/// Transport collaborator used by every network-facing stage
///
/// Retry on throttling and server statuses is the transport's concern; callers
/// only see the final outcome of a call.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET the whole body within `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> TransportResult<Bytes>;

    /// GET as a chunk stream
    ///
    /// Obtaining the response headers may take up to `connect_timeout` plus
    /// `read_timeout`; after that `read_timeout` bounds the wait for each chunk.
    async fn fetch_streaming(
        &self,
        url: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> TransportResult<ByteStream>;

    /// GET the body as text, replacing invalid UTF-8 sequences
    async fn fetch_text(&self, url: &str, timeout: Duration) -> TransportResult<String> {
        let body = self.fetch(url, timeout).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// reqwest-backed transport with a shared keep-alive connection pool
pub struct ReqwestTransport {
    client: Client,
    retry: RetryConfig,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry: RetryConfig::from_http_config(config),
        })
    }

    pub fn with_client(client: Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    fn map_send_error(url: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            timeout_error(url)
        } else {
            TransportError::Connect {
                url: url.to_string(),
                message: UrlUtils::obfuscate_credentials(&error.to_string()),
            }
        }
    }

    fn map_body_error(url: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            timeout_error(url)
        } else {
            TransportError::Body {
                url: url.to_string(),
                message: UrlUtils::obfuscate_credentials(&error.to_string()),
            }
        }
    }

    /// Single request; non-success statuses become `TransportError::Status`
    async fn send_once(&self, url: &str, timeout: Option<Duration>) -> TransportResult<Response> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::map_send_error(url, e))?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn fetch(&self, url: &str, timeout: Duration) -> TransportResult<Bytes> {
        debug!("Fetching: {}", UrlUtils::obfuscate_credentials(url));
        let this = self;

        let body = with_retry(
            &self.retry,
            || async move {
                let response = this.send_once(url, Some(timeout)).await?;
                response
                    .bytes()
                    .await
                    .map_err(|e| ReqwestTransport::map_body_error(url, e))
            },
            "fetch",
        )
        .await?;

        debug!("Fetched {} bytes from {}", body.len(), UrlUtils::obfuscate_credentials(url));
        Ok(body)
    }

    async fn fetch_streaming(
        &self,
        url: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> TransportResult<ByteStream> {
        let this = self;
        let header_timeout = connect_timeout + read_timeout;

        let response = with_retry(
            &self.retry,
            || async move {
                match tokio::time::timeout(header_timeout, this.send_once(url, None)).await {
                    Ok(result) => result,
                    Err(_) => Err(timeout_error(url)),
                }
            },
            "fetch_streaming",
        )
        .await?;

        let chunks = Box::pin(response.bytes_stream());
        let state = (chunks, url.to_string(), false);

        let stream = futures::stream::unfold(state, move |(mut chunks, url, finished)| async move {
            if finished {
                return None;
            }
            match tokio::time::timeout(read_timeout, chunks.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), (chunks, url, false))),
                Ok(Some(Err(e))) => {
                    let error = ReqwestTransport::map_body_error(&url, e);
                    Some((Err(error), (chunks, url, true)))
                }
                Ok(None) => None,
                Err(_) => {
                    let error = timeout_error(&url);
                    Some((Err(error), (chunks, url, true)))
                }
            }
        });

        Ok(stream.boxed())
    }
}
