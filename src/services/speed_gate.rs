use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::config::SpeedTestConfig;
use crate::errors::TransportResult;
use crate::utils::HttpTransport;
use crate::utils::retry::timeout_error;
use crate::utils::url::UrlUtils;

/// Throughput measurement of a single channel URL in KB/s
///
/// Implementations never fail: an unreachable channel measures `0.0`.
#[async_trait]
pub trait ThroughputProbe: Send + Sync {
    async fn measure(&self, url: &str) -> f64;
}

/// Partial-download speed test
///
/// Reads until `max_bytes` have arrived or `max_duration` has passed, then
/// divides the KiB received by the elapsed time (floored at `min_elapsed`).
pub struct SpeedGate {
    transport: Arc<dyn HttpTransport>,
    config: SpeedTestConfig,
}

impl SpeedGate {
    pub fn new(transport: Arc<dyn HttpTransport>, config: SpeedTestConfig) -> Self {
        Self { transport, config }
    }

    async fn download(&self, url: &str) -> TransportResult<(u64, Duration)> {
        let start = Instant::now();
        let deadline = start + self.config.max_duration;

        let mut stream = match timeout_at(
            deadline,
            self.transport.fetch_streaming(
                url,
                self.config.connect_timeout,
                self.config.read_timeout,
            ),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error(url)),
        };

        let mut downloaded: u64 = 0;
        loop {
            match timeout_at(deadline, stream.next()).await {
                Ok(Some(chunk)) => {
                    downloaded += chunk?.len() as u64;
                    if downloaded >= self.config.max_bytes {
                        break;
                    }
                }
                Ok(None) => break,
                // duration cap reached; measure what arrived
                Err(_) => break,
            }
        }

        Ok((downloaded, start.elapsed()))
    }
}

/// KiB per second rounded to two decimals
pub fn kib_per_second(bytes: u64, elapsed: Duration, min_elapsed: Duration) -> f64 {
    let seconds = elapsed.max(min_elapsed).as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }
    let speed = (bytes as f64 / 1024.0) / seconds;
    (speed * 100.0).round() / 100.0
}

#[async_trait]
impl ThroughputProbe for SpeedGate {
    async fn measure(&self, url: &str) -> f64 {
        match self.download(url).await {
            Ok((bytes, elapsed)) => {
                let speed = kib_per_second(bytes, elapsed, self.config.min_elapsed);
                debug!(
                    "Speed test {}: {} bytes in {:?} = {} KB/s",
                    UrlUtils::obfuscate_credentials(url),
                    bytes,
                    elapsed,
                    speed
                );
                speed
            }
            Err(e) => {
                debug!("Speed test failed: {}", e);
                0.0
            }
        }
    }
}
