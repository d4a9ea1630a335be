//! Endpoint probing
//!
//! An [`EndpointProber`] fetches one endpoint and turns it into
//! `(group, name, url)` triples. API endpoints yield ungrouped channels;
//! playlist endpoints keep the group labels the curator wrote.

pub mod api;
pub mod playlist;

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use api::parse_api_response;
pub use playlist::{GroupRenames, parse_playlist};

use crate::config::ProbeConfig;
use crate::errors::ProbeResult;
use crate::models::{Endpoint, EndpointKind, ProbedChannel};
use crate::utils::HttpTransport;
use crate::utils::url::UrlUtils;

pub struct EndpointProber {
    transport: Arc<dyn HttpTransport>,
    request_timeout: Duration,
    api_channel_limit: usize,
}

impl EndpointProber {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ProbeConfig) -> Self {
        Self {
            transport,
            request_timeout: config.request_timeout,
            api_channel_limit: config.api_channel_limit,
        }
    }

    /// Fetch and parse one endpoint; errors are scoped to this endpoint only
    pub async fn probe(
        &self,
        endpoint: &Endpoint,
        renames: &GroupRenames,
    ) -> ProbeResult<Vec<ProbedChannel>> {
        let body = self
            .transport
            .fetch(&endpoint.url, self.request_timeout)
            .await?;

        let channels = match endpoint.kind {
            EndpointKind::Api => {
                parse_api_response(&endpoint.url, &body, self.api_channel_limit)?
            }
            EndpointKind::Playlist => parse_playlist(&String::from_utf8_lossy(&body), renames),
        };

        debug!(
            "Probed {:?} endpoint {}: {} channels",
            endpoint.kind,
            UrlUtils::obfuscate_credentials(&endpoint.url),
            channels.len()
        );
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ProbeError, TransportError};
    use crate::sources::tests::StaticTransport;

    fn prober(transport: StaticTransport) -> EndpointProber {
        EndpointProber::new(Arc::new(transport), &ProbeConfig::default())
    }

    #[tokio::test]
    async fn test_api_endpoint() {
        let url = "http://box:8000/iptv/live/1000.json?key=txiptv";
        let transport = StaticTransport::default().with(
            url,
            r#"{"data":[{"name":"CCTV-1","url":"/hls/1.m3u8"}]}"#,
        );
        let channels = prober(transport)
            .probe(&Endpoint::api(url), &GroupRenames::default())
            .await
            .unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel.url, "http://box:8000/hls/1.m3u8");
        assert_eq!(channels[0].group, None);
    }

    #[tokio::test]
    async fn test_playlist_endpoint_keeps_groups() {
        let url = "http://box/list.m3u";
        let transport = StaticTransport::default().with(
            url,
            "#EXTM3U\n#EXTGRP:News\n#EXTINF:-1,N1\nhttp://n/1\n",
        );
        let channels = prober(transport)
            .probe(&Endpoint::playlist(url), &GroupRenames::default())
            .await
            .unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].group.as_deref(), Some("News"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_scoped_to_endpoint() {
        let result = prober(StaticTransport::default())
            .probe(&Endpoint::api("http://gone/x.json"), &GroupRenames::default())
            .await;
        assert!(matches!(
            result,
            Err(ProbeError::Transport(TransportError::Status { status: 404, .. }))
        ));
    }
}
