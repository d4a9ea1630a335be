//! Endpoint discovery from upstream source lists
//!
//! Each configured source document is fetched as text and scanned for
//! anything URL-shaped. Source-hosting links are dropped, survivors are
//! normalized into probe endpoints and deduplicated by URL string.

pub mod normalizer;

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

pub use normalizer::UrlNormalizer;

use crate::config::SourcesConfig;
use crate::models::Endpoint;
use crate::utils::HttpTransport;
use crate::utils::url::UrlUtils;

/// Scheme-optional, any TLD shape, optional path/query
const URL_PATTERN: &str = r"(?:https?://)?(?:www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_\+.~#?&/=]*";

fn url_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is valid"))
}

/// Every URL-shaped substring of `text`, in order of appearance
pub fn extract_candidates(text: &str) -> Vec<&str> {
    url_regex().find_iter(text).map(|m| m.as_str()).collect()
}

/// Result of scanning all configured sources
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Unique endpoints ordered by URL
    pub endpoints: Vec<Endpoint>,
    pub sources_fetched: usize,
    pub sources_failed: usize,
    pub candidates_seen: usize,
    pub candidates_rejected: usize,
}

pub struct SourceFetcher {
    transport: Arc<dyn HttpTransport>,
    config: SourcesConfig,
    normalizer: UrlNormalizer,
}

impl SourceFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: SourcesConfig,
        normalizer: UrlNormalizer,
    ) -> Self {
        Self {
            transport,
            config,
            normalizer,
        }
    }

    fn is_excluded(&self, candidate: &str) -> bool {
        self.config
            .exclude_hosts
            .iter()
            .any(|host| candidate.contains(host.as_str()))
    }

    /// Fetch every source; a failing source is logged and skipped
    pub async fn discover(&self) -> Discovery {
        let mut discovery = Discovery::default();
        let mut unique: BTreeMap<String, Endpoint> = BTreeMap::new();

        for source in &self.config.urls {
            let source_display = UrlUtils::obfuscate_credentials(source);
            info!("Fetching source list: {}", source_display);

            let text = match self
                .transport
                .fetch_text(source, self.config.fetch_timeout)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!("Source fetch failed: {} - {}", source_display, e);
                    discovery.sources_failed += 1;
                    continue;
                }
            };
            discovery.sources_fetched += 1;

            let candidates = extract_candidates(&text);
            info!(
                "Found {} URL candidates in {}",
                candidates.len(),
                source_display
            );

            for candidate in candidates {
                discovery.candidates_seen += 1;
                if self.is_excluded(candidate) {
                    continue;
                }
                match self.normalizer.normalize(candidate) {
                    Ok(endpoint) => {
                        unique.entry(endpoint.url.clone()).or_insert(endpoint);
                    }
                    Err(e) => {
                        warn!("Discarding candidate: {}", e);
                        discovery.candidates_rejected += 1;
                    }
                }
            }
        }

        discovery.endpoints = unique.into_values().collect();
        info!(
            "Discovered {} unique endpoints from {} sources ({} failed)",
            discovery.endpoints.len(),
            discovery.sources_fetched,
            discovery.sources_failed
        );
        discovery
    }
}
