//! Candidate URL normalization
//!
//! Strings scraped from source lists are turned into probe endpoints: direct
//! playlist links pass through untouched, anything else is pointed at the
//! channel-list API path many self-hosted IPTV boxes expose.

use url::Url;

use crate::config::ProbeConfig;
use crate::errors::NormalizationError;
use crate::models::Endpoint;
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    api_path: String,
    api_query: String,
    playlist_extensions: Vec<String>,
}

impl UrlNormalizer {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            api_path: config.api_path.clone(),
            api_query: config.api_query.clone(),
            playlist_extensions: config.playlist_extensions.clone(),
        }
    }

    /// Canonical probe endpoint for `raw`, or an error when it is not a URL
    pub fn normalize(&self, raw: &str) -> Result<Endpoint, NormalizationError> {
        let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("http://{}", raw.trim_matches('/'))
        };

        let parsed = Url::parse(&candidate).map_err(|source| NormalizationError::Unparseable {
            raw: raw.to_string(),
            source,
        })?;

        if UrlUtils::path_has_extension(&parsed, &self.playlist_extensions) {
            return Ok(Endpoint::playlist(candidate));
        }

        let mut api = parsed;
        api.set_path(&self.api_path);
        api.set_query(Some(&self.api_query));
        api.set_fragment(None);
        Ok(Endpoint::api(api.to_string()))
    }
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EndpointKind;

    #[test]
    fn test_bare_host_becomes_api_endpoint() {
        let endpoint = UrlNormalizer::default().normalize("example.com").unwrap();
        assert_eq!(endpoint.url, "http://example.com/iptv/live/1000.json?key=txiptv");
        assert_eq!(endpoint.kind, EndpointKind::Api);
    }

    #[test]
    fn test_playlist_urls_pass_through_unchanged() {
        let normalizer = UrlNormalizer::default();

        let endpoint = normalizer.normalize("http://x.com/list.m3u").unwrap();
        assert_eq!(endpoint.url, "http://x.com/list.m3u");
        assert_eq!(endpoint.kind, EndpointKind::Playlist);

        let endpoint = normalizer.normalize("x.com/tv/list.txt").unwrap();
        assert_eq!(endpoint.url, "http://x.com/tv/list.txt");
        assert_eq!(endpoint.kind, EndpointKind::Playlist);
    }

    #[test]
    fn test_path_and_query_are_replaced_but_port_kept() {
        let endpoint = UrlNormalizer::default()
            .normalize("https://1.2.3.4:8080/some/page.html?x=1#frag")
            .unwrap();
        assert_eq!(
            endpoint.url,
            "https://1.2.3.4:8080/iptv/live/1000.json?key=txiptv"
        );
    }

    #[test]
    fn test_trailing_slashes_stripped_before_scheme_added() {
        let endpoint = UrlNormalizer::default().normalize("tv.example.net//").unwrap();
        assert_eq!(
            endpoint.url,
            "http://tv.example.net/iptv/live/1000.json?key=txiptv"
        );
    }

    #[test]
    fn test_unparseable_is_rejected() {
        let normalizer = UrlNormalizer::default();
        assert!(normalizer.normalize("http://").is_err());
        assert!(normalizer.normalize("exa mple.com").is_err());
    }
}
