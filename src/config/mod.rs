use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use defaults::*;
use duration_serde::duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub speed_test: SpeedTestConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default = "default_fixed_playlists")]
    pub fixed_playlists: Vec<FixedPlaylistConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upstream "source list" documents scanned for endpoint URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_source_urls")]
    pub urls: Vec<String>,
    /// Candidates containing any of these substrings are dropped
    #[serde(default = "default_exclude_hosts")]
    pub exclude_hosts: Vec<String>,
    #[serde(default = "default_fetch_timeout", with = "duration")]
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    /// Maximum entries taken from one JSON API response
    #[serde(default = "default_api_channel_limit")]
    pub api_channel_limit: usize,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default = "default_api_query")]
    pub api_query: String,
    /// Paths with these suffixes are probed as playlists, not as the JSON API
    #[serde(default = "default_playlist_extensions")]
    pub playlist_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedTestConfig {
    /// Admission requires a measurement strictly above this value (KB/s)
    #[serde(default = "default_threshold_kbps")]
    pub threshold_kbps: f64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_max_duration", with = "duration")]
    pub max_duration: Duration,
    #[serde(default = "default_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_read_timeout", with = "duration")]
    pub read_timeout: Duration,
    /// Floor applied to elapsed time before dividing
    #[serde(default = "default_min_elapsed", with = "duration")]
    pub min_elapsed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Endpoints probed in parallel
    #[serde(default = "default_endpoint_workers")]
    pub endpoint_workers: usize,
    /// Speed tests in flight per endpoint
    #[serde(default = "default_channel_workers")]
    pub channel_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// TCP/TLS connect budget for every request
    #[serde(default = "default_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_initial", with = "duration")]
    pub backoff_initial: Duration,
    #[serde(default = "default_backoff_max", with = "duration")]
    pub backoff_max: Duration,
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

/// A curated playlist whose group labels are preserved in the output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedPlaylistConfig {
    pub url: String,
    /// Run channels through the speed gate before admission
    #[serde(default = "default_true")]
    pub speed_test: bool,
    #[serde(default)]
    pub renames: Vec<GroupRenameConfig>,
}

/// Group labels starting with `prefix` are replaced by `label`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupRenameConfig {
    pub prefix: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_appendix_marker")]
    pub appendix_marker: String,
    /// Raw playlist spliced after the marker by `append-fixed`
    #[serde(default = "default_appendix_url")]
    pub appendix_url: String,
}

fn default_true() -> bool {
    true
}

fn default_source_urls() -> Vec<String> {
    DEFAULT_SOURCE_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_exclude_hosts() -> Vec<String> {
    DEFAULT_EXCLUDE_HOSTS.iter().map(|s| s.to_string()).collect()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_api_channel_limit() -> usize {
    DEFAULT_API_CHANNEL_LIMIT
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_api_query() -> String {
    DEFAULT_API_QUERY.to_string()
}

fn default_playlist_extensions() -> Vec<String> {
    DEFAULT_PLAYLIST_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_threshold_kbps() -> f64 {
    DEFAULT_THRESHOLD_KBPS
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_max_duration() -> Duration {
    Duration::from_secs(DEFAULT_MAX_DURATION_SECS)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS)
}

fn default_min_elapsed() -> Duration {
    Duration::from_millis(DEFAULT_MIN_ELAPSED_MS)
}

fn default_endpoint_workers() -> usize {
    DEFAULT_ENDPOINT_WORKERS
}

fn default_channel_workers() -> usize {
    DEFAULT_CHANNEL_WORKERS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_initial() -> Duration {
    Duration::from_millis(DEFAULT_BACKOFF_INITIAL_MS)
}

fn default_backoff_max() -> Duration {
    Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS)
}

fn default_retry_statuses() -> Vec<u16> {
    DEFAULT_RETRY_STATUSES.to_vec()
}

fn default_fixed_playlists() -> Vec<FixedPlaylistConfig> {
    vec![FixedPlaylistConfig {
        url: DEFAULT_FIXED_PLAYLIST_URL.to_string(),
        speed_test: true,
        renames: DEFAULT_GROUP_RENAMES
            .iter()
            .map(|(prefix, label)| GroupRenameConfig {
                prefix: prefix.to_string(),
                label: label.to_string(),
            })
            .collect(),
    }]
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_appendix_marker() -> String {
    DEFAULT_APPENDIX_MARKER.to_string()
}

fn default_appendix_url() -> String {
    DEFAULT_FIXED_PLAYLIST_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            probe: ProbeConfig::default(),
            speed_test: SpeedTestConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            http: HttpConfig::default(),
            fixed_playlists: default_fixed_playlists(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            urls: default_source_urls(),
            exclude_hosts: default_exclude_hosts(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            api_channel_limit: default_api_channel_limit(),
            api_path: default_api_path(),
            api_query: default_api_query(),
            playlist_extensions: default_playlist_extensions(),
        }
    }
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            threshold_kbps: default_threshold_kbps(),
            max_bytes: default_max_bytes(),
            max_duration: default_max_duration(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            min_elapsed: default_min_elapsed(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            endpoint_workers: default_endpoint_workers(),
            channel_workers: default_channel_workers(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout: default_connect_timeout(),
            max_retries: default_max_retries(),
            backoff_initial: default_backoff_initial(),
            backoff_max: default_backoff_max(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            appendix_marker: default_appendix_marker(),
            appendix_url: default_appendix_url(),
        }
    }
}

impl Config {
    /// Load from `config_file`, writing the defaults there first if it does not exist
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str::<Self>(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.concurrency.endpoint_workers == 0 || self.concurrency.channel_workers == 0 {
            return Err(AppError::configuration(
                "concurrency.endpoint_workers and concurrency.channel_workers must be at least 1",
            ));
        }
        let threshold = self.speed_test.threshold_kbps;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AppError::configuration(format!(
                "speed_test.threshold_kbps must be a non-negative number, got {threshold}"
            )));
        }
        if self.speed_test.max_bytes == 0 {
            return Err(AppError::configuration("speed_test.max_bytes must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.concurrency.endpoint_workers, 5);
        assert_eq!(config.concurrency.channel_workers, 15);
        assert_eq!(config.speed_test.threshold_kbps, 0.15);
        assert_eq!(config.probe.api_channel_limit, 200);
        assert_eq!(config.output.path, PathBuf::from("zby.txt"));
        assert_eq!(config.fixed_playlists.len(), 1);
        assert_eq!(config.fixed_playlists[0].renames.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_override() {
        let config: Config = toml::from_str(
            r#"
            fixed_playlists = []

            [speed_test]
            threshold_kbps = 1.5
            max_duration = "5s"

            [concurrency]
            channel_workers = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.speed_test.threshold_kbps, 1.5);
        assert_eq!(config.speed_test.max_duration, Duration::from_secs(5));
        assert_eq!(config.speed_test.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.concurrency.channel_workers, 1);
        assert_eq!(config.concurrency.endpoint_workers, 5);
        assert!(config.fixed_playlists.is_empty());
    }

    #[test]
    fn test_rename_table_parses() {
        let config: Config = toml::from_str(
            r#"
            [[fixed_playlists]]
            url = "http://example.com/list.txt"
            speed_test = false

            [[fixed_playlists.renames]]
            prefix = "Sports"
            label = "Sports_HD"
            "#,
        )
        .unwrap();
        let fixed = &config.fixed_playlists[0];
        assert!(!fixed.speed_test);
        assert_eq!(
            fixed.renames,
            vec![GroupRenameConfig {
                prefix: "Sports".to_string(),
                label: "Sports_HD".to_string(),
            }]
        );
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let mut config = Config::default();
        config.concurrency.channel_workers = 0;
        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_negative_threshold() {
        let mut config = Config::default();
        config.speed_test.threshold_kbps = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());
        assert_eq!(config.fixed_playlists.len(), 1);

        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.sources.urls, config.sources.urls);
        assert_eq!(reloaded.speed_test.read_timeout, Duration::from_secs(15));
    }
}
