/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Upstream source lists
pub const DEFAULT_SOURCE_URLS: &[&str] = &[
    "https://d.kstore.dev/download/10694/zmtvid.txt",
    "https://raw.githubusercontent.com/iptv-org/iptv/master/scripts/sources.md",
    "https://raw.githubusercontent.com/freeiptv/iptv/master/sources.md",
];
pub const DEFAULT_EXCLUDE_HOSTS: &[&str] = &["github.com", "raw.githubusercontent.com"];
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

// Endpoint probing
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_API_CHANNEL_LIMIT: usize = 200;
pub const DEFAULT_API_PATH: &str = "/iptv/live/1000.json";
pub const DEFAULT_API_QUERY: &str = "key=txiptv";
pub const DEFAULT_PLAYLIST_EXTENSIONS: &[&str] = &[".m3u", ".txt"];

// Speed test
pub const DEFAULT_THRESHOLD_KBPS: f64 = 0.15;
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_MAX_DURATION_SECS: u64 = 20;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MIN_ELAPSED_MS: u64 = 100;

// Concurrency
pub const DEFAULT_ENDPOINT_WORKERS: usize = 5;
pub const DEFAULT_CHANNEL_WORKERS: usize = 15;

// HTTP transport
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF_INITIAL_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 10;
pub const DEFAULT_RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

// Fixed playlists
pub const DEFAULT_FIXED_PLAYLIST_URL: &str =
    "https://raw.githubusercontent.com/xiaolin330328/ctv/refs/heads/main/%E7%AC%AC%E4%BA%8C";
pub const DEFAULT_GROUP_RENAMES: &[(&str, &str)] = &[
    ("家新专用", "家新专用_8642"),
    ("无码步兵", "无码步兵_8642"),
];

// Output
pub const DEFAULT_OUTPUT_PATH: &str = "zby.txt";
pub const DEFAULT_APPENDIX_MARKER: &str = "# ===== 新增直播源 =====";
