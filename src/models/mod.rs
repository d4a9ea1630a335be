//! Core data model shared by the pipeline stages

use std::collections::HashMap;
use std::fmt;

/// Label used for playlist channels seen before any group declaration
pub const DEFAULT_GROUP_LABEL: &str = "Other";

/// Name used for playlist URLs that have no preceding metadata line
pub const UNKNOWN_CHANNEL_NAME: &str = "unknown";

/// One live-TV feed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub name: String,
    pub url: String,
}

impl Channel {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Registry identity: exact `name|url`, case-sensitive
    pub fn identity_key(&self) -> String {
        format!("{}|{}", self.name, self.url)
    }

    /// Output line form `name,url`
    pub fn render_line(&self) -> String {
        format!("{},{}", self.name, self.url)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// A channel extracted from an endpoint, with the group it was declared under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedChannel {
    pub group: Option<String>,
    pub channel: Channel,
}

impl ProbedChannel {
    pub fn ungrouped(channel: Channel) -> Self {
        Self {
            group: None,
            channel,
        }
    }

    pub fn grouped<G: Into<String>>(group: G, channel: Channel) -> Self {
        Self {
            group: Some(group.into()),
            channel,
        }
    }
}

/// How an endpoint is probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// JSON channel-list API (`{"data": [{"name", "url"}]}`)
    Api,
    /// Line-oriented playlist document
    Playlist,
}

/// A URL believed to expose channels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub url: String,
    pub kind: EndpointKind,
}

impl Endpoint {
    pub fn api<U: Into<String>>(url: U) -> Self {
        Self {
            url: url.into(),
            kind: EndpointKind::Api,
        }
    }

    pub fn playlist<U: Into<String>>(url: U) -> Self {
        Self {
            url: url.into(),
            kind: EndpointKind::Playlist,
        }
    }
}

/// Deduplicated admitted channels keyed by identity
///
/// The only mutation is overwrite-by-key, so the map can never hold two
/// entries with the same identity.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    entries: HashMap<String, String>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns true when the key was not present before
    pub fn admit(&mut self, channel: &Channel) -> bool {
        self.entries
            .insert(channel.identity_key(), channel.render_line())
            .is_none()
    }

    pub fn contains(&self, identity_key: &str) -> bool {
        self.entries.contains_key(identity_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered `name,url` lines in unspecified order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }
}

/// Channels collected under a curator-provided label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointGroup {
    pub label: String,
    pub channels: Vec<Channel>,
}

/// Group sections in first-seen order; membership is not deduplicated
#[derive(Debug, Clone, Default)]
pub struct GroupAccumulator {
    groups: Vec<EndpointGroup>,
    index: HashMap<String, usize>,
}

impl GroupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, label: &str, channel: Channel) {
        let position = match self.index.get(label) {
            Some(&position) => position,
            None => {
                self.groups.push(EndpointGroup {
                    label: label.to_string(),
                    channels: Vec::new(),
                });
                let position = self.groups.len() - 1;
                self.index.insert(label.to_string(), position);
                position
            }
        };
        self.groups[position].channels.push(channel);
    }

    pub fn groups(&self) -> &[EndpointGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Output categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Cctv,
    Satellite,
    Other,
}

impl Category {
    /// Section header label written to the playlist
    pub fn section_label(&self) -> &'static str {
        match self {
            Category::Cctv => "央视频道",
            Category::Satellite => "卫视频道",
            Category::Other => "其他频道",
        }
    }
}

/// Sorted lines of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBucket {
    pub category: Category,
    pub lines: Vec<String>,
}

/// Counters describing one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources_fetched: usize,
    pub sources_failed: usize,
    pub candidates_seen: usize,
    pub candidates_rejected: usize,
    pub endpoints_discovered: usize,
    pub endpoints_probed: usize,
    pub endpoints_failed: usize,
    pub channels_tested: usize,
    pub channels_admitted: usize,
    pub channels_rejected: usize,
    pub registry_size: usize,
    pub cctv_lines: usize,
    pub satellite_lines: usize,
    pub other_lines: usize,
    pub groups: usize,
}

impl RunReport {
    /// True when any source or endpoint was skipped
    pub fn is_partial(&self) -> bool {
        self.sources_failed > 0 || self.endpoints_failed > 0
    }
}
