//! Line-oriented playlist parsing with group preservation
//!
//! Understands both shapes curated lists come in:
//!
//! ```text
//! #EXTM3U                               label,#genre#
//! #EXTGRP:News                          Name One,http://host/1.m3u8
//! #EXTINF:-1,Name One                   Name Two,http://host/2.m3u8
//! http://host/1.m3u8
//! ```
//!
//! A group cursor (default `Other`) is moved by `#EXTGRP:` lines and by
//! `label,#genre#` lines. Every label passes through the rename table.

use tracing::debug;

use crate::config::GroupRenameConfig;
use crate::models::{Channel, DEFAULT_GROUP_LABEL, ProbedChannel, UNKNOWN_CHANNEL_NAME};

const EXTINF_PREFIX: &str = "#EXTINF";
const EXTGRP_PREFIX: &str = "#EXTGRP:";
const GENRE_SUFFIX: &str = ",#genre#";

/// Ordered prefix rename rules; the first matching rule wins
#[derive(Debug, Clone, Default)]
pub struct GroupRenames {
    rules: Vec<GroupRenameConfig>,
}

impl GroupRenames {
    pub fn new(rules: Vec<GroupRenameConfig>) -> Self {
        Self { rules }
    }

    pub fn apply(&self, label: &str) -> String {
        self.rules
            .iter()
            .find(|rule| label.starts_with(rule.prefix.as_str()))
            .map(|rule| rule.label.clone())
            .unwrap_or_else(|| label.to_string())
    }
}

/// Name after the last comma of an `#EXTINF` line, plus its `group-title` if any
fn parse_extinf(line: &str) -> (Option<String>, Option<String>) {
    let name = line
        .rfind(',')
        .map(|pos| line[pos + 1..].trim().to_string())
        .filter(|name| !name.is_empty());

    let group = line.find("group-title=\"").and_then(|start| {
        let value_start = start + "group-title=\"".len();
        line[value_start..]
            .find('"')
            .map(|end| line[value_start..value_start + end].trim().to_string())
            .filter(|group| !group.is_empty())
    });

    (name, group)
}

pub fn parse_playlist(content: &str, renames: &GroupRenames) -> Vec<ProbedChannel> {
    let mut channels = Vec::new();
    let mut current_group = DEFAULT_GROUP_LABEL.to_string();
    let mut pending_name: Option<String> = None;
    let mut pending_group: Option<String> = None;

    for (line_num, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(EXTINF_PREFIX) {
            let (name, group) = parse_extinf(line);
            pending_name = Some(name.unwrap_or_else(|| UNKNOWN_CHANNEL_NAME.to_string()));
            pending_group = group.map(|g| renames.apply(&g));
        } else if let Some(label) = line.strip_prefix(EXTGRP_PREFIX) {
            current_group = renames.apply(label.trim());
        } else if let Some(label) = line.strip_suffix(GENRE_SUFFIX) {
            current_group = renames.apply(label.trim());
            pending_name = None;
            pending_group = None;
        } else if line.starts_with('#') {
            continue;
        } else if line.starts_with("http") {
            let name = pending_name
                .take()
                .unwrap_or_else(|| UNKNOWN_CHANNEL_NAME.to_string());
            let group = pending_group.take().unwrap_or_else(|| current_group.clone());
            channels.push(ProbedChannel::grouped(group, Channel::new(name, line)));
        } else if let Some((name, url)) = line.split_once(',') {
            let url = url.trim();
            if url.starts_with("http") {
                channels.push(ProbedChannel::grouped(
                    current_group.clone(),
                    Channel::new(name.trim(), url),
                ));
            } else {
                debug!("Ignoring playlist line {}: {}", line_num + 1, line);
            }
        } else {
            debug!("Ignoring playlist line {}: {}", line_num + 1, line);
        }
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renames() -> GroupRenames {
        GroupRenames::new(vec![
            GroupRenameConfig {
                prefix: "家新专用".to_string(),
                label: "家新专用_8642".to_string(),
            },
            GroupRenameConfig {
                prefix: "无码步兵".to_string(),
                label: "无码步兵_8642".to_string(),
            },
        ])
    }

    fn triples(channels: &[ProbedChannel]) -> Vec<(String, String, String)> {
        channels
            .iter()
            .map(|c| {
                (
                    c.group.clone().unwrap_or_default(),
                    c.channel.name.clone(),
                    c.channel.url.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_extm3u_with_groups() {
        let content = "#EXTM3U\n\
            #EXTINF:-1,Before Any Group\n\
            http://h/0.m3u8\n\
            #EXTGRP:News\n\
            #EXTINF:-1 tvg-id=\"x\",CCTV-13, 新闻\n\
            http://h/13.m3u8\n\
            # a comment\n\
            #EXTINF:-1,Other News\n\
            http://h/14.m3u8\n";
        let parsed = parse_playlist(content, &GroupRenames::default());

        assert_eq!(
            triples(&parsed),
            vec![
                ("Other".into(), "Before Any Group".into(), "http://h/0.m3u8".into()),
                ("News".into(), "新闻".into(), "http://h/13.m3u8".into()),
                ("News".into(), "Other News".into(), "http://h/14.m3u8".into()),
            ]
        );
    }

    #[test]
    fn test_url_without_metadata_is_unknown() {
        let content = "http://h/1.m3u8\n#EXTINF:-1,A\nhttp://h/2.m3u8\nhttp://h/3.m3u8";
        let parsed = parse_playlist(content, &GroupRenames::default());
        let names: Vec<&str> = parsed.iter().map(|c| c.channel.name.as_str()).collect();
        assert_eq!(names, vec!["unknown", "A", "unknown"]);
    }

    #[test]
    fn test_group_title_attribute_applies_to_one_channel() {
        let content = "#EXTGRP:Main\n\
            #EXTINF:-1 group-title=\"Sports\",S1\n\
            http://h/s1\n\
            #EXTINF:-1,M1\n\
            http://h/m1\n";
        let parsed = parse_playlist(content, &GroupRenames::default());
        assert_eq!(parsed[0].group.as_deref(), Some("Sports"));
        assert_eq!(parsed[1].group.as_deref(), Some("Main"));
    }

    #[test]
    fn test_genre_blocks_with_renames() {
        let content = "家新专用-2024,#genre#\n\
            频道A,http://h/a\n\
            频道B,http://h/b\n\
            \n\
            无码步兵 xyz,#genre#\n\
            频道C,http://h/c\n\
            not a channel line\n\
            央视,#genre#\n\
            CCTV-1,http://h/cctv1\n";
        let parsed = parse_playlist(content, &renames());

        assert_eq!(
            triples(&parsed),
            vec![
                ("家新专用_8642".into(), "频道A".into(), "http://h/a".into()),
                ("家新专用_8642".into(), "频道B".into(), "http://h/b".into()),
                ("无码步兵_8642".into(), "频道C".into(), "http://h/c".into()),
                ("央视".into(), "CCTV-1".into(), "http://h/cctv1".into()),
            ]
        );
    }

    #[test]
    fn test_rename_first_rule_wins_and_unmatched_pass_through() {
        let table = GroupRenames::new(vec![
            GroupRenameConfig {
                prefix: "A".to_string(),
                label: "first".to_string(),
            },
            GroupRenameConfig {
                prefix: "AB".to_string(),
                label: "second".to_string(),
            },
        ]);
        assert_eq!(table.apply("ABC"), "first");
        assert_eq!(table.apply("ZZZ"), "ZZZ");
    }
}
