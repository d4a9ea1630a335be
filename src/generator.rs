//! Playlist text generation
//!
//! Output layout:
//!
//! ```text
//! # 最后更新时间: 2025-01-01 08:00
//!
//! 央视频道,#genre#
//! CCTV-1,http://...
//!
//! 卫视频道,#genre#
//! 湖南卫视,http://...
//!
//! 其他频道,#genre#
//! Some Channel,http://...
//!
//! Curated Group,#genre#
//! Curated Channel,http://...
//! ```
//!
//! The three category sections are always present, even when empty. Curated
//! groups follow in first-seen order with their lines in encounter order.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::models::{CategoryBucket, EndpointGroup};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const HEADER_PREFIX: &str = "# 最后更新时间: ";
const SECTION_SUFFIX: &str = ",#genre#";

pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub struct PlaylistGenerator;

impl PlaylistGenerator {
    pub fn render(timestamp: &str, buckets: &[CategoryBucket], groups: &[EndpointGroup]) -> String {
        let mut sections: Vec<String> = Vec::with_capacity(buckets.len() + groups.len());

        for bucket in buckets {
            sections.push(Self::section(
                bucket.category.section_label(),
                bucket.lines.iter().map(String::as_str),
            ));
        }

        for group in groups {
            let lines: Vec<String> = group.channels.iter().map(|c| c.render_line()).collect();
            sections.push(Self::section(&group.label, lines.iter().map(String::as_str)));
        }

        let mut output = format!("{HEADER_PREFIX}{timestamp}\n\n");
        output.push_str(&sections.join("\n"));
        output
    }

    fn section<'a>(label: &str, lines: impl Iterator<Item = &'a str>) -> String {
        let mut section = format!("{label}{SECTION_SUFFIX}\n");
        for line in lines {
            section.push_str(line);
            section.push('\n');
        }
        section
    }
}
