//! JSON channel-list API parsing
//!
//! Expected shape: `{"data": [{"name": "...", "url": "..."}, ...]}`. Only
//! `name` and `url` are read; relative URLs resolve against the endpoint.

use serde_json::Value;
use tracing::debug;

use crate::errors::{ProbeError, ProbeResult};
use crate::models::{Channel, ProbedChannel};
use crate::utils::url::UrlUtils;

pub fn parse_api_response(
    endpoint_url: &str,
    body: &[u8],
    limit: usize,
) -> ProbeResult<Vec<ProbedChannel>> {
    let document: Value = serde_json::from_slice(body).map_err(|e| ProbeError::Parse {
        url: endpoint_url.to_string(),
        message: e.to_string(),
    })?;

    let entries = document
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ProbeError::InvalidShape {
            url: endpoint_url.to_string(),
            message: "missing 'data' list".to_string(),
        })?;

    let mut channels = Vec::new();
    for entry in entries.iter().take(limit) {
        let (Some(name), Some(url)) = (
            entry.get("name").and_then(Value::as_str),
            entry.get("url").and_then(Value::as_str),
        ) else {
            continue;
        };

        let full_url = match UrlUtils::join(endpoint_url, url.trim()) {
            Ok(full_url) => full_url,
            Err(e) => {
                debug!("Skipping channel '{}' with bad url '{}': {}", name, url, e);
                continue;
            }
        };

        channels.push(ProbedChannel::ungrouped(Channel::new(name.trim(), full_url)));
    }

    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "http://10.0.0.1:8080/iptv/live/1000.json?key=txiptv";

    #[test]
    fn test_parses_and_resolves_relative_urls() {
        let body = br#"{"code":0,"data":[
            {"name":" CCTV-1 ","url":"/tsfile/live/0001_1.m3u8"},
            {"name":"Hunan","url":"http://cdn.example.com/hunan.m3u8 "}
        ]}"#;
        let channels = parse_api_response(ENDPOINT, body, 200).unwrap();

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].channel.name, "CCTV-1");
        assert_eq!(
            channels[0].channel.url,
            "http://10.0.0.1:8080/tsfile/live/0001_1.m3u8"
        );
        assert_eq!(channels[1].channel.url, "http://cdn.example.com/hunan.m3u8");
        assert!(channels.iter().all(|c| c.group.is_none()));
    }

    #[test]
    fn test_entries_missing_fields_are_skipped() {
        let body = br#"{"data":[{"name":"A"},{"url":"/b"},{"name":"C","url":"/c"},{"name":5,"url":"/d"}]}"#;
        let channels = parse_api_response(ENDPOINT, body, 200).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel.name, "C");
    }

    #[test]
    fn test_limit_applies_before_filtering() {
        let body = br#"{"data":[{"name":"A"},{"name":"B","url":"/b"},{"name":"C","url":"/c"}]}"#;
        let channels = parse_api_response(ENDPOINT, body, 2).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel.name, "B");
    }

    #[test]
    fn test_wrong_shape_and_bad_json() {
        assert!(matches!(
            parse_api_response(ENDPOINT, br#"{"data":{"name":"A"}}"#, 200),
            Err(ProbeError::InvalidShape { .. })
        ));
        assert!(matches!(
            parse_api_response(ENDPOINT, br#"[1,2,3]"#, 200),
            Err(ProbeError::InvalidShape { .. })
        ));
        assert!(matches!(
            parse_api_response(ENDPOINT, b"<html>not json</html>", 200),
            Err(ProbeError::Parse { .. })
        ));
    }
}
