use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use iptv_collector::{
    AppError,
    config::{Config, FixedPlaylistConfig, GroupRenameConfig},
    errors::{TransportError, TransportResult},
    pipeline::PipelineOrchestrator,
    utils::{ByteStream, HttpTransport},
};

const SOURCE: &str = "http://src.example.net/list.txt";
const BOX_API: &str = "http://box1.example.com:8080/iptv/live/1000.json?key=txiptv";
const BOX_PLAYLIST: &str = "http://box2.example.com/playlist.m3u";
const FIXED: &str = "http://fixed.example.net/curated";

// In-memory web: known URLs serve their body, anything else is a 404
struct FakeWeb {
    pages: HashMap<String, String>,
    requests: AtomicUsize,
}

impl FakeWeb {
    fn new() -> Self {
        let live = "x".repeat(2048);
        let mut pages = HashMap::new();

        pages.insert(
            SOURCE.to_string(),
            format!(
                "Known boxes:\n{}\nhttps://github.com/someone/iptv\nhttp://box1.example.com:8080/\n{}\n",
                "see https://raw.githubusercontent.com/a/b/main/list.m3u", BOX_PLAYLIST
            ),
        );
        pages.insert(
            BOX_API.to_string(),
            r#"{"code":0,"data":[
                {"name":"CCTV-13 新闻","url":"http://stream.example.com/c13"},
                {"name":"CCTV1 HD","url":"/c1hd"},
                {"name":"湖南卫视高清","url":"http://stream.example.com/hunan"},
                {"name":"Dead Channel","url":"http://stream.example.com/dead"},
                {"url":"http://stream.example.com/nameless"}
            ]}"#
            .to_string(),
        );
        pages.insert(
            BOX_PLAYLIST.to_string(),
            "#EXTM3U\n#EXTGRP:Ignored\n#EXTINF:-1,CCTV-5+ 体育\nhttp://stream.example.com/c5p\n#EXTINF:-1,Local News\nhttp://stream.example.com/local\n"
                .to_string(),
        );
        pages.insert(
            FIXED.to_string(),
            "家新专用 2025,#genre#\nF1,http://stream.example.com/f1\n央视,#genre#\nCCTV-1,http://stream.example.com/c1\n"
                .to_string(),
        );

        for path in ["c13", "hunan", "c5p", "local", "f1", "c1"] {
            pages.insert(format!("http://stream.example.com/{path}"), live.clone());
        }
        pages.insert("http://box1.example.com:8080/c1hd".to_string(), live);

        Self {
            pages,
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeWeb {
    async fn fetch(&self, url: &str, _timeout: Duration) -> TransportResult<Bytes> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .map(|body| Bytes::from(body.clone()))
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn fetch_streaming(
        &self,
        url: &str,
        connect_timeout: Duration,
        _read_timeout: Duration,
    ) -> TransportResult<ByteStream> {
        let body = self.fetch(url, connect_timeout).await?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(body)])))
    }
}

fn test_config(output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.sources.urls = vec![SOURCE.to_string()];
    config.fixed_playlists = vec![FixedPlaylistConfig {
        url: FIXED.to_string(),
        speed_test: true,
        renames: vec![GroupRenameConfig {
            prefix: "家新专用".to_string(),
            label: "家新专用_8642".to_string(),
        }],
    }];
    config.output.path = output_dir.join("zby.txt");
    config
}

const EXPECTED: &str = "# 最后更新时间: 2025-01-01 08:00

央视频道,#genre#
CCTV-1,http://box1.example.com:8080/c1hd
CCTV-1,http://stream.example.com/c1
CCTV-5+,http://stream.example.com/c5p
CCTV-13,http://stream.example.com/c13

卫视频道,#genre#
湖南卫视,http://stream.example.com/hunan

其他频道,#genre#
F1,http://stream.example.com/f1
Local News,http://stream.example.com/local

家新专用_8642,#genre#
F1,http://stream.example.com/f1

央视,#genre#
CCTV-1,http://stream.example.com/c1
";

#[tokio::test]
async fn test_full_pipeline_output() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = PipelineOrchestrator::new(test_config(dir.path()), Arc::new(FakeWeb::new()));

    let rendered = orchestrator.render("2025-01-01 08:00").await;
    assert_eq!(rendered.contents, EXPECTED);

    let report = rendered.report;
    assert_eq!(report.sources_fetched, 1);
    // github links are excluded, not rejected
    assert_eq!(report.candidates_seen, 4);
    assert_eq!(report.candidates_rejected, 0);
    assert_eq!(report.endpoints_discovered, 2);
    assert_eq!(report.endpoints_probed, 3);
    assert_eq!(report.endpoints_failed, 0);
    assert_eq!(report.channels_tested, 8);
    assert_eq!(report.channels_admitted, 7);
    assert_eq!(report.channels_rejected, 1);
    assert_eq!(report.registry_size, 7);
    assert_eq!(report.groups, 2);
    assert!(!report.is_partial());
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let web = Arc::new(FakeWeb::new());
    let orchestrator = PipelineOrchestrator::new(test_config(dir.path()), web.clone());

    let first = orchestrator.render("2025-01-01 08:00").await;
    let second = orchestrator.render("2025-01-01 08:00").await;

    assert_eq!(first.contents, second.contents);
    assert_eq!(first.report, second.report);
    assert!(web.requests.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_run_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let path = config.output.path.clone();
    let orchestrator = PipelineOrchestrator::new(config, Arc::new(FakeWeb::new()));

    let report = orchestrator.run().await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# 最后更新时间: "));
    assert!(written.contains("\n央视频道,#genre#\n"));
    assert!(written.contains("\n卫视频道,#genre#\n"));
    assert!(written.contains("\n其他频道,#genre#\n"));
    assert!(!written.contains("github"));
    assert_eq!(report.registry_size, 7);
}

#[tokio::test]
async fn test_unreachable_sources_still_write_headers() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.sources.urls = vec!["http://down.example.net/a".to_string()];
    config.fixed_playlists.clear();
    let orchestrator = PipelineOrchestrator::new(config, Arc::new(FakeWeb::new()));

    let rendered = orchestrator.render("t").await;

    assert_eq!(
        rendered.contents,
        "# 最后更新时间: t\n\n央视频道,#genre#\n\n卫视频道,#genre#\n\n其他频道,#genre#\n"
    );
    assert_eq!(rendered.report.sources_failed, 1);
    assert!(rendered.report.is_partial());
}

#[tokio::test]
async fn test_unwritable_destination_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.output.path = dir.path().join("no-such-dir").join("zby.txt");
    let orchestrator = PipelineOrchestrator::new(config, Arc::new(FakeWeb::new()));

    let result = orchestrator.run().await;

    assert!(matches!(result, Err(AppError::Persistence(_))));
}
