//! End-to-end run: discovery, probing, admission, classification, output

use chrono::Local;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::errors::AppResult;
use crate::generator::{PlaylistGenerator, format_timestamp};
use crate::ingestor::EndpointProber;
use crate::models::{Category, RunReport};
use crate::publish;
use crate::services::{Aggregator, SpeedGate, ThroughputProbe};
use crate::sources::{SourceFetcher, UrlNormalizer};
use crate::utils::HttpTransport;

/// Rendered playlist plus the counters of the run that produced it
#[derive(Debug, Clone)]
pub struct RenderedPlaylist {
    pub contents: String,
    pub report: RunReport,
}

pub struct PipelineOrchestrator {
    config: Config,
    transport: Arc<dyn HttpTransport>,
    probe: Arc<dyn ThroughputProbe>,
    classifier: Classifier,
}

impl PipelineOrchestrator {
    /// Orchestrator measuring channels with a [`SpeedGate`] over `transport`
    pub fn new(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        let probe: Arc<dyn ThroughputProbe> =
            Arc::new(SpeedGate::new(transport.clone(), config.speed_test.clone()));
        Self::with_probe(config, transport, probe)
    }

    pub fn with_probe(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        probe: Arc<dyn ThroughputProbe>,
    ) -> Self {
        Self {
            config,
            transport,
            probe,
            classifier: Classifier::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage except the final write
    ///
    /// Per-source and per-endpoint failures are logged, counted and skipped;
    /// nothing here aborts the run.
    pub async fn render(&self, timestamp: &str) -> RenderedPlaylist {
        let mut report = RunReport::default();

        let normalizer = UrlNormalizer::new(&self.config.probe);
        let fetcher = SourceFetcher::new(
            self.transport.clone(),
            self.config.sources.clone(),
            normalizer,
        );
        let discovery = fetcher.discover().await;
        report.sources_fetched = discovery.sources_fetched;
        report.sources_failed = discovery.sources_failed;
        report.candidates_seen = discovery.candidates_seen;
        report.candidates_rejected = discovery.candidates_rejected;
        report.endpoints_discovered = discovery.endpoints.len();

        let prober = EndpointProber::new(self.transport.clone(), &self.config.probe);
        let aggregator = Aggregator::new(
            prober,
            self.probe.clone(),
            self.config.speed_test.threshold_kbps,
            &self.config.concurrency,
        );

        aggregator.process_endpoints(&discovery.endpoints).await;
        for fixed in &self.config.fixed_playlists {
            aggregator.process_fixed_playlist(fixed).await;
        }
        let aggregation = aggregator.finish();

        report.endpoints_probed = aggregation.stats.endpoints_probed;
        report.endpoints_failed = aggregation.stats.endpoints_failed;
        report.channels_tested = aggregation.stats.channels_tested;
        report.channels_admitted = aggregation.stats.channels_admitted;
        report.channels_rejected = aggregation.stats.channels_rejected;
        report.registry_size = aggregation.registry.len();
        report.groups = aggregation.groups.len();

        let buckets = self.classifier.bucketize(aggregation.registry.lines());
        for bucket in &buckets {
            let count = bucket.lines.len();
            match bucket.category {
                Category::Cctv => report.cctv_lines = count,
                Category::Satellite => report.satellite_lines = count,
                Category::Other => report.other_lines = count,
            }
        }

        let contents = PlaylistGenerator::render(timestamp, &buckets, aggregation.groups.groups());
        RenderedPlaylist { contents, report }
    }

    /// Full run ending in an all-or-nothing write of the output file
    pub async fn run(&self) -> AppResult<RunReport> {
        let started = Instant::now();
        info!("Pipeline run started");

        let timestamp = format_timestamp(&Local::now());
        let rendered = self.render(&timestamp).await;
        publish::publish(&self.config.output.path, rendered.contents).await?;

        info!(
            "Pipeline run finished in {:.1}s: {} channels ({} CCTV, {} satellite, {} other, {} groups)",
            started.elapsed().as_secs_f64(),
            rendered.report.registry_size,
            rendered.report.cctv_lines,
            rendered.report.satellite_lines,
            rendered.report.other_lines,
            rendered.report.groups
        );
        Ok(rendered.report)
    }

    /// Splice the configured appendix playlist into the existing output file
    pub async fn append_fixed(&self) -> AppResult<bool> {
        publish::publish_appendix(
            self.transport.as_ref(),
            &self.config.output,
            self.config.sources.fetch_timeout,
        )
        .await
    }
}
