//! Concurrent probing and throughput-gated admission
//!
//! The [`Aggregator`] is the only writer of the channel registry and the
//! group accumulator. Endpoints fan out over the endpoint pool; within one
//! endpoint every candidate channel is measured over the channel pool, and
//! admission happens once the whole batch has been measured.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ConcurrencyConfig, FixedPlaylistConfig};
use crate::ingestor::{EndpointProber, GroupRenames};
use crate::models::{ChannelRegistry, Endpoint, EndpointKind, GroupAccumulator, ProbedChannel};
use crate::services::speed_gate::ThroughputProbe;
use crate::services::worker_pool::WorkerPool;
use crate::utils::url::UrlUtils;

#[derive(Debug, Default)]
struct Counters {
    endpoints_probed: AtomicUsize,
    endpoints_failed: AtomicUsize,
    channels_tested: AtomicUsize,
    channels_admitted: AtomicUsize,
    channels_rejected: AtomicUsize,
}

/// Counter snapshot taken when aggregation finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub endpoints_probed: usize,
    pub endpoints_failed: usize,
    pub channels_tested: usize,
    pub channels_admitted: usize,
    pub channels_rejected: usize,
}

/// Everything the classification and serialization stages consume
#[derive(Debug)]
pub struct Aggregation {
    pub registry: ChannelRegistry,
    pub groups: GroupAccumulator,
    pub stats: AggregationStats,
}

pub struct Aggregator {
    prober: EndpointProber,
    probe: Arc<dyn ThroughputProbe>,
    threshold: f64,
    endpoint_pool: WorkerPool,
    channel_pool: WorkerPool,
    registry: Mutex<ChannelRegistry>,
    groups: Mutex<GroupAccumulator>,
    counters: Counters,
}

impl Aggregator {
    pub fn new(
        prober: EndpointProber,
        probe: Arc<dyn ThroughputProbe>,
        threshold: f64,
        concurrency: &ConcurrencyConfig,
    ) -> Self {
        Self {
            prober,
            probe,
            threshold,
            endpoint_pool: WorkerPool::new("endpoint", concurrency.endpoint_workers),
            channel_pool: WorkerPool::new("channel", concurrency.channel_workers),
            registry: Mutex::new(ChannelRegistry::new()),
            groups: Mutex::new(GroupAccumulator::new()),
            counters: Counters::default(),
        }
    }

    /// Admission is a strict comparison against the threshold
    pub fn is_admitted(&self, speed: f64) -> bool {
        speed > self.threshold
    }

    /// Probe discovered endpoints; their group labels do not reach the output
    pub async fn process_endpoints(&self, endpoints: &[Endpoint]) {
        info!(
            "Processing {} endpoints with {} endpoint workers",
            endpoints.len(),
            self.endpoint_pool.concurrency()
        );
        self.endpoint_pool
            .run_unordered(endpoints, |endpoint| self.process_endpoint(endpoint))
            .await;
    }

    async fn process_endpoint(&self, endpoint: &Endpoint) {
        let display_url = UrlUtils::obfuscate_credentials(&endpoint.url);
        let probed = match self.prober.probe(endpoint, &GroupRenames::default()).await {
            Ok(probed) => probed,
            Err(e) => {
                warn!("Endpoint skipped: {} - {}", display_url, e);
                self.counters.endpoints_failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        self.counters.endpoints_probed.fetch_add(1, Ordering::Relaxed);

        let candidates = if endpoint.kind == EndpointKind::Api {
            let registry = self.registry.lock().await;
            probed
                .into_iter()
                .filter(|p| !registry.contains(&p.channel.identity_key()))
                .collect()
        } else {
            probed
        };

        let measured = self.measure_batch(candidates).await;

        let mut registry = self.registry.lock().await;
        let mut admitted = 0;
        for (probed, speed) in &measured {
            if self.is_admitted(*speed) {
                registry.admit(&probed.channel);
                admitted += 1;
            }
        }
        drop(registry);

        self.record_batch(measured.len(), admitted);
        if admitted > 0 {
            info!(
                "Admitted {}/{} channels from {}",
                admitted,
                measured.len(),
                display_url
            );
        }
    }

    /// Probe one curated playlist and keep its groups
    ///
    /// Fixed playlists run one at a time in configuration order so that the
    /// group section order in the output is stable.
    pub async fn process_fixed_playlist(&self, fixed: &FixedPlaylistConfig) {
        let endpoint = Endpoint::playlist(fixed.url.as_str());
        let display_url = UrlUtils::obfuscate_credentials(&fixed.url);
        let renames = GroupRenames::new(fixed.renames.clone());

        let probed = match self.prober.probe(&endpoint, &renames).await {
            Ok(probed) => probed,
            Err(e) => {
                warn!("Fixed playlist skipped: {} - {}", display_url, e);
                self.counters.endpoints_failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        self.counters.endpoints_probed.fetch_add(1, Ordering::Relaxed);

        let measured: Vec<(ProbedChannel, f64)> = if fixed.speed_test {
            self.measure_batch(probed).await
        } else {
            probed.into_iter().map(|p| (p, f64::INFINITY)).collect()
        };

        let mut registry = self.registry.lock().await;
        let mut groups = self.groups.lock().await;
        let mut admitted = 0;
        for (probed, speed) in &measured {
            if !self.is_admitted(*speed) {
                continue;
            }
            registry.admit(&probed.channel);
            if let Some(label) = &probed.group {
                groups.append(label, probed.channel.clone());
            }
            admitted += 1;
        }
        drop(groups);
        drop(registry);

        self.record_batch(measured.len(), admitted);
        info!(
            "Fixed playlist {}: admitted {}/{} channels",
            display_url,
            admitted,
            measured.len()
        );
    }

    /// Measure a batch on the channel pool; results keep encounter order
    async fn measure_batch(&self, candidates: Vec<ProbedChannel>) -> Vec<(ProbedChannel, f64)> {
        if candidates.is_empty() {
            return Vec::new();
        }
        debug!(
            "Speed testing {} channels with {} workers",
            candidates.len(),
            self.channel_pool.concurrency()
        );
        let probe = &self.probe;
        self.channel_pool
            .run_ordered(candidates, |candidate| async move {
                let speed = probe.measure(&candidate.channel.url).await;
                (candidate, speed)
            })
            .await
    }

    fn record_batch(&self, tested: usize, admitted: usize) {
        self.counters
            .channels_tested
            .fetch_add(tested, Ordering::Relaxed);
        self.counters
            .channels_admitted
            .fetch_add(admitted, Ordering::Relaxed);
        self.counters
            .channels_rejected
            .fetch_add(tested - admitted, Ordering::Relaxed);
    }

    /// Hand over the registry and groups once all admissions are complete
    pub fn finish(self) -> Aggregation {
        let counters = self.counters;
        Aggregation {
            registry: self.registry.into_inner(),
            groups: self.groups.into_inner(),
            stats: AggregationStats {
                endpoints_probed: counters.endpoints_probed.into_inner(),
                endpoints_failed: counters.endpoints_failed.into_inner(),
                channels_tested: counters.channels_tested.into_inner(),
                channels_admitted: counters.channels_admitted.into_inner(),
                channels_rejected: counters.channels_rejected.into_inner(),
            },
        }
    }
}
