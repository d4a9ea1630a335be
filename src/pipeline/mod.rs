//! Pipeline orchestration
//!
//! SourceFetcher -> EndpointProber -> SpeedGate -> Aggregator -> Classifier
//! -> PlaylistGenerator -> publish. Classification only starts after every
//! admission has completed.

pub mod orchestrator;

pub use orchestrator::{PipelineOrchestrator, RenderedPlaylist};
