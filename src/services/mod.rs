pub mod aggregator;
pub mod speed_gate;
pub mod worker_pool;

pub use aggregator::{Aggregation, AggregationStats, Aggregator};
pub use speed_gate::{SpeedGate, ThroughputProbe};
pub use worker_pool::WorkerPool;
