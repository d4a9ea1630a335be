pub mod classifier;
pub mod config;
pub mod errors;
pub mod generator;
pub mod ingestor;
pub mod models;
pub mod pipeline;
pub mod publish;
pub mod services;
pub mod sources;
pub mod utils;

pub use errors::{AppError, AppResult};
