//! Runtime for the bounded-buffer traffic pipeline.

use tracing::Level;

pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod sequential;

pub use pipeline::{
    ConfigError, Pipeline, PipelineConfig, PipelineError, RunOutcome, DEFAULT_CAPACITY,
};
pub use queue::{BoundedQueue, Phase};
pub use sequential::run_sequential;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .try_init();
}
