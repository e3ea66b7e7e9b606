//! # Domain Probe Library
//!
//! Concurrent TCP liveness probing for domain lists kept in plain text files.
//!
//! Input lists are treated as mutable queues: entries are taken out at
//! random and durably removed, pushed through a bounded intake queue to a
//! fixed pool of workers, probed with a single TCP connect to port 80 and
//! appended to either the valid or the invalid result list.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_probe_lib::{ProbeConfig, ProbeRunner, RunMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProbeConfig::default().with_threads(8).with_mode(RunMode::Once);
//!     let summary = ProbeRunner::new(config).run().await?;
//!
//!     println!("valid: {}  invalid: {}", summary.valid, summary.invalid);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Line stores**: random, at-most-once extraction from text files
//! - **Feeder**: drains every store in the input directory, once or forever
//! - **Worker pool**: N workers sharing one intake queue
//! - **Prober**: TCP connect with a dial timeout, binary classification
//! - **Result sink**: append-only valid/invalid lists

// Re-export main public API types and functions
pub use config::{
    load_env_config, load_env_config_from, merge_configs, parse_duration_string, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig, LoadedConfig, PathsConfig,
};
pub use error::DomainProbeError;
pub use feeder::{FeedOutcome, Feeder};
pub use pool::{IntakeSender, WorkerPool};
pub use prober::{Prober, TcpProber};
pub use runner::ProbeRunner;
pub use sink::ResultSink;
pub use stats::{PipelineStats, StatsSnapshot};
pub use store::{list_stores, parse_entries, LineStore};
pub use types::{
    Classification, ProbeConfig, ProbeFailure, ProbeResult, RunMode, RunSummary, DEFAULT_PORT,
};

mod config;
mod error;
mod feeder;
mod pool;
mod prober;
mod runner;
mod sink;
mod stats;
mod store;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainProbeError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
