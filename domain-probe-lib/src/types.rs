//! Core data types for domain liveness probing.
//!
//! This module defines the probe outcome types, the run configuration and
//! the summary returned once a run finishes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Port probed when nothing else is configured.
pub const DEFAULT_PORT: u16 = 80;

/// Binary outcome of a probe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Classification {
    /// A TCP connection was established
    #[serde(rename = "valid")]
    Valid,

    /// Connect failed, was refused, or did not finish within the timeout
    #[serde(rename = "invalid")]
    Invalid,
}

/// Why a probe came back `Invalid`.
///
/// Only used for logging; result lists never distinguish these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Nothing answered before the dial timeout elapsed
    Timeout,
    /// The remote host actively refused the connection
    Refused,
    /// Name resolution or any other connect error
    Connect(String),
}

/// Result of probing a single domain.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// The domain that was probed, exactly as read from the store
    pub domain: String,

    /// Valid or Invalid
    pub classification: Classification,

    /// Time spent resolving and connecting
    pub elapsed: Duration,

    /// Failure detail for `Invalid` results
    pub failure: Option<ProbeFailure>,
}

impl ProbeResult {
    /// Build a `Valid` result.
    pub fn valid<D: Into<String>>(domain: D, elapsed: Duration) -> Self {
        Self {
            domain: domain.into(),
            classification: Classification::Valid,
            elapsed,
            failure: None,
        }
    }

    /// Build an `Invalid` result with the reason it failed.
    pub fn invalid<D: Into<String>>(domain: D, elapsed: Duration, failure: ProbeFailure) -> Self {
        Self {
            domain: domain.into(),
            classification: Classification::Invalid,
            elapsed,
            failure: Some(failure),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.classification == Classification::Valid
    }
}

/// Termination policy of the feeder loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Drain every store once, then close the queue and exit
    #[serde(rename = "once")]
    Once,

    /// Drain every store, sleep, rescan the input directory, forever
    #[serde(rename = "watch")]
    #[default]
    Watch,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "once" => Ok(RunMode::Once),
            "watch" => Ok(RunMode::Watch),
            other => Err(format!("Unknown run mode '{}', use 'once' or 'watch'", other)),
        }
    }
}

/// Configuration for a probing run.
///
/// Defaults match the on-disk layout `domains/`, `valid/valid.txt`,
/// `invalid/invalid.txt` and `logs/logs.txt` relative to the working
/// directory.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Number of concurrent workers. Never below 1.
    pub threads: usize,

    /// Dial timeout for each probe, resolution included
    /// Default: 5 seconds
    pub timeout: Duration,

    /// TCP port to connect to
    /// Default: 80
    pub port: u16,

    /// Once or watch
    pub mode: RunMode,

    /// Pause between feeder passes in watch mode
    /// Default: 1 second
    pub rescan_interval: Duration,

    /// Capacity of the intake queue. `None` means one slot per worker.
    pub queue_capacity: Option<usize>,

    /// Directory holding the input line stores
    pub input_dir: PathBuf,

    /// Result list for reachable domains
    pub valid_path: PathBuf,

    /// Result list for unreachable domains
    pub invalid_path: PathBuf,

    /// Log file written by the CLI
    pub log_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            timeout: Duration::from_secs(5),
            port: DEFAULT_PORT,
            mode: RunMode::default(),
            rescan_interval: Duration::from_secs(1),
            queue_capacity: None,
            input_dir: PathBuf::from("domains"),
            valid_path: PathBuf::from("valid").join("valid.txt"),
            invalid_path: PathBuf::from("invalid").join("invalid.txt"),
            log_path: PathBuf::from("logs").join("logs.txt"),
        }
    }
}

impl ProbeConfig {
    /// Set the worker count, clamping anything below 1 up to 1.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the dial timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the probed port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the feeder termination policy.
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the pause between feeder passes.
    pub fn with_rescan_interval(mut self, interval: Duration) -> Self {
        self.rescan_interval = interval;
        self
    }

    /// Set the input directory.
    pub fn with_input_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Set both result list paths.
    pub fn with_result_paths<V: Into<PathBuf>, I: Into<PathBuf>>(
        mut self,
        valid: V,
        invalid: I,
    ) -> Self {
        self.valid_path = valid.into();
        self.invalid_path = invalid.into();
        self
    }

    /// Effective intake queue capacity.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.threads).max(1)
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Entries taken out of stores and handed to the pool
    pub dispatched: u64,
    /// Entries a worker finished (probe + record attempt)
    pub processed: u64,
    pub valid: u64,
    pub invalid: u64,
    /// Appends that failed and were only logged
    pub sink_errors: u64,
    /// Completed feeder passes over the input directory
    pub passes: u64,
    /// Wall-clock duration of the run in seconds
    pub elapsed_secs: f64,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Valid => write!(f, "valid"),
            Classification::Invalid => write!(f, "invalid"),
        }
    }
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "timed out"),
            ProbeFailure::Refused => write!(f, "connection refused"),
            ProbeFailure::Connect(message) => write!(f, "{}", message),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Once => write!(f, "once"),
            RunMode::Watch => write!(f, "watch"),
        }
    }
}
