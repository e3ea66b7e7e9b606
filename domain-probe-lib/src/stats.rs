//! Run counters shared between the pipeline and observers.
//!
//! The feeder and workers are the only writers. Anything else (the CLI
//! status line, the final summary) reads a `StatsSnapshot`.

use crate::types::Classification;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    dispatched: AtomicU64,
    processed: AtomicU64,
    valid: AtomicU64,
    invalid: AtomicU64,
    sink_errors: AtomicU64,
    passes: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub dispatched: u64,
    pub processed: u64,
    pub valid: u64,
    pub invalid: u64,
    pub sink_errors: u64,
    pub passes: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, classification: Classification) {
        match classification {
            Classification::Valid => self.valid.fetch_add(1, Ordering::Relaxed),
            Classification::Invalid => self.invalid.fetch_add(1, Ordering::Relaxed),
        };
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pass(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Entries handed to the pool that no worker has finished yet.
    pub fn in_flight(&self) -> u64 {
        self.dispatched.saturating_sub(self.processed)
    }
}
