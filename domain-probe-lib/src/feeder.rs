//! The feeder loop: drains line stores into the intake queue.
//!
//! One pass lists the input directory and drains each store to exhaustion
//! before moving to the next, so a store is never touched by two actors at
//! once. In `Once` mode the feeder stops after a single pass; in `Watch`
//! mode it sleeps and rescans to pick up entries added while running.
//!
//! Returning from `run` drops the sender, which closes the queue and lets
//! the workers drain and exit.

use crate::error::DomainProbeError;
use crate::pool::IntakeSender;
use crate::stats::PipelineStats;
use crate::store::{list_stores, LineStore};
use crate::types::{ProbeConfig, RunMode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Why the feeder stopped producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// `Once` mode finished its pass
    PassComplete,
    /// The input directory contains no files
    NoInputFiles,
}

pub struct Feeder {
    input_dir: PathBuf,
    mode: RunMode,
    rescan_interval: Duration,
    stats: Arc<PipelineStats>,
}

impl Feeder {
    pub fn new(config: &ProbeConfig, stats: Arc<PipelineStats>) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            mode: config.mode,
            rescan_interval: config.rescan_interval,
            stats,
        }
    }

    /// Run until the policy says stop.
    ///
    /// # Errors
    ///
    /// - `DomainProbeError::FileError` if the input directory cannot be
    ///   listed. This is fatal for the feeder.
    /// - `DomainProbeError::QueueClosed` if every worker went away.
    ///
    /// Per-file read errors are logged and the file is skipped.
    pub async fn run(self, tx: IntakeSender) -> Result<FeedOutcome, DomainProbeError> {
        loop {
            let stores = list_stores(&self.input_dir).await?;

            if stores.is_empty() {
                info!(dir = %self.input_dir.display(), "no files to probe in input directory");
                return Ok(FeedOutcome::NoInputFiles);
            }

            let mut pass_total = 0u64;
            for store in &stores {
                pass_total += self.drain(store, &tx).await?;
            }
            self.stats.record_pass();

            match self.mode {
                RunMode::Once => {
                    info!(entries = pass_total, files = stores.len(), "single pass complete");
                    return Ok(FeedOutcome::PassComplete);
                }
                RunMode::Watch => {
                    debug!(
                        entries = pass_total,
                        files = stores.len(),
                        pause_ms = self.rescan_interval.as_millis() as u64,
                        "pass complete, rescanning after pause"
                    );
                    tokio::time::sleep(self.rescan_interval).await;
                }
            }
        }
    }

    /// Move every entry of `store` onto the queue. Returns how many moved.
    async fn drain(&self, store: &LineStore, tx: &IntakeSender) -> Result<u64, DomainProbeError> {
        let mut taken = 0u64;

        loop {
            match store.take_random().await {
                Ok(domain) => {
                    // Blocks while the queue is full.
                    tx.send(domain)
                        .await
                        .map_err(|_| DomainProbeError::QueueClosed)?;
                    self.stats.record_dispatch();
                    taken += 1;
                }
                Err(e) if e.is_exhausted() => {
                    info!(file = %store.path().display(), taken, "file is empty");
                    break;
                }
                Err(e) => {
                    warn!(file = %store.path().display(), error = %e, "skipping unreadable file");
                    break;
                }
            }
        }

        Ok(taken)
    }
}
