//! Run orchestration.
//!
//! `ProbeRunner` wires a feeder, a worker pool, a prober and a result sink
//! for one run and reports the totals when the pipeline has drained.

use crate::error::DomainProbeError;
use crate::feeder::Feeder;
use crate::pool::WorkerPool;
use crate::prober::{Prober, TcpProber};
use crate::sink::ResultSink;
use crate::stats::PipelineStats;
use crate::types::{ProbeConfig, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Coordinates a full probing run.
///
/// # Example
///
/// ```rust,no_run
/// use domain_probe_lib::{ProbeConfig, ProbeRunner, RunMode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ProbeConfig::default()
///         .with_threads(16)
///         .with_mode(RunMode::Once);
///
///     let summary = ProbeRunner::new(config).run().await?;
///     println!("{} valid, {} invalid", summary.valid, summary.invalid);
///     Ok(())
/// }
/// ```
pub struct ProbeRunner<P: Prober = TcpProber> {
    config: ProbeConfig,
    prober: Arc<P>,
    stats: Arc<PipelineStats>,
}

impl ProbeRunner<TcpProber> {
    /// Runner that probes over TCP using the configured port and timeout.
    pub fn new(config: ProbeConfig) -> Self {
        let prober = TcpProber::with_port(config.timeout, config.port);
        Self::with_prober(config, prober)
    }
}

impl<P: Prober> ProbeRunner<P> {
    /// Runner with a custom prober.
    pub fn with_prober(config: ProbeConfig, prober: P) -> Self {
        Self {
            config,
            prober: Arc::new(prober),
            stats: Arc::new(PipelineStats::new()),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Live counters of this runner, for observers.
    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Run the pipeline until the feeder stops and the pool has drained.
    ///
    /// In watch mode this only returns if the input directory becomes
    /// unlistable or contains no files.
    ///
    /// # Errors
    ///
    /// - `DomainProbeError::FileError` if the result directories cannot be
    ///   created or the input directory cannot be listed.
    /// - `DomainProbeError::QueueClosed` if all workers died.
    ///
    /// Workers already probing are always allowed to finish first.
    pub async fn run(&self) -> Result<RunSummary, DomainProbeError> {
        let start_time = Instant::now();

        let sink = ResultSink::new(&self.config.valid_path, &self.config.invalid_path);
        sink.prepare().await?;

        let (pool, tx) = WorkerPool::spawn(
            self.config.threads,
            self.config.effective_queue_capacity(),
            Arc::clone(&self.prober),
            sink,
            Arc::clone(&self.stats),
        );

        info!(
            workers = pool.size(),
            mode = %self.config.mode,
            input = %self.config.input_dir.display(),
            port = self.config.port,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "probe run started"
        );

        let feeder = Feeder::new(&self.config, Arc::clone(&self.stats));
        let fed = feeder.run(tx).await;

        let finished = pool.join().await;
        let summary = self.summary(start_time);

        match fed {
            Ok(outcome) => {
                info!(
                    ?outcome,
                    workers_finished = finished,
                    processed = summary.processed,
                    valid = summary.valid,
                    invalid = summary.invalid,
                    "probe run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, processed = summary.processed, "feeder stopped");
                Err(e)
            }
        }
    }

    fn summary(&self, start_time: Instant) -> RunSummary {
        let snapshot = self.stats.snapshot();
        RunSummary {
            dispatched: snapshot.dispatched,
            processed: snapshot.processed,
            valid: snapshot.valid,
            invalid: snapshot.invalid,
            sink_errors: snapshot.sink_errors,
            passes: snapshot.passes,
            elapsed_secs: start_time.elapsed().as_secs_f64(),
        }
    }
}
