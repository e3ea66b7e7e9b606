//! Fixed-size worker pool fed by the intake queue.
//!
//! All workers are spawned before the sender half of the queue is handed
//! out, so concurrency is bounded from the first entry on. Workers share
//! one receiver; each loops dequeue → probe → record until the queue is
//! closed and drained. Delivery is at-most-once: an entry taken off the
//! queue is never put back.

use crate::prober::Prober;
use crate::sink::ResultSink;
use crate::stats::PipelineStats;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Sending half of the intake queue. Dropping every clone closes the queue.
pub type IntakeSender = mpsc::Sender<String>;

type SharedReceiver = Arc<Mutex<mpsc::Receiver<String>>>;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) and return the pool together
    /// with the intake sender.
    ///
    /// `capacity` bounds the queue; a full queue suspends the sender.
    pub fn spawn<P: Prober>(
        size: usize,
        capacity: usize,
        prober: Arc<P>,
        sink: ResultSink,
        stats: Arc<PipelineStats>,
    ) -> (Self, IntakeSender) {
        let size = size.max(1);
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));

        let handles = (1..=size)
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let prober = Arc::clone(&prober);
                let sink = sink.clone();
                let stats = Arc::clone(&stats);
                tokio::spawn(run_worker(worker_id, rx, prober, sink, stats))
            })
            .collect();

        debug!(workers = size, capacity, "worker pool started");

        (Self { handles }, tx)
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit.
    ///
    /// Workers only exit once the queue is closed, so drop all senders
    /// first. A worker that panicked is logged; the others are unaffected.
    /// Returns how many workers finished cleanly.
    pub async fn join(self) -> usize {
        let results = futures::future::join_all(self.handles).await;

        let mut clean = 0;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(()) => clean += 1,
                Err(e) => error!(worker = index + 1, error = %e, "worker terminated abnormally"),
            }
        }
        clean
    }
}

async fn run_worker<P: Prober>(
    worker_id: usize,
    rx: SharedReceiver,
    prober: Arc<P>,
    sink: ResultSink,
    stats: Arc<PipelineStats>,
) {
    loop {
        let next = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };

        let Some(domain) = next else {
            break;
        };

        process_entry(worker_id, &domain, prober.as_ref(), &sink, &stats).await;
    }

    debug!(worker = worker_id, "intake queue closed, worker exiting");
}

/// Probe one domain and record it in exactly one result list.
async fn process_entry<P: Prober>(
    worker_id: usize,
    domain: &str,
    prober: &P,
    sink: &ResultSink,
    stats: &PipelineStats,
) {
    debug!(worker = worker_id, domain, "connecting");

    let result = prober.probe(domain).await;

    match &result.failure {
        Some(failure) => info!(
            worker = worker_id,
            domain,
            classification = %result.classification,
            elapsed_ms = result.elapsed.as_millis() as u64,
            reason = %failure,
            "probe finished"
        ),
        None => info!(
            worker = worker_id,
            domain,
            classification = %result.classification,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "probe finished"
        ),
    }

    if let Err(e) = sink.record(result.classification, domain).await {
        stats.record_sink_error();
        error!(worker = worker_id, domain, error = %e, "failed to record result");
    }

    stats.record_outcome(result.classification);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, ProbeFailure, ProbeResult};
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Domains starting with "up" are valid; tracks peak concurrency.
    #[derive(Default)]
    struct PrefixProber {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Prober for PrefixProber {
        async fn probe(&self, domain: &str) -> ProbeResult {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if domain.starts_with("up") {
                ProbeResult::valid(domain, Duration::ZERO)
            } else {
                ProbeResult::invalid(domain, Duration::ZERO, ProbeFailure::Refused)
            }
        }
    }

    fn prepared_sink(dir: &TempDir) -> ResultSink {
        let sink = ResultSink::new(dir.path().join("valid.txt"), dir.path().join("invalid.txt"));
        fs::write(sink.path_for(Classification::Valid), "").unwrap();
        fs::write(sink.path_for(Classification::Invalid), "").unwrap();
        sink
    }

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_entry_recorded_exactly_once() {
        let dir = TempDir::new().unwrap();
        let sink = prepared_sink(&dir);
        let stats = Arc::new(PipelineStats::new());
        let prober = Arc::new(PrefixProber::default());

        let (pool, tx) = WorkerPool::spawn(3, 3, prober, sink.clone(), Arc::clone(&stats));
        assert_eq!(pool.size(), 3);

        for i in 0..20 {
            let domain = if i % 2 == 0 {
                format!("up{}.example", i)
            } else {
                format!("down{}.example", i)
            };
            tx.send(domain).await.unwrap();
        }
        drop(tx);

        assert_eq!(pool.join().await, 3);

        let valid = read_lines(sink.path_for(Classification::Valid));
        let invalid = read_lines(sink.path_for(Classification::Invalid));
        assert_eq!(valid.len(), 10);
        assert_eq!(invalid.len(), 10);

        let valid_set: HashSet<_> = valid.iter().collect();
        assert!(invalid.iter().all(|d| !valid_set.contains(d)));
        assert!(valid.iter().all(|d| d.starts_with("up")));

        let snap = stats.snapshot();
        assert_eq!(snap.processed, 20);
        assert_eq!(snap.valid, 10);
        assert_eq!(snap.invalid, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bounded_by_pool_size() {
        let dir = TempDir::new().unwrap();
        let sink = prepared_sink(&dir);
        let prober = Arc::new(PrefixProber::default());

        let (pool, tx) = WorkerPool::spawn(
            2,
            16,
            Arc::clone(&prober),
            sink,
            Arc::new(PipelineStats::new()),
        );
        for i in 0..16 {
            tx.send(format!("up{}.example", i)).await.unwrap();
        }
        drop(tx);
        pool.join().await;

        assert!(prober.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_zero_size_spawns_one_worker() {
        let dir = TempDir::new().unwrap();
        let (pool, tx) = WorkerPool::spawn(
            0,
            0,
            Arc::new(PrefixProber::default()),
            prepared_sink(&dir),
            Arc::new(PipelineStats::new()),
        );
        assert_eq!(pool.size(), 1);
        drop(tx);
        assert_eq!(pool.join().await, 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        // Parent directories do not exist, so every append fails.
        let sink = ResultSink::new(
            dir.path().join("missing").join("valid.txt"),
            dir.path().join("missing").join("invalid.txt"),
        );
        let stats = Arc::new(PipelineStats::new());

        let (pool, tx) = WorkerPool::spawn(
            1,
            1,
            Arc::new(PrefixProber::default()),
            sink,
            Arc::clone(&stats),
        );
        tx.send("up.example".to_string()).await.unwrap();
        tx.send("down.example".to_string()).await.unwrap();
        drop(tx);
        pool.join().await;

        let snap = stats.snapshot();
        assert_eq!(snap.processed, 2);
        assert_eq!(snap.sink_errors, 2);
    }
}
