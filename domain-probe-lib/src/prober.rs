//! TCP liveness probing.
//!
//! A probe is a single connect attempt to `domain:port`. Reaching the
//! handshake makes the domain `Valid`; anything else (timeout, refusal,
//! resolution failure, unreachable network) makes it `Invalid`. The stream
//! is dropped straight away and no bytes are exchanged.

use crate::types::{ProbeFailure, ProbeResult, DEFAULT_PORT};
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::error::Elapsed;

/// Anything that can classify a domain.
///
/// The worker pool is generic over this so runs can be driven without
/// touching the network.
pub trait Prober: Send + Sync + 'static {
    /// Probe one domain. Never fails: failures are `Invalid` results.
    fn probe(&self, domain: &str) -> impl Future<Output = ProbeResult> + Send;
}

/// Production prober: plain TCP connect with a dial timeout.
#[derive(Debug, Clone)]
pub struct TcpProber {
    /// Covers name resolution and the handshake together
    timeout: Duration,
    port: u16,
}

impl TcpProber {
    /// Prober for port 80 with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_port(timeout, DEFAULT_PORT)
    }

    /// Prober for an arbitrary port.
    pub fn with_port(timeout: Duration, port: u16) -> Self {
        Self { timeout, port }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Prober for TcpProber {
    async fn probe(&self, domain: &str) -> ProbeResult {
        let start_time = Instant::now();

        let attempt =
            tokio::time::timeout(self.timeout, TcpStream::connect((domain, self.port))).await;

        connect_outcome(domain, start_time.elapsed(), attempt)
    }
}

/// Map a timed connect attempt to a result. The stream, if any, is dropped.
fn connect_outcome<S>(
    domain: &str,
    elapsed: Duration,
    attempt: Result<io::Result<S>, Elapsed>,
) -> ProbeResult {
    match attempt {
        Ok(Ok(stream)) => {
            drop(stream);
            ProbeResult::valid(domain, elapsed)
        }
        Ok(Err(e)) => ProbeResult::invalid(domain, elapsed, classify_connect_error(&e)),
        Err(_) => ProbeResult::invalid(domain, elapsed, ProbeFailure::Timeout),
    }
}

fn classify_connect_error(err: &io::Error) -> ProbeFailure {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ProbeFailure::Refused,
        io::ErrorKind::TimedOut => ProbeFailure::Timeout,
        _ => ProbeFailure::Connect(err.to_string()),
    }
}
