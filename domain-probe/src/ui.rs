//! Terminal display logic for the domain-probe CLI.
//!
//! The live status line (workers, process memory, counters) goes to stderr
//! so stdout stays clean for the summary or `--json` output.

use console::{style, Term};
use domain_probe_lib::{PipelineStats, ProbeConfig, RunSummary, StatsSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const STATUS_INTERVAL: Duration = Duration::from_secs(1);

// ── Status line ──────────────────────────────────────────────────────────────

/// A once-per-second status line redrawn in place on stderr.
pub struct StatusLine {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl StatusLine {
    /// Start the status line. Returns None when stderr is not a terminal.
    pub fn start(workers: usize, stats: Arc<PipelineStats>) -> Option<Self> {
        let term = Term::stderr();
        if !term.is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let mut memory = ProcessMemory::new();
            while running_clone.load(Ordering::Relaxed) {
                let line = format_status(workers, memory.sample(), &stats.snapshot());
                let _ = term.clear_line();
                let _ = term.write_str(&line);
                tokio::time::sleep(STATUS_INTERVAL).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the status line and clear it.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

/// Resident memory of this process.
struct ProcessMemory {
    system: System,
    pid: Option<Pid>,
}

impl ProcessMemory {
    fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    fn sample(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.system.process(pid).map(|process| process.memory())
    }
}

/// Render one status line.
pub fn format_status(workers: usize, memory: Option<u64>, snapshot: &StatsSnapshot) -> String {
    let memory = memory
        .map(format_bytes)
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "{} {}  {}  {} {}  {} {}  {} {}  {} {}",
        style("workers").dim(),
        style(workers).bold(),
        style(format!("mem {}", memory)).dim(),
        style("probed").dim(),
        snapshot.processed,
        style("valid").dim(),
        style(snapshot.valid).green(),
        style("invalid").dim(),
        style(snapshot.invalid).red(),
        style("in flight").dim(),
        snapshot.in_flight(),
    )
}

/// Human-readable byte count, binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(summary: &RunSummary, config: &ProbeConfig) {
    println!(
        "{} {}",
        style("domain-probe").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
    );
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}",
        style(summary.processed).bold(),
        if summary.processed == 1 { "" } else { "s" },
        summary.elapsed_secs,
        style("|").dim(),
        style(format!("{} valid", summary.valid)).green(),
        style("|").dim(),
        style(format!("{} invalid", summary.invalid)).red(),
    );

    if summary.sink_errors > 0 {
        println!(
            "  {}",
            style(format!(
                "{} result{} could not be written, see {}",
                summary.sink_errors,
                if summary.sink_errors == 1 { "" } else { "s" },
                config.log_path.display()
            ))
            .yellow()
        );
    }

    println!(
        "  {}",
        style(format!(
            "valid: {}  invalid: {}",
            config.valid_path.display(),
            config.invalid_path.display()
        ))
        .dim()
    );
}
