//! Tracing setup: a plain-text log file, optionally mirrored to stderr.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live until
/// the process is done logging. `RUST_LOG` overrides the file filter.
pub fn init(
    log_path: &Path,
    verbose: bool,
    debug: bool,
) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_path
        .file_name()
        .ok_or_else(|| format!("Log path '{}' has no file name", log_path.display()))?;

    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create log directory '{}': {}", dir.display(), e))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if debug { "debug" } else { "info" };
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(file_filter);

    let stderr_layer = (verbose || debug).then(|| {
        let level = if debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(level)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}
