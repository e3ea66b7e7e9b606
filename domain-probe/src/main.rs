//! Domain Probe CLI Application
//!
//! Sorts domain lists into reachable and unreachable by attempting a TCP
//! connection to port 80 on each entry. Input lists in `domains/` are
//! consumed as they are probed; results are appended to
//! `valid/valid.txt` and `invalid/invalid.txt`.

mod logging;
mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_probe_lib::{
    load_env_config, parse_duration_string, ConfigManager, EnvConfig, ProbeConfig, ProbeRunner,
    RunMode,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{info, warn};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-probe
#[derive(Parser, Debug)]
#[command(name = "domain-probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Sort domain lists into reachable and unreachable by probing TCP port 80")]
#[command(
    long_about = "Drain domain lists from an input directory, attempt a TCP connection to each \
                  domain and append it to the valid or invalid list.\n\nEntries are removed from \
                  the input files as they are taken, so an interrupted run resumes where it left off."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Number of concurrent workers (values below 1 are clamped to 1) [default: 1]
    #[arg(
        long = "threads",
        value_name = "N",
        allow_negative_numbers = true,
        help_heading = "Performance"
    )]
    pub threads: Option<i64>,

    /// Dial timeout per domain, e.g. 5s, 500ms [default: 5s]
    #[arg(long = "timeout", value_name = "DURATION", value_parser = parse_duration_arg, help_heading = "Probing")]
    pub timeout: Option<Duration>,

    /// TCP port to probe [default: 80]
    #[arg(long = "port", value_name = "PORT", help_heading = "Probing")]
    pub port: Option<u16>,

    /// Drain the input once and exit
    #[arg(long = "once", conflicts_with = "watch", help_heading = "Run Mode")]
    pub once: bool,

    /// Keep rescanning the input directory for new entries (default)
    #[arg(long = "watch", help_heading = "Run Mode")]
    pub watch: bool,

    /// Pause between passes in watch mode [default: 1s]
    #[arg(long = "rescan-interval", value_name = "DURATION", value_parser = parse_duration_arg, help_heading = "Run Mode")]
    pub rescan_interval: Option<Duration>,

    /// Directory holding the domain lists [default: domains]
    #[arg(long = "input-dir", value_name = "DIR", help_heading = "Files")]
    pub input_dir: Option<PathBuf>,

    /// Result list for reachable domains [default: valid/valid.txt]
    #[arg(long = "valid-file", value_name = "FILE", help_heading = "Files")]
    pub valid_file: Option<PathBuf>,

    /// Result list for unreachable domains [default: invalid/invalid.txt]
    #[arg(long = "invalid-file", value_name = "FILE", help_heading = "Files")]
    pub invalid_file: Option<PathBuf>,

    /// Log file [default: logs/logs.txt]
    #[arg(long = "log-file", value_name = "FILE", help_heading = "Files")]
    pub log_file: Option<PathBuf>,

    /// Print the final summary as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Disable the live status line
    #[arg(long = "no-status", help_heading = "Output")]
    pub no_status: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Mirror info-level logs to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,

    /// Mirror debug-level logs to stderr and the log file
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

/// Configuration after applying every source, plus what to report about it
/// once logging is up.
struct ResolvedConfig {
    config: ProbeConfig,
    sources: Vec<PathBuf>,
    warnings: Vec<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let resolved = build_config(&args, load_env_config())?;
    let config = resolved.config;

    let _log_guard = logging::init(&config.log_path, args.verbose, args.debug)?;

    info!(version = env!("CARGO_PKG_VERSION"), "domain-probe starting");
    for source in &resolved.sources {
        info!(path = %source.display(), "loaded config file");
    }
    for warning in &resolved.warnings {
        warn!("{}", warning);
    }

    let threads = config.threads;
    let json = args.json;
    let runner = ProbeRunner::new(config);

    let status = if status_line_enabled(&args) {
        ui::StatusLine::start(threads, runner.stats())
    } else {
        None
    };

    let result = runner.run().await;

    if let Some(status) = status {
        status.stop().await;
    }

    let summary = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        ui::print_summary(&summary, runner.config());
    }

    Ok(())
}

/// Build ProbeConfig from every source.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (DP_*)
/// 3. Config file (--config / DP_CONFIG, or discovered local > home > XDG)
/// 4. Built-in defaults
fn build_config(
    args: &Args,
    env_config: EnvConfig,
) -> Result<ResolvedConfig, Box<dyn std::error::Error>> {
    let mut config = ProbeConfig::default();
    let mut warnings = env_config.warnings.clone();
    let manager = ConfigManager::new();

    let sources = match args.config.clone().or_else(|| env_config.config.clone()) {
        Some(path) => {
            let file_config = manager.load_file(&path).map_err(|e| {
                format!("Failed to load config file '{}': {}", path.display(), e)
            })?;
            config = file_config.apply_to(config);
            vec![path]
        }
        None => {
            let loaded = manager.discover_and_load()?;
            config = loaded.config.apply_to(config);
            loaded.sources
        }
    };

    config = env_config.apply_to(config);
    config = apply_cli_args_to_config(config, args, &mut warnings);

    Ok(ResolvedConfig {
        config,
        sources,
        warnings,
    })
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(
    mut config: ProbeConfig,
    args: &Args,
    warnings: &mut Vec<String>,
) -> ProbeConfig {
    if let Some(requested) = args.threads {
        let threads = clamp_threads(requested);
        if threads as i64 != requested {
            warnings.push(format!(
                "--threads {} is out of range, using {} worker{}",
                requested,
                threads,
                if threads == 1 { "" } else { "s" }
            ));
        }
        config = config.with_threads(threads);
    }

    if args.once {
        config.mode = RunMode::Once;
    } else if args.watch {
        config.mode = RunMode::Watch;
    }

    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(interval) = args.rescan_interval {
        config.rescan_interval = interval;
    }
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(file) = &args.valid_file {
        config.valid_path = file.clone();
    }
    if let Some(file) = &args.invalid_file {
        config.invalid_path = file.clone();
    }
    if let Some(file) = &args.log_file {
        config.log_path = file.clone();
    }

    config
}

/// The status line redraws stderr in place, so it stays off whenever
/// something else writes there or stdout carries JSON.
fn status_line_enabled(args: &Args) -> bool {
    !(args.no_status || args.json || args.verbose || args.debug)
}

/// Worker count for a raw `--threads` value. Zero and negatives become 1.
fn clamp_threads(requested: i64) -> usize {
    if requested < 1 {
        1
    } else {
        usize::try_from(requested).unwrap_or(usize::MAX)
    }
}

fn parse_duration_arg(value: &str) -> Result<Duration, String> {
    parse_duration_string(value)
        .ok_or_else(|| format!("invalid duration '{}', use e.g. 500ms, 5s, 2m", value))
}
