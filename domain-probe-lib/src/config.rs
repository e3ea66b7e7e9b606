//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and DP_*
//! environment variables, merging them with proper precedence rules, and
//! folding the result into a `ProbeConfig`.

use crate::error::DomainProbeError;
use crate::types::{ProbeConfig, RunMode};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// threads = 32
/// timeout = "3s"
/// mode = "once"
///
/// [paths]
/// input_dir = "lists"
/// valid_file = "out/up.txt"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Input, output and log locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Worker pool size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Dial timeout (as string, e.g., "500ms", "5s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Probed TCP port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// "once" or "watch"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Pause between passes in watch mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescan_interval: Option<String>,

    /// Intake queue capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Result of config discovery: the merged config and the files it came from,
/// lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: FileConfig,
    pub sources: Vec<PathBuf>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    /// Overrides `$HOME` during discovery
    home: Option<PathBuf>,
    /// Overrides the current directory during discovery
    local_dir: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new configuration manager using the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover config files relative to explicit home/local directories.
    pub fn with_dirs<H: Into<PathBuf>, L: Into<PathBuf>>(home: H, local_dir: L) -> Self {
        Self {
            home: Some(home.into()),
            local_dir: Some(local_dir.into()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainProbeError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainProbeError::file_error(
                path,
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainProbeError::file_error(path, format!("Failed to read configuration file: {}", e))
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is the lowest, then the home directory, then the current
    /// directory. A file that fails to parse is an error rather than being
    /// skipped silently.
    pub fn discover_and_load(&self) -> Result<LoadedConfig, DomainProbeError> {
        let mut loaded = LoadedConfig::default();

        let candidates = [
            self.xdg_config_path(),
            self.global_config_path(),
            self.local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            loaded.config = merge_configs(loaded.config, config);
            loaded.sources.push(path);
        }

        Ok(loaded)
    }

    fn local_config_path(&self) -> Option<PathBuf> {
        let base = self
            .local_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        ["domain-probe.toml", ".domain-probe.toml"]
            .iter()
            .map(|name| base.join(name))
            .find(|path| path.exists())
    }

    fn global_config_path(&self) -> Option<PathBuf> {
        let home = self.home_dir()?;

        [".domain-probe.toml", "domain-probe.toml"]
            .iter()
            .map(|name| home.join(name))
            .find(|path| path.exists())
    }

    /// `$XDG_CONFIG_HOME/domain-probe/config.toml`, falling back to `~/.config`.
    fn xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = match (&self.home, env::var_os("XDG_CONFIG_HOME")) {
            (None, Some(xdg)) => PathBuf::from(xdg),
            _ => self.home_dir()?.join(".config"),
        };

        let path = config_dir.join("domain-probe").join("config.toml");
        path.exists().then_some(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home
            .clone()
            .or_else(|| env::var_os("HOME").map(PathBuf::from))
    }
}

/// Merge two configurations, values from `higher` winning field by field.
pub fn merge_configs(lower: FileConfig, higher: FileConfig) -> FileConfig {
    FileConfig {
        defaults: match (lower.defaults, higher.defaults) {
            (Some(low), Some(high)) => Some(DefaultsConfig {
                threads: high.threads.or(low.threads),
                timeout: high.timeout.or(low.timeout),
                port: high.port.or(low.port),
                mode: high.mode.or(low.mode),
                rescan_interval: high.rescan_interval.or(low.rescan_interval),
                queue_capacity: high.queue_capacity.or(low.queue_capacity),
            }),
            (low, high) => high.or(low),
        },
        paths: match (lower.paths, higher.paths) {
            (Some(low), Some(high)) => Some(PathsConfig {
                input_dir: high.input_dir.or(low.input_dir),
                valid_file: high.valid_file.or(low.valid_file),
                invalid_file: high.invalid_file.or(low.invalid_file),
                log_file: high.log_file.or(low.log_file),
            }),
            (low, high) => high.or(low),
        },
    }
}

/// Validate a configuration for common issues.
fn validate_config(config: &FileConfig) -> Result<(), DomainProbeError> {
    let Some(defaults) = &config.defaults else {
        return Ok(());
    };

    if defaults.threads == Some(0) {
        return Err(DomainProbeError::config("threads must be at least 1"));
    }

    if defaults.queue_capacity == Some(0) {
        return Err(DomainProbeError::config("queue_capacity must be at least 1"));
    }

    for (name, value) in [
        ("timeout", &defaults.timeout),
        ("rescan_interval", &defaults.rescan_interval),
    ] {
        if let Some(value) = value {
            if parse_duration_string(value).is_none() {
                return Err(DomainProbeError::config(format!(
                    "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                    name, value
                )));
            }
        }
    }

    if let Some(mode) = &defaults.mode {
        mode.parse::<RunMode>().map_err(DomainProbeError::config)?;
    }

    Ok(())
}

impl FileConfig {
    /// Overlay the values of this file onto `config`.
    ///
    /// The file has been validated on load, so malformed durations cannot
    /// reach this point.
    pub fn apply_to(&self, mut config: ProbeConfig) -> ProbeConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(threads) = defaults.threads {
                config = config.with_threads(threads);
            }
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
                config.timeout = timeout;
            }
            if let Some(port) = defaults.port {
                config.port = port;
            }
            if let Some(mode) = defaults.mode.as_deref().and_then(|m| m.parse().ok()) {
                config.mode = mode;
            }
            if let Some(interval) = defaults
                .rescan_interval
                .as_deref()
                .and_then(parse_duration_string)
            {
                config.rescan_interval = interval;
            }
            if let Some(capacity) = defaults.queue_capacity {
                config.queue_capacity = Some(capacity);
            }
        }

        if let Some(paths) = &self.paths {
            if let Some(dir) = &paths.input_dir {
                config.input_dir = dir.clone();
            }
            if let Some(file) = &paths.valid_file {
                config.valid_path = file.clone();
            }
            if let Some(file) = &paths.invalid_file {
                config.invalid_path = file.clone();
            }
            if let Some(file) = &paths.log_file {
                config.log_path = file.clone();
            }
        }

        config
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Invalid values are not applied; they are collected in `warnings` so the
/// caller can log them once logging is up.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub threads: Option<usize>,
    pub timeout: Option<Duration>,
    pub port: Option<u16>,
    pub mode: Option<RunMode>,
    pub rescan_interval: Option<Duration>,
    pub input_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Load configuration from the process environment (DP_* variables).
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load DP_* configuration through an arbitrary lookup function.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // DP_THREADS - worker pool size
    if let Some(val) = lookup("DP_THREADS") {
        match val.trim().parse::<usize>() {
            Ok(threads) if threads > 0 => env_config.threads = Some(threads),
            _ => env_config
                .warnings
                .push(format!("Invalid DP_THREADS='{}', must be a positive integer", val)),
        }
    }

    // DP_TIMEOUT - dial timeout
    if let Some(val) = lookup("DP_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => env_config.warnings.push(format!(
                "Invalid DP_TIMEOUT='{}', use format like '500ms', '5s', '2m'",
                val
            )),
        }
    }

    // DP_PORT - probed port
    if let Some(val) = lookup("DP_PORT") {
        match val.trim().parse::<u16>() {
            Ok(port) => env_config.port = Some(port),
            Err(_) => env_config
                .warnings
                .push(format!("Invalid DP_PORT='{}', must be 0-65535", val)),
        }
    }

    // DP_MODE - once / watch
    if let Some(val) = lookup("DP_MODE") {
        match val.parse::<RunMode>() {
            Ok(mode) => env_config.mode = Some(mode),
            Err(e) => env_config.warnings.push(format!("Invalid DP_MODE: {}", e)),
        }
    }

    // DP_RESCAN_INTERVAL - pause between watch passes
    if let Some(val) = lookup("DP_RESCAN_INTERVAL") {
        match parse_duration_string(&val) {
            Some(interval) => env_config.rescan_interval = Some(interval),
            None => env_config.warnings.push(format!(
                "Invalid DP_RESCAN_INTERVAL='{}', use format like '500ms', '1s'",
                val
            )),
        }
    }

    // DP_INPUT_DIR - directory of line stores
    if let Some(dir) = lookup("DP_INPUT_DIR").filter(|d| !d.trim().is_empty()) {
        env_config.input_dir = Some(PathBuf::from(dir));
    }

    // DP_CONFIG - explicit config file
    if let Some(path) = lookup("DP_CONFIG").filter(|p| !p.trim().is_empty()) {
        env_config.config = Some(PathBuf::from(path));
    }

    env_config
}

impl EnvConfig {
    /// Overlay the valid environment values onto `config`.
    pub fn apply_to(&self, mut config: ProbeConfig) -> ProbeConfig {
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(interval) = self.rescan_interval {
            config.rescan_interval = interval;
        }
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        config
    }
}

/// Parse a duration string like "500ms", "5s", "2m" or a bare number of
/// seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}
