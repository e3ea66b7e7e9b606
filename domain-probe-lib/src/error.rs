//! Error handling for the probing pipeline.
//!
//! Network failures are deliberately absent from this module: a failed
//! connect is a probe outcome (`Invalid`), not an error. What remains is
//! store exhaustion, filesystem failures and configuration problems.

use std::fmt;
use std::path::Path;

/// Main error type for pipeline operations.
#[derive(Debug, Clone)]
pub enum DomainProbeError {
    /// A line store has no entries left.
    ///
    /// This is an expected condition: the feeder moves on to the next file.
    Exhausted { path: String },

    /// File or directory I/O failed (open, read, rewrite, append, list)
    FileError { path: String, message: String },

    /// Configuration errors (invalid settings, malformed TOML, bad env values)
    ConfigError { message: String },

    /// The intake queue closed while the feeder still had entries to hand out
    QueueClosed,

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DomainProbeError {
    /// Create a new exhaustion error for the store at `path`.
    pub fn exhausted<P: AsRef<Path>>(path: P) -> Self {
        Self::Exhausted {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: AsRef<Path>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Wrap an `std::io::Error` with the path it happened on.
    pub fn io<P: AsRef<Path>>(path: P, err: std::io::Error) -> Self {
        Self::file_error(path, err.to_string())
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Whether this error only signals that a store ran dry.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

impl fmt::Display for DomainProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { path } => write!(f, "File '{}' is empty", path),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::QueueClosed => write!(f, "Intake queue closed: no workers left to probe"),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for DomainProbeError {}

impl From<toml::de::Error> for DomainProbeError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for DomainProbeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal {
            message: format!("Task failed: {}", err),
        }
    }
}
