//! Result lists for classified domains.
//!
//! Each record is one `domain\n` line appended to the valid or invalid
//! file. The file is opened in append mode for every record and the line is
//! written with a single `write_all`, so concurrent workers never interleave
//! partial lines. No lock is held across workers.

use crate::error::DomainProbeError;
use crate::types::Classification;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only sink for the valid and invalid lists.
#[derive(Debug, Clone)]
pub struct ResultSink {
    valid_path: PathBuf,
    invalid_path: PathBuf,
}

impl ResultSink {
    pub fn new<V: Into<PathBuf>, I: Into<PathBuf>>(valid_path: V, invalid_path: I) -> Self {
        Self {
            valid_path: valid_path.into(),
            invalid_path: invalid_path.into(),
        }
    }

    /// File that receives domains of the given classification.
    pub fn path_for(&self, classification: Classification) -> &Path {
        match classification {
            Classification::Valid => &self.valid_path,
            Classification::Invalid => &self.invalid_path,
        }
    }

    /// Create the parent directories of both result lists.
    pub async fn prepare(&self) -> Result<(), DomainProbeError> {
        for path in [&self.valid_path, &self.invalid_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DomainProbeError::io(parent, e))?;
            }
        }
        Ok(())
    }

    /// Append `domain` to the list matching `classification`.
    ///
    /// # Errors
    ///
    /// Returns `DomainProbeError::FileError` if the list cannot be opened or
    /// written. The caller decides whether that is fatal.
    pub async fn record(
        &self,
        classification: Classification,
        domain: &str,
    ) -> Result<(), DomainProbeError> {
        let path = self.path_for(classification).to_path_buf();
        let line = format!("{}\n", domain);

        tokio::task::spawn_blocking(move || append_line(&path, &line)).await?
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), DomainProbeError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DomainProbeError::io(path, e))?;

    file.write_all(line.as_bytes())
        .map_err(|e| DomainProbeError::io(path, e))
}
