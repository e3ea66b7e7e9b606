//! File-backed line stores.
//!
//! A line store is a plain text file holding one domain per line. Entries
//! are consumed by picking one at random and rewriting the file without it,
//! so a store shrinks monotonically until it is exhausted. The file itself
//! is never deleted; if something appends to it later it becomes live again.
//!
//! The read-modify-write cycle is not atomic with respect to other
//! processes. A single feeder owns every store it drains.

use crate::error::DomainProbeError;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Handle to one line store on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStore {
    path: PathBuf,
}

impl LineStore {
    /// Create a handle for the file at `path`. Nothing is read yet.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take one entry uniformly at random and durably remove it.
    ///
    /// # Errors
    ///
    /// - `DomainProbeError::Exhausted` if the file holds no entries. The file
    ///   is left untouched in that case.
    /// - `DomainProbeError::FileError` if the file cannot be read or
    ///   rewritten (including when it does not exist).
    pub async fn take_random(&self) -> Result<String, DomainProbeError> {
        let mut entries = self.read_entries().await?;

        if entries.is_empty() {
            return Err(DomainProbeError::exhausted(&self.path));
        }

        // ThreadRng is not Send; keep it out of any await.
        let index = rand::rng().random_range(0..entries.len());
        let selected = entries.remove(index);

        self.write_entries(&entries).await?;

        Ok(selected)
    }

    /// Number of entries currently in the store.
    pub async fn len(&self) -> Result<usize, DomainProbeError> {
        Ok(self.read_entries().await?.len())
    }

    async fn read_entries(&self) -> Result<Vec<String>, DomainProbeError> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|e| DomainProbeError::io(&self.path, e))?;

        // Invalid UTF-8 must not block the rest of the file; such lines are
        // taken like any other and end up Invalid.
        Ok(parse_entries(&String::from_utf8_lossy(&content)))
    }

    async fn write_entries(&self, entries: &[String]) -> Result<(), DomainProbeError> {
        let mut content = String::with_capacity(entries.iter().map(|e| e.len() + 1).sum());
        for entry in entries {
            content.push_str(entry);
            content.push('\n');
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| DomainProbeError::io(&self.path, e))
    }
}

/// Split file content into domain entries.
///
/// Handles both `\n` and `\r\n` terminators and drops whitespace-only lines.
pub fn parse_entries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// List the line stores in `dir`, sorted by file name.
///
/// Only regular files count; subdirectories are skipped.
///
/// # Errors
///
/// Returns `DomainProbeError::FileError` if the directory cannot be listed.
pub async fn list_stores<P: AsRef<Path>>(dir: P) -> Result<Vec<LineStore>, DomainProbeError> {
    let dir = dir.as_ref();
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DomainProbeError::io(dir, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| DomainProbeError::io(dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| DomainProbeError::io(entry.path(), e))?;
        if file_type.is_file() {
            paths.push(entry.path());
        }
    }

    paths.sort();
    Ok(paths.into_iter().map(LineStore::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(dir: &TempDir, name: &str, content: &str) -> LineStore {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        LineStore::new(path)
    }

    #[test]
    fn test_parse_entries() {
        assert_eq!(
            parse_entries("a.com\r\n\n  b.com  \n\t\nc.com"),
            vec!["a.com", "b.com", "c.com"]
        );
        assert!(parse_entries("").is_empty());
        assert!(parse_entries("\n \n").is_empty());
    }

    #[tokio::test]
    async fn test_take_random_removes_exactly_one() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "list.txt", "a.com\nb.com\nc.com\n");

        let taken = store.take_random().await.unwrap();
        assert!(["a.com", "b.com", "c.com"].contains(&taken.as_str()));
        assert_eq!(store.len().await.unwrap(), 2);

        let remaining = parse_entries(&fs::read_to_string(store.path()).unwrap());
        assert!(!remaining.contains(&taken));
    }

    #[tokio::test]
    async fn test_store_exhausts_after_initial_count() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "list.txt", "a.com\nb.com\nc.com\nd.com\n");

        let mut seen = HashSet::new();
        for _ in 0..4 {
            seen.insert(store.take_random().await.unwrap());
        }
        assert_eq!(seen.len(), 4);

        let err = store.take_random().await.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "");
    }

    #[tokio::test]
    async fn test_duplicates_are_separate_entries() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "dups.txt", "same.com\nsame.com\n");

        assert_eq!(store.take_random().await.unwrap(), "same.com");
        assert_eq!(store.take_random().await.unwrap(), "same.com");
        assert!(store.take_random().await.unwrap_err().is_exhausted());
    }

    #[test]
    fn test_empty_file_is_exhausted_not_io_error() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "empty.txt", "");
        let blank = store_with(&dir, "blank.txt", "\n\n   \n");

        let err = tokio_test::block_on(store.take_random()).unwrap_err();
        assert!(err.is_exhausted());

        let err = tokio_test::block_on(blank.take_random()).unwrap_err();
        assert!(err.is_exhausted());
        // Exhaustion never rewrites the file
        assert_eq!(fs::read_to_string(blank.path()).unwrap(), "\n\n   \n");
    }

    #[tokio::test]
    async fn test_every_entry_can_be_picked_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.txt");
        let store = LineStore::new(&path);

        let mut first_picks = HashSet::new();
        for _ in 0..200 {
            fs::write(&path, "a.com\nb.com\nc.com\n").unwrap();
            first_picks.insert(store.take_random().await.unwrap());
        }

        let expected: HashSet<String> = ["a.com", "b.com", "c.com"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(first_picks, expected);
    }

    #[tokio::test]
    async fn test_non_utf8_line_does_not_block_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.txt");
        fs::write(&path, b"good.com\nbad\xff.com\nalso-good.com\n").unwrap();
        let store = LineStore::new(&path);

        let mut taken = Vec::new();
        for _ in 0..3 {
            taken.push(store.take_random().await.unwrap());
        }
        taken.sort();

        assert_eq!(taken, vec!["also-good.com", "bad\u{FFFD}.com", "good.com"]);
        assert!(store.take_random().await.unwrap_err().is_exhausted());
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let dir = TempDir::new().unwrap();
        let store = LineStore::new(dir.path().join("missing.txt"));

        let err = store.take_random().await.unwrap_err();
        assert!(matches!(err, DomainProbeError::FileError { .. }));
    }

    #[tokio::test]
    async fn test_store_revives_after_external_append() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "list.txt", "a.com\n");

        store.take_random().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);

        fs::write(store.path(), "late.com\n").unwrap();
        assert_eq!(store.take_random().await.unwrap(), "late.com");
    }

    #[tokio::test]
    async fn test_list_stores_sorted_files_only() {
        let dir = TempDir::new().unwrap();
        store_with(&dir, "b.txt", "b.com\n");
        store_with(&dir, "a.txt", "a.com\n");
        fs::create_dir(dir.path().join("nested")).unwrap();

        let stores = list_stores(dir.path()).await.unwrap();
        let names: Vec<_> = stores
            .iter()
            .map(|s| s.path().file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_list_stores_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = list_stores(dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, DomainProbeError::FileError { .. }));
    }
}
