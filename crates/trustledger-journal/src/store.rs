//! Journal storage: trait plus JSON-lines file implementation.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::{Journal, JournalEntry, JournalError};

/// Trait for journal persistence backends.
pub trait JournalStore {
    /// Append entries to the end of the stored journal.
    fn append(&self, entries: &[JournalEntry]) -> Result<(), JournalError>;

    /// Load the full journal, verifying the chain.
    fn load(&self) -> Result<Journal, JournalError>;
}

/// File-system backed journal store: one JSON entry per line.
pub struct FileJournalStore {
    path: PathBuf,
}

impl FileJournalStore {
    /// Create a store writing to `path`. Parent directories are created on
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl JournalStore for FileJournalStore {
    fn append(&self, entries: &[JournalEntry]) -> Result<(), JournalError> {
        if entries.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writeln!(file, "{line}")?;
        }
        file.flush()?;

        tracing::debug!(
            path = %self.path.display(),
            appended = entries.len(),
            "Journal entries persisted"
        );
        Ok(())
    }

    fn load(&self) -> Result<Journal, JournalError> {
        if !self.path.exists() {
            return Ok(Journal::new());
        }

        let file = fs::File::open(&self.path)?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str::<JournalEntry>(&line)?);
        }

        Journal::from_entries(entries)
    }
}
