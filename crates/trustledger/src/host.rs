//! File-backed deployments: the event journal plus a state snapshot.
//!
//! The snapshot lives next to the journal (`<journal>.state.json`) and records
//! the journal head it was taken at. Opening refuses a snapshot whose head does
//! not match the journal, so the two files cannot silently drift apart.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trustledger_journal::{FileJournalStore, Journal, JournalError, JournalStore};

use crate::ledger::{Ledger, LedgerState};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State snapshot missing for a journal with {entries} entries")]
    MissingSnapshot { entries: usize },

    #[error("State snapshot taken at {snapshot} but journal head is {journal}")]
    SnapshotMismatch { snapshot: String, journal: String },
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    journal_head: &'a str,
    state: &'a LedgerState,
}

#[derive(Deserialize)]
struct Snapshot {
    journal_head: String,
    state: LedgerState,
}

/// A ledger whose events and state persist across runs.
pub struct LedgerFiles {
    journal: FileJournalStore,
    snapshot: PathBuf,
}

impl LedgerFiles {
    pub fn new(journal_path: impl Into<PathBuf>) -> Self {
        let journal = FileJournalStore::new(journal_path);
        let mut name = journal
            .path()
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".state.json");
        let snapshot = journal.path().with_file_name(name);
        Self { journal, snapshot }
    }

    pub fn journal_path(&self) -> &Path {
        self.journal.path()
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot
    }

    /// Load the journal and the state it describes. A fresh deployment has
    /// neither file.
    pub fn open(&self) -> Result<Ledger<Journal>, HostError> {
        let journal = self.journal.load()?;
        let state = match fs::read_to_string(&self.snapshot) {
            Ok(raw) => {
                let snapshot: Snapshot = serde_json::from_str(&raw)?;
                if snapshot.journal_head != journal.head() {
                    return Err(HostError::SnapshotMismatch {
                        snapshot: snapshot.journal_head,
                        journal: journal.head().to_string(),
                    });
                }
                snapshot.state
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !journal.is_empty() {
                    return Err(HostError::MissingSnapshot {
                        entries: journal.len(),
                    });
                }
                LedgerState::default()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            journal = %self.journal.path().display(),
            entries = journal.len(),
            "Ledger opened"
        );
        Ok(Ledger::restore(state, journal))
    }

    /// Append entries past `persisted` to the journal, then replace the
    /// snapshot.
    pub fn save(&self, ledger: Ledger<Journal>, persisted: usize) -> Result<(), HostError> {
        let (state, journal) = ledger.into_parts();
        let fresh = journal.entries().get(persisted..).unwrap_or_default();
        self.journal.append(fresh)?;

        if let Some(parent) = self.snapshot.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let snapshot = SnapshotRef {
            journal_head: journal.head(),
            state: &state,
        };
        let staging = self.snapshot.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(&snapshot)?)?;
        fs::rename(&staging, &self.snapshot)?;

        tracing::debug!(
            snapshot = %self.snapshot.display(),
            appended = fresh.len(),
            head = %journal.head(),
            "Ledger saved"
        );
        Ok(())
    }
}
