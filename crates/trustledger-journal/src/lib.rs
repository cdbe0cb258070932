//! trustledger-journal: Tamper-evident journal of ledger change notifications.
//!
//! The journal is an `EventSink`. Every emitted event is appended as an entry
//! whose BLAKE3 hash chains to the previous entry, giving external indexers a
//! verifiable, append-only record of every state transition.

pub mod hash;
pub mod store;

use serde::{Deserialize, Serialize};
use trustledger_core::{EventSink, LedgerEvent};

pub use hash::GENESIS_HASH;
pub use store::{FileJournalStore, JournalStore};

/// Errors raised while verifying or persisting a journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Journal chain broken at sequence {sequence}: prev_hash does not match previous entry")]
    ChainBroken { sequence: u64 },

    #[error("Hash mismatch at sequence {sequence}: stored hash does not match content")]
    HashMismatch { sequence: u64 },

    #[error("Sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One hash-chained journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    /// Zero-based position in the journal.
    pub sequence: u64,
    /// `entry_hash` of the previous entry, or `GENESIS_HASH`.
    pub prev_hash: String,
    pub event: LedgerEvent,
    /// BLAKE3 hash (hex) over sequence, prev_hash and event.
    pub entry_hash: String,
}

impl JournalEntry {
    pub fn compute_hash(&self) -> String {
        hash::compute_entry_hash(self.sequence, &self.prev_hash, &self.event)
    }
}

/// In-memory append-only event journal.
#[derive(Debug, Default, Clone)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a journal from persisted entries, verifying the chain.
    pub fn from_entries(entries: Vec<JournalEntry>) -> Result<Self, JournalError> {
        verify_chain(&entries)?;
        Ok(Self { entries })
    }

    /// Hash of the most recent entry, or `GENESIS_HASH` if empty.
    pub fn head(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.entry_hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an event and return the new entry.
    pub fn append(&mut self, event: LedgerEvent) -> &JournalEntry {
        let sequence = self.entries.len() as u64;
        let prev_hash = self.head().to_string();
        let entry_hash = hash::compute_entry_hash(sequence, &prev_hash, &event);

        self.entries.push(JournalEntry {
            sequence,
            prev_hash,
            event,
            entry_hash,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Verify every entry's hash and link.
    pub fn verify(&self) -> Result<(), JournalError> {
        verify_chain(&self.entries)
    }
}

impl EventSink for Journal {
    fn emit(&mut self, event: LedgerEvent) {
        let entry = self.append(event);
        tracing::debug!(
            sequence = entry.sequence,
            event_type = entry.event.payload.kind(),
            entry_hash = %entry.entry_hash,
            "Journal entry appended"
        );
    }
}

/// Walk a slice of entries from genesis, checking sequence, link, and hash.
pub fn verify_chain(entries: &[JournalEntry]) -> Result<(), JournalError> {
    let mut prev = GENESIS_HASH;
    for (expected, entry) in entries.iter().enumerate() {
        let expected = expected as u64;
        if entry.sequence != expected {
            return Err(JournalError::SequenceGap {
                expected,
                found: entry.sequence,
            });
        }
        if entry.prev_hash != prev {
            return Err(JournalError::ChainBroken {
                sequence: entry.sequence,
            });
        }
        if entry.compute_hash() != entry.entry_hash {
            return Err(JournalError::HashMismatch {
                sequence: entry.sequence,
            });
        }
        prev = entry.entry_hash.as_str();
    }
    Ok(())
}
