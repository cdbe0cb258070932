//! Core identity types shared across the ledger.
//!
//! Records never embed one another. They refer to each other through
//! `ObjectId`s and to principals through `Address`es only.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical clock value supplied by the execution substrate.
pub type Epoch = u64;

// ── Address ───────────────────────────────────────────────────────

/// Opaque identity of a principal (wallet, reviewer, staker).
///
/// The ledger only ever compares addresses for equality; it never parses
/// or verifies them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

// ── ObjectId ──────────────────────────────────────────────────────

/// Unique identifier for any top-level ledger record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of top-level record the ledger stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Identity,
    Registration,
    Reputation,
    Validation,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::Registration => "registration",
            Self::Reputation => "reputation",
            Self::Validation => "validation",
        };
        f.write_str(name)
    }
}
