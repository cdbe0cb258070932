//! Batch execution with call-local handles.
//!
//! Record ids are random, so a caller cannot know them before the record
//! exists. A call may carry `"bind": "<name>"`; when it creates a record,
//! later calls in the same batch may pass `"$<name>"` in any record-id field.

use std::collections::HashMap;

use serde_json::Value;
use trustledger_core::{EventSink, LedgerError, ObjectId};

use crate::ledger::Ledger;
use crate::ops::{Call, Outcome};

/// Call fields that hold record ids.
const REFERENCE_FIELDS: &[&str] = &[
    "identity",
    "identity_ref",
    "registration",
    "registration_ref",
    "reputation",
    "validation",
];

/// Why a call in a batch produced no outcome.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid call: {0}")]
    InvalidCall(#[from] serde_json::Error),

    #[error("Unknown handle: ${0}")]
    UnknownHandle(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Handles bound so far in one batch.
#[derive(Debug, Default)]
pub struct Batch {
    handles: HashMap<String, ObjectId>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, name: &str) -> Option<ObjectId> {
        self.handles.get(name).copied()
    }

    /// Substitute bound handles into a raw call and parse it.
    pub fn resolve(&self, mut raw: Value) -> Result<Call, BatchError> {
        if let Value::Object(fields) = &mut raw {
            for key in REFERENCE_FIELDS {
                if let Some(Value::String(reference)) = fields.get_mut(*key) {
                    if let Some(name) = reference.strip_prefix('$') {
                        let id = self
                            .handle(name)
                            .ok_or_else(|| BatchError::UnknownHandle(name.to_string()))?;
                        *reference = id.to_string();
                    }
                }
            }
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// Resolve and apply one call, binding its handle on success.
    pub fn apply<S: EventSink>(
        &mut self,
        ledger: &mut Ledger<S>,
        raw: Value,
    ) -> Result<Outcome, BatchError> {
        let call = self.resolve(raw)?;
        let outcome = ledger.apply(&call.ctx, call.op)?;
        if let Some(name) = call.bind {
            match &outcome {
                Outcome::Created(id) => {
                    tracing::debug!(handle = %name, id = %id, "Handle bound");
                    self.handles.insert(name, *id);
                }
                _ => tracing::warn!(handle = %name, "Call created no record; handle not bound"),
            }
        }
        Ok(outcome)
    }

    /// Apply every call in order. A failed call does not stop later calls.
    pub fn run<S: EventSink>(
        &mut self,
        ledger: &mut Ledger<S>,
        calls: Vec<Value>,
    ) -> Vec<Result<Outcome, BatchError>> {
        calls
            .into_iter()
            .map(|raw| self.apply(ledger, raw))
            .collect()
    }
}
