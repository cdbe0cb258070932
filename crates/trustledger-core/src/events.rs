//! Change notifications emitted by every successful mutating operation.
//!
//! Notifications are consumed by external indexers. Delivery is
//! fire-and-forget: an `EventSink` cannot fail or block the operation that
//! produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::CallContext;
use crate::types::{Address, Epoch, ObjectId};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// An event emitted by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEvent {
    pub id: EventId,
    /// Logical epoch of the operation that produced the event.
    pub epoch: Epoch,
    /// Caller of the operation that produced the event.
    pub sender: Address,
    /// Wall-clock time the event was built. Informational only.
    pub emitted_at: DateTime<Utc>,
    pub payload: EventPayload,
}

impl LedgerEvent {
    pub fn new(ctx: &CallContext, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            epoch: ctx.epoch,
            sender: ctx.caller.clone(),
            emitted_at: Utc::now(),
            payload,
        }
    }
}

/// The event payload, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type")]
pub enum EventPayload {
    // ── Identity & registration ───────────────────────────────
    RegistryInitialized {
        registry_id: ObjectId,
    },
    IdentityCreated {
        identity_id: ObjectId,
        numeric_agent_id: u64,
        owner: Address,
        name: String,
    },
    IdentityUpdated {
        identity_id: ObjectId,
        version: u64,
    },
    /// A registration record was created. Carries the numeric agent id the
    /// registry assigned to it.
    AgentRegistered {
        registration_id: ObjectId,
        identity_ref: ObjectId,
        agent_id: u64,
        wallet_address: Address,
        capability_count: u32,
        endpoint_count: u32,
    },
    RegistrationUpdated {
        registration_id: ObjectId,
        version: u64,
    },

    // ── Reputation ────────────────────────────────────────────
    ReputationCreated {
        reputation_id: ObjectId,
        registration_ref: ObjectId,
        agent_owner: Address,
    },
    RatingAdded {
        reputation_id: ObjectId,
        reviewer: Address,
        score: u8,
        category: String,
        /// Fixed-point average (x100) after the rating was applied.
        new_average: u64,
    },
    RatingUpdated {
        reputation_id: ObjectId,
        reviewer: Address,
        old_score: u8,
        new_score: u8,
        new_average: u64,
    },

    // ── Validation ────────────────────────────────────────────
    ValidationCreated {
        validation_id: ObjectId,
        registration_ref: ObjectId,
        agent_owner: Address,
    },
    StakeAdded {
        validation_id: ObjectId,
        staker: Address,
        amount: u64,
        expires_at: Epoch,
        pool_total: u64,
    },
    Unstaked {
        validation_id: ObjectId,
        staker: Address,
        amount: u64,
        remaining: u64,
    },
    ZkmlProofAdded {
        validation_id: ObjectId,
        proof_hash: String,
        circuit_id: String,
    },
    TeeAttestationAdded {
        validation_id: ObjectId,
        report_hash: String,
        provider: String,
    },
}

impl EventPayload {
    /// The serialized `event_type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegistryInitialized { .. } => "RegistryInitialized",
            Self::IdentityCreated { .. } => "IdentityCreated",
            Self::IdentityUpdated { .. } => "IdentityUpdated",
            Self::AgentRegistered { .. } => "AgentRegistered",
            Self::RegistrationUpdated { .. } => "RegistrationUpdated",
            Self::ReputationCreated { .. } => "ReputationCreated",
            Self::RatingAdded { .. } => "RatingAdded",
            Self::RatingUpdated { .. } => "RatingUpdated",
            Self::ValidationCreated { .. } => "ValidationCreated",
            Self::StakeAdded { .. } => "StakeAdded",
            Self::Unstaked { .. } => "Unstaked",
            Self::ZkmlProofAdded { .. } => "ZkmlProofAdded",
            Self::TeeAttestationAdded { .. } => "TeeAttestationAdded",
        }
    }
}

// ── Sinks ─────────────────────────────────────────────────────────

/// Destination for change notifications.
pub trait EventSink {
    fn emit(&mut self, event: LedgerEvent);
}

impl EventSink for Vec<LedgerEvent> {
    fn emit(&mut self, event: LedgerEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: LedgerEvent) {
        (**self).emit(event);
    }
}

/// Writes each event as a structured log line and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: LedgerEvent) {
        let payload = serde_json::to_string(&event.payload).unwrap_or_default();
        tracing::info!(
            event_id = %event.id.0,
            event_type = event.payload.kind(),
            epoch = event.epoch,
            sender = %event.sender,
            payload = %payload,
            "Ledger event"
        );
    }
}
