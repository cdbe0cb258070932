//! In-memory object storage keyed by `ObjectId`.
//!
//! Stands in for the execution substrate's storage: each top-level record is
//! independently addressable, and cross-record references are ids only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trustledger_core::{LedgerError, ObjectId, RecordKind, Result};
use trustledger_state::{AgentIdentity, AgentReputation, AgentValidation, RegistrationRecord};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ObjectStore {
    identities: HashMap<ObjectId, AgentIdentity>,
    registrations: HashMap<ObjectId, RegistrationRecord>,
    reputations: HashMap<ObjectId, AgentReputation>,
    validations: HashMap<ObjectId, AgentValidation>,
}

fn not_found(kind: RecordKind, id: ObjectId) -> LedgerError {
    LedgerError::RecordNotFound { kind, id }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Insert ────────────────────────────────────────────────

    pub fn insert_identity(&mut self, identity: AgentIdentity) -> ObjectId {
        let id = identity.id();
        self.identities.insert(id, identity);
        id
    }

    pub fn insert_registration(&mut self, record: RegistrationRecord) -> ObjectId {
        let id = record.id();
        self.registrations.insert(id, record);
        id
    }

    pub fn insert_reputation(&mut self, reputation: AgentReputation) -> ObjectId {
        let id = reputation.id();
        self.reputations.insert(id, reputation);
        id
    }

    pub fn insert_validation(&mut self, validation: AgentValidation) -> ObjectId {
        let id = validation.id();
        self.validations.insert(id, validation);
        id
    }

    // ── Lookup ────────────────────────────────────────────────

    pub fn identity(&self, id: ObjectId) -> Result<&AgentIdentity> {
        self.identities
            .get(&id)
            .ok_or_else(|| not_found(RecordKind::Identity, id))
    }

    pub fn identity_mut(&mut self, id: ObjectId) -> Result<&mut AgentIdentity> {
        self.identities
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Identity, id))
    }

    pub fn registration(&self, id: ObjectId) -> Result<&RegistrationRecord> {
        self.registrations
            .get(&id)
            .ok_or_else(|| not_found(RecordKind::Registration, id))
    }

    pub fn registration_mut(&mut self, id: ObjectId) -> Result<&mut RegistrationRecord> {
        self.registrations
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Registration, id))
    }

    pub fn reputation(&self, id: ObjectId) -> Result<&AgentReputation> {
        self.reputations
            .get(&id)
            .ok_or_else(|| not_found(RecordKind::Reputation, id))
    }

    pub fn reputation_mut(&mut self, id: ObjectId) -> Result<&mut AgentReputation> {
        self.reputations
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Reputation, id))
    }

    pub fn validation(&self, id: ObjectId) -> Result<&AgentValidation> {
        self.validations
            .get(&id)
            .ok_or_else(|| not_found(RecordKind::Validation, id))
    }

    pub fn validation_mut(&mut self, id: ObjectId) -> Result<&mut AgentValidation> {
        self.validations
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Validation, id))
    }

    /// Every validation record, in no particular order.
    pub fn validations(&self) -> impl Iterator<Item = &AgentValidation> {
        self.validations.values()
    }

    /// Registrations declared for `identity_ref`. Order is unspecified.
    pub fn registrations_for_identity(
        &self,
        identity_ref: ObjectId,
    ) -> impl Iterator<Item = &RegistrationRecord> {
        self.registrations
            .values()
            .filter(move |r| r.identity_ref() == identity_ref)
    }
}
