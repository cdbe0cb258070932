//! Agent identity records.

use serde::{Deserialize, Serialize};
use trustledger_core::{
    Address, CallContext, Epoch, EventPayload, EventSink, LedgerEvent, ObjectId, Result,
};

/// Minimal agent metadata. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentIdentity {
    id: ObjectId,
    numeric_agent_id: u64,
    name: String,
    description: String,
    /// Pointer to off-chain content (e.g. an agent card).
    content_uri: String,
    owner: Address,
    created_at: Epoch,
    version: u64,
}

/// Replace-if-present changes to an identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content_uri: Option<String>,
}

impl AgentIdentity {
    /// Create an identity owned by the caller.
    pub fn create(
        ctx: &CallContext,
        numeric_agent_id: u64,
        name: impl Into<String>,
        description: impl Into<String>,
        content_uri: impl Into<String>,
        sink: &mut impl EventSink,
    ) -> Self {
        let identity = Self {
            id: ObjectId::new(),
            numeric_agent_id,
            name: name.into(),
            description: description.into(),
            content_uri: content_uri.into(),
            owner: ctx.caller.clone(),
            created_at: ctx.epoch,
            version: 1,
        };

        tracing::debug!(
            identity_id = %identity.id,
            numeric_agent_id,
            owner = %identity.owner,
            "Agent identity created"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::IdentityCreated {
                identity_id: identity.id,
                numeric_agent_id,
                owner: identity.owner.clone(),
                name: identity.name.clone(),
            },
        ));
        identity
    }

    /// Owner-only metadata update. Absent fields are left untouched.
    pub fn update(
        &mut self,
        ctx: &CallContext,
        update: IdentityUpdate,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        ctx.require(&self.owner)?;

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(content_uri) = update.content_uri {
            self.content_uri = content_uri;
        }
        self.version += 1;

        tracing::debug!(identity_id = %self.id, version = self.version, "Agent identity updated");
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::IdentityUpdated {
                identity_id: self.id,
                version: self.version,
            },
        ));
        Ok(())
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn numeric_agent_id(&self) -> u64 {
        self.numeric_agent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content_uri(&self) -> &str {
        &self.content_uri
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn created_at(&self) -> Epoch {
        self.created_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
