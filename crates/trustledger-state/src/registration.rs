//! Registration ledger: capability, endpoint, and trust-model declarations.
//!
//! Capabilities and endpoints are kept as plain sequences. Lookups are linear
//! scans in insertion order, and the first match wins.

use serde::{Deserialize, Serialize};
use trustledger_core::{
    Address, CallContext, EventPayload, EventSink, LedgerEvent, ObjectId, Result,
};

use crate::validation::ValidationType;

// ── Value types ───────────────────────────────────────────────────

/// Something an agent can do. `name` is the identifying key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub capability_type: String,
    pub version: String,
}

impl Capability {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capability_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capability_type: capability_type.into(),
            version: version.into(),
        }
    }
}

/// How to reach an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    /// e.g. "a2a", "mcp", "https".
    pub protocol: String,
    pub url: String,
    pub description: String,
    pub supports_validation: bool,
    pub validation_type: Option<String>,
}

/// Which trust mechanisms an agent advertises.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustModel {
    pub supports_reputation: bool,
    pub supports_stake_validation: bool,
    pub supports_zkml_validation: bool,
    pub supports_tee_attestation: bool,
    pub min_stake_amount: Option<u64>,
}

impl TrustModel {
    /// Validation kinds this model advertises, in stake, zkml, tee order.
    pub fn supported_validation_types(&self) -> Vec<ValidationType> {
        let mut types = Vec::new();
        if self.supports_stake_validation {
            types.push(ValidationType::Stake);
        }
        if self.supports_zkml_validation {
            types.push(ValidationType::Zkml);
        }
        if self.supports_tee_attestation {
            types.push(ValidationType::Tee);
        }
        types
    }
}

// ── Registry ──────────────────────────────────────────────────────

/// Deployment-wide registration counter.
///
/// One instance exists per deployment; it is created at bootstrap and handed
/// to every `register` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registry {
    id: ObjectId,
    next_agent_id: u64,
    total_agents: u64,
}

/// Snapshot of the registry counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryStats {
    pub next_agent_id: u64,
    pub total_agents: u64,
}

impl Registry {
    /// `init_registry`: the first registration receives agent id 1.
    pub fn init(ctx: &CallContext, sink: &mut impl EventSink) -> Self {
        let registry = Self {
            id: ObjectId::new(),
            next_agent_id: 1,
            total_agents: 0,
        };
        tracing::info!(registry_id = %registry.id, "Registry initialized");
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::RegistryInitialized {
                registry_id: registry.id,
            },
        ));
        registry
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            next_agent_id: self.next_agent_id,
            total_agents: self.total_agents,
        }
    }

    /// Hand out the next agent id. Counters only ever grow.
    fn assign_agent_id(&mut self) -> u64 {
        let agent_id = self.next_agent_id;
        self.next_agent_id += 1;
        self.total_agents += 1;
        agent_id
    }
}

// ── Registration record ───────────────────────────────────────────

/// List lengths as carried in events, saturating at `u32::MAX`.
fn event_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Capability/endpoint/trust declaration for one identity.
///
/// `wallet_address` is the creator and the only authorized mutator. A single
/// identity may hold any number of registrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationRecord {
    id: ObjectId,
    identity_ref: ObjectId,
    agent_id: u64,
    capabilities: Vec<Capability>,
    endpoints: Vec<Endpoint>,
    alias_name: Option<String>,
    wallet_address: Address,
    trust_model: TrustModel,
    metadata_hash: String,
    version: u64,
}

/// Wholesale, replace-if-present changes to a registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationUpdate {
    pub capabilities: Option<Vec<Capability>>,
    pub endpoints: Option<Vec<Endpoint>>,
    pub alias_name: Option<String>,
    pub trust_model: Option<TrustModel>,
    pub metadata_hash: Option<String>,
}

impl RegistrationRecord {
    /// `register_agent`: create a registration owned by the caller and bump
    /// the registry counters.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        ctx: &CallContext,
        registry: &mut Registry,
        identity_ref: ObjectId,
        capabilities: Vec<Capability>,
        endpoints: Vec<Endpoint>,
        alias_name: Option<String>,
        trust_model: TrustModel,
        metadata_hash: impl Into<String>,
        sink: &mut impl EventSink,
    ) -> Self {
        let agent_id = registry.assign_agent_id();
        let record = Self {
            id: ObjectId::new(),
            identity_ref,
            agent_id,
            capabilities,
            endpoints,
            alias_name,
            wallet_address: ctx.caller.clone(),
            trust_model,
            metadata_hash: metadata_hash.into(),
            version: 1,
        };

        tracing::debug!(
            registration_id = %record.id,
            identity_ref = %identity_ref,
            agent_id,
            wallet = %record.wallet_address,
            "Agent registered"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::AgentRegistered {
                registration_id: record.id,
                identity_ref,
                agent_id,
                wallet_address: record.wallet_address.clone(),
                capability_count: event_count(record.capabilities.len()),
                endpoint_count: event_count(record.endpoints.len()),
            },
        ));
        record
    }

    /// `update_registration`: wallet-only; present fields replace wholesale.
    pub fn update(
        &mut self,
        ctx: &CallContext,
        update: RegistrationUpdate,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        ctx.require(&self.wallet_address)?;

        if let Some(capabilities) = update.capabilities {
            self.capabilities = capabilities;
        }
        if let Some(endpoints) = update.endpoints {
            self.endpoints = endpoints;
        }
        if let Some(alias_name) = update.alias_name {
            self.alias_name = Some(alias_name);
        }
        if let Some(trust_model) = update.trust_model {
            self.trust_model = trust_model;
        }
        if let Some(metadata_hash) = update.metadata_hash {
            self.metadata_hash = metadata_hash;
        }
        self.version += 1;

        tracing::debug!(registration_id = %self.id, version = self.version, "Registration updated");
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::RegistrationUpdated {
                registration_id: self.id,
                version: self.version,
            },
        ));
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn identity_ref(&self) -> ObjectId {
        self.identity_ref
    }

    /// Numeric id assigned by the registry at creation.
    pub fn agent_id(&self) -> u64 {
        self.agent_id
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias_name.as_deref()
    }

    pub fn wallet_address(&self) -> &Address {
        &self.wallet_address
    }

    pub fn trust_model(&self) -> &TrustModel {
        &self.trust_model
    }

    pub fn metadata_hash(&self) -> &str {
        &self.metadata_hash
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Exact-match linear scan over capability names.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }

    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn endpoint_urls(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.url.as_str()).collect()
    }

    /// All endpoints speaking `protocol`, in declaration order.
    pub fn endpoints_by_protocol(&self, protocol: &str) -> Vec<&Endpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.protocol == protocol)
            .collect()
    }
}
