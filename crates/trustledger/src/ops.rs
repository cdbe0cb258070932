//! Serializable ledger operations and their outcomes.
//!
//! Each `Call` names the caller, the epoch, and exactly one operation along
//! with every record it reads or mutates.

use serde::{Deserialize, Serialize};
use trustledger_core::{Address, CallContext, ObjectId};
use trustledger_state::{
    AgentIdentity, AgentValidation, Capability, CategoryScore, Endpoint, Rating,
    RegistrationRecord, RegistryStats, ReputationStats, StakeInfo, StakePoolStats, TeeAttestation,
    TrustModel, ValidationSummary, ValidationType, ZkmlProof,
};

/// One operation submitted by one caller at one epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    #[serde(flatten)]
    pub ctx: CallContext,
    /// Name under which a record created by this call can be referenced by
    /// later calls in the same batch, as `"$name"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(flatten)]
    pub op: Operation,
}

/// Every operation the ledger accepts, tagged by `op`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    // ── Identity ──────────────────────────────────────────────
    CreateIdentity {
        numeric_agent_id: u64,
        name: String,
        description: String,
        content_uri: String,
    },
    UpdateIdentity {
        identity: ObjectId,
        name: Option<String>,
        description: Option<String>,
        content_uri: Option<String>,
    },
    GetIdentityInfo {
        identity: ObjectId,
    },

    // ── Registration ──────────────────────────────────────────
    InitRegistry,
    RegisterAgent {
        identity_ref: ObjectId,
        capabilities: Vec<Capability>,
        endpoints: Vec<Endpoint>,
        alias_name: Option<String>,
        trust_model: TrustModel,
        metadata_hash: String,
    },
    UpdateRegistration {
        registration: ObjectId,
        capabilities: Option<Vec<Capability>>,
        endpoints: Option<Vec<Endpoint>>,
        alias_name: Option<String>,
        trust_model: Option<TrustModel>,
        metadata_hash: Option<String>,
    },
    GetRegistrationInfo {
        registration: ObjectId,
    },
    GetRegistryStats,
    HasCapability {
        registration: ObjectId,
        name: String,
    },
    GetCapabilityNames {
        registration: ObjectId,
    },
    GetEndpointUrls {
        registration: ObjectId,
    },
    GetEndpointsByProtocol {
        registration: ObjectId,
        protocol: String,
    },

    // ── Reputation ────────────────────────────────────────────
    CreateReputation {
        registration_ref: ObjectId,
        owner: Address,
    },
    AddRating {
        reputation: ObjectId,
        score: u8,
        comment: Option<String>,
        category: String,
    },
    UpdateRating {
        reputation: ObjectId,
        old_score: u8,
        new_score: u8,
        new_comment: Option<String>,
    },
    GetReputationStats {
        reputation: ObjectId,
    },
    GetAverageScore {
        reputation: ObjectId,
    },
    GetCategoryScores {
        reputation: ObjectId,
    },
    GetCategoryScore {
        reputation: ObjectId,
        category: String,
    },
    GetRatingsHistory {
        reputation: ObjectId,
    },
    GetRecentRatings {
        reputation: ObjectId,
        count: usize,
    },
    GetReviewerRatings {
        reputation: ObjectId,
        reviewer: Address,
    },

    // ── Validation ────────────────────────────────────────────
    CreateValidation {
        registration_ref: ObjectId,
        owner: Address,
    },
    /// Credit the caller's wallet with newly minted value.
    Fund {
        amount: u64,
    },
    /// Stake `amount` drawn from the caller's wallet.
    AddStake {
        validation: ObjectId,
        amount: u64,
        expires_at: u64,
    },
    Unstake {
        validation: ObjectId,
        amount: u64,
    },
    AddZkmlProof {
        validation: ObjectId,
        proof_hash: String,
        circuit_id: String,
        public_input_hash: String,
    },
    AddTeeAttestation {
        validation: ObjectId,
        report_hash: String,
        provider: String,
    },
    GetValidationInfo {
        validation: ObjectId,
    },
    GetValidationSummary {
        validation: ObjectId,
    },
    GetStakeInfo {
        validation: ObjectId,
    },
    GetZkmlProofs {
        validation: ObjectId,
    },
    GetTeeAttestations {
        validation: ObjectId,
    },
    GetStakePoolStats,
    HasValidationType {
        validation: ObjectId,
        validation_type: String,
    },
    GetValidationTypes {
        validation: ObjectId,
    },
    IsValidated {
        validation: ObjectId,
    },
    GetWalletBalance {
        address: Address,
    },
}

impl Operation {
    /// Whether applying this operation can change ledger state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::CreateIdentity { .. }
                | Self::UpdateIdentity { .. }
                | Self::InitRegistry
                | Self::RegisterAgent { .. }
                | Self::UpdateRegistration { .. }
                | Self::CreateReputation { .. }
                | Self::AddRating { .. }
                | Self::UpdateRating { .. }
                | Self::CreateValidation { .. }
                | Self::Fund { .. }
                | Self::AddStake { .. }
                | Self::Unstake { .. }
                | Self::AddZkmlProof { .. }
                | Self::AddTeeAttestation { .. }
        )
    }
}

/// The value produced by a successful operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A record was created.
    Created(ObjectId),
    /// A mutation succeeded with nothing to return.
    Applied,
    /// Value was withdrawn and credited to the caller's wallet.
    Withdrawn(u64),
    Identity(AgentIdentity),
    Registration(RegistrationRecord),
    RegistryStats(RegistryStats),
    Flag(bool),
    Names(Vec<String>),
    Endpoints(Vec<Endpoint>),
    ReputationStats(ReputationStats),
    AverageScore {
        whole: u64,
        hundredths: u64,
    },
    CategoryScores(Vec<CategoryScore>),
    CategoryScore(Option<u8>),
    Ratings(Vec<Rating>),
    Validation(AgentValidation),
    ValidationSummary(ValidationSummary),
    StakeInfo(Option<StakeInfo>),
    ZkmlProofs(Vec<ZkmlProof>),
    TeeAttestations(Vec<TeeAttestation>),
    StakePoolStats(StakePoolStats),
    ValidationTypes(Vec<ValidationType>),
    Balance(u64),
}
