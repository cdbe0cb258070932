//! trustledger-state: The state-transition core of the agent trust ledger.
//!
//! Four record families, each owned by the execution substrate and addressed
//! by `ObjectId`:
//! - `AgentIdentity`: minimal agent metadata and its owner
//! - `RegistrationRecord` (+ the `Registry` counter): capabilities, endpoints, trust model
//! - `AgentReputation`: peer ratings with running statistics and bounded history
//! - `AgentValidation` (+ the shared `StakePool`): stake, zkML proofs, TEE attestations
//!
//! Every operation is synchronous and all-or-nothing: inputs and authority are
//! checked before the first field is written, and exactly one event is emitted
//! on success.

pub mod identity;
pub mod registration;
pub mod reputation;
pub mod validation;

pub use identity::{AgentIdentity, IdentityUpdate};
pub use registration::{
    Capability, Endpoint, RegistrationRecord, RegistrationUpdate, Registry, RegistryStats,
    TrustModel,
};
pub use reputation::{AgentReputation, CategoryScore, Rating, ReputationStats};
pub use validation::{
    AgentValidation, StakeInfo, StakePool, StakePoolStats, TeeAttestation, ValidationSummary,
    ValidationType, ZkmlProof,
};
