//! Validation ledger: stake lifecycle, zkML proof log, TEE attestation log.
//!
//! `is_validated` is a cached flag that is true exactly when at least one of
//! stake, zkML, or TEE evidence is present. Proof and attestation logs are
//! append-only; nothing removes entries from them.
//!
//! A repeated `add_stake` replaces the recorded position with the new payment
//! while the pool keeps every deposit. The earlier position's value stays in
//! the pool and is no longer withdrawable through this record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trustledger_core::{
    Address, CallContext, Coin, Epoch, EventPayload, EventSink, LedgerError, LedgerEvent,
    ObjectId, Result,
};

// ── Validation types ──────────────────────────────────────────────

/// A kind of independent trust evidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    Stake,
    Zkml,
    Tee,
}

impl ValidationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Zkml => "zkml",
            Self::Tee => "tee",
        }
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stake" => Ok(Self::Stake),
            "zkml" => Ok(Self::Zkml),
            "tee" => Ok(Self::Tee),
            other => Err(LedgerError::InvalidValidationType(other.to_string())),
        }
    }
}

// ── Evidence entries ──────────────────────────────────────────────

/// The single active stake position of a validation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StakeInfo {
    pub staker: Address,
    pub amount: u64,
    pub staked_at: Epoch,
    /// Epoch from which the stake may be withdrawn; 0 means never locked.
    pub expires_at: Epoch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZkmlProof {
    pub proof_hash: String,
    pub circuit_id: String,
    pub public_input_hash: String,
    pub verified_at: Epoch,
    pub verifier: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeeAttestation {
    pub report_hash: String,
    /// e.g. "sgx", "nitro", "sev-snp".
    pub provider: String,
    pub verified_at: Epoch,
    pub verifier: Address,
}

// ── Stake pool ────────────────────────────────────────────────────

/// Shared pool holding all staked value across every validation record.
///
/// One instance exists per deployment, created at bootstrap and passed to
/// each stake operation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StakePool {
    id: ObjectId,
    total_staked: u64,
    balance: Coin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StakePoolStats {
    pub total_staked: u64,
    pub balance: u64,
}

impl StakePool {
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            total_staked: 0,
            balance: Coin::zero(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn stats(&self) -> StakePoolStats {
        StakePoolStats {
            total_staked: self.total_staked,
            balance: self.balance.value(),
        }
    }

    /// Move the whole of `payment` into the pool. Nothing moves if the pool
    /// total would overflow.
    fn deposit(&mut self, payment: &mut Coin) -> Result<u64> {
        let amount = payment.value();
        let total_staked =
            self.total_staked
                .checked_add(amount)
                .ok_or(LedgerError::ValueOverflow {
                    value: self.total_staked,
                    amount,
                })?;
        // balance tracks total_staked, so this join cannot overflow.
        self.balance.join(payment.split(amount)?)?;
        self.total_staked = total_staked;
        Ok(amount)
    }

    fn withdraw(&mut self, amount: u64) -> Result<Coin> {
        let coin = self.balance.split(amount)?;
        self.total_staked -= amount;
        Ok(coin)
    }
}

impl Default for StakePool {
    fn default() -> Self {
        Self::new()
    }
}

// ── Validation record ─────────────────────────────────────────────

/// Trust evidence accrued by one registration. Every mutation is
/// owner-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentValidation {
    id: ObjectId,
    registration_ref: ObjectId,
    agent_owner: Address,
    stake_info: Option<StakeInfo>,
    zkml_proofs: Vec<ZkmlProof>,
    tee_attestations: Vec<TeeAttestation>,
    is_validated: bool,
    /// Insertion-ordered set.
    validation_types: Vec<ValidationType>,
    version: u64,
}

/// Counts over the evidence held by a validation record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationSummary {
    pub is_validated: bool,
    pub active_stake: u64,
    pub zkml_proof_count: usize,
    pub tee_attestation_count: usize,
    pub version: u64,
}

impl AgentValidation {
    /// `create_agent_validation`: starts unvalidated.
    pub fn create(
        ctx: &CallContext,
        registration_ref: ObjectId,
        agent_owner: Address,
        sink: &mut impl EventSink,
    ) -> Self {
        let validation = Self {
            id: ObjectId::new(),
            registration_ref,
            agent_owner,
            stake_info: None,
            zkml_proofs: Vec::new(),
            tee_attestations: Vec::new(),
            is_validated: false,
            validation_types: Vec::new(),
            version: 1,
        };

        tracing::debug!(
            validation_id = %validation.id,
            registration_ref = %registration_ref,
            owner = %validation.agent_owner,
            "Validation record created"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::ValidationCreated {
                validation_id: validation.id,
                registration_ref,
                agent_owner: validation.agent_owner.clone(),
            },
        ));
        validation
    }

    /// Deposit the whole of `payment` into `pool` and record it as the
    /// active stake position, replacing any previous one. `payment` is left
    /// empty on success and untouched on failure.
    pub fn add_stake(
        &mut self,
        ctx: &CallContext,
        pool: &mut StakePool,
        payment: &mut Coin,
        expires_at: Epoch,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        ctx.require(&self.agent_owner)?;

        let amount = pool.deposit(payment)?;

        if let Some(previous) = &self.stake_info {
            tracing::warn!(
                validation_id = %self.id,
                replaced_amount = previous.amount,
                "Replacing existing stake position"
            );
        }
        self.stake_info = Some(StakeInfo {
            staker: ctx.caller.clone(),
            amount,
            staked_at: ctx.epoch,
            expires_at,
        });
        self.add_validation_type(ValidationType::Stake);
        self.is_validated = true;
        self.version += 1;

        tracing::debug!(
            validation_id = %self.id,
            amount,
            expires_at,
            pool_total = pool.total_staked,
            "Stake added"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::StakeAdded {
                validation_id: self.id,
                staker: ctx.caller.clone(),
                amount,
                expires_at,
                pool_total: pool.total_staked,
            },
        ));
        Ok(())
    }

    /// Withdraw `amount` from the active stake position. Returns the
    /// withdrawn value for deposit to the caller.
    pub fn unstake(
        &mut self,
        ctx: &CallContext,
        pool: &mut StakePool,
        amount: u64,
        sink: &mut impl EventSink,
    ) -> Result<Coin> {
        ctx.require(&self.agent_owner)?;

        let stake = self.stake_info.as_ref().ok_or(LedgerError::NoActiveStake)?;
        if amount > stake.amount {
            return Err(LedgerError::InsufficientStake {
                requested: amount,
                available: stake.amount,
            });
        }
        if stake.expires_at > 0 && ctx.epoch < stake.expires_at {
            return Err(LedgerError::StakeLocked {
                expires_at: stake.expires_at,
                epoch: ctx.epoch,
            });
        }
        let full_withdrawal = amount == stake.amount;

        let coin = pool.withdraw(amount)?;

        let remaining = if full_withdrawal {
            self.stake_info = None;
            self.remove_validation_type(ValidationType::Stake);
            self.is_validated = !self.zkml_proofs.is_empty() || !self.tee_attestations.is_empty();
            0
        } else {
            match self.stake_info.as_mut() {
                Some(stake) => {
                    stake.amount -= amount;
                    stake.amount
                }
                None => 0,
            }
        };
        self.version += 1;

        tracing::debug!(
            validation_id = %self.id,
            amount,
            remaining,
            "Stake withdrawn"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::Unstaked {
                validation_id: self.id,
                staker: ctx.caller.clone(),
                amount,
                remaining,
            },
        ));
        Ok(coin)
    }

    /// Append a zkML proof. No deduplication.
    pub fn add_zkml_proof(
        &mut self,
        ctx: &CallContext,
        proof_hash: impl Into<String>,
        circuit_id: impl Into<String>,
        public_input_hash: impl Into<String>,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        ctx.require(&self.agent_owner)?;

        let proof = ZkmlProof {
            proof_hash: proof_hash.into(),
            circuit_id: circuit_id.into(),
            public_input_hash: public_input_hash.into(),
            verified_at: ctx.epoch,
            verifier: ctx.caller.clone(),
        };
        let payload = EventPayload::ZkmlProofAdded {
            validation_id: self.id,
            proof_hash: proof.proof_hash.clone(),
            circuit_id: proof.circuit_id.clone(),
        };
        self.zkml_proofs.push(proof);
        self.add_validation_type(ValidationType::Zkml);
        self.is_validated = true;
        self.version += 1;

        tracing::debug!(
            validation_id = %self.id,
            proofs = self.zkml_proofs.len(),
            "zkML proof added"
        );
        sink.emit(LedgerEvent::new(ctx, payload));
        Ok(())
    }

    /// Append a TEE attestation. No deduplication.
    pub fn add_tee_attestation(
        &mut self,
        ctx: &CallContext,
        report_hash: impl Into<String>,
        provider: impl Into<String>,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        ctx.require(&self.agent_owner)?;

        let attestation = TeeAttestation {
            report_hash: report_hash.into(),
            provider: provider.into(),
            verified_at: ctx.epoch,
            verifier: ctx.caller.clone(),
        };
        let payload = EventPayload::TeeAttestationAdded {
            validation_id: self.id,
            report_hash: attestation.report_hash.clone(),
            provider: attestation.provider.clone(),
        };
        self.tee_attestations.push(attestation);
        self.add_validation_type(ValidationType::Tee);
        self.is_validated = true;
        self.version += 1;

        tracing::debug!(
            validation_id = %self.id,
            attestations = self.tee_attestations.len(),
            "TEE attestation added"
        );
        sink.emit(LedgerEvent::new(ctx, payload));
        Ok(())
    }

    fn add_validation_type(&mut self, kind: ValidationType) {
        if !self.validation_types.contains(&kind) {
            self.validation_types.push(kind);
        }
    }

    fn remove_validation_type(&mut self, kind: ValidationType) {
        self.validation_types.retain(|t| *t != kind);
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn registration_ref(&self) -> ObjectId {
        self.registration_ref
    }

    pub fn agent_owner(&self) -> &Address {
        &self.agent_owner
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stake_info(&self) -> Option<&StakeInfo> {
        self.stake_info.as_ref()
    }

    pub fn zkml_proofs(&self) -> &[ZkmlProof] {
        &self.zkml_proofs
    }

    pub fn tee_attestations(&self) -> &[TeeAttestation] {
        &self.tee_attestations
    }

    pub fn has_validation_type(&self, kind: ValidationType) -> bool {
        self.validation_types.contains(&kind)
    }

    /// In the order each type was first acquired.
    pub fn validation_types(&self) -> &[ValidationType] {
        &self.validation_types
    }

    pub fn is_validated(&self) -> bool {
        self.is_validated
    }

    pub fn validation_summary(&self) -> ValidationSummary {
        ValidationSummary {
            is_validated: self.is_validated,
            active_stake: self.stake_info.as_ref().map(|s| s.amount).unwrap_or(0),
            zkml_proof_count: self.zkml_proofs.len(),
            tee_attestation_count: self.tee_attestations.len(),
            version: self.version,
        }
    }
}
