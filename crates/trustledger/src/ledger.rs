//! The ledger host: owns storage, the registry and stake pool handles,
//! wallet balances, and the event sink, and dispatches operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trustledger_core::{Address, CallContext, Coin, EventSink, LedgerError, Result};
use trustledger_state::{
    AgentIdentity, AgentReputation, AgentValidation, IdentityUpdate, RegistrationRecord,
    RegistrationUpdate, Registry, StakePool, ValidationType,
};

use crate::ops::{Call, Operation, Outcome};
use crate::store::ObjectStore;

/// Everything a deployment holds apart from its event sink.
///
/// Every coin in `wallets` and the pool balance together add up to `supply`,
/// the total ever minted by `fund`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub registry: Option<Registry>,
    pub pool: StakePool,
    pub store: ObjectStore,
    pub wallets: HashMap<Address, Coin>,
    pub supply: u64,
}

/// A single ledger deployment.
///
/// The stake pool exists from bootstrap. The registry is created by the
/// `init_registry` operation, at most once.
pub struct Ledger<S: EventSink> {
    state: LedgerState,
    sink: S,
}

impl<S: EventSink> Ledger<S> {
    pub fn new(sink: S) -> Self {
        let state = LedgerState::default();
        tracing::debug!(pool_id = %state.pool.id(), "Ledger bootstrapped");
        Self { state, sink }
    }

    /// Resume a deployment from previously saved state.
    pub fn restore(state: LedgerState, sink: S) -> Self {
        tracing::debug!(
            pool_id = %state.pool.id(),
            registry = state.registry.is_some(),
            supply = state.supply,
            "Ledger restored"
        );
        Self { state, sink }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn registry(&self) -> Option<&Registry> {
        self.state.registry.as_ref()
    }

    pub fn pool(&self) -> &StakePool {
        &self.state.pool
    }

    pub fn store(&self) -> &ObjectStore {
        &self.state.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn into_parts(self) -> (LedgerState, S) {
        (self.state, self.sink)
    }

    pub fn wallet_balance(&self, address: &Address) -> u64 {
        self.state
            .wallets
            .get(address)
            .map(Coin::value)
            .unwrap_or(0)
    }

    /// Apply a batch in order. A failed call does not stop later calls.
    pub fn apply_all(&mut self, calls: Vec<Call>) -> Vec<Result<Outcome>> {
        calls
            .into_iter()
            .map(|call| self.apply(&call.ctx, call.op))
            .collect()
    }

    /// Apply one operation. On error nothing has changed and nothing was
    /// emitted.
    pub fn apply(&mut self, ctx: &CallContext, op: Operation) -> Result<Outcome> {
        let mutating = op.is_mutating();
        let result = self.dispatch(ctx, op);
        if let Err(e) = &result {
            if mutating {
                tracing::info!(caller = %ctx.caller, epoch = ctx.epoch, error = %e, "Operation rejected");
            }
        }
        result
    }

    fn dispatch(&mut self, ctx: &CallContext, op: Operation) -> Result<Outcome> {
        let sink = &mut self.sink;
        match op {
            // ── Identity ──────────────────────────────────────
            Operation::CreateIdentity {
                numeric_agent_id,
                name,
                description,
                content_uri,
            } => {
                let identity = AgentIdentity::create(
                    ctx,
                    numeric_agent_id,
                    name,
                    description,
                    content_uri,
                    sink,
                );
                Ok(Outcome::Created(self.state.store.insert_identity(identity)))
            }
            Operation::UpdateIdentity {
                identity,
                name,
                description,
                content_uri,
            } => {
                self.state.store.identity_mut(identity)?.update(
                    ctx,
                    IdentityUpdate {
                        name,
                        description,
                        content_uri,
                    },
                    sink,
                )?;
                Ok(Outcome::Applied)
            }
            Operation::GetIdentityInfo { identity } => Ok(Outcome::Identity(
                self.state.store.identity(identity)?.clone(),
            )),

            // ── Registration ──────────────────────────────────
            Operation::InitRegistry => {
                if self.state.registry.is_some() {
                    return Err(LedgerError::RegistryAlreadyInitialized);
                }
                let registry = Registry::init(ctx, sink);
                let id = registry.id();
                self.state.registry = Some(registry);
                Ok(Outcome::Created(id))
            }
            Operation::RegisterAgent {
                identity_ref,
                capabilities,
                endpoints,
                alias_name,
                trust_model,
                metadata_hash,
            } => {
                let registry = self
                    .state
                    .registry
                    .as_mut()
                    .ok_or(LedgerError::RegistryNotInitialized)?;
                let record = RegistrationRecord::register(
                    ctx,
                    registry,
                    identity_ref,
                    capabilities,
                    endpoints,
                    alias_name,
                    trust_model,
                    metadata_hash,
                    sink,
                );
                Ok(Outcome::Created(
                    self.state.store.insert_registration(record),
                ))
            }
            Operation::UpdateRegistration {
                registration,
                capabilities,
                endpoints,
                alias_name,
                trust_model,
                metadata_hash,
            } => {
                self.state.store.registration_mut(registration)?.update(
                    ctx,
                    RegistrationUpdate {
                        capabilities,
                        endpoints,
                        alias_name,
                        trust_model,
                        metadata_hash,
                    },
                    sink,
                )?;
                Ok(Outcome::Applied)
            }
            Operation::GetRegistrationInfo { registration } => Ok(Outcome::Registration(
                self.state.store.registration(registration)?.clone(),
            )),
            Operation::GetRegistryStats => {
                let registry = self
                    .state
                    .registry
                    .as_ref()
                    .ok_or(LedgerError::RegistryNotInitialized)?;
                Ok(Outcome::RegistryStats(registry.stats()))
            }
            Operation::HasCapability { registration, name } => Ok(Outcome::Flag(
                self.state
                    .store
                    .registration(registration)?
                    .has_capability(&name),
            )),
            Operation::GetCapabilityNames { registration } => Ok(Outcome::Names(owned_strings(
                self.state
                    .store
                    .registration(registration)?
                    .capability_names(),
            ))),
            Operation::GetEndpointUrls { registration } => Ok(Outcome::Names(owned_strings(
                self.state.store.registration(registration)?.endpoint_urls(),
            ))),
            Operation::GetEndpointsByProtocol {
                registration,
                protocol,
            } => Ok(Outcome::Endpoints(
                self.state
                    .store
                    .registration(registration)?
                    .endpoints_by_protocol(&protocol)
                    .into_iter()
                    .cloned()
                    .collect(),
            )),

            // ── Reputation ────────────────────────────────────
            Operation::CreateReputation {
                registration_ref,
                owner,
            } => {
                let reputation = AgentReputation::create(ctx, registration_ref, owner, sink);
                Ok(Outcome::Created(
                    self.state.store.insert_reputation(reputation),
                ))
            }
            Operation::AddRating {
                reputation,
                score,
                comment,
                category,
            } => {
                self.state
                    .store
                    .reputation_mut(reputation)?
                    .add_rating(ctx, score, comment, category, sink)?;
                Ok(Outcome::Applied)
            }
            Operation::UpdateRating {
                reputation,
                old_score,
                new_score,
                new_comment,
            } => {
                self.state.store.reputation_mut(reputation)?.update_rating(
                    ctx,
                    old_score,
                    new_score,
                    new_comment,
                    sink,
                )?;
                Ok(Outcome::Applied)
            }
            Operation::GetReputationStats { reputation } => Ok(Outcome::ReputationStats(
                self.state.store.reputation(reputation)?.stats(),
            )),
            Operation::GetAverageScore { reputation } => {
                let (whole, hundredths) = self.state.store.reputation(reputation)?.average_score();
                Ok(Outcome::AverageScore { whole, hundredths })
            }
            Operation::GetCategoryScores { reputation } => Ok(Outcome::CategoryScores(
                self.state
                    .store
                    .reputation(reputation)?
                    .category_scores()
                    .to_vec(),
            )),
            Operation::GetCategoryScore {
                reputation,
                category,
            } => Ok(Outcome::CategoryScore(
                self.state
                    .store
                    .reputation(reputation)?
                    .category_score(&category),
            )),
            Operation::GetRatingsHistory { reputation } => Ok(Outcome::Ratings(
                self.state
                    .store
                    .reputation(reputation)?
                    .ratings_history()
                    .iter()
                    .cloned()
                    .collect(),
            )),
            Operation::GetRecentRatings { reputation, count } => Ok(Outcome::Ratings(
                self.state
                    .store
                    .reputation(reputation)?
                    .recent_ratings(count)
                    .into_iter()
                    .cloned()
                    .collect(),
            )),
            Operation::GetReviewerRatings {
                reputation,
                reviewer,
            } => Ok(Outcome::Ratings(
                self.state
                    .store
                    .reputation(reputation)?
                    .reviewer_ratings(&reviewer)
                    .into_iter()
                    .cloned()
                    .collect(),
            )),

            // ── Validation ────────────────────────────────────
            Operation::CreateValidation {
                registration_ref,
                owner,
            } => {
                let validation = AgentValidation::create(ctx, registration_ref, owner, sink);
                Ok(Outcome::Created(
                    self.state.store.insert_validation(validation),
                ))
            }
            Operation::Fund { amount } => {
                let supply =
                    self.state
                        .supply
                        .checked_add(amount)
                        .ok_or(LedgerError::ValueOverflow {
                            value: self.state.supply,
                            amount,
                        })?;
                // No wallet exceeds the supply, so this join cannot overflow.
                self.state
                    .wallets
                    .entry(ctx.caller.clone())
                    .or_default()
                    .join(Coin::mint(amount))?;
                self.state.supply = supply;
                tracing::debug!(address = %ctx.caller, amount, supply, "Wallet funded");
                Ok(Outcome::Balance(self.wallet_balance(&ctx.caller)))
            }
            Operation::AddStake {
                validation,
                amount,
                expires_at,
            } => {
                let record = self.state.store.validation_mut(validation)?;
                let mut payment = match self.state.wallets.get_mut(&ctx.caller) {
                    Some(wallet) => wallet.split(amount)?,
                    None if amount == 0 => Coin::zero(),
                    None => {
                        return Err(LedgerError::InsufficientFunds {
                            requested: amount,
                            available: 0,
                        })
                    }
                };
                if let Err(e) =
                    record.add_stake(ctx, &mut self.state.pool, &mut payment, expires_at, sink)
                {
                    // Rejected stakes leave the payment intact; hand it back.
                    if let Some(wallet) = self.state.wallets.get_mut(&ctx.caller) {
                        wallet.join(payment)?;
                    }
                    return Err(e);
                }
                Ok(Outcome::Applied)
            }
            Operation::Unstake { validation, amount } => {
                let coin = self.state.store.validation_mut(validation)?.unstake(
                    ctx,
                    &mut self.state.pool,
                    amount,
                    sink,
                )?;
                let withdrawn = coin.value();
                self.state
                    .wallets
                    .entry(ctx.caller.clone())
                    .or_default()
                    .join(coin)?;
                Ok(Outcome::Withdrawn(withdrawn))
            }
            Operation::AddZkmlProof {
                validation,
                proof_hash,
                circuit_id,
                public_input_hash,
            } => {
                self.state
                    .store
                    .validation_mut(validation)?
                    .add_zkml_proof(ctx, proof_hash, circuit_id, public_input_hash, sink)?;
                Ok(Outcome::Applied)
            }
            Operation::AddTeeAttestation {
                validation,
                report_hash,
                provider,
            } => {
                self.state
                    .store
                    .validation_mut(validation)?
                    .add_tee_attestation(ctx, report_hash, provider, sink)?;
                Ok(Outcome::Applied)
            }
            Operation::GetValidationInfo { validation } => Ok(Outcome::Validation(
                self.state.store.validation(validation)?.clone(),
            )),
            Operation::GetValidationSummary { validation } => Ok(Outcome::ValidationSummary(
                self.state
                    .store
                    .validation(validation)?
                    .validation_summary(),
            )),
            Operation::GetStakeInfo { validation } => Ok(Outcome::StakeInfo(
                self.state
                    .store
                    .validation(validation)?
                    .stake_info()
                    .cloned(),
            )),
            Operation::GetZkmlProofs { validation } => Ok(Outcome::ZkmlProofs(
                self.state
                    .store
                    .validation(validation)?
                    .zkml_proofs()
                    .to_vec(),
            )),
            Operation::GetTeeAttestations { validation } => Ok(Outcome::TeeAttestations(
                self.state
                    .store
                    .validation(validation)?
                    .tee_attestations()
                    .to_vec(),
            )),
            Operation::GetStakePoolStats => Ok(Outcome::StakePoolStats(self.state.pool.stats())),
            Operation::HasValidationType {
                validation,
                validation_type,
            } => {
                let kind: ValidationType = validation_type.parse()?;
                Ok(Outcome::Flag(
                    self.state
                        .store
                        .validation(validation)?
                        .has_validation_type(kind),
                ))
            }
            Operation::GetValidationTypes { validation } => Ok(Outcome::ValidationTypes(
                self.state
                    .store
                    .validation(validation)?
                    .validation_types()
                    .to_vec(),
            )),
            Operation::IsValidated { validation } => Ok(Outcome::Flag(
                self.state.store.validation(validation)?.is_validated(),
            )),
            Operation::GetWalletBalance { address } => {
                Ok(Outcome::Balance(self.wallet_balance(&address)))
            }
        }
    }
}

fn owned_strings(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustledger_core::events::TracingSink;
    use trustledger_core::{LedgerEvent, ObjectId};

    fn ctx(caller: &str, epoch: u64) -> CallContext {
        CallContext::new(caller, epoch)
    }

    fn created(outcome: Outcome) -> ObjectId {
        match outcome {
            Outcome::Created(id) => id,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn register_requires_registry() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        let err = ledger
            .apply(
                &ctx("0xwallet", 1),
                Operation::RegisterAgent {
                    identity_ref: ObjectId::new(),
                    capabilities: vec![],
                    endpoints: vec![],
                    alias_name: None,
                    trust_model: Default::default(),
                    metadata_hash: String::new(),
                },
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::RegistryNotInitialized);
        assert!(ledger.sink().is_empty());
    }

    #[test]
    fn init_registry_only_once() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        ledger
            .apply(&ctx("0xop", 0), Operation::InitRegistry)
            .unwrap();
        assert_eq!(
            ledger.apply(&ctx("0xop", 0), Operation::InitRegistry),
            Err(LedgerError::RegistryAlreadyInitialized)
        );
        assert_eq!(ledger.sink().len(), 1);
    }

    #[test]
    fn stake_draws_from_wallet_and_unstake_refunds() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        let owner = ctx("0xowner", 1);
        let validation = created(
            ledger
                .apply(
                    &owner,
                    Operation::CreateValidation {
                        registration_ref: ObjectId::new(),
                        owner: Address::from("0xowner"),
                    },
                )
                .unwrap(),
        );

        ledger
            .apply(&owner, Operation::Fund { amount: 150 })
            .unwrap();
        ledger
            .apply(
                &owner,
                Operation::AddStake {
                    validation,
                    amount: 100,
                    expires_at: 0,
                },
            )
            .unwrap();
        assert_eq!(ledger.wallet_balance(&Address::from("0xowner")), 50);
        assert_eq!(ledger.pool().stats().total_staked, 100);

        let outcome = ledger
            .apply(
                &owner,
                Operation::Unstake {
                    validation,
                    amount: 40,
                },
            )
            .unwrap();
        assert_eq!(outcome, Outcome::Withdrawn(40));
        assert_eq!(ledger.wallet_balance(&Address::from("0xowner")), 90);
        assert_eq!(ledger.pool().stats().total_staked, 60);
    }

    #[test]
    fn rejected_stake_keeps_wallet_intact() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        let validation = created(
            ledger
                .apply(
                    &ctx("0xowner", 1),
                    Operation::CreateValidation {
                        registration_ref: ObjectId::new(),
                        owner: Address::from("0xowner"),
                    },
                )
                .unwrap(),
        );
        let intruder = ctx("0xintruder", 2);
        ledger
            .apply(&intruder, Operation::Fund { amount: 10 })
            .unwrap();

        let err = ledger
            .apply(
                &intruder,
                Operation::AddStake {
                    validation,
                    amount: 10,
                    expires_at: 0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
        assert_eq!(ledger.wallet_balance(&Address::from("0xintruder")), 10);
        assert_eq!(ledger.pool().stats().total_staked, 0);

        assert_eq!(
            ledger.apply(
                &intruder,
                Operation::AddStake {
                    validation,
                    amount: 11,
                    expires_at: 0,
                },
            ),
            Err(LedgerError::InsufficientFunds {
                requested: 11,
                available: 10
            })
        );
    }

    fn validation_owned_by(ledger: &mut Ledger<Vec<LedgerEvent>>, owner: &str) -> ObjectId {
        created(
            ledger
                .apply(
                    &ctx(owner, 1),
                    Operation::CreateValidation {
                        registration_ref: ObjectId::new(),
                        owner: Address::from(owner),
                    },
                )
                .unwrap(),
        )
    }

    #[test]
    fn funding_past_u64_max_is_rejected() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        ledger
            .apply(&ctx("0xwhale", 1), Operation::Fund { amount: u64::MAX })
            .unwrap();

        for caller in ["0xwhale", "0xminnow"] {
            assert_eq!(
                ledger.apply(&ctx(caller, 2), Operation::Fund { amount: 1 }),
                Err(LedgerError::ValueOverflow {
                    value: u64::MAX,
                    amount: 1
                })
            );
        }
        assert_eq!(ledger.wallet_balance(&Address::from("0xwhale")), u64::MAX);
        assert_eq!(ledger.wallet_balance(&Address::from("0xminnow")), 0);
        assert_eq!(ledger.state().supply, u64::MAX);
    }

    #[test]
    fn staking_the_whole_supply_keeps_pool_consistent() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        let big = validation_owned_by(&mut ledger, "0xa");
        let small = validation_owned_by(&mut ledger, "0xb");
        ledger
            .apply(&ctx("0xa", 1), Operation::Fund { amount: u64::MAX })
            .unwrap();
        ledger
            .apply(
                &ctx("0xa", 1),
                Operation::AddStake {
                    validation: big,
                    amount: u64::MAX,
                    expires_at: 0,
                },
            )
            .unwrap();

        // Nothing left to mint, so the second owner cannot pay.
        assert!(ledger
            .apply(&ctx("0xb", 2), Operation::Fund { amount: 1 })
            .is_err());
        assert_eq!(
            ledger.apply(
                &ctx("0xb", 2),
                Operation::AddStake {
                    validation: small,
                    amount: 1,
                    expires_at: 0,
                },
            ),
            Err(LedgerError::InsufficientFunds {
                requested: 1,
                available: 0
            })
        );
        assert_eq!(ledger.pool().stats().total_staked, u64::MAX);
        assert_eq!(ledger.pool().stats().balance, u64::MAX);
    }

    #[test]
    fn unfunded_stake_leaves_no_wallet_behind() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        let validation = validation_owned_by(&mut ledger, "0xowner");

        for _ in 0..3 {
            assert!(ledger
                .apply(
                    &ctx("0xowner", 2),
                    Operation::AddStake {
                        validation,
                        amount: 5,
                        expires_at: 0,
                    },
                )
                .is_err());
        }
        assert!(ledger.state().wallets.is_empty());
    }

    #[test]
    fn tracing_sink_drives_a_ledger() {
        let mut ledger = Ledger::new(TracingSink);
        ledger
            .apply(&ctx("0xop", 0), Operation::InitRegistry)
            .unwrap();
        assert_eq!(ledger.registry().map(|r| r.stats().next_agent_id), Some(1));
    }

    #[test]
    fn restore_resumes_saved_state() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        ledger
            .apply(&ctx("0xop", 0), Operation::InitRegistry)
            .unwrap();
        ledger
            .apply(&ctx("0xop", 0), Operation::Fund { amount: 9 })
            .unwrap();
        let (state, _) = ledger.into_parts();

        let raw = serde_json::to_string(&state).unwrap();
        let state: LedgerState = serde_json::from_str(&raw).unwrap();
        let mut resumed = Ledger::restore(state, Vec::<LedgerEvent>::new());

        assert_eq!(
            resumed.apply(&ctx("0xop", 1), Operation::InitRegistry),
            Err(LedgerError::RegistryAlreadyInitialized)
        );
        assert_eq!(resumed.wallet_balance(&Address::from("0xop")), 9);
        assert_eq!(resumed.state().supply, 9);
        assert!(resumed.sink().is_empty());
    }

    #[test]
    fn unknown_validation_type_is_an_error() {
        let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
        let validation = created(
            ledger
                .apply(
                    &ctx("0xowner", 1),
                    Operation::CreateValidation {
                        registration_ref: ObjectId::new(),
                        owner: Address::from("0xowner"),
                    },
                )
                .unwrap(),
        );
        assert_eq!(
            ledger.apply(
                &ctx("0xanyone", 1),
                Operation::HasValidationType {
                    validation,
                    validation_type: "kyc".to_string(),
                },
            ),
            Err(LedgerError::InvalidValidationType("kyc".to_string()))
        );
    }
}
