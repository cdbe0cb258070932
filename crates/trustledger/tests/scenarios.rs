//! End-to-end scenarios driven through `Ledger::apply`.

use trustledger::{Call, Ledger, Operation, Outcome};
use trustledger_core::{Address, CallContext, LedgerError, LedgerEvent, ObjectId};
use trustledger_journal::{FileJournalStore, Journal, JournalStore};
use trustledger_state::{
    Capability, Endpoint, RegistryStats, ReputationStats, TrustModel, ValidationType,
};

fn ctx(caller: &str, epoch: u64) -> CallContext {
    CallContext::new(caller, epoch)
}

fn ok<S: trustledger_core::EventSink>(
    ledger: &mut Ledger<S>,
    caller: &str,
    epoch: u64,
    op: Operation,
) -> Outcome {
    ledger
        .apply(&ctx(caller, epoch), op)
        .unwrap_or_else(|e| panic!("operation failed: {e}"))
}

fn created(outcome: Outcome) -> ObjectId {
    match outcome {
        Outcome::Created(id) => id,
        other => panic!("expected Created, got {other:?}"),
    }
}

fn register<S: trustledger_core::EventSink>(ledger: &mut Ledger<S>, wallet: &str) -> ObjectId {
    let identity = created(ok(
        ledger,
        wallet,
        1,
        Operation::CreateIdentity {
            numeric_agent_id: 7,
            name: "planner".to_string(),
            description: "route planning agent".to_string(),
            content_uri: "ipfs://planner".to_string(),
        },
    ));
    created(ok(
        ledger,
        wallet,
        1,
        Operation::RegisterAgent {
            identity_ref: identity,
            capabilities: vec![Capability::new("plan", "plans routes", "tool", "1.0")],
            endpoints: vec![Endpoint {
                protocol: "mcp".to_string(),
                url: "https://planner.example/mcp".to_string(),
                description: "MCP server".to_string(),
                supports_validation: false,
                validation_type: None,
            }],
            alias_name: None,
            trust_model: TrustModel {
                supports_reputation: true,
                ..Default::default()
            },
            metadata_hash: "h0".to_string(),
        },
    ))
}

fn reputation_stats<S: trustledger_core::EventSink>(
    ledger: &mut Ledger<S>,
    reputation: ObjectId,
) -> ReputationStats {
    match ok(
        ledger,
        "0xanyone",
        9,
        Operation::GetReputationStats { reputation },
    ) {
        Outcome::ReputationStats(stats) => stats,
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn flag<S: trustledger_core::EventSink>(ledger: &mut Ledger<S>, op: Operation) -> bool {
    match ok(ledger, "0xanyone", 9, op) {
        Outcome::Flag(b) => b,
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn types<S: trustledger_core::EventSink>(
    ledger: &mut Ledger<S>,
    validation: ObjectId,
) -> Vec<ValidationType> {
    match ok(
        ledger,
        "0xanyone",
        9,
        Operation::GetValidationTypes { validation },
    ) {
        Outcome::ValidationTypes(t) => t,
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn registry_and_reputation_flow() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    ok(&mut ledger, "0xop", 0, Operation::InitRegistry);
    assert_eq!(
        ok(&mut ledger, "0xop", 0, Operation::GetRegistryStats),
        Outcome::RegistryStats(RegistryStats {
            next_agent_id: 1,
            total_agents: 0
        })
    );

    let registration = register(&mut ledger, "0xwallet");
    let reputation = created(ok(
        &mut ledger,
        "0xanyone",
        2,
        Operation::CreateReputation {
            registration_ref: registration,
            owner: Address::from("0xwallet"),
        },
    ));

    ok(
        &mut ledger,
        "0xreviewer",
        3,
        Operation::AddRating {
            reputation,
            score: 8,
            comment: None,
            category: "performance".to_string(),
        },
    );
    assert_eq!(
        reputation_stats(&mut ledger, reputation),
        ReputationStats {
            total_ratings: 1,
            total_score: 8,
            average_score: 800,
            version: 2
        }
    );

    ok(
        &mut ledger,
        "0xreviewer",
        4,
        Operation::AddRating {
            reputation,
            score: 6,
            comment: None,
            category: "performance".to_string(),
        },
    );
    assert_eq!(
        reputation_stats(&mut ledger, reputation),
        ReputationStats {
            total_ratings: 2,
            total_score: 14,
            average_score: 700,
            version: 3
        }
    );
    assert_eq!(
        ok(
            &mut ledger,
            "0xanyone",
            5,
            Operation::GetCategoryScore {
                reputation,
                category: "performance".to_string()
            }
        ),
        Outcome::CategoryScore(Some(6))
    );
    assert_eq!(
        ok(
            &mut ledger,
            "0xanyone",
            5,
            Operation::GetAverageScore { reputation }
        ),
        Outcome::AverageScore {
            whole: 7,
            hundredths: 0
        }
    );
}

#[test]
fn invalid_scores_leave_reputation_untouched() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let reputation = created(ok(
        &mut ledger,
        "0xanyone",
        1,
        Operation::CreateReputation {
            registration_ref: ObjectId::new(),
            owner: Address::from("0xwallet"),
        },
    ));
    let before = reputation_stats(&mut ledger, reputation);
    let events_before = ledger.sink().len();

    for score in [0u8, 11] {
        let err = ledger
            .apply(
                &ctx("0xreviewer", 2),
                Operation::AddRating {
                    reputation,
                    score,
                    comment: None,
                    category: "accuracy".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidScore(score));
    }

    assert_eq!(reputation_stats(&mut ledger, reputation), before);
    assert_eq!(ledger.sink().len(), events_before);
}

#[test]
fn validation_evidence_flow() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let validation = created(ok(
        &mut ledger,
        "0xowner",
        1,
        Operation::CreateValidation {
            registration_ref: ObjectId::new(),
            owner: Address::from("0xowner"),
        },
    ));
    assert!(!flag(&mut ledger, Operation::IsValidated { validation }));

    ok(
        &mut ledger,
        "0xowner",
        2,
        Operation::AddZkmlProof {
            validation,
            proof_hash: "proof".to_string(),
            circuit_id: "circuit".to_string(),
            public_input_hash: "inputs".to_string(),
        },
    );
    assert!(flag(&mut ledger, Operation::IsValidated { validation }));
    assert_eq!(types(&mut ledger, validation), vec![ValidationType::Zkml]);

    ok(&mut ledger, "0xowner", 3, Operation::Fund { amount: 100 });
    ok(
        &mut ledger,
        "0xowner",
        3,
        Operation::AddStake {
            validation,
            amount: 100,
            expires_at: 0,
        },
    );
    assert_eq!(
        types(&mut ledger, validation),
        vec![ValidationType::Zkml, ValidationType::Stake]
    );

    assert_eq!(
        ok(
            &mut ledger,
            "0xowner",
            3,
            Operation::Unstake {
                validation,
                amount: 100
            }
        ),
        Outcome::Withdrawn(100)
    );
    assert_eq!(types(&mut ledger, validation), vec![ValidationType::Zkml]);
    assert!(flag(&mut ledger, Operation::IsValidated { validation }));
    assert_eq!(
        ok(
            &mut ledger,
            "0xowner",
            4,
            Operation::GetStakeInfo { validation }
        ),
        Outcome::StakeInfo(None)
    );
    assert_eq!(ledger.wallet_balance(&Address::from("0xowner")), 100);
}

#[test]
fn locked_stake_cannot_be_withdrawn_early() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let validation = created(ok(
        &mut ledger,
        "0xowner",
        1,
        Operation::CreateValidation {
            registration_ref: ObjectId::new(),
            owner: Address::from("0xowner"),
        },
    ));
    ok(&mut ledger, "0xowner", 1, Operation::Fund { amount: 50 });
    ok(
        &mut ledger,
        "0xowner",
        1,
        Operation::AddStake {
            validation,
            amount: 50,
            expires_at: 10,
        },
    );

    assert_eq!(
        ledger.apply(
            &ctx("0xowner", 9),
            Operation::Unstake {
                validation,
                amount: 10
            }
        ),
        Err(LedgerError::StakeLocked {
            expires_at: 10,
            epoch: 9
        })
    );
    assert_eq!(
        ok(
            &mut ledger,
            "0xowner",
            10,
            Operation::Unstake {
                validation,
                amount: 10
            }
        ),
        Outcome::Withdrawn(10)
    );
}

#[test]
fn unauthorized_registration_update_keeps_version() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    ok(&mut ledger, "0xop", 0, Operation::InitRegistry);
    let registration = register(&mut ledger, "0xwallet");

    let err = ledger
        .apply(
            &ctx("0xmallory", 2),
            Operation::UpdateRegistration {
                registration,
                capabilities: Some(vec![]),
                endpoints: None,
                alias_name: Some("hijacked".to_string()),
                trust_model: None,
                metadata_hash: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { .. }));

    let record = ledger.store().registration(registration).unwrap();
    assert_eq!(record.version(), 1);
    assert_eq!(record.alias_name(), None);
    assert!(flag(
        &mut ledger,
        Operation::HasCapability {
            registration,
            name: "plan".to_string()
        }
    ));
}

#[test]
fn history_keeps_latest_hundred() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let reputation = created(ok(
        &mut ledger,
        "0xanyone",
        1,
        Operation::CreateReputation {
            registration_ref: ObjectId::new(),
            owner: Address::from("0xwallet"),
        },
    ));

    for i in 0..101u64 {
        ok(
            &mut ledger,
            &format!("0xreviewer{i}"),
            i,
            Operation::AddRating {
                reputation,
                score: 5,
                comment: None,
                category: "speed".to_string(),
            },
        );
    }

    let history = match ok(
        &mut ledger,
        "0xanyone",
        200,
        Operation::GetRatingsHistory { reputation },
    ) {
        Outcome::Ratings(r) => r,
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(history.len(), 100);
    assert!(history
        .iter()
        .all(|r| r.reviewer != Address::from("0xreviewer0")));
    assert_eq!(history[0].reviewer, Address::from("0xreviewer1"));
    assert_eq!(reputation_stats(&mut ledger, reputation).total_ratings, 101);
}

#[test]
fn pool_total_matches_active_stakes() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let owners = ["0xa", "0xb", "0xc"];
    let validations: Vec<ObjectId> = owners
        .iter()
        .map(|owner| {
            ok(&mut ledger, owner, 0, Operation::Fund { amount: 1_000 });
            created(ok(
                &mut ledger,
                owner,
                0,
                Operation::CreateValidation {
                    registration_ref: ObjectId::new(),
                    owner: Address::from(*owner),
                },
            ))
        })
        .collect();

    let steps: Vec<(usize, Operation)> = vec![
        (
            0,
            Operation::AddStake {
                validation: validations[0],
                amount: 300,
                expires_at: 0,
            },
        ),
        (
            1,
            Operation::AddStake {
                validation: validations[1],
                amount: 200,
                expires_at: 0,
            },
        ),
        (
            0,
            Operation::Unstake {
                validation: validations[0],
                amount: 120,
            },
        ),
        (
            2,
            Operation::AddStake {
                validation: validations[2],
                amount: 50,
                expires_at: 0,
            },
        ),
        (
            1,
            Operation::Unstake {
                validation: validations[1],
                amount: 200,
            },
        ),
        (
            1,
            Operation::AddStake {
                validation: validations[1],
                amount: 75,
                expires_at: 0,
            },
        ),
        (
            2,
            Operation::Unstake {
                validation: validations[2],
                amount: 1,
            },
        ),
    ];

    for (who, op) in steps {
        ok(&mut ledger, owners[who], 1, op);
        let active: u64 = ledger
            .store()
            .validations()
            .filter_map(|v| v.stake_info())
            .map(|s| s.amount)
            .sum();
        let stats = ledger.pool().stats();
        assert_eq!(stats.total_staked, active);
        assert_eq!(stats.balance, active);
    }

    let wallets: u64 = owners
        .iter()
        .map(|o| ledger.wallet_balance(&Address::from(*o)))
        .sum();
    assert_eq!(wallets + ledger.pool().stats().total_staked, 3_000);
}

#[test]
fn reads_are_idempotent() {
    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let reputation = created(ok(
        &mut ledger,
        "0xanyone",
        1,
        Operation::CreateReputation {
            registration_ref: ObjectId::new(),
            owner: Address::from("0xwallet"),
        },
    ));
    ok(
        &mut ledger,
        "0xreviewer",
        2,
        Operation::AddRating {
            reputation,
            score: 9,
            comment: Some("fast".to_string()),
            category: "speed".to_string(),
        },
    );
    let events = ledger.sink().len();

    let first = reputation_stats(&mut ledger, reputation);
    let second = reputation_stats(&mut ledger, reputation);
    assert_eq!(first, second);
    assert_eq!(ledger.sink().len(), events);
}

#[test]
fn batch_continues_after_failure() {
    let json = r#"[
        {"caller": "0xop", "epoch": 0, "op": "init_registry"},
        {"caller": "0xop", "epoch": 0, "op": "init_registry"},
        {"caller": "0xop", "epoch": 1, "op": "get_registry_stats"}
    ]"#;
    let calls: Vec<Call> = serde_json::from_str(json).unwrap();

    let mut ledger = Ledger::new(Vec::<LedgerEvent>::new());
    let results = ledger.apply_all(calls);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert_eq!(results[1], Err(LedgerError::RegistryAlreadyInitialized));
    assert_eq!(
        results[2],
        Ok(Outcome::RegistryStats(RegistryStats {
            next_agent_id: 1,
            total_agents: 0
        }))
    );
    assert_eq!(ledger.sink().len(), 1);
}

#[test]
fn journal_survives_round_trip_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileJournalStore::new(dir.path().join("ledger.jsonl"));

    let mut ledger = Ledger::new(Journal::new());
    ok(&mut ledger, "0xop", 0, Operation::InitRegistry);
    register(&mut ledger, "0xwallet");
    let _ = ledger.apply(&ctx("0xop", 2), Operation::InitRegistry);

    let journal = ledger.into_sink();
    // init, identity, registration
    assert_eq!(journal.len(), 3);
    store.append(journal.entries()).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.head(), journal.head());

    // A second run continues the same chain.
    let mut ledger = Ledger::new(loaded);
    ok(&mut ledger, "0xop", 3, Operation::InitRegistry);
    let journal = ledger.into_sink();
    store.append(&journal.entries()[3..]).unwrap();
    assert_eq!(store.load().unwrap().len(), 4);
}
