//! trustledger-core: Shared types, events, configuration, and error handling
//! for the agent trust ledger.
//!
//! This crate provides the foundational pieces used by every ledger component:
//! - Opaque identities (`Address`) and record identifiers (`ObjectId`)
//! - The per-operation call context (caller + logical epoch)
//! - The fungible `Coin` used for staking
//! - Change notifications and the `EventSink` they are delivered to
//! - Configuration management
//! - The ledger error taxonomy

pub mod coin;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod types;

pub use coin::Coin;
pub use context::CallContext;
pub use error::{LedgerError, Result};
pub use events::{EventPayload, EventSink, LedgerEvent};
pub use types::{Address, Epoch, ObjectId, RecordKind};
