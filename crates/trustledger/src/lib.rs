//! trustledger: Execution host for the agent trust ledger.
//!
//! Owns the object store, the registry and stake pool handles, and caller
//! wallets, and applies serialized `Call`s against the state transitions in
//! `trustledger-state`. Events flow to any `EventSink`; file-backed
//! deployments pair the hash-chained `Journal` with a state snapshot.

pub mod batch;
pub mod host;
pub mod ledger;
pub mod ops;
pub mod store;

pub use batch::{Batch, BatchError};
pub use host::{HostError, LedgerFiles};
pub use ledger::{Ledger, LedgerState};
pub use ops::{Call, Operation, Outcome};
pub use store::ObjectStore;
