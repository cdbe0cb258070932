use thiserror::Error;

use crate::types::{Address, Epoch, ObjectId, RecordKind};

/// Every way a ledger operation can be rejected.
///
/// All variants are scoped to a single operation; a rejected operation leaves
/// every record it named untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unauthorized: caller {caller} is not the record authority {authority}")]
    Unauthorized { caller: Address, authority: Address },

    #[error("Invalid score {0}: must be between 1 and 10")]
    InvalidScore(u8),

    #[error("No rating with score {score} from reviewer {reviewer}")]
    RatingNotFound { reviewer: Address, score: u8 },

    #[error("No active stake")]
    NoActiveStake,

    #[error("Insufficient stake: requested {requested}, staked {available}")]
    InsufficientStake { requested: u64, available: u64 },

    #[error("Stake locked until epoch {expires_at} (current epoch {epoch})")]
    StakeLocked { expires_at: Epoch, epoch: Epoch },

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("Value overflow: {value} + {amount} exceeds the representable supply")]
    ValueOverflow { value: u64, amount: u64 },

    #[error("Unknown validation type: {0}")]
    InvalidValidationType(String),

    #[error("Record not found: {kind} {id}")]
    RecordNotFound { kind: RecordKind, id: ObjectId },

    #[error("Registry already initialized")]
    RegistryAlreadyInitialized,

    #[error("Registry not initialized")]
    RegistryNotInitialized,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
