//! Per-operation call context.
//!
//! The execution substrate authenticates the caller and supplies a logical
//! epoch. The ledger receives both explicitly and never invents them.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{Address, Epoch};

/// Who is invoking an operation, and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub epoch: Epoch,
}

impl CallContext {
    pub fn new(caller: impl Into<Address>, epoch: Epoch) -> Self {
        Self {
            caller: caller.into(),
            epoch,
        }
    }

    /// Capability check: the caller must be `authority`.
    pub fn require(&self, authority: &Address) -> Result<(), LedgerError> {
        if &self.caller == authority {
            return Ok(());
        }
        tracing::warn!(
            caller = %self.caller,
            authority = %authority,
            "Rejected unauthorized mutation"
        );
        Err(LedgerError::Unauthorized {
            caller: self.caller.clone(),
            authority: authority.clone(),
        })
    }
}
