//! BLAKE3 chain hashing for tamper evidence.
//!
//! Each entry hash covers the entry's sequence number, the previous entry's
//! hash, and the event itself, so editing, dropping, or reordering any entry
//! breaks every hash after it.

use serde::Serialize;
use trustledger_core::LedgerEvent;

/// `prev_hash` of the first entry in every journal.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Hashable representation of a journal entry (excludes `entry_hash`).
#[derive(Serialize)]
struct HashableEntry<'a> {
    sequence: u64,
    prev_hash: &'a str,
    event: &'a LedgerEvent,
}

/// Compute the hex-encoded BLAKE3 hash of a journal entry's content.
pub fn compute_entry_hash(sequence: u64, prev_hash: &str, event: &LedgerEvent) -> String {
    let hashable = HashableEntry {
        sequence,
        prev_hash,
        event,
    };

    let json = serde_json::to_vec(&hashable).expect("journal entry serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustledger_core::{CallContext, EventPayload, ObjectId};

    #[test]
    fn genesis_is_hex_of_blake3_length() {
        assert_eq!(GENESIS_HASH.len(), 64);
    }

    #[test]
    fn hash_depends_on_prev_hash() {
        let ctx = CallContext::new("0xowner", 1);
        let event = LedgerEvent::new(
            &ctx,
            EventPayload::RegistryInitialized {
                registry_id: ObjectId::new(),
            },
        );
        let a = compute_entry_hash(0, GENESIS_HASH, &event);
        let b = compute_entry_hash(0, &"f".repeat(64), &event);
        assert_ne!(a, b);
        assert_eq!(a, compute_entry_hash(0, GENESIS_HASH, &event));
    }

    #[test]
    fn hash_covers_event_content() {
        let ctx = CallContext::new("0xowner", 1);
        let identity_id = ObjectId::new();
        let event = |name: &str| {
            LedgerEvent::new(
                &ctx,
                EventPayload::IdentityCreated {
                    identity_id,
                    numeric_agent_id: 1,
                    owner: ctx.caller.clone(),
                    name: name.to_string(),
                },
            )
        };
        let a = compute_entry_hash(0, GENESIS_HASH, &event("alpha"));
        let b = compute_entry_hash(0, GENESIS_HASH, &event("beta"));
        assert_ne!(a, b);
        assert_ne!(a, blake3::hash(b"").to_hex().to_string());
    }
}
