//! Persisted entities.
//!
//! These mirror the semantic schema: `account`, `block`, `nonce_submission`,
//! `transaction`. They are storage-layer rows; the round engine's in-memory
//! `Miner` aggregate is a cached projection built from `Account` plus the
//! rolling window and current-round best, which have no column here beyond
//! `nonce_submission`.

use serde::{Deserialize, Serialize};
use shared_types::PayoutInterval;

/// A pool account: durable fields behind the in-memory Miner aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub address: String,
    pub name: Option<String>,
    pub pending: i64,
    pub min_payout_value: Option<i64>,
    pub next_payout_date: Option<i64>,
    pub payout_interval: Option<PayoutInterval>,
    /// Set when the Miner Registry evicts this account for inactivity
    /// (§4.13's DB-cleanup ticker sweeps rows with this set).
    #[serde(default)]
    pub evicted: bool,
}

impl Account {
    pub fn new(id: u64, address: String) -> Self {
        Self {
            id,
            address,
            name: None,
            pending: 0,
            min_payout_value: None,
            next_payout_date: None,
            payout_interval: None,
            evicted: false,
        }
    }
}

/// A round: one row per height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub base_target: u64,
    pub scoop: u32,
    pub generation_signature: [u8; 32],
    /// Seconds since the previous block; unknown (`None`) until the next
    /// block arrives.
    pub generation_time: Option<u64>,
    /// Unix timestamp this row was created (round start).
    pub created: i64,
    pub best_nonce_submission_id: Option<u64>,
    pub winner_verified: bool,
    pub winner_id: Option<u64>,
    pub reward: Option<i64>,
}

impl Block {
    pub fn new(height: u64, base_target: u64, scoop: u32, generation_signature: [u8; 32], created: i64) -> Self {
        Self {
            height,
            base_target,
            scoop,
            generation_signature,
            generation_time: None,
            created,
            best_nonce_submission_id: None,
            winner_verified: false,
            winner_id: None,
            reward: None,
        }
    }
}

/// The best nonce a miner has reported for a given round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonceSubmission {
    pub miner_id: u64,
    pub block_height: u64,
    pub deadline: u64,
    pub nonce: u64,
}

/// A submission id, deterministically derived from the (miner, height) pair
/// since at most one submission exists per pair.
pub fn nonce_submission_id(miner_id: u64, block_height: u64) -> u64 {
    miner_id ^ block_height.rotate_left(32)
}

/// Inverts `nonce_submission_id`: XOR is self-inverse, so recovering the
/// miner id from an id/height pair needs no separate index.
pub fn miner_id_from_submission_id(submission_id: u64, block_height: u64) -> u64 {
    submission_id ^ block_height.rotate_left(32)
}

/// An outbound payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub amount: i64,
    pub recipient_id: Option<u64>,
    pub created: i64,
    pub transaction_id: Option<u64>,
    pub block_height: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_submission_id_is_stable() {
        assert_eq!(nonce_submission_id(7, 100), nonce_submission_id(7, 100));
    }

    #[test]
    fn submission_id_round_trips_the_miner_id() {
        let id = nonce_submission_id(7, 100);
        assert_eq!(miner_id_from_submission_id(id, 100), 7);
    }

    #[test]
    fn account_new_has_no_pending_balance() {
        let a = Account::new(1, "POOL-XXXX".to_string());
        assert_eq!(a.pending, 0);
        assert!(a.payout_interval.is_none());
    }
}
