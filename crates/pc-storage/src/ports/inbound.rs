//! Inbound port: the storage operations the round engine depends on.
//!
//! Implemented by `Repository` (see `service.rs`) over any `KeyValueStore`.
//! Kept synchronous, mirroring the underlying key-value contract; callers
//! from async tasks wrap calls in `tokio::task::spawn_blocking`.

use crate::domain::entities::{Account, Block, NonceSubmission, Transaction};
use shared_types::StorageError;

/// A per-miner reward credit computed by the reward engine.
#[derive(Debug, Clone, Copy)]
pub struct RewardCredit {
    pub miner_id: u64,
    pub amount: i64,
}

/// A payout line item: recipient account and the amount credited before the
/// pool tx fee is subtracted.
#[derive(Debug, Clone, Copy)]
pub struct PayoutCredit {
    pub account_id: u64,
    pub credited: i64,
}

pub trait StoragePort: Send + Sync {
    // -- Accounts -----------------------------------------------------
    fn get_account(&self, id: u64) -> Result<Option<Account>, StorageError>;
    fn put_account(&self, account: &Account) -> Result<(), StorageError>;

    /// Accounts eligible for payout per the three-way policy in the spec.
    fn payout_candidates(
        &self,
        minimum_payout: i64,
        pool_tx_fee: i64,
        now: i64,
    ) -> Result<Vec<Account>, StorageError>;

    /// Flags an account as evicted from the Miner Registry (inactivity),
    /// making it a candidate for the next DB-cleanup sweep.
    fn mark_account_evicted(&self, id: u64) -> Result<(), StorageError>;

    /// Deletes every account row flagged `evicted`, reassigning any
    /// stranded pending balance to `fee_account_id` first. An evicted
    /// account with a nonzero balance and no configured fee account is
    /// left in place for a later cycle rather than dropping the funds.
    fn sweep_evicted_accounts(&self, fee_account_id: Option<u64>) -> Result<Vec<Account>, StorageError>;

    // -- Blocks / rounds ------------------------------------------------
    fn get_block(&self, height: u64) -> Result<Option<Block>, StorageError>;
    fn put_block(&self, block: &Block) -> Result<(), StorageError>;

    /// Blocks whose height or wall-clock gates have passed and that are not
    /// yet winner-verified.
    fn unverified_blocks(
        &self,
        height_cutoff: u64,
        created_cutoff: i64,
    ) -> Result<Vec<Block>, StorageError>;

    /// Deletes block rows with `height < cutoff`, returning the deleted rows.
    fn delete_blocks_older_than(&self, cutoff: u64) -> Result<Vec<Block>, StorageError>;

    // -- Nonce submissions ----------------------------------------------
    fn get_nonce_submission(
        &self,
        miner_id: u64,
        height: u64,
    ) -> Result<Option<NonceSubmission>, StorageError>;
    fn upsert_nonce_submission(&self, submission: &NonceSubmission) -> Result<(), StorageError>;

    /// Atomic: credit each reward recipient's pending balance, mark the
    /// block row winner-verified with the given winner/reward, all-or-nothing.
    fn reward_block(
        &self,
        height: u64,
        winner_id: u64,
        total_reward: i64,
        credits: &[RewardCredit],
    ) -> Result<(), StorageError>;

    /// Marks a block winner-verified with no reward (we did not win, or no
    /// submission existed).
    fn mark_block_unverified_loss(&self, height: u64) -> Result<(), StorageError>;

    // -- Payouts ----------------------------------------------------------
    /// Atomic: zero pending for every credited account, roll forward
    /// `next_payout_date` per its `payout_interval`, and insert the
    /// resulting `Transaction` rows.
    fn apply_payout_batch(
        &self,
        credits: &[PayoutCredit],
        pool_tx_fee: i64,
        now: i64,
        wallet_tx_id: Option<u64>,
        block_height: Option<u64>,
    ) -> Result<Vec<Transaction>, StorageError>;

    fn pending_transactions(&self) -> Result<Vec<Transaction>, StorageError>;
    fn confirm_transaction(&self, id: u64, block_height: u64) -> Result<(), StorageError>;
    fn delete_transaction(&self, id: u64) -> Result<(), StorageError>;

    // -- Message-driven config -------------------------------------------
    /// Atomic: verify `pending >= fee`, apply the setting, decrement
    /// pending by `fee`, credit `fee` to the pool fee account.
    fn apply_config_message(
        &self,
        account_id: u64,
        fee_account_id: u64,
        fee: i64,
        apply: Box<dyn FnOnce(&mut Account) + Send>,
    ) -> Result<bool, StorageError>;
}
