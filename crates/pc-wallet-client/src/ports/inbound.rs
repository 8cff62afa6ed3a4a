//! Inbound port: the wallet operations the round engine depends on.
//!
//! Implemented by `WalletClient` (see `service.rs`) over any number of
//! `WalletTransport`s.

use async_trait::async_trait;
use shared_types::WalletError;
use std::collections::HashMap;

use crate::domain::types::{AccountInfo, BlockInfo, MiningInfo};

#[async_trait]
pub trait WalletPort: Send + Sync {
    /// Polls every configured wallet in parallel and returns the reply from
    /// whichever reports the greatest height, logging a warning for any
    /// wallet that lags behind.
    async fn get_mining_info(&self) -> Result<MiningInfo, WalletError>;

    /// Tries wallets in turn until one answers.
    async fn get_block_info(&self, height: u64) -> Result<BlockInfo, WalletError>;

    /// Submits a nonce to the first wallet that accepts it and returns the
    /// deadline the wallet computed, for the caller to cross-check against
    /// the deadline the pool computed itself.
    async fn submit_nonce(&self, nonce: u64, account_id: u64) -> Result<u64, WalletError>;

    async fn send_payment(&self, account_id: u64, amount_planck: i64) -> Result<u64, WalletError>;

    /// Batched payout (§4.9): up to 64 `(accountId, amount)` recipients in a
    /// single on-chain multi-out transaction.
    async fn send_payment_multi(&self, recipients: &[(u64, i64)]) -> Result<u64, WalletError>;

    async fn get_account_info(&self, account_id: u64) -> Result<AccountInfo, WalletError>;

    /// The accounts whose reward recipient currently points at
    /// `pool_account_id` (§4.3 step 3, §4.7 step 7).
    async fn get_reward_recipients(&self, pool_account_id: u64) -> Result<Vec<u64>, WalletError>;

    /// Confirms whether `height` was generated by `miner_id` using `nonce`,
    /// returning the block info alongside the verdict.
    async fn won_block(
        &self,
        height: u64,
        miner_id: u64,
        nonce: u64,
    ) -> Result<(bool, BlockInfo), WalletError>;

    /// The wall-clock seconds elapsed producing `height`, derived from the
    /// timestamps of `height` and `height - 1`.
    async fn get_generation_time(&self, height: u64) -> Result<i64, WalletError>;

    /// Incoming account-to-account messages addressed to the pool account
    /// since `since_timestamp` (wallet epoch seconds), keyed by sender.
    async fn get_incoming_msgs_since(
        &self,
        pool_account_id: u64,
        since_timestamp: i64,
    ) -> Result<HashMap<u64, String>, WalletError>;

    /// Confirms a pending outgoing payment: `Some(height)` once the
    /// transaction is included in a block, `None` if the wallet reports it
    /// unknown (dropped from the mempool and never confirmed).
    async fn get_transaction(&self, transaction_id: u64) -> Result<Option<u64>, WalletError>;
}
