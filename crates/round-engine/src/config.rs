//! Pool configuration: the round engine's slice of `config.yaml`.
//!
//! Field names and defaults mirror `validateConfig` in the reference
//! implementation's `config` package. `node-runtime` loads the full
//! `config.yaml` (this struct plus `pc-telemetry::TelemetryConfig` and the
//! gateway's listen address) and passes this sub-struct in.

use serde::Deserialize;

use crate::error::{Result, RoundEngineError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Account the pool signs wallet RPCs as.
    pub secret_phrase: String,
    /// Upstream wallet node base URLs, queried in parallel/fallover per §6.
    pub wallet_urls: Vec<String>,
    /// The pool's own account id (its reward-recipient identity).
    pub pool_public_id: u64,
    /// Account credited with `pool_fee_share` of every won block and every
    /// message-config fee.
    pub fee_account_id: Option<u64>,

    pub minimum_payout: i64,
    pub pool_fee_share: f64,
    pub winner_share: f64,
    pub tx_fee: i64,
    pub deadline_limit: u64,

    pub inactive_after_x_blocks: u64,
    pub block_height_payout_delay: u64,
    pub payout_delay_secs: i64,

    /// Cadence of the reward+payout ticker and, tied to it, the
    /// transaction-validation ticker (§4.13).
    pub payout_ticker_interval_secs: u64,
    pub name_refresh_interval_secs: u64,
    pub db_cleanup_interval_secs: u64,
    /// Block rows older than `CurrentHeight − this` are purged by the
    /// cleanup ticker.
    pub block_retention_blocks: u64,

    pub navg: usize,
    pub nmin: usize,
    /// Slow/fast block generation-time threshold, seconds.
    pub t_min: i64,

    pub allow_requests_per_second: u32,

    pub set_now_fee: i64,
    pub set_weekly_fee: i64,
    pub set_daily_fee: i64,
    pub set_min_payout_fee: i64,

    pub wallet_timeout_secs: u64,

    /// Switches the address-scoop layout; kept as a dormant knob (§9 open
    /// question). `u64::MAX` disables it.
    pub poc2_start_height: u64,

    pub pool_listen_address: String,
    pub pool_port: u16,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            secret_phrase: String::new(),
            wallet_urls: Vec::new(),
            pool_public_id: 0,
            fee_account_id: None,
            minimum_payout: 0,
            pool_fee_share: 0.0,
            winner_share: 0.0,
            tx_fee: 100_000_000,
            deadline_limit: 0,
            inactive_after_x_blocks: 0,
            block_height_payout_delay: 10,
            payout_delay_secs: 600,
            payout_ticker_interval_secs: 600,
            name_refresh_interval_secs: 43_200,
            db_cleanup_interval_secs: 86_400,
            block_retention_blocks: 5_000,
            navg: 360,
            nmin: 10,
            t_min: 0,
            allow_requests_per_second: 4,
            set_now_fee: 0,
            set_weekly_fee: 0,
            set_daily_fee: 0,
            set_min_payout_fee: 0,
            wallet_timeout_secs: 5,
            poc2_start_height: u64::MAX,
            pool_listen_address: "0.0.0.0".to_string(),
            pool_port: 8124,
        }
    }
}

impl PoolConfig {
    /// Mirrors `validateConfig`'s fatal checks (everything else there is
    /// either a default fill-in, already captured in `Default`, or not
    /// representable until `node-runtime` finishes loading the full
    /// `config.yaml`).
    pub fn validate(&self) -> Result<()> {
        if self.secret_phrase.is_empty() {
            return Err(RoundEngineError::InvalidConfig("secretPhrase can't be empty".into()));
        }
        if self.wallet_urls.is_empty() {
            return Err(RoundEngineError::InvalidConfig("no wallet urls defined in walletUrls".into()));
        }
        if self.pool_public_id == 0 {
            return Err(RoundEngineError::InvalidConfig("poolPublicId can't be empty".into()));
        }
        if self.pool_fee_share > 1.0 {
            return Err(RoundEngineError::InvalidConfig("poolFeeShare must be between 0.0 and 1.0".into()));
        }
        if self.fee_account_id.is_none() && self.pool_fee_share > 0.0 {
            return Err(RoundEngineError::InvalidConfig("feeAccountId can't be empty if poolFeeShare is over 0.0".into()));
        }
        if !(0.0..=1.0).contains(&self.winner_share) {
            return Err(RoundEngineError::InvalidConfig("winnerShare must be between 0.0 and 1.0".into()));
        }
        if self.inactive_after_x_blocks == 0 {
            return Err(RoundEngineError::InvalidConfig("inactiveAfterXBlocks must be bigger than 0".into()));
        }
        if self.pool_port == 0 {
            return Err(RoundEngineError::InvalidConfig("poolPort can't be empty or 0".into()));
        }
        if self.nmin >= self.navg {
            tracing::warn!(navg = self.navg, nmin = self.nmin, "nAvg should be bigger than nMin");
        }
        Ok(())
    }
}
