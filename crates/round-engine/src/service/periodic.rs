//! Periodic Jobs (§4.13): four independent long-lived tickers, each
//! interacting with the rest of the system only through storage and the
//! wallet client.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::context::PoolContext;
use crate::error::Result;

use super::payout_engine::PayoutEngine;
use super::reward_engine::RewardEngine;

pub struct PeriodicJobs {
    ctx: Arc<PoolContext>,
}

impl PeriodicJobs {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    /// Spawns all three ticker tasks (the transaction-validation pass rides
    /// along with the reward+payout ticker, per §4.13) and returns their
    /// join handles so callers can await graceful shutdown.
    pub fn spawn_all(&self, shutdown: tokio::sync::watch::Receiver<bool>) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            tokio::spawn(reward_payout_ticker(self.ctx.clone(), shutdown.clone())),
            tokio::spawn(name_refresh_ticker(self.ctx.clone(), shutdown.clone())),
            tokio::spawn(db_cleanup_ticker(self.ctx.clone(), shutdown.clone())),
        ]
    }
}

/// Reward + payout ticker, plus the transaction-validation pass tied to the
/// same cadence (§4.13).
async fn reward_payout_ticker(ctx: Arc<PoolContext>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let reward_engine = RewardEngine::new(ctx.clone());
    let payout_engine = PayoutEngine::new(ctx.clone());
    let mut ticker = tokio::time::interval(Duration::from_secs(ctx.config.payout_ticker_interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = reward_engine.run_cycle().await {
                    warn!(error = %e, "reward engine cycle failed");
                }
                if let Err(e) = payout_engine.run_cycle().await {
                    warn!(error = %e, "payout engine cycle failed");
                }
                if let Err(e) = validate_pending_transactions(&ctx).await {
                    warn!(error = %e, "transaction validation pass failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("reward+payout ticker shutting down");
                    return;
                }
            }
        }
    }
}

/// For each unconfirmed `Transaction` row: confirm on success, delete if the
/// wallet reports it unknown, leave pending on any other error.
async fn validate_pending_transactions(ctx: &Arc<PoolContext>) -> Result<()> {
    let pending = ctx.with_storage(|s| s.pending_transactions()).await?;
    for tx in pending {
        let Some(tx_id) = tx.transaction_id else {
            continue;
        };
        match ctx.wallet.get_transaction(tx_id).await {
            Ok(Some(height)) => {
                let id = tx.id;
                ctx.with_storage(move |s| s.confirm_transaction(id, height)).await?;
            }
            Ok(None) => {
                let id = tx.id;
                ctx.with_storage(move |s| s.delete_transaction(id)).await?;
            }
            Err(e) => {
                warn!(transaction_id = tx_id, error = %e, "transaction validation lookup failed, left pending");
            }
        }
    }
    Ok(())
}

async fn name_refresh_ticker(ctx: Arc<PoolContext>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(ctx.config.name_refresh_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh_names(&ctx).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("name-refresh ticker shutting down");
                    return;
                }
            }
        }
    }
}

async fn refresh_names(ctx: &Arc<PoolContext>) {
    for miner in ctx.registry.snapshot() {
        let info = match ctx.wallet.get_account_info(miner.id).await {
            Ok(info) => info,
            Err(e) => {
                warn!(miner_id = miner.id, error = %e, "name refresh lookup failed");
                continue;
            }
        };
        if info.name == miner.name() {
            continue;
        }
        miner.set_name(info.name.clone());

        let id = miner.id;
        let name = info.name;
        let stored = ctx.with_storage(move |s| s.get_account(id)).await;
        if let Ok(Some(mut account)) = stored {
            account.name = name;
            let _ = ctx.with_storage(move |s| s.put_account(&account)).await;
        }
    }
}

async fn db_cleanup_ticker(ctx: Arc<PoolContext>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(ctx.config.db_cleanup_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_db_cleanup(&ctx).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("db-cleanup ticker shutting down");
                    return;
                }
            }
        }
    }
}

async fn run_db_cleanup(ctx: &Arc<PoolContext>) {
    let current_height = ctx.round_state.round().height;
    let cutoff = current_height.saturating_sub(ctx.config.block_retention_blocks);
    match ctx.with_storage(move |s| s.delete_blocks_older_than(cutoff)).await {
        Ok(deleted) => {
            if !deleted.is_empty() {
                info!(count = deleted.len(), cutoff, "db cleanup purged old block rows");
            }
        }
        Err(e) => warn!(error = %e, "db cleanup failed"),
    }

    let fee_account_id = ctx.config.fee_account_id;
    match ctx.with_storage(move |s| s.sweep_evicted_accounts(fee_account_id)).await {
        Ok(swept) => {
            if !swept.is_empty() {
                let stranded: i64 = swept.iter().map(|a| a.pending).sum();
                info!(count = swept.len(), stranded, "db cleanup purged orphaned accounts evicted from the registry");
            }
        }
        Err(e) => warn!(error = %e, "evicted-account sweep failed"),
    }
}
