//! Block Poller (§4.6) and New-block commit (§4.7).
//!
//! `commit_block` is shared between the 1 Hz tip-advance poller and the
//! submission pipeline's out-of-order synthesis path (§4.4, "height unknown
//! to cache"): both need the same slow/fast classification logic, only the
//! poller ever flips the published `RoundState`.

use std::sync::Arc;
use std::time::Duration;

use pc_deadline_kernel::calc_scoop;
use pc_storage::Block;
use shared_bus::{EventPublisher, PoolEvent};
use tracing::{info, warn};

use crate::context::PoolContext;
use crate::domain::RoundInfo;
use crate::error::Result;

const FALLBACK_GENERATION_TIME_SECS: i64 = 240;

pub struct BlockPoller {
    ctx: Arc<PoolContext>,
}

impl BlockPoller {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    /// Runs the 1 Hz loop until `shutdown` fires.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        if e.is_recoverable() {
                            warn!(error = %e, "block poller tick failed, retrying next tick");
                        } else {
                            warn!(error = %e, "block poller tick failed with a non-recoverable error");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("block poller shutting down");
                        return;
                    }
                }
            }
        }
    }

    async fn poll_once(&self) -> Result<()> {
        let info = self.ctx.wallet.get_mining_info().await?;
        let current = self.ctx.round_state.round();
        if info.height > current.height {
            commit_block(&self.ctx, info.height, info.base_target, info.generation_signature, true).await?;
        }
        Ok(())
    }
}

/// §4.7 steps 1-8. When `is_tip` is false (out-of-order historical insert,
/// §4.4) step 8 (publishing the active `RoundState`) is skipped.
pub async fn commit_block(
    ctx: &Arc<PoolContext>,
    height: u64,
    base_target: u64,
    gen_sig: shared_types::GenerationSignature,
    is_tip: bool,
) -> Result<()> {
    let scoop = calc_scoop(height, &gen_sig);

    if height > 0 {
        let prev_height = height - 1;
        let generation_time = ctx
            .wallet
            .get_generation_time(prev_height)
            .await
            .unwrap_or(FALLBACK_GENERATION_TIME_SECS);

        let prev_block = ctx.with_storage(move |s| s.get_block(prev_height)).await?;
        if let Some(mut block) = prev_block {
            block.generation_time = Some(generation_time.max(0) as u64);
            let to_store = block.clone();
            ctx.with_storage(move |s| s.put_block(&to_store)).await?;
        }

        let evicted = ctx.window_cache.add(prev_height, generation_time);
        let evicted_height = if evicted == 0 { None } else { Some(evicted) };

        let inactive_after = ctx.config.inactive_after_x_blocks;
        for miner in ctx.registry.snapshot() {
            let (was_slow, known) = ctx.window_cache.was_slow_block(miner.current_height());
            let should_evict = miner.on_new_block(known && was_slow, evicted_height, height, inactive_after);
            if should_evict {
                ctx.registry.remove(miner.id);
                let id = miner.id;
                let ctx2 = ctx.clone();
                if let Err(e) = ctx2.with_storage(move |s| s.mark_account_evicted(id)).await {
                    warn!(miner_id = id, error = %e, "failed to flag evicted account for db cleanup");
                }
            }
        }
    }

    let now = now_unix();
    let block = Block::new(height, base_target, scoop, gen_sig.0, now);
    ctx.with_storage(move |s| s.put_block(&block)).await?;

    match ctx.wallet.get_reward_recipients(ctx.config.pool_public_id).await {
        Ok(ids) => ctx.reward_recipients.replace_all(ids),
        Err(e) => warn!(error = %e, "reward recipient refresh failed, keeping stale cache"),
    }

    if is_tip {
        let round = RoundInfo { height, base_target, scoop, generation_signature: gen_sig, round_start: now };
        ctx.round_state.publish_round(round);
        ctx.metrics.current_round_height.set(height as f64);
        ctx.events.publish(PoolEvent::NewRound { height, base_target, scoop }).await;
        info!(height, base_target, scoop, "new round committed");
    }

    Ok(())
}

/// Out-of-order historical insert (§4.4): backfills the window-cache
/// classification for `height` using its own generation time, without
/// touching the published round.
pub async fn ensure_block_known(ctx: &Arc<PoolContext>, height: u64) -> Result<()> {
    if ctx.window_cache.was_slow_block(height).1 {
        return Ok(());
    }
    let generation_time = match ctx.with_storage(move |s| s.get_block(height)).await? {
        Some(block) if block.generation_time.is_some() => block.generation_time.unwrap() as i64,
        _ => ctx.wallet.get_generation_time(height).await.unwrap_or(FALLBACK_GENERATION_TIME_SECS),
    };
    ctx.window_cache.add(height, generation_time);
    Ok(())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}
