//! Reward Engine (§4.8): verifies which of our candidate blocks were
//! actually won and splits the reward across contributing miners.

use std::collections::HashMap;
use std::sync::Arc;

use pc_storage::ports::inbound::RewardCredit;
use shared_bus::{EventPublisher, PoolEvent};
use tracing::{info, warn};

use crate::context::PoolContext;
use crate::domain::{split_reward, Miner};
use crate::error::Result;

use super::message_config::MessageConfigService;

pub struct RewardEngine {
    ctx: Arc<PoolContext>,
    message_config: MessageConfigService,
}

impl RewardEngine {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        let message_config = MessageConfigService::new(ctx.clone());
        Self { ctx, message_config }
    }

    /// One reward-engine cycle (§4.8): message-driven config first (runs
    /// even when no block is won), then the two confirmation gates.
    pub async fn run_cycle(&self) -> Result<()> {
        self.ctx.metrics.reward_engine_cycles.inc();

        let now = now_unix();
        let height_cutoff = self.ctx.round_state.round().height.saturating_sub(self.ctx.config.block_height_payout_delay);
        let created_cutoff = now - self.ctx.config.payout_delay_secs;

        if let Some(earliest_created) = self.earliest_unverified_created(height_cutoff, created_cutoff).await? {
            if let Err(e) = self.message_config.apply_since(earliest_created - 30).await {
                warn!(error = %e, "message-driven config pass failed this cycle");
            }
        }

        let blocks = self
            .ctx
            .with_storage(move |s| s.unverified_blocks(height_cutoff, created_cutoff))
            .await?;

        for block in blocks {
            if let Err(e) = self.verify_block(block.height).await {
                warn!(height = block.height, error = %e, "reward verification failed, retrying next cycle");
            }
        }
        Ok(())
    }

    async fn earliest_unverified_created(&self, height_cutoff: u64, created_cutoff: i64) -> Result<Option<i64>> {
        let blocks = self.ctx.with_storage(move |s| s.unverified_blocks(height_cutoff, created_cutoff)).await?;
        Ok(blocks.iter().map(|b| b.created).min())
    }

    async fn verify_block(&self, height: u64) -> Result<()> {
        let Some(block) = self.ctx.with_storage(move |s| s.get_block(height)).await? else {
            return Ok(());
        };
        let Some(submission_id) = block.best_nonce_submission_id else {
            self.ctx.with_storage(move |s| s.mark_block_unverified_loss(height)).await?;
            self.ctx.events.publish(PoolEvent::BlockLost { height }).await;
            return Ok(());
        };

        let Some(best) = self.best_submission_for(height, submission_id).await? else {
            self.ctx.with_storage(move |s| s.mark_block_unverified_loss(height)).await?;
            self.ctx.events.publish(PoolEvent::BlockLost { height }).await;
            return Ok(());
        };

        // Decided open question: both the generator and the nonce must
        // match our best submission to count the block as won.
        let (won, chain_block) = self.ctx.wallet.won_block(height, best.miner_id, best.nonce).await?;
        if !won {
            self.ctx.with_storage(move |s| s.mark_block_unverified_loss(height)).await?;
            self.ctx.metrics.blocks_lost.inc();
            self.ctx.events.publish(PoolEvent::BlockLost { height }).await;
            return Ok(());
        }

        self.reward_block(height, &best, &chain_block).await
    }

    /// The round's best submission, recovered from the block row's
    /// `best_nonce_submission_id` the same way `ForgingLoop::reprime` does:
    /// by the time the reward engine runs (after `block_height_payout_delay`
    /// and `payout_delay_secs` have elapsed), every actively-mining miner's
    /// `current_height()` has long since moved past `height`, so scanning
    /// the registry for a live match never finds anything — the submission
    /// must be read back from storage by its recovered miner id.
    async fn best_submission_for(&self, height: u64, submission_id: u64) -> Result<Option<BestKnown>> {
        let miner_id = pc_storage::domain::entities::miner_id_from_submission_id(submission_id, height);
        let submission = self.ctx.with_storage(move |s| s.get_nonce_submission(miner_id, height)).await?;
        Ok(submission.map(|sub| BestKnown { miner_id, nonce: sub.nonce, deadline: sub.deadline }))
    }

    async fn reward_block(&self, height: u64, best: &BestKnown, chain_block: &pc_wallet_client::BlockInfo) -> Result<()> {
        let share_of = self.compute_shares();
        let split = split_reward(
            chain_block.block_reward,
            chain_block.total_fee_nqt,
            self.ctx.config.pool_fee_share,
            self.ctx.config.winner_share,
            best.miner_id,
            self.ctx.config.fee_account_id,
            &share_of,
        );

        let credits: Vec<RewardCredit> =
            split.credits.iter().map(|(&miner_id, &amount)| RewardCredit { miner_id, amount }).collect();
        let credits_for_storage = credits.clone();
        self.ctx
            .with_storage(move |s| s.reward_block(height, best.miner_id, split.total_reward, &credits_for_storage))
            .await?;

        for credit in &credits {
            if let Some(miner) = self.ctx.registry.get(credit.miner_id) {
                miner.credit_pending(credit.amount);
            }
        }

        self.ctx.metrics.blocks_won.inc();
        self.ctx
            .events
            .publish(PoolEvent::BlockWon { height, winner_id: best.miner_id, reward: split.total_reward })
            .await;
        info!(height, winner_id = best.miner_id, reward = split.total_reward, "block won, reward distributed");
        Ok(())
    }

    /// Each active miner's EEPS share of the sum of all active EEPSes
    /// (§4.11's normalised share, fed into `split_reward`).
    fn compute_shares(&self) -> HashMap<u64, f64> {
        let miners = self.ctx.registry.snapshot();
        let eepses: Vec<(u64, f64)> =
            miners.iter().map(|m: &Arc<Miner>| (m.id, m.calculate_eeps(&self.ctx.alphas))).filter(|(_, e)| *e > 0.0).collect();
        let total: f64 = eepses.iter().map(|(_, e)| e).sum();
        if total <= 0.0 {
            return HashMap::new();
        }
        eepses.into_iter().map(|(id, e)| (id, e / total)).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct BestKnown {
    miner_id: u64,
    nonce: u64,
    #[allow(dead_code)]
    deadline: u64,
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}
