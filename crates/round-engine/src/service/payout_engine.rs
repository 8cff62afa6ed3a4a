//! Payout Engine (§4.9): batches eligible accounts into multi-out wallet
//! transactions and records the resulting ledger rows atomically.

use std::sync::Arc;

use pc_storage::ports::inbound::PayoutCredit;
use shared_bus::{EventPublisher, PoolEvent};
use tracing::{info, warn};

use crate::context::PoolContext;
use crate::error::Result;

/// Upper bound on recipients per on-chain multi-out transaction (§4.9).
const MAX_BATCH_SIZE: usize = 64;

pub struct PayoutEngine {
    ctx: Arc<PoolContext>,
}

impl PayoutEngine {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    /// One payout-engine cycle: selects candidates, splits into batches of
    /// at most `MAX_BATCH_SIZE`, and sends each batch independently so one
    /// wallet failure doesn't block the rest.
    pub async fn run_cycle(&self) -> Result<()> {
        let now = now_unix();
        let minimum_payout = self.ctx.config.minimum_payout;
        let pool_tx_fee = self.ctx.config.tx_fee;

        let candidates = self.ctx.with_storage(move |s| s.payout_candidates(minimum_payout, pool_tx_fee, now)).await?;
        if candidates.is_empty() {
            return Ok(());
        }

        for batch in candidates.chunks(MAX_BATCH_SIZE) {
            if let Err(e) = self.send_batch(batch, now).await {
                warn!(error = %e, batch_size = batch.len(), "payout batch failed, retrying next cycle");
            }
        }
        Ok(())
    }

    async fn send_batch(&self, batch: &[pc_storage::Account], now: i64) -> Result<()> {
        let pool_tx_fee = self.ctx.config.tx_fee;
        // The wallet transfers `pending - fee`, matching the amount
        // `apply_payout_batch` records in the Transaction row (§4.9 step
        // iii); `pending` itself is still fully cleared below.
        let recipients: Vec<(u64, i64)> = batch.iter().map(|a| (a.id, a.pending - pool_tx_fee)).collect();

        let wallet_tx_id = if recipients.len() == 1 {
            self.ctx.wallet.send_payment(recipients[0].0, recipients[0].1).await?
        } else {
            self.ctx.wallet.send_payment_multi(&recipients).await?
        };

        let credits: Vec<PayoutCredit> =
            batch.iter().map(|a| PayoutCredit { account_id: a.id, credited: a.pending }).collect();
        let total: i64 = credits.iter().map(|c| c.credited).sum();
        let recipient_count = credits.len();

        self.ctx
            .with_storage(move |s| s.apply_payout_batch(&credits, pool_tx_fee, now, Some(wallet_tx_id), None))
            .await?;

        for account in batch {
            if let Some(miner) = self.ctx.registry.get(account.id) {
                miner.set_pending(0);
            }
        }

        self.ctx.metrics.payouts_sent.inc();
        self.ctx.metrics.payout_amount_planck.inc_by(total as f64);
        self.ctx.events.publish(PoolEvent::PayoutSent { recipient_count, total }).await;
        info!(recipient_count, total, wallet_tx_id, "payout batch sent");
        Ok(())
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}
