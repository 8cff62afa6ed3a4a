//! Forging Loop (§4.5): selects the best candidate of the current round and
//! forwards it to the upstream wallet before its deadline expires.

use std::sync::Arc;
use std::time::Duration;

use shared_bus::{EventFilter, EventPublisher, EventSubscriber, EventTopic, PoolEvent};
use tracing::{info, warn};

use crate::context::PoolContext;
use crate::domain::BestSubmission;

const DEFAULT_SUBMIT_BEFORE_SECS: i64 = 30;
const NONCE_SUBMISSION_RETRIES: u32 = 3;

pub struct ForgingLoop {
    ctx: Arc<PoolContext>,
}

impl ForgingLoop {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    /// Runs until `shutdown` fires. Reprimes from storage at startup and on
    /// every round transition, mirroring the reference implementation.
    pub async fn run(&self, subscriber: &dyn EventSubscriber, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut best = self.reprime(self.ctx.round_state.round().height).await;
        let mut timer = self.delay_for(&best);

        let mut subscription = subscriber.subscribe(EventFilter::topics(vec![EventTopic::Submission, EventTopic::Round]));

        loop {
            tokio::select! {
                event = subscription.recv() => {
                    match event {
                        Some(PoolEvent::NonceSubmissionAccepted { miner_id, height, deadline, nonce }) => {
                            if let Some(candidate) = self.consider(&best, height, miner_id, deadline, nonce) {
                                best = candidate;
                                timer = self.delay_for(&best);
                                self.persist_best(&best).await;
                            }
                        }
                        Some(PoolEvent::NewRound { height, .. }) => {
                            best = self.reprime(height).await;
                            timer = self.delay_for(&best);
                        }
                        Some(_) => {}
                        None => return,
                    }
                }
                () = tokio::time::sleep(timer) => {
                    if best.miner_id != 0 {
                        self.submit(&best).await;
                    }
                    timer = Duration::from_secs(3600);
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("forging loop shutting down");
                        return;
                    }
                }
            }
        }
    }

    fn consider(&self, best: &BestSubmission, height: u64, miner_id: u64, deadline: u64, nonce: u64) -> Option<BestSubmission> {
        if height < best.height {
            return None;
        }
        if height == best.height && deadline >= best.deadline {
            return None;
        }
        Some(BestSubmission { height, miner_id, deadline, nonce })
    }

    fn delay_for(&self, best: &BestSubmission) -> Duration {
        if best.miner_id == 0 {
            return Duration::from_secs(3600);
        }
        let round = self.ctx.round_state.round();
        let now = now_unix();
        let elapsed = now - round.round_start;
        let fire_at = best.deadline as i64 - elapsed - DEFAULT_SUBMIT_BEFORE_SECS;
        Duration::from_secs(fire_at.max(0) as u64)
    }

    async fn persist_best(&self, best: &BestSubmission) {
        let height = best.height;
        let ctx = self.ctx.clone();
        self.ctx.round_state.set_best_submission(*best);
        if let Some(mut block) = ctx.with_storage(move |s| s.get_block(height)).await.ok().flatten() {
            let submission_id = pc_storage::domain::entities::nonce_submission_id(best.miner_id, height);
            block.best_nonce_submission_id = Some(submission_id);
            let ctx2 = ctx.clone();
            let _ = ctx2.with_storage(move |s| s.put_block(&block)).await;
        }
    }

    /// At startup and on every round transition: load the round's best-known
    /// submission from storage rather than trusting in-memory state alone.
    /// `best_nonce_submission_id` only identifies the row; the miner id is
    /// recovered from it via `miner_id_from_submission_id` (§4.5: "if the new
    /// round's best submission is known from storage, reprime").
    async fn reprime(&self, height: u64) -> BestSubmission {
        let ctx = self.ctx.clone();
        let block = match ctx.with_storage(move |s| s.get_block(height)).await {
            Ok(Some(block)) => block,
            _ => return BestSubmission::sentinel(height),
        };
        let Some(submission_id) = block.best_nonce_submission_id else {
            return BestSubmission::sentinel(height);
        };
        let miner_id = pc_storage::domain::entities::miner_id_from_submission_id(submission_id, height);
        let ctx = self.ctx.clone();
        match ctx.with_storage(move |s| s.get_nonce_submission(miner_id, height)).await {
            Ok(Some(submission)) => {
                BestSubmission { height, miner_id, deadline: submission.deadline, nonce: submission.nonce }
            }
            _ => BestSubmission::sentinel(height),
        }
    }

    async fn submit(&self, best: &BestSubmission) {
        for attempt in 1..=NONCE_SUBMISSION_RETRIES {
            match self.ctx.wallet.submit_nonce(best.nonce, best.miner_id).await {
                Ok(_) => {
                    self.ctx
                        .events
                        .publish(PoolEvent::NonceForwarded { height: best.height, deadline: best.deadline })
                        .await;
                    info!(height = best.height, miner_id = best.miner_id, deadline = best.deadline, "forwarded best nonce");
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "nonce submission to wallet failed");
                }
            }
        }
        warn!(height = best.height, miner_id = best.miner_id, "giving up forwarding nonce after exhausting retries");
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}
