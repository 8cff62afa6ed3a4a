//! Submission Pipeline (§4.3) and the write path it drives, §4.4's
//! `UpdateOrCreateNonceSubmission` policy table.

use std::collections::HashMap;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use pc_address_codec as address_codec;
use pc_deadline_kernel::DeadlineRequest;
use pc_storage::NonceSubmission;
use serde::Serialize;
use shared_bus::{EventPublisher, PoolEvent};
use tracing::{debug, warn};

use crate::context::PoolContext;
use crate::domain::miner::SubmissionOutcome;
use crate::domain::Miner;
use crate::error::{Result, RoundEngineError, WireErrorCode};

use super::block_poller::ensure_block_known;

/// `requestType` the ingress endpoint was invoked with; doubles as the rate
/// limiter key alongside the remote IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    GetMiningInfo,
    SubmitNonce,
}

impl RequestKind {
    fn label(self) -> &'static str {
        match self {
            Self::GetMiningInfo => "getMiningInfo",
            Self::SubmitNonce => "submitNonce",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MiningInfoReply {
    #[serde(rename = "baseTarget")]
    pub base_target: u64,
    #[serde(rename = "generationSignature")]
    pub generation_signature: String,
    pub height: u64,
    #[serde(rename = "targetDeadline")]
    pub target_deadline: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReply {
    pub deadline: u64,
    pub result: &'static str,
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct SubmissionPipeline {
    ctx: Arc<PoolContext>,
    limiters: Mutex<HashMap<(IpAddr, RequestKind), Arc<DirectLimiter>>>,
}

impl SubmissionPipeline {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx, limiters: Mutex::new(HashMap::new()) }
    }

    /// `getMiningInfo` (§6). No rate limiting beyond the shared per-IP
    /// bucket; this is read-only and cheap.
    pub fn get_mining_info(&self, remote_ip: IpAddr) -> Result<MiningInfoReply> {
        self.check_rate_limit(remote_ip, RequestKind::GetMiningInfo)?;
        let round = self.ctx.round_state.round();
        Ok(MiningInfoReply {
            base_target: round.base_target,
            generation_signature: round.generation_signature.to_hex(),
            height: round.height,
            target_deadline: self.ctx.config.deadline_limit,
        })
    }

    /// `submitNonce` (§4.3). `blockheight` is the optional caller-supplied
    /// height; when present it must equal the active round.
    pub async fn submit_nonce(
        &self,
        remote_ip: IpAddr,
        account_id: u64,
        nonce: u64,
        blockheight: Option<u64>,
    ) -> Result<SubmitReply> {
        // Step 1: parse & validate.
        if account_id == 0 {
            return Err(RoundEngineError::SubmissionRejected {
                code: WireErrorCode::MalformedAccountId,
                message: "accountId must be non-zero".to_string(),
            });
        }
        let round = self.ctx.round_state.round();
        if let Some(h) = blockheight {
            if h != round.height {
                return Err(RoundEngineError::SubmissionRejected {
                    code: WireErrorCode::WrongHeight,
                    message: format!("blockheight {h} does not match current round {}", round.height),
                });
            }
        }

        // Step 2: rate limit.
        self.check_rate_limit(remote_ip, RequestKind::SubmitNonce)?;

        // Step 3: reward-recipient check.
        self.ensure_reward_recipient(account_id).await?;

        // Step 4: miner materialisation.
        let miner = self.first_or_create_miner(account_id).await?;

        // Step 5: deadline computation.
        let req = DeadlineRequest {
            account_id,
            nonce,
            base_target: round.base_target,
            scoop: round.scoop,
            gen_sig: round.generation_signature,
        };
        let deadline = self
            .ctx
            .kernel
            .calc_deadline(req)
            .await
            .map_err(|e| RoundEngineError::DeadlineKernel(e.to_string()))?;

        if self.ctx.config.deadline_limit != 0 && deadline > self.ctx.config.deadline_limit {
            self.ctx
                .metrics
                .submissions_rejected
                .with_label_values(&["deadline_exceeds_limit"])
                .inc();
            return Err(RoundEngineError::SubmissionRejected {
                code: WireErrorCode::DeadlineExceedsLimit,
                message: format!("deadline {deadline} exceeds limit {}", self.ctx.config.deadline_limit),
            });
        }

        self.ctx.metrics.submissions_accepted.inc();

        // Step 7: persist & publish, asynchronous w.r.t. the reply below.
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = persist_submission(&ctx, &miner, round.height, deadline, nonce, round.base_target).await {
                warn!(error = %e, miner_id = miner.id, height = round.height, "failed to persist nonce submission");
            }
        });

        // Step 6: reply immediately.
        Ok(SubmitReply { deadline, result: "success" })
    }

    async fn ensure_reward_recipient(&self, account_id: u64) -> Result<()> {
        if self.ctx.reward_recipients.contains(account_id) {
            return Ok(());
        }
        let ids = self.ctx.wallet.get_reward_recipients(self.ctx.config.pool_public_id).await.map_err(|_| {
            RoundEngineError::SubmissionRejected {
                code: WireErrorCode::RewardRecipientLookupFailed,
                message: "reward recipient lookup failed, retry".to_string(),
            }
        })?;
        let is_recipient = ids.iter().any(|&id| id == account_id);
        self.ctx.reward_recipients.replace_all(ids);
        if !is_recipient {
            self.ctx.metrics.submissions_rejected.with_label_values(&["wrong_reward_recipient"]).inc();
            return Err(RoundEngineError::SubmissionRejected {
                code: WireErrorCode::WrongRewardRecipient,
                message: format!("account {account_id} does not have the pool set as reward recipient"),
            });
        }
        Ok(())
    }

    async fn first_or_create_miner(&self, account_id: u64) -> Result<Arc<Miner>> {
        if let Some(miner) = self.ctx.registry.get(account_id) {
            return Ok(miner);
        }

        let stored = self.ctx.with_storage(move |s| s.get_account(account_id)).await?;
        let (name, pending) = if let Some(account) = &stored {
            (account.name.clone(), account.pending)
        } else {
            let fetched_name = self.ctx.wallet.get_account_info(account_id).await.ok().and_then(|a| a.name);
            (fetched_name, 0)
        };

        if stored.is_none() {
            let mut account = pc_storage::Account::new(account_id, address_codec::encode(account_id));
            account.name = name.clone();
            self.ctx.with_storage(move |s| s.put_account(&account)).await?;
        }

        let address = stored.map(|a| a.address).unwrap_or_else(|| address_codec::encode(account_id));
        let miner = Arc::new(Miner::new(account_id, address, name, pending));
        self.ctx.metrics.miners_registered.set(self.ctx.registry.len() as f64 + 1.0);
        Ok(self.ctx.registry.get_or_insert_with(account_id, || miner))
    }

    fn check_rate_limit(&self, remote_ip: IpAddr, kind: RequestKind) -> Result<()> {
        let limiter = {
            let mut limiters = self.limiters.lock().expect("rate limiter map poisoned");
            limiters
                .entry((remote_ip, kind))
                .or_insert_with(|| Arc::new(self.new_limiter()))
                .clone()
        };
        if limiter.check().is_err() {
            debug!(%remote_ip, request_type = kind.label(), "rate limit exceeded");
            self.ctx.metrics.submissions_rejected.with_label_values(&["rate_limited"]).inc();
            return Err(RoundEngineError::RateLimited);
        }
        Ok(())
    }

    fn new_limiter(&self) -> DirectLimiter {
        let rate = self.ctx.config.allow_requests_per_second.max(1);
        let quota = Quota::per_second(NonZeroU32::new(rate).expect("rate checked non-zero above"))
            .allow_burst(NonZeroU32::new(2).expect("2 is non-zero"));
        RateLimiter::direct(quota)
    }
}

/// §4.4's write path, plus the cache-classification pre-checks (fast-block
/// no-op, out-of-order synthesis) the policy table layers on top of it.
async fn persist_submission(
    ctx: &Arc<PoolContext>,
    miner: &Arc<Miner>,
    height: u64,
    deadline: u64,
    nonce: u64,
    base_target: u64,
) -> Result<()> {
    if height != miner.current_height() {
        let (slow, known) = ctx.window_cache.was_slow_block(height);
        if known && !slow {
            debug!(miner_id = miner.id, height, "dropping submission for a known fast block");
            return Ok(());
        }
        if !known && height != ctx.round_state.round().height {
            ensure_block_known(ctx, height).await?;
        }
    }

    let outcome = miner.update_or_create_nonce_submission(height, deadline, base_target);
    if outcome == SubmissionOutcome::NoOp {
        return Ok(());
    }

    let submission = NonceSubmission { miner_id: miner.id, block_height: height, deadline, nonce };
    ctx.with_storage(move |s| s.upsert_nonce_submission(&submission)).await?;

    ctx.events
        .publish(PoolEvent::NonceSubmissionAccepted { miner_id: miner.id, height, deadline, nonce })
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_kind_labels_match_wire_names() {
        assert_eq!(RequestKind::GetMiningInfo.label(), "getMiningInfo");
        assert_eq!(RequestKind::SubmitNonce.label(), "submitNonce");
    }
}
