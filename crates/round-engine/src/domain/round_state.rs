//! Round State (§4.2, §3 RoundInfo): the active round published atomically
//! so every reader observes a self-consistent snapshot.

use std::sync::RwLock;

use shared_types::GenerationSignature;

/// Immutable value type describing the active round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInfo {
    pub height: u64,
    pub base_target: u64,
    pub scoop: u32,
    pub generation_signature: GenerationSignature,
    /// Unix timestamp the round started (used to compute the forging
    /// submission delay).
    pub round_start: i64,
}

impl RoundInfo {
    #[must_use]
    pub fn genesis() -> Self {
        Self {
            height: 0,
            base_target: 0,
            scoop: 0,
            generation_signature: GenerationSignature([0u8; 32]),
            round_start: 0,
        }
    }
}

/// The best nonce submission known for the active round, alongside the
/// round it belongs to (so forging can detect staleness across rounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestSubmission {
    pub height: u64,
    pub miner_id: u64,
    pub deadline: u64,
    pub nonce: u64,
}

impl BestSubmission {
    #[must_use]
    pub fn sentinel(height: u64) -> Self {
        Self { height, miner_id: 0, deadline: u64::MAX, nonce: 0 }
    }
}

/// Atomically replaceable holder for the active `RoundInfo` and the current
/// best submission. Writers are serialised by the caller (block poller for
/// round transitions, forging loop for best-submission updates); readers
/// take a single lock-protected snapshot.
pub struct RoundState {
    inner: RwLock<(RoundInfo, BestSubmission)>,
}

impl RoundState {
    #[must_use]
    pub fn new(round: RoundInfo) -> Self {
        let sentinel = BestSubmission::sentinel(round.height);
        Self { inner: RwLock::new((round, sentinel)) }
    }

    #[must_use]
    pub fn round(&self) -> RoundInfo {
        self.inner.read().expect("round state lock poisoned").0.clone()
    }

    #[must_use]
    pub fn best_submission(&self) -> BestSubmission {
        self.inner.read().expect("round state lock poisoned").1
    }

    /// Publishes a new round, resetting the best-submission sentinel.
    pub fn publish_round(&self, round: RoundInfo) {
        let sentinel = BestSubmission::sentinel(round.height);
        *self.inner.write().expect("round state lock poisoned") = (round, sentinel);
    }

    /// Replaces the best submission for the active round in place, without
    /// touching `RoundInfo`.
    pub fn set_best_submission(&self, best: BestSubmission) {
        self.inner.write().expect("round state lock poisoned").1 = best;
    }
}
