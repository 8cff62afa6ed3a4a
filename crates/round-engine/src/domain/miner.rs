//! The Miner aggregate (§3, §4.2): the in-memory projection of an account
//! plus its current-round best submission and rolling deadline window.

use std::collections::HashMap;
use std::sync::Mutex;

use shared_types::PayoutInterval;

use super::alpha::AlphaTable;

const GENESIS_BASE_TARGET: f64 = 18_325_193_796.0;

fn weight_deadline(deadline: u64, base_target: u64) -> f64 {
    (deadline as f64) * (base_target as f64)
}

/// A single round's deadline/baseTarget pair kept in a miner's rolling
/// window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlineParams {
    pub height: u64,
    pub base_target: u64,
    pub deadline: u64,
}

/// Mutable state behind a miner's mutex: current-round best, rolling
/// window, and the weighted sum kept in lockstep with it.
#[derive(Debug, Default)]
struct MinerState {
    current: Option<DeadlineParams>,
    window: HashMap<u64, DeadlineParams>,
    weighted_deadline_sum: f64,
    pending: i64,
    name: Option<String>,
}

impl MinerState {
    fn current_height(&self) -> u64 {
        self.current.map_or(0, |dp| dp.height)
    }

    fn current_deadline(&self) -> u64 {
        self.current.map_or(u64::MAX, |dp| dp.deadline)
    }

    fn insert_window(&mut self, dp: DeadlineParams) {
        self.weighted_deadline_sum += weight_deadline(dp.deadline, dp.base_target);
        self.window.insert(dp.height, dp);
    }

    fn remove_window(&mut self, height: u64) {
        if let Some(dp) = self.window.remove(&height) {
            self.weighted_deadline_sum -= weight_deadline(dp.deadline, dp.base_target);
        }
    }

    /// Promotes `current` into the window if it isn't there already
    /// (§4.7 step 6, mirrors `addDeadlineParams`).
    fn promote_current_into_window(&mut self) {
        let Some(dp) = self.current else { return };
        if !self.window.contains_key(&dp.height) {
            self.insert_window(dp);
        }
    }
}

/// Outcome of `UpdateOrCreateNonceSubmission`, used by callers to decide
/// whether to persist and whether a new block needed synthesising first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Deadline was not an improvement; nothing changed.
    NoOp,
    /// The current-round best was updated.
    CurrentUpdated,
    /// An existing window entry was improved.
    WindowUpdated,
    /// A new row was inserted (either as a new current or into the window).
    Inserted,
}

/// A miner's identity plus its mutex-protected mutable state.
pub struct Miner {
    pub id: u64,
    pub address: String,
    /// Per-miner mutex serialising every mutation (§4.4, §4.7, §4.8, §4.9).
    state: Mutex<MinerState>,
}

impl Miner {
    #[must_use]
    pub fn new(id: u64, address: String, name: Option<String>, pending: i64) -> Self {
        Self {
            id,
            address,
            state: Mutex::new(MinerState {
                name,
                pending,
                ..MinerState::default()
            }),
        }
    }

    #[must_use]
    pub fn current_height(&self) -> u64 {
        self.state.lock().expect("miner lock poisoned").current_height()
    }

    #[must_use]
    pub fn current_deadline(&self) -> u64 {
        self.state.lock().expect("miner lock poisoned").current_deadline()
    }

    #[must_use]
    pub fn pending(&self) -> i64 {
        self.state.lock().expect("miner lock poisoned").pending
    }

    pub fn set_pending(&self, pending: i64) {
        self.state.lock().expect("miner lock poisoned").pending = pending;
    }

    pub fn credit_pending(&self, amount: i64) {
        self.state.lock().expect("miner lock poisoned").pending += amount;
    }

    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.state.lock().expect("miner lock poisoned").name.clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        self.state.lock().expect("miner lock poisoned").name = name;
    }

    /// Entry count and weighted sum, for EEPS.
    #[must_use]
    pub fn window_stats(&self) -> (usize, f64) {
        let state = self.state.lock().expect("miner lock poisoned");
        (state.window.len(), state.weighted_deadline_sum)
    }

    #[must_use]
    pub fn calculate_eeps(&self, alphas: &AlphaTable) -> f64 {
        let (n, w) = self.window_stats();
        eeps(alphas, n, w)
    }

    /// §4.4: the critical nonce-submission write path. Returns the outcome
    /// the caller uses to decide whether storage needs updating.
    pub fn update_or_create_nonce_submission(
        &self,
        height: u64,
        deadline: u64,
        base_target: u64,
    ) -> SubmissionOutcome {
        let mut state = self.state.lock().expect("miner lock poisoned");

        if state.current_height() == height {
            if state.current_deadline() <= deadline {
                return SubmissionOutcome::NoOp;
            }
            if let Some(dp) = state.current.as_mut() {
                dp.deadline = deadline;
            }
            return SubmissionOutcome::CurrentUpdated;
        }

        if let Some(existing) = state.window.get(&height).copied() {
            if existing.deadline <= deadline {
                return SubmissionOutcome::NoOp;
            }
            state.remove_window(height);
            state.insert_window(DeadlineParams { height, base_target, deadline });
            return SubmissionOutcome::WindowUpdated;
        }

        let dp = DeadlineParams { height, base_target, deadline };
        if height > state.current_height() {
            state.current = Some(dp);
        } else {
            state.insert_window(dp);
        }
        SubmissionOutcome::Inserted
    }

    /// §4.7 step 6: on a new-block commit, promote a slow current-round
    /// submission into the window, evict `evicted_height` if present, and
    /// report whether this miner has gone inactive.
    pub fn on_new_block(&self, was_slow: bool, evicted_height: Option<u64>, height: u64, inactive_after: u64) -> bool {
        let mut state = self.state.lock().expect("miner lock poisoned");
        if was_slow {
            state.promote_current_into_window();
        }
        if let Some(evicted) = evicted_height {
            state.remove_window(evicted);
        }
        state.current_height() + inactive_after < height
    }
}

/// EEPS (§4.11). `W = 0` and `N = 0` both yield `0.0`.
#[must_use]
pub fn eeps(alphas: &AlphaTable, n_conf: usize, weighted_deadline_sum: f64) -> f64 {
    if weighted_deadline_sum == 0.0 {
        return 0.0;
    }
    alphas.alpha(n_conf) * 240.0 * ((n_conf as f64) - 1.0) / (weighted_deadline_sum / GENESIS_BASE_TARGET)
}

/// Banker's rounding is *not* used: ties round away from zero.
#[must_use]
pub fn round_away_from_zero(f: f64) -> i64 {
    if f.abs() < 0.5 {
        return 0;
    }
    (f + f.copysign(0.5)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eeps_matches_reference_vector() {
        let alphas = AlphaTable::compute(360, 1);
        let value = eeps(&alphas, 7, 1_234_567_890.0);
        assert!((value - 209.167_850_954_010_3).abs() < 1e-9);
    }

    #[test]
    fn eeps_is_zero_when_weighted_sum_is_zero() {
        let alphas = AlphaTable::compute(360, 10);
        assert_eq!(eeps(&alphas, 5, 0.0), 0.0);
    }

    #[test]
    fn rounding_matches_reference_vectors() {
        assert_eq!(round_away_from_zero(5.49), 5);
        assert_eq!(round_away_from_zero(-5.49), -5);
        assert_eq!(round_away_from_zero(4.5), 5);
        assert_eq!(round_away_from_zero(-4.5), -5);
        assert_eq!(round_away_from_zero(0.0), 0);
    }

    #[test]
    fn inserting_then_removing_a_window_entry_adjusts_weighted_sum() {
        let miner = Miner::new(1, "POOL-TEST".to_string(), None, 0);
        // First submission at height 5 becomes `current` (no prior current).
        miner.update_or_create_nonce_submission(5, 100, 10);
        // A later, lower height goes straight into the window.
        let outcome = miner.update_or_create_nonce_submission(3, 4, 3);
        assert_eq!(outcome, SubmissionOutcome::Inserted);
        let (_, sum_before) = miner.window_stats();
        assert_eq!(sum_before, 12.0);

        miner.on_new_block(false, Some(3), 6, 1000);
        let (_, sum_after) = miner.window_stats();
        assert_eq!(sum_after, 0.0);
    }

    #[test]
    fn no_op_when_new_deadline_is_not_an_improvement() {
        let miner = Miner::new(1, "POOL-TEST".to_string(), None, 0);
        miner.update_or_create_nonce_submission(5, 100, 10);
        let outcome = miner.update_or_create_nonce_submission(5, 150, 10);
        assert_eq!(outcome, SubmissionOutcome::NoOp);
        assert_eq!(miner.current_deadline(), 100);
    }

    #[test]
    fn strictly_better_deadline_replaces_current() {
        let miner = Miner::new(1, "POOL-TEST".to_string(), None, 0);
        miner.update_or_create_nonce_submission(5, 100, 10);
        let outcome = miner.update_or_create_nonce_submission(5, 50, 10);
        assert_eq!(outcome, SubmissionOutcome::CurrentUpdated);
        assert_eq!(miner.current_deadline(), 50);
    }
}
