//! Reward split math (§4.8 step 3).

use std::collections::HashMap;

use super::miner::round_away_from_zero;

/// A fully computed reward split for a won block.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardSplit {
    pub total_reward: i64,
    pub pool_fee: i64,
    pub winner_reward: i64,
    /// Per-account credit, keyed by account id. Includes the fee account
    /// (if `pool_fee > 0`) and the winner's `winner_reward` on top of its
    /// share.
    pub credits: HashMap<u64, i64>,
}

/// Computes the full reward split for a block. `block_reward_planck` and
/// `total_fee_nqt` are both already expressed in the chain's smallest unit
/// (the wallet reports the block subsidy pre-scaled); `totalReward` is
/// their sum.
///
/// `share_of` maps account id to its EEPS share of the round (sums to 1.0
/// over participating miners; may be empty, or sum to less than 1.0 if the
/// caller has already excluded non-participants).
#[must_use]
pub fn split_reward(
    block_reward_planck: i64,
    total_fee_nqt: i64,
    pool_fee_share: f64,
    winner_share: f64,
    winner_id: u64,
    fee_account_id: Option<u64>,
    share_of: &HashMap<u64, f64>,
) -> RewardSplit {
    let total_reward = block_reward_planck + total_fee_nqt;
    let mut remaining = total_reward;

    let mut credits: HashMap<u64, i64> = HashMap::new();

    let pool_fee = if let Some(fee_account) = fee_account_id {
        let fee = round_away_from_zero(total_reward as f64 * pool_fee_share);
        *credits.entry(fee_account).or_insert(0) += fee;
        remaining -= fee;
        fee
    } else {
        0
    };

    let winner_reward = round_away_from_zero(remaining as f64 * winner_share);
    remaining -= winner_reward;

    for (&account_id, &share) in share_of {
        let mut credit = round_away_from_zero(share * remaining as f64);
        if account_id == winner_id {
            credit += winner_reward;
        }
        *credits.entry(account_id).or_insert(0) += credit;
    }

    RewardSplit { total_reward, pool_fee, winner_reward, credits }
}
