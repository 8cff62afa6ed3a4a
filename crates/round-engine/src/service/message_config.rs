//! Message-driven config (§4.12), storage-transaction side. The pure parsing
//! lives in `domain::message_config::interpret`; this wires it to
//! `WalletPort::get_incoming_msgs_since` and `StoragePort::apply_config_message`.

use std::sync::Arc;

use shared_bus::{EventPublisher, PoolEvent};
use shared_types::PayoutInterval;
use tracing::{debug, warn};

use crate::context::PoolContext;
use crate::domain::message_config::{interpret, ConfigDirective, ConfigFees};
use crate::error::Result;

const DAY_SECS: i64 = 86_400;
const WEEK_SECS: i64 = 7 * DAY_SECS;

pub struct MessageConfigService {
    ctx: Arc<PoolContext>,
}

impl MessageConfigService {
    #[must_use]
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    /// Fetches and applies every incoming message addressed to the pool
    /// account since `since_timestamp`. Runs even when no block is won
    /// (§4.8's final paragraph): the reward engine calls this every cycle.
    pub async fn apply_since(&self, since_timestamp: i64) -> Result<()> {
        let messages = self.ctx.wallet.get_incoming_msgs_since(self.ctx.config.pool_public_id, since_timestamp).await?;
        for (sender, body) in messages {
            if let Err(e) = self.apply_one(sender, &body).await {
                warn!(sender, error = %e, "message-driven config directive failed, skipping");
            }
        }
        Ok(())
    }

    async fn apply_one(&self, account_id: u64, body: &str) -> Result<()> {
        let fees = ConfigFees {
            set_weekly_fee: self.ctx.config.set_weekly_fee,
            set_daily_fee: self.ctx.config.set_daily_fee,
            set_now_fee: self.ctx.config.set_now_fee,
            set_min_payout_fee: self.ctx.config.set_min_payout_fee,
        };
        let Some((directive, fee)) = interpret(body, &fees) else {
            debug!(account_id, body, "unrecognised config message, ignored");
            return Ok(());
        };

        let current = self.ctx.with_storage(move |s| s.get_account(account_id)).await?;
        let Some(current) = current else {
            debug!(account_id, "config message from an unknown account, ignored");
            return Ok(());
        };

        // Idempotent against replay: a directive identical to the account's
        // current setting is a no-op, so a message seen twice (e.g. inside
        // the 30s safety overlap between cycles) is never double-charged.
        if directive_already_applied(&current, &directive) {
            debug!(account_id, "config message matches current setting, skipping");
            return Ok(());
        }

        if fee > 0 && self.ctx.config.fee_account_id.is_none() {
            warn!(account_id, "config message carries a fee but no feeAccountId is configured, skipping");
            return Ok(());
        }
        let fee_account_id = self.ctx.config.fee_account_id.unwrap_or(account_id);

        let now = now_unix();
        let directive_for_closure = directive.clone();
        let applied = self
            .ctx
            .with_storage(move |s| {
                s.apply_config_message(
                    account_id,
                    fee_account_id,
                    fee,
                    Box::new(move |account| apply_directive(account, &directive_for_closure, now)),
                )
            })
            .await?;

        if !applied {
            debug!(account_id, fee, "config message rejected: insufficient pending balance for fee");
            return Ok(());
        }

        self.ctx
            .events
            .publish(PoolEvent::ConfigMessageApplied { miner_id: account_id, setting: describe(&directive) })
            .await;
        Ok(())
    }
}

fn directive_already_applied(account: &pc_storage::Account, directive: &ConfigDirective) -> bool {
    match directive {
        ConfigDirective::PayoutInterval(interval) => account.payout_interval.as_ref() == Some(interval),
        ConfigDirective::MinPayoutValue(value) => account.min_payout_value == Some(*value),
    }
}

/// Applies a directive, including the `next_payout_date` roll-forward the
/// policy table prescribes alongside each named interval (§4.12).
///
/// `payout_interval`/`next_payout_date` and `min_payout_value` are mutually
/// exclusive account settings: applying one clears the other, matching the
/// original's single-UPDATE semantics where the unused pair is always NULL.
fn apply_directive(account: &mut pc_storage::Account, directive: &ConfigDirective, now: i64) {
    match directive {
        ConfigDirective::PayoutInterval(interval) => {
            account.payout_interval = Some(*interval);
            account.next_payout_date = match interval {
                PayoutInterval::Weekly => Some(now + WEEK_SECS),
                PayoutInterval::Daily => Some(now + DAY_SECS),
                PayoutInterval::Now => Some(now),
            };
            account.min_payout_value = None;
        }
        ConfigDirective::MinPayoutValue(value) => {
            account.min_payout_value = Some(*value);
            account.payout_interval = None;
            account.next_payout_date = None;
        }
    }
}

fn describe(directive: &ConfigDirective) -> String {
    match directive {
        ConfigDirective::PayoutInterval(interval) => format!("payoutInterval={interval:?}"),
        ConfigDirective::MinPayoutValue(value) => format!("minPayoutValue={value}"),
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_payout_interval_is_a_noop() {
        let mut account = pc_storage::Account::new(1, "POOL-XXXX".to_string());
        account.payout_interval = Some(PayoutInterval::Weekly);
        assert!(directive_already_applied(&account, &ConfigDirective::PayoutInterval(PayoutInterval::Weekly)));
        assert!(!directive_already_applied(&account, &ConfigDirective::PayoutInterval(PayoutInterval::Daily)));
    }

    #[test]
    fn apply_directive_sets_min_payout_value() {
        let mut account = pc_storage::Account::new(1, "POOL-XXXX".to_string());
        apply_directive(&mut account, &ConfigDirective::MinPayoutValue(500), 1_000);
        assert_eq!(account.min_payout_value, Some(500));
    }

    #[test]
    fn payout_interval_and_min_payout_value_are_mutually_exclusive() {
        let mut account = pc_storage::Account::new(1, "POOL-XXXX".to_string());

        apply_directive(&mut account, &ConfigDirective::MinPayoutValue(500), 1_000);
        assert_eq!(account.min_payout_value, Some(500));

        apply_directive(&mut account, &ConfigDirective::PayoutInterval(PayoutInterval::Daily), 1_000);
        assert_eq!(account.payout_interval, Some(PayoutInterval::Daily));
        assert_eq!(account.next_payout_date, Some(1_000 + DAY_SECS));
        assert_eq!(account.min_payout_value, None, "setting an interval must clear the stale numeric preference");

        apply_directive(&mut account, &ConfigDirective::MinPayoutValue(250), 1_000);
        assert_eq!(account.min_payout_value, Some(250));
        assert_eq!(account.payout_interval, None, "setting a numeric minimum must clear the stale interval");
        assert_eq!(account.next_payout_date, None);
    }

    #[test]
    fn apply_directive_rolls_forward_next_payout_date() {
        let mut account = pc_storage::Account::new(1, "POOL-XXXX".to_string());
        apply_directive(&mut account, &ConfigDirective::PayoutInterval(PayoutInterval::Weekly), 1_000);
        assert_eq!(account.next_payout_date, Some(1_000 + WEEK_SECS));

        apply_directive(&mut account, &ConfigDirective::PayoutInterval(PayoutInterval::Daily), 1_000);
        assert_eq!(account.next_payout_date, Some(1_000 + DAY_SECS));

        apply_directive(&mut account, &ConfigDirective::PayoutInterval(PayoutInterval::Now), 1_000);
        assert_eq!(account.next_payout_date, Some(1_000));
    }
}
