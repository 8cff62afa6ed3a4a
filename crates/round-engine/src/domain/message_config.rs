//! Message-driven config (§4.12): pure interpretation of an incoming
//! message body into a setting change plus its fee. The storage-transaction
//! side (replay check, atomic apply) lives in `service::message_config`.

use shared_types::PayoutInterval;

/// A parsed configuration directive, or `None` for an unrecognised body
/// (ignored, no fee per the policy table).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDirective {
    PayoutInterval(PayoutInterval),
    MinPayoutValue(i64),
}

/// Fee schedule for each directive kind, read from `PoolConfig`.
#[derive(Debug, Clone, Copy)]
pub struct ConfigFees {
    pub set_weekly_fee: i64,
    pub set_daily_fee: i64,
    pub set_now_fee: i64,
    pub set_min_payout_fee: i64,
}

/// Interprets a message body per the §4.12 policy table. Returns `None` for
/// bodies that don't match any recognised form.
#[must_use]
pub fn interpret(body: &str, fees: &ConfigFees) -> Option<(ConfigDirective, i64)> {
    match body {
        "weekly" => Some((ConfigDirective::PayoutInterval(PayoutInterval::Weekly), fees.set_weekly_fee)),
        "daily" => Some((ConfigDirective::PayoutInterval(PayoutInterval::Daily), fees.set_daily_fee)),
        "now" => Some((ConfigDirective::PayoutInterval(PayoutInterval::Now), fees.set_now_fee)),
        other => {
            let truncated = if let Ok(n) = other.parse::<i64>() {
                Some(n)
            } else {
                other.parse::<f64>().ok().map(|f| f.trunc() as i64)
            };
            match truncated {
                Some(n) if n >= 1 => Some((ConfigDirective::MinPayoutValue(n), fees.set_min_payout_fee)),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fees() -> ConfigFees {
        ConfigFees { set_weekly_fee: 1, set_daily_fee: 2, set_now_fee: 3, set_min_payout_fee: 4 }
    }

    #[test]
    fn recognises_named_intervals() {
        assert_eq!(
            interpret("weekly", &fees()),
            Some((ConfigDirective::PayoutInterval(PayoutInterval::Weekly), 1))
        );
        assert_eq!(interpret("daily", &fees()).unwrap().1, 2);
        assert_eq!(interpret("now", &fees()).unwrap().1, 3);
    }

    #[test]
    fn parses_integer_and_float_min_payout() {
        assert_eq!(interpret("500", &fees()), Some((ConfigDirective::MinPayoutValue(500), 4)));
        assert_eq!(interpret("500.9", &fees()), Some((ConfigDirective::MinPayoutValue(500), 4)));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(interpret("0", &fees()), None);
        assert_eq!(interpret("not-a-number", &fees()), None);
    }
}
