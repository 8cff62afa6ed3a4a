//! Message-driven config (§4.12) choreography: an incoming account message
//! changes a payout setting and charges its fee, and a replayed message for
//! a setting already in effect is a no-op.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pc_storage::Account;
    use round_engine::domain::RoundInfo;
    use round_engine::service::message_config::MessageConfigService;
    use shared_types::{GenerationSignature, PayoutInterval};

    use crate::support::{build_context, test_config, FixedDeadlineKernel, MockWallet};

    fn idle_round() -> RoundInfo {
        RoundInfo { height: 1, base_target: 1, scoop: 0, generation_signature: GenerationSignature([0u8; 32]), round_start: 0 }
    }

    #[tokio::test]
    async fn weekly_directive_sets_interval_and_charges_the_fee_once() {
        let wallet = Arc::new(MockWallet::new());
        let kernel = Arc::new(FixedDeadlineKernel::new(100));

        let mut config = test_config();
        config.set_weekly_fee = 1_000;
        let ctx = build_context(config, wallet.clone(), kernel, idle_round());

        let mut account = Account::new(5, "POOL-5".to_string());
        account.pending = 10_000;
        ctx.with_storage(move |s| s.put_account(&account)).await.unwrap();
        ctx.with_storage(move |s| s.put_account(&Account::new(99, "POOL-FEE".to_string()))).await.unwrap();

        let service = MessageConfigService::new(ctx.clone());

        wallet.set_incoming_msg(5, "weekly");
        service.apply_since(0).await.expect("first apply");

        let account = ctx.with_storage(|s| s.get_account(5)).await.unwrap().expect("account");
        assert_eq!(account.payout_interval, Some(PayoutInterval::Weekly));
        assert_eq!(account.pending, 9_000);
        assert!(account.next_payout_date.is_some(), "weekly directive must roll next_payout_date forward");
        let fee_account = ctx.with_storage(|s| s.get_account(99)).await.unwrap().expect("fee account");
        assert_eq!(fee_account.pending, 1_000);

        // A replayed "weekly" message (e.g. seen again inside the 30s
        // overlap between reward-engine cycles) matches the account's
        // current setting and must not be charged a second time.
        wallet.set_incoming_msg(5, "weekly");
        service.apply_since(0).await.expect("replayed apply");

        let account = ctx.with_storage(|s| s.get_account(5)).await.unwrap().expect("account");
        assert_eq!(account.pending, 9_000);
        let fee_account = ctx.with_storage(|s| s.get_account(99)).await.unwrap().expect("fee account");
        assert_eq!(fee_account.pending, 1_000);
    }

    #[tokio::test]
    async fn numeric_directive_sets_min_payout_value() {
        let wallet = Arc::new(MockWallet::new());
        let kernel = Arc::new(FixedDeadlineKernel::new(100));

        let mut config = test_config();
        config.set_min_payout_fee = 0;
        let ctx = build_context(config, wallet.clone(), kernel, idle_round());

        let mut account = Account::new(6, "POOL-6".to_string());
        account.pending = 500;
        ctx.with_storage(move |s| s.put_account(&account)).await.unwrap();
        ctx.with_storage(move |s| s.put_account(&Account::new(99, "POOL-FEE".to_string()))).await.unwrap();

        let service = MessageConfigService::new(ctx.clone());
        wallet.set_incoming_msg(6, "25000000");
        service.apply_since(0).await.expect("apply");

        let account = ctx.with_storage(|s| s.get_account(6)).await.unwrap().expect("account");
        assert_eq!(account.min_payout_value, Some(25_000_000));
    }

    #[tokio::test]
    async fn directive_with_insufficient_balance_for_the_fee_is_skipped() {
        let wallet = Arc::new(MockWallet::new());
        let kernel = Arc::new(FixedDeadlineKernel::new(100));

        let mut config = test_config();
        config.set_daily_fee = 10_000;
        let ctx = build_context(config, wallet.clone(), kernel, idle_round());

        let mut account = Account::new(7, "POOL-7".to_string());
        account.pending = 100; // below the 10_000 fee
        ctx.with_storage(move |s| s.put_account(&account)).await.unwrap();
        ctx.with_storage(move |s| s.put_account(&Account::new(99, "POOL-FEE".to_string()))).await.unwrap();

        let service = MessageConfigService::new(ctx.clone());
        wallet.set_incoming_msg(7, "daily");
        service.apply_since(0).await.expect("apply");

        let account = ctx.with_storage(|s| s.get_account(7)).await.unwrap().expect("account");
        assert_eq!(account.payout_interval, None);
        assert_eq!(account.pending, 100);
    }
}
