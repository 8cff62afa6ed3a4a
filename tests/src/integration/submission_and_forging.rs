//! Submission Pipeline → Forging Loop choreography: an accepted nonce is
//! persisted, then forwarded to the wallet once its submit-before window
//! opens.

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::time::Duration;

    use round_engine::domain::RoundInfo;
    use round_engine::error::{RoundEngineError, WireErrorCode};
    use round_engine::service::{ForgingLoop, SubmissionPipeline};
    use shared_types::GenerationSignature;

    use crate::support::{build_context, now_unix, test_config, wait_until, FixedDeadlineKernel, MockWallet};

    fn local_ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    fn active_round(height: u64) -> RoundInfo {
        RoundInfo {
            height,
            base_target: 1_000,
            scoop: 3,
            generation_signature: GenerationSignature([9u8; 32]),
            round_start: now_unix(),
        }
    }

    #[tokio::test]
    async fn accepted_submission_is_persisted_and_forwarded_to_the_wallet() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_reward_recipients(vec![42]);
        let kernel = Arc::new(FixedDeadlineKernel::new(10_000));
        // Well under submitBefore (30s), so the forging loop fires almost
        // immediately rather than waiting out a near-real deadline.
        kernel.set(42, 7, 5);

        let ctx = build_context(test_config(), wallet.clone(), kernel, active_round(100));
        let pipeline = SubmissionPipeline::new(ctx.clone());

        // Subscribe the forging loop before submitting: the bus only
        // delivers events published after a subscriber exists.
        let forging = ForgingLoop::new(ctx.clone());
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let events = ctx.events.clone();
        let forging_handle = tokio::spawn(async move { forging.run(events.as_ref(), shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let reply = pipeline.submit_nonce(local_ip(), 42, 7, Some(100)).await.expect("submission accepted");
        assert_eq!(reply.deadline, 5);
        assert_eq!(reply.result, "success");

        // persist_submission runs fire-and-forget in a spawned task.
        let persisted = wait_until(Duration::from_secs(1), || ctx.registry.get(42).is_some_and(|m| m.current_deadline() == 5)).await;
        assert!(persisted, "nonce submission was never persisted to the registry");

        let stored = ctx.with_storage(|s| s.get_nonce_submission(42, 100)).await.unwrap();
        assert_eq!(stored.map(|s| (s.deadline, s.nonce)), Some((5, 7)));

        let forwarded = wait_until(Duration::from_secs(2), || wallet.submitted_count() > 0).await;
        assert!(forwarded, "forging loop never forwarded the nonce to the wallet");
        assert_eq!(wallet.submitted_nonces.lock().unwrap()[0], (42, 7));

        let _ = shutdown_tx.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(1), forging_handle).await;
    }

    #[tokio::test]
    async fn a_fresh_forging_loop_reprimes_the_already_persisted_best_submission() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_reward_recipients(vec![42]);
        let kernel = Arc::new(FixedDeadlineKernel::new(10_000));
        // submitBefore is 30s; a deadline of 32s leaves a ~2s window to
        // observe persistence and shut the first loop down before its own
        // timer would fire.
        kernel.set(42, 7, 32);

        let ctx = build_context(test_config(), wallet.clone(), kernel, active_round(100));
        let pipeline = SubmissionPipeline::new(ctx.clone());

        // First forging loop: accept the submission, let it persist the
        // best-submission pointer onto the block row, then shut it down
        // before it ever gets to the wallet-forwarding timer.
        let first = ForgingLoop::new(ctx.clone());
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let events = ctx.events.clone();
        let first_handle = tokio::spawn(async move { first.run(events.as_ref(), shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        pipeline.submit_nonce(local_ip(), 42, 7, Some(100)).await.expect("submission accepted");
        let mut persisted = false;
        for _ in 0..20 {
            let has_pointer = ctx
                .with_storage(|s| s.get_block(100))
                .await
                .unwrap()
                .is_some_and(|b| b.best_nonce_submission_id.is_some());
            if has_pointer {
                persisted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(persisted, "best_nonce_submission_id was never written to the block row");

        let _ = shutdown_tx.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(1), first_handle).await;
        assert_eq!(wallet.submitted_count(), 0, "the first loop must not have forwarded yet");

        // A brand-new ForgingLoop (as after a process restart) reprimes from
        // storage alone — no new submission event — and still forwards the
        // same nonce once its submit-before window opens.
        let second = ForgingLoop::new(ctx.clone());
        let (shutdown_tx2, shutdown_rx2) = tokio::sync::watch::channel(false);
        let events2 = ctx.events.clone();
        let second_handle = tokio::spawn(async move { second.run(events2.as_ref(), shutdown_rx2).await });

        let forwarded = wait_until(Duration::from_secs(3), || wallet.submitted_count() > 0).await;
        assert!(forwarded, "reprimed forging loop never forwarded the nonce to the wallet");
        assert_eq!(wallet.submitted_nonces.lock().unwrap()[0], (42, 7));

        let _ = shutdown_tx2.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(1), second_handle).await;
    }

    #[tokio::test]
    async fn submission_from_a_non_reward_recipient_is_rejected() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_reward_recipients(vec![]); // 7 never set as reward recipient
        let kernel = Arc::new(FixedDeadlineKernel::new(100));
        let ctx = build_context(test_config(), wallet, kernel, active_round(50));
        let pipeline = SubmissionPipeline::new(ctx);

        let err = pipeline.submit_nonce(local_ip(), 7, 1, Some(50)).await.unwrap_err();
        assert!(matches!(err, RoundEngineError::SubmissionRejected { code: WireErrorCode::WrongRewardRecipient, .. }));
    }

    #[tokio::test]
    async fn submission_with_a_stale_blockheight_is_rejected() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_reward_recipients(vec![7]);
        let kernel = Arc::new(FixedDeadlineKernel::new(100));
        let ctx = build_context(test_config(), wallet, kernel, active_round(50));
        let pipeline = SubmissionPipeline::new(ctx);

        let err = pipeline.submit_nonce(local_ip(), 7, 1, Some(49)).await.unwrap_err();
        assert!(matches!(err, RoundEngineError::SubmissionRejected { code: WireErrorCode::WrongHeight, .. }));
    }

    #[tokio::test]
    async fn submission_exceeding_the_deadline_limit_is_rejected() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_reward_recipients(vec![7]);
        let kernel = Arc::new(FixedDeadlineKernel::new(5_000));

        let mut config = test_config();
        config.deadline_limit = 1_000;
        let ctx = build_context(config, wallet, kernel, active_round(50));
        let pipeline = SubmissionPipeline::new(ctx);

        let err = pipeline.submit_nonce(local_ip(), 7, 1, Some(50)).await.unwrap_err();
        assert!(matches!(err, RoundEngineError::SubmissionRejected { code: WireErrorCode::DeadlineExceedsLimit, .. }));
    }
}
