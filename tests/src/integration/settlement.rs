//! # Settlement and Refund Flows
//!
//! Whole proposal runs: admission, review, trading, TWAP finalization and
//! settlement, with bus subscribers observing the committed events, a
//! settlement executor carrying out fee and liquidity orders, and a refund
//! worker paying out evictions in the background.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use fx_02_proposal_queue::{Admission, ProposalQueue, QueueConfig, MIN_FEE};
    use fx_03_lifecycle::{
        Activation, LifecycleConfig, LifecycleCoordinator, LifecycleResult, SettlementExecutor,
    };
    use shared_bus::{
        CommitReceipt, EventFilter, EventTopic, GovernanceEvent, InMemoryEventBus, Outbox,
        RefundLedger, RefundWorker, SettlementLedger,
    };
    use shared_types::{Balance, Clock, ManualClock};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    struct Engine {
        clock: ManualClock,
        bus: InMemoryEventBus,
        ledger: Arc<RefundLedger>,
        settlements: Arc<SettlementLedger>,
        queue: ProposalQueue<Usdc>,
        coordinator: LifecycleCoordinator,
        treasury: Arc<Treasury>,
        executor: SettlementExecutor,
    }

    impl Engine {
        fn new(config: QueueConfig) -> Self {
            Self::with_treasury(config, Treasury::default())
        }

        fn with_treasury(config: QueueConfig, treasury: Treasury) -> Self {
            let settlements = Arc::new(SettlementLedger::new());
            let treasury = Arc::new(treasury);
            Self {
                clock: ManualClock::new(0),
                bus: InMemoryEventBus::new(),
                ledger: Arc::new(RefundLedger::new()),
                settlements: settlements.clone(),
                queue: ProposalQueue::new(DAO, config).unwrap(),
                coordinator: LifecycleCoordinator::new(LifecycleConfig::for_testing()).unwrap(),
                treasury: treasury.clone(),
                executor: SettlementExecutor::new(settlements, treasury.clone(), treasury),
            }
        }

        fn commit(&self, outbox: Outbox) -> CommitReceipt {
            outbox.commit(&self.bus, &self.ledger, &self.settlements)
        }

        /// Advance once, committing on success.
        fn crank(
            &mut self,
            activation: &mut Activation<Usdc>,
            pools: &[FixedPool],
        ) -> LifecycleResult<bool> {
            let mut outbox = Outbox::new();
            let result = self.coordinator.advance_and_settle(
                &mut activation.proposal,
                &mut activation.market,
                &as_oracles(pools),
                &mut self.queue,
                &self.clock,
                &mut outbox,
            );
            match result {
                Ok(_) => {
                    self.commit(outbox);
                }
                Err(_) => outbox.discard(),
            }
            result
        }

        /// Crank through review and trading to finalization.
        fn run_to_finalization(&mut self, activation: &mut Activation<Usdc>, pools: &[FixedPool]) {
            let start = self.clock.timestamp_ms();
            self.clock.set(start + 1_000);
            assert!(!self.crank(activation, pools).unwrap());
            let end = activation.market.trading_end_time().unwrap();
            self.clock.set(end);
            assert!(self.crank(activation, pools).unwrap());
        }

        fn admit(&mut self, n: u8, fee: u64) -> Activation<Usdc> {
            let mut outbox = Outbox::new();
            let admitted = match self
                .queue
                .submit(entry(n, fee, false, &self.clock), &self.clock, &mut outbox)
                .unwrap()
            {
                Admission::Immediate(queued) => queued,
                Admission::Queued { .. } => panic!("slot was free"),
            };
            self.commit(outbox);
            self.coordinator
                .create_from_admitted(admitted, &self.clock)
                .unwrap()
        }
    }

    // =============================================================================
    // FULL RUNS
    // =============================================================================

    #[tokio::test]
    async fn test_two_proposals_share_one_slot() {
        let mut engine = Engine::new(QueueConfig {
            max_proposer_funded: 3,
            max_concurrent_proposals: 1,
            max_queue_size: 10,
        });
        let mut settlement_events =
            engine
                .bus
                .subscribe(EventFilter::topics(vec![EventTopic::Settlement]));

        // First proposal takes the only slot; the DAO-funded one waits.
        let mut outbox = Outbox::new();
        let first = match engine
            .queue
            .submit(entry(1, 4_000_000, false, &engine.clock), &engine.clock, &mut outbox)
            .unwrap()
        {
            Admission::Immediate(queued) => queued,
            Admission::Queued { .. } => panic!("slot was free"),
        };
        let position = engine
            .queue
            .insert(entry(2, 3_000_000, true, &engine.clock), &engine.clock, &mut outbox)
            .unwrap();
        assert_eq!(position, 0);
        engine.commit(outbox);

        let mut first = engine
            .coordinator
            .create_from_admitted(first, &engine.clock)
            .unwrap();
        assert!(first.bond.is_none());
        let pools = pools_for(&first.proposal, &[100, 150]);
        engine.run_to_finalization(&mut first, &pools);
        assert_eq!(engine.settlements.len(), 2);
        assert!(engine.treasury.payouts.lock().is_empty());
        assert_eq!(engine.executor.run_once().paid, 2);

        let fee = timeout(Duration::from_secs(1), settlement_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            fee,
            GovernanceEvent::ProposalFeeDistributed {
                dao_id: DAO,
                proposal_id: proposal_id(1),
                recipient: Some(proposer(1)),
                amount: 4_000_000,
            }
        );
        let redeemed = timeout(Duration::from_secs(1), settlement_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            redeemed,
            GovernanceEvent::LiquidityRedeemed {
                provider: Some(_),
                winning_outcome: 1,
                ..
            }
        ));

        // The freed slot goes to the waiting DAO-funded proposal.
        let mut outbox = Outbox::new();
        let mut second = engine
            .coordinator
            .activate_next(&mut engine.queue, &engine.clock, &mut outbox)
            .unwrap()
            .expect("queued proposal activates");
        engine.commit(outbox);
        assert_eq!(second.proposal.id(), proposal_id(2));
        assert_eq!(second.bond.as_ref().map(Balance::value), Some(BOND));
        assert!(engine.queue.is_dao_slot_occupied());
        assert!(engine.queue.is_empty());

        let pools = pools_for(&second.proposal, &[200, 210]);
        engine.run_to_finalization(&mut second, &pools);
        assert_eq!(engine.executor.run_once().paid, 2);
        assert!(engine.settlements.is_empty());
        assert_eq!(second.proposal.winning_outcome(), Some(0));
        assert!(!engine.queue.is_dao_slot_occupied());
        assert_eq!(engine.queue.active_proposal_count(), 0);

        let metrics = fx_telemetry::register_metrics().unwrap();
        let text = metrics.encode().unwrap();
        assert!(text.contains("fx_lifecycle_proposals_finalized_total"));
        assert!(text.contains("fx_queue_proposals_activated_total"));
        assert!(text.contains("fx_lifecycle_settlement_orders_total"));

        assert_eq!(
            *engine.treasury.payouts.lock(),
            vec![
                Payout::Creator(proposer(1), 4_000_000),
                Payout::Provider(proposal_id(1), proposer(1)),
                Payout::Treasury(DAO, 3_000_000),
                Payout::DaoPool(proposal_id(2)),
            ]
        );
    }

    #[tokio::test]
    async fn test_early_crank_publishes_nothing() {
        let mut engine = Engine::new(QueueConfig::for_testing());
        let mut activation = engine.admit(1, MIN_FEE);
        let pools = pools_for(&activation.proposal, &[100, 150]);

        let mut all = engine.bus.subscribe(EventFilter::all());
        engine.clock.set(999);
        let err = engine.crank(&mut activation, &pools).unwrap_err();
        assert!(err.is_retryable());
        assert!(all.drain().is_empty());

        engine.clock.set(1_000);
        assert!(!engine.crank(&mut activation, &pools).unwrap());
        assert_eq!(all.drain().len(), 2);
        assert!(engine.settlements.is_empty());
    }

    // =============================================================================
    // SETTLEMENT RETRIES
    // =============================================================================

    #[tokio::test]
    async fn test_redemption_retry_pays_fee_once() {
        let mut engine = Engine::with_treasury(
            QueueConfig::for_testing(),
            Treasury::failing_redemptions(1),
        );
        let mut activation = engine.admit(1, 4_000_000);
        let pools = pools_for(&activation.proposal, &[100, 150]);
        engine.run_to_finalization(&mut activation, &pools);

        // Finalization committed even though custody has not moved anything yet.
        assert!(activation.proposal.is_finalized());
        assert_eq!(engine.queue.active_proposal_count(), 0);

        let first = engine.executor.run_once();
        assert_eq!((first.paid, first.failed), (1, 1));
        assert_eq!(engine.treasury.fee_payouts(), 1);
        assert_eq!(engine.settlements.len(), 1);

        let second = engine.executor.run_once();
        assert_eq!((second.paid, second.failed), (1, 0));
        assert_eq!(engine.treasury.fee_payouts(), 1);
        assert_eq!(
            *engine.treasury.payouts.lock(),
            vec![
                Payout::Creator(proposer(1), 4_000_000),
                Payout::Provider(proposal_id(1), proposer(1)),
            ]
        );
        assert!(engine.settlements.is_empty());
    }

    #[tokio::test]
    async fn test_uncommitted_finalization_orders_nothing() {
        let mut engine = Engine::new(QueueConfig::for_testing());
        let mut activation = engine.admit(1, MIN_FEE);
        let pools = pools_for(&activation.proposal, &[100, 150]);

        engine.clock.set(1_000);
        engine.crank(&mut activation, &pools).unwrap();
        engine.clock.set(activation.market.trading_end_time().unwrap());

        let mut outbox = Outbox::new();
        engine
            .coordinator
            .advance_and_settle(
                &mut activation.proposal,
                &mut activation.market,
                &as_oracles(&pools),
                &mut engine.queue,
                &engine.clock,
                &mut outbox,
            )
            .unwrap();
        assert_eq!(outbox.settlements().len(), 2);
        outbox.discard();

        assert_eq!(engine.executor.run_once().paid, 0);
        assert!(engine.treasury.payouts.lock().is_empty());
    }

    // =============================================================================
    // REFUNDS
    // =============================================================================

    fn evict_one(engine: &mut Engine) {
        let mut outbox = Outbox::new();
        engine
            .queue
            .insert(entry(1, MIN_FEE, false, &engine.clock), &engine.clock, &mut outbox)
            .unwrap();
        engine
            .queue
            .insert(entry(2, 2 * MIN_FEE, false, &engine.clock), &engine.clock, &mut outbox)
            .unwrap();
        let receipt = engine.commit(outbox);
        assert_eq!(receipt.refunds_recorded, 1);
    }

    fn single_funded_slot() -> QueueConfig {
        QueueConfig {
            max_proposer_funded: 1,
            max_concurrent_proposals: 1,
            max_queue_size: 10,
        }
    }

    #[tokio::test]
    async fn test_refund_worker_retries_until_paid() {
        let mut engine = Engine::new(single_funded_slot());
        evict_one(&mut engine);

        let custody = Arc::new(Custody::failing(1));
        let worker = RefundWorker::new(engine.ledger.clone(), custody.clone());

        let report = worker.run_once().await;
        assert_eq!((report.paid, report.failed), (0, 1));
        assert_eq!(engine.ledger.len(), 1);

        let report = worker.run_once().await;
        assert_eq!((report.paid, report.failed), (1, 0));
        assert!(engine.ledger.is_empty());

        let paid = custody.paid();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].recipient, proposer(1));
        assert_eq!(paid[0].fee_forfeited, MIN_FEE);
        assert_eq!(paid[0].total(), 0);
    }

    #[tokio::test]
    async fn test_background_worker_drains_ledger() {
        let mut engine = Engine::new(single_funded_slot());
        evict_one(&mut engine);

        let custody = Arc::new(Custody::default());
        let handle = RefundWorker::new(engine.ledger.clone(), custody.clone())
            .spawn(Duration::from_millis(10));

        let ledger = engine.ledger.clone();
        timeout(Duration::from_secs(2), async move {
            while !ledger.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("worker drained the ledger");
        handle.abort();

        assert_eq!(custody.paid().len(), 1);
    }

    #[tokio::test]
    async fn test_worker_honours_refund_capability() {
        let mut engine = Engine::new(single_funded_slot());
        engine.queue.set_refund_capability([7; 32]);
        evict_one(&mut engine);

        let custody = Arc::new(Custody::default());
        let other = RefundWorker::new(engine.ledger.clone(), custody.clone()).with_capability([8; 32]);
        assert_eq!(other.run_once().await.paid, 0);
        assert_eq!(engine.ledger.len(), 1);

        let owner = RefundWorker::new(engine.ledger.clone(), custody.clone()).with_capability([7; 32]);
        assert_eq!(owner.run_once().await.paid, 1);
        assert_eq!(custody.paid()[0].capability, Some([7; 32]));
    }
}
