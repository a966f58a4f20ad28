//! # Reference Scenarios
//!
//! The three reference runs of the engine, driven across crate boundaries
//! with every effect committed through the outbox onto a real event bus.
//!
//! 1. **Eviction**: a higher bid pushes the only proposer-funded entry out
//!    and leaves a refund record behind.
//! 2. **Market lifecycle**: start, end and finalize a two-outcome market.
//! 3. **Timed finalization**: an early crank fails with a retryable timing
//!    error, a later one finalizes.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use fx_01_market_state::{MarketError, MarketState};
    use fx_02_proposal_queue::{Admission, ProposalQueue, QueueConfig, QueueError, MIN_FEE};
    use fx_03_lifecycle::{LifecycleConfig, LifecycleCoordinator, LifecycleError, ProposalStage};
    use shared_bus::{
        EventFilter, EventPublisher, EventTopic, GovernanceEvent, InMemoryEventBus, Outbox,
        RefundLedger, RefundReason, SettlementLedger,
    };
    use shared_types::{FailureKind, ManualClock};

    fn queue(max_proposer_funded: usize) -> ProposalQueue<Usdc> {
        ProposalQueue::new(
            DAO,
            QueueConfig {
                max_proposer_funded,
                max_concurrent_proposals: 1,
                max_queue_size: 10,
            },
        )
        .unwrap()
    }

    // =============================================================================
    // SCENARIO A: EVICTION
    // =============================================================================

    #[test]
    fn test_scenario_a_eviction() {
        let clock = ManualClock::new(1_000);
        let bus = InMemoryEventBus::new();
        let ledger = RefundLedger::new();
        let settlements = SettlementLedger::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Queue]));
        let mut q = queue(1);

        let mut outbox = Outbox::new();
        q.insert(entry(1, MIN_FEE, false, &clock), &clock, &mut outbox)
            .unwrap();
        assert_eq!(q.len(), 1);
        outbox.commit(&bus, &ledger, &settlements);

        clock.advance(10);
        let mut outbox = Outbox::new();
        q.insert(entry(2, 2_000_000, false, &clock), &clock, &mut outbox)
            .unwrap();
        let receipt = outbox.commit(&bus, &ledger, &settlements);
        assert_eq!(receipt.refunds_recorded, 1);

        assert_eq!(q.len(), 1);
        assert!(q.contains(&proposal_id(2)));
        assert!(!q.contains(&proposal_id(1)));

        let events = sub.drain();
        let evicted = events
            .iter()
            .find_map(|e| match e {
                GovernanceEvent::ProposalEvicted {
                    proposal_id,
                    evicted_by,
                    fee_forfeited,
                    ..
                } => Some((*proposal_id, *evicted_by, *fee_forfeited)),
                _ => None,
            })
            .expect("eviction event published");
        assert_eq!(evicted, (proposal_id(1), proposal_id(2), MIN_FEE));

        let pending = ledger.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].recipient, proposer(1));
        assert_eq!(pending[0].fee_forfeited, MIN_FEE);
        assert_eq!(pending[0].total(), 0);
        assert_eq!(pending[0].reason, RefundReason::Evicted);
        assert_eq!(pending[0].evicted_by, Some(proposal_id(2)));
    }

    #[test]
    fn test_scenario_a_equal_bid_rejected_without_effects() {
        let clock = ManualClock::new(1_000);
        let bus = InMemoryEventBus::new();
        let ledger = RefundLedger::new();
        let settlements = SettlementLedger::new();
        let mut q = queue(1);

        let mut outbox = Outbox::new();
        q.insert(entry(1, 3_000_000, false, &clock), &clock, &mut outbox)
            .unwrap();
        outbox.commit(&bus, &ledger, &settlements);
        let published = bus.events_published();

        let mut outbox = Outbox::new();
        let err = q
            .insert(entry(2, 3_000_000, false, &clock), &clock, &mut outbox)
            .unwrap_err();
        assert!(matches!(err, QueueError::ProposerFundedFull { .. }));
        assert_eq!(err.kind(), FailureKind::CapacityExceeded);
        assert!(outbox.is_empty());
        outbox.discard();

        assert_eq!(bus.events_published(), published);
        assert!(ledger.is_empty());
        assert!(q.contains(&proposal_id(1)));
    }

    // =============================================================================
    // SCENARIO B: MARKET LIFECYCLE
    // =============================================================================

    #[test]
    fn test_scenario_b_market_lifecycle() {
        let clock = ManualClock::new(1_000);
        let bus = InMemoryEventBus::new();
        let ledger = RefundLedger::new();
        let settlements = SettlementLedger::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Market]));
        let mut market = MarketState::new(
            [0x3A; 32],
            DAO,
            vec!["Reject".into(), "Accept".into()],
            &clock,
        )
        .unwrap();
        assert_eq!(market.outcome_count(), 2);

        let mut outbox = Outbox::new();
        market.start_trading(1_000_000, &clock, &mut outbox).unwrap();
        assert_eq!(market.trading_end_time(), Some(1_001_000));

        clock.set(2_000);
        market.end_trading(&clock, &mut outbox).unwrap();
        market.finalize(1, &clock, &mut outbox).unwrap();
        outbox.commit(&bus, &ledger, &settlements);

        assert!(market.is_finalized());
        assert_eq!(market.get_winning_outcome(), Ok(1));
        assert_eq!(sub.drain().len(), 3);

        let mut outbox = Outbox::new();
        assert_eq!(
            market.finalize(0, &clock, &mut outbox),
            Err(MarketError::AlreadyFinalized)
        );
        assert_eq!(market.get_winning_outcome(), Ok(1));
    }

    // =============================================================================
    // SCENARIO C: TIMED FINALIZATION
    // =============================================================================

    #[test]
    fn test_scenario_c_early_finalize_then_success() {
        let clock = ManualClock::new(0);
        let bus = InMemoryEventBus::new();
        let ledger = RefundLedger::new();
        let settlements = SettlementLedger::new();
        let coordinator = LifecycleCoordinator::new(LifecycleConfig::for_testing()).unwrap();
        let mut q = queue(3);

        let mut outbox = Outbox::new();
        let admitted = match q
            .submit(entry(1, 5_000_000, false, &clock), &clock, &mut outbox)
            .unwrap()
        {
            Admission::Immediate(queued) => queued,
            Admission::Queued { .. } => panic!("empty queue admits immediately"),
        };
        let activation = coordinator.create_from_admitted(admitted, &clock).unwrap();
        outbox.commit(&bus, &ledger, &settlements);
        let mut proposal = activation.proposal;
        let mut market = activation.market;
        let pools = pools_for(&proposal, &[100, 150]);

        clock.set(1_000);
        let mut outbox = Outbox::new();
        let done = fx_03_lifecycle::try_advance_state(
            &mut proposal,
            &mut market,
            &as_oracles(&pools),
            &clock,
            &mut outbox,
        )
        .unwrap();
        assert!(!done);
        outbox.commit(&bus, &ledger, &settlements);
        let trading_end = market.trading_end_time().unwrap();

        clock.set(trading_end - 1);
        let mut outbox = Outbox::new();
        let err = fx_03_lifecycle::try_advance_state(
            &mut proposal,
            &mut market,
            &as_oracles(&pools),
            &clock,
            &mut outbox,
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::InTradingPeriod { .. }));
        assert_eq!(err.kind(), FailureKind::TimingNotReached);
        assert!(outbox.is_empty());
        assert_eq!(proposal.stage(), ProposalStage::Trading);

        clock.set(trading_end);
        let mut outbox = Outbox::new();
        let done = fx_03_lifecycle::try_advance_state(
            &mut proposal,
            &mut market,
            &as_oracles(&pools),
            &clock,
            &mut outbox,
        )
        .unwrap();
        assert!(done);
        assert_eq!(proposal.stage(), ProposalStage::Finalized);
        assert_eq!(proposal.winning_outcome(), Some(1));
        assert_eq!(market.get_winning_outcome(), Ok(1));
    }

    // =============================================================================
    // COMPLETION COUNTER
    // =============================================================================

    #[test]
    fn test_second_completion_aborts() {
        let clock = ManualClock::new(0);
        let mut q = queue(3);
        let mut outbox = Outbox::new();
        assert!(matches!(
            q.submit(entry(1, MIN_FEE, true, &clock), &clock, &mut outbox)
                .unwrap(),
            Admission::Immediate(_)
        ));

        q.mark_proposal_completed(true, &mut outbox).unwrap();
        assert_eq!(q.active_proposal_count(), 0);
        assert!(!q.is_dao_slot_occupied());

        let staged = outbox.len();
        assert_eq!(
            q.mark_proposal_completed(true, &mut outbox),
            Err(QueueError::ActiveCountUnderflow)
        );
        assert_eq!(outbox.len(), staged);
        assert_eq!(q.active_proposal_count(), 0);
    }
}
