//! Stage transitions.
//!
//! Every transition is planned against read-only state first and applied
//! only once the whole plan is known to succeed. A failed call leaves the
//! proposal and market untouched and stages nothing in the outbox.

use super::errors::{LifecycleError, LifecycleResult};
use super::proposal::{Proposal, ProposalStage};
use super::twap::select_winner;
use crate::ports::outbound::TwapOracle;
use fx_01_market_state::MarketState;
use fx_telemetry::{metric_inc, PROPOSALS_FINALIZED};
use shared_bus::{GovernanceEvent, Outbox};
use shared_types::{Clock, ShortId, Timestamp};
use tracing::{debug, info};

/// Outcome of a successful finalization tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FinalizationPlan {
    pub twaps: Vec<u128>,
    pub winner: u64,
    /// Trading still has to be closed before finalizing.
    pub end_trading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AdvancePlan {
    StartTrading,
    Finalize(FinalizationPlan),
}

/// Check that `market` and `pools` belong to `proposal`.
pub(crate) fn check_linkage(
    proposal: &Proposal,
    market: &MarketState,
    pools: &[&dyn TwapOracle],
) -> LifecycleResult<()> {
    if market.market_id() != proposal.market_id() {
        return Err(LifecycleError::MarketMismatch);
    }
    if market.dao_id() != proposal.dao_id() {
        return Err(LifecycleError::DaoMismatch);
    }
    if market.outcome_count() != proposal.outcome_count() {
        return Err(LifecycleError::OutcomeCountMismatch {
            proposal: proposal.outcome_count(),
            market: market.outcome_count(),
        });
    }
    if pools.len() != proposal.pool_ids().len() {
        return Err(LifecycleError::PoolCountMismatch {
            expected: proposal.pool_ids().len(),
            actual: pools.len(),
        });
    }
    if let Some(outcome) = pools
        .iter()
        .zip(proposal.pool_ids())
        .position(|(pool, expected)| pool.pool_id() != *expected)
    {
        return Err(LifecycleError::PoolMismatch { outcome });
    }
    Ok(())
}

fn ensure_trading_over(market: &MarketState, now: Timestamp) -> LifecycleResult<()> {
    let trading_end = market
        .trading_end_time()
        .ok_or(LifecycleError::TradingEndUnknown)?;
    if now < trading_end {
        return Err(LifecycleError::InTradingPeriod { now, trading_end });
    }
    Ok(())
}

fn plan_finalization(
    proposal: &Proposal,
    market: &MarketState,
    pools: &[&dyn TwapOracle],
    clock: &dyn Clock,
    end_trading: bool,
) -> LifecycleResult<FinalizationPlan> {
    if end_trading {
        market.ensure_can_end_trading()?;
    }
    let twaps = pools
        .iter()
        .map(|pool| pool.get_twap(clock))
        .collect::<Result<Vec<_>, _>>()?;
    let winner = select_winner(&twaps, proposal.twap_threshold_bps());
    market.ensure_can_finalize(winner, end_trading)?;

    debug!(
        proposal = %ShortId::of(&proposal.id()),
        ?twaps,
        winner,
        "TWAP tally"
    );
    Ok(FinalizationPlan {
        twaps,
        winner,
        end_trading,
    })
}

/// Work out the next transition without changing anything.
pub(crate) fn prepare_advance(
    proposal: &Proposal,
    market: &MarketState,
    pools: &[&dyn TwapOracle],
    clock: &dyn Clock,
) -> LifecycleResult<AdvancePlan> {
    check_linkage(proposal, market, pools)?;
    let now = clock.timestamp_ms();

    match proposal.stage() {
        ProposalStage::Review => {
            let ready_at = proposal
                .market_initialized_at()
                .saturating_add(proposal.review_period_ms());
            if now < ready_at {
                return Err(LifecycleError::ReviewPeriodNotElapsed { now, ready_at });
            }
            market.assert_in_trading_or_pre_trading()?;
            market.ensure_can_start_trading(proposal.trading_period_ms(), now)?;
            Ok(AdvancePlan::StartTrading)
        }
        ProposalStage::Trading => {
            market.assert_trading_active()?;
            ensure_trading_over(market, now)?;
            plan_finalization(proposal, market, pools, clock, true).map(AdvancePlan::Finalize)
        }
        stage @ (ProposalStage::Premarket | ProposalStage::Finalized) => {
            Err(LifecycleError::InvalidStateTransition { stage })
        }
    }
}

fn emit_stage_change(
    proposal: &Proposal,
    old_stage: ProposalStage,
    now: Timestamp,
    outbox: &mut Outbox,
) {
    info!(
        proposal = %ShortId::of(&proposal.id()),
        from = ?old_stage,
        to = ?proposal.stage(),
        "Proposal stage changed"
    );
    outbox.emit(GovernanceEvent::ProposalStateChanged {
        dao_id: proposal.dao_id(),
        proposal_id: proposal.id(),
        old_stage: old_stage.as_u8(),
        new_stage: proposal.stage().as_u8(),
        winning_outcome: proposal.winning_outcome(),
        timestamp: now,
    });
}

fn apply_finalization(
    proposal: &mut Proposal,
    market: &mut MarketState,
    plan: FinalizationPlan,
    clock: &dyn Clock,
    outbox: &mut Outbox,
) -> LifecycleResult<()> {
    if plan.end_trading {
        market.end_trading(clock, outbox)?;
    }
    market.finalize(plan.winner, clock, outbox)?;

    let now = clock.timestamp_ms();
    for (outcome, twap) in plan.twaps.iter().enumerate() {
        outbox.emit(GovernanceEvent::TwapRecorded {
            dao_id: proposal.dao_id(),
            proposal_id: proposal.id(),
            outcome: outcome as u64,
            twap: *twap,
            timestamp: now,
        });
    }

    let winner = plan.winner;
    let approved = winner != 0;
    proposal.record_finalization(plan.twaps, winner, now);

    info!(
        proposal = %ShortId::of(&proposal.id()),
        winner,
        approved,
        "Proposal finalized"
    );
    outbox.emit(GovernanceEvent::ProposalFinalized {
        dao_id: proposal.dao_id(),
        proposal_id: proposal.id(),
        winning_outcome: winner,
        approved,
        timestamp: now,
    });
    let verdict = if approved { "approved" } else { "rejected" };
    metric_inc!(PROPOSALS_FINALIZED, &[verdict]);
    Ok(())
}

/// Apply a plan produced by `prepare_advance`. Returns true if the proposal
/// reached `Finalized`.
pub(crate) fn apply_advance(
    proposal: &mut Proposal,
    market: &mut MarketState,
    plan: AdvancePlan,
    clock: &dyn Clock,
    outbox: &mut Outbox,
) -> LifecycleResult<bool> {
    let old_stage = proposal.stage();
    let finalized = match plan {
        AdvancePlan::StartTrading => {
            market.start_trading(proposal.trading_period_ms(), clock, outbox)?;
            proposal.set_stage(ProposalStage::Trading);
            false
        }
        AdvancePlan::Finalize(plan) => {
            apply_finalization(proposal, market, plan, clock, outbox)?;
            true
        }
    };
    emit_stage_change(proposal, old_stage, clock.timestamp_ms(), outbox);
    Ok(finalized)
}

/// Move a proposal one stage forward if its time guard has passed.
///
/// Returns `true` when the call finalized the proposal. Safe to call
/// repeatedly: early calls fail with a timing error, late ones with a
/// state error.
pub fn try_advance_state(
    proposal: &mut Proposal,
    market: &mut MarketState,
    pools: &[&dyn TwapOracle],
    clock: &dyn Clock,
    outbox: &mut Outbox,
) -> LifecycleResult<bool> {
    let plan = prepare_advance(proposal, market, pools, clock)?;
    apply_advance(proposal, market, plan, clock, outbox)
}

/// Tally TWAPs and finalize a proposal whose market has already closed.
///
/// Returns the winning outcome.
pub fn finalize(
    proposal: &mut Proposal,
    market: &mut MarketState,
    pools: &[&dyn TwapOracle],
    clock: &dyn Clock,
    outbox: &mut Outbox,
) -> LifecycleResult<u64> {
    check_linkage(proposal, market, pools)?;
    if proposal.stage() != ProposalStage::Trading {
        return Err(LifecycleError::InvalidStateTransition {
            stage: proposal.stage(),
        });
    }
    market.assert_not_finalized()?;
    ensure_trading_over(market, clock.timestamp_ms())?;

    let plan = plan_finalization(proposal, market, pools, clock, false)?;
    let winner = plan.winner;
    apply_finalization(proposal, market, plan, clock, outbox)?;
    Ok(winner)
}
