//! Lifecycle Coordinator Service
//!
//! Connects the admission queue to proposal creation and orders settlement
//! on the finalizing transition.

use crate::config::{LifecycleConfig, LifecycleConfigUpdate};
use crate::domain::errors::{LifecycleError, LifecycleResult};
use crate::domain::proposal::Proposal;
use crate::domain::transitions::{apply_advance, prepare_advance, AdvancePlan};
use crate::ports::outbound::TwapOracle;
use fx_01_market_state::{MarketError, MarketState};
use fx_02_proposal_queue::{ProposalQueue, QueuedProposal};
use shared_bus::{GovernanceEvent, Outbox, Settlement, SettlementOrder};
use shared_types::{Address, Asset, Balance, Clock, ShortId};
use tracing::{debug, info};

/// A proposal created from an activated queue entry.
#[derive(Debug)]
pub struct Activation<S: Asset> {
    pub proposal: Proposal,
    pub market: MarketState,
    /// The DAO-funded bond, released back to the proposer's custody.
    pub bond: Option<Balance<S>>,
}

/// Drives proposals from activation to settlement for one DAO configuration.
#[derive(Debug, Clone)]
pub struct LifecycleCoordinator {
    config: LifecycleConfig,
}

impl LifecycleCoordinator {
    pub fn new(config: LifecycleConfig) -> LifecycleResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Change the DAO's lifecycle parameters. Proposals already created keep
    /// the timing and threshold they were created with.
    pub fn update_config(&mut self, update: &LifecycleConfigUpdate) -> LifecycleResult<()> {
        let next = self.config.updated(update)?;
        info!(
            review_period_ms = next.review_period_ms,
            trading_period_ms = next.trading_period_ms,
            twap_threshold_bps = next.twap_threshold_bps,
            "Lifecycle config updated"
        );
        self.config = next;
        Ok(())
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    /// Pull the next eligible entry from `queue` and create its proposal.
    ///
    /// Returns `None` when no slot is free or no entry can take one.
    pub fn activate_next<S: Asset>(
        &self,
        queue: &mut ProposalQueue<S>,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) -> LifecycleResult<Option<Activation<S>>> {
        match queue.try_activate_next(outbox) {
            Some(queued) => self.create_from_admitted(queued, clock).map(Some),
            None => {
                debug!(dao = %ShortId::of(&queue.dao_id()), "Nothing to activate");
                Ok(None)
            }
        }
    }

    /// Create the proposal and market for an entry that already holds a slot,
    /// either from `activate_next` or an immediate admission.
    pub fn create_from_admitted<S: Asset>(
        &self,
        queued: QueuedProposal<S>,
        clock: &dyn Clock,
    ) -> LifecycleResult<Activation<S>> {
        let proposal_id = queued.proposal_id();
        let dao_id = queued.dao_id();
        let proposer = queued.proposer();
        let fee = queued.fee();
        let uses_dao_liquidity = queued.uses_dao_liquidity();
        let (data, bond) = queued.into_parts();

        let proposal = Proposal::new(
            proposal_id,
            dao_id,
            proposer,
            data.title().to_string(),
            data.outcome_messages().to_vec(),
            fee,
            uses_dao_liquidity,
            self.config.clone(),
            clock.timestamp_ms(),
        );
        let market = MarketState::new(
            proposal.market_id(),
            dao_id,
            data.outcome_messages().to_vec(),
            clock,
        )?;

        info!(
            dao = %ShortId::of(&dao_id),
            proposal = %ShortId::of(&proposal_id),
            market = %ShortId::of(&proposal.market_id()),
            outcomes = proposal.outcome_count(),
            "Proposal created in review"
        );
        Ok(Activation {
            proposal,
            market,
            bond,
        })
    }

    // =========================================================================
    // ADVANCE + SETTLEMENT
    // =========================================================================

    /// Advance `proposal` one stage. On the finalizing transition, also
    /// release the escrowed fee, order the fee payout and the liquidity
    /// redemption, and free the proposal's queue slots, each exactly once.
    ///
    /// Fee goes to the DAO treasury when outcome 0 wins, otherwise to the
    /// winning outcome's creator. Liquidity goes back to the DAO pool for
    /// DAO-funded proposals, otherwise to the provider. Both movements are
    /// staged in `outbox` as settlement orders; no funds move until the
    /// outbox is committed and a [`SettlementExecutor`] runs.
    ///
    /// [`SettlementExecutor`]: crate::application::SettlementExecutor
    pub fn advance_and_settle<S: Asset>(
        &self,
        proposal: &mut Proposal,
        market: &mut MarketState,
        pools: &[&dyn TwapOracle],
        queue: &mut ProposalQueue<S>,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) -> LifecycleResult<bool> {
        let plan = prepare_advance(proposal, market, pools, clock)?;
        let winner = match &plan {
            AdvancePlan::Finalize(finalization) => Some(finalization.winner),
            AdvancePlan::StartTrading => None,
        };
        let Some(winner) = winner else {
            return apply_advance(proposal, market, plan, clock, outbox);
        };

        if queue.dao_id() != proposal.dao_id() {
            return Err(LifecycleError::DaoMismatch);
        }
        market.assert_not_finalized()?;
        let uses_dao_liquidity = proposal.uses_dao_liquidity();
        queue.ensure_can_complete(uses_dao_liquidity)?;
        let fee_recipient = self.fee_recipient(proposal, winner)?;

        let finalized = apply_advance(proposal, market, plan, clock, outbox)?;
        market.assert_market_finalized()?;
        let amount = proposal.take_fee_escrow();
        queue.mark_proposal_completed(uses_dao_liquidity, outbox)?;
        self.stage_settlement(proposal, winner, fee_recipient, amount, clock, outbox);
        Ok(finalized)
    }

    fn stage_settlement(
        &self,
        proposal: &Proposal,
        winner: u64,
        fee_recipient: Option<Address>,
        amount: u64,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) {
        let now = clock.timestamp_ms();
        let fee = match fee_recipient {
            None => Settlement::FeeToTreasury { amount },
            Some(recipient) => Settlement::FeeToCreator { recipient, amount },
        };
        let provider = proposal.liquidity_provider();
        let redemption = match provider {
            None => Settlement::RedeemToDao {
                winning_outcome: winner,
            },
            Some(provider) => Settlement::RedeemToProvider {
                provider,
                winning_outcome: winner,
            },
        };
        for settlement in [fee, redemption] {
            outbox.order_settlement(SettlementOrder::new(
                proposal.dao_id(),
                proposal.id(),
                proposal.market_id(),
                settlement,
                now,
            ));
        }

        info!(
            proposal = %ShortId::of(&proposal.id()),
            winner,
            fee = amount,
            to_treasury = fee_recipient.is_none(),
            "Proposal settlement ordered"
        );
        outbox.emit(GovernanceEvent::ProposalFeeDistributed {
            dao_id: proposal.dao_id(),
            proposal_id: proposal.id(),
            recipient: fee_recipient,
            amount,
        });
        outbox.emit(GovernanceEvent::LiquidityRedeemed {
            dao_id: proposal.dao_id(),
            proposal_id: proposal.id(),
            provider,
            winning_outcome: winner,
        });
    }

    /// `None` means the DAO treasury.
    fn fee_recipient(&self, proposal: &Proposal, winner: u64) -> LifecycleResult<Option<Address>> {
        if winner == 0 {
            return Ok(None);
        }
        proposal
            .outcome_creator(winner)
            .map(Some)
            .ok_or(LifecycleError::Market(MarketError::OutcomeOutOfRange {
                outcome: winner,
                outcome_count: proposal.outcome_count(),
            }))
    }
}
