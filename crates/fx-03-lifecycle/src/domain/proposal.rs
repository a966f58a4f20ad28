//! Proposal entity.

use crate::config::LifecycleConfig;
use serde::{Deserialize, Serialize};
use shared_types::{derive_id, Address, DaoId, MarketId, PoolId, ProposalId, Timestamp};

/// Lifecycle stage. The discriminant is the stage number carried in events.
///
/// `Premarket` is declared for completeness; no transition enters or leaves
/// it here, and a proposal found in it aborts with `InvalidStateTransition`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProposalStage {
    Premarket = 0,
    Review = 1,
    Trading = 2,
    Finalized = 3,
}

impl ProposalStage {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A proposal under futarchy governance.
///
/// Created in `Review` when its queue entry activates. References its
/// `MarketState` by id but does not own it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    dao_id: DaoId,
    market_id: MarketId,
    proposer: Address,
    title: String,
    stage: ProposalStage,
    outcome_messages: Vec<String>,
    outcome_creators: Vec<Address>,
    /// One AMM pool per outcome, index-aligned with `outcome_messages`.
    pool_ids: Vec<PoolId>,
    market_initialized_at: Timestamp,
    /// Timing snapshot taken at creation.
    timing: LifecycleConfig,
    fee_escrow: u64,
    uses_dao_liquidity: bool,
    /// `None` for DAO-funded proposals.
    liquidity_provider: Option<Address>,
    twap_prices: Vec<u128>,
    last_twap_update: Option<Timestamp>,
    winning_outcome: Option<u64>,
    finalized_at: Option<Timestamp>,
}

impl Proposal {
    /// Market id of a proposal: stable across runs for the same DAO and proposal.
    pub fn market_id_for(dao_id: &DaoId, proposal_id: &ProposalId) -> MarketId {
        derive_id(b"market", &[dao_id, proposal_id])
    }

    /// Pool id of one outcome of a market.
    pub fn pool_id_for(market_id: &MarketId, outcome: usize) -> PoolId {
        derive_id(b"pool", &[market_id, &(outcome as u64).to_le_bytes()])
    }

    /// New proposal in `Review`, with every outcome created by the proposer.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProposalId,
        dao_id: DaoId,
        proposer: Address,
        title: String,
        outcome_messages: Vec<String>,
        fee_escrow: u64,
        uses_dao_liquidity: bool,
        timing: LifecycleConfig,
        now: Timestamp,
    ) -> Self {
        let market_id = Self::market_id_for(&dao_id, &id);
        let outcomes = outcome_messages.len();
        Self {
            id,
            dao_id,
            market_id,
            proposer,
            title,
            stage: ProposalStage::Review,
            outcome_creators: vec![proposer; outcomes],
            pool_ids: (0..outcomes)
                .map(|i| Self::pool_id_for(&market_id, i))
                .collect(),
            outcome_messages,
            market_initialized_at: now,
            timing,
            fee_escrow,
            uses_dao_liquidity,
            liquidity_provider: (!uses_dao_liquidity).then_some(proposer),
            twap_prices: Vec::new(),
            last_twap_update: None,
            winning_outcome: None,
            finalized_at: None,
        }
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    pub fn id(&self) -> ProposalId {
        self.id
    }

    pub fn dao_id(&self) -> DaoId {
        self.dao_id
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn proposer(&self) -> Address {
        self.proposer
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn stage(&self) -> ProposalStage {
        self.stage
    }

    pub fn outcome_count(&self) -> u64 {
        self.outcome_messages.len() as u64
    }

    pub fn outcome_messages(&self) -> &[String] {
        &self.outcome_messages
    }

    pub fn outcome_creator(&self, outcome: u64) -> Option<Address> {
        usize::try_from(outcome)
            .ok()
            .and_then(|i| self.outcome_creators.get(i))
            .copied()
    }

    pub fn pool_ids(&self) -> &[PoolId] {
        &self.pool_ids
    }

    pub fn market_initialized_at(&self) -> Timestamp {
        self.market_initialized_at
    }

    pub fn timing(&self) -> &LifecycleConfig {
        &self.timing
    }

    pub fn review_period_ms(&self) -> u64 {
        self.timing.review_period_ms
    }

    pub fn trading_period_ms(&self) -> u64 {
        self.timing.trading_period_ms
    }

    pub fn twap_threshold_bps(&self) -> u64 {
        self.timing.twap_threshold_bps
    }

    /// Fee still held for settlement.
    pub fn fee_escrow(&self) -> u64 {
        self.fee_escrow
    }

    pub fn uses_dao_liquidity(&self) -> bool {
        self.uses_dao_liquidity
    }

    pub fn liquidity_provider(&self) -> Option<Address> {
        self.liquidity_provider
    }

    pub fn twap_prices(&self) -> &[u128] {
        &self.twap_prices
    }

    pub fn last_twap_update(&self) -> Option<Timestamp> {
        self.last_twap_update
    }

    pub fn winning_outcome(&self) -> Option<u64> {
        self.winning_outcome
    }

    pub fn finalized_at(&self) -> Option<Timestamp> {
        self.finalized_at
    }

    pub fn is_finalized(&self) -> bool {
        self.stage == ProposalStage::Finalized
    }

    // =========================================================================
    // SETTERS
    // =========================================================================

    /// Hand an outcome over to a new creator, who receives the fee if it wins.
    pub fn set_outcome_creator(&mut self, outcome: u64, creator: Address) -> bool {
        match usize::try_from(outcome)
            .ok()
            .and_then(|i| self.outcome_creators.get_mut(i))
        {
            Some(slot) => {
                *slot = creator;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_stage(&mut self, stage: ProposalStage) {
        self.stage = stage;
    }

    pub(crate) fn record_finalization(&mut self, twaps: Vec<u128>, winner: u64, now: Timestamp) {
        self.twap_prices = twaps;
        self.last_twap_update = Some(now);
        self.winning_outcome = Some(winner);
        self.finalized_at = Some(now);
        self.stage = ProposalStage::Finalized;
    }

    /// Empty the fee escrow, returning what it held.
    pub(crate) fn take_fee_escrow(&mut self) -> u64 {
        std::mem::take(&mut self.fee_escrow)
    }
}
