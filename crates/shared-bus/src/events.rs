//! # Governance Events
//!
//! Every event an operation can emit. Off-chain indexers consume these; an
//! event exists only if the operation that produced it was committed.

use serde::{Deserialize, Serialize};
use shared_types::{Address, DaoId, MarketId, ProposalId, Timestamp};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    // =========================================================================
    // PROPOSAL QUEUE
    // =========================================================================
    /// A proposal entered the queue.
    ProposalQueued {
        dao_id: DaoId,
        proposal_id: ProposalId,
        proposer: Address,
        fee: u64,
        priority: u64,
        uses_dao_liquidity: bool,
        /// Zero-based position after insertion.
        position: usize,
        timestamp: Timestamp,
    },

    /// A queued proposer-funded proposal was pushed out by a higher bid.
    ProposalEvicted {
        dao_id: DaoId,
        proposal_id: ProposalId,
        proposer: Address,
        /// The proposal whose insertion caused the eviction.
        evicted_by: ProposalId,
        fee_forfeited: u64,
        timestamp: Timestamp,
    },

    /// The proposer withdrew a queued proposal.
    ProposalCancelled {
        dao_id: DaoId,
        proposal_id: ProposalId,
        proposer: Address,
        fee_returned: u64,
        bond_returned: u64,
    },

    /// The proposer topped up the fee of a queued proposal.
    ProposalFeeUpdated {
        dao_id: DaoId,
        proposal_id: ProposalId,
        old_fee: u64,
        new_fee: u64,
        new_position: usize,
    },

    /// A proposal left the queue and took an active slot.
    ProposalActivated {
        dao_id: DaoId,
        proposal_id: ProposalId,
        uses_dao_liquidity: bool,
        active_count: u64,
    },

    /// An active slot was released.
    ProposalCompleted {
        dao_id: DaoId,
        uses_dao_liquidity: bool,
        active_count: u64,
    },

    // =========================================================================
    // MARKET STATE
    // =========================================================================
    /// Trading opened on a market.
    TradingStarted {
        market_id: MarketId,
        dao_id: DaoId,
        start: Timestamp,
        end: Timestamp,
    },

    /// Trading closed on a market.
    TradingEnded {
        market_id: MarketId,
        dao_id: DaoId,
        timestamp: Timestamp,
    },

    /// A market recorded its winning outcome.
    MarketFinalized {
        market_id: MarketId,
        dao_id: DaoId,
        winning_outcome: u64,
        timestamp: Timestamp,
    },

    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// A proposal moved between stages (0 Premarket, 1 Review, 2 Trading, 3 Finalized).
    ProposalStateChanged {
        dao_id: DaoId,
        proposal_id: ProposalId,
        old_stage: u8,
        new_stage: u8,
        winning_outcome: Option<u64>,
        timestamp: Timestamp,
    },

    /// TWAP observed for one outcome at finalization.
    TwapRecorded {
        dao_id: DaoId,
        proposal_id: ProposalId,
        outcome: u64,
        twap: u128,
        timestamp: Timestamp,
    },

    /// Final verdict of a proposal.
    ProposalFinalized {
        dao_id: DaoId,
        proposal_id: ProposalId,
        winning_outcome: u64,
        /// False when the baseline ("reject") outcome won.
        approved: bool,
        timestamp: Timestamp,
    },

    // =========================================================================
    // SETTLEMENT
    // =========================================================================
    /// The escrowed proposal fee was released and its payout ordered.
    ProposalFeeDistributed {
        dao_id: DaoId,
        proposal_id: ProposalId,
        /// `None` means the DAO treasury.
        recipient: Option<Address>,
        amount: u64,
    },

    /// Redemption of outcome liquidity was ordered after finalization.
    LiquidityRedeemed {
        dao_id: DaoId,
        proposal_id: ProposalId,
        /// `None` means the DAO pool.
        provider: Option<Address>,
        winning_outcome: u64,
    },
}

impl GovernanceEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ProposalQueued { .. }
            | Self::ProposalEvicted { .. }
            | Self::ProposalCancelled { .. }
            | Self::ProposalFeeUpdated { .. }
            | Self::ProposalActivated { .. }
            | Self::ProposalCompleted { .. } => EventTopic::Queue,
            Self::TradingStarted { .. }
            | Self::TradingEnded { .. }
            | Self::MarketFinalized { .. } => EventTopic::Market,
            Self::ProposalStateChanged { .. }
            | Self::TwapRecorded { .. }
            | Self::ProposalFinalized { .. } => EventTopic::Lifecycle,
            Self::ProposalFeeDistributed { .. } | Self::LiquidityRedeemed { .. } => {
                EventTopic::Settlement
            }
        }
    }

    /// The DAO this event belongs to.
    #[must_use]
    pub fn dao_id(&self) -> DaoId {
        match self {
            Self::ProposalQueued { dao_id, .. }
            | Self::ProposalEvicted { dao_id, .. }
            | Self::ProposalCancelled { dao_id, .. }
            | Self::ProposalFeeUpdated { dao_id, .. }
            | Self::ProposalActivated { dao_id, .. }
            | Self::ProposalCompleted { dao_id, .. }
            | Self::TradingStarted { dao_id, .. }
            | Self::TradingEnded { dao_id, .. }
            | Self::MarketFinalized { dao_id, .. }
            | Self::ProposalStateChanged { dao_id, .. }
            | Self::TwapRecorded { dao_id, .. }
            | Self::ProposalFinalized { dao_id, .. }
            | Self::ProposalFeeDistributed { dao_id, .. }
            | Self::LiquidityRedeemed { dao_id, .. } => *dao_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Admission queue events.
    Queue,
    /// Market state transitions.
    Market,
    /// Proposal stage transitions and TWAP results.
    Lifecycle,
    /// Fee distribution and liquidity redemption orders.
    Settlement,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// DAOs to include. Empty means all DAOs.
    pub dao_ids: Vec<DaoId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            dao_ids: Vec::new(),
        }
    }

    /// Create a filter for events of specific DAOs.
    #[must_use]
    pub fn for_daos(dao_ids: Vec<DaoId>) -> Self {
        Self {
            topics: Vec::new(),
            dao_ids,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &GovernanceEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let dao_match = self.dao_ids.is_empty() || self.dao_ids.contains(&event.dao_id());

        topic_match && dao_match
    }
}
