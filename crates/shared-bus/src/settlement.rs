//! # Settlement Orders
//!
//! Finalizing a proposal moves its escrowed fee and its outcome liquidity.
//! Both movements are staged as [`SettlementOrder`]s in the finalizing
//! operation's outbox and land in a [`SettlementLedger`] on commit. An
//! executor then carries out each order on its own and acknowledges it once
//! its port succeeded, so a failed redemption never repeats a fee payment.

use crate::ledger::{Ledger, LedgerRecord};
use serde::{Deserialize, Serialize};
use shared_types::{Address, DaoId, MarketId, ProposalId, Timestamp};
use uuid::Uuid;

/// A single movement of funds owed after finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// The baseline outcome won.
    FeeToTreasury { amount: u64 },
    /// A challenger won; its creator receives the fee.
    FeeToCreator { recipient: Address, amount: u64 },
    /// DAO-funded liquidity returns to the DAO pool.
    RedeemToDao { winning_outcome: u64 },
    /// Proposer-funded liquidity returns to its provider.
    RedeemToProvider {
        provider: Address,
        winning_outcome: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOrder {
    pub id: Uuid,
    pub dao_id: DaoId,
    pub proposal_id: ProposalId,
    pub market_id: MarketId,
    pub settlement: Settlement,
    pub created_at: Timestamp,
}

impl SettlementOrder {
    pub fn new(
        dao_id: DaoId,
        proposal_id: ProposalId,
        market_id: MarketId,
        settlement: Settlement,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dao_id,
            proposal_id,
            market_id,
            settlement,
            created_at,
        }
    }

    #[must_use]
    pub fn is_fee(&self) -> bool {
        matches!(
            self.settlement,
            Settlement::FeeToTreasury { .. } | Settlement::FeeToCreator { .. }
        )
    }
}

impl LedgerRecord for SettlementOrder {
    const KIND: &'static str = "settlement";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    /// Fee orders move their amount; redemptions are sized by the pools.
    fn amount(&self) -> u64 {
        match self.settlement {
            Settlement::FeeToTreasury { amount } | Settlement::FeeToCreator { amount, .. } => amount,
            Settlement::RedeemToDao { .. } | Settlement::RedeemToProvider { .. } => 0,
        }
    }
}

/// Committed settlement orders not yet carried out.
pub type SettlementLedger = Ledger<SettlementOrder>;
