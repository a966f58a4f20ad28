//! Queue entries and the immutable proposal payload they carry.

use crate::domain::errors::{QueueError, QueueResult};
use crate::domain::fees::priority_for_fee;
use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Asset, Balance, Clock, DaoId, ProposalId, ShortId, Timestamp, MAX_OUTCOMES,
    MIN_OUTCOMES,
};
use std::fmt;

/// Proposal content as submitted. Immutable once queued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalData {
    title: String,
    metadata: String,
    outcome_messages: Vec<String>,
    outcome_details: Vec<String>,
    initial_asset_amounts: Vec<u64>,
    initial_stable_amounts: Vec<u64>,
}

impl ProposalData {
    /// Validate and build proposal content.
    ///
    /// Outcome 0 is the baseline ("reject") outcome. Every per-outcome vector
    /// must have one entry per outcome.
    pub fn new(
        title: impl Into<String>,
        metadata: impl Into<String>,
        outcome_messages: Vec<String>,
        outcome_details: Vec<String>,
        initial_asset_amounts: Vec<u64>,
        initial_stable_amounts: Vec<u64>,
    ) -> QueueResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QueueError::InvalidProposalData("empty title".into()));
        }

        let outcomes = outcome_messages.len();
        if !(MIN_OUTCOMES..=MAX_OUTCOMES).contains(&outcomes) {
            return Err(QueueError::InvalidProposalData(format!(
                "{outcomes} outcomes, expected {MIN_OUTCOMES}..={MAX_OUTCOMES}"
            )));
        }

        for (name, len) in [
            ("outcome_details", outcome_details.len()),
            ("initial_asset_amounts", initial_asset_amounts.len()),
            ("initial_stable_amounts", initial_stable_amounts.len()),
        ] {
            if len != outcomes {
                return Err(QueueError::InvalidProposalData(format!(
                    "{name} has {len} entries for {outcomes} outcomes"
                )));
            }
        }

        Ok(Self {
            title,
            metadata: metadata.into(),
            outcome_messages,
            outcome_details,
            initial_asset_amounts,
            initial_stable_amounts,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn outcome_messages(&self) -> &[String] {
        &self.outcome_messages
    }

    pub fn outcome_details(&self) -> &[String] {
        &self.outcome_details
    }

    pub fn initial_asset_amounts(&self) -> &[u64] {
        &self.initial_asset_amounts
    }

    pub fn initial_stable_amounts(&self) -> &[u64] {
        &self.initial_stable_amounts
    }

    pub fn outcome_count(&self) -> usize {
        self.outcome_messages.len()
    }
}

/// A proposal waiting in a DAO's queue.
///
/// `S` is the stable asset the DAO-funded bond is denominated in.
/// Invariant: `bond.is_some() == uses_dao_liquidity`.
pub struct QueuedProposal<S: Asset> {
    proposal_id: ProposalId,
    dao_id: DaoId,
    fee: u64,
    uses_dao_liquidity: bool,
    proposer: Address,
    timestamp: Timestamp,
    priority: u64,
    data: ProposalData,
    bond: Option<Balance<S>>,
}

impl<S: Asset> QueuedProposal<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dao_id: DaoId,
        proposal_id: ProposalId,
        proposer: Address,
        fee: u64,
        uses_dao_liquidity: bool,
        bond: Option<Balance<S>>,
        data: ProposalData,
        clock: &dyn Clock,
    ) -> QueueResult<Self> {
        if bond.is_some() != uses_dao_liquidity {
            return Err(QueueError::BondMismatch {
                uses_dao_liquidity,
                has_bond: bond.is_some(),
            });
        }

        Ok(Self {
            proposal_id,
            dao_id,
            fee,
            uses_dao_liquidity,
            proposer,
            timestamp: clock.timestamp_ms(),
            priority: priority_for_fee(fee),
            data,
            bond,
        })
    }

    pub fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    pub fn dao_id(&self) -> DaoId {
        self.dao_id
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn priority(&self) -> u64 {
        self.priority
    }

    pub fn uses_dao_liquidity(&self) -> bool {
        self.uses_dao_liquidity
    }

    pub fn proposer(&self) -> Address {
        self.proposer
    }

    /// Submission time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn data(&self) -> &ProposalData {
        &self.data
    }

    pub fn bond(&self) -> Option<&Balance<S>> {
        self.bond.as_ref()
    }

    pub fn bond_value(&self) -> u64 {
        self.bond.as_ref().map_or(0, Balance::value)
    }

    /// Re-check the bond invariant.
    pub fn check_bond(&self) -> QueueResult<()> {
        if self.bond.is_some() != self.uses_dao_liquidity {
            return Err(QueueError::BondMismatch {
                uses_dao_liquidity: self.uses_dao_liquidity,
                has_bond: self.bond.is_some(),
            });
        }
        Ok(())
    }

    /// Raise the fee to `new_fee` and recompute priority.
    pub(crate) fn set_fee(&mut self, new_fee: u64) {
        self.fee = new_fee;
        self.priority = priority_for_fee(new_fee);
    }

    /// Consume the entry, releasing its payload and bond.
    pub fn into_parts(self) -> (ProposalData, Option<Balance<S>>) {
        (self.data, self.bond)
    }
}

impl<S: Asset> fmt::Debug for QueuedProposal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedProposal")
            .field("proposal_id", &ShortId::of(&self.proposal_id))
            .field("dao_id", &ShortId::of(&self.dao_id))
            .field("fee", &self.fee)
            .field("priority", &self.priority)
            .field("uses_dao_liquidity", &self.uses_dao_liquidity)
            .field("bond", &self.bond)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
