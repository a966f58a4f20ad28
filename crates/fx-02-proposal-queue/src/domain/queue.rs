//! # Proposal Queue - Fee Priority, Eviction and Slot Accounting
//!
//! ## Data Structures
//!
//! - `proposals`: entries sorted by priority, descending. FIFO among equal
//!   priority. At most `max_queue_size` (≤ 50) entries, so linear scans are fine.
//! - `slots`: counting semaphore over active proposals.
//! - `dao_slot`: exclusive handle on the DAO's own liquidity.
//!
//! ## Atomicity
//!
//! Every operation validates first and mutates after. An `Err` return leaves
//! the queue untouched and stages nothing in the outbox.

use super::admission::{ConcurrencySlots, DaoLiquiditySlot};
use super::entities::QueuedProposal;
use super::errors::{QueueError, QueueResult};
use super::fees::{calculate_min_fee, MAX_FEE};
use crate::config::QueueConfig;
use fx_telemetry::{
    metric_inc, ACTIVE_PROPOSALS, PROPOSALS_ACTIVATED, PROPOSALS_EVICTED, PROPOSALS_QUEUED,
    PROPOSALS_REJECTED, QUEUE_DEPTH,
};
use shared_bus::{GovernanceEvent, Outbox, RefundOwed, RefundReason};
use shared_types::{
    Address, Asset, Balance, Clock, DaoId, Hash, ProposalId, ShortId, Timestamp,
};
use tracing::{debug, info, warn};

/// Result of a submission.
#[derive(Debug)]
pub enum Admission<S: Asset> {
    /// A slot was free and the queue empty: the slot is now held and the
    /// caller must create the proposal from the returned entry.
    Immediate(QueuedProposal<S>),
    /// The entry is waiting in the queue.
    Queued { position: usize },
}

/// Per-DAO admission queue.
///
/// `S` is the stable asset that DAO-funded bonds are held in.
#[derive(Debug)]
pub struct ProposalQueue<S: Asset> {
    dao_id: DaoId,
    config: QueueConfig,
    /// Sorted by priority, descending.
    proposals: Vec<QueuedProposal<S>>,
    slots: ConcurrencySlots,
    dao_slot: DaoLiquiditySlot,
    /// Attached to every refund record this queue issues.
    refund_capability: Option<Hash>,
}

impl<S: Asset> ProposalQueue<S> {
    /// Creates an empty queue for `dao_id`.
    pub fn new(dao_id: DaoId, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        Ok(Self {
            dao_id,
            slots: ConcurrencySlots::new(config.max_concurrent_proposals),
            config,
            proposals: Vec::new(),
            dao_slot: DaoLiquiditySlot::new(),
            refund_capability: None,
        })
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    /// Minimum fee a new entry must pay at the current occupancy.
    pub fn calculate_min_fee(&self) -> u64 {
        calculate_min_fee(self.proposals.len(), self.config.max_queue_size)
    }

    /// True iff a proposal with this funding mode could take a slot now.
    pub fn can_create_immediately(&self, uses_dao_liquidity: bool) -> bool {
        !self.slots.is_full() && (!uses_dao_liquidity || !self.dao_slot.is_occupied())
    }

    /// Admit a proposal: activate it at once when the queue is empty and a
    /// slot is free, otherwise [`insert`](Self::insert) it.
    pub fn submit(
        &mut self,
        proposal: QueuedProposal<S>,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) -> QueueResult<Admission<S>> {
        if !(self.proposals.is_empty()
            && self.can_create_immediately(proposal.uses_dao_liquidity()))
        {
            let position = self.insert(proposal, clock, outbox)?;
            return Ok(Admission::Queued { position });
        }

        let proposal_id = proposal.proposal_id();
        let checked = self
            .validate_entry(&proposal)
            .and_then(|()| self.check_fee(proposal.fee()));
        if let Err(e) = checked {
            return Err(self.rejected(&proposal_id, e));
        }

        self.occupy(proposal_id, proposal.uses_dao_liquidity())?;

        info!(
            dao = %ShortId::of(&self.dao_id),
            proposal = %ShortId::of(&proposal_id),
            fee = proposal.fee(),
            "Proposal admitted immediately"
        );
        self.emit_activated(&proposal, outbox);
        Ok(Admission::Immediate(proposal))
    }

    /// Queue a proposal, evicting the weakest proposer-funded entry if the
    /// proposer-funded capacity is reached. Returns the insertion position.
    ///
    /// # Errors
    /// - `DaoMismatch`, `DuplicateProposal`, `BondMismatch` on malformed entries
    /// - `FeeTooLow` / `FeeTooHigh` outside `[calculate_min_fee(), MAX_FEE]`
    /// - `QueueFull` at `max_queue_size`
    /// - `DaoSlotUnavailable` for a DAO-funded entry while the DAO slot is
    ///   held and every concurrency slot is in use
    /// - `ProposerFundedFull` when no proposer-funded entry is strictly weaker
    pub fn insert(
        &mut self,
        proposal: QueuedProposal<S>,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) -> QueueResult<usize> {
        let proposal_id = proposal.proposal_id();
        self.insert_checked(proposal, clock, outbox)
            .map_err(|e| self.rejected(&proposal_id, e))
    }

    fn insert_checked(
        &mut self,
        proposal: QueuedProposal<S>,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) -> QueueResult<usize> {
        self.validate_entry(&proposal)?;
        self.check_fee(proposal.fee())?;

        if self.proposals.len() >= self.config.max_queue_size {
            return Err(QueueError::QueueFull {
                capacity: self.config.max_queue_size,
            });
        }

        // A DAO-funded entry may still queue for the single slot while
        // another DAO-funded proposal holds it, as long as concurrency is free.
        if proposal.uses_dao_liquidity() && self.slots.is_full() {
            if let Some(holder) = self.dao_slot.holder() {
                return Err(QueueError::DaoSlotUnavailable {
                    holder: ShortId::of(&holder),
                    capacity: self.slots.capacity(),
                });
            }
        }

        let eviction = if !proposal.uses_dao_liquidity()
            && self.proposer_funded_count() >= self.config.max_proposer_funded
        {
            Some(self.plan_eviction(proposal.priority())?)
        } else {
            None
        };

        // Checks done; mutate.
        let now = clock.timestamp_ms();
        if let Some(index) = eviction {
            self.evict(index, proposal.proposal_id(), now, outbox);
        }

        let position = self.insertion_index(proposal.priority());
        info!(
            dao = %ShortId::of(&self.dao_id),
            proposal = %ShortId::of(&proposal.proposal_id()),
            fee = proposal.fee(),
            position,
            "Proposal queued"
        );
        outbox.emit(GovernanceEvent::ProposalQueued {
            dao_id: self.dao_id,
            proposal_id: proposal.proposal_id(),
            proposer: proposal.proposer(),
            fee: proposal.fee(),
            priority: proposal.priority(),
            uses_dao_liquidity: proposal.uses_dao_liquidity(),
            position,
            timestamp: now,
        });
        self.proposals.insert(position, proposal);

        PROPOSALS_QUEUED.inc();
        self.record_gauges();
        Ok(position)
    }

    /// Identity, duplicate, bond and fee-cap checks shared by every entry path.
    fn validate_entry(&self, proposal: &QueuedProposal<S>) -> QueueResult<()> {
        if proposal.dao_id() != self.dao_id {
            return Err(QueueError::dao_mismatch(&self.dao_id, &proposal.dao_id()));
        }
        if self.contains(&proposal.proposal_id()) {
            return Err(QueueError::DuplicateProposal(ShortId::of(
                &proposal.proposal_id(),
            )));
        }
        proposal.check_bond()
    }

    fn check_fee(&self, fee: u64) -> QueueResult<()> {
        if fee > MAX_FEE {
            return Err(QueueError::FeeTooHigh {
                fee,
                maximum: MAX_FEE,
            });
        }
        let minimum = self.calculate_min_fee();
        if fee < minimum {
            return Err(QueueError::FeeTooLow { fee, minimum });
        }
        Ok(())
    }

    /// Index of the weakest proposer-funded entry, if `priority` beats it.
    ///
    /// The queue is sorted descending, so the weakest proposer-funded entry
    /// is the one nearest the tail. DAO-funded entries are never evicted.
    fn plan_eviction(&self, priority: u64) -> QueueResult<usize> {
        let weakest = self
            .proposals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, p)| !p.uses_dao_liquidity());

        match weakest {
            Some((index, incumbent)) if priority > incumbent.priority() => Ok(index),
            other => Err(QueueError::ProposerFundedFull {
                limit: self.config.max_proposer_funded,
                priority,
                weakest: other.map_or(0, |(_, p)| p.priority()),
            }),
        }
    }

    fn evict(&mut self, index: usize, evicted_by: ProposalId, now: Timestamp, outbox: &mut Outbox) {
        let evicted = self.proposals.remove(index);
        let proposal_id = evicted.proposal_id();
        let proposer = evicted.proposer();
        let fee = evicted.fee();

        // Bond is destroyed and its value is owed back through the refund
        // record. The fee is forfeited and only noted on the record.
        let (_, bond) = evicted.into_parts();
        let bond_amount = bond.map_or(0, Balance::withdraw_all);

        warn!(
            dao = %ShortId::of(&self.dao_id),
            evicted = %ShortId::of(&proposal_id),
            evicted_by = %ShortId::of(&evicted_by),
            fee_forfeited = fee,
            "Proposal evicted"
        );
        outbox.emit(GovernanceEvent::ProposalEvicted {
            dao_id: self.dao_id,
            proposal_id,
            proposer,
            evicted_by,
            fee_forfeited: fee,
            timestamp: now,
        });
        outbox.owe_refund(RefundOwed::new(
            self.dao_id,
            proposal_id,
            proposer,
            bond_amount,
            fee,
            RefundReason::Evicted,
            Some(evicted_by),
            self.refund_capability,
            now,
        ));
        PROPOSALS_EVICTED.inc();
    }

    /// Position before the first entry with strictly lower priority.
    fn insertion_index(&self, priority: u64) -> usize {
        self.proposals.partition_point(|p| p.priority() >= priority)
    }

    fn rejected(&self, proposal_id: &ProposalId, error: QueueError) -> QueueError {
        warn!(
            dao = %ShortId::of(&self.dao_id),
            proposal = %ShortId::of(proposal_id),
            kind = %error.kind(),
            error = %error,
            "Proposal rejected"
        );
        metric_inc!(PROPOSALS_REJECTED, &[&error.kind().to_string()]);
        error
    }

    // =========================================================================
    // ACTIVATION / COMPLETION
    // =========================================================================

    /// Take the slots a proposal with this funding mode needs.
    fn occupy(&mut self, proposal_id: ProposalId, uses_dao_liquidity: bool) -> QueueResult<()> {
        if self.slots.is_full() {
            return Err(QueueError::ConcurrencyFull {
                capacity: self.slots.capacity(),
            });
        }
        if uses_dao_liquidity {
            if let Some(holder) = self.dao_slot.holder() {
                return Err(QueueError::DaoSlotUnavailable {
                    holder: ShortId::of(&holder),
                    capacity: self.slots.capacity(),
                });
            }
        }

        let acquired = self.slots.try_acquire()
            && (!uses_dao_liquidity || self.dao_slot.try_acquire(proposal_id));
        debug_assert!(acquired, "slot availability checked above");
        Ok(())
    }

    fn emit_activated(&self, proposal: &QueuedProposal<S>, outbox: &mut Outbox) {
        outbox.emit(GovernanceEvent::ProposalActivated {
            dao_id: self.dao_id,
            proposal_id: proposal.proposal_id(),
            uses_dao_liquidity: proposal.uses_dao_liquidity(),
            active_count: self.slots.in_use(),
        });
        PROPOSALS_ACTIVATED.inc();
        self.record_gauges();
    }

    /// Remove and return the highest-priority entry that can activate now.
    ///
    /// Entries blocked on the DAO slot are skipped but left in place, so a
    /// later call can pick them up once the slot frees.
    pub fn try_activate_next(&mut self, outbox: &mut Outbox) -> Option<QueuedProposal<S>> {
        if self.slots.is_full() {
            debug!(dao = %ShortId::of(&self.dao_id), "No free slot for activation");
            return None;
        }

        let dao_slot_free = !self.dao_slot.is_occupied();
        let index = self
            .proposals
            .iter()
            .position(|p| !p.uses_dao_liquidity() || dao_slot_free)?;

        let (proposal_id, uses_dao_liquidity) = {
            let p = &self.proposals[index];
            (p.proposal_id(), p.uses_dao_liquidity())
        };
        self.occupy(proposal_id, uses_dao_liquidity).ok()?;
        let proposal = self.proposals.remove(index);

        info!(
            dao = %ShortId::of(&self.dao_id),
            proposal = %ShortId::of(&proposal_id),
            skipped = index,
            active = self.slots.in_use(),
            "Proposal activated"
        );
        self.emit_activated(&proposal, outbox);
        Some(proposal)
    }

    /// Check that `mark_proposal_completed(uses_dao_liquidity)` would succeed.
    pub fn ensure_can_complete(&self, uses_dao_liquidity: bool) -> QueueResult<()> {
        self.slots.ensure_can_release()?;
        if uses_dao_liquidity {
            self.dao_slot.ensure_can_release()?;
        }
        Ok(())
    }

    /// Release the slots held by a finished proposal. Must be called exactly
    /// once per activation; a second call fails instead of underflowing.
    pub fn mark_proposal_completed(
        &mut self,
        uses_dao_liquidity: bool,
        outbox: &mut Outbox,
    ) -> QueueResult<()> {
        self.ensure_can_complete(uses_dao_liquidity)?;

        self.slots.release()?;
        if uses_dao_liquidity {
            self.dao_slot.release()?;
        }

        info!(
            dao = %ShortId::of(&self.dao_id),
            uses_dao_liquidity,
            active = self.slots.in_use(),
            "Proposal completed, slot released"
        );
        outbox.emit(GovernanceEvent::ProposalCompleted {
            dao_id: self.dao_id,
            uses_dao_liquidity,
            active_count: self.slots.in_use(),
        });
        self.record_gauges();
        Ok(())
    }

    // =========================================================================
    // PROPOSER ACTIONS
    // =========================================================================

    fn index_for_proposer(&self, proposal_id: &ProposalId, caller: &Address) -> QueueResult<usize> {
        let index = self
            .position_of(proposal_id)
            .ok_or_else(|| QueueError::not_found(proposal_id))?;
        if self.proposals[index].proposer() != *caller {
            return Err(QueueError::NotProposer(ShortId::of(proposal_id)));
        }
        Ok(index)
    }

    /// Withdraw a queued proposal. Returns the fee and bond for refunding.
    pub fn cancel_proposal(
        &mut self,
        proposal_id: &ProposalId,
        caller: &Address,
        outbox: &mut Outbox,
    ) -> QueueResult<(u64, Option<Balance<S>>)> {
        let index = self.index_for_proposer(proposal_id, caller)?;
        let removed = self.proposals.remove(index);
        let fee = removed.fee();
        let proposer = removed.proposer();
        let (_, bond) = removed.into_parts();
        let bond_returned = bond.as_ref().map_or(0, Balance::value);

        info!(
            dao = %ShortId::of(&self.dao_id),
            proposal = %ShortId::of(proposal_id),
            fee,
            bond_returned,
            "Proposal cancelled"
        );
        outbox.emit(GovernanceEvent::ProposalCancelled {
            dao_id: self.dao_id,
            proposal_id: *proposal_id,
            proposer,
            fee_returned: fee,
            bond_returned,
        });
        self.record_gauges();
        Ok((fee, bond))
    }

    /// Top up a queued proposal's fee (capped at `MAX_FEE`) and move it to
    /// its new sorted position. Returns that position.
    pub fn update_proposal_fee(
        &mut self,
        proposal_id: &ProposalId,
        additional_fee: u64,
        caller: &Address,
        outbox: &mut Outbox,
    ) -> QueueResult<usize> {
        let index = self.index_for_proposer(proposal_id, caller)?;

        let mut entry = self.proposals.remove(index);
        let old_fee = entry.fee();
        let new_fee = old_fee.saturating_add(additional_fee).min(MAX_FEE);
        entry.set_fee(new_fee);

        let position = self.insertion_index(entry.priority());
        self.proposals.insert(position, entry);

        info!(
            dao = %ShortId::of(&self.dao_id),
            proposal = %ShortId::of(proposal_id),
            old_fee,
            new_fee,
            from = index,
            to = position,
            "Proposal fee updated"
        );
        outbox.emit(GovernanceEvent::ProposalFeeUpdated {
            dao_id: self.dao_id,
            proposal_id: *proposal_id,
            old_fee,
            new_fee,
            new_position: position,
        });
        Ok(position)
    }

    // =========================================================================
    // REFUND CAPABILITY
    // =========================================================================

    /// Install the capability that tags refund records from this queue.
    /// Returns the one it replaced.
    pub fn set_refund_capability(&mut self, capability: Hash) -> Option<Hash> {
        self.refund_capability.replace(capability)
    }

    pub fn take_refund_capability(&mut self) -> Option<Hash> {
        self.refund_capability.take()
    }

    pub fn refund_capability(&self) -> Option<Hash> {
        self.refund_capability
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn dao_id(&self) -> DaoId {
        self.dao_id
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn contains(&self, proposal_id: &ProposalId) -> bool {
        self.position_of(proposal_id).is_some()
    }

    pub fn get(&self, proposal_id: &ProposalId) -> Option<&QueuedProposal<S>> {
        self.proposals.iter().find(|p| p.proposal_id() == *proposal_id)
    }

    pub fn position_of(&self, proposal_id: &ProposalId) -> Option<usize> {
        self.proposals
            .iter()
            .position(|p| p.proposal_id() == *proposal_id)
    }

    /// Entries in priority order, highest first.
    pub fn proposals(&self) -> &[QueuedProposal<S>] {
        &self.proposals
    }

    pub fn proposer_funded_count(&self) -> usize {
        self.proposals
            .iter()
            .filter(|p| !p.uses_dao_liquidity())
            .count()
    }

    pub fn active_proposal_count(&self) -> u64 {
        self.slots.in_use()
    }

    pub fn is_dao_slot_occupied(&self) -> bool {
        self.dao_slot.is_occupied()
    }

    /// Proposal currently holding the DAO liquidity slot.
    pub fn dao_liquidity_holder(&self) -> Option<ProposalId> {
        self.dao_slot.holder()
    }

    fn record_gauges(&self) {
        let dao = ShortId::of(&self.dao_id).to_string();
        QUEUE_DEPTH
            .with_label_values(&[&dao])
            .set(self.proposals.len() as f64);
        ACTIVE_PROPOSALS
            .with_label_values(&[&dao])
            .set(self.slots.in_use() as f64);
    }
}
