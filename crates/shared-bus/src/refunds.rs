//! # Refund Ledger
//!
//! An eviction destroys the evicted entry's bond and forfeits its fee. The
//! queue leaves a [`RefundOwed`] record behind that carries the destroyed
//! bond value; the forfeited fee is recorded for reference only and is never
//! paid back. Disbursement happens out of band: a [`RefundWorker`] drains the
//! ledger through a [`RefundHandler`] and acknowledges a record only after the
//! handler succeeded, so a record may be paid more than once but never
//! silently dropped. Handlers must therefore be idempotent on
//! [`RefundOwed::id`].

use crate::ledger::{DrainReport, Ledger, LedgerRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{Address, DaoId, Hash, ProposalId, Timestamp};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Why a refund is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundReason {
    /// The queued proposal was pushed out by a higher-priority submission.
    Evicted,
}

/// A refund the platform owes to a former queue entrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundOwed {
    pub id: Uuid,
    pub dao_id: DaoId,
    pub proposal_id: ProposalId,
    pub recipient: Address,
    /// Value of the destroyed bond. This is what the recipient is owed.
    pub bond_amount: u64,
    /// Fee kept by the platform. Informational, never refunded.
    pub fee_forfeited: u64,
    pub reason: RefundReason,
    pub evicted_by: Option<ProposalId>,
    /// Refund capability of the queue that produced the record, if any.
    pub capability: Option<Hash>,
    pub created_at: Timestamp,
}

impl RefundOwed {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dao_id: DaoId,
        proposal_id: ProposalId,
        recipient: Address,
        bond_amount: u64,
        fee_forfeited: u64,
        reason: RefundReason,
        evicted_by: Option<ProposalId>,
        capability: Option<Hash>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dao_id,
            proposal_id,
            recipient,
            bond_amount,
            fee_forfeited,
            reason,
            evicted_by,
            capability,
            created_at,
        }
    }

    /// Total owed to the recipient. The forfeited fee is not part of it.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bond_amount
    }
}

/// Errors raised by refund handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefundError {
    #[error("Refund payment failed: {0}")]
    PaymentFailed(String),
}

/// Pending refunds in insertion order.
pub type RefundLedger = Ledger<RefundOwed>;

impl LedgerRecord for RefundOwed {
    const KIND: &'static str = "refund";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    fn amount(&self) -> u64 {
        self.total()
    }
}

/// Pays out a refund. Implemented by the custody layer.
#[async_trait]
pub trait RefundHandler: Send + Sync {
    async fn pay(&self, refund: &RefundOwed) -> Result<(), RefundError>;
}

/// Background consumer of the refund ledger.
pub struct RefundWorker {
    ledger: Arc<RefundLedger>,
    handler: Arc<dyn RefundHandler>,
    /// Only refunds carrying this capability are paid. `None` pays all.
    capability: Option<Hash>,
}

impl RefundWorker {
    pub fn new(ledger: Arc<RefundLedger>, handler: Arc<dyn RefundHandler>) -> Self {
        Self {
            ledger,
            handler,
            capability: None,
        }
    }

    /// Restrict the worker to refunds issued under `capability`.
    #[must_use]
    pub fn with_capability(mut self, capability: Hash) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Attempt every pending refund once.
    pub async fn run_once(&self) -> DrainReport {
        let mut report = DrainReport::default();

        for refund in self.ledger.pending() {
            if self.capability.is_some() && refund.capability != self.capability {
                continue;
            }

            match self.handler.pay(&refund).await {
                Ok(()) => {
                    if self.ledger.ack(refund.id).is_ok() {
                        report.paid += 1;
                    }
                }
                Err(e) => {
                    let attempts = self.ledger.record_failure(refund.id).unwrap_or_default();
                    warn!(
                        refund_id = %refund.id,
                        attempts,
                        error = %e,
                        "Refund payment failed, will retry"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.paid > 0 || report.failed > 0 {
            debug!(paid = report.paid, failed = report.failed, "Refund drain pass");
        }
        report
    }

    /// Drain the ledger every `interval` until the task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}
