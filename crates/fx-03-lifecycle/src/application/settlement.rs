//! Settlement Executor
//!
//! Carries out committed settlement orders through the fee and liquidity
//! ports. Each order is acknowledged on its own as soon as its port call
//! succeeded. A failing order stays in the ledger for the next pass and
//! never drags an already settled order along with it.

use crate::ports::outbound::{FeeSink, LiquidityRedeemer, SettlementError};
use fx_telemetry::{metric_inc, SETTLEMENT_ORDERS};
use shared_bus::{DrainReport, Settlement, SettlementLedger, SettlementOrder};
use shared_types::ShortId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drains a [`SettlementLedger`] into the settlement ports.
pub struct SettlementExecutor {
    ledger: Arc<SettlementLedger>,
    fee_sink: Arc<dyn FeeSink>,
    redeemer: Arc<dyn LiquidityRedeemer>,
}

impl SettlementExecutor {
    pub fn new(
        ledger: Arc<SettlementLedger>,
        fee_sink: Arc<dyn FeeSink>,
        redeemer: Arc<dyn LiquidityRedeemer>,
    ) -> Self {
        Self {
            ledger,
            fee_sink,
            redeemer,
        }
    }

    /// Perform one order without touching the ledger.
    pub fn execute(&self, order: &SettlementOrder) -> Result<(), SettlementError> {
        match order.settlement {
            Settlement::FeeToTreasury { amount } => self.fee_sink.deposit_to_treasury(order, amount),
            Settlement::FeeToCreator { recipient, amount } => {
                self.fee_sink.pay_outcome_creator(order, recipient, amount)
            }
            Settlement::RedeemToDao { winning_outcome } => {
                self.redeemer.redeem_to_dao(order, winning_outcome)
            }
            Settlement::RedeemToProvider {
                provider,
                winning_outcome,
            } => self.redeemer.redeem_to_provider(order, provider, winning_outcome),
        }
    }

    /// Attempt every pending order once, oldest first.
    pub fn run_once(&self) -> DrainReport {
        let mut report = DrainReport::default();

        for order in self.ledger.pending() {
            match self.execute(&order) {
                Ok(()) => {
                    if self.ledger.ack(order.id).is_ok() {
                        info!(
                            order_id = %order.id,
                            proposal = %ShortId::of(&order.proposal_id),
                            settlement = ?order.settlement,
                            "Settlement order executed"
                        );
                        metric_inc!(SETTLEMENT_ORDERS, &["paid"]);
                        report.paid += 1;
                    }
                }
                Err(e) => {
                    let attempts = self.ledger.record_failure(order.id).unwrap_or_default();
                    warn!(
                        order_id = %order.id,
                        proposal = %ShortId::of(&order.proposal_id),
                        attempts,
                        error = %e,
                        "Settlement order failed, will retry"
                    );
                    metric_inc!(SETTLEMENT_ORDERS, &["failed"]);
                    report.failed += 1;
                }
            }
        }

        if report.paid > 0 || report.failed > 0 {
            debug!(paid = report.paid, failed = report.failed, "Settlement drain pass");
        }
        report
    }

    pub fn ledger(&self) -> &Arc<SettlementLedger> {
        &self.ledger
    }
}
