//! Shared fixtures: a stable asset, proposal builders and in-memory
//! implementations of the lifecycle and refund ports.

use async_trait::async_trait;
use fx_02_proposal_queue::{ProposalData, QueuedProposal};
use fx_03_lifecycle::{
    FeeSink, LiquidityRedeemer, OracleError, Proposal, SettlementError, TwapOracle,
};
use parking_lot::Mutex;
use shared_bus::{RefundError, RefundHandler, RefundOwed, SettlementOrder};
use shared_types::{Address, Asset, Balance, Clock, DaoId, PoolId, ProposalId};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable asset used for DAO-funded bonds in tests.
pub struct Usdc;

impl Asset for Usdc {
    const SYMBOL: &'static str = "USDC";
}

pub const DAO: DaoId = [0xDA; 32];
pub const BOND: u64 = 50_000;

pub fn proposal_id(n: u8) -> ProposalId {
    [n; 32]
}

pub fn proposer(n: u8) -> Address {
    let mut address = [0u8; 32];
    address[0] = 0xA0;
    address[31] = n;
    address
}

/// Proposal payload with `outcomes` outcomes, outcome 0 being "Reject".
pub fn proposal_data(outcomes: usize) -> ProposalData {
    let mut messages = vec!["Reject".to_string()];
    messages.extend((1..outcomes).map(|i| format!("Accept option {i}")));
    ProposalData::new(
        "Treasury diversification",
        "ipfs://proposal",
        messages,
        vec![String::new(); outcomes],
        vec![1_000; outcomes],
        vec![1_000; outcomes],
    )
    .expect("valid proposal data")
}

/// Queue entry `n` from `proposer(n)`.
pub fn entry(n: u8, fee: u64, dao_funded: bool, clock: &dyn Clock) -> QueuedProposal<Usdc> {
    let bond = dao_funded.then(|| Balance::deposit(BOND));
    QueuedProposal::new(
        DAO,
        proposal_id(n),
        proposer(n),
        fee,
        dao_funded,
        bond,
        proposal_data(2),
        clock,
    )
    .expect("valid queue entry")
}

/// Pool with a TWAP that tests may change.
pub struct FixedPool {
    pool_id: PoolId,
    twap: Mutex<u128>,
}

impl FixedPool {
    pub fn new(pool_id: PoolId, twap: u128) -> Self {
        Self {
            pool_id,
            twap: Mutex::new(twap),
        }
    }

    pub fn set_twap(&self, twap: u128) {
        *self.twap.lock() = twap;
    }
}

impl TwapOracle for FixedPool {
    fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    fn get_twap(&self, _clock: &dyn Clock) -> Result<u128, OracleError> {
        Ok(*self.twap.lock())
    }
}

/// One pool per outcome of `proposal`, with the given TWAPs.
pub fn pools_for(proposal: &Proposal, twaps: &[u128]) -> Vec<FixedPool> {
    proposal
        .pool_ids()
        .iter()
        .zip(twaps)
        .map(|(id, twap)| FixedPool::new(*id, *twap))
        .collect()
}

pub fn as_oracles(pools: &[FixedPool]) -> Vec<&dyn TwapOracle> {
    pools.iter().map(|p| p as &dyn TwapOracle).collect()
}

/// Settlement destinations recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payout {
    Treasury(DaoId, u64),
    Creator(Address, u64),
    DaoPool(ProposalId),
    Provider(ProposalId, Address),
}

/// Fee and liquidity destinations. Idempotent on the settlement order id;
/// redemptions fail while `redemption_failures` is above zero.
#[derive(Default)]
pub struct Treasury {
    pub payouts: Mutex<Vec<Payout>>,
    redemption_failures: Mutex<u32>,
    seen: Mutex<HashSet<Uuid>>,
}

impl Treasury {
    pub fn failing_redemptions(times: u32) -> Self {
        Self {
            redemption_failures: Mutex::new(times),
            ..Self::default()
        }
    }

    pub fn fee_payouts(&self) -> usize {
        self.payouts
            .lock()
            .iter()
            .filter(|p| matches!(p, Payout::Treasury(..) | Payout::Creator(..)))
            .count()
    }

    fn pay(&self, order: &SettlementOrder, payout: Payout) {
        if self.seen.lock().insert(order.id) {
            self.payouts.lock().push(payout);
        }
    }

    fn check_redemption(&self) -> Result<(), SettlementError> {
        let mut left = self.redemption_failures.lock();
        if *left > 0 {
            *left -= 1;
            return Err(SettlementError::Redemption("pool paused".into()));
        }
        Ok(())
    }
}

impl FeeSink for Treasury {
    fn deposit_to_treasury(&self, order: &SettlementOrder, amount: u64) -> Result<(), SettlementError> {
        self.pay(order, Payout::Treasury(order.dao_id, amount));
        Ok(())
    }

    fn pay_outcome_creator(
        &self,
        order: &SettlementOrder,
        recipient: Address,
        amount: u64,
    ) -> Result<(), SettlementError> {
        self.pay(order, Payout::Creator(recipient, amount));
        Ok(())
    }
}

impl LiquidityRedeemer for Treasury {
    fn redeem_to_dao(&self, order: &SettlementOrder, _winning_outcome: u64) -> Result<(), SettlementError> {
        self.check_redemption()?;
        self.pay(order, Payout::DaoPool(order.proposal_id));
        Ok(())
    }

    fn redeem_to_provider(
        &self,
        order: &SettlementOrder,
        provider: Address,
        _winning_outcome: u64,
    ) -> Result<(), SettlementError> {
        self.check_redemption()?;
        self.pay(order, Payout::Provider(order.proposal_id, provider));
        Ok(())
    }
}

/// Refund handler that fails a fixed number of times before paying.
#[derive(Default)]
pub struct Custody {
    failures_left: Mutex<u32>,
    paid: Mutex<Vec<RefundOwed>>,
    seen: Mutex<HashSet<Uuid>>,
}

impl Custody {
    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: Mutex::new(times),
            ..Self::default()
        }
    }

    pub fn paid(&self) -> Vec<RefundOwed> {
        self.paid.lock().clone()
    }
}

#[async_trait]
impl RefundHandler for Custody {
    async fn pay(&self, refund: &RefundOwed) -> Result<(), RefundError> {
        {
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(RefundError::PaymentFailed("custody offline".into()));
            }
        }
        // Idempotent on the refund id.
        if self.seen.lock().insert(refund.id) {
            self.paid.lock().push(refund.clone());
        }
        Ok(())
    }
}
