//! Fee bounds and DoS fee escalation.

/// Minimum fee to queue a proposal into an idle queue.
pub const MIN_FEE: u64 = 1_000_000;

/// Hard cap on a proposal fee, including top-ups.
pub const MAX_FEE: u64 = 1_000_000_000_000;

/// Smallest permitted `max_queue_size`.
pub const MIN_QUEUE_SIZE: usize = 10;

/// Largest permitted `max_queue_size`.
pub const MAX_QUEUE_SIZE: usize = 50;

/// Minimum fee for a queue holding `len` of `max_queue_size` entries.
///
/// The fee steps up as the queue fills so that flooding it gets expensive.
pub fn calculate_min_fee(len: usize, max_queue_size: usize) -> u64 {
    if max_queue_size == 0 {
        return MIN_FEE * 10;
    }

    let occupancy = len.saturating_mul(100) / max_queue_size;
    match occupancy {
        90.. => MIN_FEE * 10,
        75..=89 => MIN_FEE * 5,
        50..=74 => MIN_FEE * 2,
        _ => MIN_FEE,
    }
}

/// Priority score of a fee. Higher is better.
#[inline]
pub fn priority_for_fee(fee: u64) -> u64 {
    fee
}
