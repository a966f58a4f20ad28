//! TWAP winner selection.

use shared_types::U256;

/// Fixed-point scale of `twap_threshold_bps`: 100_000 = 100%.
pub const TWAP_BPS_SCALE: u64 = 100_000;

/// Pick the winning outcome from per-outcome TWAPs.
///
/// `twaps[0]` is the baseline. A challenger `i > 0` becomes the provisional
/// winner iff its TWAP is strictly greater than the best challenger so far
/// and strictly greater than `twaps[0] × (SCALE + threshold_bps) / SCALE`.
/// Ties keep the earlier outcome. Returns 0 if no challenger qualifies.
pub fn select_winner(twaps: &[u128], threshold_bps: u64) -> u64 {
    let Some((&base_twap, challengers)) = twaps.split_first() else {
        return 0;
    };

    let scale = U256::from(TWAP_BPS_SCALE);
    // u128 × (SCALE + u64) < 2^193, so the product cannot overflow U256.
    let threshold = U256::from(base_twap) * (scale + U256::from(threshold_bps)) / scale;

    let mut winner = 0u64;
    let mut best: Option<u128> = None;
    for (offset, &twap) in challengers.iter().enumerate() {
        let beats_best = best.map_or(true, |b| twap > b);
        if beats_best && U256::from(twap) > threshold {
            winner = offset as u64 + 1;
            best = Some(twap);
        }
    }
    winner
}
