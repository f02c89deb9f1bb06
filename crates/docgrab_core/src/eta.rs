//! Remaining-time heuristic. Counts only; no observed latencies.

/// Per-item guess used before anything has finished.
pub const INITIAL_ESTIMATE_PER_ITEM_MS: u64 = 1500;
/// Per-item guess once at least one item has been processed.
pub const STEADY_ESTIMATE_PER_ITEM_MS: u64 = 500;

/// Estimated milliseconds left for a batch of `total` items with `cursor` done.
pub fn remaining_time_ms(total: usize, cursor: usize) -> u64 {
    if cursor == 0 {
        return (total as u64).saturating_mul(INITIAL_ESTIMATE_PER_ITEM_MS);
    }
    (total.saturating_sub(cursor) as u64).saturating_mul(STEADY_ESTIMATE_PER_ITEM_MS)
}

/// Render milliseconds as `Xm Ys`, rounding partial seconds up.
pub fn format_remaining(milliseconds: u64) -> String {
    let total_seconds = milliseconds.div_ceil(1000);
    format!("{}m {}s", total_seconds / 60, total_seconds % 60)
}
