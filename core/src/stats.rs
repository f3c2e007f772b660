//! Percentile estimation over batches of simulated ratios
//!
//! A single order-statistic routine with linear interpolation between
//! adjacent ranks, matching the conventional definition used by numerical
//! computing environments. Kept separate from the convergence detector so
//! the interpolation semantics can be pinned down by unit tests in
//! isolation.

use std::cmp::Ordering;

/// `level`-th percentile of `values`, `level` in `(0, 100)`.
///
/// Uses linear interpolation between the two nearest order statistics.
/// Returns `None` for an empty input — degenerate batches must not
/// produce a value, and must certainly not divide by zero.
pub fn percentile(values: &[f64], level: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = (level / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }

    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
