//! Expected bin frequencies under a fitted distribution.

use crate::domain::DistParams;
use crate::models::Family;

/// Width of the interval integrated for each bin label: `[x, x + BIN_SPAN]`.
///
/// Fixed policy; bins are integer left edges and the last 1% of every bin is
/// left out.
pub const BIN_SPAN: f64 = 0.99;

/// `(CDF(x + BIN_SPAN) − CDF(x)) × total` for every label, in label order.
pub fn expected_frequencies(
    family: Family,
    params: &DistParams,
    labels: &[i64],
    total: u64,
) -> Vec<f64> {
    let total = total as f64;
    labels
        .iter()
        .map(|&label| {
            let x = label as f64;
            (family.cdf(x + BIN_SPAN, params) - family.cdf(x, params)) * total
        })
        .collect()
}
