//! Raw samples from histograms, and synthetic histograms from a family.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Open01;
use tracing::debug;

use crate::domain::{Bin, DistParams};
use crate::error::{AppError, EXIT_NUMERIC};
use crate::models::Family;

/// Widest label range `generate_histogram` will emit.
const MAX_GENERATED_BINS: i64 = 100_000;

/// Expand binned counts into a flat sample: `labels[i]` repeated `counts[i]` times.
///
/// Extra entries in the longer slice are ignored.
pub fn reconstruct_sample(labels: &[i64], counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    let mut sample = Vec::with_capacity(total as usize);
    for (&label, &count) in labels.iter().zip(counts) {
        sample.extend(std::iter::repeat_n(label as f64, count as usize));
    }
    sample
}

/// Draw `count` values from `family` by inverse-CDF sampling and bin them by
/// `floor(x)` into contiguous integer labels (empty bins included).
pub fn generate_histogram(
    family: Family,
    params: &DistParams,
    count: usize,
    seed: u64,
) -> Result<Vec<Bin>, AppError> {
    if count == 0 {
        return Err(AppError::input("Sample count must be > 0."));
    }
    if !family.params_valid(params) {
        return Err(AppError::input(format!(
            "Invalid parameters for {family}: shapes {:?} (expected {}), loc {}, scale {}",
            params.shapes,
            describe_shapes(family),
            params.loc,
            params.scale
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally: BTreeMap<i64, u64> = BTreeMap::new();
    for _ in 0..count {
        let u: f64 = rng.sample(Open01);
        let x = family.ppf(u, params);
        if !x.is_finite() {
            return Err(AppError::new(
                EXIT_NUMERIC,
                format!("Quantile of {family} at {u} is not finite."),
            ));
        }
        *tally.entry(x.floor() as i64).or_insert(0) += 1;
    }

    let (Some((&lo, _)), Some((&hi, _))) = (tally.first_key_value(), tally.last_key_value()) else {
        return Err(AppError::new(EXIT_NUMERIC, "No values were generated."));
    };
    if hi - lo >= MAX_GENERATED_BINS {
        return Err(AppError::input(format!(
            "Generated values span {} bins ({lo}..={hi}); use a smaller scale.",
            hi - lo + 1
        )));
    }

    debug!(family = family.name(), count, lo, hi, "generated histogram");
    Ok((lo..=hi)
        .map(|label| Bin {
            label,
            count: tally.get(&label).copied().unwrap_or(0),
        })
        .collect())
}

/// Shape names joined for messages, e.g. `"[a, c]"`.
pub fn describe_shapes(family: Family) -> String {
    let names: Vec<&str> = family.shapes().iter().map(|s| s.name).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_counts_give_empty_sample() {
        assert!(reconstruct_sample(&[0, 1, 2], &[0, 0, 0]).is_empty());
        assert!(reconstruct_sample(&[], &[]).is_empty());
    }

    #[test]
    fn labels_repeat_by_count_in_order() {
        let sample = reconstruct_sample(&[0, 1, 2], &[2, 0, 3]);
        assert_eq!(sample, vec![0.0, 0.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn sample_length_is_total_count() {
        let counts = [4, 1, 0, 7];
        let sample = reconstruct_sample(&[-3, 5, 6, 9], &counts);
        assert_eq!(sample.len() as u64, counts.iter().sum::<u64>());
    }

    #[test]
    fn generated_histogram_is_contiguous_and_seeded() {
        let params = DistParams::new(vec![], 20.0, 4.0);
        let bins = generate_histogram(Family::Norm, &params, 2000, 42).unwrap();

        assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 2000);
        for pair in bins.windows(2) {
            assert_eq!(pair[1].label, pair[0].label + 1);
        }
        assert!(bins.first().unwrap().count > 0 && bins.last().unwrap().count > 0);

        let again = generate_histogram(Family::Norm, &params, 2000, 42).unwrap();
        assert_eq!(bins, again);
    }

    #[test]
    fn generated_histogram_follows_the_family() {
        let params = DistParams::new(vec![2.0], 0.0, 3.0);
        let bins = generate_histogram(Family::Gamma, &params, 4000, 7).unwrap();
        let labels: Vec<i64> = bins.iter().map(|b| b.label).collect();
        let counts: Vec<u64> = bins.iter().map(|b| b.count).collect();
        let sample = reconstruct_sample(&labels, &counts);
        let mean = sample.iter().sum::<f64>() / sample.len() as f64;
        // Gamma(2, scale 3) has mean 6; flooring lowers it by about 0.5.
        assert!((mean - 5.5).abs() < 0.4, "mean = {mean}");
        assert!(labels[0] >= 0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad_scale = DistParams::new(vec![], 0.0, -1.0);
        assert!(generate_histogram(Family::Norm, &bad_scale, 10, 1).is_err());

        let missing_shape = DistParams::new(vec![], 0.0, 1.0);
        let err = generate_histogram(Family::Gamma, &missing_shape, 10, 1).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("[a]"));

        assert!(generate_histogram(Family::Norm, &DistParams::new(vec![], 0.0, 1.0), 0, 1).is_err());
    }
}
