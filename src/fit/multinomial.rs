//! Multinomial model for categorical counts.
//!
//! Category probabilities are the training proportions. Categories never seen
//! in training have probability zero and are masked out of the test; the
//! remaining test counts are compared against `p_i × total` with a chi-square
//! test, and the multinomial log-probability of the test vector is reported.

use tracing::{debug, warn};

use crate::domain::MultinomialFit;
use crate::error::FitError;
use crate::fit::gof::chi_square;
use crate::math::special::{ln_gamma, xlogy};

/// Fit category probabilities on `train` and score `test` against them.
///
/// `labels`, `train` and `test` are aligned by position.
pub fn fit_multinomial(
    labels: &[i64],
    train: &[u64],
    test: &[u64],
    ddof: usize,
) -> Result<MultinomialFit, FitError> {
    let train_total: u64 = train.iter().sum();
    if train_total == 0 {
        return Err(FitError::EmptySample);
    }

    let probabilities: Vec<f64> = train
        .iter()
        .map(|&c| c as f64 / train_total as f64)
        .collect();

    let mut masked = Vec::new();
    let mut kept_labels = Vec::new();
    let mut kept_p = Vec::new();
    let mut observed = Vec::new();
    for ((&label, &p), &o) in labels.iter().zip(&probabilities).zip(test) {
        if p == 0.0 {
            if o > 0 {
                warn!(
                    label,
                    test_count = o,
                    "category has test counts but never occurs in training; excluded"
                );
            }
            masked.push(label);
            continue;
        }
        kept_labels.push(label);
        kept_p.push(p);
        observed.push(o);
    }

    let test_total: u64 = observed.iter().sum();
    if test_total == 0 {
        return Err(FitError::Degenerate(
            "test counts of the observed categories sum to zero".into(),
        ));
    }
    let n = test_total as f64;
    let expected: Vec<f64> = kept_p.iter().map(|p| p * n).collect();

    let chi = chi_square(&kept_labels, &observed, &expected, ddof)?;

    let log_pmf = ln_gamma(n + 1.0)
        + observed
            .iter()
            .zip(&kept_p)
            .map(|(&x, &p)| {
                let x = x as f64;
                xlogy(x, p) - ln_gamma(x + 1.0)
            })
            .sum::<f64>();

    debug!(
        categories = kept_labels.len(),
        masked = masked.len(),
        statistic = chi.statistic,
        p_value = chi.p_value,
        "multinomial scored"
    );

    Ok(MultinomialFit {
        labels: kept_labels,
        probabilities: kept_p,
        masked,
        expected,
        observed,
        chi_square: chi,
        log_pmf,
    })
}
