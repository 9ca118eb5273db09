//! Family ranking by chi-square p-value.
//!
//! Each configured family is fitted and scored independently:
//! 1. maximum-likelihood fit on the training sample
//! 2. expected frequencies for the test bins
//! 3. chi-square test of the test counts against them
//!
//! A failure in any step skips that family only. The best family is the one
//! with the largest p-value; ties go to the family listed first.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{FamilyFit, FamilyOutcome, FitBudget};
use crate::error::FitError;
use crate::fit::expected::expected_frequencies;
use crate::fit::fitter::fit_mle;
use crate::fit::gof::chi_square;
use crate::models::Family;

/// Settings shared by every family in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreOptions {
    pub budget: FitBudget,
    pub ddof: usize,
}

/// The test bins every family is scored against.
#[derive(Debug, Clone, Copy)]
pub struct TestBins<'a> {
    pub labels: &'a [i64],
    pub counts: &'a [u64],
}

impl TestBins<'_> {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Outcomes in the order the families were given, plus the winner.
#[derive(Debug, Clone)]
pub struct Ranking {
    pub outcomes: Vec<FamilyOutcome>,
    /// Index into `outcomes` of the best fitted family.
    pub best: Option<usize>,
}

impl Ranking {
    pub fn best_fit(&self) -> Option<&FamilyFit> {
        self.best.and_then(|i| self.outcomes[i].fitted())
    }

    pub fn fitted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.fitted().is_some()).count()
    }
}

/// Fit one family and score it against the test bins.
pub fn score_family(
    family: Family,
    sample: &[f64],
    bins: TestBins<'_>,
    opts: &ScoreOptions,
) -> Result<FamilyFit, FitError> {
    let mle = fit_mle(family, sample, &opts.budget)?;
    let expected = expected_frequencies(family, &mle.params, bins.labels, bins.total());
    let chi = chi_square(bins.labels, bins.counts, &expected, opts.ddof)?;

    Ok(FamilyFit {
        family,
        params: mle.params,
        log_likelihood: mle.log_likelihood,
        method: mle.method,
        iterations: mle.iterations,
        converged: mle.converged,
        expected,
        chi_square: chi,
    })
}

/// Fit and score every family in parallel, keeping the input order.
pub fn fit_and_rank(
    families: &[Family],
    sample: &[f64],
    bins: TestBins<'_>,
    opts: &ScoreOptions,
) -> Ranking {
    let outcomes: Vec<FamilyOutcome> = families
        .par_iter()
        .map(|&family| match score_family(family, sample, bins, opts) {
            Ok(fit) => {
                debug!(
                    family = family.name(),
                    p_value = fit.chi_square.p_value,
                    statistic = fit.chi_square.statistic,
                    "scored"
                );
                FamilyOutcome::Fitted(fit)
            }
            Err(err) => {
                warn!(family = family.name(), reason = %err, "skipping family");
                FamilyOutcome::Skipped {
                    family,
                    reason: err.to_string(),
                }
            }
        })
        .collect();

    let best = select_best(&outcomes);
    Ranking { outcomes, best }
}

/// Index of the fitted outcome with the largest p-value; the earliest wins ties.
pub fn select_best(outcomes: &[FamilyOutcome]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, outcome) in outcomes.iter().enumerate() {
        let Some(fit) = outcome.fitted() else {
            continue;
        };
        let p = fit.chi_square.p_value;
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}
