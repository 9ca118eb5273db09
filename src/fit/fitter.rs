//! Maximum-likelihood fitting of a single family.
//!
//! Given a raw sample (already expanded from the histogram) we:
//! - compress tied observations into `(value, multiplicity)` pairs
//! - use the closed-form MLE where one exists (`norm`, `expon`, `laplace`)
//! - otherwise minimize the negative log-likelihood with Nelder–Mead over an
//!   unconstrained parameterization, restarting once from the first result
//!
//! The result is a `(shapes…, loc, scale)` tuple plus diagnostics.

use std::time::Instant;

use nalgebra::DVector;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::domain::{DistParams, FitBudget, FitMethod};
use crate::error::FitError;
use crate::math::{NelderMead, SimplexError};
use crate::models::{Family, ShapeDomain};

/// Fraction of the sample standard deviation kept between the sample and a
/// finite support bound at the starting point.
const START_MARGIN: f64 = 0.1;

/// Best parameters for a single family.
#[derive(Debug, Clone, PartialEq)]
pub struct MleFit {
    pub family: Family,
    pub params: DistParams,
    pub log_likelihood: f64,
    pub method: FitMethod,
    pub iterations: usize,
    pub converged: bool,
}

/// A sample with ties compressed: sorted distinct values and their multiplicities.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSample {
    pub values: Vec<f64>,
    pub weights: Vec<f64>,
}

impl WeightedSample {
    pub fn from_values(sample: &[f64]) -> Self {
        let mut sorted = sample.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut values: Vec<f64> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for x in sorted {
            match values.last() {
                Some(&last) if last == x => {
                    if let Some(w) = weights.last_mut() {
                        *w += 1.0;
                    }
                }
                _ => {
                    values.push(x);
                    weights.push(1.0);
                }
            }
        }
        Self { values, weights }
    }

    pub fn min(&self) -> f64 {
        self.values.first().copied().unwrap_or(f64::NAN)
    }

    pub fn max(&self) -> f64 {
        self.values.last().copied().unwrap_or(f64::NAN)
    }

    pub fn distinct(&self) -> usize {
        self.values.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Smallest distance between neighbouring distinct values.
    pub fn min_gap(&self) -> f64 {
        self.values
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min)
    }
}

/// Log-likelihood a fit can reach without piling density into spikes
/// narrower than the sample's resolution: `n · ln(1 / min_gap)`.
pub fn resolution_bound(sample: &WeightedSample) -> f64 {
    -sample.total_weight() * sample.min_gap().ln()
}

/// Weighted log-likelihood of `params` over the compressed sample.
///
/// Returns `-∞` when any observation has zero density and `NaN` for invalid
/// parameters.
pub fn log_likelihood(family: Family, params: &DistParams, sample: &WeightedSample) -> f64 {
    sample
        .values
        .iter()
        .zip(&sample.weights)
        .map(|(&x, &w)| w * family.log_pdf(x, params))
        .sum()
}

/// Fit `family` to `sample` by maximum likelihood.
pub fn fit_mle(family: Family, sample: &[f64], budget: &FitBudget) -> Result<MleFit, FitError> {
    if sample.is_empty() {
        return Err(FitError::EmptySample);
    }
    if sample.iter().any(|x| !x.is_finite()) {
        return Err(FitError::Degenerate("sample contains non-finite values".into()));
    }
    let compressed = WeightedSample::from_values(sample);
    if compressed.distinct() < 2 {
        return Err(FitError::Degenerate(
            "all observations are equal; scale is not identifiable".into(),
        ));
    }

    debug!(
        family = family.name(),
        n = sample.len(),
        distinct = compressed.distinct(),
        "fitting"
    );

    let fit = match family {
        Family::Norm | Family::Expon | Family::Laplace => fit_closed_form(family, sample, &compressed)?,
        _ => fit_numeric(family, sample, &compressed, budget)?,
    };

    if !(fit.log_likelihood.is_finite() && fit.params.as_tuple().iter().all(|v| v.is_finite())) {
        return Err(FitError::NonFinite);
    }
    Ok(fit)
}

fn fit_closed_form(
    family: Family,
    sample: &[f64],
    compressed: &WeightedSample,
) -> Result<MleFit, FitError> {
    let params = match family {
        Family::Norm => {
            let mean = sample.iter().mean();
            let sd = sample.iter().population_std_dev();
            DistParams::new(vec![], mean, sd)
        }
        Family::Expon => {
            let min = compressed.min();
            let mean = sample.iter().mean();
            DistParams::new(vec![], min, mean - min)
        }
        Family::Laplace => {
            let mut sorted = sample.to_vec();
            let median = median_mut(&mut sorted).ok_or(FitError::EmptySample)?;
            let mad = sample.iter().map(|x| (x - median).abs()).mean();
            DistParams::new(vec![], median, mad)
        }
        _ => {
            return Err(FitError::InvalidParams(format!(
                "{} has no closed-form estimator",
                family.name()
            )));
        }
    };

    if !(params.scale.is_finite() && params.scale > 0.0) {
        return Err(FitError::Degenerate(format!(
            "estimated scale is {}",
            params.scale
        )));
    }

    let log_likelihood = log_likelihood(family, &params, compressed);
    Ok(MleFit {
        family,
        params,
        log_likelihood,
        method: FitMethod::ClosedForm,
        iterations: 0,
        converged: true,
    })
}

fn fit_numeric(
    family: Family,
    sample: &[f64],
    compressed: &WeightedSample,
    budget: &FitBudget,
) -> Result<MleFit, FitError> {
    let objective = |theta: &DVector<f64>| -> f64 {
        let Some(params) = decode(family, theta) else {
            return f64::INFINITY;
        };
        let ll = log_likelihood(family, &params, compressed);
        if ll.is_finite() { -ll } else { f64::INFINITY }
    };

    let x0 = start_points(family, sample, compressed)
        .into_iter()
        .map(|params| encode(family, &params))
        .find(|theta| objective(theta).is_finite())
        .ok_or(FitError::StartOutsideSupport)?;

    let started = Instant::now();
    let optimizer = NelderMead {
        max_iterations: budget.max_iterations,
        deadline: budget.time_limit.map(|limit| started + limit),
        ..NelderMead::default()
    };
    let map_err = |err: SimplexError| match err {
        SimplexError::InfeasibleStart => FitError::StartOutsideSupport,
        SimplexError::DeadlineExceeded { .. } => {
            FitError::TimeBudget(budget.time_limit.unwrap_or_default())
        }
    };

    let first = optimizer.minimize(objective, x0).map_err(map_err)?;
    let first_iterations = first.iterations;
    let second = optimizer.minimize(objective, first.x).map_err(map_err)?;
    let iterations = first_iterations + second.iterations;

    if !second.converged {
        if budget.strict_convergence {
            return Err(FitError::NotConverged(budget.max_iterations));
        }
        warn!(
            family = family.name(),
            iterations, "optimizer hit its iteration limit; keeping the last simplex"
        );
    }

    let params = decode(family, &second.x).ok_or(FitError::NonFinite)?;
    let bound = resolution_bound(compressed);
    if -second.value > bound {
        warn!(
            family = family.name(),
            log_likelihood = -second.value,
            bound,
            "degenerate MLE: density concentrates in spikes narrower than the bins"
        );
    }
    debug!(
        family = family.name(),
        params = ?params.as_tuple(),
        nll = second.value,
        iterations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "optimizer finished"
    );

    Ok(MleFit {
        family,
        params,
        log_likelihood: -second.value,
        method: FitMethod::NelderMead,
        iterations,
        converged: second.converged,
    })
}

/// Candidate starting points, tried in order until one has a finite likelihood.
///
/// The first uses the sample moments directly; the second moves loc/scale so
/// the sample sits strictly inside any finite bound of the standardized support.
fn start_points(family: Family, sample: &[f64], compressed: &WeightedSample) -> Vec<DistParams> {
    let shapes = family.start_shapes();
    let mean = sample.iter().mean();
    let sd = sample.iter().population_std_dev();
    let (min, max) = (compressed.min(), compressed.max());
    let margin = START_MARGIN * sd;

    let moments = DistParams::new(shapes.clone(), mean, sd);

    let (lo, hi) = family.standard_support(&shapes);
    let placed = match (lo.is_finite(), hi.is_finite()) {
        (true, true) => {
            let scale = (max - min + 2.0 * margin) / (hi - lo);
            DistParams::new(shapes, min - margin - lo * scale, scale)
        }
        (true, false) => DistParams::new(shapes, min - margin - lo * sd, sd),
        (false, true) => DistParams::new(shapes, max + margin - hi * sd, sd),
        (false, false) => return vec![moments],
    };
    vec![moments, placed]
}

fn encode(family: Family, params: &DistParams) -> DVector<f64> {
    let specs = family.shapes();
    let mut theta = Vec::with_capacity(specs.len() + 2);
    for (spec, &v) in specs.iter().zip(&params.shapes) {
        theta.push(match spec.domain {
            ShapeDomain::Positive => v.ln(),
            ShapeDomain::Real => v,
            ShapeDomain::UnitOpen => (v / (1.0 - v)).ln(),
            ShapeDomain::Above(a) => (v - a).ln(),
        });
    }
    theta.push(params.loc);
    theta.push(params.scale.ln());
    DVector::from_vec(theta)
}

fn decode(family: Family, theta: &DVector<f64>) -> Option<DistParams> {
    let specs = family.shapes();
    let k = specs.len();
    if theta.len() != k + 2 || theta.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let shapes: Vec<f64> = specs
        .iter()
        .zip(theta.iter())
        .map(|(spec, &t)| match spec.domain {
            ShapeDomain::Positive => t.exp(),
            ShapeDomain::Real => t,
            ShapeDomain::UnitOpen => 1.0 / (1.0 + (-t).exp()),
            ShapeDomain::Above(a) => a + t.exp(),
        })
        .collect();
    let params = DistParams::new(shapes, theta[k], theta[k + 1].exp());
    family.params_valid(&params).then_some(params)
}

fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
