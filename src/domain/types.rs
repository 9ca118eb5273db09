//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Family;

/// One histogram bin: left-edge label (or category id) and its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    pub label: i64,
    pub count: u64,
}

/// Bins in file order, plus the file they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    pub source: PathBuf,
}

impl Histogram {
    pub fn labels(&self) -> Vec<i64> {
        self.bins.iter().map(|b| b.label).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.bins.iter().map(|b| b.count).collect()
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Parameters of a fitted family: shapes first, then location and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistParams {
    pub shapes: Vec<f64>,
    pub loc: f64,
    pub scale: f64,
}

impl DistParams {
    pub fn new(shapes: Vec<f64>, loc: f64, scale: f64) -> Self {
        Self { shapes, loc, scale }
    }

    /// `[shapes…, loc, scale]`
    pub fn as_tuple(&self) -> Vec<f64> {
        let mut out = self.shapes.clone();
        out.push(self.loc);
        out.push(self.scale);
        out
    }
}

/// How a family's parameters were estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    ClosedForm,
    NelderMead,
}

/// Result of Pearson's chi-square test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquare {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// A family that was fitted and scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyFit {
    pub family: Family,
    pub params: DistParams,
    pub log_likelihood: f64,
    pub method: FitMethod,
    pub iterations: usize,
    pub converged: bool,
    /// Expected frequency per bin, aligned with the bin labels.
    pub expected: Vec<f64>,
    pub chi_square: ChiSquare,
}

/// Per-family outcome of a continuous run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FamilyOutcome {
    Fitted(FamilyFit),
    Skipped { family: Family, reason: String },
}

impl FamilyOutcome {
    pub fn family(&self) -> Family {
        match self {
            FamilyOutcome::Fitted(fit) => fit.family,
            FamilyOutcome::Skipped { family, .. } => *family,
        }
    }

    pub fn fitted(&self) -> Option<&FamilyFit> {
        match self {
            FamilyOutcome::Fitted(fit) => Some(fit),
            FamilyOutcome::Skipped { .. } => None,
        }
    }
}

/// Iteration and wall-clock limits for a single family's fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBudget {
    /// Iterations per Nelder–Mead minimization.
    pub max_iterations: usize,
    /// Wall-clock limit for the whole fit (all restarts); `None` disables it.
    pub time_limit: Option<Duration>,
    /// Treat an exhausted iteration budget as a failure.
    pub strict_convergence: bool,
}

impl Default for FitBudget {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            time_limit: Some(Duration::from_secs(10)),
            strict_convergence: false,
        }
    }
}

/// Outcome of the discrete (multinomial) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialFit {
    pub labels: Vec<i64>,
    /// Category probabilities estimated from training counts.
    pub probabilities: Vec<f64>,
    /// Labels excluded because their training count is zero.
    pub masked: Vec<i64>,
    /// Expected test counts for the unmasked categories (in label order).
    pub expected: Vec<f64>,
    pub observed: Vec<u64>,
    pub chi_square: ChiSquare,
    /// Multinomial log-probability of the test counts.
    pub log_pmf: f64,
}

/// Configuration of a continuous run, derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ContinuousConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub families: Vec<Family>,
    pub budget: FitBudget,
    pub ddof: usize,
    /// Worker threads for the per-family fits (0 = rayon default).
    pub jobs: usize,

    pub show_expected: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_report: Option<PathBuf>,
    pub export_expected: Option<PathBuf>,
}

/// Configuration of a discrete run.
#[derive(Debug, Clone)]
pub struct DiscreteConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub ddof: usize,
}

/// Configuration of `histfit generate`.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub family: Family,
    pub params: DistParams,
    pub count: usize,
    pub seed: u64,
    pub output: PathBuf,
}

/// A saved continuous run (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub train_path: String,
    pub test_path: String,
    pub labels: Vec<i64>,
    pub observed: Vec<u64>,
    pub outcomes: Vec<FamilyOutcome>,
    pub best: Option<Family>,
}

impl ReportFile {
    /// The fitted outcome for `family`, if it was fitted in this run.
    pub fn fit_for(&self, family: Family) -> Option<&FamilyFit> {
        self.outcomes
            .iter()
            .filter_map(FamilyOutcome::fitted)
            .find(|fit| fit.family == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_tuple_puts_loc_scale_last() {
        let p = DistParams::new(vec![2.5, 0.3], -1.0, 4.0);
        assert_eq!(p.as_tuple(), vec![2.5, 0.3, -1.0, 4.0]);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let skipped = FamilyOutcome::Skipped {
            family: Family::Burr,
            reason: "sample is empty".to_string(),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["family"], "burr");

        let back: FamilyOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, skipped);
    }

    #[test]
    fn histogram_accessors() {
        let h = Histogram {
            bins: vec![Bin { label: 0, count: 5 }, Bin { label: 1, count: 3 }],
            source: PathBuf::from("t.csv"),
        };
        assert_eq!(h.labels(), vec![0, 1]);
        assert_eq!(h.counts(), vec![5, 3]);
        assert_eq!(h.total(), 8);
    }
}
