//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (the tests below pin the layout)

use crate::domain::{DistParams, FamilyFit, FamilyOutcome, Histogram, MultinomialFit};
use crate::fit::selection::Ranking;
use crate::models::Family;

/// Format the continuous run: per-family p-values, skips, and the best family.
pub fn format_continuous_summary(
    train: &Histogram,
    test: &Histogram,
    ranking: &Ranking,
    show_expected: bool,
) -> String {
    let mut out = String::new();

    out.push_str("=== histfit - continuous families ===\n");
    out.push_str(&format_histogram_line("Train", train));
    out.push_str(&format_histogram_line("Test ", test));

    out.push_str("\nFamily diagnostics:\n");
    for (i, outcome) in ranking.outcomes.iter().enumerate() {
        match outcome {
            FamilyOutcome::Fitted(fit) => {
                let chosen = if ranking.best == Some(i) { "*" } else { " " };
                let flag = if fit.converged { "" } else { " (not converged)" };
                out.push_str(&format!(
                    "{chosen} {:<16} p={:.6} chi2={:.3} dof={} logL={:.3}{flag}\n",
                    fit.family.name(),
                    fit.chi_square.p_value,
                    fit.chi_square.statistic,
                    fit.chi_square.dof,
                    fit.log_likelihood,
                ));
            }
            FamilyOutcome::Skipped { family, reason } => {
                out.push_str(&format!(
                    "  (skipped {}) {}\n",
                    family.name(),
                    truncate(reason, 100)
                ));
            }
        }
    }
    out.push_str(&format!(
        "Fitted {}/{} families.\n",
        ranking.fitted_count(),
        ranking.outcomes.len()
    ));

    if let Some(best) = ranking.best_fit() {
        out.push_str("\nBest family:\n");
        out.push_str(&format!("- {} (method={:?})\n", best.family, best.method));
        out.push_str(&format!("- p-value: {:.6}\n", best.chi_square.p_value));
        out.push_str(&format!(
            "- params : {}\n",
            fmt_params(best.family, &best.params)
        ));
        out.push_str(&format!(
            "- expected total: {:.3} of {} observed\n",
            best.expected.iter().sum::<f64>(),
            test.total()
        ));
    }

    if show_expected {
        let labels = train.labels();
        for fit in ranking.outcomes.iter().filter_map(FamilyOutcome::fitted) {
            out.push('\n');
            out.push_str(&format_expected_table(fit, &labels, &test.counts()));
        }
    }

    out.push('\n');
    out
}

/// Format the discrete (multinomial) run.
pub fn format_discrete_summary(train: &Histogram, test: &Histogram, fit: &MultinomialFit) -> String {
    let mut out = String::new();

    out.push_str("=== histfit - multinomial ===\n");
    out.push_str(&format_histogram_line("Train", train));
    out.push_str(&format_histogram_line("Test ", test));

    out.push('\n');
    out.push_str(&format!("{:>8} {:>10} {:>10} {:>12}\n", "label", "p", "observed", "expected"));
    out.push_str(&format!("{:->8} {:->10} {:->10} {:->12}\n", "", "", "", ""));
    for (((label, p), o), e) in fit
        .labels
        .iter()
        .zip(&fit.probabilities)
        .zip(&fit.observed)
        .zip(&fit.expected)
    {
        out.push_str(&format!("{label:>8} {p:>10.6} {o:>10} {e:>12.3}\n"));
    }
    if !fit.masked.is_empty() {
        out.push_str(&format!(
            "Masked (zero training count): {:?}\n",
            fit.masked
        ));
    }

    out.push_str("\nResult:\n");
    out.push_str(&format!("- chi2   : {:.6}\n", fit.chi_square.statistic));
    out.push_str(&format!("- dof    : {}\n", fit.chi_square.dof));
    out.push_str(&format!("- p-value: {:.6}\n", fit.chi_square.p_value));
    out.push_str(&format!("- log pmf: {:.6}\n", fit.log_pmf));
    out.push('\n');

    out
}

/// The family catalog with shape-parameter names, one per line.
pub fn format_families() -> String {
    let mut out = String::new();
    for family in Family::ALL {
        let names: Vec<&str> = family.shapes().iter().map(|s| s.name).collect();
        if names.is_empty() {
            out.push_str(&format!("{}\n", family.name()));
        } else {
            out.push_str(&format!("{:<16} {}\n", family.name(), names.join(", ")));
        }
    }
    out
}

/// Named parameters, e.g. `a=2.000000, loc=0.000000, scale=1.000000`.
pub fn fmt_params(family: Family, params: &DistParams) -> String {
    let mut parts: Vec<String> = family
        .shapes()
        .iter()
        .zip(&params.shapes)
        .map(|(spec, v)| format!("{}={v:.6}", spec.name))
        .collect();
    parts.push(format!("loc={:.6}", params.loc));
    parts.push(format!("scale={:.6}", params.scale));
    parts.join(", ")
}

fn format_histogram_line(name: &str, h: &Histogram) -> String {
    let range = match (h.bins.first(), h.bins.last()) {
        (Some(first), Some(last)) => format!("[{}, {}]", first.label, last.label),
        _ => "[]".to_string(),
    };
    format!(
        "{name}: {} | bins={} | labels={range} | total={}\n",
        h.source.display(),
        h.len(),
        h.total()
    )
}

fn format_expected_table(fit: &FamilyFit, labels: &[i64], observed: &[u64]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Expected frequencies ({}):\n", fit.family));
    out.push_str(&format!("{:>8} {:>10} {:>12}\n", "label", "observed", "expected"));
    for ((label, o), e) in labels.iter().zip(observed).zip(&fit.expected) {
        out.push_str(&format!("{label:>8} {o:>10} {e:>12.3}\n"));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bin, ChiSquare, FitMethod};
    use std::path::PathBuf;

    fn histogram(name: &str, counts: &[u64]) -> Histogram {
        Histogram {
            bins: counts
                .iter()
                .enumerate()
                .map(|(i, &count)| Bin {
                    label: i as i64,
                    count,
                })
                .collect(),
            source: PathBuf::from(name),
        }
    }

    fn fit(family: Family, p_value: f64, params: DistParams) -> FamilyFit {
        FamilyFit {
            family,
            params,
            log_likelihood: -12.5,
            method: FitMethod::NelderMead,
            iterations: 40,
            converged: true,
            expected: vec![1.0, 2.0, 1.0],
            chi_square: ChiSquare {
                statistic: 0.25,
                dof: 2,
                p_value,
            },
        }
    }

    #[test]
    fn continuous_summary_marks_best_and_lists_skips() {
        let train = histogram("train.csv", &[1, 2, 1]);
        let test = histogram("test.csv", &[1, 3, 1]);
        let ranking = Ranking {
            outcomes: vec![
                FamilyOutcome::Fitted(fit(Family::Norm, 0.4, DistParams::new(vec![], 1.0, 0.7))),
                FamilyOutcome::Skipped {
                    family: Family::Burr,
                    reason: "fit exceeded its time budget of 10s".into(),
                },
                FamilyOutcome::Fitted(fit(
                    Family::Gamma,
                    0.8,
                    DistParams::new(vec![2.0], -1.0, 0.5),
                )),
            ],
            best: Some(2),
        };

        let txt = format_continuous_summary(&train, &test, &ranking, false);
        assert!(txt.contains("  norm "));
        assert!(txt.contains("* gamma "));
        assert!(txt.contains("(skipped burr) fit exceeded its time budget"));
        assert!(txt.contains("Fitted 2/3 families."));
        assert!(txt.contains("- params : a=2.000000, loc=-1.000000, scale=0.500000"));
        assert!(txt.contains("- expected total: 4.000 of 5 observed"));
        assert!(!txt.contains("Expected frequencies"));

        let with_table = format_continuous_summary(&train, &test, &ranking, true);
        assert!(with_table.contains("Expected frequencies (norm):"));
        assert!(with_table.contains("Expected frequencies (gamma):"));
    }

    #[test]
    fn discrete_summary_reports_masked_and_log_pmf() {
        let train = histogram("train_12.csv", &[2, 6, 0, 2]);
        let test = histogram("test_12.csv", &[1, 7, 3, 1]);
        let mf = MultinomialFit {
            labels: vec![0, 1, 3],
            probabilities: vec![0.2, 0.6, 0.2],
            masked: vec![2],
            expected: vec![1.8, 5.4, 1.8],
            observed: vec![1, 7, 1],
            chi_square: ChiSquare {
                statistic: 1.185185,
                dof: 2,
                p_value: 0.552,
            },
            log_pmf: -2.1,
        };
        let txt = format_discrete_summary(&train, &test, &mf);
        assert!(txt.contains("Masked (zero training count): [2]"));
        assert!(txt.contains("- dof    : 2"));
        assert!(txt.contains("- log pmf: -2.100000"));
        assert!(txt.contains("       1   0.600000          7        5.400"));
    }

    #[test]
    fn families_listing_covers_the_catalog() {
        let txt = format_families();
        assert_eq!(txt.lines().count(), Family::ALL.len());
        assert_eq!(txt.lines().next(), Some("arcsine"));
        assert!(txt.lines().any(|l| l.starts_with("burr") && l.ends_with("c, d")));
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
