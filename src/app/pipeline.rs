//! Shared pipeline logic for the subcommands.
//!
//! Keeping this in one place keeps the workflow free of printing:
//! load -> align -> reconstruct -> fit/score per family -> rank
//!
//! `app` then focuses on presentation (printing, plots, exports).

use tracing::{info, warn};

use crate::data::{generate_histogram, reconstruct_sample};
use crate::domain::{
    Bin, ContinuousConfig, DiscreteConfig, GenerateConfig, Histogram, MultinomialFit,
};
use crate::error::{AppError, EXIT_NO_DATA, EXIT_NUMERIC};
use crate::fit::multinomial::fit_multinomial;
use crate::fit::selection::{Ranking, ScoreOptions, TestBins, fit_and_rank};
use crate::io::export::write_histogram_csv;
use crate::io::ingest::load_histogram;
use crate::models::Family;

/// All computed outputs of a continuous run.
#[derive(Debug, Clone)]
pub struct ContinuousRun {
    pub train: Histogram,
    pub test: Histogram,
    pub ranking: Ranking,
}

/// All computed outputs of a discrete run.
#[derive(Debug, Clone)]
pub struct DiscreteRun {
    pub train: Histogram,
    pub test: Histogram,
    pub fit: MultinomialFit,
}

/// Load both histograms, fit every configured family and rank them.
///
/// Fails with exit code 3 when no family could be fitted.
pub fn run_continuous(config: &ContinuousConfig) -> Result<ContinuousRun, AppError> {
    let train = load_histogram(&config.train_path)?;
    let test = load_histogram(&config.test_path)?;
    check_aligned(&train, &test)?;

    let sample = reconstruct_sample(&train.labels(), &train.counts());
    let families: &[Family] = if config.families.is_empty() {
        &Family::ALL
    } else {
        &config.families
    };

    let labels = train.labels();
    let counts = test.counts();
    let bins = TestBins {
        labels: &labels,
        counts: &counts,
    };
    let opts = ScoreOptions {
        budget: config.budget,
        ddof: config.ddof,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| AppError::new(EXIT_NUMERIC, format!("Failed to start worker pool: {e}")))?;
    let ranking = pool.install(|| fit_and_rank(families, &sample, bins, &opts));

    info!(
        families = families.len(),
        fitted = ranking.fitted_count(),
        sample = sample.len(),
        "continuous run finished"
    );

    if ranking.fitted_count() == 0 {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!(
                "No family could be fitted ({} tried, training total {}).",
                families.len(),
                train.total()
            ),
        ));
    }

    Ok(ContinuousRun {
        train,
        test,
        ranking,
    })
}

/// Load both histograms and fit the multinomial model.
pub fn run_discrete(config: &DiscreteConfig) -> Result<DiscreteRun, AppError> {
    let train = load_histogram(&config.train_path)?;
    let test = load_histogram(&config.test_path)?;
    check_aligned(&train, &test)?;

    let fit = fit_multinomial(&train.labels(), &train.counts(), &test.counts(), config.ddof)?;
    info!(
        categories = fit.labels.len(),
        p_value = fit.chi_square.p_value,
        "discrete run finished"
    );

    Ok(DiscreteRun { train, test, fit })
}

/// Draw a synthetic histogram and write it where the loader can read it.
pub fn run_generate(config: &GenerateConfig) -> Result<Vec<Bin>, AppError> {
    let bins = generate_histogram(config.family, &config.params, config.count, config.seed)?;
    write_histogram_csv(&config.output, &bins)?;
    info!(
        family = config.family.name(),
        bins = bins.len(),
        path = %config.output.display(),
        "wrote histogram"
    );
    Ok(bins)
}

/// Training and test histograms must have the same number of bins.
///
/// Differing labels at the same position are only warned about; the training
/// labels are used.
pub fn check_aligned(train: &Histogram, test: &Histogram) -> Result<(), AppError> {
    if train.len() != test.len() {
        return Err(AppError::input(format!(
            "Training file '{}' has {} bins but test file '{}' has {}.",
            train.source.display(),
            train.len(),
            test.source.display(),
            test.len()
        )));
    }

    let mismatched = train
        .bins
        .iter()
        .zip(&test.bins)
        .filter(|(a, b)| a.label != b.label)
        .count();
    if mismatched > 0 {
        warn!(
            mismatched,
            "training and test labels differ; using training labels"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DistParams, FitBudget};
    use crate::error::EXIT_INPUT;
    use crate::math::special::norm_cdf;
    use std::path::{Path, PathBuf};

    fn write(dir: &Path, name: &str, rows: &[(i64, u64)]) -> PathBuf {
        let path = dir.join(name);
        let bins: Vec<Bin> = rows
            .iter()
            .map(|&(label, count)| Bin { label, count })
            .collect();
        write_histogram_csv(&path, &bins).unwrap();
        path
    }

    fn binned_normal() -> Vec<(i64, u64)> {
        (8..=71)
            .map(|k| {
                let x = k as f64;
                let p = norm_cdf((x + 1.0 - 40.0) / 8.0) - norm_cdf((x - 40.0) / 8.0);
                (k, (5000.0 * p).round() as u64)
            })
            .collect()
    }

    fn continuous_config(train: PathBuf, test: PathBuf, families: Vec<Family>) -> ContinuousConfig {
        ContinuousConfig {
            train_path: train,
            test_path: test,
            families,
            budget: FitBudget {
                time_limit: None,
                ..FitBudget::default()
            },
            ddof: 0,
            jobs: 2,
            show_expected: false,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_report: None,
            export_expected: None,
        }
    }

    #[test]
    fn continuous_run_picks_norm_for_binned_normal() {
        let dir = tempfile::tempdir().unwrap();
        let rows = binned_normal();
        let train = write(dir.path(), "train.csv", &rows);
        let test = write(dir.path(), "test.csv", &rows);

        let config = continuous_config(train, test, vec![Family::Laplace, Family::Norm, Family::Expon]);
        let run = run_continuous(&config).unwrap();

        assert_eq!(run.ranking.outcomes.len(), 3);
        assert_eq!(run.ranking.best_fit().unwrap().family, Family::Norm);
        assert_eq!(run.train.len(), rows.len());
    }

    #[test]
    fn all_zero_training_counts_fail_with_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let train = write(dir.path(), "train.csv", &[(0, 0), (1, 0), (2, 0)]);
        let test = write(dir.path(), "test.csv", &[(0, 1), (1, 2), (2, 1)]);

        let config = continuous_config(train, test, vec![Family::Norm, Family::Gamma]);
        let err = run_continuous(&config).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
    }

    #[test]
    fn unequal_lengths_are_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let train = write(dir.path(), "train.csv", &[(0, 5), (1, 3)]);
        let test = write(dir.path(), "test.csv", &[(0, 5)]);

        let config = continuous_config(train, test, vec![Family::Norm]);
        let err = run_continuous(&config).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("2 bins"));
    }

    #[test]
    fn differing_labels_only_warn() {
        let a = Histogram {
            bins: vec![Bin { label: 0, count: 1 }, Bin { label: 1, count: 2 }],
            source: PathBuf::from("a.csv"),
        };
        let b = Histogram {
            bins: vec![Bin { label: 0, count: 1 }, Bin { label: 5, count: 2 }],
            source: PathBuf::from("b.csv"),
        };
        assert!(check_aligned(&a, &b).is_ok());
    }

    #[test]
    fn discrete_run_masks_unseen_categories() {
        let dir = tempfile::tempdir().unwrap();
        let train = write(dir.path(), "train_12.csv", &[(0, 2), (1, 6), (2, 0), (3, 2)]);
        let test = write(dir.path(), "test_12.csv", &[(0, 1), (1, 7), (2, 3), (3, 1)]);

        let run = run_discrete(&DiscreteConfig {
            train_path: train,
            test_path: test,
            ddof: 0,
        })
        .unwrap();
        assert_eq!(run.fit.masked, vec![2]);
        assert_eq!(run.fit.chi_square.dof, 2);
    }

    #[test]
    fn discrete_run_with_empty_training_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let train = write(dir.path(), "train_12.csv", &[(0, 0), (1, 0)]);
        let test = write(dir.path(), "test_12.csv", &[(0, 1), (1, 1)]);

        let err = run_discrete(&DiscreteConfig {
            train_path: train,
            test_path: test,
            ddof: 0,
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
    }

    #[test]
    fn generated_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gen.csv");
        let config = GenerateConfig {
            family: Family::Gamma,
            params: DistParams::new(vec![3.0], 0.0, 4.0),
            count: 500,
            seed: 7,
            output: output.clone(),
        };
        let bins = run_generate(&config).unwrap();

        let loaded = load_histogram(&output).unwrap();
        assert_eq!(loaded.bins, bins);
        assert_eq!(loaded.total(), 500);
    }
}
