//! CSV exports: expected frequencies (long format) and generated histograms.
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts;
//! the histogram export is readable by `load_histogram`.

use std::path::Path;

use crate::domain::{Bin, FamilyOutcome};
use crate::error::AppError;

/// Write `family,label,observed,expected` rows for every fitted family.
pub fn write_expected_csv(
    path: &Path,
    labels: &[i64],
    observed: &[u64],
    outcomes: &[FamilyOutcome],
) -> Result<(), AppError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| AppError::io("create export CSV", path, e))?;
    let write_err = |e: csv::Error| AppError::io("write export CSV", path, e);

    writer
        .write_record(["family", "label", "observed", "expected"])
        .map_err(write_err)?;

    for fit in outcomes.iter().filter_map(FamilyOutcome::fitted) {
        for ((label, count), expected) in labels.iter().zip(observed).zip(&fit.expected) {
            writer
                .write_record([
                    fit.family.name().to_string(),
                    label.to_string(),
                    count.to_string(),
                    format!("{expected:.6}"),
                ])
                .map_err(write_err)?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::io("write export CSV", path, e))?;
    Ok(())
}

/// Write a headerless `label,count` histogram.
pub fn write_histogram_csv(path: &Path, bins: &[Bin]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::io("create histogram CSV", path, e))?;

    for bin in bins {
        writer
            .write_record([bin.label.to_string(), bin.count.to_string()])
            .map_err(|e| AppError::io("write histogram CSV", path, e))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io("write histogram CSV", path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChiSquare, DistParams, FamilyFit, FitMethod};
    use crate::io::load_histogram;
    use crate::models::Family;

    #[test]
    fn histogram_export_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.csv");
        let bins = vec![
            Bin { label: -1, count: 2 },
            Bin { label: 0, count: 0 },
            Bin { label: 1, count: 9 },
        ];
        write_histogram_csv(&path, &bins).unwrap();
        let h = load_histogram(&path).unwrap();
        assert_eq!(h.bins, bins);
    }

    #[test]
    fn expected_export_is_long_format_for_fitted_families() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expected.csv");
        let outcomes = vec![
            FamilyOutcome::Fitted(FamilyFit {
                family: Family::Norm,
                params: DistParams::new(vec![], 1.0, 1.0),
                log_likelihood: -3.0,
                method: FitMethod::ClosedForm,
                iterations: 0,
                converged: true,
                expected: vec![1.5, 2.25],
                chi_square: ChiSquare {
                    statistic: 0.1,
                    dof: 1,
                    p_value: 0.75,
                },
            }),
            FamilyOutcome::Skipped {
                family: Family::Burr,
                reason: "x".into(),
            },
        ];
        write_expected_csv(&path, &[0, 1], &[2, 2], &outcomes).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "family,label,observed,expected");
        assert_eq!(lines[1], "norm,0,2,1.500000");
        assert_eq!(lines[2], "norm,1,2,2.250000");
        assert_eq!(lines.len(), 3);
    }
}
