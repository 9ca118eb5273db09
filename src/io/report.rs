//! Read/write JSON run reports.
//!
//! A report is the portable record of a continuous run:
//! - input paths, bin labels and observed test counts
//! - every family's outcome (parameters, expected frequencies, chi-square) or skip reason
//! - the best family
//!
//! The schema is defined by `domain::ReportFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;

use crate::domain::{Histogram, ReportFile};
use crate::error::AppError;
use crate::fit::Ranking;

/// Build the report for a finished run.
pub fn build_report(train: &Histogram, test: &Histogram, ranking: &Ranking) -> ReportFile {
    ReportFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated_at: Utc::now(),
        train_path: train.source.display().to_string(),
        test_path: test.source.display().to_string(),
        labels: train.labels(),
        observed: test.counts(),
        outcomes: ranking.outcomes.clone(),
        best: ranking.best_fit().map(|fit| fit.family),
    }
}

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &ReportFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io("create report JSON", path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .map_err(|e| AppError::io("write report JSON", path, e))?;
    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open report JSON", path, e))?;
    let report: ReportFile = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid report JSON '{}': {e}", path.display())))?;
    Ok(report)
}
