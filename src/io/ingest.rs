//! CSV ingest for histogram files.
//!
//! Each file is a headerless two-column CSV: bin label (signed integer) and
//! count (non-negative integer). Extra columns are ignored, blank lines are
//! skipped, and a UTF-8 byte-order mark on the first field is tolerated.
//! Any malformed row aborts the load with an error naming the file and line.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{Bin, Histogram};
use crate::error::AppError;

/// Load a histogram from `path`, keeping file order.
pub fn load_histogram(path: &Path) -> Result<Histogram, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open CSV", path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut bins = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);
            AppError::input(format!(
                "{}:{line}: CSV parse error: {e}",
                path.display()
            ))
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);
        let bin = parse_row(&record, idx == 0)
            .map_err(|msg| AppError::input(format!("{}:{line}: {msg}", path.display())))?;
        bins.push(bin);
    }

    debug!(
        path = %path.display(),
        bins = bins.len(),
        total = bins.iter().map(|b| b.count).sum::<u64>(),
        "loaded histogram"
    );

    Ok(Histogram {
        bins,
        source: path.to_path_buf(),
    })
}

fn parse_row(record: &StringRecord, first: bool) -> Result<Bin, String> {
    if record.len() < 2 {
        return Err(format!(
            "expected 2 columns (label, count), found {}",
            record.len()
        ));
    }

    let mut label_field = record.get(0).unwrap_or("");
    if first {
        label_field = label_field.trim_start_matches('\u{feff}').trim();
    }
    let count_field = record.get(1).unwrap_or("");

    let label = label_field
        .parse::<i64>()
        .map_err(|_| format!("bin label '{label_field}' is not an integer"))?;
    let count = count_field
        .parse::<u64>()
        .map_err(|_| format!("count '{count_field}' is not a non-negative integer"))?;

    Ok(Bin { label, count })
}
