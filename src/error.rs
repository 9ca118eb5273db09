//! Error types.
//!
//! - `AppError` is what the pipeline returns to `main`: a message plus the
//!   process exit code (2 = input/config, 3 = insufficient data, 4 = numerical).
//! - `FitError` describes why a single family could not be fitted or scored.
//!   The ranker turns it into a "skipped" entry instead of aborting the run.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Exit code for unreadable or malformed input and bad flags.
pub const EXIT_INPUT: u8 = 2;
/// Exit code when there is not enough usable data to produce a result.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for numerical failures.
pub const EXIT_NUMERIC: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Input/config error (exit code 2).
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    /// I/O failure on `path`, naming the file.
    pub fn io(action: &str, path: &Path, err: impl std::fmt::Display) -> Self {
        Self::new(
            EXIT_INPUT,
            format!("Failed to {action} '{}': {err}", path.display()),
        )
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a family could not be fitted or scored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("sample is empty")]
    EmptySample,

    #[error("degenerate sample: {0}")]
    Degenerate(String),

    #[error("no starting point with the sample inside the support")]
    StartOutsideSupport,

    #[error("fit produced non-finite parameters or likelihood")]
    NonFinite,

    #[error("fit exceeded its time budget of {0:?}")]
    TimeBudget(Duration),

    #[error("optimizer did not converge within {0} iterations")]
    NotConverged(usize),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("expected frequency for bin {label} is {value} (must be finite and > 0)")]
    InvalidExpected { label: i64, value: f64 },

    #[error("chi-square test needs at least 1 degree of freedom, got {0}")]
    DegreesOfFreedom(i64),
}

impl FitError {
    /// Whether the failure is caused by the data rather than by the numerics.
    pub fn is_data_problem(&self) -> bool {
        matches!(
            self,
            Self::EmptySample | Self::Degenerate(_) | Self::DegreesOfFreedom(_)
        )
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let code = if err.is_data_problem() {
            EXIT_NO_DATA
        } else {
            EXIT_NUMERIC
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let data: AppError = FitError::EmptySample.into();
        assert_eq!(data.exit_code(), EXIT_NO_DATA);

        let numeric: AppError = FitError::NonFinite.into();
        assert_eq!(numeric.exit_code(), EXIT_NUMERIC);
    }

    #[test]
    fn io_error_names_the_file() {
        let err = AppError::io("open CSV", Path::new("train.csv"), "not found");
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("train.csv"));
    }
}
