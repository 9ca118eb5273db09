//! Reporting: formatted terminal output for both analyses.

pub mod format;

pub use format::*;
