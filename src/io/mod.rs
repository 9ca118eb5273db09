//! Input/output helpers.
//!
//! - histogram CSV ingest + validation (`ingest`)
//! - CSV exports of expected frequencies and generated histograms (`export`)
//! - report JSON read/write (`report`)

pub mod export;
pub mod ingest;
pub mod report;

pub use export::*;
pub use ingest::*;
pub use report::*;
