//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - histogram inputs (`Bin`, `Histogram`)
//! - fit outputs (`FamilyOutcome`, `FamilyFit`, `ChiSquare`, `MultinomialFit`)
//! - run configuration (`ContinuousConfig`, `DiscreteConfig`, `GenerateConfig`)
//! - the saved report (`ReportFile`)

pub mod types;

pub use types::*;
