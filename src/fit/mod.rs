//! Distribution fitting and scoring.
//!
//! Responsibilities:
//!
//! - maximum-likelihood fits per family (`fitter`)
//! - expected bin frequencies and the chi-square test (`expected`, `gof`)
//! - ranking families by p-value, in parallel (`selection`)
//! - the multinomial model for categorical counts (`multinomial`)

pub mod expected;
pub mod fitter;
pub mod gof;
pub mod multinomial;
pub mod selection;

pub use expected::*;
pub use fitter::*;
pub use gof::*;
pub use multinomial::*;
pub use selection::*;
