//! Continuous distribution families.
//!
//! Families are location-scale wrappers around small, pure standardized
//! functions so that fitting and scoring code can stay generic.

pub mod density;
pub mod family;

pub use family::*;
