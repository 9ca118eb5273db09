//! Sample data: expanding histograms into raw observations and drawing
//! synthetic histograms from a fitted family.

pub mod sample;

pub use sample::*;
