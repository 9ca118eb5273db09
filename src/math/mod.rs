//! Mathematical utilities: special functions, quadrature and the simplex optimizer.

pub mod quad;
pub mod simplex;
pub mod special;

pub use quad::integrate;
pub use simplex::{Minimum, NelderMead, SimplexError};
