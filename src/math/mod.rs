//! Mathematical utilities: least squares, goodness of fit, interpolation.

pub mod interp;
pub mod ols;
pub mod stats;

pub use interp::*;
pub use ols::*;
pub use stats::*;
