//! Request-time conversion between normalized and display values.

pub mod converter;
pub mod units;

pub use converter::*;
pub use units::*;
