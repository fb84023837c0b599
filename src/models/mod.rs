//! Transfer-function implementations.
//!
//! Models are implemented as small, pure functions so that fitting code and the
//! converter can share them:
//!
//! - closed-form families (`family`)
//! - tabulated piecewise curves (`piecewise`)
//! - discrete label maps (`labels`)
//! - forward/inverse dispatch over `Curve` (`curve`)

pub mod curve;
pub mod family;
pub mod labels;
pub mod piecewise;

pub use family::*;
pub use labels::*;
pub use piecewise::*;
