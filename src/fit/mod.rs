//! Calibration: turning harvested samples into published models.
//!
//! Responsibilities:
//!
//! - classify each parameter as continuous / quantized / binary
//! - fit each candidate family (parallel) and score it
//! - select the best family with fallbacks
//! - calibrate whole devices (parallel per parameter)

pub mod calibrate;
pub mod classify;
pub mod fitter;
pub mod selection;

pub use calibrate::*;
pub use classify::*;
pub use fitter::*;
pub use selection::*;
