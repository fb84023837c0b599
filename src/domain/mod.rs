//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parameter descriptors and control types
//! - harvested samples (`SamplePair`, `SampleValue`)
//! - fitted outputs (`Curve`, `FitModel`, `Mapping`, `ParameterModel`)
//! - calibration configuration

pub mod types;

pub use types::*;
