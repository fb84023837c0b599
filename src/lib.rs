//! `param-curves` library crate.
//!
//! The binary (`pcal`) is a thin wrapper around this library so that:
//!
//! - calibration and conversion are testable without spawning processes
//! - the converter can be embedded in-process by a command layer
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod convert;
pub mod domain;
pub mod error;
pub mod fit;
pub mod harvest;
pub mod math;
pub mod mixer;
pub mod models;
pub mod registry;
pub mod report;
