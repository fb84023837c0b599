//! Error types.
//!
//! - `MappingError` is the typed failure taxonomy of the library (harvest, fit,
//!   registry, conversion).
//! - `AppError` is what the `pcal` binary reports: a message plus an exit code.

use thiserror::Error;

/// Failures raised while calibrating or converting parameter values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("Parameter '{parameter}' has {found} usable samples, need at least {required}.")]
    InsufficientSamples {
        parameter: String,
        found: usize,
        required: usize,
    },

    #[error("No acceptable fit for '{parameter}': {reason}")]
    NoAcceptableFit { parameter: String, reason: String },

    #[error("Value {value} is outside the domain of the {family} mapping.")]
    OutOfDomain { family: &'static str, value: f64 },

    #[error("No label matches '{0}'.")]
    LabelNotFound(String),

    #[error("Cannot express a value in '{from}' as '{to}'.")]
    UnitMismatch { from: String, to: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unknown parameter '{parameter}' on device '{device}'.")]
    UnknownParameter { device: String, parameter: String },

    #[error("Snapshot version {offered} is not newer than current version {current}.")]
    StaleSnapshot { current: u64, offered: u64 },
}

impl MappingError {
    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            MappingError::InvalidModel(_) | MappingError::StaleSnapshot { .. } => 2,
            MappingError::InsufficientSamples { .. } => 3,
            MappingError::NoAcceptableFit { .. } => 4,
            MappingError::OutOfDomain { .. }
            | MappingError::LabelNotFound(_)
            | MappingError::UnitMismatch { .. }
            | MappingError::UnknownParameter { .. } => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<MappingError> for AppError {
    fn from(err: MappingError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_errors_carry_exit_codes_into_app_errors() {
        let err: AppError = MappingError::LabelNotFound("Wobble".to_string()).into();
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.to_string(), "No label matches 'Wobble'.");

        let err: AppError = MappingError::InsufficientSamples {
            parameter: "Decay".to_string(),
            found: 2,
            required: 6,
        }
        .into();
        assert_eq!(err.exit_code(), 3);
    }
}
