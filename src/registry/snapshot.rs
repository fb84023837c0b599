//! Immutable, versioned catalog of calibrated models.

use chrono::{DateTime, Utc};

use crate::domain::ParameterModel;
use crate::error::MappingError;
use crate::mixer::{ChannelKind, ChannelTable};

/// Calibrated parameters of one device, in descriptor index order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceModels {
    pub name: String,
    pub parameters: Vec<ParameterModel>,
}

impl DeviceModels {
    pub fn parameter(&self, name: &str) -> Option<&ParameterModel> {
        self.parameters.iter().find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// One complete published registry state. Never mutated after publication.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub devices: Vec<DeviceModels>,
    pub channels: Vec<ChannelTable>,
}

impl RegistrySnapshot {
    /// Version 0: nothing calibrated yet.
    pub fn empty() -> Self {
        Self {
            version: 0,
            created_at: Utc::now(),
            devices: Vec::new(),
            channels: Vec::new(),
        }
    }

    pub fn new(version: u64, devices: Vec<DeviceModels>, channels: Vec<ChannelTable>) -> Self {
        Self {
            version,
            created_at: Utc::now(),
            devices,
            channels,
        }
    }

    pub fn device(&self, name: &str) -> Option<&DeviceModels> {
        self.devices.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Look up `(device, parameter)`; names match case-insensitively.
    pub fn parameter(&self, device: &str, parameter: &str) -> Result<&ParameterModel, MappingError> {
        self.device(device)
            .and_then(|d| d.parameter(parameter))
            .ok_or_else(|| MappingError::UnknownParameter {
                device: device.to_string(),
                parameter: parameter.to_string(),
            })
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&ChannelTable> {
        self.channels.iter().find(|c| c.kind() == kind)
    }

    pub fn parameter_count(&self) -> usize {
        self.devices.iter().map(|d| d.parameters.len()).sum()
    }
}
