//! Preset catalog input.
//!
//! The catalog is a JSON export of every cataloged preset per device:
//!
//! ```json
//! {"devices": [{
//!     "name": "Reverb",
//!     "parameters": [{"name": "Decay Time", "index": 3, "control_type": "continuous"}],
//!     "presets": [{"name": "Hall", "values": [
//!         {"parameter": "Decay Time", "normalized": 0.42, "display": "2.10 s"}
//!     ]}],
//!     "label_maps": {"Freeze": [{"normalized": 0.0, "label": "Off"}, {"normalized": 1.0, "label": "On"}]}
//! }]}
//! ```
//!
//! `parameters` and `label_maps` are optional.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::ParameterDescriptor;
use crate::error::AppError;
use crate::models::LabelEntry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetCatalog {
    pub devices: Vec<DeviceCatalog>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceCatalog {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub label_maps: BTreeMap<String, Vec<LabelEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub values: Vec<PresetValue>,
}

/// One parameter's stored state inside a preset. Either side may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetValue {
    pub parameter: String,
    #[serde(default)]
    pub normalized: Option<f64>,
    #[serde(default)]
    pub display: Option<String>,
}

impl DeviceCatalog {
    /// Declared descriptors, or descriptors derived from preset contents.
    ///
    /// Derived descriptors are continuous, with indices in first-seen order.
    /// Either way the result is sorted by index.
    pub fn descriptors(&self) -> Vec<ParameterDescriptor> {
        let mut out = if self.parameters.is_empty() {
            let mut seen = HashSet::new();
            let mut derived = Vec::new();
            for value in self.presets.iter().flat_map(|p| &p.values) {
                if seen.insert(value.parameter.as_str()) {
                    derived.push(ParameterDescriptor::continuous(&value.parameter, derived.len()));
                }
            }
            derived
        } else {
            self.parameters.clone()
        };
        out.sort_by_key(|d| d.index);
        out
    }
}

/// Read a preset catalog JSON file.
pub fn read_catalog_json(path: &Path) -> Result<PresetCatalog, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open preset catalog '{}': {e}", path.display())))?;
    let catalog: PresetCatalog = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid preset catalog JSON: {e}")))?;
    if catalog.devices.is_empty() {
        return Err(AppError::new(2, "Preset catalog lists no devices."));
    }
    Ok(catalog)
}
