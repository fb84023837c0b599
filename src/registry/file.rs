//! Read/write registry JSON files.
//!
//! The file is the persisted form of one `RegistrySnapshot` (see `record`).
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader of the path sees either the old or the new file in full.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::registry::record::RegistryFile;
use crate::registry::snapshot::RegistrySnapshot;

/// Read and validate a registry JSON file.
pub fn read_registry_json(path: &Path) -> Result<RegistrySnapshot, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open registry JSON '{}': {e}", path.display())))?;
    let raw: RegistryFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid registry JSON '{}': {e}", path.display())))?;
    let snapshot = RegistrySnapshot::try_from(raw)
        .map_err(|e| AppError::new(2, format!("Invalid registry JSON '{}': {e}", path.display())))?;
    Ok(snapshot)
}

/// Write `snapshot` to `path`, replacing any existing file.
pub fn write_registry_json(path: &Path, snapshot: &RegistrySnapshot) -> Result<(), AppError> {
    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp)
            .map_err(|e| AppError::new(2, format!("Failed to create registry JSON '{}': {e}", tmp.display())))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &RegistryFile::from(snapshot))
            .map_err(|e| AppError::new(2, format!("Failed to write registry JSON: {e}")))?;
        writer
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write registry JSON: {e}")))?;
    }
    fs::rename(&tmp, path)
        .map_err(|e| AppError::new(2, format!("Failed to replace registry JSON '{}': {e}", path.display())))?;
    Ok(())
}

/// Version stored in an existing registry file, or 0 when there is none.
pub fn stored_version(path: &Path) -> Result<u64, AppError> {
    if !path.exists() {
        return Ok(0);
    }
    read_registry_json(path).map(|s| s.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Curve, FitModel, Mapping, ParameterDescriptor, ParameterModel};
    use crate::mixer::standard_channels;
    use crate::registry::snapshot::DeviceModels;

    fn snapshot(version: u64) -> RegistrySnapshot {
        let model = ParameterModel {
            descriptor: ParameterDescriptor::continuous("Gain", 0),
            mapping: Mapping::Continuous(FitModel {
                curve: Curve::Linear { a: -36.0, b: 72.0 },
                r_squared: 0.98,
                confidence: 0.87,
            }),
        };
        RegistrySnapshot::new(
            version,
            vec![DeviceModels {
                name: "Utility".to_string(),
                parameters: vec![model],
            }],
            standard_channels().unwrap(),
        )
    }

    #[test]
    fn registry_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        assert_eq!(stored_version(&path).unwrap(), 0);

        let written = snapshot(4);
        write_registry_json(&path, &written).unwrap();
        let read = read_registry_json(&path).unwrap();

        assert_eq!(read.version, 4);
        assert_eq!(read.devices, written.devices);
        assert_eq!(read.channels.len(), 3);
        assert_eq!(read.channels[1].min_db(), written.channels[1].min_db());
        assert_eq!(stored_version(&path).unwrap(), 4);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn broken_files_are_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, "{\"version\": 1}").unwrap();
        let err = read_registry_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
