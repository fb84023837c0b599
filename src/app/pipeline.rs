//! Shared calibration pipeline.
//!
//! catalog -> per-device calibration (parallel per parameter) -> snapshot
//!
//! The binary handles I/O and printing; this module only computes.

use tracing::info;

use crate::domain::CalibrationConfig;
use crate::error::AppError;
use crate::fit::{DeviceCalibration, calibrate_device};
use crate::harvest::PresetCatalog;
use crate::mixer::standard_channels;
use crate::registry::{DeviceModels, RegistrySnapshot};

/// All outputs of one `pcal calibrate` run.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub results: Vec<DeviceCalibration>,
    pub snapshot: RegistrySnapshot,
}

/// Calibrate every device of `catalog` into the snapshot that follows `previous_version`.
///
/// The run is idempotent: it always starts from the catalog, never from a
/// partial earlier result.
pub fn run_calibration(
    catalog: &PresetCatalog,
    config: &CalibrationConfig,
    previous_version: u64,
    include_mixer: bool,
) -> Result<CalibrationRun, AppError> {
    let results: Vec<DeviceCalibration> = catalog
        .devices
        .iter()
        .map(|device| calibrate_device(device, config))
        .collect();

    let devices = results
        .iter()
        .map(|r| DeviceModels {
            name: r.device.clone(),
            parameters: r.calibrated.iter().map(|c| c.model.clone()).collect(),
        })
        .collect();
    let channels = if include_mixer { standard_channels()? } else { Vec::new() };

    let snapshot = RegistrySnapshot::new(previous_version + 1, devices, channels);
    info!(
        version = snapshot.version,
        devices = snapshot.devices.len(),
        parameters = snapshot.parameter_count(),
        "calibration finished"
    );

    Ok(CalibrationRun { results, snapshot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::{DeviceCatalog, Preset, PresetValue};
    use crate::mixer::ChannelKind;

    fn catalog() -> PresetCatalog {
        let presets = (0..=8)
            .map(|i| {
                let x = i as f64 / 8.0;
                Preset {
                    name: format!("P{i}"),
                    values: vec![
                        PresetValue {
                            parameter: "Gain".to_string(),
                            normalized: Some(x),
                            display: Some(format!("{:.2} dB", -36.0 + 72.0 * x)),
                        },
                        PresetValue {
                            parameter: "Bypass".to_string(),
                            normalized: Some(if i % 2 == 0 { 0.0 } else { 1.0 }),
                            display: Some(if i % 2 == 0 { "Off" } else { "On" }.to_string()),
                        },
                    ],
                }
            })
            .collect();
        PresetCatalog {
            devices: vec![DeviceCatalog {
                name: "Utility".to_string(),
                presets,
                ..DeviceCatalog::default()
            }],
        }
    }

    #[test]
    fn calibration_publishes_the_next_version() {
        let run = run_calibration(&catalog(), &CalibrationConfig::default(), 6, true).unwrap();
        assert_eq!(run.snapshot.version, 7);
        assert_eq!(run.snapshot.parameter_count(), 2);
        assert!(run.snapshot.parameter("Utility", "Gain").is_ok());
        assert!(run.snapshot.channel(ChannelKind::Sends).is_some());
    }

    #[test]
    fn mixer_tables_are_optional() {
        let run = run_calibration(&catalog(), &CalibrationConfig::default(), 0, false).unwrap();
        assert_eq!(run.snapshot.version, 1);
        assert!(run.snapshot.channels.is_empty());
    }
}
