//! Per-parameter and per-device calibration.
//!
//! harvest -> classify -> (label map | fit + select) -> `ParameterModel`
//!
//! Parameters are independent of each other, so a device is calibrated with one
//! rayon task per parameter. Output order follows the descriptor index.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{
    Bounds, CalibrationConfig, ControlType, Curve, FitModel, Mapping, ParameterDescriptor, ParameterModel, SamplePair,
    SampleValue,
};
use crate::convert::{is_known_unit, rescale};
use crate::error::MappingError;
use crate::fit::classify::{Classification, classify};
use crate::fit::selection::{fit_and_select, two_point};
use crate::harvest::{DeviceCatalog, collect_pairs, harvest, infer_unit};

/// A calibrated parameter plus the reason it was degraded, if it was.
#[derive(Debug, Clone)]
pub struct Calibrated {
    pub model: ParameterModel,
    pub fallback: Option<MappingError>,
}

/// Result of calibrating every parameter of one device.
#[derive(Debug, Clone)]
pub struct DeviceCalibration {
    pub device: String,
    pub calibrated: Vec<Calibrated>,
    /// Parameters that could not be published at all.
    pub skipped: Vec<(String, MappingError)>,
}

/// Calibrate one parameter of `device`.
pub fn calibrate_parameter(
    descriptor: &ParameterDescriptor,
    device: &DeviceCatalog,
    config: &CalibrationConfig,
) -> Result<Calibrated, MappingError> {
    let samples = match harvest(&descriptor.name, &device.presets, config.min_samples) {
        Ok(samples) => samples,
        Err(err) => {
            // Few samples still classify, and feed the fallback models.
            debug!(parameter = %descriptor.name, error = %err, "calibrating from a short harvest");
            collect_pairs(&descriptor.name, &device.presets)
        }
    };
    let explicit = device.label_maps.get(&descriptor.name).map(Vec::as_slice);

    let mut descriptor = descriptor.clone();
    if descriptor.unit.is_none() {
        descriptor.unit = infer_unit(&samples);
    }
    let samples = in_unit(&descriptor, samples);

    match classify(&descriptor, &samples, explicit, config.max_quantized_states)? {
        Classification::Labeled { control_type, map } => {
            descriptor.control_type = control_type;
            if descriptor.display.is_none() {
                descriptor.display = map.display_range().map(|(lo, hi)| Bounds::new(lo, hi));
            }
            Ok(Calibrated {
                model: ParameterModel {
                    descriptor,
                    mapping: Mapping::Labeled(map),
                },
                fallback: None,
            })
        }
        Classification::Constant(value) => {
            descriptor.control_type = ControlType::Continuous;
            let fit = FitModel {
                curve: Curve::Constant { value },
                r_squared: 0.0,
                confidence: 0.0,
            };
            Ok(continuous(descriptor, fit, None))
        }
        Classification::Continuous => {
            descriptor.control_type = ControlType::Continuous;
            match (fit_and_select(&descriptor.name, &samples, config), descriptor.display) {
                // A declared range beats a line through a handful of presets.
                (Ok(selection), Some(display)) if is_insufficient(selection.fallback.as_ref()) => {
                    Ok(declared_range(descriptor, display, selection.fallback))
                }
                (Err(err @ MappingError::InsufficientSamples { .. }), Some(display)) => {
                    Ok(declared_range(descriptor, display, Some(err)))
                }
                (Ok(selection), _) => Ok(continuous(descriptor, selection.best, selection.fallback)),
                (Err(err), _) => Err(err),
            }
        }
    }
}

/// Express every numeric sample in the descriptor's unit.
///
/// Samples in a known unit of another dimension (`ms` on a `Hz` control) are
/// dropped. Labels and unit text the rescaler does not know (`"1/4"`) pass
/// through unchanged.
fn in_unit(descriptor: &ParameterDescriptor, samples: Vec<SamplePair>) -> Vec<SamplePair> {
    let target = descriptor.unit.as_deref();
    samples
        .into_iter()
        .filter_map(|sample| {
            let SampleValue::Numeric(value) = sample.display else {
                return Some(sample);
            };
            match rescale(value, sample.unit.as_deref(), target) {
                Ok(value) => Some(SamplePair {
                    display: SampleValue::Numeric(value),
                    unit: target.map(str::to_string).or(sample.unit),
                    ..sample
                }),
                Err(err) if sample.unit.as_deref().is_some_and(is_known_unit) && target.is_some_and(is_known_unit) => {
                    warn!(parameter = %descriptor.name, error = %err, "dropping sample in an incompatible unit");
                    None
                }
                Err(_) => Some(sample),
            }
        })
        .collect()
}

fn is_insufficient(fallback: Option<&MappingError>) -> bool {
    matches!(fallback, Some(MappingError::InsufficientSamples { .. }))
}

fn declared_range(descriptor: ParameterDescriptor, display: Bounds, reason: Option<MappingError>) -> Calibrated {
    warn!(parameter = %descriptor.name, "too few samples, using declared display bounds");
    let n = descriptor.normalized;
    let fit = two_point(n.min, display.min, n.max, display.max);
    continuous(descriptor, fit, reason)
}

fn continuous(mut descriptor: ParameterDescriptor, fit: FitModel, fallback: Option<MappingError>) -> Calibrated {
    if descriptor.display.is_none() {
        descriptor.display = display_bounds(&fit.curve, descriptor.normalized);
    }
    Calibrated {
        model: ParameterModel {
            descriptor,
            mapping: Mapping::Continuous(fit),
        },
        fallback,
    }
}

/// Display range covered by `curve` over the normalized bounds.
///
/// Tabulated curves report their table range; closed forms are evaluated at the
/// bounds (monotonic, so the ends are the extremes). A closed form that
/// overflows at either bound yields `None`.
pub fn display_bounds(curve: &Curve, normalized: Bounds) -> Option<Bounds> {
    match curve {
        Curve::Piecewise(table) | Curve::PointBased(table) => {
            let (lo, hi) = table.display_range();
            Some(Bounds::new(lo, hi))
        }
        _ => {
            let (lo, _) = curve.forward(normalized.min).ok()?;
            let (hi, _) = curve.forward(normalized.max).ok()?;
            Some(Bounds::new(lo, hi))
        }
    }
}

/// Calibrate every parameter of `device` in parallel.
pub fn calibrate_device(device: &DeviceCatalog, config: &CalibrationConfig) -> DeviceCalibration {
    let descriptors = device.descriptors();
    let results: Vec<(String, Result<Calibrated, MappingError>)> = descriptors
        .par_iter()
        .map(|d| (d.name.clone(), calibrate_parameter(d, device, config)))
        .collect();

    let mut calibrated = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (name, result) in results {
        match result {
            Ok(c) => calibrated.push(c),
            Err(err) => {
                warn!(device = %device.name, parameter = %name, error = %err, "parameter skipped");
                skipped.push((name, err));
            }
        }
    }

    info!(
        device = %device.name,
        published = calibrated.len(),
        skipped = skipped.len(),
        "device calibrated"
    );

    DeviceCalibration {
        device: device.name.clone(),
        calibrated,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{forward, inverse};
    use crate::domain::FitKind;
    use crate::harvest::{Preset, PresetValue};
    use crate::models::LabelEntry;

    fn device(values: &[(&str, f64, &str)]) -> DeviceCatalog {
        DeviceCatalog {
            name: "Filter".to_string(),
            presets: values
                .iter()
                .enumerate()
                .map(|(i, (p, n, d))| Preset {
                    name: format!("Preset {i}"),
                    values: vec![PresetValue {
                        parameter: p.to_string(),
                        normalized: Some(*n),
                        display: Some(d.to_string()),
                    }],
                })
                .collect(),
            ..DeviceCatalog::default()
        }
    }

    /// One sample per step of `0..=steps` for `parameter`, displayed by `show`.
    fn sampled(parameter: &str, steps: usize, show: impl Fn(f64) -> String) -> DeviceCatalog {
        let values: Vec<(f64, String)> = (0..=steps)
            .map(|i| {
                let x = i as f64 / steps as f64;
                (x, show(x))
            })
            .collect();
        let borrowed: Vec<(&str, f64, &str)> = values.iter().map(|(n, d)| (parameter, *n, d.as_str())).collect();
        device(&borrowed)
    }

    fn fitted(c: &Calibrated) -> &FitModel {
        let Mapping::Continuous(fit) = &c.model.mapping else {
            panic!("expected a continuous mapping");
        };
        fit
    }

    #[test]
    fn continuous_parameter_gets_a_fit_unit_and_display_range() {
        let dev = sampled("Frequency", 10, |x| format!("{:.3} Hz", 20.0 * 1000.0_f64.powf(x)));

        let c = calibrate_parameter(&dev.descriptors()[0], &dev, &CalibrationConfig::default()).unwrap();
        assert_eq!(c.model.descriptor.unit.as_deref(), Some("Hz"));
        assert_eq!(fitted(&c).curve.kind(), FitKind::Exp);
        let range = c.model.descriptor.display.unwrap();
        assert!((range.min - 20.0).abs() < 0.01);
        assert!((range.max - 20_000.0).abs() < 1.0);
    }

    #[test]
    fn mixed_unit_samples_are_rescaled_before_fitting() {
        let dev = sampled("Frequency", 20, |x| {
            let hz = 20.0 * 1000.0_f64.powf(x);
            if hz < 1000.0 { format!("{hz:.1} Hz") } else { format!("{:.2} kHz", hz / 1000.0) }
        });

        let c = calibrate_parameter(&dev.descriptors()[0], &dev, &CalibrationConfig::default()).unwrap();
        assert_eq!(c.model.descriptor.unit.as_deref(), Some("Hz"));
        assert!(c.fallback.is_none());
        assert_eq!(fitted(&c).curve.kind(), FitKind::Exp);
        let range = c.model.descriptor.display.unwrap();
        assert!((range.min - 20.0).abs() < 0.5, "{range:?}");
        assert!((range.max - 20_000.0).abs() < 200.0, "{range:?}");
    }

    #[test]
    fn incompatible_units_are_dropped_but_unknown_text_is_kept() {
        let descriptor = ParameterDescriptor {
            unit: Some("Hz".to_string()),
            ..ParameterDescriptor::continuous("Frequency", 0)
        };
        let pair = |text: &str| {
            let (display, unit) = crate::harvest::parse_display(text);
            SamplePair { normalized: 0.5, display, unit }
        };
        let kept = in_unit(&descriptor, vec![pair("2 kHz"), pair("250 ms"), pair("1/4"), pair("Off")]);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].display, SampleValue::Numeric(2000.0));
        assert_eq!(kept[0].unit.as_deref(), Some("Hz"));
        assert_eq!(kept[1].unit.as_deref(), Some("/4"));
    }

    #[test]
    fn calibrated_log_model_converts_at_the_bottom_of_the_range() {
        // A decay time with a log law, stored as 100 ms at the very bottom.
        let dev = sampled("Decay", 20, |x| {
            if x == 0.0 { "100.0 ms".to_string() } else { format!("{:.1} ms", 500.0 + 100.0 * x.ln()) }
        });
        let c = calibrate_parameter(&dev.descriptors()[0], &dev, &CalibrationConfig::default()).unwrap();
        assert_eq!(fitted(&c).curve.kind(), FitKind::Log);
        let range = c.model.descriptor.display.expect("display range at both bounds");

        let bottom = forward(&c.model, 0.0).unwrap();
        assert_eq!(bottom.normalized, 0.0);
        assert!((bottom.display.as_number().unwrap() - range.min).abs() < 1e-9);

        let below = inverse(&c.model, &SampleValue::Numeric(-1e4)).unwrap();
        assert!(below.normalized < 1e-3);
        assert!(below.clamped);
        let above = inverse(&c.model, &SampleValue::Numeric(1e6)).unwrap();
        assert_eq!(above.normalized, 1.0);
        assert!(above.clamped);
    }

    #[test]
    fn declared_range_beats_a_short_harvest() {
        let mut dev = device(&[
            ("Gain", 0.4, "-7.2 dB"),
            ("Gain", 0.5, "0.0 dB"),
            ("Gain", 0.6, "7.2 dB"),
            ("Gain", 0.7, "14.4 dB"),
        ]);
        dev.parameters = vec![ParameterDescriptor {
            display: Some(Bounds::new(-36.0, 36.0)),
            ..ParameterDescriptor::continuous("Gain", 0)
        }];
        let c = calibrate_parameter(&dev.descriptors()[0], &dev, &CalibrationConfig::default()).unwrap();
        assert_eq!(fitted(&c).curve, Curve::Linear { a: -36.0, b: 72.0 });
        assert!(matches!(c.fallback, Some(MappingError::InsufficientSamples { found: 4, .. })));
    }

    #[test]
    fn binary_parameter_gets_a_label_map() {
        let dev = device(&[("Freeze", 0.0, "Off"), ("Freeze", 1.0, "On"), ("Freeze", 0.0, "Off")]);
        let c = calibrate_parameter(&dev.descriptors()[0], &dev, &CalibrationConfig::default()).unwrap();
        assert_eq!(c.model.descriptor.control_type, ControlType::Binary);
        assert!(matches!(c.model.mapping, Mapping::Labeled(_)));
    }

    #[test]
    fn missing_samples_use_declared_display_bounds() {
        let mut dev = device(&[]);
        dev.parameters = vec![ParameterDescriptor {
            display: Some(Bounds::new(-36.0, 36.0)),
            ..ParameterDescriptor::continuous("Gain", 0)
        }];
        let c = calibrate_parameter(&dev.descriptors()[0], &dev, &CalibrationConfig::default()).unwrap();
        assert_eq!(fitted(&c).curve, Curve::Linear { a: -36.0, b: 72.0 });
        assert!(matches!(c.fallback, Some(MappingError::InsufficientSamples { .. })));
    }

    #[test]
    fn device_calibration_keeps_index_order_and_reports_skips() {
        let mut dev = device(&[("Mode", 0.0, "Sine"), ("Mode", 0.5, "Saw")]);
        dev.parameters = vec![
            ParameterDescriptor::continuous("Ghost", 1),
            ParameterDescriptor::continuous("Mode", 0),
        ];
        dev.label_maps.insert(
            "Mode".to_string(),
            vec![LabelEntry::new(0.0, "Sine", None), LabelEntry::new(0.5, "Saw", None)],
        );

        let result = calibrate_device(&dev, &CalibrationConfig::default());
        assert_eq!(result.calibrated.len(), 1);
        assert_eq!(result.calibrated[0].model.name(), "Mode");
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].0, "Ghost");
    }
}
