//! Sample harvesting from a device's preset library.
//!
//! For one parameter, every preset that stores both a normalized value and a
//! display string yields one `SamplePair`. Duplicates are kept; they weight
//! the regression toward commonly used settings.

pub mod parse;
pub mod preset;

use tracing::debug;

use crate::domain::SamplePair;
use crate::error::MappingError;

pub use parse::*;
pub use preset::*;

/// Collect every valid `(normalized, display)` pair for `parameter`.
///
/// Pairs with a missing side or a normalized value outside `[0, 1]` are skipped.
pub fn collect_pairs(parameter: &str, presets: &[Preset]) -> Vec<SamplePair> {
    let mut out = Vec::new();
    for preset in presets {
        for value in preset.values.iter().filter(|v| v.parameter == parameter) {
            let (Some(normalized), Some(display)) = (value.normalized, value.display.as_deref()) else {
                continue;
            };
            if !(normalized.is_finite() && (0.0..=1.0).contains(&normalized)) {
                debug!(parameter, preset = %preset.name, normalized, "dropping out-of-range sample");
                continue;
            }
            let (display, unit) = parse_display(display);
            out.push(SamplePair {
                normalized,
                display,
                unit,
            });
        }
    }
    out
}

/// Harvest samples for `parameter`, requiring at least `min_samples`.
///
/// `InsufficientSamples` is not fatal: callers use `collect_pairs` to build a
/// lower-quality fallback from whatever exists.
pub fn harvest(parameter: &str, presets: &[Preset], min_samples: usize) -> Result<Vec<SamplePair>, MappingError> {
    let samples = collect_pairs(parameter, presets);
    debug!(parameter, found = samples.len(), "harvested samples");
    if samples.len() < min_samples {
        return Err(MappingError::InsufficientSamples {
            parameter: parameter.to_string(),
            found: samples.len(),
            required: min_samples,
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleValue;

    fn preset(name: &str, values: &[(&str, Option<f64>, Option<&str>)]) -> Preset {
        Preset {
            name: name.to_string(),
            values: values
                .iter()
                .map(|(p, n, d)| PresetValue {
                    parameter: p.to_string(),
                    normalized: *n,
                    display: d.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn pairs_need_both_sides_and_a_valid_normalized_value() {
        let presets = vec![
            preset("a", &[("Gain", Some(0.5), Some("-6.0 dB")), ("Mode", Some(0.0), Some("Off"))]),
            preset("b", &[("Gain", None, Some("0.0 dB"))]),
            preset("c", &[("Gain", Some(1.4), Some("12.0 dB"))]),
            preset("d", &[("Gain", Some(0.5), Some("-6.0 dB"))]),
        ];
        let pairs = collect_pairs("Gain", &presets);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].display, SampleValue::Numeric(-6.0));
        assert_eq!(pairs[0].unit.as_deref(), Some("dB"));
    }

    #[test]
    fn harvest_reports_insufficient_samples() {
        let presets: Vec<Preset> = (0..4)
            .map(|i| preset("p", &[("Gain", Some(i as f64 / 4.0), Some("1 dB"))]))
            .collect();
        let err = harvest("Gain", &presets, 6).unwrap_err();
        assert_eq!(
            err,
            MappingError::InsufficientSamples {
                parameter: "Gain".to_string(),
                found: 4,
                required: 6
            }
        );
        assert_eq!(harvest("Gain", &presets, 4).unwrap().len(), 4);
    }
}
