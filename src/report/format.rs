//! Formatted terminal output.
//!
//! Formatting lives here so the fitting and conversion code stays free of
//! presentation concerns.

use crate::convert::Resolved;
use crate::domain::{DisplayValue, format_number};
use crate::fit::DeviceCalibration;
use crate::mixer::ChannelTable;
use crate::registry::RegistrySnapshot;
use crate::report::{SummaryRow, summary_rows};

/// Summary of one calibration run, as printed by `pcal calibrate`.
pub fn format_calibration_summary(results: &[DeviceCalibration], version: u64) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== pcal - calibration (registry version {version}) ===\n"));

    for device in results {
        out.push_str(&format!("\nDevice: {}\n", device.device));
        let rows = summary_rows(device.calibrated.iter().map(|c| &c.model));
        out.push_str(&format_table(&rows));

        for c in &device.calibrated {
            if let Some(reason) = &c.fallback {
                out.push_str(&format!("  (degraded {}) {reason}\n", c.model.name()));
            }
        }
        for (name, err) in &device.skipped {
            out.push_str(&format!("  (skipped {name}) {err}\n"));
        }
    }

    out
}

/// Contents of a published snapshot, as printed by `pcal show`.
pub fn format_snapshot(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== pcal - registry version {} ({}) ===\n",
        snapshot.version,
        snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for device in &snapshot.devices {
        out.push_str(&format!("\nDevice: {}\n", device.name));
        out.push_str(&format_table(&summary_rows(&device.parameters)));
    }

    if !snapshot.channels.is_empty() {
        out.push_str("\nMixer channels:\n");
        for table in &snapshot.channels {
            out.push_str(&format_channel(table));
        }
    }

    out
}

/// One conversion result, e.g. `normalized=0.850000 display=0.0 dB`.
pub fn format_resolved(resolved: &Resolved, unit: Option<&str>) -> String {
    let display = match (&resolved.display, unit) {
        (DisplayValue::Number(_), Some(unit)) => format!("{} {unit}", resolved.display),
        _ => resolved.display.to_string(),
    };
    let mut out = format!("normalized={:.6} display={display}", resolved.normalized);
    if resolved.clamped {
        out.push_str(" (clamped)");
    }
    out
}

fn format_channel(table: &ChannelTable) -> String {
    format!(
        "  {:<8} {} points, {} .. {} dB\n",
        table.kind().name(),
        table.len(),
        format_number(table.min_db()),
        format_number(table.max_db())
    )
}

fn format_table(rows: &[SummaryRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:<18} {:>8} {:>6} {:<24}",
            "parameter", "kind", "r2", "conf", "range"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<18} {:-<8} {:-<6} {:-<24}", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        let r2 = r.r_squared.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{:<24} {:<18} {:>8} {:>6.2} {:<24}",
                truncate(&r.parameter, 24),
                truncate(&r.kind, 18),
                r2,
                r.confidence,
                fmt_range(r)
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_range(r: &SummaryRow) -> String {
    let (Some(lo), Some(hi)) = (r.display_min, r.display_max) else {
        return "-".to_string();
    };
    match &r.unit {
        Some(unit) => format!("{} .. {} {unit}", format_number(lo), format_number(hi)),
        None => format!("{} .. {}", format_number(lo), format_number(hi)),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bounds, ControlType, Curve, FitModel, Mapping, ParameterDescriptor, ParameterModel};
    use crate::models::{LabelEntry, LabelMap};

    fn models() -> Vec<ParameterModel> {
        vec![
            ParameterModel {
                descriptor: ParameterDescriptor {
                    unit: Some("Hz".to_string()),
                    display: Some(Bounds::new(20.0, 20_000.0)),
                    ..ParameterDescriptor::continuous("Frequency", 0)
                },
                mapping: Mapping::Continuous(FitModel {
                    curve: Curve::Exp { a: 3.0, b: 6.9 },
                    r_squared: 0.9931,
                    confidence: 0.954,
                }),
            },
            ParameterModel {
                descriptor: ParameterDescriptor {
                    control_type: ControlType::Binary,
                    ..ParameterDescriptor::continuous("Freeze", 1)
                },
                mapping: Mapping::Labeled(
                    LabelMap::new(vec![LabelEntry::new(0.0, "Off", None), LabelEntry::new(1.0, "On", None)]).unwrap(),
                ),
            },
        ]
    }

    #[test]
    fn summary_table_lists_fit_kind_and_range() {
        let table = format_table(&summary_rows(&models()));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Frequency"));
        assert!(lines[2].contains("exp"));
        assert!(lines[2].contains("0.9931"));
        assert!(lines[2].contains("20.0 .. 20000.0 Hz"));
        assert!(lines[3].contains("binary (2 labels)"));
    }

    #[test]
    fn resolved_values_mention_clamping() {
        let r = Resolved {
            normalized: 1.0,
            display: DisplayValue::Number(6.0),
            clamped: true,
        };
        assert_eq!(format_resolved(&r, Some("dB")), "normalized=1.000000 display=6.0 dB (clamped)");

        let label = Resolved {
            normalized: 0.0,
            display: DisplayValue::Label {
                text: "12.0 dB".to_string(),
                value: Some(12.0),
            },
            clamped: false,
        };
        assert_eq!(format_resolved(&label, Some("dB")), "normalized=0.000000 display=12.0 dB");
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("Filter Envelope Amount", 10), "Filter En.");
        assert_eq!(truncate("Gain", 10), "Gain");
    }
}
