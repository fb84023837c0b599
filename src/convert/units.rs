//! Unit rescaling for upstream requests and harvested samples.
//!
//! A request or a preset may state its value in a different but compatible
//! unit from the parameter (`2 kHz` against a `Hz` parameter). Only
//! same-dimension pairs are rescaled; anything else is a `UnitMismatch`.

use crate::error::MappingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Frequency,
    Time,
    Gain,
    Percent,
}

/// Dimension and scale to that dimension's base unit.
fn lookup(unit: &str) -> Option<(Dimension, f64)> {
    let unit = unit.trim().to_ascii_lowercase();
    let entry = match unit.as_str() {
        "hz" => (Dimension::Frequency, 1.0),
        "khz" => (Dimension::Frequency, 1000.0),
        "ms" => (Dimension::Time, 1.0),
        "s" | "sec" => (Dimension::Time, 1000.0),
        "db" => (Dimension::Gain, 1.0),
        "%" | "pct" | "percent" => (Dimension::Percent, 1.0),
        _ => return None,
    };
    Some(entry)
}

/// Whether `unit` belongs to a dimension `rescale` understands.
pub fn is_known_unit(unit: &str) -> bool {
    lookup(unit).is_some()
}

/// Express `value`, given in `from`, in the parameter's unit `to`.
///
/// A missing unit on either side passes the value through unchanged.
pub fn rescale(value: f64, from: Option<&str>, to: Option<&str>) -> Result<f64, MappingError> {
    let (Some(from), Some(to)) = (from, to) else {
        return Ok(value);
    };
    if from.trim().eq_ignore_ascii_case(to.trim()) {
        return Ok(value);
    }
    match (lookup(from), lookup(to)) {
        (Some((df, sf)), Some((dt, st))) if df == dt => Ok(value * sf / st),
        _ => Err(MappingError::UnitMismatch {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}
