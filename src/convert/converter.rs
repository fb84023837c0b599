//! Forward and inverse conversion over one registry entry.
//!
//! Every function here is pure: no I/O, no shared state. The same
//! `ParameterModel` is read concurrently by any number of callers.
//!
//! Range violations clamp and set `Resolved::clamped`; the reported values are
//! always the ones actually applied. Domain violations (`OutOfDomain`) and
//! unmatched labels (`LabelNotFound`) are errors.

use crate::convert::units::rescale;
use crate::domain::{Curve, DisplayValue, FitModel, Mapping, ParameterModel, SampleValue, format_number};
use crate::error::MappingError;
use crate::models::{LabelEntry, LabelMap};

/// The outcome of a conversion: what the host receives and what it means.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub normalized: f64,
    pub display: DisplayValue,
    /// The request fell outside the known range and was moved to its edge.
    pub clamped: bool,
}

/// What the caller wants to set.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Normalized(f64),
    Display(SampleValue),
}

/// An upstream request for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRequest {
    pub target: Target,
    /// Unit the display value is expressed in, if the caller stated one.
    pub unit: Option<String>,
}

impl ParameterRequest {
    pub fn normalized(value: f64) -> Self {
        Self {
            target: Target::Normalized(value),
            unit: None,
        }
    }

    pub fn display(value: SampleValue, unit: Option<String>) -> Self {
        Self {
            target: Target::Display(value),
            unit,
        }
    }
}

/// Resolve a request against `model`.
pub fn apply(model: &ParameterModel, request: &ParameterRequest) -> Result<Resolved, MappingError> {
    match &request.target {
        Target::Normalized(x) => forward(model, *x),
        Target::Display(SampleValue::Numeric(v)) => {
            let v = rescale(*v, request.unit.as_deref(), model.descriptor.unit.as_deref())?;
            inverse(model, &SampleValue::Numeric(v))
        }
        Target::Display(label) => inverse(model, label),
    }
}

/// Normalized → display.
pub fn forward(model: &ParameterModel, normalized: f64) -> Result<Resolved, MappingError> {
    if normalized.is_nan() {
        return Err(MappingError::OutOfDomain {
            family: mapping_name(&model.mapping),
            value: normalized,
        });
    }
    let (x, clamped) = model.descriptor.normalized.clamp(normalized);

    match &model.mapping {
        Mapping::Labeled(map) => {
            let entry = map.nearest(x);
            Ok(Resolved {
                normalized: x,
                display: label_value(entry),
                clamped,
            })
        }
        Mapping::Continuous(fit) => {
            let (y, curve_clamped) = fit.curve.forward(x)?;
            Ok(Resolved {
                normalized: x,
                display: DisplayValue::Number(y),
                clamped: clamped || curve_clamped,
            })
        }
    }
}

/// Display → normalized.
pub fn inverse(model: &ParameterModel, display: &SampleValue) -> Result<Resolved, MappingError> {
    match (&model.mapping, display) {
        (Mapping::Labeled(map), value) => inverse_label(map, value),
        (Mapping::Continuous(_), SampleValue::Label(text)) => Err(MappingError::LabelNotFound(text.clone())),
        (Mapping::Continuous(fit), SampleValue::Numeric(y)) => inverse_continuous(model, fit, *y),
    }
}

fn inverse_label(map: &LabelMap, value: &SampleValue) -> Result<Resolved, MappingError> {
    let (entry, exact) = match value {
        SampleValue::Label(text) => {
            let entry = map
                .find_label(text)
                .ok_or_else(|| MappingError::LabelNotFound(text.clone()))?;
            (entry, true)
        }
        SampleValue::Numeric(v) => {
            let entry = map
                .nearest_display(*v)
                .ok_or_else(|| MappingError::LabelNotFound(format_number(*v)))?;
            (entry, entry.display_num == Some(*v))
        }
    };
    Ok(Resolved {
        normalized: entry.normalized,
        display: label_value(entry),
        clamped: !exact,
    })
}

fn inverse_continuous(model: &ParameterModel, fit: &FitModel, y: f64) -> Result<Resolved, MappingError> {
    let bounds = model.descriptor.normalized;

    // A constant mapping shows the same value everywhere; any normalized value
    // realises it, so use the lower bound.
    if let Curve::Constant { value } = fit.curve {
        if y.is_nan() {
            return Err(MappingError::OutOfDomain { family: "constant", value: y });
        }
        return Ok(Resolved {
            normalized: bounds.min,
            display: DisplayValue::Number(value),
            clamped: y != value,
        });
    }

    let (x, curve_clamped) = fit.curve.inverse(y)?;
    let (x, bounds_clamped) = bounds.clamp(x);
    let (applied, _) = fit.curve.forward(x)?;
    Ok(Resolved {
        normalized: x,
        display: DisplayValue::Number(applied),
        clamped: curve_clamped || bounds_clamped,
    })
}

fn label_value(entry: &LabelEntry) -> DisplayValue {
    DisplayValue::Label {
        text: entry.label.clone(),
        value: entry.display_num,
    }
}

fn mapping_name(mapping: &Mapping) -> &'static str {
    match mapping {
        Mapping::Continuous(fit) => fit.curve.kind().display_name(),
        Mapping::Labeled(_) => "label",
    }
}
