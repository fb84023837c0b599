//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the offline calibration run
//! - published inside an immutable registry snapshot
//! - consumed read-only by the converter on the request path

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{LabelMap, PiecewiseCurve};

/// Minimum number of harvested samples before regression is attempted.
pub const DEFAULT_MIN_SAMPLES: usize = 6;

/// R² floor a candidate family must clear to be published.
pub const DEFAULT_R2_THRESHOLD: f64 = 0.85;

/// Numeric parameters with at most this many distinct display values are
/// treated as quantized.
pub const DEFAULT_MAX_QUANTIZED_STATES: usize = 3;

/// Smallest normalized value accepted by log-domain families.
pub const DEFAULT_LOG_EPSILON: f64 = 1e-6;

/// How a parameter is controlled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlType {
    Continuous,
    Quantized,
    Binary,
}

impl ControlType {
    pub fn is_labeled(self) -> bool {
        matches!(self, ControlType::Quantized | ControlType::Binary)
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl Bounds {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Clamp `value` into the interval and report whether it moved.
    pub fn clamp(&self, value: f64) -> (f64, bool) {
        let clamped = value.clamp(self.min, self.max);
        (clamped, clamped != value)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Static description of one adjustable device parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub index: usize,
    pub control_type: ControlType,
    #[serde(default)]
    pub normalized: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Bounds>,
}

impl ParameterDescriptor {
    pub fn continuous(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            control_type: ControlType::Continuous,
            normalized: Bounds::default(),
            unit: None,
            display: None,
        }
    }
}

/// A display value as harvested from a preset: either numeric or a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Numeric(f64),
    Label(String),
}

impl SampleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SampleValue::Numeric(v) => Some(*v),
            SampleValue::Label(_) => None,
        }
    }

    /// Key used to count distinct display values.
    pub fn key(&self) -> String {
        match self {
            SampleValue::Numeric(v) => format!("#{v}"),
            SampleValue::Label(s) => s.clone(),
        }
    }
}

/// One `(normalized, display)` observation taken from a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePair {
    pub normalized: f64,
    pub display: SampleValue,
    /// Unit text that followed the number in the preset's display string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Fit family tag as persisted in registry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    Linear,
    Log,
    Exp,
    Power,
    Constant,
    Piecewise,
    PointBased,
}

impl FitKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FitKind::Linear => "linear",
            FitKind::Log => "log",
            FitKind::Exp => "exp",
            FitKind::Power => "power",
            FitKind::Constant => "constant",
            FitKind::Piecewise => "piecewise",
            FitKind::PointBased => "point_based",
        }
    }
}

/// Closed-form families the fit selector regresses.
///
/// Each is linear in `(a, b)` after transforming one or both axes:
///
/// | family | model              | regressed form        |
/// |--------|--------------------|-----------------------|
/// | linear | `y = a + b x`      | `y ~ 1, x`            |
/// | log    | `y = a + b ln x`   | `y ~ 1, ln x`         |
/// | exp    | `y = e^(a + b x)`  | `ln y ~ 1, x`         |
/// | power  | `y = e^a x^b`      | `ln y ~ 1, ln x`      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Linear,
    Log,
    Exp,
    Power,
}

impl Family {
    /// Candidate order; earlier families win R² ties.
    pub const ALL: [Family; 4] = [Family::Linear, Family::Log, Family::Exp, Family::Power];

    pub fn kind(self) -> FitKind {
        match self {
            Family::Linear => FitKind::Linear,
            Family::Log => FitKind::Log,
            Family::Exp => FitKind::Exp,
            Family::Power => FitKind::Power,
        }
    }

    pub fn display_name(self) -> &'static str {
        self.kind().display_name()
    }

    /// Whether the regression works on `ln x`.
    pub fn log_x(self) -> bool {
        matches!(self, Family::Log | Family::Power)
    }

    /// Whether the regression works on `ln y`.
    pub fn log_y(self) -> bool {
        matches!(self, Family::Exp | Family::Power)
    }
}

/// A normalized → display transfer function.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Linear { a: f64, b: f64 },
    Log { a: f64, b: f64 },
    Exp { a: f64, b: f64 },
    Power { a: f64, b: f64 },
    Constant { value: f64 },
    Piecewise(PiecewiseCurve),
    PointBased(PiecewiseCurve),
}

impl Curve {
    pub fn from_family(family: Family, a: f64, b: f64) -> Self {
        match family {
            Family::Linear => Curve::Linear { a, b },
            Family::Log => Curve::Log { a, b },
            Family::Exp => Curve::Exp { a, b },
            Family::Power => Curve::Power { a, b },
        }
    }

    pub fn kind(&self) -> FitKind {
        match self {
            Curve::Linear { .. } => FitKind::Linear,
            Curve::Log { .. } => FitKind::Log,
            Curve::Exp { .. } => FitKind::Exp,
            Curve::Power { .. } => FitKind::Power,
            Curve::Constant { .. } => FitKind::Constant,
            Curve::Piecewise(_) => FitKind::Piecewise,
            Curve::PointBased(_) => FitKind::PointBased,
        }
    }

    /// Closed-form coefficients in persisted order (empty for tabulated curves).
    pub fn coeffs(&self) -> Vec<f64> {
        match self {
            Curve::Linear { a, b } | Curve::Log { a, b } | Curve::Exp { a, b } | Curve::Power { a, b } => {
                vec![*a, *b]
            }
            Curve::Constant { value } => vec![*value],
            Curve::Piecewise(_) | Curve::PointBased(_) => Vec::new(),
        }
    }
}

/// A published continuous mapping: curve plus its quality scores.
#[derive(Debug, Clone, PartialEq)]
pub struct FitModel {
    pub curve: Curve,
    pub r_squared: f64,
    /// `clamp((R² - threshold) / (1 - threshold), 0, 1)`.
    pub confidence: f64,
}

/// How a parameter's values map between spaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapping {
    Continuous(FitModel),
    Labeled(LabelMap),
}

/// One registry entry: a descriptor and its calibrated mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterModel {
    pub descriptor: ParameterDescriptor,
    pub mapping: Mapping,
}

impl ParameterModel {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn confidence(&self) -> f64 {
        match &self.mapping {
            Mapping::Continuous(fit) => fit.confidence,
            Mapping::Labeled(_) => 1.0,
        }
    }
}

/// A display value produced by the converter.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Number(f64),
    Label { text: String, value: Option<f64> },
}

impl DisplayValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DisplayValue::Number(v) => Some(*v),
            DisplayValue::Label { value, .. } => *value,
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(v) => write!(f, "{}", format_number(*v)),
            DisplayValue::Label { text, .. } => write!(f, "{text}"),
        }
    }
}

/// Render a number with at most three decimals and at least one.
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let mut s = format!("{value:.3}");
    while s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    if s == "-0.0" { "0.0".to_string() } else { s }
}

/// Tuning knobs for an offline calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub min_samples: usize,
    pub r2_threshold: f64,
    pub max_quantized_states: usize,
    /// Publish a tabulated curve instead of the two-point fallback when the
    /// observed samples are strictly monotonic.
    pub allow_point_based: bool,
    pub log_epsilon: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_SAMPLES,
            r2_threshold: DEFAULT_R2_THRESHOLD,
            max_quantized_states: DEFAULT_MAX_QUANTIZED_STATES,
            allow_point_based: false,
            log_epsilon: DEFAULT_LOG_EPSILON,
        }
    }
}
