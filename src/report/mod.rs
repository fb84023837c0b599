//! Reporting utilities: per-parameter summary rows and terminal formatting.

pub mod format;

pub use format::*;

use crate::domain::{Mapping, ParameterModel};

/// One line of a calibration summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub parameter: String,
    /// Fit family, or the control type for labeled parameters.
    pub kind: String,
    pub r_squared: Option<f64>,
    pub confidence: f64,
    pub display_min: Option<f64>,
    pub display_max: Option<f64>,
    pub unit: Option<String>,
}

impl From<&ParameterModel> for SummaryRow {
    fn from(model: &ParameterModel) -> Self {
        let d = &model.descriptor;
        let (kind, r_squared) = match &model.mapping {
            Mapping::Continuous(fit) => (fit.curve.kind().display_name().to_string(), Some(fit.r_squared)),
            Mapping::Labeled(map) => (format!("{:?} ({} labels)", d.control_type, map.len()).to_lowercase(), None),
        };
        Self {
            parameter: d.name.clone(),
            kind,
            r_squared,
            confidence: model.confidence(),
            display_min: d.display.map(|b| b.min),
            display_max: d.display.map(|b| b.max),
            unit: d.unit.clone(),
        }
    }
}

/// Summary rows for a list of models, in their given order.
pub fn summary_rows<'a>(models: impl IntoIterator<Item = &'a ParameterModel>) -> Vec<SummaryRow> {
    models.into_iter().map(SummaryRow::from).collect()
}
