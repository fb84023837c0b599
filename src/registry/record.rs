//! Persisted registry shapes.
//!
//! Per device, an ordered parameter list. A continuous record carries
//! `{name, index, control_type, unit, min_display, max_display, fit, confidence}`;
//! a quantized/binary record carries `{control_type, labels, label_map}` where
//! `label_map` is keyed by the normalized value rendered as a string. Mixer
//! channels are stored as `{name, fit: {type: "piecewise", points: [{db, normalized}]}}`.
//!
//! Conversion into runtime types re-validates every invariant, so a hand-edited
//! file cannot smuggle an unsorted table or a duplicate label into a snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Bounds, ControlType, Curve, FitKind, FitModel, Mapping, ParameterDescriptor, ParameterModel};
use crate::error::MappingError;
use crate::harvest::first_number;
use crate::mixer::{ChannelKind, ChannelTable};
use crate::models::{Breakpoint, LabelEntry, LabelMap, PiecewiseCurve};
use crate::registry::snapshot::{DeviceModels, RegistrySnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryFile {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub devices: Vec<DeviceRecord>,
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub parameters: Vec<ParameterRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    pub index: usize,
    pub control_type: ControlType,
    #[serde(default)]
    pub normalized: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_display: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_display: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_map: Option<BTreeMap<String, String>>,
    /// Numeric display per label key. When absent, the number is read from the label text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_values: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    #[serde(rename = "type")]
    pub kind: FitKind,
    #[serde(default)]
    pub coeffs: Vec<f64>,
    pub r_squared: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Breakpoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub name: ChannelKind,
    pub fit: ChannelFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFit {
    #[serde(rename = "type")]
    pub kind: FitKind,
    pub points: Vec<DbPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbPoint {
    pub db: f64,
    pub normalized: f64,
}

fn invalid(msg: impl Into<String>) -> MappingError {
    MappingError::InvalidModel(msg.into())
}

// ---- fits ----

impl From<&FitModel> for FitRecord {
    fn from(fit: &FitModel) -> Self {
        let points = match &fit.curve {
            Curve::Piecewise(table) | Curve::PointBased(table) => Some(table.breakpoints().collect()),
            _ => None,
        };
        Self {
            kind: fit.curve.kind(),
            coeffs: fit.curve.coeffs(),
            r_squared: fit.r_squared,
            points,
        }
    }
}

impl FitRecord {
    fn into_model(self, confidence: f64) -> Result<FitModel, MappingError> {
        if self.coeffs.iter().any(|c| !c.is_finite()) {
            return Err(invalid(format!("{} fit has non-finite coefficients", self.kind.display_name())));
        }
        let pair = |coeffs: &[f64]| match *coeffs {
            [a, b] => Ok((a, b)),
            _ => Err(invalid(format!(
                "{} fit needs 2 coefficients, found {}",
                self.kind.display_name(),
                coeffs.len()
            ))),
        };
        let table = |points: Option<Vec<Breakpoint>>| {
            points
                .ok_or_else(|| invalid(format!("{} fit has no points", self.kind.display_name())))
                .and_then(PiecewiseCurve::new)
        };

        let curve = match self.kind {
            FitKind::Linear => pair(self.coeffs.as_slice()).map(|(a, b)| Curve::Linear { a, b })?,
            FitKind::Log => pair(self.coeffs.as_slice()).map(|(a, b)| Curve::Log { a, b })?,
            FitKind::Exp => pair(self.coeffs.as_slice()).map(|(a, b)| Curve::Exp { a, b })?,
            FitKind::Power => pair(self.coeffs.as_slice()).map(|(a, b)| Curve::Power { a, b })?,
            FitKind::Constant => match self.coeffs.as_slice() {
                [value] => Curve::Constant { value: *value },
                other => return Err(invalid(format!("constant fit needs 1 coefficient, found {}", other.len()))),
            },
            FitKind::Piecewise => Curve::Piecewise(table(self.points.clone())?),
            FitKind::PointBased => Curve::PointBased(table(self.points.clone())?),
        };

        Ok(FitModel {
            curve,
            r_squared: self.r_squared,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

// ---- parameters ----

impl From<&ParameterModel> for ParameterRecord {
    fn from(model: &ParameterModel) -> Self {
        let d = &model.descriptor;
        let mut record = ParameterRecord {
            name: d.name.clone(),
            index: d.index,
            control_type: d.control_type,
            normalized: d.normalized,
            unit: d.unit.clone(),
            min_display: d.display.map(|b| b.min),
            max_display: d.display.map(|b| b.max),
            fit: None,
            confidence: None,
            labels: None,
            label_map: None,
            label_values: None,
        };

        match &model.mapping {
            Mapping::Continuous(fit) => {
                record.fit = Some(FitRecord::from(fit));
                record.confidence = Some(fit.confidence);
            }
            Mapping::Labeled(map) => {
                record.labels = Some(map.entries().iter().map(|e| e.label.clone()).collect());
                record.label_map = Some(
                    map.entries()
                        .iter()
                        .map(|e| (e.normalized.to_string(), e.label.clone()))
                        .collect(),
                );
                let values: BTreeMap<String, f64> = map
                    .entries()
                    .iter()
                    .filter_map(|e| e.display_num.map(|v| (e.normalized.to_string(), v)))
                    .collect();
                record.label_values = (!values.is_empty()).then_some(values);
            }
        }
        record
    }
}

impl TryFrom<ParameterRecord> for ParameterModel {
    type Error = MappingError;

    fn try_from(record: ParameterRecord) -> Result<Self, Self::Error> {
        let display = match (record.min_display, record.max_display) {
            (Some(lo), Some(hi)) => Some(Bounds::new(lo, hi)),
            _ => None,
        };
        let descriptor = ParameterDescriptor {
            name: record.name.clone(),
            index: record.index,
            control_type: record.control_type,
            normalized: Bounds::new(record.normalized.min, record.normalized.max),
            unit: record.unit,
            display,
        };

        let mapping = if record.control_type.is_labeled() {
            let label_map = record
                .label_map
                .ok_or_else(|| invalid(format!("'{}' is {:?} but has no label_map", record.name, record.control_type)))?;
            let values = record.label_values.unwrap_or_default();
            let entries = label_map
                .into_iter()
                .map(|(key, label)| {
                    let normalized: f64 = key
                        .trim()
                        .parse()
                        .map_err(|_| invalid(format!("label key '{key}' is not a number")))?;
                    let display_num = values.get(&key).copied().or_else(|| first_number(&label));
                    Ok(LabelEntry::new(normalized, label, display_num))
                })
                .collect::<Result<Vec<_>, MappingError>>()?;
            Mapping::Labeled(LabelMap::new(entries)?)
        } else {
            let fit = record
                .fit
                .ok_or_else(|| invalid(format!("'{}' is continuous but has no fit", record.name)))?;
            Mapping::Continuous(fit.into_model(record.confidence.unwrap_or(0.0))?)
        };

        Ok(ParameterModel { descriptor, mapping })
    }
}

// ---- channels ----

impl From<&ChannelTable> for ChannelRecord {
    fn from(table: &ChannelTable) -> Self {
        Self {
            name: table.kind(),
            fit: ChannelFit {
                kind: FitKind::Piecewise,
                points: table
                    .curve()
                    .breakpoints()
                    .map(|p| DbPoint {
                        db: p.display,
                        normalized: p.normalized,
                    })
                    .collect(),
            },
        }
    }
}

impl TryFrom<ChannelRecord> for ChannelTable {
    type Error = MappingError;

    fn try_from(record: ChannelRecord) -> Result<Self, Self::Error> {
        if record.fit.kind != FitKind::Piecewise {
            return Err(invalid(format!(
                "channel '{}' must be piecewise, found {}",
                record.name,
                record.fit.kind.display_name()
            )));
        }
        let points = record
            .fit
            .points
            .into_iter()
            .map(|p| Breakpoint::new(p.normalized, p.db))
            .collect();
        Ok(ChannelTable::new(record.name, PiecewiseCurve::new(points)?))
    }
}

// ---- snapshot ----

impl From<&RegistrySnapshot> for RegistryFile {
    fn from(snapshot: &RegistrySnapshot) -> Self {
        Self {
            version: snapshot.version,
            created_at: snapshot.created_at,
            devices: snapshot
                .devices
                .iter()
                .map(|d| DeviceRecord {
                    name: d.name.clone(),
                    parameters: d.parameters.iter().map(ParameterRecord::from).collect(),
                })
                .collect(),
            channels: snapshot.channels.iter().map(ChannelRecord::from).collect(),
        }
    }
}

impl TryFrom<RegistryFile> for RegistrySnapshot {
    type Error = MappingError;

    fn try_from(file: RegistryFile) -> Result<Self, Self::Error> {
        let devices = file
            .devices
            .into_iter()
            .map(|d| {
                let mut parameters = d
                    .parameters
                    .into_iter()
                    .map(ParameterModel::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                parameters.sort_by_key(|p| p.descriptor.index);
                Ok(DeviceModels {
                    name: d.name,
                    parameters,
                })
            })
            .collect::<Result<Vec<_>, MappingError>>()?;
        let channels = file
            .channels
            .into_iter()
            .map(ChannelTable::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RegistrySnapshot {
            version: file.version,
            created_at: file.created_at,
            devices,
            channels,
        })
    }
}
