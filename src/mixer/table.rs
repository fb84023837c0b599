//! Dense dB tables for standard mixer channels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convert::Resolved;
use crate::domain::DisplayValue;
use crate::error::MappingError;
use crate::models::PiecewiseCurve;

/// Standard mixer controls with a measured gain law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Track, return and master volume.
    Volume,
    Sends,
    Cue,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Volume, ChannelKind::Sends, ChannelKind::Cue];

    pub fn name(self) -> &'static str {
        match self {
            ChannelKind::Volume => "volume",
            ChannelKind::Sends => "sends",
            ChannelKind::Cue => "cue",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A channel's normalized ↔ dB table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTable {
    kind: ChannelKind,
    curve: PiecewiseCurve,
}

impl ChannelTable {
    pub fn new(kind: ChannelKind, curve: PiecewiseCurve) -> Self {
        Self { kind, curve }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn curve(&self) -> &PiecewiseCurve {
        &self.curve
    }

    pub fn len(&self) -> usize {
        self.curve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curve.is_empty()
    }

    pub fn min_db(&self) -> f64 {
        self.curve.display_range().0
    }

    pub fn max_db(&self) -> f64 {
        self.curve.display_range().1
    }

    /// Derive a table for `kind` by shifting every point by `offset_db`.
    ///
    /// All points are kept, so the derived range is exactly the source range
    /// shifted by the offset.
    pub fn offset_by(&self, kind: ChannelKind, offset_db: f64) -> Result<Self, MappingError> {
        Ok(Self {
            kind,
            curve: self.curve.map_display(|db| db + offset_db)?,
        })
    }

    /// Same gain law under another channel name.
    pub fn renamed(&self, kind: ChannelKind) -> Self {
        Self {
            kind,
            curve: self.curve.clone(),
        }
    }

    /// dB → normalized. `-inf` selects the bottom of the table.
    pub fn db_to_normalized(&self, db: f64) -> Result<Resolved, MappingError> {
        let target = if db == f64::NEG_INFINITY { self.min_db() } else { db };
        let (normalized, clamped) = self.curve.inverse(target).ok_or(MappingError::OutOfDomain {
            family: "piecewise",
            value: db,
        })?;
        let (applied, _) = self.curve.forward(normalized).ok_or(MappingError::OutOfDomain {
            family: "piecewise",
            value: normalized,
        })?;
        Ok(Resolved {
            normalized,
            display: DisplayValue::Number(applied),
            clamped: clamped || db.is_infinite(),
        })
    }

    /// normalized → dB.
    pub fn normalized_to_db(&self, normalized: f64) -> Result<Resolved, MappingError> {
        let (db, clamped) = self.curve.forward(normalized).ok_or(MappingError::OutOfDomain {
            family: "piecewise",
            value: normalized,
        })?;
        let (lo, hi) = self.curve.normalized_range();
        Ok(Resolved {
            normalized: normalized.clamp(lo, hi),
            display: DisplayValue::Number(db),
            clamped,
        })
    }
}
