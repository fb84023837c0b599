//! Tabulated (piecewise linear) curves.
//!
//! A curve is an ordered breakpoint list, unique and ascending on the
//! normalized axis. The inverse direction needs the same points ordered on the
//! display axis; that view is built once at construction so lookups stay
//! allocation-free.

use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::math::interp_clamped;

/// One `(normalized, display)` knot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub normalized: f64,
    pub display: f64,
}

impl Breakpoint {
    pub fn new(normalized: f64, display: f64) -> Self {
        Self { normalized, display }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Breakpoint>", into = "Vec<Breakpoint>")]
pub struct PiecewiseCurve {
    /// `(normalized, display)` ascending on normalized.
    forward: Vec<(f64, f64)>,
    /// `(display, normalized)` ascending on display; flat runs keep the lowest normalized.
    inverse: Vec<(f64, f64)>,
}

impl PiecewiseCurve {
    /// Build a curve, sorting by normalized value.
    ///
    /// Fails on an empty list, non-finite coordinates, or duplicate normalized values.
    pub fn new(mut points: Vec<Breakpoint>) -> Result<Self, MappingError> {
        if points.is_empty() {
            return Err(MappingError::InvalidModel("piecewise curve has no breakpoints".to_string()));
        }
        if points.iter().any(|p| !(p.normalized.is_finite() && p.display.is_finite())) {
            return Err(MappingError::InvalidModel("piecewise curve has non-finite breakpoints".to_string()));
        }
        points.sort_by(|a, b| a.normalized.total_cmp(&b.normalized));
        if let Some(w) = points.windows(2).find(|w| w[0].normalized == w[1].normalized) {
            return Err(MappingError::InvalidModel(format!(
                "duplicate breakpoint at normalized {}",
                w[0].normalized
            )));
        }

        let forward: Vec<(f64, f64)> = points.iter().map(|p| (p.normalized, p.display)).collect();

        let mut inverse: Vec<(f64, f64)> = points.iter().map(|p| (p.display, p.normalized)).collect();
        inverse.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        inverse.dedup_by(|later, earlier| later.0 == earlier.0);

        Ok(Self { forward, inverse })
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = Breakpoint> + '_ {
        self.forward.iter().map(|&(n, d)| Breakpoint::new(n, d))
    }

    /// `(min, max)` over the display axis.
    pub fn display_range(&self) -> (f64, f64) {
        let first = self.inverse.first().map(|p| p.0).unwrap_or(f64::NAN);
        let last = self.inverse.last().map(|p| p.0).unwrap_or(f64::NAN);
        (first, last)
    }

    /// `(min, max)` over the normalized axis.
    pub fn normalized_range(&self) -> (f64, f64) {
        let first = self.forward.first().map(|p| p.0).unwrap_or(f64::NAN);
        let last = self.forward.last().map(|p| p.0).unwrap_or(f64::NAN);
        (first, last)
    }

    /// Display value at `normalized`, clamped to the end breakpoints.
    pub fn forward(&self, normalized: f64) -> Option<(f64, bool)> {
        interp_clamped(&self.forward, normalized)
    }

    /// Normalized value at `display`, clamped to the end breakpoints.
    pub fn inverse(&self, display: f64) -> Option<(f64, bool)> {
        interp_clamped(&self.inverse, display)
    }

    /// Apply `f` to the display value of every breakpoint.
    pub fn map_display(&self, f: impl Fn(f64) -> f64) -> Result<Self, MappingError> {
        Self::new(self.breakpoints().map(|p| Breakpoint::new(p.normalized, f(p.display))).collect())
    }
}

impl TryFrom<Vec<Breakpoint>> for PiecewiseCurve {
    type Error = MappingError;

    fn try_from(points: Vec<Breakpoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PiecewiseCurve> for Vec<Breakpoint> {
    fn from(curve: PiecewiseCurve) -> Self {
        curve.breakpoints().collect()
    }
}
