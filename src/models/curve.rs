//! Forward/inverse dispatch over `Curve`.
//!
//! Closed-form variants report algebraic domain violations (a display no
//! formula can reach, a non-finite input) as `MappingError::OutOfDomain`.
//! Inputs below a log-x family's floor evaluate at the floor. Tabulated variants
//! never fail for finite input; they clamp to their end breakpoints and say so.

use crate::domain::{Curve, Family};
use crate::error::MappingError;
use crate::models::family::{clamp_to_domain, invert, predict};

impl Curve {
    /// Closed-form view `(family, a, b)`, if this is one.
    pub fn closed_form(&self) -> Option<(Family, f64, f64)> {
        match *self {
            Curve::Linear { a, b } => Some((Family::Linear, a, b)),
            Curve::Log { a, b } => Some((Family::Log, a, b)),
            Curve::Exp { a, b } => Some((Family::Exp, a, b)),
            Curve::Power { a, b } => Some((Family::Power, a, b)),
            Curve::Constant { .. } | Curve::Piecewise(_) | Curve::PointBased(_) => None,
        }
    }

    /// Display value at `x`, plus whether a tabulated curve clamped `x`.
    pub fn forward(&self, x: f64) -> Result<(f64, bool), MappingError> {
        let out_of_domain = || MappingError::OutOfDomain {
            family: self.kind().display_name(),
            value: x,
        };
        match self {
            Curve::Linear { .. } | Curve::Log { .. } | Curve::Exp { .. } | Curve::Power { .. } => {
                let Some((family, a, b)) = self.closed_form() else {
                    return Err(out_of_domain());
                };
                if !x.is_finite() {
                    return Err(out_of_domain());
                }
                let (x, _) = clamp_to_domain(family, b, x);
                let y = predict(family, a, b, x);
                if y.is_finite() { Ok((y, false)) } else { Err(out_of_domain()) }
            }
            Curve::Constant { value } => {
                if x.is_nan() {
                    return Err(out_of_domain());
                }
                Ok((*value, false))
            }
            Curve::Piecewise(table) | Curve::PointBased(table) => table.forward(x).ok_or_else(out_of_domain),
        }
    }

    /// Normalized value at display `y`, plus whether `y` lay beyond what the
    /// curve reaches and was clamped.
    ///
    /// A closed-form preimage may be `±inf`; callers clamp it into their
    /// normalized bounds. A constant curve has no inverse and always fails here.
    pub fn inverse(&self, y: f64) -> Result<(f64, bool), MappingError> {
        let out_of_domain = || MappingError::OutOfDomain {
            family: self.kind().display_name(),
            value: y,
        };
        match self {
            Curve::Linear { .. } | Curve::Log { .. } | Curve::Exp { .. } | Curve::Power { .. } => {
                let (family, a, b) = self.closed_form().ok_or_else(out_of_domain)?;
                let x = invert(family, a, b, y).ok_or_else(out_of_domain)?;
                let (x, moved) = clamp_to_domain(family, b, x);
                Ok((x, moved || x.is_infinite()))
            }
            Curve::Constant { .. } => Err(out_of_domain()),
            Curve::Piecewise(table) | Curve::PointBased(table) => table.inverse(y).ok_or_else(out_of_domain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Breakpoint, LOG_DOMAIN_FLOOR, PiecewiseCurve};

    #[test]
    fn log_curve_evaluates_zero_at_its_floor() {
        let c = Curve::Log { a: 0.0, b: 1.0 };
        let (y, clamped) = c.forward(0.0).unwrap();
        assert_eq!(y, LOG_DOMAIN_FLOOR.ln());
        assert!(!clamped);
        assert_eq!(c.forward(-0.5).unwrap().0, y);
        assert!(matches!(
            c.forward(f64::NAN),
            Err(MappingError::OutOfDomain { family: "log", .. })
        ));
    }

    #[test]
    fn log_curve_inverse_clamps_unreachable_displays() {
        let c = Curve::Log { a: 10.0, b: 1.0 };
        assert_eq!(c.inverse(1000.0).unwrap(), (f64::INFINITY, true));
        assert_eq!(c.inverse(-1e4).unwrap(), (LOG_DOMAIN_FLOOR, true));
        let (x, clamped) = c.inverse(10.0).unwrap();
        assert!((x - 1.0).abs() < 1e-12);
        assert!(!clamped);
    }

    #[test]
    fn exp_curve_inverse_fails_on_non_positive_display() {
        let c = Curve::Exp { a: 0.0, b: 2.0 };
        assert!(matches!(c.inverse(-1.0), Err(MappingError::OutOfDomain { .. })));
        let (x, clamped) = c.inverse(2.0_f64.exp()).unwrap();
        assert!((x - 1.0).abs() < 1e-12);
        assert!(!clamped);
    }

    #[test]
    fn tabulated_curves_clamp_both_directions() {
        let table = PiecewiseCurve::new(vec![Breakpoint::new(0.0, -70.0), Breakpoint::new(1.0, 6.0)]).unwrap();
        let c = Curve::PointBased(table);
        assert_eq!(c.forward(-0.5).unwrap(), (-70.0, true));
        assert_eq!(c.inverse(20.0).unwrap(), (1.0, true));
    }

    #[test]
    fn constant_curve_is_flat_and_not_invertible() {
        let c = Curve::Constant { value: 5.0 };
        assert_eq!(c.forward(0.0).unwrap().0, 5.0);
        assert_eq!(c.forward(0.9).unwrap().0, 5.0);
        assert!(c.inverse(5.0).is_err());
    }
}
