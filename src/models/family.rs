//! Closed-form family evaluation.
//!
//! The fitter relies on two primitive operations per family:
//! - transform an observation into the family's linear regression space
//! - predict `y(x)` given the fitted `(a, b)`
//!
//! The converter additionally needs the algebraic inverse.

use crate::domain::{DEFAULT_LOG_EPSILON, Family};

/// Lowest input of the log-x families outside of fitting.
pub const LOG_DOMAIN_FLOOR: f64 = DEFAULT_LOG_EPSILON;

/// Transform `(x, y)` into the family's regression space.
///
/// Returns `None` when the point lies outside the family's domain
/// (`x <= eps` for log-x families, `y <= 0` for log-y families).
pub fn linearize(family: Family, x: f64, y: f64, eps: f64) -> Option<(f64, f64)> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let lx = if family.log_x() {
        if x <= eps {
            return None;
        }
        x.ln()
    } else {
        x
    };
    let ly = if family.log_y() {
        if y <= 0.0 {
            return None;
        }
        y.ln()
    } else {
        y
    };
    Some((lx, ly))
}

/// Predict `y(x)` for the given family.
///
/// May return a non-finite value when `x` is outside the family's domain.
pub fn predict(family: Family, a: f64, b: f64, x: f64) -> f64 {
    match family {
        Family::Linear => a + b * x,
        Family::Log => a + b * x.ln(),
        Family::Exp => (a + b * x).exp(),
        Family::Power => a.exp() * x.powf(b),
    }
}

/// Solve `y = f(x)` for `x`.
///
/// Returns `None` when `y` has no preimage (flat curve, or negative `y` for
/// log-y families). A preimage beyond the representable range comes back as
/// `0` or `±inf`; `clamp_to_domain` and the normalized bounds take it from there.
pub fn invert(family: Family, a: f64, b: f64, y: f64) -> Option<f64> {
    if !y.is_finite() || b == 0.0 || !b.is_finite() {
        return None;
    }
    let x = match family {
        Family::Linear => (y - a) / b,
        Family::Log => ((y - a) / b).exp(),
        Family::Exp => {
            if y <= 0.0 {
                return None;
            }
            (y.ln() - a) / b
        }
        Family::Power => {
            if y < 0.0 {
                return None;
            }
            ((y.ln() - a) / b).exp()
        }
    };
    (!x.is_nan()).then_some(x)
}

/// Smallest normalized value the family is evaluated at, if it has one.
///
/// `ln x` and `x^b` with `b < 0` have no value at zero, yet zero is the bottom
/// of every host control, so inputs below the floor evaluate at the floor.
pub fn domain_floor(family: Family, b: f64) -> Option<f64> {
    match family {
        Family::Linear | Family::Exp => None,
        Family::Log => Some(LOG_DOMAIN_FLOOR),
        Family::Power if b < 0.0 => Some(LOG_DOMAIN_FLOOR),
        Family::Power => Some(0.0),
    }
}

/// Move `x` into the family's domain; the flag is set when it had to move.
pub fn clamp_to_domain(family: Family, b: f64, x: f64) -> (f64, bool) {
    match domain_floor(family, b) {
        Some(floor) if x < floor => (floor, true),
        _ => (x, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_undoes_predict_for_every_family() {
        let cases = [
            (Family::Linear, -70.0, 76.0),
            (Family::Log, 6.0, 12.0),
            (Family::Exp, 3.0, 6.9),
            (Family::Power, 9.9, 2.0),
        ];
        for (family, a, b) in cases {
            for i in 1..=100 {
                let x = i as f64 / 100.0;
                let y = predict(family, a, b, x);
                let back = invert(family, a, b, y).unwrap();
                assert!((back - x).abs() < 1e-9, "{family:?} at x={x}: {back}");
            }
        }
    }

    #[test]
    fn log_families_reject_non_positive_inputs() {
        assert!(linearize(Family::Log, 0.0, 1.0, 1e-6).is_none());
        assert!(linearize(Family::Exp, 0.5, -1.0, 1e-6).is_none());
        assert!(linearize(Family::Power, 0.5, 0.0, 1e-6).is_none());
        assert_eq!(linearize(Family::Linear, 0.0, -3.0, 1e-6), Some((0.0, -3.0)));
        assert_eq!(clamp_to_domain(Family::Log, 1.0, 0.0), (LOG_DOMAIN_FLOOR, true));
        assert_eq!(clamp_to_domain(Family::Power, 2.0, 0.0), (0.0, false));
        assert_eq!(clamp_to_domain(Family::Power, -1.0, 0.0), (LOG_DOMAIN_FLOOR, true));
        assert_eq!(clamp_to_domain(Family::Linear, 1.0, -4.0), (-4.0, false));
    }

    #[test]
    fn inverse_fails_outside_algebraic_domain() {
        assert!(invert(Family::Exp, 0.0, 1.0, -2.0).is_none());
        assert!(invert(Family::Power, 0.0, 1.0, -1.0).is_none());
        assert!(invert(Family::Linear, 1.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn extreme_displays_invert_to_the_edges_instead_of_failing() {
        assert_eq!(invert(Family::Log, 10.0, 1.0, 1000.0), Some(f64::INFINITY));
        assert_eq!(invert(Family::Log, 10.0, 1.0, -1e4), Some(0.0));
        // The bottom of a rising power law is reachable.
        assert_eq!(invert(Family::Power, 0.0, 2.0, 0.0), Some(0.0));
    }
}
