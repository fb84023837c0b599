//! Low-level fitting routines for a single candidate family.
//!
//! Given observed `(x_i, y_i)` with `x` normalized and `y` numeric display, we:
//! - transform the points into the family's linear regression space
//! - solve for `(a, b)` by least squares
//! - reject curves that are flat, non-finite, or not monotonic
//! - score the survivors with R² in display space
//!
//! Scoring in display space (not in the transformed space) keeps R² comparable
//! across families.

use crate::domain::{Curve, Family};
use crate::math::{fit_line, r_squared};
use crate::models::{linearize, predict};

/// Fewest in-domain points a family may be fitted on.
pub const MIN_FIT_POINTS: usize = 3;

/// Number of grid points between observations used by the monotonicity check.
const MONOTONE_GRID: usize = 25;

/// Scored fit for one family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyFit {
    pub family: Family,
    pub a: f64,
    pub b: f64,
    pub r_squared: f64,
    /// Points inside the family's domain (the ones it was fitted and scored on).
    pub n_used: usize,
}

impl FamilyFit {
    pub fn curve(&self) -> Curve {
        Curve::from_family(self.family, self.a, self.b)
    }
}

/// Fit one family. On rejection returns a human-readable reason.
pub fn fit_family(family: Family, xs: &[f64], ys: &[f64], eps: f64) -> Result<FamilyFit, String> {
    let n = xs.len();
    let mut used_x = Vec::with_capacity(n);
    let mut used_y = Vec::with_capacity(n);
    let mut lx = Vec::with_capacity(n);
    let mut ly = Vec::with_capacity(n);
    for (&x, &y) in xs.iter().zip(ys) {
        if let Some((u, v)) = linearize(family, x, y, eps) {
            used_x.push(x);
            used_y.push(y);
            lx.push(u);
            ly.push(v);
        }
    }

    let used = used_x.len();
    if used < MIN_FIT_POINTS || used * 2 < n {
        return Err(format!("domain keeps {used} of {n} points"));
    }

    let (a, b) = fit_line(&lx, &ly).ok_or_else(|| "least squares failed".to_string())?;
    if b.abs() < 1e-12 {
        return Err("flat fit is not invertible".to_string());
    }

    let predicted: Vec<f64> = used_x.iter().map(|&x| predict(family, a, b, x)).collect();
    if predicted.iter().any(|p| !p.is_finite()) {
        return Err("non-finite prediction".to_string());
    }
    if !is_monotone(family, a, b, &used_x) {
        return Err("predicted curve is not monotonic".to_string());
    }

    let r2 = r_squared(&used_y, &predicted).ok_or_else(|| "observations have no variance".to_string())?;

    Ok(FamilyFit {
        family,
        a,
        b,
        r_squared: r2,
        n_used: used,
    })
}

/// Check that the fitted curve is weakly monotonic over the observed span.
///
/// The curve is evaluated at every observed `x` plus a uniform grid between the
/// extremes, in ascending order. All steps must share one direction (within a
/// small relative tolerance); any non-finite value fails the check.
pub fn is_monotone(family: Family, a: f64, b: f64, xs: &[f64]) -> bool {
    let mut grid: Vec<f64> = xs.iter().copied().filter(|x| x.is_finite()).collect();
    let Some(lo) = grid.iter().copied().reduce(f64::min) else {
        return false;
    };
    let hi = grid.iter().copied().fold(lo, f64::max);
    for i in 0..MONOTONE_GRID {
        grid.push(lo + (hi - lo) * i as f64 / (MONOTONE_GRID as f64 - 1.0));
    }
    grid.sort_by(f64::total_cmp);
    grid.dedup();

    let values: Vec<f64> = grid.iter().map(|&x| predict(family, a, b, x)).collect();
    if values.iter().any(|v| !v.is_finite()) {
        return false;
    }

    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
    let eps = 1e-9 * scale;
    let rising = values.windows(2).all(|w| w[1] - w[0] >= -eps);
    let falling = values.windows(2).all(|w| w[1] - w[0] <= eps);
    rising || falling
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n).map(|i| lo + (hi - lo) * i as f64 / (n as f64 - 1.0)).collect()
    }

    #[test]
    fn linear_data_is_recovered_exactly() {
        let xs = grid(12, 0.0, 1.0);
        let ys: Vec<f64> = xs.iter().map(|x| -70.0 + 76.0 * x).collect();
        let fit = fit_family(Family::Linear, &xs, &ys, 1e-6).unwrap();
        assert!((fit.a + 70.0).abs() < 1e-9);
        assert!((fit.b - 76.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.n_used, 12);
    }

    #[test]
    fn exponential_data_is_recovered_in_log_space() {
        // 20 Hz .. 20 kHz
        let xs = grid(10, 0.0, 1.0);
        let ys: Vec<f64> = xs.iter().map(|x| 20.0 * 1000.0_f64.powf(*x)).collect();
        let fit = fit_family(Family::Exp, &xs, &ys, 1e-6).unwrap();
        assert!((fit.a - 20.0_f64.ln()).abs() < 1e-9);
        assert!((fit.b - 1000.0_f64.ln()).abs() < 1e-9);
        assert!(fit.r_squared > 0.999_999);
    }

    #[test]
    fn log_family_drops_zero_but_needs_most_points_in_domain() {
        let xs = grid(11, 0.0, 1.0);
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 + 2.0 * x).collect();
        let fit = fit_family(Family::Log, &xs, &ys, 1e-6).unwrap();
        assert_eq!(fit.n_used, 10);

        let sparse_x = [0.0, 0.0, 0.0, 0.0, 0.5, 1.0];
        let sparse_y = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0];
        let err = fit_family(Family::Log, &sparse_x, &sparse_y, 1e-6).unwrap_err();
        assert!(err.contains("domain keeps 2 of 6"), "{err}");
    }

    #[test]
    fn negative_displays_exclude_log_y_families() {
        let xs = grid(8, 0.0, 1.0);
        let ys: Vec<f64> = xs.iter().map(|x| -40.0 + 30.0 * x).collect();
        assert!(fit_family(Family::Exp, &xs, &ys, 1e-6).is_err());
        assert!(fit_family(Family::Power, &xs, &ys, 1e-6).is_err());
    }

    #[test]
    fn monotone_check_accepts_both_directions() {
        let xs = grid(5, 0.1, 1.0);
        assert!(is_monotone(Family::Linear, 1.0, -2.0, &xs));
        assert!(is_monotone(Family::Log, 1.0, 2.0, &xs));
        assert!(!is_monotone(Family::Log, 1.0, 2.0, &[0.0, 0.5]));
        assert!(!is_monotone(Family::Linear, 0.0, 1.0, &[]));
    }
}
