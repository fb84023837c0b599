//! Least squares solver.
//!
//! Every candidate family is linear in its two coefficients once the axes are
//! transformed, so fitting reduces to solving
//!
//! ```text
//! minimize Σ (Y_i - a - b X_i)^2
//! ```
//!
//! for transformed observations `(X_i, Y_i)`. There is no initial guess and no
//! iteration: the same inputs always produce the same coefficients.
//!
//! We use SVD so that the tall design matrix (more rows than columns) is solved
//! robustly. Nalgebra's `QR::solve` is intended for square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `Y = a + b X` and return `(a, b)`.
///
/// Returns `None` for fewer than two points or when `X` has no spread.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }
    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(x_max - x_min).is_normal() {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x;
    }
    let obs = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &obs)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_coefficients() {
        let xs = [0.0, 0.25, 0.5, 0.75, 1.0];
        let ys: Vec<f64> = xs.iter().map(|x| -70.0 + 76.0 * x).collect();
        let (a, b) = fit_line(&xs, &ys).unwrap();
        assert!((a + 70.0).abs() < 1e-9);
        assert!((b - 76.0).abs() < 1e-9);
    }

    #[test]
    fn fit_line_rejects_zero_spread() {
        assert!(fit_line(&[0.5, 0.5, 0.5], &[1.0, 2.0, 3.0]).is_none());
        assert!(fit_line(&[0.5], &[1.0]).is_none());
    }
}
