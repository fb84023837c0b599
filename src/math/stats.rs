//! Goodness-of-fit helpers.

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Can be negative for fits worse than the mean. Returns `None` when the
/// observations have no variance or any value is non-finite.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    let n = observed.len();
    if n == 0 || predicted.len() != n {
        return None;
    }
    if observed.iter().chain(predicted).any(|v| !v.is_finite()) {
        return None;
    }

    let mean = observed.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean) * (y - mean)).sum();
    if ss_tot <= f64::EPSILON * mean.abs().max(1.0) {
        return None;
    }
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p) * (y - p))
        .sum();

    Some(1.0 - ss_res / ss_tot)
}

/// Map R² onto `[0, 1]` relative to the acceptance threshold.
pub fn confidence(r_squared: f64, threshold: f64) -> f64 {
    if !r_squared.is_finite() || threshold >= 1.0 {
        return 0.0;
    }
    ((r_squared - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
}
