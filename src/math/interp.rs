//! Interpolation over sorted point lists.
//!
//! Tabulated curves never extrapolate: queries outside the tabulated range
//! return the nearest endpoint. Device curves often flatten or reverse past
//! the sampled range, so a straight-line continuation is not trustworthy.

/// Linear interpolation between `(x0, y0)` and `(x1, y1)` at `x`.
pub fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    let dx = x1 - x0;
    if dx == 0.0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / dx
}

/// Interpolate `points` (sorted ascending on `.0`, unique) at `x`.
///
/// Returns the value and whether `x` was clamped to an endpoint, or `None`
/// for an empty table or a NaN query.
pub fn interp_clamped(points: &[(f64, f64)], x: f64) -> Option<(f64, bool)> {
    let (first, last) = (points.first()?, points.last()?);
    if x.is_nan() {
        return None;
    }
    if x <= first.0 {
        return Some((first.1, x < first.0));
    }
    if x >= last.0 {
        return Some((last.1, x > last.0));
    }

    // First index whose key is > x; x lies in [idx-1, idx).
    let idx = points.partition_point(|p| p.0 <= x);
    let (x0, y0) = points[idx - 1];
    let (x1, y1) = points[idx];
    Some((lerp(x0, y0, x1, y1, x), false))
}

/// Densify `(xs, ys)` with a monotone cubic Hermite spline (Fritsch–Carlson).
///
/// `xs` must be strictly increasing and `ys` monotonic; the spline then
/// preserves monotonicity and passes through every knot. Produces `samples`
/// evenly spaced points including both endpoints.
pub fn monotone_cubic(xs: &[f64], ys: &[f64], samples: usize) -> Option<Vec<(f64, f64)>> {
    let n = xs.len();
    if n < 2 || ys.len() != n || samples < 2 {
        return None;
    }
    if xs.windows(2).any(|w| !(w[1] > w[0])) {
        return None;
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let d: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();

    let mut m = vec![0.0; n];
    m[0] = d[0];
    m[n - 1] = d[n - 2];
    for k in 1..n - 1 {
        m[k] = if d[k - 1] * d[k] <= 0.0 {
            0.0
        } else {
            (d[k - 1] + d[k]) / 2.0
        };
    }
    for k in 0..n - 1 {
        if d[k] == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
            continue;
        }
        let a = m[k] / d[k];
        let b = m[k + 1] / d[k];
        let s = a * a + b * b;
        if s > 9.0 {
            let t = 3.0 / s.sqrt();
            m[k] = t * a * d[k];
            m[k + 1] = t * b * d[k];
        }
    }

    let x_first = xs[0];
    let x_last = xs[n - 1];
    let mut out = Vec::with_capacity(samples);
    let mut k = 0usize;
    for i in 0..samples {
        if i == samples - 1 {
            out.push((x_last, ys[n - 1]));
            break;
        }
        let x = x_first + (x_last - x_first) * i as f64 / (samples as f64 - 1.0);
        while k < n - 2 && x >= xs[k + 1] {
            k += 1;
        }
        let t = (x - xs[k]) / h[k];
        let t2 = t * t;
        let t3 = t2 * t;
        let y = (2.0 * t3 - 3.0 * t2 + 1.0) * ys[k]
            + (t3 - 2.0 * t2 + t) * h[k] * m[k]
            + (-2.0 * t3 + 3.0 * t2) * ys[k + 1]
            + (t3 - t2) * h[k] * m[k + 1];
        out.push((x, y));
    }

    Some(out)
}
