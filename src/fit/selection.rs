//! Family selection with fallbacks.
//!
//! The selector fits every candidate family and computes R² for each:
//!
//! 1. Families that fail preconditions (domain, monotonicity, solver) are skipped
//! 2. Choose the highest R²; ties go to the earlier family (linear, log, exp, power)
//! 3. If the best R² is below the threshold, or there are too few samples,
//!    degrade: point-based curve (if enabled), then two-point linear, then constant
//!
//! Fallback models carry R² = 0 and confidence 0, so downstream consumers ask for
//! confirmation instead of auto-applying.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{CalibrationConfig, Curve, Family, FitModel, SamplePair};
use crate::error::MappingError;
use crate::fit::fitter::{FamilyFit, MIN_FIT_POINTS, fit_family};
use crate::math::{confidence, r_squared};
use crate::models::{Breakpoint, PiecewiseCurve};

/// R² differences smaller than this count as ties.
const R2_TIE: f64 = 1e-12;

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct FitSelection {
    pub best: FitModel,
    /// Fits for all families that passed their preconditions, in candidate order.
    pub fits: Vec<FamilyFit>,
    /// Families that were rejected and why (for diagnostics).
    pub skipped: Vec<(Family, String)>,
    /// Why a fallback model was published instead of a fitted family.
    pub fallback: Option<MappingError>,
}

/// Fit and select the best continuous model for `parameter`.
///
/// Only numeric samples take part. Fails with `InsufficientSamples` when there
/// is not a single numeric sample to build even a constant from.
pub fn fit_and_select(
    parameter: &str,
    samples: &[SamplePair],
    config: &CalibrationConfig,
) -> Result<FitSelection, MappingError> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .filter_map(|s| s.display.as_number().map(|y| (s.normalized, y)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip();
    let n = xs.len();
    if n < samples.len() {
        debug!(parameter, ignored = samples.len() - n, "ignoring label samples for regression");
    }
    if n == 0 {
        return Err(MappingError::InsufficientSamples {
            parameter: parameter.to_string(),
            found: 0,
            required: config.min_samples,
        });
    }

    // All-identical displays have zero variance: never regress them.
    if ys.iter().all(|y| *y == ys[0]) {
        return Ok(FitSelection {
            best: unscored(Curve::Constant { value: ys[0] }),
            fits: Vec::new(),
            skipped: Vec::new(),
            fallback: None,
        });
    }

    if n < config.min_samples.max(MIN_FIT_POINTS) {
        let reason = MappingError::InsufficientSamples {
            parameter: parameter.to_string(),
            found: n,
            required: config.min_samples,
        };
        warn!(parameter, found = n, "too few samples, using two-point fallback");
        return Ok(FitSelection {
            best: two_point_or_constant(&xs, &ys),
            fits: Vec::new(),
            skipped: Vec::new(),
            fallback: Some(reason),
        });
    }

    // Families are independent; fit them in parallel. `collect` keeps candidate order.
    let results: Vec<(Family, Result<FamilyFit, String>)> = Family::ALL
        .par_iter()
        .map(|&family| (family, fit_family(family, &xs, &ys, config.log_epsilon)))
        .collect();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for (family, result) in results {
        match result {
            Ok(fit) => {
                debug!(parameter, family = family.display_name(), r_squared = fit.r_squared, "family fitted");
                fits.push(fit);
            }
            Err(reason) => {
                debug!(parameter, family = family.display_name(), %reason, "family rejected");
                skipped.push((family, reason));
            }
        }
    }

    let best_fit = select_best(&fits);
    if let Some(best) = best_fit.filter(|f| f.r_squared >= config.r2_threshold) {
        let best = FitModel {
            curve: best.curve(),
            r_squared: best.r_squared,
            confidence: confidence(best.r_squared, config.r2_threshold),
        };
        return Ok(FitSelection {
            best,
            fits,
            skipped,
            fallback: None,
        });
    }

    let reason = match best_fit {
        Some(f) => format!(
            "best R² {:.4} ({}) is below {:.2}",
            f.r_squared,
            f.family.display_name(),
            config.r2_threshold
        ),
        None => "every candidate family was rejected".to_string(),
    };
    warn!(parameter, %reason, "no acceptable fit, degrading");
    let fallback = Some(MappingError::NoAcceptableFit {
        parameter: parameter.to_string(),
        reason,
    });

    let point_based = if config.allow_point_based {
        point_based(&xs, &ys, config.r2_threshold)
    } else {
        None
    };
    let best = point_based.unwrap_or_else(|| two_point_or_constant(&xs, &ys));

    Ok(FitSelection {
        best,
        fits,
        skipped,
        fallback,
    })
}

/// Highest R² wins; earlier families win ties.
pub fn select_best(fits: &[FamilyFit]) -> Option<&FamilyFit> {
    let mut best = fits.first()?;
    for f in &fits[1..] {
        if f.r_squared > best.r_squared + R2_TIE {
            best = f;
        }
    }
    Some(best)
}

/// Two-point linear interpolation between the lowest and highest observed
/// normalized values.
///
/// When those two show the same display but the samples between them do not,
/// the line runs between the display minimum and maximum instead. Only samples
/// without any display spread become a constant.
pub fn two_point_or_constant(xs: &[f64], ys: &[f64]) -> FitModel {
    let points = average_by_x(xs, ys);
    let ends = match (points.first(), points.last()) {
        (Some(&lo), Some(&hi)) if hi.0 > lo.0 && hi.1 != lo.1 => Some((lo, hi)),
        _ => display_extremes(&points),
    };
    let curve = match ends {
        Some(((x0, y0), (x1, y1))) => {
            let b = (y1 - y0) / (x1 - x0);
            Curve::Linear { a: y0 - b * x0, b }
        }
        None => {
            let mean = if ys.is_empty() { 0.0 } else { ys.iter().sum::<f64>() / ys.len() as f64 };
            Curve::Constant { value: mean }
        }
    };
    unscored(curve)
}

/// Lowest and highest display point, ordered by normalized value.
fn display_extremes(points: &[(f64, f64)]) -> Option<((f64, f64), (f64, f64))> {
    let lo = points.iter().copied().min_by(|a, b| a.1.total_cmp(&b.1))?;
    let hi = points.iter().copied().max_by(|a, b| a.1.total_cmp(&b.1))?;
    if hi.1 <= lo.1 || hi.0 == lo.0 {
        return None;
    }
    Some(if lo.0 < hi.0 { (lo, hi) } else { (hi, lo) })
}

/// Two-point linear model through `(x0, y0)` and `(x1, y1)`.
pub fn two_point(x0: f64, y0: f64, x1: f64, y1: f64) -> FitModel {
    two_point_or_constant(&[x0, x1], &[y0, y1])
}

/// Tabulated curve through the per-x means, if they are strictly monotonic.
fn point_based(xs: &[f64], ys: &[f64], threshold: f64) -> Option<FitModel> {
    let points = average_by_x(xs, ys);
    if points.len() < 2 {
        return None;
    }
    let rising = points.windows(2).all(|w| w[1].1 > w[0].1);
    let falling = points.windows(2).all(|w| w[1].1 < w[0].1);
    if !(rising || falling) {
        return None;
    }

    let table = PiecewiseCurve::new(points.iter().map(|&(x, y)| Breakpoint::new(x, y)).collect()).ok()?;
    let predicted: Vec<f64> = xs.iter().filter_map(|&x| table.forward(x).map(|(y, _)| y)).collect();
    let r2 = r_squared(ys, &predicted)?;
    Some(FitModel {
        curve: Curve::PointBased(table),
        r_squared: r2,
        confidence: confidence(r2, threshold),
    })
}

/// Mean `y` per distinct `x`, ascending on `x`.
fn average_by_x(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut out: Vec<(f64, f64)> = Vec::new();
    let mut count = 0usize;
    for (x, y) in pairs {
        match out.last_mut() {
            Some(last) if last.0 == x => {
                count += 1;
                last.1 += (y - last.1) / count as f64;
            }
            _ => {
                out.push((x, y));
                count = 1;
            }
        }
    }
    out
}

fn unscored(curve: Curve) -> FitModel {
    FitModel {
        curve,
        r_squared: 0.0,
        confidence: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitKind, SampleValue};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn numeric(pairs: impl IntoIterator<Item = (f64, f64)>) -> Vec<SamplePair> {
        pairs
            .into_iter()
            .map(|(x, y)| SamplePair {
                normalized: x,
                display: SampleValue::Numeric(y),
                unit: None,
            })
            .collect()
    }

    fn family_fit(family: Family, r_squared: f64) -> FamilyFit {
        FamilyFit {
            family,
            a: 0.0,
            b: 1.0,
            r_squared,
            n_used: 10,
        }
    }

    #[test]
    fn highest_r_squared_wins() {
        let fits = vec![family_fit(Family::Linear, 0.80), family_fit(Family::Log, 0.97)];
        assert_eq!(select_best(&fits).unwrap().family, Family::Log);
    }

    #[test]
    fn ties_prefer_the_simpler_family() {
        let fits = vec![family_fit(Family::Linear, 0.95), family_fit(Family::Exp, 0.95)];
        assert_eq!(select_best(&fits).unwrap().family, Family::Linear);
    }

    #[test]
    fn logarithmic_samples_select_log() {
        // Noisy y = 10 + 8 ln x, the shape of a time control with a long tail.
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 0.15).unwrap();
        let samples = numeric((1..=40).map(|i| {
            let x = i as f64 / 40.0;
            (x, 10.0 + 8.0 * x.ln() + noise.sample(&mut rng))
        }));

        let sel = fit_and_select("Decay", &samples, &CalibrationConfig::default()).unwrap();
        assert_eq!(sel.best.curve.kind(), FitKind::Log);
        assert!(sel.best.r_squared > 0.97);
        assert!(sel.fallback.is_none());

        let linear = sel.fits.iter().find(|f| f.family == Family::Linear).unwrap();
        assert!(linear.r_squared < sel.best.r_squared);
    }

    #[test]
    fn exponential_frequency_samples_select_exp() {
        let samples = numeric((0..=20).map(|i| {
            let x = i as f64 / 20.0;
            (x, 20.0 * 1000.0_f64.powf(x))
        }));
        let sel = fit_and_select("Frequency", &samples, &CalibrationConfig::default()).unwrap();
        assert_eq!(sel.best.curve.kind(), FitKind::Exp);
        assert!((sel.best.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn constant_samples_are_not_regressed() {
        let samples = numeric((0..8).map(|i| (i as f64 / 8.0, 5.0)));
        let sel = fit_and_select("Fixed", &samples, &CalibrationConfig::default()).unwrap();
        assert_eq!(sel.best.curve, Curve::Constant { value: 5.0 });
        assert!(sel.fits.is_empty());
    }

    #[test]
    fn too_few_samples_fall_back_to_two_points() {
        let samples = numeric([(0.0, -12.0), (0.5, 0.0), (1.0, 12.0)]);
        let sel = fit_and_select("Gain", &samples, &CalibrationConfig::default()).unwrap();
        assert_eq!(sel.best.curve, Curve::Linear { a: -12.0, b: 24.0 });
        assert_eq!(sel.best.r_squared, 0.0);
        assert_eq!(sel.best.confidence, 0.0);
        assert!(matches!(sel.fallback, Some(MappingError::InsufficientSamples { found: 3, .. })));
    }

    #[test]
    fn poor_fits_degrade_to_two_points() {
        // A zig-zag no family can follow.
        let samples = numeric((0..12).map(|i| {
            let x = i as f64 / 11.0;
            (x, if i % 2 == 0 { 0.0 } else { 10.0 } + x)
        }));
        let sel = fit_and_select("Odd", &samples, &CalibrationConfig::default()).unwrap();
        assert!(matches!(sel.fallback, Some(MappingError::NoAcceptableFit { .. })));
        assert_eq!(sel.best.curve.kind(), FitKind::Linear);
        assert_eq!(sel.best.confidence, 0.0);
    }

    #[test]
    fn point_based_fallback_follows_monotone_samples() {
        // Monotone but kinked: no two-coefficient family reaches 0.999.
        let pts = [(0.0, 0.0), (0.2, 1.0), (0.4, 2.0), (0.6, 30.0), (0.8, 31.0), (1.0, 32.0)];
        let config = CalibrationConfig {
            r2_threshold: 0.999,
            allow_point_based: true,
            ..CalibrationConfig::default()
        };
        let sel = fit_and_select("Kink", &numeric(pts), &config).unwrap();
        assert_eq!(sel.best.curve.kind(), FitKind::PointBased);
        assert!((sel.best.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn label_only_samples_cannot_be_fitted() {
        let samples = vec![SamplePair {
            normalized: 0.0,
            display: SampleValue::Label("Off".to_string()),
            unit: None,
        }];
        let err = fit_and_select("Mode", &samples, &CalibrationConfig::default()).unwrap_err();
        assert!(matches!(err, MappingError::InsufficientSamples { found: 0, .. }));
    }

    #[test]
    fn duplicates_average_before_two_point_fallback() {
        let m = two_point_or_constant(&[0.0, 0.0, 1.0], &[-10.0, -6.0, 6.0]);
        assert_eq!(m.curve, Curve::Linear { a: -8.0, b: 14.0 });
        let flat = two_point_or_constant(&[0.5, 0.5], &[1.0, 3.0]);
        assert_eq!(flat.curve, Curve::Constant { value: 2.0 });
    }

    #[test]
    fn equal_endpoints_fall_back_to_the_display_extremes() {
        let m = two_point_or_constant(&[0.0, 0.25, 0.5, 0.75, 1.0], &[1.0, 4.0, 9.0, 4.0, 1.0]);
        assert_eq!(m.curve, Curve::Linear { a: 1.0, b: 16.0 });
        assert_eq!(m.confidence, 0.0);

        let flat = two_point_or_constant(&[0.0, 0.5, 1.0], &[3.0, 3.0, 3.0]);
        assert_eq!(flat.curve, Curve::Constant { value: 3.0 });
    }
}
