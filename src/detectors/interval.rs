//! Interval-based detectors: equal-tailed, highest density and bias-corrected.
//!
//! Each column gets an interval at coverage `ci`; a cell outside it scores 1.
//! The distance is the row mean of the cell scores and any positive distance is
//! flagged.

use super::{row_mean, DetectorOutput};
use crate::core::{standard_normal_quantile, Method};
use crate::error::{OutlierError, Result};
use crate::utils::column;
use crate::utils::stats::{quantile_sorted, sorted_finite};
use faer::{Col, Mat};
use statrs::distribution::{ContinuousCDF, Normal};

/// Equal-tailed interval between the `(1 − ci)/2` and `(1 + ci)/2` quantiles.
pub fn eti(x: &Mat<f64>, ci: f64) -> Result<DetectorOutput> {
    interval_test(x, Method::Eti, |sorted| {
        Ok((
            quantile_sorted(sorted, (1.0 - ci) / 2.0),
            quantile_sorted(sorted, (1.0 + ci) / 2.0),
        ))
    })
}

/// Shortest interval holding `ceil(ci · n)` of the sorted values.
pub fn hdi(x: &Mat<f64>, ci: f64) -> Result<DetectorOutput> {
    interval_test(x, Method::Hdi, |sorted| highest_density(sorted, ci))
}

/// Bias-corrected and accelerated interval.
pub fn bci(x: &Mat<f64>, ci: f64) -> Result<DetectorOutput> {
    interval_test(x, Method::Bci, |sorted| Ok(bias_corrected(sorted, ci)))
}

fn interval_test(
    x: &Mat<f64>,
    method: Method,
    bounds: impl Fn(&[f64]) -> Result<(f64, f64)>,
) -> Result<DetectorOutput> {
    let n = x.nrows();
    let mut cells = Mat::from_fn(n, x.ncols(), |_, _| f64::NAN);

    for j in 0..x.ncols() {
        let values = column(x, j);
        let sorted = sorted_finite(&values);
        if sorted.is_empty() {
            continue;
        }
        let (lower, upper) = bounds(&sorted).map_err(|e| with_method(e, method))?;
        for (i, &v) in values.iter().enumerate() {
            if v.is_finite() {
                cells[(i, j)] = if v < lower || v > upper { 1.0 } else { 0.0 };
            }
        }
    }

    let distance = Col::from_fn(n, |i| row_mean(&cells, i));
    Ok(DetectorOutput::above(method, distance, 0.0))
}

fn with_method(err: OutlierError, method: Method) -> OutlierError {
    match err {
        OutlierError::ComputationFailure { reason, .. } => {
            OutlierError::ComputationFailure { method, reason }
        }
        other => other,
    }
}

fn highest_density(sorted: &[f64], ci: f64) -> Result<(f64, f64)> {
    let n = sorted.len();
    let window = (ci * n as f64).ceil() as usize;
    if window < 2 {
        return Err(OutlierError::ComputationFailure {
            method: Method::Hdi,
            reason: format!("interval at coverage {ci} holds fewer than two of {n} values"),
        });
    }
    let n_candidates = n.saturating_sub(window);
    if n_candidates < 1 {
        return Err(OutlierError::ComputationFailure {
            method: Method::Hdi,
            reason: format!("coverage {ci} leaves no alternative intervals for {n} values"),
        });
    }

    // Equally short windows resolve to the last one.
    let mut best = 0;
    let mut best_width = f64::INFINITY;
    for start in 0..n_candidates {
        let width = sorted[start + window] - sorted[start];
        if width <= best_width {
            best_width = width;
            best = start;
        }
    }
    Ok((sorted[best], sorted[best + window]))
}

fn bias_corrected(sorted: &[f64], ci: f64) -> (f64, f64) {
    let n = sorted.len();
    let nf = n as f64;
    let center = sorted.iter().sum::<f64>() / nf;
    if sorted[n - 1] - sorted[0] == 0.0 {
        return (center, center);
    }

    // Bias from the share below the mean, kept inside (0, 1).
    let below = sorted.iter().filter(|&&v| v < center).count() as f64;
    let share = (below / nf).clamp(0.5 / nf, 1.0 - 0.5 / nf);
    let z0 = standard_normal_quantile(share);

    let u: Vec<f64> = sorted.iter().map(|&v| (nf - 1.0) * (center - v)).collect();
    let top: f64 = u.iter().map(|v| v * v * v).sum();
    let under = 6.0 * u.iter().map(|v| v * v).sum::<f64>().powf(1.5);
    let accel = top / under;

    let adjusted = |p: f64| {
        let zp = standard_normal_quantile(p);
        let z = z0 + (z0 + zp) / (1.0 - accel * (z0 + zp));
        Normal::new(0.0, 1.0).map(|d| d.cdf(z)).unwrap_or(p)
    };
    let low = (1.0 - ci) / 2.0;
    (
        quantile_sorted(sorted, adjusted(low)),
        quantile_sorted(sorted, adjusted(1.0 - low)),
    )
}
