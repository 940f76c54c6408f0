//! Invariant Coordinate Selection.
//!
//! The data are transformed by the generalised eigenvectors of the scatter pair
//! (covariance, fourth-moment scatter). Leading coordinates with significant
//! skewness carry the outlying structure; the squared norm of those coordinates is
//! the distance. The cutoff is calibrated on simulated Gaussian samples of the same
//! shape, so the tail level `threshold` applies under normality.

use super::{complete_rows, DetectorOutput};
use crate::core::Method;
use crate::error::{OutlierError, Result};
use crate::utils::linalg::{covariance, inverse_sqrt_spd, symmetric_eigen};
use crate::utils::matrix::{center_columns, column, column_means};
use crate::utils::stats::{mean, quantile_sorted, sorted_finite};
use faer::{Col, Mat};
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};

/// Smallest sample the skewness test is defined for.
const MIN_ROWS: usize = 8;

/// ICS distances with a simulated cutoff at tail level `threshold`.
pub fn ics(
    x: &Mat<f64>,
    threshold: f64,
    level: f64,
    simulations: usize,
    seed: u64,
) -> Result<DetectorOutput> {
    let method = Method::Ics;
    let p = x.ncols();
    if p < 2 {
        return Err(OutlierError::InsufficientColumns {
            method,
            needed: 2,
            got: p,
        });
    }
    let (cases, clean) = complete_rows(method, x, MIN_ROWS.max(p + 2))?;
    let n = clean.nrows();

    let z = invariant_coordinates(&clean).ok_or(OutlierError::SingularCovariance { method })?;
    let selected = select_components(&z, level);
    if selected == 0 {
        let output = DetectorOutput::above(method, cases.expand(&Col::zeros(n)), f64::INFINITY);
        return Ok(output.with_note("ics: no invariant component is significantly skewed"));
    }

    let d = squared_norm(&z, selected);
    let cutoff = simulated_cutoff(n, p, selected, threshold, simulations, seed)?;
    tracing::debug!(selected, cutoff, "ics components selected");

    Ok(DetectorOutput::above(method, cases.expand(&d), cutoff))
}

/// Invariant coordinates `Z = (X − m) S₁^{-1/2} V`, with `V` the eigenvectors of
/// the whitened fourth-moment scatter in decreasing order of eigenvalue.
fn invariant_coordinates(x: &Mat<f64>) -> Option<Mat<f64>> {
    let (n, p) = (x.nrows(), x.ncols());
    let center = column_means(x);
    let cov = covariance(x, &center);
    let whitening = inverse_sqrt_spd(&cov)?;
    let y = &center_columns(x, &center) * &whitening;

    let radius: Vec<f64> = (0..n)
        .map(|i| (0..p).map(|j| y[(i, j)] * y[(i, j)]).sum())
        .collect();
    let denom = n as f64 * (p + 2) as f64;
    let kurtosis_scatter = Mat::from_fn(p, p, |a, b| {
        (0..n).map(|i| radius[i] * y[(i, a)] * y[(i, b)]).sum::<f64>() / denom
    });

    let (_, vectors) = symmetric_eigen(&kurtosis_scatter)?;
    Some(&y * &vectors)
}

/// Number of leading components whose D'Agostino skewness test rejects at
/// `level / j`, stopping at the first that does not.
fn select_components(z: &Mat<f64>, level: f64) -> usize {
    (0..z.ncols())
        .take_while(|&j| {
            let p_value = dagostino_p_value(&column(z, j));
            p_value < level / (j + 1) as f64
        })
        .count()
}

/// Two-sided p-value of the D'Agostino test for skewness.
fn dagostino_p_value(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    if !(m2 > 0.0) {
        return 1.0;
    }
    let b1 = m3 / m2.powf(1.5);

    let y = b1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / w2.sqrt().ln().sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let ratio = y / alpha;
    let z = delta * (ratio + (ratio * ratio + 1.0).sqrt()).ln();

    let normal = Normal::new(0.0, 1.0).map(|d| d.cdf(-z.abs())).unwrap_or(f64::NAN);
    (2.0 * normal).min(1.0)
}

/// An `n × p` standard normal sample.
fn standard_normal(n: usize, p: usize, seed: u64) -> Mat<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let draws: Vec<f64> = (0..n * p).map(|_| rng.sample(StandardNormal)).collect();
    Mat::from_fn(n, p, |i, j| draws[i * p + j])
}

fn squared_norm(z: &Mat<f64>, k: usize) -> Col<f64> {
    Col::from_fn(z.nrows(), |i| (0..k).map(|j| z[(i, j)] * z[(i, j)]).sum())
}

/// Mean over Gaussian samples of the `(1 − threshold)` quantile of their distances.
fn simulated_cutoff(
    n: usize,
    p: usize,
    k: usize,
    threshold: f64,
    simulations: usize,
    seed: u64,
) -> Result<f64> {
    let quantiles: Vec<f64> = (0..simulations)
        .into_par_iter()
        .filter_map(|s| {
            let sample = standard_normal(n, p, seed.wrapping_add(s as u64));
            let z = invariant_coordinates(&sample)?;
            let d: Vec<f64> = squared_norm(&z, k).iter().copied().collect();
            Some(quantile_sorted(&sorted_finite(&d), 1.0 - threshold))
        })
        .collect();

    if quantiles.is_empty() {
        return Err(OutlierError::ComputationFailure {
            method: Method::Ics,
            reason: "every simulated sample was degenerate".to_string(),
        });
    }
    Ok(mean(&quantiles))
}
