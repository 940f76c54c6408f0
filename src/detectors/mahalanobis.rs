//! Classical and OGK-robust Mahalanobis distances.

use super::{complete_rows, DetectorOutput};
use crate::core::Method;
use crate::error::{OutlierError, Result};
use crate::utils::linalg::{
    covariance, invert_spd, left_singular_vectors, mahalanobis as distances, symmetric_eigen,
};
use crate::utils::matrix::{column, column_means, scale_columns, select_rows};
use crate::utils::stats::{mad, median};
use faer::{Col, Mat};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Squared distance from the column means under the sample covariance.
pub fn mahalanobis(x: &Mat<f64>, threshold: f64) -> Result<DetectorOutput> {
    let method = Method::Mahalanobis;
    let (cases, clean) = complete_rows(method, x, x.ncols() + 1)?;

    let center = column_means(&clean);
    let cov = covariance(&clean, &center);
    let inv = invert_spd(&cov).ok_or(OutlierError::SingularCovariance { method })?;
    let d = distances(&clean, &center, &inv);

    Ok(DetectorOutput::above(method, cases.expand(&d), threshold))
}

/// Squared distances of the left singular vectors of the standardized data under
/// a re-weighted OGK estimate.
pub fn mahalanobis_robust(x: &Mat<f64>, threshold: f64) -> Result<DetectorOutput> {
    let method = Method::MahalanobisRobust;
    let (cases, clean) = complete_rows(method, x, x.ncols() + 2)?;

    let scaled = scale_columns(&clean).ok_or_else(|| OutlierError::ComputationFailure {
        method,
        reason: "a variable is constant".to_string(),
    })?;
    let u = left_singular_vectors(&scaled).ok_or(OutlierError::SingularCovariance { method })?;
    let (center, cov) = ogk(&u, 2, 0.9)?;
    let inv = invert_spd(&cov).ok_or(OutlierError::SingularCovariance { method })?;
    let d = distances(&u, &center, &inv);

    Ok(DetectorOutput::above(method, cases.expand(&d), threshold))
}

/// Orthogonalized Gnanadesikan–Kettenring estimate with one re-weighting step.
fn ogk(u: &Mat<f64>, iterations: usize, beta: f64) -> Result<(Col<f64>, Mat<f64>)> {
    let method = Method::MahalanobisRobust;
    let (n, p) = (u.nrows(), u.ncols());
    let mut z = u.to_owned();
    let mut a: Mat<f64> = Mat::identity(p, p);

    for _ in 0..iterations {
        let scales: Vec<f64> = (0..p).map(|j| mad(&column(&z, j))).collect();
        if scales.iter().any(|s| !(*s > 0.0)) {
            return Err(OutlierError::ComputationFailure {
                method,
                reason: "a robust scale is zero".to_string(),
            });
        }
        let y = Mat::from_fn(n, p, |i, j| z[(i, j)] / scales[j]);

        let mut pairwise: Mat<f64> = Mat::identity(p, p);
        for i in 1..p {
            for j in 0..i {
                let sum: Vec<f64> = (0..n).map(|r| y[(r, i)] + y[(r, j)]).collect();
                let diff: Vec<f64> = (0..n).map(|r| y[(r, i)] - y[(r, j)]).collect();
                let value = (mad(&sum).powi(2) - mad(&diff).powi(2)) / 4.0;
                pairwise[(i, j)] = value;
                pairwise[(j, i)] = value;
            }
        }

        let (_, e) =
            symmetric_eigen(&pairwise).ok_or_else(|| OutlierError::ComputationFailure {
                method,
                reason: "the pairwise scatter has no eigen-decomposition".to_string(),
            })?;
        let scaled_e = Mat::from_fn(p, p, |i, j| scales[i] * e[(i, j)]);
        a = &a * &scaled_e;
        z = &y * &e;
    }

    let loc = Col::from_fn(p, |j| median(&column(&z, j)));
    let spread: Vec<f64> = (0..p).map(|j| mad(&column(&z, j)).powi(2)).collect();
    let center = &a * &loc;
    let a_gamma = Mat::from_fn(p, p, |i, j| a[(i, j)] * spread[j]);
    let cov = &a_gamma * a.transpose();

    // Re-weight: keep rows inside the scaled chi-squared quantile.
    let inv = invert_spd(&cov).ok_or(OutlierError::SingularCovariance { method })?;
    let d = distances(u, &center, &inv);
    let chi = ChiSquared::new(p as f64).map_err(|e| OutlierError::ComputationFailure {
        method,
        reason: e.to_string(),
    })?;
    let cutoff = chi.inverse_cdf(beta) * median(&d.iter().copied().collect::<Vec<_>>())
        / chi.inverse_cdf(0.5);
    let kept: Vec<usize> = (0..n).filter(|&i| d[i] < cutoff).collect();
    if kept.len() <= p {
        return Ok((center, cov));
    }

    let subset = select_rows(u, &kept);
    let center = column_means(&subset);
    let cov = covariance(&subset, &center);
    Ok((center, cov))
}
