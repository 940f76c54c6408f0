//! Minimum Covariance Determinant by the FAST-MCD algorithm.

use super::{complete_rows, DetectorOutput};
use crate::core::Method;
use crate::error::{OutlierError, Result};
use crate::utils::linalg::{covariance, invert_spd, log_det_spd, mahalanobis as distances};
use crate::utils::matrix::{column_means, select_rows};
use crate::utils::stats::median;
use faer::{Col, Mat};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use statrs::distribution::{ChiSquared, ContinuousCDF};

const N_STARTS: usize = 500;
const INITIAL_CSTEPS: usize = 2;
const N_REFINED: usize = 10;
const MAX_CSTEPS: usize = 100;

/// A candidate subset with its location, scatter and log-determinant.
#[derive(Debug, Clone)]
struct Candidate {
    center: Col<f64>,
    cov: Mat<f64>,
    log_det: f64,
}

/// Robust distance from a location/scatter fit on the most central `h` observations.
pub fn mcd(
    x: &Mat<f64>,
    threshold: f64,
    percentage_central: f64,
    seed: u64,
) -> Result<DetectorOutput> {
    let method = Method::Mcd;
    let p = x.ncols();
    let (cases, clean) = complete_rows(method, x, p + 2)?;
    let n = clean.nrows();
    let h = subset_size(n, p, percentage_central);

    let chi = ChiSquared::new(p as f64).map_err(|e| distribution_error(e.to_string()))?;

    let raw = fast_mcd(&clean, h, seed)?;

    // Consistency correction of the raw scatter.
    let raw_inv = invert_spd(&raw.cov).ok_or(OutlierError::SingularCovariance { method })?;
    let raw_d = distances(&clean, &raw.center, &raw_inv);
    let raw_d: Vec<f64> = raw_d.iter().copied().collect();
    let factor = median(&raw_d) / chi.inverse_cdf(0.5);
    if !(factor > 0.0) {
        return Err(OutlierError::SingularCovariance { method });
    }
    let corrected = Mat::from_fn(p, p, |i, j| raw.cov[(i, j)] * factor);

    // One re-weighting step at the 97.5% quantile.
    let inv = invert_spd(&corrected).ok_or(OutlierError::SingularCovariance { method })?;
    let d = distances(&clean, &raw.center, &inv);
    let cutoff = chi.inverse_cdf(0.975);
    let kept: Vec<usize> = (0..n).filter(|&i| d[i] <= cutoff).collect();

    let (center, cov) = if kept.len() > p {
        let subset = select_rows(&clean, &kept);
        let center = column_means(&subset);
        let cov = covariance(&subset, &center);
        let scale = reweight_consistency(p, 0.975)?;
        let cov = Mat::from_fn(p, p, |i, j| cov[(i, j)] * scale);
        (center, cov)
    } else {
        (raw.center, corrected)
    };

    let inv = invert_spd(&cov).ok_or(OutlierError::SingularCovariance { method })?;
    let d = distances(&clean, &center, &inv);
    tracing::debug!(n, h, kept = kept.len(), "mcd fit");

    Ok(DetectorOutput::above(method, cases.expand(&d), threshold))
}

/// Size of the central subset.
fn subset_size(n: usize, p: usize, percentage_central: f64) -> usize {
    let h = if percentage_central <= 0.5 {
        (n + p + 1) / 2
    } else {
        (percentage_central * n as f64).ceil() as usize
    };
    h.clamp(p + 1, n)
}

/// Consistency factor `α / P(χ²_{p+2} ≤ χ²_p(α))` for a covariance of the rows
/// inside the α-quantile.
fn reweight_consistency(p: usize, alpha: f64) -> Result<f64> {
    let q = ChiSquared::new(p as f64)
        .map_err(|e| distribution_error(e.to_string()))?
        .inverse_cdf(alpha);
    let tail = ChiSquared::new((p + 2) as f64)
        .map_err(|e| distribution_error(e.to_string()))?
        .cdf(q);
    Ok(alpha / tail)
}

fn distribution_error(reason: String) -> OutlierError {
    OutlierError::ComputationFailure {
        method: Method::Mcd,
        reason,
    }
}

fn fast_mcd(x: &Mat<f64>, h: usize, seed: u64) -> Result<Candidate> {
    let n = x.nrows();
    let p = x.ncols();
    if h == n {
        return fit(x, &(0..n).collect::<Vec<_>>()).ok_or(OutlierError::SingularCovariance {
            method: Method::Mcd,
        });
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut candidates: Vec<Candidate> = Vec::with_capacity(N_STARTS);
    for _ in 0..N_STARTS {
        let Some(start) = elemental_start(x, h, p, &mut rng) else {
            continue;
        };
        if let Some(c) = concentrate(x, h, start, INITIAL_CSTEPS) {
            candidates.push(c);
        }
    }
    if candidates.is_empty() {
        return Err(OutlierError::SingularCovariance {
            method: Method::Mcd,
        });
    }

    candidates.sort_by(|a, b| a.log_det.total_cmp(&b.log_det));
    candidates
        .into_iter()
        .take(N_REFINED)
        .filter_map(|c| concentrate(x, h, c, MAX_CSTEPS))
        .min_by(|a, b| a.log_det.total_cmp(&b.log_det))
        .ok_or(OutlierError::SingularCovariance {
            method: Method::Mcd,
        })
}

/// Fit a random `(p + 1)`-subset, growing it until its scatter is non-singular.
fn elemental_start(
    x: &Mat<f64>,
    h: usize,
    p: usize,
    rng: &mut Xoshiro256PlusPlus,
) -> Option<Candidate> {
    let n = x.nrows();
    let order = sample(rng, n, n).into_vec();
    (p + 1..=h).find_map(|size| fit(x, &order[..size]))
}

/// Concentration steps: refit on the `h` rows closest under the current fit.
fn concentrate(x: &Mat<f64>, h: usize, mut current: Candidate, steps: usize) -> Option<Candidate> {
    for _ in 0..steps {
        let inv = invert_spd(&current.cov)?;
        let d = distances(x, &current.center, &inv);
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        order.sort_by(|&a, &b| d[a].total_cmp(&d[b]));
        let next = fit(x, &order[..h])?;
        let converged = next.log_det >= current.log_det - 1e-12;
        current = next;
        if converged {
            break;
        }
    }
    Some(current)
}

fn fit(x: &Mat<f64>, rows: &[usize]) -> Option<Candidate> {
    let subset = select_rows(x, rows);
    let center = column_means(&subset);
    let cov = covariance(&subset, &center);
    let log_det = log_det_spd(&cov)?;
    Some(Candidate {
        center,
        cov,
        log_det,
    })
}
