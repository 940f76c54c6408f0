//! Covariance helpers for the distance-based detectors.
//!
//! Decompositions come from faer; the wrappers here only rescale badly conditioned
//! scatter matrices and turn a failed or near-singular factorization into `None`.

use super::matrix::center_columns;
use faer::linalg::solvers::{DenseSolveCore, Llt};
use faer::{Col, Mat, Side};

/// Relative tolerance below which a pivot or eigenvalue counts as zero.
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Sample covariance matrix (n − 1 denominator) around `center`.
pub fn covariance(x: &Mat<f64>, center: &Col<f64>) -> Mat<f64> {
    let denom = (x.nrows().max(2) - 1) as f64;
    let centered = center_columns(x, center);
    let gram = centered.transpose() * &centered;
    Mat::from_fn(gram.nrows(), gram.ncols(), |i, j| gram[(i, j)] / denom)
}

/// Cholesky factor of the correlation form of `a`, with the square roots of its
/// diagonal.
///
/// Working on the unit-diagonal matrix keeps the pivot test meaningful when
/// variables live on very different scales.
fn scaled_llt(a: &Mat<f64>) -> Option<(Llt<f64>, Vec<f64>)> {
    let p = a.nrows();
    let mut scale = Vec::with_capacity(p);
    for i in 0..p {
        let d = a[(i, i)];
        if !(d > 0.0) || !d.is_finite() {
            return None;
        }
        scale.push(d.sqrt());
    }
    let r = Mat::from_fn(p, p, |i, j| a[(i, j)] / (scale[i] * scale[j]));
    let llt = r.llt(Side::Lower).ok()?;

    let l = llt.L();
    if (0..p).any(|j| l[(j, j)] * l[(j, j)] <= SINGULAR_TOLERANCE) {
        return None;
    }
    Some((llt, scale))
}

/// Inverse of a symmetric positive definite matrix; `None` if (near) singular.
pub fn invert_spd(a: &Mat<f64>) -> Option<Mat<f64>> {
    let (llt, scale) = scaled_llt(a)?;
    let r_inv = llt.inverse();
    Some(Mat::from_fn(a.nrows(), a.ncols(), |i, j| {
        r_inv[(i, j)] / (scale[i] * scale[j])
    }))
}

/// Natural log of the determinant of an SPD matrix; `None` if (near) singular.
pub fn log_det_spd(a: &Mat<f64>) -> Option<f64> {
    let (llt, scale) = scaled_llt(a)?;
    let l = llt.L();
    let log_det_r: f64 = (0..a.nrows()).map(|i| 2.0 * l[(i, i)].ln()).sum();
    let log_diag: f64 = scale.iter().map(|s| 2.0 * s.ln()).sum();
    Some(log_det_r + log_diag)
}

/// Eigen-decomposition of a symmetric matrix.
///
/// Returns eigenvalues in decreasing order and the matching eigenvectors as columns.
pub fn symmetric_eigen(a: &Mat<f64>) -> Option<(Vec<f64>, Mat<f64>)> {
    let evd = a.self_adjoint_eigen(Side::Lower).ok()?;
    let values = evd.S().column_vector().iter().rev().copied().collect();
    let vectors = evd.U().reverse_cols().to_owned();
    Some((values, vectors))
}

/// `true` when every value is a positive, non-negligible share of the first.
fn well_conditioned(descending: &[f64]) -> bool {
    let largest = descending.first().copied().unwrap_or(0.0);
    largest > 0.0 && descending.iter().all(|&l| l > SINGULAR_TOLERANCE * largest)
}

/// `a^(-1/2)` for a symmetric positive definite matrix.
pub fn inverse_sqrt_spd(a: &Mat<f64>) -> Option<Mat<f64>> {
    let (values, vectors) = symmetric_eigen(a)?;
    if !well_conditioned(&values) {
        return None;
    }
    let p = a.nrows();
    let scaled = Mat::from_fn(p, p, |i, k| vectors[(i, k)] / values[k].sqrt());
    Some(&scaled * vectors.transpose())
}

/// Left singular vectors of a full-column-rank matrix; `None` if rank deficient.
pub fn left_singular_vectors(x: &Mat<f64>) -> Option<Mat<f64>> {
    let svd = x.thin_svd().ok()?;
    let singular: Vec<f64> = svd.S().column_vector().iter().copied().collect();
    if !well_conditioned(&singular) {
        return None;
    }
    Some(svd.U().to_owned())
}

/// Squared Mahalanobis distance of each row of `x` from `center`.
pub fn mahalanobis(x: &Mat<f64>, center: &Col<f64>, inv_cov: &Mat<f64>) -> Col<f64> {
    let diff = center_columns(x, center);
    let projected = &diff * inv_cov;
    Col::from_fn(x.nrows(), |i| {
        (0..x.ncols())
            .map(|j| projected[(i, j)] * diff[(i, j)])
            .sum::<f64>()
            .max(0.0)
    })
}
