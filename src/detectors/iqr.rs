//! Tukey fences around the interquartile range.

use super::{row_mean, DetectorOutput};
use crate::core::Method;
use crate::utils::column;
use crate::utils::stats::{quantile_sorted, sorted_finite};
use faer::{Col, Mat};

/// Per-column test against `[Q1 − t·IQR, Q3 + t·IQR]`.
///
/// The distance is the share of a row's columns outside their fences; a row is
/// flagged if any column is outside.
pub fn iqr(x: &Mat<f64>, threshold: f64) -> DetectorOutput {
    let n = x.nrows();
    let mut cells = Mat::from_fn(n, x.ncols(), |_, _| f64::NAN);

    for j in 0..x.ncols() {
        let values = column(x, j);
        let sorted = sorted_finite(&values);
        if sorted.is_empty() {
            continue;
        }
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let spread = q3 - q1;
        let lower = q1 - threshold * spread;
        let upper = q3 + threshold * spread;
        for (i, &v) in values.iter().enumerate() {
            if v.is_finite() {
                cells[(i, j)] = if v < lower || v > upper { 1.0 } else { 0.0 };
            }
        }
    }

    let distance = Col::from_fn(n, |i| row_mean(&cells, i));
    let outlier = (0..n)
        .map(|i| (0..x.ncols()).any(|j| cells[(i, j)] == 1.0))
        .collect();
    DetectorOutput {
        method: Method::Iqr,
        distance,
        outlier,
        notes: Vec::new(),
    }
}
