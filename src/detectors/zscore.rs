//! Parametric and robust z-scores.

use super::{row_max, DetectorOutput};
use crate::core::Method;
use crate::utils::column;
use crate::utils::stats::{finite, mad, mean, median, std_dev};
use faer::{Col, Mat};

/// Max absolute `(x − mean) / sd` across columns, `sd` dividing by n.
pub fn zscore(x: &Mat<f64>, threshold: f64) -> DetectorOutput {
    scored(x, Method::Zscore, threshold, |v| (mean(v), std_dev(v, 0)))
}

/// Max absolute `(x − median) / MAD` across columns.
pub fn zscore_robust(x: &Mat<f64>, threshold: f64) -> DetectorOutput {
    scored(x, Method::ZscoreRobust, threshold, |v| (median(v), mad(v)))
}

fn scored(
    x: &Mat<f64>,
    method: Method,
    threshold: f64,
    location_scale: impl Fn(&[f64]) -> (f64, f64),
) -> DetectorOutput {
    let n = x.nrows();
    let mut cells = Mat::from_fn(n, x.ncols(), |_, _| f64::NAN);

    for j in 0..x.ncols() {
        let values = column(x, j);
        let present = finite(&values);
        if present.is_empty() {
            continue;
        }
        let (center, scale) = location_scale(&present);
        for (i, &v) in values.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            cells[(i, j)] = standardized(v, center, scale);
        }
    }

    let distance = Col::from_fn(n, |i| row_max(&cells, i));
    DetectorOutput::above(method, distance, threshold)
}

/// Absolute standardized value. With zero scale, values at the center score 0 and
/// any other value is infinitely far.
fn standardized(v: f64, center: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        ((v - center) / scale).abs()
    } else if v == center {
        0.0
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single(values: &[f64]) -> Mat<f64> {
        Mat::from_fn(values.len(), 1, |i, _| values[i])
    }

    #[test]
    fn test_zscore_flags_extreme_value() {
        let out = zscore(&single(&[1.0, 2.0, 3.0, 4.0, 100.0]), 1.959964);
        assert_eq!(out.outlier, vec![false, false, false, false, true]);
        // mean 22, population variance 1522
        assert_relative_eq!(out.distance[4], 78.0 / 1522f64.sqrt(), epsilon = 1e-10);
        let max_idx = (0..5)
            .max_by(|&a, &b| out.distance[a].total_cmp(&out.distance[b]))
            .unwrap();
        assert_eq!(max_idx, 4);
    }

    #[test]
    fn test_row_max_across_columns() {
        let x = Mat::from_fn(4, 2, |i, j| if j == 0 { i as f64 } else { -(i as f64) * 3.0 });
        let out = zscore(&x, 10.0);
        // Both columns are standardized to the same scores.
        assert_relative_eq!(out.distance[0], out.distance[3], epsilon = 1e-12);
    }

    #[test]
    fn test_constant_column_scores_zero() {
        let out = zscore(&single(&[5.0, 5.0, 5.0]), 1.96);
        assert!(out.distance.iter().all(|&d| d == 0.0));
        assert!(out.outlier.iter().all(|&f| !f));
    }

    #[test]
    fn test_missing_cells_are_ignored() {
        let x = Mat::from_fn(5, 2, |i, j| match (i, j) {
            (2, 0) => f64::NAN,
            (_, 0) => i as f64,
            (_, _) => f64::NAN,
        });
        let out = zscore(&x, 1.96);
        assert_eq!(out.len(), 5);
        assert!(out.distance[2].is_nan());
        assert!(!out.outlier[2]);
        assert!(out.distance[0].is_finite());
    }

    #[test]
    fn test_robust_zscore() {
        let out = zscore_robust(&single(&[1.0, 2.0, 3.0, 4.0, 100.0]), 1.959964);
        // median 3, MAD = 1.4826
        assert_relative_eq!(out.distance[4], 97.0 / 1.4826, epsilon = 1e-8);
        assert_eq!(out.outlier, vec![false, false, false, false, true]);

        let degenerate = zscore_robust(&single(&[1.0, 1.0, 1.0, 1.0, 9.0]), 1.96);
        assert_eq!(degenerate.distance[0], 0.0);
        assert!(degenerate.outlier[4]);
    }
}
