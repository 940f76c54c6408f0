//! Leverage and Cook's distance for least-squares fits.

use faer::{Col, Mat};

/// Design matrix with an optional leading intercept column.
fn design_matrix(x: &Mat<f64>, with_intercept: bool) -> Mat<f64> {
    if with_intercept {
        Mat::from_fn(x.nrows(), x.ncols() + 1, |i, j| {
            if j == 0 {
                1.0
            } else {
                x[(i, j - 1)]
            }
        })
    } else {
        x.to_owned()
    }
}

/// `(X'X)^(-1)` by QR decomposition and back-substitution.
///
/// Columns with a vanishing pivot are left at zero, which drops them from the
/// hat matrix.
fn crossprod_inverse(design: &Mat<f64>) -> Mat<f64> {
    let xtx = design.transpose() * design;
    let p = xtx.nrows();
    let qr = xtx.qr();
    let q = qr.compute_Q();
    let r = qr.R().to_owned();

    let mut inv = Mat::zeros(p, p);
    for col in 0..p {
        for i in (0..p).rev() {
            if r[(i, i)].abs() < 1e-14 {
                continue;
            }
            let mut sum = q[(col, i)];
            for j in (i + 1)..p {
                sum -= r[(i, j)] * inv[(j, col)];
            }
            inv[(i, col)] = sum / r[(i, i)];
        }
    }
    inv
}

/// Diagonal of the hat matrix `H = X(X'X)^(-1)X'`.
///
/// Each value lies in [0, 1] and they sum to the number of parameters.
pub fn compute_leverage(x: &Mat<f64>, with_intercept: bool) -> Col<f64> {
    let design = design_matrix(x, with_intercept);
    let p = design.ncols();
    let inv = crossprod_inverse(&design);

    Col::from_fn(design.nrows(), |i| {
        let mut h = 0.0;
        for a in 0..p {
            for b in 0..p {
                h += design[(i, a)] * inv[(a, b)] * design[(i, b)];
            }
        }
        h.clamp(0.0, 1.0)
    })
}

/// Cook's distance `D_i = e_i² h_ii / (p · MSE · (1 − h_ii)²)`.
///
/// Returns `NaN` everywhere if the MSE is not positive.
pub fn cooks_distance(
    residuals: &Col<f64>,
    leverage: &Col<f64>,
    mse: f64,
    n_params: usize,
) -> Col<f64> {
    let n = residuals.nrows();
    if !(mse > 0.0) || !mse.is_finite() || n_params == 0 {
        return Col::from_fn(n, |_| f64::NAN);
    }

    Col::from_fn(n, |i| {
        let e = residuals[i];
        let h = leverage[i];
        let one_minus_h = (1.0 - h).max(1e-14);
        let d = e * e * h / (n_params as f64 * mse * one_minus_h * one_minus_h);
        if d.is_finite() {
            d.max(0.0)
        } else {
            f64::NAN
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn predictors() -> Mat<f64> {
        Mat::from_fn(30, 2, |i, j| {
            if j == 0 {
                i as f64
            } else {
                (i as f64).sin()
            }
        })
    }

    #[test]
    fn test_leverage_sums_to_parameter_count() {
        let h = compute_leverage(&predictors(), true);
        let sum: f64 = h.iter().sum();
        assert_relative_eq!(sum, 3.0, epsilon = 1e-6);
        assert!(h.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_leverage_simple_regression() {
        // h_ii = 1/n + (x_i - x̄)² / Σ(x - x̄)² for one predictor with intercept.
        let x = Mat::from_fn(5, 1, |i, _| i as f64);
        let h = compute_leverage(&x, true);
        assert_relative_eq!(h[0], 0.2 + 4.0 / 10.0, epsilon = 1e-10);
        assert_relative_eq!(h[2], 0.2, epsilon = 1e-10);
    }

    #[test]
    fn test_cooks_distance() {
        let residuals = Col::from_fn(4, |i| [1.0, -1.0, 0.0, 2.0][i]);
        let leverage = Col::from_fn(4, |_| 0.5);
        let d = cooks_distance(&residuals, &leverage, 1.0, 2);
        assert_relative_eq!(d[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(d[2], 0.0);
        assert_relative_eq!(d[3], 4.0, epsilon = 1e-12);

        let bad = cooks_distance(&residuals, &leverage, 0.0, 2);
        assert!(bad.iter().all(|v| v.is_nan()));
    }
}
