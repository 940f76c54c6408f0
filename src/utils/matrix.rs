//! Matrix utility functions.

use faer::{Col, Mat};

/// Copy column `j` into a vector.
pub fn column(x: &Mat<f64>, j: usize) -> Vec<f64> {
    (0..x.nrows()).map(|i| x[(i, j)]).collect()
}

/// Build a matrix from the given rows of `x`, in the given order.
pub fn select_rows(x: &Mat<f64>, rows: &[usize]) -> Mat<f64> {
    Mat::from_fn(rows.len(), x.ncols(), |i, j| x[(rows[i], j)])
}

/// Column means of a complete matrix.
pub fn column_means(x: &Mat<f64>) -> Col<f64> {
    let n = x.nrows();
    Col::from_fn(x.ncols(), |j| {
        (0..n).map(|i| x[(i, j)]).sum::<f64>() / n as f64
    })
}

/// Center a matrix by subtracting a location vector.
pub fn center_columns(x: &Mat<f64>, center: &Col<f64>) -> Mat<f64> {
    Mat::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - center[j])
}

/// Standardize columns to zero mean and unit sample standard deviation.
///
/// Returns `None` if any column is constant.
pub fn scale_columns(x: &Mat<f64>) -> Option<Mat<f64>> {
    let n = x.nrows();
    if n < 2 {
        return None;
    }
    let means = column_means(x);
    let mut sds = Vec::with_capacity(x.ncols());
    for j in 0..x.ncols() {
        let ss: f64 = (0..n).map(|i| (x[(i, j)] - means[j]).powi(2)).sum();
        let sd = (ss / (n - 1) as f64).sqrt();
        if !(sd > 1e-12) {
            return None;
        }
        sds.push(sd);
    }
    Some(Mat::from_fn(n, x.ncols(), |i, j| (x[(i, j)] - means[j]) / sds[j]))
}
