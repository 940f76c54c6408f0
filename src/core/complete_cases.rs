//! Complete-case handling for multivariate detectors.
//!
//! Multivariate detectors need every variable of an observation. Rows with a
//! missing value are dropped before fitting and padded back afterwards, so the
//! detector still emits one distance per input row:
//!
//! ```
//! use regress_outliers::core::CompleteCases;
//! use faer::{Col, Mat};
//!
//! let x = Mat::from_fn(4, 2, |i, j| if i == 1 && j == 0 { f64::NAN } else { (i + j) as f64 });
//! let cases = CompleteCases::find(&x);
//! assert_eq!(cases.kept_indices, vec![0, 2, 3]);
//!
//! let d = cases.expand(&Col::from_fn(3, |i| i as f64));
//! assert_eq!(d.nrows(), 4);
//! assert!(d[1].is_nan());
//! ```

use crate::utils::select_rows;
use faer::{Col, Mat};

/// Which rows of a matrix are complete.
#[derive(Debug, Clone)]
pub struct CompleteCases {
    /// Number of rows before dropping incomplete ones.
    pub n_original: usize,

    /// Mask of incomplete rows (true = has a missing value).
    pub na_mask: Vec<bool>,

    /// Indices of complete rows, in order.
    pub kept_indices: Vec<usize>,
}

impl CompleteCases {
    /// Scan `x` for rows holding a non-finite value.
    pub fn find(x: &Mat<f64>) -> Self {
        let na_mask: Vec<bool> = (0..x.nrows())
            .map(|i| (0..x.ncols()).any(|j| !x[(i, j)].is_finite()))
            .collect();
        let kept_indices = na_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &had_na)| if had_na { None } else { Some(i) })
            .collect();

        Self {
            n_original: x.nrows(),
            na_mask,
            kept_indices,
        }
    }

    pub fn n_complete(&self) -> usize {
        self.kept_indices.len()
    }

    pub fn n_removed(&self) -> usize {
        self.n_original - self.kept_indices.len()
    }

    pub fn has_removed(&self) -> bool {
        self.n_removed() > 0
    }

    /// The complete rows of `x`.
    pub fn subset(&self, x: &Mat<f64>) -> Mat<f64> {
        if !self.has_removed() {
            return x.to_owned();
        }
        select_rows(x, &self.kept_indices)
    }

    /// Expand per-complete-row values to the original length, `NaN` elsewhere.
    pub fn expand(&self, clean_values: &Col<f64>) -> Col<f64> {
        if !self.has_removed() {
            return clean_values.to_owned();
        }

        let mut expanded = Col::from_fn(self.n_original, |_| f64::NAN);
        for (clean_idx, &orig_idx) in self.kept_indices.iter().enumerate() {
            expanded[orig_idx] = clean_values[clean_idx];
        }
        expanded
    }

    /// Expand per-complete-row flags to the original length, `false` elsewhere.
    pub fn expand_flags(&self, clean_flags: &[bool]) -> Vec<bool> {
        let mut expanded = vec![false; self.n_original];
        for (clean_idx, &orig_idx) in self.kept_indices.iter().enumerate() {
            expanded[orig_idx] = clean_flags[clean_idx];
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_na() -> Mat<f64> {
        Mat::from_fn(5, 2, |i, j| {
            if (i == 2 && j == 0) || (i == 3 && j == 1) {
                f64::NAN
            } else {
                (i * 2 + j) as f64
            }
        })
    }

    #[test]
    fn test_find_incomplete_rows() {
        let cases = CompleteCases::find(&with_na());
        assert_eq!(cases.kept_indices, vec![0, 1, 4]);
        assert_eq!(cases.n_removed(), 2);
        assert!(cases.has_removed());
        assert_eq!(cases.subset(&with_na()).nrows(), 3);
    }

    #[test]
    fn test_expand() {
        let cases = CompleteCases::find(&with_na());
        let expanded = cases.expand(&Col::from_fn(3, |i| (i + 1) as f64));
        assert_eq!(expanded.nrows(), 5);
        assert_eq!(expanded[0], 1.0);
        assert_eq!(expanded[1], 2.0);
        assert!(expanded[2].is_nan());
        assert!(expanded[3].is_nan());
        assert_eq!(expanded[4], 3.0);

        let flags = cases.expand_flags(&[false, true, true]);
        assert_eq!(flags, vec![false, true, false, false, true]);
    }

    #[test]
    fn test_clean_matrix_passes_through() {
        let x = Mat::from_fn(3, 2, |i, j| (i + j) as f64);
        let cases = CompleteCases::find(&x);
        assert!(!cases.has_removed());
        let values = Col::from_fn(3, |i| i as f64);
        assert_eq!(cases.expand(&values).nrows(), 3);
    }

    #[test]
    fn test_all_incomplete() {
        let x = Mat::from_fn(3, 2, |_, _| f64::NAN);
        let cases = CompleteCases::find(&x);
        assert_eq!(cases.n_complete(), 0);
    }
}
