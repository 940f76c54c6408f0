//! Common test utilities and data generators.
#![allow(dead_code)]

use faer::{Col, Mat};
use regress_outliers::core::Dataset;

/// Deterministic standard normal draws (LCG + Box-Muller).
pub struct Gaussian {
    state: u64,
}

impl Gaussian {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(2862933555777941757).wrapping_add(3037000493),
        }
    }

    fn uniform(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64 + 0.5) / (1u64 << 53) as f64
    }

    pub fn next(&mut self) -> f64 {
        let u1 = self.uniform();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// `n × p` independent standard normal observations.
pub fn gaussian_cloud(n: usize, p: usize, seed: u64) -> Mat<f64> {
    let mut g = Gaussian::new(seed);
    let draws: Vec<f64> = (0..n * p).map(|_| g.next()).collect();
    Mat::from_fn(n, p, |i, j| draws[i * p + j])
}

/// A Gaussian cloud whose last row is moved `shift` units along every axis.
pub fn cloud_with_outlier(n: usize, p: usize, shift: f64, seed: u64) -> Mat<f64> {
    let mut x = gaussian_cloud(n, p, seed);
    for j in 0..p {
        x[(n - 1, j)] = shift;
    }
    x
}

/// A single column holding `values`.
pub fn single_column(values: &[f64]) -> Mat<f64> {
    Mat::from_fn(values.len(), 1, |i, _| values[i])
}

/// Two interleaved groups: `a` around 0 with scale 1, `b` around 50 with scale 10.
///
/// Row 0 of group `a` is planted at 6.
pub fn grouped_dataset(n_per_group: usize, seed: u64) -> Dataset {
    let mut g = Gaussian::new(seed);
    let mut x = Vec::with_capacity(2 * n_per_group);
    let mut groups = Vec::with_capacity(2 * n_per_group);
    for i in 0..2 * n_per_group {
        if i % 2 == 0 {
            x.push(if i == 0 { 6.0 } else { g.next() });
            groups.push("a".to_string());
        } else {
            x.push(50.0 + 10.0 * g.next());
            groups.push("b".to_string());
        }
    }
    Dataset::new()
        .with_numeric("x", x)
        .expect("valid column")
        .with_categorical("group", groups)
        .expect("valid column")
}

/// Predictors and residuals of a straight-line fit with one gross residual at the
/// highest-leverage point.
pub fn line_fit_data(n: usize) -> (Mat<f64>, Col<f64>) {
    let x = Mat::from_fn(n, 1, |i, _| i as f64);
    let residuals = Col::from_fn(n, |i| {
        if i == n - 1 {
            15.0
        } else {
            0.5 * ((i as f64) * 1.3).sin()
        }
    });
    (x, residuals)
}
