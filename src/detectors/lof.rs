//! Local Outlier Factor.

use super::{complete_rows, DetectorOutput};
use crate::core::{standard_normal_quantile, Method};
use crate::error::Result;
use crate::utils::stats::{finite, std_dev};
use faer::{Col, Mat};

/// Log local outlier factor with `max(k − 1, 1)` neighbours, `k` the number of
/// columns. Flags distances above `Φ⁻¹(1 − threshold) · sd(distance)`.
pub fn lof(x: &Mat<f64>, threshold: f64) -> Result<DetectorOutput> {
    let method = Method::Lof;
    let k = x.ncols().saturating_sub(1).max(1);
    let (cases, clean) = complete_rows(method, x, k + 1)?;

    let factors = local_outlier_factor(&clean, k);
    let d = Col::from_fn(clean.nrows(), |i| factors[i].ln());

    let spread = std_dev(&finite(&d.iter().copied().collect::<Vec<_>>()), 1);
    let cutoff = standard_normal_quantile(1.0 - threshold) * spread;

    Ok(DetectorOutput::above(method, cases.expand(&d), cutoff))
}

/// LOF per point. Neighbourhoods include every point tied at the k-distance; a
/// factor that is undefined because of duplicate points counts as 1.
fn local_outlier_factor(x: &Mat<f64>, k: usize) -> Vec<f64> {
    let n = x.nrows();
    let dist = |a: usize, b: usize| -> f64 {
        (0..x.ncols())
            .map(|j| (x[(a, j)] - x[(b, j)]).powi(2))
            .sum::<f64>()
            .sqrt()
    };

    let mut k_distance = vec![0.0; n];
    let mut neighbours: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
    for a in 0..n {
        let mut others: Vec<(usize, f64)> = (0..n)
            .filter(|&b| b != a)
            .map(|b| (b, dist(a, b)))
            .collect();
        others.sort_by(|l, r| l.1.total_cmp(&r.1));
        let kd = others[k - 1].1;
        k_distance[a] = kd;
        others.retain(|&(_, d)| d <= kd);
        neighbours.push(others);
    }

    let lrd: Vec<f64> = (0..n)
        .map(|a| {
            let reach: f64 = neighbours[a]
                .iter()
                .map(|&(b, d)| d.max(k_distance[b]))
                .sum();
            neighbours[a].len() as f64 / reach
        })
        .collect();

    (0..n)
        .map(|a| {
            let ratio: f64 = neighbours[a].iter().map(|&(b, _)| lrd[b]).sum::<f64>()
                / (neighbours[a].len() as f64 * lrd[a]);
            if ratio.is_nan() {
                1.0
            } else {
                ratio
            }
        })
        .collect()
}
