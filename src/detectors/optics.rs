//! OPTICS ordering with ξ-steep cluster extraction.

use super::{complete_rows, DetectorOutput};
use crate::core::Method;
use crate::error::Result;
use faer::{Col, Mat};

/// Reachability ordering of a point set.
#[derive(Debug, Clone)]
struct Ordering {
    order: Vec<usize>,
    reachability: Vec<f64>,
    core_distance: Vec<f64>,
    predecessor: Vec<Option<usize>>,
}

/// Core distances, flagging points OPTICS leaves outside every cluster.
///
/// `threshold` is the neighbourhood size `min_pts` (rounded, at least 2).
pub fn optics(x: &Mat<f64>, threshold: f64, xi: f64) -> Result<DetectorOutput> {
    let method = Method::Optics;
    let min_pts = (threshold.round() as usize).max(2);
    let (cases, clean) = complete_rows(method, x, min_pts)?;

    let ordering = reachability_ordering(&clean, min_pts);
    let clusters = xi_clusters(&ordering, xi, min_pts, min_pts);
    let labels = cluster_labels(&ordering.order, &clusters);

    let distance = cases.expand(&Col::from_fn(clean.nrows(), |i| ordering.core_distance[i]));
    if clusters.is_empty() {
        let output = DetectorOutput {
            method,
            distance,
            outlier: vec![false; x.nrows()],
            notes: Vec::new(),
        };
        return Ok(output.with_note("optics: no cluster structure found"));
    }

    let noise: Vec<bool> = labels.iter().map(|&l| l == 0).collect();
    tracing::debug!(clusters = clusters.len(), min_pts, "optics clusters extracted");
    Ok(DetectorOutput {
        method,
        distance,
        outlier: cases.expand_flags(&noise),
        notes: Vec::new(),
    })
}

fn euclidean(x: &Mat<f64>, a: usize, b: usize) -> f64 {
    (0..x.ncols())
        .map(|j| (x[(a, j)] - x[(b, j)]).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn reachability_ordering(x: &Mat<f64>, min_pts: usize) -> Ordering {
    let n = x.nrows();
    let dist: Vec<Vec<f64>> = (0..n)
        .map(|a| (0..n).map(|b| euclidean(x, a, b)).collect())
        .collect();

    // The point itself counts towards min_pts.
    let core_distance: Vec<f64> = dist
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(f64::total_cmp);
            sorted[min_pts - 1]
        })
        .collect();

    let mut reachability = vec![f64::INFINITY; n];
    let mut predecessor = vec![None; n];
    let mut processed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    for _ in 0..n {
        // First unprocessed point with the smallest reachability.
        let Some(point) = (0..n)
            .filter(|&i| !processed[i])
            .min_by(|&a, &b| reachability[a].total_cmp(&reachability[b]).then(a.cmp(&b)))
        else {
            break;
        };
        processed[point] = true;
        order.push(point);

        for q in 0..n {
            if processed[q] {
                continue;
            }
            let reach = core_distance[point].max(dist[point][q]);
            if reach < reachability[q] {
                reachability[q] = reach;
                predecessor[q] = Some(point);
            }
        }
    }

    Ordering {
        order,
        reachability,
        core_distance,
        predecessor,
    }
}

/// A steep-down area awaiting its matching steep-up area.
#[derive(Debug, Clone)]
struct SteepDown {
    start: usize,
    end: usize,
    mib: f64,
}

/// ξ-steep cluster extraction over the reachability plot.
///
/// Returns `(start, end)` positions in the ordering, inner clusters before the
/// clusters that enclose them.
fn xi_clusters(
    ordering: &Ordering,
    xi: f64,
    min_pts: usize,
    min_cluster_size: usize,
) -> Vec<(usize, usize)> {
    let n = ordering.order.len();
    let mut plot: Vec<f64> = ordering
        .order
        .iter()
        .map(|&i| ordering.reachability[i])
        .collect();
    plot.push(f64::INFINITY);
    let preds: Vec<Option<usize>> = ordering
        .order
        .iter()
        .map(|&i| ordering.predecessor[i])
        .collect();

    let xi_complement = 1.0 - xi;
    let ratio: Vec<f64> = (0..n).map(|i| plot[i] / plot[i + 1]).collect();
    let steep_up: Vec<bool> = ratio.iter().map(|&r| r <= xi_complement).collect();
    let steep_down: Vec<bool> = ratio.iter().map(|&r| r >= 1.0 / xi_complement).collect();
    let down: Vec<bool> = ratio.iter().map(|&r| r > 1.0).collect();
    let up: Vec<bool> = ratio.iter().map(|&r| r < 1.0).collect();

    let mut sdas: Vec<SteepDown> = Vec::new();
    let mut clusters = Vec::new();
    let mut index = 0;
    let mut mib = 0.0_f64;

    for steep_index in (0..n).filter(|&i| steep_up[i] || steep_down[i]) {
        if steep_index < index {
            continue;
        }
        mib = plot[index..=steep_index].iter().fold(mib, |m, &v| m.max(v));

        if steep_down[steep_index] {
            update_sdas(&mut sdas, mib, xi_complement, &plot);
            let end = extend_region(&steep_down, &up, steep_index, min_pts);
            sdas.push(SteepDown {
                start: steep_index,
                end,
                mib: 0.0,
            });
            index = end + 1;
            mib = plot[index];
        } else {
            update_sdas(&mut sdas, mib, xi_complement, &plot);
            let u_start = steep_index;
            let u_end = extend_region(&steep_up, &down, u_start, min_pts);
            index = u_end + 1;
            mib = plot[index];

            let mut found = Vec::new();
            for d in &sdas {
                let mut c_start = d.start;
                let mut c_end = u_end;
                if plot[c_end + 1] * xi_complement < d.mib {
                    continue;
                }

                let d_max = plot[d.start];
                if d_max * xi_complement >= plot[c_end + 1] {
                    // Start at the first point level with the cluster end.
                    while c_start < d.end && plot[c_start + 1] > plot[c_end + 1] {
                        c_start += 1;
                    }
                } else if plot[c_end + 1] * xi_complement >= d_max {
                    // End at the last point not reached above the cluster start.
                    while c_end > u_start && plot[c_end] > d_max {
                        c_end -= 1;
                    }
                }

                // Points entered through a steep jump sit on the wall, not in the valley.
                while c_end > u_start && plot[c_end] * xi_complement >= plot[c_end - 1] {
                    c_end -= 1;
                }

                let Some((s, e)) =
                    correct_predecessor(&plot, &preds, &ordering.order, c_start, c_end)
                else {
                    continue;
                };
                if e - s + 1 < min_cluster_size || s > d.end || e < u_start {
                    continue;
                }
                found.push((s, e));
            }
            found.reverse();
            clusters.extend(found);
        }
    }
    clusters
}

fn update_sdas(sdas: &mut Vec<SteepDown>, mib: f64, xi_complement: f64, plot: &[f64]) {
    if mib.is_infinite() {
        sdas.clear();
        return;
    }
    sdas.retain(|d| mib <= plot[d.start] * xi_complement);
    for d in sdas.iter_mut() {
        d.mib = d.mib.max(mib);
    }
}

/// Extend a steep area while it is interrupted by at most `min_pts` flat points.
fn extend_region(steep: &[bool], xward: &[bool], start: usize, min_pts: usize) -> usize {
    let mut non_xward = 0;
    let mut end = start;
    for index in start..steep.len() {
        if steep[index] {
            non_xward = 0;
            end = index;
        } else if !xward[index] {
            non_xward += 1;
            if non_xward > min_pts {
                break;
            }
        } else {
            return end;
        }
    }
    end
}

/// Shrink a cluster from the right until its end is reachable from inside it.
fn correct_predecessor(
    plot: &[f64],
    preds: &[Option<usize>],
    order: &[usize],
    start: usize,
    mut end: usize,
) -> Option<(usize, usize)> {
    while start < end {
        if plot[start] > plot[end] {
            return Some((start, end));
        }
        if let Some(p) = preds[end] {
            if order[start..end].contains(&p) {
                return Some((start, end));
            }
        }
        end -= 1;
    }
    None
}

/// Cluster id per point (in input order): 0 for noise, otherwise the id of the
/// smallest cluster containing the point. Ids are assigned from the smallest
/// cluster upwards.
fn cluster_labels(order: &[usize], clusters: &[(usize, usize)]) -> Vec<usize> {
    let mut by_size = clusters.to_vec();
    by_size.sort_by_key(|&(start, end)| end - start);

    let mut by_position = vec![0usize; order.len()];
    for (label, &(start, end)) in (1..).zip(&by_size) {
        by_position[start..=end]
            .iter_mut()
            .filter(|l| **l == 0)
            .for_each(|l| *l = label);
    }

    let mut labels = vec![0usize; order.len()];
    for (position, &point) in order.iter().enumerate() {
        labels[point] = by_position[position];
    }
    labels
}
