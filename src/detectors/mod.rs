//! Outlier detectors.
//!
//! Each detector maps the numeric observation matrix (or a fitted model) and a
//! threshold to one distance and one flag per observation. Row count and order are
//! always preserved; observations a detector cannot score get a `NaN` distance and
//! are never flagged.
//!
//! | Method | Distance | Flag |
//! |--------|----------|------|
//! | `zscore`, `zscore_robust` | row max of per-column absolute scores | distance > threshold |
//! | `iqr` | row mean of per-column fence tests | any column outside the fences |
//! | `ci`, `eti`, `hdi`, `bci` | row mean of per-column interval tests | distance > 0 |
//! | `mahalanobis`, `mahalanobis_robust`, `mcd` | squared generalised distance | distance > threshold |
//! | `ics` | squared norm of selected invariant coordinates | distance > simulated cutoff |
//! | `optics` | core distance | point in the noise cluster |
//! | `lof` | log local outlier factor | distance > Φ⁻¹(1 − threshold) · sd |
//! | `cook`, `pareto` | model diagnostic | distance > threshold |

mod ics;
mod interval;
mod iqr;
mod lof;
mod mahalanobis;
mod mcd;
mod model;
mod optics;
mod zscore;

pub use ics::ics;
pub use interval::{bci, eti, hdi};
pub use iqr::iqr;
pub use lof::lof;
pub use mahalanobis::{mahalanobis, mahalanobis_robust};
pub use mcd::mcd;
pub use model::{cook, pareto};
pub use optics::optics;
pub use zscore::{zscore, zscore_robust};

use crate::core::{CompleteCases, Method, OutlierOptions};
use crate::error::{OutlierError, Result};
use crate::model::FittedModel;
use faer::{Col, Mat};

/// Output of one detector.
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    pub method: Method,
    pub distance: Col<f64>,
    pub outlier: Vec<bool>,
    /// Remarks worth surfacing as warnings, such as "no cluster found".
    pub notes: Vec<String>,
}

impl DetectorOutput {
    /// Flag every distance strictly above `cutoff`.
    pub(crate) fn above(method: Method, distance: Col<f64>, cutoff: f64) -> Self {
        let outlier = distance.iter().map(|&d| d > cutoff).collect();
        Self {
            method,
            distance,
            outlier,
            notes: Vec::new(),
        }
    }

    pub(crate) fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn len(&self) -> usize {
        self.outlier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlier.is_empty()
    }
}

/// Everything a detector may read.
#[derive(Clone, Copy)]
pub struct DetectorContext<'a> {
    /// Numeric observations, one row per observation.
    pub data: &'a Mat<f64>,
    /// The fitted model, for model-based detectors.
    pub model: Option<&'a dyn FittedModel>,
    pub options: &'a OutlierOptions,
}

/// Run `method` with an already validated threshold.
pub fn run_detector(
    method: Method,
    threshold: f64,
    ctx: &DetectorContext<'_>,
) -> Result<DetectorOutput> {
    let x = ctx.data;
    let options = ctx.options;
    match method {
        Method::Zscore => Ok(zscore(x, threshold)),
        Method::ZscoreRobust => Ok(zscore_robust(x, threshold)),
        Method::Iqr => Ok(iqr(x, threshold)),
        Method::Ci => eti(x, threshold).map(|o| relabel(o, Method::Ci)),
        Method::Eti => eti(x, threshold),
        Method::Hdi => hdi(x, threshold),
        Method::Bci => bci(x, threshold),
        Method::Cook => cook(model_for(method, ctx)?, x.nrows(), threshold),
        Method::Pareto => pareto(model_for(method, ctx)?, x.nrows(), threshold),
        Method::Mahalanobis => mahalanobis(x, threshold),
        Method::MahalanobisRobust => mahalanobis_robust(x, threshold),
        Method::Mcd => mcd(x, threshold, options.percentage_central, options.seed),
        Method::Ics => ics(
            x,
            threshold,
            options.ics_level,
            options.ics_simulations,
            options.seed,
        ),
        Method::Optics => optics(x, threshold, options.optics_xi),
        Method::Lof => lof(x, threshold),
    }
}

fn relabel(mut output: DetectorOutput, method: Method) -> DetectorOutput {
    output.method = method;
    output
}

fn model_for<'a>(method: Method, ctx: &DetectorContext<'a>) -> Result<&'a dyn FittedModel> {
    ctx.model.ok_or(OutlierError::ModelCapabilityMissing {
        method,
        required: "a fitted model",
    })
}

/// Complete rows of `x`, failing if fewer than `needed` remain.
pub(crate) fn complete_rows(
    method: Method,
    x: &Mat<f64>,
    needed: usize,
) -> Result<(CompleteCases, Mat<f64>)> {
    let cases = CompleteCases::find(x);
    if cases.n_complete() < needed {
        return Err(OutlierError::InsufficientObservations {
            method,
            needed,
            got: cases.n_complete(),
        });
    }
    let clean = cases.subset(x);
    Ok((cases, clean))
}

/// Row maximum ignoring missing cells; `NaN` if the whole row is missing.
pub(crate) fn row_max(cells: &Mat<f64>, i: usize) -> f64 {
    (0..cells.ncols())
        .map(|j| cells[(i, j)])
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
}

/// Row mean ignoring missing cells; `NaN` if the whole row is missing.
pub(crate) fn row_mean(cells: &Mat<f64>, i: usize) -> f64 {
    crate::utils::stats::finite_mean((0..cells.ncols()).map(|j| cells[(i, j)]))
}
