//! Detectors that read diagnostics from a fitted model.

use super::DetectorOutput;
use crate::core::Method;
use crate::error::{OutlierError, Result};
use crate::model::{FittedModel, ModelCapability};
use faer::Col;

/// Cook's distance, flagging values above `threshold`.
pub fn cook(model: &dyn FittedModel, n_rows: usize, threshold: f64) -> Result<DetectorOutput> {
    let method = Method::Cook;
    let ModelCapability::Frequentist(diagnostics) = model.capability() else {
        return Err(OutlierError::ModelCapabilityMissing {
            method,
            required: "a frequentist model with influence diagnostics",
        });
    };
    let d = checked_len(method, diagnostics.cooks_distance(), n_rows)?;
    Ok(DetectorOutput::above(method, d, threshold))
}

/// Pareto-k leave-one-out diagnostic, flagging values above `threshold`.
pub fn pareto(model: &dyn FittedModel, n_rows: usize, threshold: f64) -> Result<DetectorOutput> {
    let method = Method::Pareto;
    let ModelCapability::Bayesian(diagnostics) = model.capability() else {
        return Err(OutlierError::ModelCapabilityMissing {
            method,
            required: "a Bayesian model with leave-one-out diagnostics",
        });
    };
    let d = checked_len(method, diagnostics.pareto_k(), n_rows)?;
    Ok(DetectorOutput::above(method, d, threshold))
}

fn checked_len(method: Method, d: Col<f64>, n_rows: usize) -> Result<Col<f64>> {
    if d.nrows() != n_rows {
        return Err(OutlierError::DimensionMismatch {
            what: format!("{method} diagnostics"),
            expected: n_rows,
            got: d.nrows(),
        });
    }
    Ok(d)
}
