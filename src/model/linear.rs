//! Adapter for least-squares fits.

use super::influence::{compute_leverage, cooks_distance};
use super::{FittedModel, InfluenceDiagnostics, MethodPolicy, ModelCapability};
use crate::core::NumericData;
use crate::error::{OutlierError, Result};
use faer::{Col, Mat};

/// A least-squares model fitted elsewhere: its predictors and residuals.
#[derive(Debug, Clone)]
pub struct LinearModelFit {
    predictors: NumericData,
    residuals: Col<f64>,
    with_intercept: bool,
    class: String,
    policy: MethodPolicy,
}

impl LinearModelFit {
    /// Wrap predictors (`n × p`) and residuals (`n`).
    pub fn new(x: Mat<f64>, residuals: Col<f64>, with_intercept: bool) -> Result<Self> {
        if x.nrows() != residuals.nrows() {
            return Err(OutlierError::DimensionMismatch {
                what: "residuals".to_string(),
                expected: x.nrows(),
                got: residuals.nrows(),
            });
        }
        Ok(Self {
            predictors: NumericData::from_matrix(x),
            residuals,
            with_intercept,
            class: "lm".to_string(),
            policy: MethodPolicy::Unrestricted,
        })
    }

    /// Name the predictors.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.predictors.n_cols() {
            return Err(OutlierError::DimensionMismatch {
                what: "predictor names".to_string(),
                expected: self.predictors.n_cols(),
                got: names.len(),
            });
        }
        self.predictors.names = names;
        Ok(self)
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_policy(mut self, policy: MethodPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of coefficients, intercept included.
    pub fn n_params(&self) -> usize {
        self.predictors.n_cols() + usize::from(self.with_intercept)
    }

    /// Residual mean square `RSS / (n − p)`; `NaN` without residual degrees of freedom.
    pub fn mse(&self) -> f64 {
        let n = self.residuals.nrows();
        let p = self.n_params();
        if n <= p {
            return f64::NAN;
        }
        let rss: f64 = self.residuals.iter().map(|e| e * e).sum();
        rss / (n - p) as f64
    }
}

impl InfluenceDiagnostics for LinearModelFit {
    fn leverage(&self) -> Col<f64> {
        compute_leverage(&self.predictors.matrix, self.with_intercept)
    }

    fn cooks_distance(&self) -> Col<f64> {
        cooks_distance(&self.residuals, &self.leverage(), self.mse(), self.n_params())
    }
}

impl FittedModel for LinearModelFit {
    fn model_class(&self) -> &str {
        &self.class
    }

    fn numeric_matrix(&self) -> NumericData {
        self.predictors.clone()
    }

    fn capability(&self) -> ModelCapability<'_> {
        ModelCapability::Frequentist(self)
    }

    fn method_policy(&self) -> MethodPolicy {
        self.policy.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit() -> LinearModelFit {
        let x = Mat::from_fn(10, 1, |i, _| i as f64);
        let residuals = Col::from_fn(10, |i| if i == 9 { 5.0 } else { 0.1 * (i as f64 - 4.5) });
        LinearModelFit::new(x, residuals, true).unwrap()
    }

    #[test]
    fn test_capability_is_frequentist() {
        let fit = fit();
        assert!(!fit.is_bayesian());
        assert!(matches!(fit.capability(), ModelCapability::Frequentist(_)));
        assert_eq!(fit.model_class(), "lm");
    }

    #[test]
    fn test_cooks_distance_peaks_at_influential_point() {
        let d = fit().cooks_distance();
        let max_idx = (0..d.nrows())
            .max_by(|&a, &b| d[a].total_cmp(&d[b]))
            .unwrap();
        assert_eq!(max_idx, 9);
    }

    #[test]
    fn test_dimension_checks() {
        let x = Mat::from_fn(4, 1, |i, _| i as f64);
        assert!(LinearModelFit::new(x.clone(), Col::zeros(3), true).is_err());
        let fit = LinearModelFit::new(x, Col::zeros(4), true).unwrap();
        assert!(fit.clone().with_names(vec!["a".into(), "b".into()]).is_err());
        assert_eq!(
            fit.with_names(vec!["dose".into()]).unwrap().numeric_matrix().names,
            vec!["dose"]
        );
    }
}
