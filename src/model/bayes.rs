//! Adapter for Bayesian models with leave-one-out diagnostics.

use super::{FittedModel, LooDiagnostics, MethodPolicy, ModelCapability};
use crate::core::NumericData;
use crate::error::{OutlierError, Result};
use faer::{Col, Mat};

/// A Bayesian model fitted elsewhere: its predictors and the Pareto-k values of
/// its PSIS leave-one-out fit.
#[derive(Debug, Clone)]
pub struct BayesianModelFit {
    predictors: NumericData,
    pareto_k: Col<f64>,
    class: String,
    policy: MethodPolicy,
}

impl BayesianModelFit {
    pub fn new(x: Mat<f64>, pareto_k: Col<f64>) -> Result<Self> {
        if x.nrows() != pareto_k.nrows() {
            return Err(OutlierError::DimensionMismatch {
                what: "pareto_k".to_string(),
                expected: x.nrows(),
                got: pareto_k.nrows(),
            });
        }
        Ok(Self {
            predictors: NumericData::from_matrix(x),
            pareto_k,
            class: "bayesian".to_string(),
            policy: MethodPolicy::Unrestricted,
        })
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Restrict the methods this model accepts.
    pub fn with_policy(mut self, policy: MethodPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl LooDiagnostics for BayesianModelFit {
    fn pareto_k(&self) -> Col<f64> {
        self.pareto_k.clone()
    }
}

impl FittedModel for BayesianModelFit {
    fn model_class(&self) -> &str {
        &self.class
    }

    fn numeric_matrix(&self) -> NumericData {
        self.predictors.clone()
    }

    fn capability(&self) -> ModelCapability<'_> {
        ModelCapability::Bayesian(self)
    }

    fn method_policy(&self) -> MethodPolicy {
        self.policy.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bayesian_capability() {
        let fit = BayesianModelFit::new(
            Mat::from_fn(3, 1, |i, _| i as f64),
            Col::from_fn(3, |i| 0.1 * i as f64),
        )
        .unwrap();
        assert!(fit.is_bayesian());
        assert_eq!(fit.capability().model_method(), Some(crate::core::Method::Pareto));
        assert_eq!(fit.pareto_k()[2], 0.2);
    }

    #[test]
    fn test_length_mismatch() {
        let res = BayesianModelFit::new(Mat::zeros(3, 1), Col::zeros(2));
        assert!(matches!(res, Err(OutlierError::DimensionMismatch { expected: 3, got: 2, .. })));
    }
}
