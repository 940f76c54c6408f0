//! Model introspection for model-based outlier detectors.
//!
//! Detectors that need a fitted model (`cook`, `pareto`) do not inspect model
//! types. They ask the model for a [`ModelCapability`] and use whichever
//! diagnostics it exposes:
//!
//! - **Frequentist** models provide leverage and Cook's distance
//! - **Bayesian** models provide Pareto-k leave-one-out diagnostics
//! - **Unsupported** models explain why no detector applies
//!
//! # Example
//!
//! ```rust,ignore
//! use regress_outliers::model::{FittedModel, LinearModelFit};
//!
//! let fit = LinearModelFit::new(x, residuals, true)?;
//! assert!(!fit.is_bayesian());
//! let cooks = fit.cooks_distance();
//! ```

mod bayes;
mod influence;
mod linear;
mod unsupported;

pub use bayes::BayesianModelFit;
pub use influence::{compute_leverage, cooks_distance};
pub use linear::LinearModelFit;
pub use unsupported::UnsupportedModel;

use crate::core::{Method, NumericData};
use faer::Col;

/// Influence diagnostics of a frequentist model.
pub trait InfluenceDiagnostics: Send + Sync {
    /// Diagonal of the hat matrix.
    fn leverage(&self) -> Col<f64>;

    /// Cook's distance per observation.
    fn cooks_distance(&self) -> Col<f64>;
}

/// Leave-one-out diagnostics of a Bayesian model.
pub trait LooDiagnostics: Send + Sync {
    /// Generalised Pareto shape estimate per observation.
    fn pareto_k(&self) -> Col<f64>;
}

/// What a fitted model can provide to the detectors.
pub enum ModelCapability<'a> {
    Frequentist(&'a dyn InfluenceDiagnostics),
    Bayesian(&'a dyn LooDiagnostics),
    /// No detector applies; `reason` is reported to the caller.
    Unsupported { reason: String },
}

impl ModelCapability<'_> {
    /// The model detector `"all"` adds for this capability.
    pub fn model_method(&self) -> Option<Method> {
        match self {
            ModelCapability::Frequentist(_) => Some(Method::Cook),
            ModelCapability::Bayesian(_) => Some(Method::Pareto),
            ModelCapability::Unsupported { .. } => None,
        }
    }
}

/// Which methods a model class accepts.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MethodPolicy {
    #[default]
    Unrestricted,
    /// Methods outside `allowed` are replaced by `fallback`.
    Restricted {
        allowed: Vec<Method>,
        fallback: Method,
    },
}

impl MethodPolicy {
    /// Apply the policy to a resolved method list, keeping order and dropping
    /// duplicates introduced by the fallback.
    pub fn apply(&self, methods: &[Method]) -> Vec<Method> {
        match self {
            MethodPolicy::Unrestricted => methods.to_vec(),
            MethodPolicy::Restricted { allowed, fallback } => {
                let mut out: Vec<Method> = Vec::with_capacity(methods.len());
                for &m in methods {
                    let chosen = if allowed.contains(&m) {
                        m
                    } else {
                        tracing::debug!(
                            requested = %m,
                            fallback = %fallback,
                            "method not valid for model, falling back"
                        );
                        *fallback
                    };
                    if !out.contains(&chosen) {
                        out.push(chosen);
                    }
                }
                out
            }
        }
    }
}

/// A model fitted elsewhere, seen through the diagnostics it exposes.
pub trait FittedModel: Send + Sync {
    /// Class tag, used in messages.
    fn model_class(&self) -> &str;

    /// The numeric predictors, one row per observation.
    fn numeric_matrix(&self) -> NumericData;

    fn capability(&self) -> ModelCapability<'_>;

    fn method_policy(&self) -> MethodPolicy {
        MethodPolicy::Unrestricted
    }

    fn is_bayesian(&self) -> bool {
        matches!(self.capability(), ModelCapability::Bayesian(_))
    }
}
