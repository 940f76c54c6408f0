//! Error types for outlier detection.

use crate::core::{Method, OptionsError};
use thiserror::Error;

/// Broad classes of failure.
///
/// The kind describes the error, not what the aggregator does with it: bad options,
/// thresholds or data abort a check before any detector runs, while every error a
/// detector returns becomes a warning, `InvalidArgument` ones included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnsupportedModel,
    DependencyUnavailable,
    ComputationFailure,
}

/// Errors that can occur while checking for outliers.
#[derive(Debug, Error)]
pub enum OutlierError {
    #[error("unsupported outlier detection method `{name}`")]
    UnknownMethod { name: String },

    #[error("invalid threshold {value} for method `{method}`: {reason}")]
    InvalidThreshold {
        method: Method,
        value: f64,
        reason: &'static str,
    },

    #[error("thresholds must be a number or a mapping of method names to numbers, got {found}")]
    MalformedThresholds { found: String },

    #[error("threshold given for unknown method `{key}`")]
    UnknownThresholdKey { key: String },

    #[error("no numeric variables found in the data")]
    NoNumericData,

    #[error("method `{method}` needs at least {needed} numeric columns, got {got}")]
    InsufficientColumns {
        method: Method,
        needed: usize,
        got: usize,
    },

    #[error("method `{method}` needs at least {needed} complete observations, got {got}")]
    InsufficientObservations {
        method: Method,
        needed: usize,
        got: usize,
    },

    #[error("dimension mismatch in `{what}`: expected {expected} values, got {got}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    #[error("method `{method}`: covariance matrix is singular")]
    SingularCovariance { method: Method },

    #[error("method `{method}` failed: {reason}")]
    ComputationFailure { method: Method, reason: String },

    #[error("method `{method}` skipped: dependency `{dependency}` is not available")]
    DependencyUnavailable {
        method: Method,
        dependency: &'static str,
    },

    #[error("model of class `{class}` is not supported: {reason}")]
    UnsupportedModel { class: String, reason: String },

    #[error("method `{method}` requires {required}")]
    ModelCapabilityMissing {
        method: Method,
        required: &'static str,
    },

    #[error("unknown column `{name}`")]
    UnknownColumn { name: String },

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),
}

impl OutlierError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OutlierError::UnknownMethod { .. }
            | OutlierError::InvalidThreshold { .. }
            | OutlierError::MalformedThresholds { .. }
            | OutlierError::UnknownThresholdKey { .. }
            | OutlierError::NoNumericData
            | OutlierError::InsufficientColumns { .. }
            | OutlierError::DimensionMismatch { .. }
            | OutlierError::UnknownColumn { .. }
            | OutlierError::InvalidOptions(_) => ErrorKind::InvalidArgument,
            OutlierError::UnsupportedModel { .. } => ErrorKind::UnsupportedModel,
            OutlierError::DependencyUnavailable { .. }
            | OutlierError::ModelCapabilityMissing { .. } => ErrorKind::DependencyUnavailable,
            OutlierError::InsufficientObservations { .. }
            | OutlierError::SingularCovariance { .. }
            | OutlierError::ComputationFailure { .. } => ErrorKind::ComputationFailure,
        }
    }

    /// The method this error is attributed to, if any.
    pub fn method(&self) -> Option<Method> {
        match self {
            OutlierError::InvalidThreshold { method, .. }
            | OutlierError::InsufficientColumns { method, .. }
            | OutlierError::InsufficientObservations { method, .. }
            | OutlierError::SingularCovariance { method }
            | OutlierError::ComputationFailure { method, .. }
            | OutlierError::DependencyUnavailable { method, .. }
            | OutlierError::ModelCapabilityMissing { method, .. } => Some(*method),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OutlierError>;
