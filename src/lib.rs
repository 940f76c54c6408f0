//! Multi-method outlier detection for datasets and fitted regression models.
//!
//! Each detector turns the numeric observation matrix (or a fitted model's
//! diagnostics) into one distance and one flag per observation. The aggregator runs
//! the selected detectors, joins their columns into a score table and derives a
//! composite score: the share of detectors flagging the observation. An observation
//! is an outlier when more than half of the detectors agree.
//!
//! # Example
//!
//! ```rust,ignore
//! use regress_outliers::prelude::*;
//!
//! let data = Dataset::new()
//!     .with_numeric("x", vec![1.0, 2.0, 3.0, 4.0, 100.0])?;
//!
//! let result = OutlierChecker::builder()
//!     .methods(vec![Method::Zscore, Method::Iqr])
//!     .build()?
//!     .check(&data)?;
//!
//! println!("{result}");
//! assert_eq!(result.outlier_indices(), vec![4]);
//!
//! // Per-method distances and flags
//! let iqr = result.table().distance(Method::Iqr);
//! ```

pub mod check;
pub mod core;
pub mod detectors;
pub mod error;
pub mod model;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::check::{
        detect_outliers, GroupedOutlierResult, OutlierChecker, OutlierCheckerBuilder,
        OutlierInput,
    };
    pub use crate::core::{
        Dataset, Dependency, DetectorRegistry, Method, MethodSelection, OutlierOptions,
        OutlierOptionsBuilder, OutlierResult, ScoreTable, ThresholdOverride, ThresholdTable,
    };
    pub use crate::error::{ErrorKind, OutlierError};
    pub use crate::model::{
        BayesianModelFit, FittedModel, LinearModelFit, MethodPolicy, ModelCapability,
        UnsupportedModel,
    };
}

pub use crate::check::{detect_outliers, GroupedOutlierResult, OutlierChecker, OutlierInput};
pub use crate::core::{Dataset, Method, OutlierOptions, OutlierResult, ThresholdOverride};
pub use crate::error::{OutlierError, Result};
