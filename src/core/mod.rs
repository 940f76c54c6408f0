//! Core types for outlier detection.

mod complete_cases;
mod data;
mod method;
mod options;
mod registry;
mod result;
mod thresholds;

pub use complete_cases::CompleteCases;
pub use data::{Column, ColumnData, Dataset, NumericData};
pub use method::{Dependency, Method, MethodSelection};
pub use options::{OptionsError, OutlierOptions, OutlierOptionsBuilder};
pub use registry::{DetectorRegistry, DISABLE_ENV};
pub use result::{MethodScores, OutlierResult, ScoreTable};
pub use thresholds::{ThresholdOverride, ThresholdTable};

pub(crate) use result::write_summary_line;
pub(crate) use thresholds::standard_normal_quantile;
