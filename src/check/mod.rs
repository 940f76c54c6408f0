//! Outlier checks: the aggregator and the group dispatcher.
//!
//! The aggregator resolves the method list and thresholds, runs every eligible
//! detector and joins their output into a [`ScoreTable`](crate::core::ScoreTable).
//! The composite score of an observation is the share of detectors flagging it,
//! and the observation is an outlier when that share is strictly above one half.

mod aggregate;
mod groups;

pub use aggregate::{detect_outliers, OutlierChecker, OutlierCheckerBuilder, OutlierInput};
pub use groups::GroupedOutlierResult;
