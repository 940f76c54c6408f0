//! Numeric helpers shared by the detectors.

pub mod linalg;
pub mod matrix;
pub mod stats;

pub use matrix::{column, column_means, select_rows};
