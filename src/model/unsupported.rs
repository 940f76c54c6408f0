//! Models no outlier detector applies to.

use super::{FittedModel, ModelCapability};
use crate::core::NumericData;
use faer::Mat;

/// A model class the detectors cannot handle, with the message shown to the caller.
#[derive(Debug, Clone)]
pub struct UnsupportedModel {
    class: String,
    reason: String,
    predictors: NumericData,
}

impl UnsupportedModel {
    pub fn new(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            reason: reason.into(),
            predictors: NumericData::from_matrix(Mat::zeros(0, 0)),
        }
    }

    /// Attach the model's predictors, for callers that inspect them anyway.
    pub fn with_predictors(mut self, x: Mat<f64>) -> Self {
        self.predictors = NumericData::from_matrix(x);
        self
    }
}

impl FittedModel for UnsupportedModel {
    fn model_class(&self) -> &str {
        &self.class
    }

    fn numeric_matrix(&self) -> NumericData {
        self.predictors.clone()
    }

    fn capability(&self) -> ModelCapability<'_> {
        ModelCapability::Unsupported {
            reason: self.reason.clone(),
        }
    }
}
