//! Running the selected detectors and joining their output.

use super::groups::{check_grouped, GroupedOutlierResult};
use crate::core::{
    Dataset, DetectorRegistry, Method, MethodScores, MethodSelection, NumericData, OptionsError,
    OutlierOptions, OutlierOptionsBuilder, OutlierResult, ScoreTable, ThresholdOverride,
    ThresholdTable,
};
use crate::detectors::{run_detector, DetectorContext, DetectorOutput};
use crate::error::{OutlierError, Result};
use crate::model::{FittedModel, ModelCapability};
use faer::Mat;
use rayon::prelude::*;

/// What to check.
#[derive(Clone, Copy)]
pub enum OutlierInput<'a> {
    /// A dataset; its numeric columns are used.
    Data(&'a Dataset),
    /// A numeric matrix, columns named `x1..xk`.
    Matrix(&'a Mat<f64>),
    /// A fitted model, through its predictors and diagnostics.
    Model(&'a dyn FittedModel),
}

impl<'a> From<&'a Dataset> for OutlierInput<'a> {
    fn from(data: &'a Dataset) -> Self {
        OutlierInput::Data(data)
    }
}

impl<'a> From<&'a Mat<f64>> for OutlierInput<'a> {
    fn from(x: &'a Mat<f64>) -> Self {
        OutlierInput::Matrix(x)
    }
}

/// Check `input` for outliers.
///
/// Returns `Ok(None)` only for a model no detector supports; the reason is logged
/// as a warning when `verbose` is on.
///
/// # Example
///
/// ```rust,ignore
/// use regress_outliers::prelude::*;
///
/// let options = OutlierOptions::method(Method::Zscore);
/// let result = detect_outliers(OutlierInput::Matrix(&x), &options)?.unwrap();
/// println!("{result}");
/// ```
pub fn detect_outliers(
    input: OutlierInput<'_>,
    options: &OutlierOptions,
) -> Result<Option<OutlierResult>> {
    options.validate()?;
    match input {
        OutlierInput::Data(data) => check_numeric(&data.numeric(&[])?, options).map(Some),
        OutlierInput::Matrix(x) => check_numeric(&matrix_data(x)?, options).map(Some),
        OutlierInput::Model(model) => check_fitted(model, options),
    }
}

fn matrix_data(x: &Mat<f64>) -> Result<NumericData> {
    if x.ncols() == 0 {
        return Err(OutlierError::NoNumericData);
    }
    Ok(NumericData::from_matrix(x.to_owned()))
}

pub(crate) fn check_numeric(data: &NumericData, options: &OutlierOptions) -> Result<OutlierResult> {
    aggregate(data, None, &options.methods.resolve(None), options)
}

fn check_fitted(
    model: &dyn FittedModel,
    options: &OutlierOptions,
) -> Result<Option<OutlierResult>> {
    let capability = model.capability();
    if let ModelCapability::Unsupported { reason } = &capability {
        let message = OutlierError::UnsupportedModel {
            class: model.model_class().to_string(),
            reason: reason.clone(),
        }
        .to_string();
        if options.verbose {
            tracing::warn!("{message}");
        }
        return Ok(None);
    }

    let requested = options.methods.resolve(capability.model_method());
    let methods = model.method_policy().apply(&requested);
    let numeric = model.numeric_matrix();
    aggregate(&numeric, Some(model), &methods, options).map(Some)
}

/// Run `methods` on `data` and combine their flags.
///
/// Invalid thresholds and missing numeric data abort; anything a single detector
/// runs into becomes a warning and the detector is left out of the composite.
pub(crate) fn aggregate(
    data: &NumericData,
    model: Option<&dyn FittedModel>,
    methods: &[Method],
    options: &OutlierOptions,
) -> Result<OutlierResult> {
    let n = data.n_rows();
    if data.n_cols() == 0 && methods.iter().any(|m| !m.requires_model()) {
        return Err(OutlierError::NoNumericData);
    }

    let thresholds = ThresholdTable::resolve(n, data.n_cols(), options.thresholds.as_ref());
    let selected: Vec<(Method, f64)> = methods
        .iter()
        .map(|&m| thresholds.validated(m).map(|t| (m, t)))
        .collect::<Result<_>>()?;

    let mut warnings = Vec::new();
    let registry = options.registry();
    let runnable: Vec<(Method, f64)> = selected
        .into_iter()
        .filter(|&(method, _)| match registry.missing_for(method) {
            Some(dependency) => {
                let error = OutlierError::DependencyUnavailable {
                    method,
                    dependency: dependency.name(),
                };
                warnings.push(error.to_string());
                false
            }
            None => true,
        })
        .collect();

    let ctx = DetectorContext {
        data: &data.matrix,
        model,
        options,
    };
    let run = |&(method, threshold): &(Method, f64)| run_detector(method, threshold, &ctx);
    let outcomes: Vec<Result<DetectorOutput>> = if options.parallel {
        runnable.par_iter().map(run).collect()
    } else {
        runnable.iter().map(run).collect()
    };

    let mut scores = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(output) => {
                tracing::debug!(
                    method = %output.method,
                    flagged = output.outlier.iter().filter(|&&f| f).count(),
                    "detector finished"
                );
                warnings.extend(output.notes);
                scores.push(MethodScores {
                    method: output.method,
                    distance: output.distance,
                    outlier: output.outlier,
                });
            }
            Err(e) => {
                tracing::debug!(kind = ?e.kind(), "detector omitted: {e}");
                warnings.push(e.to_string());
            }
        }
    }

    if scores.is_empty() {
        warnings.push("no detector produced output; the composite score is 0".to_string());
    }
    if options.verbose {
        for w in &warnings {
            tracing::warn!("{w}");
        }
    }

    let table = ScoreTable::from_scores(n, scores);
    Ok(OutlierResult::new(table, thresholds, data.names.clone(), warnings))
}

/// Outlier checker configured once and applied to many inputs.
///
/// # Example
///
/// ```rust,ignore
/// use regress_outliers::prelude::*;
///
/// let checker = OutlierChecker::builder()
///     .methods(vec![Method::ZscoreRobust, Method::Iqr, Method::Mahalanobis])
///     .build()?;
///
/// let result = checker.check(&data)?;
/// for i in result.outlier_indices() {
///     println!("row {i}: composite {}", result.composite()[i]);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutlierChecker {
    options: OutlierOptions,
}

impl OutlierChecker {
    /// Create a checker with the given options.
    pub fn new(options: OutlierOptions) -> Self {
        Self { options }
    }

    /// Create a builder for configuring the checker.
    pub fn builder() -> OutlierCheckerBuilder {
        OutlierCheckerBuilder::default()
    }

    pub fn options(&self) -> &OutlierOptions {
        &self.options
    }

    /// Check the numeric columns of `data`.
    pub fn check(&self, data: &Dataset) -> Result<OutlierResult> {
        self.options.validate()?;
        check_numeric(&data.numeric(&[])?, &self.options)
    }

    /// Check the columns of a numeric matrix.
    pub fn check_matrix(&self, x: &Mat<f64>) -> Result<OutlierResult> {
        self.options.validate()?;
        check_numeric(&matrix_data(x)?, &self.options)
    }

    /// Check a fitted model; `None` if no detector supports it.
    pub fn check_model(&self, model: &dyn FittedModel) -> Result<Option<OutlierResult>> {
        detect_outliers(OutlierInput::Model(model), &self.options)
    }

    /// Check each group of rows sharing a value of `group_by` independently.
    pub fn check_grouped(&self, data: &Dataset, group_by: &str) -> Result<GroupedOutlierResult> {
        self.options.validate()?;
        check_grouped(data, group_by, &self.options)
    }
}

/// Builder for [`OutlierChecker`].
#[derive(Debug, Clone, Default)]
pub struct OutlierCheckerBuilder {
    builder: OutlierOptionsBuilder,
}

impl OutlierCheckerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the methods to run.
    pub fn methods(mut self, methods: impl Into<MethodSelection>) -> Self {
        self.builder = self.builder.methods(methods);
        self
    }

    /// Run the canonical method set.
    pub fn all_methods(mut self) -> Self {
        self.builder = self.builder.all_methods();
        self
    }

    /// Override thresholds per method or uniformly.
    pub fn thresholds(mut self, thresholds: impl Into<ThresholdOverride>) -> Self {
        self.builder = self.builder.thresholds(thresholds);
        self
    }

    /// Use one threshold for every method.
    pub fn threshold(mut self, value: f64) -> Self {
        self.builder = self.builder.threshold(value);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.builder = self.builder.verbose(verbose);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.builder = self.builder.parallel(parallel);
        self
    }

    pub fn percentage_central(mut self, value: f64) -> Self {
        self.builder = self.builder.percentage_central(value);
        self
    }

    pub fn optics_xi(mut self, value: f64) -> Self {
        self.builder = self.builder.optics_xi(value);
        self
    }

    pub fn ics_level(mut self, value: f64) -> Self {
        self.builder = self.builder.ics_level(value);
        self
    }

    pub fn ics_simulations(mut self, value: usize) -> Self {
        self.builder = self.builder.ics_simulations(value);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.builder = self.builder.seed(seed);
        self
    }

    /// Use an explicit dependency registry.
    pub fn registry(mut self, registry: DetectorRegistry) -> Self {
        self.builder = self.builder.registry(registry);
        self
    }

    /// Build the checker, validating its options.
    pub fn build(self) -> std::result::Result<OutlierChecker, OptionsError> {
        Ok(OutlierChecker::new(self.builder.build()?))
    }
}
