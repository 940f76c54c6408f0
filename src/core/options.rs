//! Outlier check options and configuration.

use super::method::{Method, MethodSelection};
use super::registry::DetectorRegistry;
use super::thresholds::ThresholdOverride;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration options for an outlier check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierOptions {
    /// Methods to run (default: `mahalanobis`).
    pub methods: MethodSelection,
    /// Threshold overrides; `None` keeps the data-dependent defaults.
    pub thresholds: Option<ThresholdOverride>,
    /// Emit warnings through `tracing` (default: true). Warnings are always
    /// recorded on the result.
    pub verbose: bool,
    /// Run detectors and groups on the rayon thread pool (default: true).
    pub parallel: bool,
    /// Share of observations kept in the MCD subset (default: 0.5).
    pub percentage_central: f64,
    /// Steepness parameter for OPTICS cluster extraction (default: 0.05).
    pub optics_xi: f64,
    /// Significance level for selecting ICS components (default: 0.05).
    pub ics_level: f64,
    /// Number of simulated samples for the ICS cutoff (default: 200).
    pub ics_simulations: usize,
    /// Seed for the randomised detectors (MCD starts, ICS simulation).
    pub seed: u64,
    /// Availability of optional dependencies; `None` uses the process-wide registry.
    #[serde(skip)]
    pub registry: Option<DetectorRegistry>,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        Self {
            methods: MethodSelection::default(),
            thresholds: None,
            verbose: true,
            parallel: true,
            percentage_central: 0.5,
            optics_xi: 0.05,
            ics_level: 0.05,
            ics_simulations: 200,
            seed: 42,
            registry: None,
        }
    }
}

/// Errors that can occur when validating outlier check options.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("at least one method must be selected")]
    NoMethods,
    #[error("percentage_central must be in [0.5, 1], got {0}")]
    InvalidPercentageCentral(f64),
    #[error("optics_xi must be in (0, 1), got {0}")]
    InvalidXi(f64),
    #[error("ics_level must be in (0, 1), got {0}")]
    InvalidIcsLevel(f64),
    #[error("ics_simulations must be at least 1, got {0}")]
    InvalidSimulations(usize),
    #[error("could not parse options: {0}")]
    Parse(String),
}

impl OutlierOptions {
    /// Create a new builder for outlier check options.
    pub fn builder() -> OutlierOptionsBuilder {
        OutlierOptionsBuilder::default()
    }

    /// Options running a single method with default thresholds.
    pub fn method(method: Method) -> Self {
        Self {
            methods: method.into(),
            ..Default::default()
        }
    }

    /// Options running every method in the canonical set.
    pub fn all() -> Self {
        Self {
            methods: MethodSelection::All,
            ..Default::default()
        }
    }

    /// Parse options from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| OptionsError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.methods.is_empty() {
            return Err(OptionsError::NoMethods);
        }
        if !(0.5..=1.0).contains(&self.percentage_central) {
            return Err(OptionsError::InvalidPercentageCentral(self.percentage_central));
        }
        if !(self.optics_xi > 0.0 && self.optics_xi < 1.0) {
            return Err(OptionsError::InvalidXi(self.optics_xi));
        }
        if !(self.ics_level > 0.0 && self.ics_level < 1.0) {
            return Err(OptionsError::InvalidIcsLevel(self.ics_level));
        }
        if self.ics_simulations == 0 {
            return Err(OptionsError::InvalidSimulations(self.ics_simulations));
        }
        Ok(())
    }

    /// The registry in effect.
    pub fn registry(&self) -> &DetectorRegistry {
        self.registry
            .as_ref()
            .unwrap_or_else(|| DetectorRegistry::global())
    }
}

/// Builder for [`OutlierOptions`].
#[derive(Debug, Clone, Default)]
pub struct OutlierOptionsBuilder {
    options: OutlierOptions,
}

impl OutlierOptionsBuilder {
    /// Select the methods to run.
    pub fn methods(mut self, methods: impl Into<MethodSelection>) -> Self {
        self.options.methods = methods.into();
        self
    }

    /// Select every method in the canonical set.
    pub fn all_methods(mut self) -> Self {
        self.options.methods = MethodSelection::All;
        self
    }

    /// Override thresholds.
    pub fn thresholds(mut self, thresholds: impl Into<ThresholdOverride>) -> Self {
        self.options.thresholds = Some(thresholds.into());
        self
    }

    /// Use one threshold for every method.
    pub fn threshold(mut self, value: f64) -> Self {
        self.options.thresholds = Some(ThresholdOverride::Uniform(value));
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    pub fn percentage_central(mut self, value: f64) -> Self {
        self.options.percentage_central = value;
        self
    }

    pub fn optics_xi(mut self, value: f64) -> Self {
        self.options.optics_xi = value;
        self
    }

    pub fn ics_level(mut self, value: f64) -> Self {
        self.options.ics_level = value;
        self
    }

    pub fn ics_simulations(mut self, value: usize) -> Self {
        self.options.ics_simulations = value;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = seed;
        self
    }

    /// Use an explicit dependency registry instead of the process-wide one.
    pub fn registry(mut self, registry: DetectorRegistry) -> Self {
        self.options.registry = Some(registry);
        self
    }

    /// Build the options, validating them.
    pub fn build(self) -> Result<OutlierOptions, OptionsError> {
        self.options.validate()?;
        Ok(self.options)
    }

    /// Build the options without validation.
    pub fn build_unchecked(self) -> OutlierOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let options = OutlierOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.methods, MethodSelection::Methods(vec![Method::Mahalanobis]));
        assert!(options.verbose);
    }

    #[test]
    fn test_builder() {
        let options = OutlierOptions::builder()
            .methods(vec![Method::Zscore, Method::Iqr])
            .threshold(2.0)
            .seed(7)
            .build()
            .unwrap();
        assert_eq!(options.thresholds, Some(ThresholdOverride::Uniform(2.0)));
        assert_eq!(options.seed, 7);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            OutlierOptions::builder().methods(Vec::<Method>::new()).build(),
            Err(OptionsError::NoMethods)
        ));
        assert!(matches!(
            OutlierOptions::builder().percentage_central(0.3).build(),
            Err(OptionsError::InvalidPercentageCentral(_))
        ));
        assert!(matches!(
            OutlierOptions::builder().optics_xi(1.5).build(),
            Err(OptionsError::InvalidXi(_))
        ));
        assert!(matches!(
            OutlierOptions::builder().ics_simulations(0).build(),
            Err(OptionsError::InvalidSimulations(0))
        ));
    }

    #[test]
    fn test_from_json() {
        let options = OutlierOptions::from_json(
            r#"{"methods": ["zscore", "iqr"], "thresholds": {"zscore": 3.0}, "verbose": false}"#,
        )
        .unwrap();
        assert_eq!(
            options.methods,
            MethodSelection::Methods(vec![Method::Zscore, Method::Iqr])
        );
        assert!(!options.verbose);
        assert_eq!(options.percentage_central, 0.5);

        let all = OutlierOptions::from_json(r#"{"methods": "all", "thresholds": 2}"#).unwrap();
        assert_eq!(all.methods, MethodSelection::All);
        assert_eq!(all.thresholds, Some(ThresholdOverride::Uniform(2.0)));

        let single = OutlierOptions::from_json(r#"{"methods": "mcd"}"#).unwrap();
        assert_eq!(single.methods, MethodSelection::Methods(vec![Method::Mcd]));
    }

    #[test]
    fn test_from_json_names_offending_entry() {
        let err = OutlierOptions::from_json(r#"{"methods": ["zcore"]}"#).unwrap_err();
        assert!(matches!(&err, OptionsError::Parse(msg) if msg.contains("zcore")), "{err}");

        let err = OutlierOptions::from_json(r#"{"methods": "all", "thresholds": {"zcore": 2}}"#)
            .unwrap_err();
        assert!(matches!(&err, OptionsError::Parse(msg) if msg.contains("zcore")), "{err}");

        let err = OutlierOptions::from_json(r#"{"thresholds": {"iqr": "wide"}}"#).unwrap_err();
        assert!(err.to_string().contains("`iqr`"), "{err}");

        let err = OutlierOptions::from_json(r#"{"thresholds": [1, 2]}"#).unwrap_err();
        assert!(err.to_string().contains("an array"), "{err}");
    }

    #[test]
    fn test_json_round_trip_keeps_selection() {
        let options = OutlierOptions::builder()
            .methods(vec![Method::Lof, Method::Iqr])
            .thresholds(ThresholdOverride::from_pairs(&[("lof", 0.01)]).unwrap())
            .build()
            .unwrap();
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains(r#""methods":["lof","iqr"]"#), "{json}");
        let back = OutlierOptions::from_json(&json).unwrap();
        assert_eq!(back.methods, options.methods);
        assert_eq!(back.thresholds, options.thresholds);
    }
}
