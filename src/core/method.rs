//! Outlier detection methods and method selection.

use crate::error::OutlierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Maximum absolute z-score across columns.
    Zscore,
    /// Maximum absolute median/MAD score across columns.
    ZscoreRobust,
    /// Tukey fences around the interquartile range.
    Iqr,
    /// Equal-tailed interval (alias of `Eti`).
    Ci,
    /// Equal-tailed interval.
    Eti,
    /// Highest density interval.
    Hdi,
    /// Bias-corrected and accelerated interval.
    Bci,
    /// Cook's distance of a frequentist model.
    Cook,
    /// Pareto-k leave-one-out diagnostic of a Bayesian model.
    Pareto,
    /// Classical Mahalanobis distance.
    Mahalanobis,
    /// Mahalanobis distance from an OGK robust covariance.
    MahalanobisRobust,
    /// Minimum Covariance Determinant.
    Mcd,
    /// Invariant Coordinate Selection.
    Ics,
    /// OPTICS reachability clustering.
    Optics,
    /// Local Outlier Factor.
    Lof,
}

/// Optional dependencies some detectors rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dependency {
    /// Component selection and cutoff simulation for ICS.
    IcsClassifier,
    /// Neighbourhood-density routines for OPTICS and LOF.
    DensityClustering,
}

impl Dependency {
    pub fn name(&self) -> &'static str {
        match self {
            Dependency::IcsClassifier => "ics-classifier",
            Dependency::DensityClustering => "density-clustering",
        }
    }
}

impl FromStr for Dependency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ics" | "ics-classifier" | "ics_classifier" => Ok(Dependency::IcsClassifier),
            "density" | "density-clustering" | "density_clustering" | "dbscan" => {
                Ok(Dependency::DensityClustering)
            }
            other => Err(other.to_string()),
        }
    }
}

impl Method {
    /// Every method, in canonical order.
    pub const ALL: [Method; 15] = [
        Method::Zscore,
        Method::ZscoreRobust,
        Method::Iqr,
        Method::Ci,
        Method::Eti,
        Method::Hdi,
        Method::Bci,
        Method::Cook,
        Method::Pareto,
        Method::Mahalanobis,
        Method::MahalanobisRobust,
        Method::Mcd,
        Method::Ics,
        Method::Optics,
        Method::Lof,
    ];

    /// Methods selected by `"all"` for a raw dataset.
    pub const DEFAULT_SET: [Method; 9] = [
        Method::ZscoreRobust,
        Method::Iqr,
        Method::Ci,
        Method::Mahalanobis,
        Method::MahalanobisRobust,
        Method::Mcd,
        Method::Ics,
        Method::Optics,
        Method::Lof,
    ];

    /// Name used when parsing and in messages.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Zscore => "zscore",
            Method::ZscoreRobust => "zscore_robust",
            Method::Iqr => "iqr",
            Method::Ci => "ci",
            Method::Eti => "eti",
            Method::Hdi => "hdi",
            Method::Bci => "bci",
            Method::Cook => "cook",
            Method::Pareto => "pareto",
            Method::Mahalanobis => "mahalanobis",
            Method::MahalanobisRobust => "mahalanobis_robust",
            Method::Mcd => "mcd",
            Method::Ics => "ics",
            Method::Optics => "optics",
            Method::Lof => "lof",
        }
    }

    /// Label used in score table column names.
    pub fn label(&self) -> &'static str {
        match self {
            Method::Zscore => "Zscore",
            Method::ZscoreRobust => "Zscore_robust",
            Method::Iqr => "IQR",
            Method::Ci => "CI",
            Method::Eti => "ETI",
            Method::Hdi => "HDI",
            Method::Bci => "BCI",
            Method::Cook => "Cook",
            Method::Pareto => "Pareto",
            Method::Mahalanobis => "Mahalanobis",
            Method::MahalanobisRobust => "Mahalanobis_robust",
            Method::Mcd => "MCD",
            Method::Ics => "ICS",
            Method::Optics => "OPTICS",
            Method::Lof => "LOF",
        }
    }

    /// Whether the method reads diagnostics from a fitted model instead of a matrix.
    pub fn requires_model(&self) -> bool {
        matches!(self, Method::Cook | Method::Pareto)
    }

    /// The optional dependency this method relies on.
    pub fn dependency(&self) -> Option<Dependency> {
        match self {
            Method::Ics => Some(Dependency::IcsClassifier),
            Method::Optics | Method::Lof => Some(Dependency::DensityClustering),
            _ => None,
        }
    }

    /// Whether the threshold is a probability (coverage or tail level).
    pub fn threshold_is_probability(&self) -> bool {
        matches!(
            self,
            Method::Ci | Method::Eti | Method::Hdi | Method::Bci | Method::Ics | Method::Lof
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.name() == name)
            .ok_or_else(|| OutlierError::UnknownMethod {
                name: s.to_string(),
            })
    }
}

/// Which methods to run.
///
/// Serialized as `"all"`, a single method name, or a list of method names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MethodNames", into = "MethodNames")]
pub enum MethodSelection {
    /// The canonical method set, plus the applicable model detector.
    All,
    /// An explicit list, run in the given order.
    Methods(Vec<Method>),
}

impl Default for MethodSelection {
    fn default() -> Self {
        MethodSelection::Methods(vec![Method::Mahalanobis])
    }
}

impl MethodSelection {
    /// Parse method names; `"all"` anywhere selects the canonical set.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, OutlierError> {
        if names.iter().any(|n| n.as_ref().trim().eq_ignore_ascii_case("all")) {
            return Ok(MethodSelection::All);
        }
        let methods = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Method>, _>>()?;
        Ok(MethodSelection::Methods(methods))
    }

    /// Expand into a de-duplicated, ordered list of methods.
    ///
    /// `model_method` is the model detector applicable to the input (`cook` for
    /// frequentist models, `pareto` for Bayesian ones), if any.
    pub fn resolve(&self, model_method: Option<Method>) -> Vec<Method> {
        let mut methods: Vec<Method> = match self {
            MethodSelection::All => {
                let mut m = Method::DEFAULT_SET.to_vec();
                m.extend(model_method);
                m
            }
            MethodSelection::Methods(m) => m.clone(),
        };
        let mut seen = Vec::with_capacity(methods.len());
        methods.retain(|m| {
            if seen.contains(m) {
                false
            } else {
                seen.push(*m);
                true
            }
        });
        methods
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MethodSelection::Methods(m) if m.is_empty())
    }
}

/// Wire form of [`MethodSelection`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MethodNames {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<MethodNames> for MethodSelection {
    type Error = OutlierError;

    fn try_from(names: MethodNames) -> Result<Self, Self::Error> {
        match names {
            MethodNames::One(name) => MethodSelection::parse(&[name]),
            MethodNames::Many(names) => MethodSelection::parse(&names),
        }
    }
}

impl From<MethodSelection> for MethodNames {
    fn from(selection: MethodSelection) -> Self {
        match selection {
            MethodSelection::All => MethodNames::One("all".to_string()),
            MethodSelection::Methods(methods) => {
                MethodNames::Many(methods.iter().map(|m| m.name().to_string()).collect())
            }
        }
    }
}

impl From<Method> for MethodSelection {
    fn from(method: Method) -> Self {
        MethodSelection::Methods(vec![method])
    }
}

impl From<Vec<Method>> for MethodSelection {
    fn from(methods: Vec<Method>) -> Self {
        MethodSelection::Methods(methods)
    }
}

impl From<&[Method]> for MethodSelection {
    fn from(methods: &[Method]) -> Self {
        MethodSelection::Methods(methods.to_vec())
    }
}
