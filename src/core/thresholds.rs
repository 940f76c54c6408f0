//! Decision thresholds per method.

use super::Method;
use crate::error::{OutlierError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal};
use std::collections::BTreeMap;
use std::fmt;

/// Caller-supplied thresholds.
///
/// Deserialization goes through [`ThresholdOverride::from_json`], so a bad entry
/// reports the offending key or shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, try_from = "serde_json::Value")]
pub enum ThresholdOverride {
    /// One value replacing every default.
    Uniform(f64),
    /// Per-method replacements; methods not listed keep their defaults.
    PerMethod(BTreeMap<Method, f64>),
}

impl ThresholdOverride {
    /// Parse a JSON number or an object of `method -> number`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(ThresholdOverride::Uniform).ok_or_else(
                || OutlierError::MalformedThresholds {
                    found: n.to_string(),
                },
            ),
            serde_json::Value::Object(map) => {
                let mut entries = BTreeMap::new();
                for (key, v) in map {
                    let method: Method =
                        key.parse().map_err(|_| OutlierError::UnknownThresholdKey {
                            key: key.clone(),
                        })?;
                    let value = v.as_f64().ok_or_else(|| OutlierError::MalformedThresholds {
                        found: format!("`{key}`: {v}"),
                    })?;
                    entries.insert(method, value);
                }
                Ok(ThresholdOverride::PerMethod(entries))
            }
            other => Err(OutlierError::MalformedThresholds {
                found: json_shape(other).to_string(),
            }),
        }
    }

    /// Build per-method overrides from `(name, value)` pairs.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, f64)]) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (key, value) in pairs {
            let method: Method =
                key.as_ref()
                    .parse()
                    .map_err(|_| OutlierError::UnknownThresholdKey {
                        key: key.as_ref().to_string(),
                    })?;
            entries.insert(method, *value);
        }
        Ok(ThresholdOverride::PerMethod(entries))
    }
}

fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl TryFrom<serde_json::Value> for ThresholdOverride {
    type Error = OutlierError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        ThresholdOverride::from_json(&value)
    }
}

impl From<f64> for ThresholdOverride {
    fn from(value: f64) -> Self {
        ThresholdOverride::Uniform(value)
    }
}

/// Resolved threshold per method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    entries: BTreeMap<Method, f64>,
}

impl ThresholdTable {
    /// Default thresholds for data with `n_rows` observations of `n_cols` variables.
    pub fn defaults(n_rows: usize, n_cols: usize) -> Self {
        let k = n_cols.max(1) as f64;
        let z = standard_normal_quantile(0.975);
        let chi = ChiSquared::new(k)
            .map(|d| d.inverse_cdf(0.975))
            .unwrap_or(f64::NAN);

        let mut entries = BTreeMap::new();
        entries.insert(Method::Zscore, z);
        entries.insert(Method::ZscoreRobust, z);
        entries.insert(Method::Iqr, 1.5);
        for m in [Method::Ci, Method::Eti, Method::Hdi, Method::Bci] {
            entries.insert(m, 0.95);
        }
        if n_rows > n_cols && n_cols > 0 {
            if let Ok(f) = FisherSnedecor::new(n_cols as f64, (n_rows - n_cols) as f64) {
                entries.insert(Method::Cook, f.inverse_cdf(0.5));
            }
        }
        entries.insert(Method::Pareto, 0.7);
        for m in [Method::Mahalanobis, Method::MahalanobisRobust, Method::Mcd] {
            entries.insert(m, chi);
        }
        entries.insert(Method::Ics, 0.025);
        entries.insert(Method::Optics, 2.0 * k);
        entries.insert(Method::Lof, 0.025);

        Self { entries }
    }

    /// Defaults with caller overrides applied.
    pub fn resolve(n_rows: usize, n_cols: usize, overrides: Option<&ThresholdOverride>) -> Self {
        let mut table = Self::defaults(n_rows, n_cols);
        if let Some(o) = overrides {
            table.apply(o);
        }
        table
    }

    /// Replace entries with the given overrides.
    ///
    /// A uniform override replaces every method's threshold, including methods
    /// whose default could not be computed for this data shape.
    pub fn apply(&mut self, overrides: &ThresholdOverride) {
        match overrides {
            ThresholdOverride::Uniform(v) => {
                for m in Method::ALL {
                    self.entries.insert(m, *v);
                }
            }
            ThresholdOverride::PerMethod(map) => {
                for (m, v) in map {
                    self.entries.insert(*m, *v);
                }
            }
        }
    }

    pub fn get(&self, method: Method) -> Option<f64> {
        self.entries.get(&method).copied()
    }

    /// Threshold for `method`, checked for the method's valid range.
    pub fn validated(&self, method: Method) -> Result<f64> {
        let value = self.get(method).ok_or(OutlierError::InvalidThreshold {
            method,
            value: f64::NAN,
            reason: "no default exists for this data shape",
        })?;
        if !value.is_finite() {
            return Err(OutlierError::InvalidThreshold {
                method,
                value,
                reason: "must be finite",
            });
        }
        if method.threshold_is_probability() && !(value > 0.0 && value < 1.0) {
            return Err(OutlierError::InvalidThreshold {
                method,
                value,
                reason: "must lie strictly between 0 and 1",
            });
        }
        if value <= 0.0 {
            return Err(OutlierError::InvalidThreshold {
                method,
                value,
                reason: "must be positive",
            });
        }
        Ok(value)
    }

    /// Keep only the listed methods.
    pub fn restricted_to(&self, methods: &[Method]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(m, _)| methods.contains(m))
                .map(|(m, v)| (*m, *v))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Method, f64)> + '_ {
        self.entries.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ThresholdTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(m, v)| format!("{m} ({})", format_threshold(*v)))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

pub(crate) fn format_threshold(v: f64) -> String {
    if ((v * 1000.0).round() / 1000.0 - v).abs() < 1e-12 {
        format!("{v}")
    } else {
        format!("{v:.3}")
    }
}

/// Quantile of the standard normal distribution.
pub(crate) fn standard_normal_quantile(p: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(p))
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let t = ThresholdTable::defaults(100, 2);
        assert_relative_eq!(t.get(Method::Zscore).unwrap(), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(t.get(Method::Iqr).unwrap(), 1.5);
        assert_relative_eq!(t.get(Method::Ci).unwrap(), 0.95);
        assert_relative_eq!(t.get(Method::Pareto).unwrap(), 0.7);
        assert_relative_eq!(t.get(Method::Mahalanobis).unwrap(), 7.377759, epsilon = 1e-4);
        assert_relative_eq!(t.get(Method::Mcd).unwrap(), 7.377759, epsilon = 1e-4);
        assert_relative_eq!(t.get(Method::Ics).unwrap(), 0.025);
        assert_relative_eq!(t.get(Method::Optics).unwrap(), 4.0);
        assert_relative_eq!(t.get(Method::Lof).unwrap(), 0.025);
        // Median of F(2, 98).
        assert_relative_eq!(t.get(Method::Cook).unwrap(), 0.6981, epsilon = 1e-3);
    }

    #[test]
    fn test_cook_absent_without_residual_df() {
        let t = ThresholdTable::defaults(3, 3);
        assert!(t.get(Method::Cook).is_none());
        assert!(t.validated(Method::Cook).is_err());
    }

    #[test]
    fn test_uniform_override() {
        let t = ThresholdTable::resolve(50, 3, Some(&ThresholdOverride::Uniform(2.0)));
        for (_, v) in t.iter() {
            assert_eq!(v, 2.0);
        }
        assert_eq!(t.len(), Method::ALL.len());
    }

    #[test]
    fn test_per_method_override() {
        let o = ThresholdOverride::from_pairs(&[("zscore", 3.0)]).unwrap();
        let t = ThresholdTable::resolve(50, 3, Some(&o));
        assert_eq!(t.get(Method::Zscore), Some(3.0));
        assert_eq!(t.get(Method::Iqr), Some(1.5));
    }

    #[test]
    fn test_from_json_shapes() {
        let uniform = ThresholdOverride::from_json(&serde_json::json!(2)).unwrap();
        assert_eq!(uniform, ThresholdOverride::Uniform(2.0));

        let map =
            ThresholdOverride::from_json(&serde_json::json!({"iqr": 2.0, "mcd": 10})).unwrap();
        match map {
            ThresholdOverride::PerMethod(m) => {
                assert_eq!(m.get(&Method::Iqr), Some(&2.0));
                assert_eq!(m.get(&Method::Mcd), Some(&10.0));
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            ThresholdOverride::from_json(&serde_json::json!("high")),
            Err(OutlierError::MalformedThresholds { .. })
        ));
        assert!(matches!(
            ThresholdOverride::from_json(&serde_json::json!([1, 2])),
            Err(OutlierError::MalformedThresholds { .. })
        ));
        assert!(matches!(
            ThresholdOverride::from_json(&serde_json::json!({"zcore": 2})),
            Err(OutlierError::UnknownThresholdKey { key }) if key == "zcore"
        ));
        assert!(matches!(
            ThresholdOverride::from_json(&serde_json::json!({"iqr": "wide"})),
            Err(OutlierError::MalformedThresholds { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let t = ThresholdTable::resolve(50, 3, Some(&ThresholdOverride::Uniform(2.0)));
        assert_eq!(t.validated(Method::Zscore).unwrap(), 2.0);
        assert!(matches!(
            t.validated(Method::Ci),
            Err(OutlierError::InvalidThreshold { method: Method::Ci, .. })
        ));

        let neg = ThresholdTable::resolve(50, 3, Some(&ThresholdOverride::Uniform(-1.0)));
        assert!(neg.validated(Method::Iqr).is_err());
    }
}
