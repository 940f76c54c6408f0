//! Outlier check result structures.

use super::thresholds::{format_threshold, ThresholdTable};
use super::Method;
use faer::Col;
use std::fmt;

/// Distance and flag columns of one detector.
#[derive(Debug, Clone)]
pub struct MethodScores {
    pub method: Method,
    /// Per-observation distance; `NaN` where the detector could not score the row.
    pub distance: Col<f64>,
    /// Per-observation flag.
    pub outlier: Vec<bool>,
}

impl MethodScores {
    pub fn n_flagged(&self) -> usize {
        self.outlier.iter().filter(|&&f| f).count()
    }
}

/// Per-observation score table: one distance/flag pair per detector plus the
/// composite score.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    /// Original row index of each table row.
    pub row_ids: Vec<usize>,

    /// Detector columns, in method order.
    pub scores: Vec<MethodScores>,

    /// Fraction of detectors flagging each observation.
    pub composite: Col<f64>,
}

impl ScoreTable {
    /// Build a table and compute the composite from the detector flags.
    ///
    /// With no detector columns the composite is zero everywhere.
    pub fn from_scores(n: usize, scores: Vec<MethodScores>) -> Self {
        let composite = composite_score(n, &scores);
        Self {
            row_ids: (0..n).collect(),
            scores,
            composite,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.composite.nrows()
    }

    /// Detector columns for `method`.
    pub fn get(&self, method: Method) -> Option<&MethodScores> {
        self.scores.iter().find(|s| s.method == method)
    }

    pub fn distance(&self, method: Method) -> Option<&Col<f64>> {
        self.get(method).map(|s| &s.distance)
    }

    pub fn outlier(&self, method: Method) -> Option<&[bool]> {
        self.get(method).map(|s| s.outlier.as_slice())
    }

    pub fn methods(&self) -> Vec<Method> {
        self.scores.iter().map(|s| s.method).collect()
    }

    /// Column names: `Distance_<Label>`, `Outlier_<Label>` per method, then `Outlier`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scores
            .iter()
            .flat_map(|s| {
                [
                    format!("Distance_{}", s.method.label()),
                    format!("Outlier_{}", s.method.label()),
                ]
            })
            .collect();
        names.push("Outlier".to_string());
        names
    }
}

/// Mean of the detector flags per observation.
fn composite_score(n: usize, scores: &[MethodScores]) -> Col<f64> {
    if scores.is_empty() {
        return Col::zeros(n);
    }
    let m = scores.len() as f64;
    Col::from_fn(n, |i| {
        scores.iter().filter(|s| s.outlier[i]).count() as f64 / m
    })
}

/// Result of an outlier check.
///
/// The boolean flags are a view over the full score table.
#[derive(Debug, Clone)]
pub struct OutlierResult {
    pub(crate) flags: Vec<bool>,
    pub(crate) table: ScoreTable,
    pub(crate) thresholds: ThresholdTable,
    pub(crate) methods: Vec<Method>,
    pub(crate) variables: Vec<String>,
    pub(crate) warnings: Vec<String>,
}

impl OutlierResult {
    /// Assemble a result, deriving the final flags as `composite > 0.5`.
    pub(crate) fn new(
        table: ScoreTable,
        thresholds: ThresholdTable,
        variables: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        let flags = table.composite.iter().map(|&c| c > 0.5).collect();
        let methods = table.methods();
        Self {
            flags,
            thresholds: thresholds.restricted_to(&methods),
            table,
            methods,
            variables,
            warnings,
        }
    }

    /// Final outlier flag per observation.
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn is_outlier(&self, i: usize) -> bool {
        self.flags.get(i).copied().unwrap_or(false)
    }

    /// Zero-based indices of flagged observations.
    pub fn outlier_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    pub fn n_outliers(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Composite score per observation.
    pub fn composite(&self) -> &Col<f64> {
        &self.table.composite
    }

    pub fn table(&self) -> &ScoreTable {
        &self.table
    }

    /// Thresholds of the methods that produced output.
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Methods that produced output, in order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Names of the numeric variables the detectors saw.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Warnings recorded while checking, such as omitted detectors.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// First line of a printed result: the flagged cases, 1-based.
pub(crate) fn write_summary_line(f: &mut fmt::Formatter<'_>, indices: &[usize]) -> fmt::Result {
    if indices.is_empty() {
        return writeln!(f, "OK: No outliers detected.");
    }
    let cases: Vec<String> = indices.iter().map(|i| (i + 1).to_string()).collect();
    let noun = if indices.len() == 1 { "outlier" } else { "outliers" };
    writeln!(f, "{} {noun} detected: cases {}.", indices.len(), cases.join(", "))
}

impl fmt::Display for OutlierResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary_line(f, &self.outlier_indices())?;

        let methods: Vec<String> = self
            .methods
            .iter()
            .map(|m| match self.thresholds.get(*m) {
                Some(t) => format!("{m} ({})", format_threshold(t)),
                None => m.to_string(),
            })
            .collect();
        writeln!(f, "- Based on the following methods and thresholds: {}.", methods.join(", "))?;
        write!(f, "- For variables: {}.", self.variables.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(method: Method, flags: &[bool]) -> MethodScores {
        MethodScores {
            method,
            distance: Col::from_fn(flags.len(), |i| i as f64),
            outlier: flags.to_vec(),
        }
    }

    #[test]
    fn test_composite_is_mean_of_flags() {
        let table = ScoreTable::from_scores(
            3,
            vec![
                scores(Method::Zscore, &[true, false, true]),
                scores(Method::Iqr, &[true, false, false]),
                scores(Method::Mahalanobis, &[true, true, false]),
                scores(Method::Mcd, &[false, false, true]),
            ],
        );
        assert_eq!(table.composite[0], 0.75);
        assert_eq!(table.composite[1], 0.25);
        assert_eq!(table.composite[2], 0.5);

        let result = OutlierResult::new(
            table,
            ThresholdTable::defaults(3, 1),
            vec!["x".into()],
            vec![],
        );
        // A tie at exactly one half is not an outlier.
        assert_eq!(result.flags(), &[true, false, false]);
        assert_eq!(result.outlier_indices(), vec![0]);
        assert_eq!(result.thresholds().len(), 4);
    }

    #[test]
    fn test_empty_table_has_zero_composite() {
        let table = ScoreTable::from_scores(4, vec![]);
        assert!(table.composite.iter().all(|&c| c == 0.0));
        assert_eq!(table.column_names(), vec!["Outlier"]);
    }

    #[test]
    fn test_column_names_and_lookup() {
        let table = ScoreTable::from_scores(
            2,
            vec![
                scores(Method::ZscoreRobust, &[false, true]),
                scores(Method::Lof, &[false, false]),
            ],
        );
        assert_eq!(
            table.column_names(),
            vec![
                "Distance_Zscore_robust",
                "Outlier_Zscore_robust",
                "Distance_LOF",
                "Outlier_LOF",
                "Outlier"
            ]
        );
        assert_eq!(table.outlier(Method::ZscoreRobust), Some(&[false, true][..]));
        assert!(table.get(Method::Iqr).is_none());
    }

    #[test]
    fn test_summary() {
        let table = ScoreTable::from_scores(
            5,
            vec![scores(Method::Zscore, &[false, false, false, false, true])],
        );
        let result = OutlierResult::new(
            table,
            ThresholdTable::defaults(5, 1),
            vec!["x".into()],
            vec![],
        );
        let text = result.to_string();
        assert!(text.starts_with("1 outlier detected: cases 5."));
        assert!(text.contains("zscore (1.960)"));
        assert!(text.contains("For variables: x."));

        let clean = OutlierResult::new(
            ScoreTable::from_scores(2, vec![scores(Method::Iqr, &[false, false])]),
            ThresholdTable::defaults(2, 1),
            vec!["x".into()],
            vec![],
        );
        assert!(clean.to_string().starts_with("OK: No outliers detected."));
        assert!(clean.to_string().contains("iqr (1.5)"));
    }
}
