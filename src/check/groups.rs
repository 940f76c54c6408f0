//! Independent outlier checks per group of rows.

use super::aggregate::check_numeric;
use crate::core::{
    write_summary_line, Dataset, Method, MethodScores, NumericData, OutlierOptions, OutlierResult,
    ScoreTable, ThresholdTable,
};
use crate::error::Result;
use crate::utils::select_rows;
use faer::Col;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;

/// Result of a grouped check, in the original row order.
///
/// Each row carries the detector columns and composite score of its own group.
/// Detector columns are the union over groups; a row whose group did not produce
/// a detector has a `NaN` distance and a `false` flag there.
#[derive(Debug, Clone)]
pub struct GroupedOutlierResult {
    flags: Vec<bool>,
    table: ScoreTable,
    row_groups: Vec<String>,
    groups: Vec<(String, OutlierResult)>,
    variables: Vec<String>,
    warnings: Vec<String>,
}

impl GroupedOutlierResult {
    /// Final flag per observation.
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

    /// Composite score per observation, from the observation's group.
    pub fn composite(&self) -> &Col<f64> {
        &self.table.composite
    }

    /// The merged score table.
    pub fn table(&self) -> &ScoreTable {
        &self.table
    }

    /// Group identifiers in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        self.groups.iter().map(|(g, _)| g.as_str()).collect()
    }

    /// Group identifier of row `i`.
    pub fn group_of(&self, i: usize) -> Option<&str> {
        self.row_groups.get(i).map(String::as_str)
    }

    /// The per-group results, rows in group-local order.
    pub fn group_results(&self) -> &[(String, OutlierResult)] {
        &self.groups
    }

    pub fn group_result(&self, group: &str) -> Option<&OutlierResult> {
        self.groups.iter().find(|(g, _)| g == group).map(|(_, r)| r)
    }

    /// Thresholds used in each group, keyed by group identifier.
    pub fn thresholds(&self) -> Vec<(&str, &ThresholdTable)> {
        self.groups
            .iter()
            .map(|(g, r)| (g.as_str(), r.thresholds()))
            .collect()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Warnings of every group, prefixed with the group identifier.
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

impl fmt::Display for GroupedOutlierResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary_line(f, &self.outlier_indices())?;
        writeln!(f, "- Based on the following methods and thresholds, per group:")?;
        for (group, result) in &self.groups {
            writeln!(f, "  {group}: {}", result.thresholds())?;
        }
        write!(f, "- For variables: {}.", self.variables.join(", "))
    }
}

/// Split rows by the value of `group_by`, in order of first appearance.
fn partition(data: &Dataset, group_by: &str) -> Result<(Vec<String>, Vec<(String, Vec<usize>)>)> {
    let column = data.column(group_by)?;
    let keys: Vec<String> = (0..data.n_rows()).map(|i| column.data.key(i)).collect();

    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, key) in keys.iter().enumerate() {
        match position.get(key.as_str()) {
            Some(&g) => groups[g].1.push(i),
            None => {
                position.insert(key, groups.len());
                groups.push((key.clone(), vec![i]));
            }
        }
    }
    Ok((keys, groups))
}

/// Check every group of `data` independently and merge the results back into the
/// original row order.
pub(crate) fn check_grouped(
    data: &Dataset,
    group_by: &str,
    options: &OutlierOptions,
) -> Result<GroupedOutlierResult> {
    let (row_groups, partitions) = partition(data, group_by)?;
    let numeric = data.numeric(&[group_by])?;
    tracing::debug!(groups = partitions.len(), group_by, "checking groups");

    let run = |(key, rows): &(String, Vec<usize>)| -> Result<(String, OutlierResult)> {
        let part = NumericData {
            matrix: select_rows(&numeric.matrix, rows),
            names: numeric.names.clone(),
        };
        Ok((key.clone(), check_numeric(&part, options)?))
    };
    let results: Vec<(String, OutlierResult)> = if options.parallel {
        partitions.par_iter().map(run).collect::<Result<_>>()?
    } else {
        partitions.iter().map(run).collect::<Result<_>>()?
    };

    let n = data.n_rows();
    let mut methods: Vec<Method> = Vec::new();
    for (_, result) in &results {
        for &m in result.methods() {
            if !methods.contains(&m) {
                methods.push(m);
            }
        }
    }

    let mut scores: Vec<MethodScores> = methods
        .iter()
        .map(|&method| MethodScores {
            method,
            distance: Col::from_fn(n, |_| f64::NAN),
            outlier: vec![false; n],
        })
        .collect();
    let mut composite = Col::zeros(n);
    let mut flags = vec![false; n];
    let mut warnings = Vec::new();

    for ((key, rows), (_, result)) in partitions.iter().zip(&results) {
        for (local, &row) in rows.iter().enumerate() {
            composite[row] = result.composite()[local];
            flags[row] = result.flags()[local];
        }
        for column in &mut scores {
            if let Some(group_scores) = result.table().get(column.method) {
                for (local, &row) in rows.iter().enumerate() {
                    column.distance[row] = group_scores.distance[local];
                    column.outlier[row] = group_scores.outlier[local];
                }
            }
        }
        warnings.extend(result.warnings().iter().map(|w| format!("group `{key}`: {w}")));
    }

    Ok(GroupedOutlierResult {
        flags,
        table: ScoreTable {
            row_ids: (0..n).collect(),
            scores,
            composite,
        },
        row_groups,
        groups: results,
        variables: numeric.names,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Method;

    fn two_groups() -> Dataset {
        let values = vec![1.0, 10.0, 2.0, 11.0, 3.0, 12.0, 4.0, 13.0, 100.0, 14.0];
        let group = (0..10).map(|i| if i % 2 == 0 { "a" } else { "b" }.to_string()).collect();
        Dataset::new()
            .with_numeric("x", values)
            .unwrap()
            .with_categorical("g", group)
            .unwrap()
    }

    fn options() -> OutlierOptions {
        OutlierOptions::builder()
            .methods(vec![Method::Iqr])
            .verbose(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_partition_in_first_appearance_order() {
        let data = Dataset::new()
            .with_categorical("g", vec!["b".into(), "a".into(), "b".into(), "c".into()])
            .unwrap();
        let (keys, groups) = partition(&data, "g").unwrap();
        assert_eq!(keys, vec!["b", "a", "b", "c"]);
        let ids: Vec<&str> = groups.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(groups[0].1, vec![0, 2]);
    }

    #[test]
    fn test_rows_keep_original_order() {
        let result = check_grouped(&two_groups(), "g", &options()).unwrap();
        assert_eq!(result.len(), 10);
        assert_eq!(result.outlier_indices(), vec![8]);
        assert_eq!(result.group_of(8), Some("a"));
        assert_eq!(result.groups(), vec!["a", "b"]);
        assert_eq!(result.variables(), &["x".to_string()]);
        assert_eq!(result.thresholds().len(), 2);
    }

    #[test]
    fn test_unknown_group_column() {
        assert!(check_grouped(&two_groups(), "missing", &options()).is_err());
    }
}
