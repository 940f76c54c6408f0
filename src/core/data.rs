//! Rectangular datasets with mixed column types.

use crate::error::{OutlierError, Result};
use faer::Mat;

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Real values; `NaN` marks a missing value.
    Numeric(Vec<f64>),
    /// Labels such as factor levels.
    Categorical(Vec<String>),
    /// Boolean indicators. Not used as a numeric variable.
    Logical(Vec<bool>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
            ColumnData::Logical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    /// Value of row `i` rendered as a grouping key.
    pub fn key(&self, i: usize) -> String {
        match self {
            ColumnData::Numeric(v) if v[i].is_nan() => "NA".to_string(),
            ColumnData::Numeric(v) => format!("{}", v[i]),
            ColumnData::Categorical(v) => v[i].clone(),
            ColumnData::Logical(v) => if v[i] { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    fn subset(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnData::Logical(v) => ColumnData::Logical(rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Numeric variables extracted from a dataset or model.
#[derive(Debug, Clone)]
pub struct NumericData {
    /// Observations in rows, variables in columns.
    pub matrix: Mat<f64>,
    /// Variable names, one per matrix column.
    pub names: Vec<String>,
}

impl NumericData {
    /// Wrap a matrix, naming its columns `x1..xk`.
    pub fn from_matrix(matrix: Mat<f64>) -> Self {
        let names = (1..=matrix.ncols()).map(|j| format!("x{j}")).collect();
        Self { matrix, names }
    }

    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.matrix.ncols()
    }
}

/// A rectangular dataset: named columns of equal length.
///
/// # Example
///
/// ```rust,ignore
/// use regress_outliers::core::Dataset;
///
/// let data = Dataset::new()
///     .with_numeric("x", vec![1.0, 2.0, 3.0])?
///     .with_categorical("g", vec!["a".into(), "a".into(), "b".into()])?;
/// assert_eq!(data.n_rows(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a numeric matrix with columns named `x1..xk`.
    pub fn from_matrix(x: &Mat<f64>) -> Self {
        let columns = (0..x.ncols())
            .map(|j| Column {
                name: format!("x{}", j + 1),
                data: ColumnData::Numeric((0..x.nrows()).map(|i| x[(i, j)]).collect()),
            })
            .collect();
        Self { columns }
    }

    /// Append a column, checking its length against existing columns.
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Result<Self> {
        let name = name.into();
        if let Some(first) = self.columns.first() {
            if first.data.len() != data.len() {
                return Err(OutlierError::DimensionMismatch {
                    what: format!("column `{name}`"),
                    expected: first.data.len(),
                    got: data.len(),
                });
            }
        }
        self.columns.retain(|c| c.name != name);
        self.columns.push(Column { name, data });
        Ok(self)
    }

    pub fn with_numeric(self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.with_column(name, ColumnData::Numeric(values))
    }

    pub fn with_categorical(self, name: impl Into<String>, values: Vec<String>) -> Result<Self> {
        self.with_column(name, ColumnData::Categorical(values))
    }

    pub fn with_logical(self, name: impl Into<String>, values: Vec<bool>) -> Result<Self> {
        self.with_column(name, ColumnData::Logical(values))
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| OutlierError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Extract the numeric columns, skipping the names in `exclude`.
    ///
    /// Non-numeric columns are dropped. Fails with `NoNumericData` if nothing is left.
    pub fn numeric(&self, exclude: &[&str]) -> Result<NumericData> {
        let numeric: Vec<(&str, &Vec<f64>)> = self
            .columns
            .iter()
            .filter(|c| !exclude.contains(&c.name.as_str()))
            .filter_map(|c| match &c.data {
                ColumnData::Numeric(v) => Some((c.name.as_str(), v)),
                _ => None,
            })
            .collect();

        if numeric.is_empty() {
            return Err(OutlierError::NoNumericData);
        }

        let matrix = Mat::from_fn(self.n_rows(), numeric.len(), |i, j| numeric[j].1[i]);
        let names = numeric.iter().map(|(n, _)| n.to_string()).collect();
        Ok(NumericData { matrix, names })
    }

    /// Keep only the given rows, in the given order.
    pub fn subset_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.subset(rows),
                })
                .collect(),
        }
    }
}
