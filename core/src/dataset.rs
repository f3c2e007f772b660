//! Paired categorical observations and derived category sets
//!
//! The dataset is a positional sequence of observation pairs: position
//! matters only so that the sampler can permute each column independently
//! and recombine by index. Rows containing missing values are retained —
//! a null cell never matches any concrete category, so such rows count
//! toward conditioning denominators only through exact matches that cannot
//! occur.
//!
//! Structural validity is enforced at construction: downstream components
//! assume at least one row and at least one distinct non-null category per
//! column, which is what makes every conditioning denominator over a
//! derived category value nonzero.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural dataset errors surfaced before any computation starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset contains no rows")]
    EmptyDataset,

    #[error("{column} column contains no non-null category values")]
    EmptyCategory { column: ColumnRole },
}

/// Which of the two observed variables a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Independent,
    Dependent,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Independent => write!(f, "independent"),
            ColumnRole::Dependent => write!(f, "dependent"),
        }
    }
}

/// One observation: a category value for each of the two variables.
///
/// `None` encodes a missing cell. Equality of labels is exact string
/// match; null never equals any label, including another null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationPair {
    pub independent: Option<String>,
    pub dependent: Option<String>,
}

impl ObservationPair {
    pub fn new(independent: Option<String>, dependent: Option<String>) -> Self {
        Self { independent, dependent }
    }
}

/// Validated, read-only collection of paired observations.
///
/// Construction derives the distinct non-null category set of each column,
/// sorted lexicographically so that iteration order — and therefore output
/// ordering and seeded randomization trajectories — is stable across runs
/// and insensitive to row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalDataset {
    column_a: Vec<Option<String>>,
    column_b: Vec<Option<String>>,
    categories_a: Vec<String>,
    categories_b: Vec<String>,
}

impl CategoricalDataset {
    /// Builds a dataset from an ordered sequence of observation pairs.
    ///
    /// Fails with [`DatasetError::EmptyDataset`] on zero rows and with
    /// [`DatasetError::EmptyCategory`] when either column carries no
    /// non-null value at all — both conditions would otherwise surface
    /// later as silent divide-by-zero degeneracies.
    pub fn new(rows: Vec<ObservationPair>) -> Result<Self, DatasetError> {
        if rows.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }

        let mut column_a = Vec::with_capacity(rows.len());
        let mut column_b = Vec::with_capacity(rows.len());
        for row in rows {
            column_a.push(row.independent);
            column_b.push(row.dependent);
        }

        let categories_a = distinct_sorted(&column_a);
        if categories_a.is_empty() {
            return Err(DatasetError::EmptyCategory {
                column: ColumnRole::Independent,
            });
        }
        let categories_b = distinct_sorted(&column_b);
        if categories_b.is_empty() {
            return Err(DatasetError::EmptyCategory {
                column: ColumnRole::Dependent,
            });
        }

        Ok(Self {
            column_a,
            column_b,
            categories_a,
            categories_b,
        })
    }

    /// Number of observation rows, null-bearing rows included.
    pub fn len(&self) -> usize {
        self.column_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_a.is_empty()
    }

    /// Raw independent-variable column, in original row order.
    pub fn column_a(&self) -> &[Option<String>] {
        &self.column_a
    }

    /// Raw dependent-variable column, in original row order.
    pub fn column_b(&self) -> &[Option<String>] {
        &self.column_b
    }

    /// Distinct non-null values of the independent variable, sorted.
    pub fn categories_a(&self) -> &[String] {
        &self.categories_a
    }

    /// Distinct non-null values of the dependent variable, sorted.
    pub fn categories_b(&self) -> &[String] {
        &self.categories_b
    }
}

fn distinct_sorted(column: &[Option<String>]) -> Vec<String> {
    // BTreeSet gives dedup and lexicographic order in one pass.
    column
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> ObservationPair {
        ObservationPair::new(Some(a.to_owned()), Some(b.to_owned()))
    }

    #[test]
    fn derives_sorted_category_sets() {
        let data = CategoricalDataset::new(vec![
            pair("A1", "B1"),
            pair("A1", "B1"),
            pair("A1", "B2"),
            pair("A2", "B2"),
        ])
        .unwrap();

        assert_eq!(data.categories_a(), ["A1", "A2"]);
        assert_eq!(data.categories_b(), ["B1", "B2"]);
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn category_derivation_is_row_order_invariant() {
        let forward = CategoricalDataset::new(vec![
            pair("A2", "B2"),
            pair("A1", "B1"),
            pair("A1", "B2"),
        ])
        .unwrap();
        let backward = CategoricalDataset::new(vec![
            pair("A1", "B2"),
            pair("A1", "B1"),
            pair("A2", "B2"),
        ])
        .unwrap();

        assert_eq!(forward.categories_a(), backward.categories_a());
        assert_eq!(forward.categories_b(), backward.categories_b());
    }

    #[test]
    fn null_cells_do_not_contribute_categories() {
        let data = CategoricalDataset::new(vec![
            ObservationPair::new(Some("A1".into()), None),
            ObservationPair::new(Some("A2".into()), Some("B1".into())),
            ObservationPair::new(None, Some("B1".into())),
        ])
        .unwrap();

        assert_eq!(data.categories_a(), ["A1", "A2"]);
        assert_eq!(data.categories_b(), ["B1"]);
        // Null-bearing rows are retained in the columns.
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert_eq!(
            CategoricalDataset::new(Vec::new()).unwrap_err(),
            DatasetError::EmptyDataset
        );
    }

    #[test]
    fn all_null_column_is_rejected() {
        let err = CategoricalDataset::new(vec![
            ObservationPair::new(None, None),
            ObservationPair::new(None, None),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DatasetError::EmptyCategory {
                column: ColumnRole::Independent
            }
        );

        let err = CategoricalDataset::new(vec![
            ObservationPair::new(Some("A1".into()), None),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DatasetError::EmptyCategory {
                column: ColumnRole::Dependent
            }
        );
    }
}
