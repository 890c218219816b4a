//! Column pair resolution for multi-column correlation

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::ConfigError;

/// Ordered columns plus the `(i, j)` index pairs to correlate
///
/// Indices refer to positions in [`columns`](Self::columns). Every pair
/// references two distinct columns and no pair appears twice.
///
/// # Example
///
/// ```
/// use flowstats_summarize::summarizer::ColumnPairs;
///
/// let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// let pairs = ColumnPairs::all_pairs(&columns).unwrap();
/// assert_eq!(pairs.pairs(), &[(0, 1), (0, 2), (1, 2)]);
///
/// let others = vec!["d".to_string()];
/// let pairs = ColumnPairs::cross(&columns, &others).unwrap();
/// assert_eq!(pairs.pairs(), &[(0, 3), (1, 3), (2, 3)]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnPairs {
    columns: Vec<String>,
    pairs: Vec<(usize, usize)>,
}

impl ColumnPairs {
    /// Every `(i, j)` with `i < j` within one column set
    pub fn all_pairs(columns: &[String]) -> Result<Self, ConfigError> {
        check_distinct(columns, "columns")?;

        let k = columns.len();
        let pairs = (0..k)
            .flat_map(|i| (i + 1..k).map(move |j| (i, j)))
            .collect();

        Ok(Self {
            columns: columns.to_vec(),
            pairs,
        })
    }

    /// Every pair of one column from `columns` with one from `others`
    ///
    /// The two sets must be non-empty and disjoint.
    pub fn cross(columns: &[String], others: &[String]) -> Result<Self, ConfigError> {
        check_distinct(columns, "columns")?;
        check_distinct(others, "others")?;

        let seen: HashSet<&str> = columns.iter().map(String::as_str).collect();
        if let Some(name) = others.iter().find(|name| seen.contains(name.as_str())) {
            return Err(ConfigError::OverlappingColumns { name: name.clone() });
        }

        let k = columns.len();
        let pairs = (0..k)
            .flat_map(|i| (0..others.len()).map(move |j| (i, k + j)))
            .collect();

        let mut all = columns.to_vec();
        all.extend_from_slice(others);
        Ok(Self {
            columns: all,
            pairs,
        })
    }

    /// All columns referenced by the pairs, in index order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs as column names
    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs
            .iter()
            .map(move |&(i, j)| (self.columns[i].as_str(), self.columns[j].as_str()))
    }
}

fn check_distinct(columns: &[String], which: &'static str) -> Result<(), ConfigError> {
    if columns.is_empty() {
        return Err(ConfigError::EmptyColumns { which });
    }
    let mut seen = HashSet::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateColumn { name: name.clone() });
        }
    }
    Ok(())
}
