//! Correlation of many column pairs in a single pass
//!
//! Per-column moments are shared by every pair that references the column;
//! only the co-moment is kept per pair, so each row costs `O(k + pairs)`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::correlation::{correlation_fields, CorrelationOutput};
use super::pairs::ColumnPairs;
use super::rejected;
use crate::row::{ColumnReader, Field, Schema, Value};
use crate::statistics::Moments;
use crate::traits::{ConfigError, MergeError, RowSummarizer, Summarizer, SummarizerFactory};

/// Configuration for a [`MultiCorrelationSummarizer`]
///
/// Without `others`, every pair within `columns` is correlated. With
/// `others`, every column of `columns` is correlated with every column of
/// `others`, and the two lists must be disjoint.
///
/// # Example
///
/// ```
/// use flowstats_summarize::summarizer::MultiCorrelationSummarizerFactory;
///
/// let factory = MultiCorrelationSummarizerFactory::new(["a", "b", "c"]).with_others(["d"]);
/// let pairs = factory.pairs().unwrap();
/// let names: Vec<_> = pairs.names().collect();
/// assert_eq!(names, vec![("a", "d"), ("b", "d"), ("c", "d")]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiCorrelationSummarizerFactory {
    pub columns: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub others: Option<Vec<String>>,
}

impl MultiCorrelationSummarizerFactory {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            others: None,
        }
    }

    /// Switch to cross-pair mode against `others`
    pub fn with_others<I, S>(mut self, others: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.others = Some(others.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve the configured pairs by column name
    pub fn pairs(&self) -> Result<ColumnPairs, ConfigError> {
        match &self.others {
            None => ColumnPairs::all_pairs(&self.columns),
            Some(others) => ColumnPairs::cross(&self.columns, others),
        }
    }
}

impl SummarizerFactory for MultiCorrelationSummarizerFactory {
    type Summarizer = MultiCorrelationSummarizer;

    fn build(&self, schema: &Schema) -> Result<MultiCorrelationSummarizer, ConfigError> {
        let pairs = self
            .pairs()
            .map_err(|e| rejected("multi_correlation", e))?;
        let readers = pairs
            .columns()
            .iter()
            .map(|name| schema.numeric_column(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| rejected("multi_correlation", e))?;

        debug!(
            columns = readers.len(),
            pairs = pairs.len(),
            cross = self.others.is_some(),
            "built multi-correlation summarizer"
        );

        Ok(MultiCorrelationSummarizer { pairs, readers })
    }
}

/// Running state of a [`MultiCorrelationSummarizer`]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiCorrelationState {
    count: u64,
    /// One entry per column
    columns: Vec<Moments>,
    /// One co-moment per configured pair
    comoments: Vec<f64>,
}

impl MultiCorrelationState {
    fn new(columns: usize, pairs: usize) -> Self {
        Self {
            count: 0,
            columns: vec![Moments::new(); columns],
            comoments: vec![0.0; pairs],
        }
    }

    /// Get the number of complete rows
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Moments of the column at `index` in configuration order
    pub fn column(&self, index: usize) -> Option<&Moments> {
        self.columns.get(index)
    }

    /// Co-moments in pair order
    pub fn comoments(&self) -> &[f64] {
        &self.comoments
    }
}

/// Multi-pair correlation summarizer bound to a schema
///
/// Rows with a NaN (or null) in any configured column are skipped so that
/// every pair is computed over the same rows.
#[derive(Clone, Debug)]
pub struct MultiCorrelationSummarizer {
    pairs: ColumnPairs,
    readers: Vec<ColumnReader>,
}

impl MultiCorrelationSummarizer {
    pub fn pairs(&self) -> &ColumnPairs {
        &self.pairs
    }

    fn check_shape(&self, state: &MultiCorrelationState) -> Result<(), MergeError> {
        if state.columns.len() != self.readers.len() || state.comoments.len() != self.pairs.len()
        {
            return Err(MergeError::IncompatibleConfig {
                expected: format!(
                    "columns={}, pairs={}",
                    self.readers.len(),
                    self.pairs.len()
                ),
                found: format!(
                    "columns={}, pairs={}",
                    state.columns.len(),
                    state.comoments.len()
                ),
            });
        }
        Ok(())
    }

    /// Whether `values` can be folded into `state`
    ///
    /// Inputs of the wrong length or states built by a differently configured
    /// summarizer are skipped rather than indexed out of bounds.
    fn accepts(&self, state: &MultiCorrelationState, values: &[f64]) -> bool {
        values.len() == self.readers.len()
            && self.check_shape(state).is_ok()
            && !values.iter().any(|v| v.is_nan())
    }
}

impl Summarizer for MultiCorrelationSummarizer {
    type Input = Vec<f64>;
    type State = MultiCorrelationState;
    type Output = Vec<CorrelationOutput>;

    fn zero(&self) -> MultiCorrelationState {
        MultiCorrelationState::new(self.readers.len(), self.pairs.len())
    }

    fn add(&self, state: &mut MultiCorrelationState, values: &Vec<f64>) {
        if !self.accepts(state, values) {
            return;
        }

        state.count += 1;
        // the new deviation is the old one scaled by (n - 1) / n
        let scale = (state.count - 1) as f64 / state.count as f64;
        for (p, &(i, j)) in self.pairs.pairs().iter().enumerate() {
            let dx = values[i] - state.columns[i].mean_or_zero();
            let dy = values[j] - state.columns[j].mean_or_zero();
            state.comoments[p] += dx * dy * scale;
        }
        for (moments, &v) in state.columns.iter_mut().zip(values) {
            moments.add(v);
        }
    }

    fn merge(
        &self,
        state: &mut MultiCorrelationState,
        other: &MultiCorrelationState,
    ) -> Result<(), MergeError> {
        self.check_shape(state)?;
        self.check_shape(other)?;

        if other.count == 0 {
            return Ok(());
        }
        if state.count == 0 {
            *state = other.clone();
            return Ok(());
        }

        let (na, nb) = (state.count as f64, other.count as f64);
        let weight = na * nb / (na + nb);
        for (p, &(i, j)) in self.pairs.pairs().iter().enumerate() {
            let dx = other.columns[i].mean() - state.columns[i].mean();
            let dy = other.columns[j].mean() - state.columns[j].mean();
            state.comoments[p] += other.comoments[p] + dx * dy * weight;
        }
        for (moments, theirs) in state.columns.iter_mut().zip(&other.columns) {
            moments.merge(theirs);
        }
        state.count += other.count;
        Ok(())
    }

    fn subtract(&self, state: &mut MultiCorrelationState, values: &Vec<f64>) {
        if !self.accepts(state, values) {
            return;
        }
        debug_assert!(state.count > 0, "subtract from empty state");
        if state.count <= 1 {
            *state = self.zero();
            return;
        }

        let scale = state.count as f64 / (state.count - 1) as f64;
        for (p, &(i, j)) in self.pairs.pairs().iter().enumerate() {
            let dx = values[i] - state.columns[i].mean();
            let dy = values[j] - state.columns[j].mean();
            state.comoments[p] -= dx * dy * scale;
        }
        for (moments, &v) in state.columns.iter_mut().zip(values) {
            moments.remove(v);
        }
        // a column left constant has no co-moment, only removal residue
        for (p, &(i, j)) in self.pairs.pairs().iter().enumerate() {
            if state.columns[i].m2() == 0.0 || state.columns[j].m2() == 0.0 {
                state.comoments[p] = 0.0;
            }
        }
        state.count -= 1;
    }

    fn render(&self, state: &MultiCorrelationState) -> Vec<CorrelationOutput> {
        if self.check_shape(state).is_err() {
            let undefined = CorrelationOutput::from_parts(0, 0.0, 0.0, 0.0);
            return vec![undefined; self.pairs.len()];
        }
        self.pairs
            .pairs()
            .iter()
            .zip(&state.comoments)
            .map(|(&(i, j), &cxy)| {
                CorrelationOutput::from_parts(
                    state.count,
                    state.columns[i].m2(),
                    state.columns[j].m2(),
                    cxy,
                )
            })
            .collect()
    }
}

impl RowSummarizer for MultiCorrelationSummarizer {
    fn extract(&self, row: &[Value]) -> Vec<f64> {
        self.readers.iter().map(|r| r.read(row)).collect()
    }

    fn output_fields(&self) -> Vec<Field> {
        self.pairs
            .names()
            .flat_map(|(x, y)| correlation_fields(x, y))
            .collect()
    }

    fn output_values(&self, output: &Vec<CorrelationOutput>) -> Vec<f64> {
        output
            .iter()
            .flat_map(|o| [o.correlation, o.t_stat])
            .collect()
    }
}
