//! Z-score of the current observation against the running population
//!
//! Optionally leave-one-out: the scored value is removed from a copy of the
//! running moments before scoring it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rejected;
use crate::row::{ColumnReader, DataType, Field, Schema, Value};
use crate::statistics::Moments;
use crate::traits::{ConfigError, MergeError, RowSummarizer, Summarizer, SummarizerFactory};

/// Configuration for a [`ZScoreSummarizer`]
///
/// # Example
///
/// ```
/// use flowstats_summarize::row::{DataType, Field, Schema, Value};
/// use flowstats_summarize::summarizer::{summarize_cumulative, ZScoreSummarizerFactory};
/// use flowstats_summarize::traits::SummarizerFactory;
///
/// let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
/// let rows: Vec<_> = [1.0, 2.0, 3.0, 4.0].iter().map(|&x| vec![Value::from(x)]).collect();
///
/// let zscore = ZScoreSummarizerFactory::new("x")
///     .exclude_current_observation(true)
///     .build(&schema)
///     .unwrap();
/// let scores = summarize_cumulative(&zscore, &rows);
///
/// assert!(scores[0].is_nan());
/// assert!((scores[3] - 2.4495).abs() < 1e-4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZScoreSummarizerFactory {
    pub column: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_current_observation: bool,
}

impl ZScoreSummarizerFactory {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            exclude_current_observation: false,
        }
    }

    /// Score each row against all other rows instead of all rows
    pub fn exclude_current_observation(mut self, exclude: bool) -> Self {
        self.exclude_current_observation = exclude;
        self
    }
}

impl SummarizerFactory for ZScoreSummarizerFactory {
    type Summarizer = ZScoreSummarizer;

    fn build(&self, schema: &Schema) -> Result<ZScoreSummarizer, ConfigError> {
        let reader = schema
            .numeric_column(&self.column)
            .map_err(|e| rejected("z_score", e))?;

        debug!(
            column = %self.column,
            index = reader.index(),
            exclude_current_observation = self.exclude_current_observation,
            "built z-score summarizer"
        );

        Ok(ZScoreSummarizer {
            column: self.column.clone(),
            reader,
            exclude_current_observation: self.exclude_current_observation,
        })
    }
}

/// Z-score summarizer bound to one numeric column
///
/// The running state is plain [`Moments`] over every non-NaN value seen. The
/// value being scored is not part of the state: it is passed to
/// [`render_current`](Summarizer::render_current), which renders
/// `(x - mean) / stddev` using the population mean and standard deviation of
/// the state, or of the state without `x` when excluding the current
/// observation.
///
/// Renders NaN when fewer than two values remain after exclusion, when the
/// variance is zero, or when `x` is NaN. Plain [`render`](Summarizer::render)
/// has no value to score and always renders NaN.
#[derive(Clone, Debug)]
pub struct ZScoreSummarizer {
    column: String,
    reader: ColumnReader,
    exclude_current_observation: bool,
}

impl ZScoreSummarizer {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn excludes_current_observation(&self) -> bool {
        self.exclude_current_observation
    }
}

/// Score `x` against `moments`, NaN when the population is degenerate
fn score(x: f64, moments: &Moments) -> f64 {
    if moments.len() <= 1 {
        return f64::NAN;
    }
    let variance = moments.variance();
    if variance <= 0.0 {
        return f64::NAN;
    }
    (x - moments.mean()) / variance.sqrt()
}

impl Summarizer for ZScoreSummarizer {
    type Input = f64;
    type State = Moments;
    type Output = f64;

    fn zero(&self) -> Moments {
        Moments::new()
    }

    fn add(&self, state: &mut Moments, value: &f64) {
        if !value.is_nan() {
            state.add(*value);
        }
    }

    fn merge(&self, state: &mut Moments, other: &Moments) -> Result<(), MergeError> {
        state.merge(other);
        Ok(())
    }

    fn subtract(&self, state: &mut Moments, value: &f64) {
        if !value.is_nan() {
            state.remove(*value);
        }
    }

    fn render(&self, _state: &Moments) -> f64 {
        f64::NAN
    }

    fn render_current(&self, state: &Moments, current: &f64) -> f64 {
        let x = *current;
        if x.is_nan() || state.is_empty() {
            return f64::NAN;
        }
        if self.exclude_current_observation {
            let mut others = *state;
            others.remove(x);
            score(x, &others)
        } else {
            score(x, state)
        }
    }
}

impl RowSummarizer for ZScoreSummarizer {
    fn extract(&self, row: &[Value]) -> f64 {
        self.reader.read(row)
    }

    fn output_fields(&self) -> Vec<Field> {
        vec![Field::new(
            format!("{}_z_score", self.column),
            DataType::Float64,
        )]
    }

    fn output_values(&self, output: &f64) -> Vec<f64> {
        vec![*output]
    }
}
