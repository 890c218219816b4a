//! Pearson correlation and its t-statistic for one pair of columns

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rejected;
use crate::row::{ColumnReader, DataType, Field, Schema, Value};
use crate::statistics::{pearson, t_statistic, CoMoments};
use crate::traits::{ConfigError, MergeError, RowSummarizer, Summarizer, SummarizerFactory};

/// Rendered correlation of one column pair
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationOutput {
    /// Pearson correlation in `[-1, 1]`, NaN when undefined
    pub correlation: f64,
    /// t-statistic of the correlation against zero
    pub t_stat: f64,
}

impl CorrelationOutput {
    pub(crate) fn from_parts(count: u64, m2_x: f64, m2_y: f64, cxy: f64) -> Self {
        let correlation = pearson(count, m2_x, m2_y, cxy);
        Self {
            correlation,
            t_stat: t_statistic(correlation, count),
        }
    }
}

/// Output fields for a correlation of `x` and `y`
pub(crate) fn correlation_fields(x: &str, y: &str) -> [Field; 2] {
    [
        Field::new(format!("{}_{}_correlation", x, y), DataType::Float64),
        Field::new(format!("{}_{}_correlation_t_stat", x, y), DataType::Float64),
    ]
}

/// Configuration for a [`CorrelationSummarizer`]
///
/// # Example
///
/// ```
/// use flowstats_summarize::row::{DataType, Field, Schema, Value};
/// use flowstats_summarize::summarizer::{summarize, CorrelationSummarizerFactory};
/// use flowstats_summarize::traits::SummarizerFactory;
///
/// let schema = Schema::new(vec![
///     Field::new("x", DataType::Int32),
///     Field::new("y", DataType::Float64),
/// ]);
/// let rows = vec![
///     vec![Value::Int32(1), Value::Float64(2.0)],
///     vec![Value::Int32(2), Value::Float64(4.1)],
///     vec![Value::Int32(3), Value::Float64(5.9)],
/// ];
///
/// let corr = CorrelationSummarizerFactory::new("x", "y").build(&schema).unwrap();
/// let output = summarize(&corr, &rows);
/// assert!(output.correlation > 0.99);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationSummarizerFactory {
    pub x: String,
    pub y: String,
}

impl CorrelationSummarizerFactory {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl SummarizerFactory for CorrelationSummarizerFactory {
    type Summarizer = CorrelationSummarizer;

    fn build(&self, schema: &Schema) -> Result<CorrelationSummarizer, ConfigError> {
        if self.x == self.y {
            return Err(rejected(
                "correlation",
                ConfigError::DuplicateColumn {
                    name: self.x.clone(),
                },
            ));
        }
        let x_reader = schema
            .numeric_column(&self.x)
            .map_err(|e| rejected("correlation", e))?;
        let y_reader = schema
            .numeric_column(&self.y)
            .map_err(|e| rejected("correlation", e))?;

        debug!(
            x = %self.x,
            y = %self.y,
            x_index = x_reader.index(),
            y_index = y_reader.index(),
            "built correlation summarizer"
        );

        Ok(CorrelationSummarizer {
            x: self.x.clone(),
            y: self.y.clone(),
            x_reader,
            y_reader,
        })
    }
}

/// Correlation summarizer bound to two numeric columns
///
/// Rows where either value is NaN (including nulls) are skipped.
#[derive(Clone, Debug)]
pub struct CorrelationSummarizer {
    x: String,
    y: String,
    x_reader: ColumnReader,
    y_reader: ColumnReader,
}

impl CorrelationSummarizer {
    pub fn columns(&self) -> (&str, &str) {
        (&self.x, &self.y)
    }
}

#[inline]
fn is_complete(x: f64, y: f64) -> bool {
    !x.is_nan() && !y.is_nan()
}

impl Summarizer for CorrelationSummarizer {
    type Input = (f64, f64);
    type State = CoMoments;
    type Output = CorrelationOutput;

    fn zero(&self) -> CoMoments {
        CoMoments::new()
    }

    fn add(&self, state: &mut CoMoments, &(x, y): &(f64, f64)) {
        if is_complete(x, y) {
            state.add(x, y);
        }
    }

    fn merge(&self, state: &mut CoMoments, other: &CoMoments) -> Result<(), MergeError> {
        state.merge(other);
        Ok(())
    }

    fn subtract(&self, state: &mut CoMoments, &(x, y): &(f64, f64)) {
        if is_complete(x, y) {
            state.remove(x, y);
        }
    }

    fn render(&self, state: &CoMoments) -> CorrelationOutput {
        CorrelationOutput::from_parts(state.len(), state.x().m2(), state.y().m2(), state.comoment())
    }
}

impl RowSummarizer for CorrelationSummarizer {
    fn extract(&self, row: &[Value]) -> (f64, f64) {
        (self.x_reader.read(row), self.y_reader.read(row))
    }

    fn output_fields(&self) -> Vec<Field> {
        correlation_fields(&self.x, &self.y).to_vec()
    }

    fn output_values(&self, output: &CorrelationOutput) -> Vec<f64> {
        vec![output.correlation, output.t_stat]
    }
}
