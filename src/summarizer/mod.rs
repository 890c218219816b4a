//! Row summarizers and the drivers that fold rows through them
//!
//! # Summarizers
//!
//! - [`ZScoreSummarizer`]: z-score of the current value, optionally leave-one-out
//! - [`CorrelationSummarizer`]: Pearson correlation and t-statistic of one pair
//! - [`MultiCorrelationSummarizer`]: the same for many pairs in one pass
//!
//! Each is built by its factory, which validates the configuration against a
//! [`Schema`](crate::row::Schema) before any row is read.
//!
//! # Example
//!
//! ```
//! use flowstats_summarize::row::{DataType, Field, Schema, Value};
//! use flowstats_summarize::summarizer::{summarize_cumulative, ZScoreSummarizerFactory};
//! use flowstats_summarize::traits::SummarizerFactory;
//!
//! let schema = Schema::new(vec![Field::new("price", DataType::Float64)]);
//! let zscore = ZScoreSummarizerFactory::new("price").build(&schema).unwrap();
//!
//! let rows: Vec<_> = [10.0, 12.0, 11.0, 15.0].iter().map(|&p| vec![Value::from(p)]).collect();
//! for score in summarize_cumulative(&zscore, &rows) {
//!     println!("{}", score);
//! }
//! ```

use tracing::warn;

use crate::row::Value;
use crate::traits::{ConfigError, RowSummarizer, Summarizer};

#[cfg(feature = "correlation")]
mod correlation;
#[cfg(feature = "correlation")]
mod multi_correlation;
#[cfg(feature = "correlation")]
mod pairs;
#[cfg(feature = "zscore")]
mod zscore;

#[cfg(feature = "correlation")]
pub use correlation::{CorrelationOutput, CorrelationSummarizer, CorrelationSummarizerFactory};
#[cfg(feature = "correlation")]
pub use multi_correlation::{
    MultiCorrelationState, MultiCorrelationSummarizer, MultiCorrelationSummarizerFactory,
};
#[cfg(feature = "correlation")]
pub use pairs::ColumnPairs;
#[cfg(feature = "zscore")]
pub use zscore::{ZScoreSummarizer, ZScoreSummarizerFactory};

/// Fold inputs into a fresh state
pub fn fold<S, I>(summarizer: &S, inputs: I) -> S::State
where
    S: Summarizer,
    I: IntoIterator<Item = S::Input>,
{
    let mut state = summarizer.zero();
    for input in inputs {
        summarizer.add(&mut state, &input);
    }
    state
}

/// Summarize all rows into one output, attributed to the last row
///
/// Equal to the last element of [`summarize_cumulative`]. With no rows the
/// empty state is rendered on its own.
pub fn summarize<S, I>(summarizer: &S, rows: I) -> S::Output
where
    S: RowSummarizer,
    I: IntoIterator,
    I::Item: AsRef<[Value]>,
{
    let mut state = summarizer.zero();
    let mut last = None;
    for row in rows {
        let input = summarizer.extract(row.as_ref());
        summarizer.add(&mut state, &input);
        last = Some(input);
    }
    match last {
        Some(current) => summarizer.render_current(&state, &current),
        None => summarizer.render(&state),
    }
}

/// One output per row, each over that row and every row before it
pub fn summarize_cumulative<S, I>(summarizer: &S, rows: I) -> Vec<S::Output>
where
    S: RowSummarizer,
    I: IntoIterator,
    I::Item: AsRef<[Value]>,
{
    let rows = rows.into_iter();
    let mut outputs = Vec::with_capacity(rows.size_hint().0);
    let mut state = summarizer.zero();
    for row in rows {
        let input = summarizer.extract(row.as_ref());
        summarizer.add(&mut state, &input);
        outputs.push(summarizer.render_current(&state, &input));
    }
    outputs
}

pub(crate) fn rejected(summarizer: &'static str, err: ConfigError) -> ConfigError {
    warn!(summarizer, error = %err, "rejected summarizer configuration");
    err
}
