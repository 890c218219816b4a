//! Core traits for incremental summarizers
//!
//! Every summarizer implements the [`Summarizer`] algebra. Summarizers that are
//! bound to a row schema additionally implement [`RowSummarizer`], and are
//! produced by a [`SummarizerFactory`] that validates configuration once.

use core::fmt::Debug;

use thiserror::Error;

use crate::row::{DataType, Field, Schema, Value};

/// Error raised while building a summarizer from its configuration
///
/// These are always surfaced before any row is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Column name is not part of the input schema
    #[error("unknown column: {name}")]
    UnknownColumn { name: String },
    /// Column exists but its type cannot be coerced to a number
    #[error("column {name} has non-numeric type {data_type}")]
    NonNumericColumn { name: String, data_type: DataType },
    /// A required column list is empty
    #[error("column list `{which}` must not be empty")]
    EmptyColumns { which: &'static str },
    /// The same column appears twice where distinct columns are required
    #[error("duplicate column: {name}")]
    DuplicateColumn { name: String },
    /// Cross-pair column sets share a column
    #[error("column {name} appears in both `columns` and `others`")]
    OverlappingColumns { name: String },
}

/// Error during state merge operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// States were produced by summarizers with different shapes
    #[error("incompatible config: expected {expected}, found {found}")]
    IncompatibleConfig { expected: String, found: String },
}

/// Mergeable incremental summarizer
///
/// A summarizer is an immutable description of a statistic. All running data
/// lives in [`Summarizer::State`], which is created with [`zero`](Self::zero),
/// grown with [`add`](Self::add) and combined with [`merge`](Self::merge).
///
/// # Laws
///
/// - `merge` is associative and commutative, and `zero()` is its identity.
/// - Folding the union of two disjoint observation sets gives the same state
///   as merging the states of each set (within floating point tolerance).
/// - `subtract(add(s, x), x)` restores the statistics of `s`, so
///   `render_current(subtract(s, x), x)` is the output for `x` computed over
///   every other observation.
///
/// # Example
///
/// ```
/// use flowstats_summarize::row::{DataType, Field, Schema};
/// use flowstats_summarize::summarizer::{fold, ZScoreSummarizerFactory};
/// use flowstats_summarize::traits::{Summarizer, SummarizerFactory};
///
/// let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
/// let zscore = ZScoreSummarizerFactory::new("x").build(&schema).unwrap();
///
/// let mut left = fold(&zscore, [1.0, 2.0]);
/// let right = fold(&zscore, [3.0, 4.0]);
/// zscore.merge(&mut left, &right).unwrap();
///
/// // score the value 4.0 against all four observations
/// assert!((zscore.render_current(&left, &4.0) - 1.3416).abs() < 1e-4);
/// ```
pub trait Summarizer {
    /// One observation, already projected out of a row
    type Input;

    /// Running sufficient statistics
    type State: Clone + Debug;

    /// Rendered statistic(s)
    type Output;

    /// State representing zero observations
    fn zero(&self) -> Self::State;

    /// Fold one observation into the state
    fn add(&self, state: &mut Self::State, value: &Self::Input);

    /// Merge the state of a disjoint set of observations into `state`
    ///
    /// Returns an error if the states have incompatible shapes.
    fn merge(&self, state: &mut Self::State, other: &Self::State) -> Result<(), MergeError>;

    /// Remove an observation previously added with [`add`](Self::add)
    ///
    /// The caller must only subtract a value that was added to this state,
    /// normally the one added most recently. This is not checked at runtime.
    fn subtract(&self, state: &mut Self::State, value: &Self::Input);

    /// Produce the statistic from the running state
    ///
    /// Never fails: degenerate inputs render as NaN or infinities.
    fn render(&self, state: &Self::State) -> Self::Output;

    /// Produce the statistic attributed to the observation `current`
    ///
    /// Per-row drivers call this with the row's own observation after adding
    /// it to `state`. Statistics of the observation set alone ignore
    /// `current`, which is the default.
    fn render_current(&self, state: &Self::State, current: &Self::Input) -> Self::Output {
        let _ = current;
        self.render(state)
    }
}

/// Summarizer bound to the columns of a concrete schema
pub trait RowSummarizer: Summarizer {
    /// Project a row onto this summarizer's input using cached column indices
    fn extract(&self, row: &[Value]) -> Self::Input;

    /// Ordered output fields, derived only from configuration
    fn output_fields(&self) -> Vec<Field>;

    /// Flatten an output into values aligned with [`output_fields`](Self::output_fields)
    fn output_values(&self, output: &Self::Output) -> Vec<f64>;
}

/// Builds schema-bound summarizers from an immutable configuration
///
/// All column validation happens in [`build`](Self::build); the returned
/// summarizer can be reused for any number of independent states.
pub trait SummarizerFactory {
    /// The summarizer produced by this factory
    type Summarizer: RowSummarizer;

    /// Resolve column names against `schema` and build a summarizer
    fn build(&self, schema: &Schema) -> Result<Self::Summarizer, ConfigError>;
}
