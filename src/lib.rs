//! # Flowstats Summarize
//!
//! Mergeable, incremental statistical summaries over ordered row streams.
//!
//! Each summarizer keeps a small running state that can be grown one row at a
//! time, merged with the state of any disjoint row range in O(1), and rendered
//! into a statistic without revisiting earlier rows.
//!
//! ## Features
//!
//! - **Z-score**: score each row against all rows so far, or all rows except itself
//! - **Correlation**: Pearson correlation and t-statistic for a column pair
//! - **Multi-correlation**: all pairs within a column set, or cross pairs
//!   between two sets, computed over shared per-column statistics
//! - **Full Mergeability**: states combine across partitions and workers
//! - **Fail-fast configuration**: column names are validated once, before any row
//!
//! ## Quick Start
//!
//! ```rust
//! use flowstats_summarize::prelude::*;
//!
//! let schema = Schema::new(vec![
//!     Field::new("x", DataType::Float64),
//!     Field::new("y", DataType::Float64),
//! ]);
//! let rows: Vec<Row> = vec![
//!     vec![1.0.into(), 2.0.into()],
//!     vec![2.0.into(), 3.9.into()],
//!     vec![3.0.into(), 6.1.into()],
//! ];
//!
//! let corr = CorrelationSummarizerFactory::new("x", "y").build(&schema).unwrap();
//! let output = summarize(&corr, &rows);
//! println!("r = {}, t = {}", output.correlation, output.t_stat);
//! ```
//!
//! ## Distributed Computing
//!
//! Every summarizer implements [`Summarizer`](traits::Summarizer), whose
//! `merge` combines partial states computed independently:
//!
//! ```rust
//! use flowstats_summarize::prelude::*;
//!
//! let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
//! let zscore = ZScoreSummarizerFactory::new("x").build(&schema).unwrap();
//!
//! // Each worker folds its partition
//! let mut worker1 = fold(&zscore, [1.0, 2.0]);
//! let worker2 = fold(&zscore, [3.0, 4.0]);
//!
//! // Merge results in any order
//! zscore.merge(&mut worker1, &worker2).unwrap();
//! assert!((zscore.render_current(&worker1, &4.0) - 1.3416).abs() < 1e-4);
//! ```
//!
//! ## Feature Flags
//!
//! - `zscore` (default): z-score summarizer
//! - `correlation` (default): single and multi-pair correlation summarizers
//! - `full`: enable all summarizer families
//! - `serde`: serialization of configurations and running states

#![cfg_attr(docsrs, feature(doc_cfg))]

// Core traits always available
pub mod traits;

pub mod row;
pub mod statistics;
pub mod summarizer;

pub mod prelude {
    pub use crate::row::{DataType, Field, Row, Schema, Value};
    pub use crate::summarizer::{fold, summarize, summarize_cumulative};
    pub use crate::traits::*;

    #[cfg(feature = "correlation")]
    pub use crate::summarizer::{
        CorrelationOutput, CorrelationSummarizerFactory, MultiCorrelationSummarizerFactory,
    };

    #[cfg(feature = "zscore")]
    pub use crate::summarizer::ZScoreSummarizerFactory;
}

pub use traits::{ConfigError, MergeError, RowSummarizer, Summarizer, SummarizerFactory};
