//! Mergeable sufficient statistics
//!
//! Building blocks shared by the summarizers. Each accumulator supports
//! O(1) add, remove and merge, so statistics for any combination of row
//! ranges can be derived without rescanning rows.
//!
//! # Example
//!
//! ```
//! use flowstats_summarize::statistics::{t_statistic, CoMoments};
//!
//! let mut left = CoMoments::new();
//! let mut right = CoMoments::new();
//! left.add(1.0, 1.0);
//! left.add(2.0, 3.0);
//! right.add(3.0, 2.0);
//! right.add(4.0, 5.0);
//!
//! left.merge(&right);
//! let r = left.correlation();
//! println!("r = {}, t = {}", r, t_statistic(r, left.len()));
//! ```

mod comoments;
mod moments;

pub use comoments::CoMoments;
pub use moments::Moments;

/// Pearson correlation from count, both M2 terms and the co-moment
///
/// NaN when fewer than two observations or either variable has zero
/// variance. The result is clamped to `[-1, 1]`.
#[inline]
pub fn pearson(count: u64, m2_x: f64, m2_y: f64, cxy: f64) -> f64 {
    if count < 2 {
        return f64::NAN;
    }
    let denom = (m2_x * m2_y).sqrt();
    if denom.is_nan() || denom <= 0.0 {
        return f64::NAN;
    }
    (cxy / denom).clamp(-1.0, 1.0)
}

/// t-statistic for testing correlation `r` against zero with `count` samples
///
/// - NaN when `r` is NaN or `count <= 2`
/// - infinity carrying the sign of `r` when `|r| == 1`
/// - `r * sqrt((n - 2) / (1 - r^2))` otherwise
#[inline]
pub fn t_statistic(r: f64, count: u64) -> f64 {
    if r.is_nan() || count <= 2 {
        return f64::NAN;
    }
    let residual = 1.0 - r * r;
    if residual <= 0.0 {
        return f64::INFINITY.copysign(r);
    }
    r * ((count - 2) as f64 / residual).sqrt()
}
