//! Running univariate moments (count, mean, M2)
//!
//! Streaming mean and variance using Welford's numerically stable online
//! algorithm, with an exact inverse for removing an observation and Chan et
//! al.'s parallel combination for merging.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative size, in units of `f64::EPSILON`, below which a removal residue is
/// treated as zero
const REMOVE_TOLERANCE: f64 = 64.0 * f64::EPSILON;

/// Running count, mean and sum of squared deviations
///
/// Equivalent to keeping `n`, `sum` and `sum of squares`, but stable for
/// values with a large common offset.
///
/// # Example
///
/// ```
/// use flowstats_summarize::statistics::Moments;
///
/// let mut moments = Moments::new();
/// for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     moments.add(value);
/// }
/// assert!((moments.mean() - 5.0).abs() < 1e-12);
/// assert!((moments.variance() - 4.0).abs() < 1e-12);
///
/// moments.remove(9.0);
/// assert_eq!(moments.len(), 7);
/// assert!((moments.mean() - 31.0 / 7.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Moments {
    /// Number of values seen
    count: u64,
    /// Running mean
    mean: f64,
    /// Sum of squared differences from mean (M2 in Welford's algorithm)
    m2: f64,
}

impl Moments {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    ///
    /// The caller is responsible for filtering NaN.
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Remove a value previously passed to [`add`](Self::add)
    #[inline]
    pub fn remove(&mut self, value: f64) {
        debug_assert!(self.count > 0, "remove from empty moments");
        if self.count <= 1 {
            *self = Self::new();
            return;
        }

        let remaining = self.count - 1;
        let mean = self.mean - (value - self.mean) / remaining as f64;
        let removed = (value - mean) * (value - self.mean);

        // residue of the cancellation; a constant remainder reads as zero variance
        let noise = REMOVE_TOLERANCE * (self.m2 + (mean * (value - self.mean)).abs());
        self.m2 -= removed;
        if self.m2 <= noise {
            self.m2 = 0.0;
        }
        self.mean = mean;
        self.count = remaining;
    }

    /// Combine with moments of a disjoint set of values
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }

        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let weight = self.count as f64 * other.count as f64 / count as f64;

        self.mean += delta * (other.count as f64 / count as f64);
        self.m2 += other.m2 + delta * delta * weight;
        self.count = count;
    }

    /// Get the number of values
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean, NaN when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Running mean without the empty check, zero when empty
    #[inline]
    pub(crate) fn mean_or_zero(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean
    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// Population variance, NaN when empty
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Sum of all values
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }
}
