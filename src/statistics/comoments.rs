//! Running bivariate co-moments
//!
//! Tracks the univariate moments of `x` and `y` plus their co-moment
//! `C = sum((x - mean_x) * (y - mean_y))`, enough to derive covariance and
//! Pearson correlation for any prefix, suffix or union of row ranges.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{pearson, Moments};

/// Running co-moments of a pair of variables
///
/// # Example
///
/// ```
/// use flowstats_summarize::statistics::CoMoments;
///
/// let mut c = CoMoments::new();
/// for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.5)] {
///     c.add(x, y);
/// }
/// assert!(c.correlation() > 0.99);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoMoments {
    x: Moments,
    y: Moments,
    /// Sum of products of deviations from the means
    cxy: f64,
}

impl CoMoments {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an `(x, y)` observation
    ///
    /// The caller is responsible for filtering NaN.
    #[inline]
    pub fn add(&mut self, x: f64, y: f64) {
        let dx = x - self.x.mean_or_zero();
        self.x.add(x);
        self.y.add(y);
        // old x deviation times new y deviation
        self.cxy += dx * (y - self.y.mean());
    }

    /// Remove an observation previously passed to [`add`](Self::add)
    #[inline]
    pub fn remove(&mut self, x: f64, y: f64) {
        debug_assert!(!self.x.is_empty(), "remove from empty co-moments");
        if self.x.len() <= 1 {
            *self = Self::new();
            return;
        }

        let mean_y = self.y.mean();
        self.x.remove(x);
        self.y.remove(y);
        self.cxy -= (x - self.x.mean()) * (y - mean_y);
        // a constant variable has no co-moment, only removal residue
        if self.x.m2() == 0.0 || self.y.m2() == 0.0 {
            self.cxy = 0.0;
        }
    }

    /// Combine with co-moments of a disjoint set of observations
    pub fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }

        let (na, nb) = (self.len() as f64, other.len() as f64);
        let dx = other.x.mean() - self.x.mean();
        let dy = other.y.mean() - self.y.mean();

        self.cxy += other.cxy + dx * dy * na * nb / (na + nb);
        self.x.merge(&other.x);
        self.y.merge(&other.y);
    }

    /// Get the number of observations
    pub fn len(&self) -> u64 {
        self.x.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Moments of the `x` variable
    pub fn x(&self) -> &Moments {
        &self.x
    }

    /// Moments of the `y` variable
    pub fn y(&self) -> &Moments {
        &self.y
    }

    /// Co-moment `sum((x - mean_x) * (y - mean_y))`
    pub fn comoment(&self) -> f64 {
        self.cxy
    }

    /// Population covariance, NaN when empty
    pub fn covariance(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else {
            self.cxy / self.len() as f64
        }
    }

    /// Pearson correlation coefficient
    pub fn correlation(&self) -> f64 {
        pearson(self.len(), self.x.m2(), self.y.m2(), self.cxy)
    }
}
