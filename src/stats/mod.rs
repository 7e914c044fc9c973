// Statistical building blocks shared by every engine
//
// - descriptive: mean, sample SD, pooled SD, interpolated percentiles
// - ranks: average ranks and tie bookkeeping for the rank-based tests
// - normality: Shapiro-Wilk (Royston AS R94) and the per-group diagnostic
// - distribution: tail probabilities backed by statrs
//
// The minimum-sample policy lives here too, so every test kind gates on the
// same threshold instead of scattering its own `len() >= 3` checks.

pub mod descriptive;
pub(crate) mod distribution;
pub mod normality;
pub mod ranks;

pub use descriptive::{mean, percentile, pooled_sd, std_dev, Descriptive};
pub use normality::{shapiro_wilk, NormalityDiagnostic, ShapiroWilk};

/// Minimum-sample-size gate applied before small-sample-sensitive tests
///
/// # Example
/// ```
/// use consentlab::stats::SampleGuard;
///
/// let guard = SampleGuard::new(3);
/// assert!(!guard.admits("shapiro-wilk", 2));
/// assert!(guard.admits("shapiro-wilk", 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGuard {
    min_size: usize,
}

impl SampleGuard {
    pub fn new(min_size: usize) -> Self {
        Self { min_size }
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Whether `n` observations are enough; logs the skip otherwise
    pub fn admits(&self, test: &str, n: usize) -> bool {
        if n >= self.min_size {
            return true;
        }
        tracing::warn!(
            test,
            n,
            min_size = self.min_size,
            "too few observations, result not computed"
        );
        false
    }
}

impl Default for SampleGuard {
    fn default() -> Self {
        Self::new(3)
    }
}
