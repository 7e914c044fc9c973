// Bootstrap confidence interval for a difference in group means
//
// Missing values are dropped per group, then both groups are resampled with
// replacement at their own sizes. The generator is seeded once per call, so
// identical inputs and seed reproduce identical bounds.

use crate::config::StudyConfig;
use crate::dataset::{Column, Dataset, RowSubset};
use crate::error::Result;
use crate::independent::extract;
use crate::stats::descriptive::{mean, percentile, pooled_sd};
use crate::stats::Descriptive;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Two-sided 95% percentile interval
const LOWER_PERCENTILE: f64 = 2.5;
const UPPER_PERCENTILE: f64 = 97.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceInterval {
    /// Both bounds share a sign, so the null difference of zero is rejected
    ///
    /// # Example
    /// ```
    /// use consentlab::bootstrap::ConfidenceInterval;
    ///
    /// assert!(ConfidenceInterval { low: 0.1, high: 0.9 }.excludes_zero());
    /// assert!(!ConfidenceInterval { low: -0.1, high: 0.9 }.excludes_zero());
    /// assert!(!ConfidenceInterval { low: 0.0, high: 0.9 }.excludes_zero());
    /// ```
    pub fn excludes_zero(&self) -> bool {
        self.low > 0.0 || self.high < 0.0
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Mean difference, effect size and interval for two present-value samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanDifference {
    /// mean(A) - mean(B)
    pub observed: Option<f64>,
    pub cohens_d: Option<f64>,
    pub ci: Option<ConfidenceInterval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub variable: String,
    pub group_names: [String; 2],
    pub group_sizes: [usize; 2],
    pub group_means: [Option<f64>; 2],
    pub group_sds: [Option<f64>; 2],
    pub observed_mean_difference: Option<f64>,
    pub cohens_d: Option<f64>,
    pub bootstrap_ci: Option<ConfidenceInterval>,
    pub n_bootstraps: usize,
}

impl BootstrapResult {
    pub fn is_significant(&self) -> bool {
        self.bootstrap_ci
            .map(|ci| ci.excludes_zero())
            .unwrap_or(false)
    }
}

/// Bootstrap the difference in means of `a` and `b`
///
/// The interval is `None` when either sample is empty or `n_bootstraps` is
/// zero; Cohen's d is `None` when the pooled SD is zero or undefined. A single
/// resample collapses the interval onto that resample's difference.
///
/// # Example
/// ```
/// use consentlab::bootstrap::bootstrap_mean_difference;
///
/// let a = [4.0, 5.0, 6.0, 5.5, 4.5];
/// let b = [1.0, 2.0, 1.5, 2.5, 2.0];
/// let first = bootstrap_mean_difference(&a, &b, 2_000, 57);
/// let again = bootstrap_mean_difference(&a, &b, 2_000, 57);
/// assert_eq!(first, again);
/// assert!(first.ci.unwrap().excludes_zero());
/// ```
pub fn bootstrap_mean_difference(a: &[f64], b: &[f64], n_bootstraps: usize, seed: u64) -> MeanDifference {
    let observed = match (mean(a), mean(b)) {
        (Some(mean_a), Some(mean_b)) => Some(mean_a - mean_b),
        _ => None,
    };
    let cohens_d = observed.and_then(|difference| {
        pooled_sd(a, b)
            .filter(|sd| *sd > 0.0)
            .map(|sd| difference / sd)
    });

    if observed.is_none() || n_bootstraps == 0 {
        return MeanDifference {
            observed,
            cohens_d,
            ci: None,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let differences: Vec<f64> = (0..n_bootstraps)
        .map(|_| resample_mean(a, &mut rng) - resample_mean(b, &mut rng))
        .collect();

    let ci = match (
        percentile(&differences, LOWER_PERCENTILE),
        percentile(&differences, UPPER_PERCENTILE),
    ) {
        (Some(low), Some(high)) => Some(ConfidenceInterval { low, high }),
        _ => None,
    };

    MeanDifference {
        observed,
        cohens_d,
        ci,
    }
}

fn resample_mean(values: &[f64], rng: &mut StdRng) -> f64 {
    let n = values.len();
    let total: f64 = (0..n).map(|_| values[rng.gen_range(0..n)]).sum();
    total / n as f64
}

/// Bootstrap test on already-extracted samples
pub fn run_bootstrap_on_samples(
    variable: &str,
    group_names: [&str; 2],
    samples: [&[f64]; 2],
    n_bootstraps: usize,
    seed: u64,
) -> BootstrapResult {
    let [a, b] = samples;
    let (da, db) = (Descriptive::of(a), Descriptive::of(b));
    let difference = bootstrap_mean_difference(a, b, n_bootstraps, seed);

    tracing::debug!(
        variable,
        n_a = da.n,
        n_b = db.n,
        n_bootstraps,
        ci = ?difference.ci,
        "bootstrap test"
    );

    BootstrapResult {
        variable: variable.to_string(),
        group_names: group_names.map(str::to_string),
        group_sizes: [da.n, db.n],
        group_means: [da.mean, db.mean],
        group_sds: [da.sd, db.sd],
        observed_mean_difference: difference.observed,
        cohens_d: difference.cohens_d,
        bootstrap_ci: difference.ci,
        n_bootstraps,
    }
}

/// Bootstrap an outcome variable between two row subsets
///
/// Uses `config.n_bootstraps` resamples seeded with `config.random_seed`.
pub fn run_bootstrap_test(
    dataset: &Dataset,
    groups: &[RowSubset; 2],
    variable: &Column,
    config: &StudyConfig,
) -> Result<BootstrapResult> {
    let [a, b] = extract(dataset, groups, variable)?;
    Ok(run_bootstrap_on_samples(
        &variable.name(),
        [groups[0].name.as_str(), groups[1].name.as_str()],
        [a.as_slice(), b.as_slice()],
        config.n_bootstraps,
        config.random_seed,
    ))
}
