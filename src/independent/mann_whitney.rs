// Mann-Whitney U rank-sum test
//
// Exact p-values come from the permutation distribution of U under H0, built
// by counting arrangements with the recurrence
//   c(m, n, u) = c(m - 1, n, u - n) + c(m, n - 1, u)
// which only adds, so f64 counts stay accurate up to the size limit below.

use crate::stats::distribution::normal_sf;
use crate::stats::ranks::{average_ranks, has_ties, tie_term};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest n_a * n_b for which the exact distribution is built
pub const EXACT_SIZE_LIMIT: usize = 10_000;

/// How the p-value is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MannWhitneyMethod {
    /// Exact without ties and within the size limit, asymptotic otherwise
    #[default]
    Auto,
    /// Exact distribution; ties are ignored. Falls back to asymptotic past the size limit
    Exact,
    /// Normal approximation with tie and continuity corrections
    Asymptotic,
}

impl MannWhitneyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Exact => "exact",
            Self::Asymptotic => "asymptotic",
        }
    }
}

impl fmt::Display for MannWhitneyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MannWhitneyMethod {
    type Err = crate::error::AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "exact" => Ok(Self::Exact),
            "asymptotic" => Ok(Self::Asymptotic),
            other => Err(crate::error::AnalysisError::invalid_argument(
                "mann_whitney_method",
                format!("expected auto, exact or asymptotic, got `{}`", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyTest {
    /// U of the first sample
    pub u: f64,
    pub p_value: f64,
    /// Whether the exact distribution was used
    pub exact: bool,
}

/// Two-sided Mann-Whitney U test; `None` if either sample is empty
///
/// # Example
/// ```
/// use consentlab::independent::{mann_whitney_u, MannWhitneyMethod};
///
/// let a = [1.0, 1.0, 1.0, 0.0, 0.0];
/// let b = [0.0, 0.0, 0.0, 0.0, 1.0];
/// let result = mann_whitney_u(&a, &b, MannWhitneyMethod::Exact).unwrap();
/// assert_eq!(result.u, 17.5);
/// assert!((result.p_value - 0.42063492063492064).abs() < 1e-12);
/// ```
pub fn mann_whitney_u(a: &[f64], b: &[f64], method: MannWhitneyMethod) -> Option<MannWhitneyTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let (n_a, n_b) = (a.len(), b.len());
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = average_ranks(&pooled);
    let rank_sum_a: f64 = ranks[..n_a].iter().sum();
    let u_a = rank_sum_a - (n_a * (n_a + 1)) as f64 / 2.0;
    let u_b = (n_a * n_b) as f64 - u_a;
    let u_max = u_a.max(u_b);

    let within_limit = n_a * n_b <= EXACT_SIZE_LIMIT;
    let exact = match method {
        MannWhitneyMethod::Exact => within_limit,
        MannWhitneyMethod::Auto => within_limit && !has_ties(&pooled),
        MannWhitneyMethod::Asymptotic => false,
    };

    let p_value = if exact {
        exact_p_value(u_max, n_a, n_b)
    } else {
        asymptotic_p_value(u_max, n_a, n_b, tie_term(&pooled))?
    };

    Some(MannWhitneyTest {
        u: u_a,
        p_value,
        exact,
    })
}

/// 2 * P(U >= floor(u)), capped at 1
fn exact_p_value(u: f64, n_a: usize, n_b: usize) -> f64 {
    let (small, large) = if n_a <= n_b { (n_a, n_b) } else { (n_b, n_a) };
    let counts = null_counts(small, large);
    let total: f64 = counts.iter().sum();
    let threshold = (u.floor() as usize).min(counts.len());
    let upper: f64 = counts[threshold..].iter().sum();
    (2.0 * upper / total).min(1.0)
}

/// Number of arrangements yielding each U in 0..=m*n
fn null_counts(m: usize, n: usize) -> Vec<f64> {
    // previous[j] holds the counts for (i - 1, j)
    let mut previous: Vec<Vec<f64>> = vec![vec![1.0]; n + 1];
    for i in 1..=m {
        let mut current: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        current.push(vec![1.0]);
        for j in 1..=n {
            let mut counts = vec![0.0; i * j + 1];
            for (u, c) in previous[j].iter().enumerate() {
                counts[u + j] += c;
            }
            for (u, c) in current[j - 1].iter().enumerate() {
                counts[u] += c;
            }
            current.push(counts);
        }
        previous = current;
    }
    previous.pop().unwrap_or_else(|| vec![1.0])
}

fn asymptotic_p_value(u: f64, n_a: usize, n_b: usize, ties: f64) -> Option<f64> {
    let n = (n_a + n_b) as f64;
    let product = (n_a * n_b) as f64;
    let mu = product / 2.0;
    let variance = product / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)));
    if !(variance > 0.0) {
        // Every value tied
        return Some(1.0);
    }
    let z = (u - mu - 0.5) / variance.sqrt();
    normal_sf(z).map(|p| (2.0 * p).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f64; 5] = [1.0, 1.0, 1.0, 0.0, 0.0];
    const B: [f64; 5] = [0.0, 0.0, 0.0, 0.0, 1.0];

    #[test]
    fn test_null_counts_small_case() {
        let counts = null_counts(3, 4);
        assert_eq!(
            counts,
            vec![1.0, 1.0, 2.0, 3.0, 4.0, 4.0, 5.0, 4.0, 4.0, 3.0, 2.0, 1.0, 1.0]
        );
        assert_eq!(null_counts(5, 5).iter().sum::<f64>(), 252.0);
    }

    #[test]
    fn test_exact_without_ties() {
        let result = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0, 7.0], MannWhitneyMethod::Auto)
            .unwrap();
        assert!(result.exact);
        assert_eq!(result.u, 0.0);
        assert!((result.p_value - 2.0 / 35.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_with_ties_matches_reference() {
        let result = mann_whitney_u(&A, &B, MannWhitneyMethod::Exact).unwrap();
        assert!(result.exact);
        assert_eq!(result.u, 17.5);
        assert!((result.p_value - 0.42063492063492064).abs() < 1e-12);
    }

    #[test]
    fn test_auto_uses_asymptotic_with_ties() {
        let result = mann_whitney_u(&A, &B, MannWhitneyMethod::Auto).unwrap();
        assert!(!result.exact);
        assert_eq!(result.u, 17.5);
        assert!((result.p_value - 0.27034414065477996).abs() < 1e-9);
    }

    #[test]
    fn test_swapping_groups_keeps_p_value() {
        let forward = mann_whitney_u(&A, &B, MannWhitneyMethod::Exact).unwrap();
        let backward = mann_whitney_u(&B, &A, MannWhitneyMethod::Exact).unwrap();
        assert_eq!(forward.p_value, backward.p_value);
        assert_eq!(forward.u + backward.u, 25.0);
    }

    #[test]
    fn test_exact_falls_back_past_size_limit() {
        let a: Vec<f64> = (0..101).map(f64::from).collect();
        let b: Vec<f64> = (0..100).map(|i| f64::from(i) + 0.5).collect();
        let result = mann_whitney_u(&a, &b, MannWhitneyMethod::Exact).unwrap();
        assert!(!result.exact);
    }

    #[test]
    fn test_all_tied_and_empty() {
        let result = mann_whitney_u(&[2.0, 2.0], &[2.0, 2.0, 2.0], MannWhitneyMethod::Asymptotic)
            .unwrap();
        assert_eq!(result.p_value, 1.0);
        assert!(mann_whitney_u(&[], &[1.0], MannWhitneyMethod::Auto).is_none());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("exact".parse::<MannWhitneyMethod>().unwrap(), MannWhitneyMethod::Exact);
        assert!("bayesian".parse::<MannWhitneyMethod>().is_err());
        assert_eq!(MannWhitneyMethod::default(), MannWhitneyMethod::Auto);
    }
}
