// Wilcoxon signed-rank test for paired samples
//
// Zero differences are discarded before ranking. Small samples without tied
// |d| use the exact null distribution of R+, counted by subset sums of the
// ranks 1..n; otherwise the normal approximation with tie correction and no
// continuity correction.

use crate::stats::distribution::normal_sf;
use crate::stats::ranks::{average_ranks, has_ties, tie_groups};
use serde::{Deserialize, Serialize};

/// Largest number of non-zero differences handled exactly
pub const EXACT_MAX_N: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignedRankTest {
    /// min(R+, R-)
    pub statistic: f64,
    pub p_value: f64,
    /// Non-zero differences that were ranked
    pub n_nonzero: usize,
    pub exact: bool,
}

/// Two-sided signed-rank test of `x - y`
///
/// `None` when the slices differ in length or every difference is zero.
///
/// # Example
/// ```
/// use consentlab::repeated::wilcoxon_signed_rank;
///
/// let x = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
/// let y = [1.0; 6];
/// let result = wilcoxon_signed_rank(&x, &y).unwrap();
/// assert_eq!(result.statistic, 0.0);
/// assert!((result.p_value - 0.03125).abs() < 1e-12);
/// ```
pub fn wilcoxon_signed_rank(x: &[f64], y: &[f64]) -> Option<SignedRankTest> {
    if x.len() != y.len() {
        return None;
    }
    let differences: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    let n = differences.len();
    if n == 0 {
        return None;
    }

    let magnitudes: Vec<f64> = differences.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);
    let r_plus: f64 = differences
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let total = (n * (n + 1)) as f64 / 2.0;
    let statistic = r_plus.min(total - r_plus);

    let exact = n <= EXACT_MAX_N && !has_ties(&magnitudes);
    let p_value = if exact {
        exact_p_value(statistic, n)
    } else {
        let nf = n as f64;
        let mean = nf * (nf + 1.0) / 4.0;
        let tie_correction: f64 = tie_groups(&magnitudes)
            .into_iter()
            .map(|t| {
                let t = t as f64;
                t * (t * t - 1.0)
            })
            .sum::<f64>()
            / 48.0;
        let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_correction;
        if !(variance > 0.0) {
            return None;
        }
        let z = (statistic - mean) / variance.sqrt();
        (2.0 * normal_sf(z.abs())?).min(1.0)
    };

    Some(SignedRankTest {
        statistic,
        p_value,
        n_nonzero: n,
        exact,
    })
}

/// min(1, 2 * P(R+ <= t)) under H0
fn exact_p_value(t: f64, n: usize) -> f64 {
    let max_sum = n * (n + 1) / 2;
    // counts[s] = subsets of {1..n} summing to s
    let mut counts = vec![0.0f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }
    let total: f64 = counts.iter().sum();
    let upto = (t.floor() as usize).min(max_sum);
    let lower: f64 = counts[..=upto].iter().sum();
    (2.0 * lower / total).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_reference() {
        let x = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let result = wilcoxon_signed_rank(&x, &[1.0; 6]).unwrap();
        assert!(result.exact);
        assert_eq!(result.n_nonzero, 6);
        assert!((result.p_value - 0.03125).abs() < 1e-12);
    }

    #[test]
    fn test_tied_magnitudes_use_normal_approximation() {
        let x = [1.5, 2.0, 3.25, 4.0, 5.5, 6.0, 8.0];
        let y = [1.0, 2.5, 1.0, 1.0, 1.0, 1.0, 1.0];
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert!(!result.exact);
        assert_eq!(result.statistic, 1.5);
        assert!((result.p_value - 0.034287967973591765).abs() < 1e-9);
    }

    #[test]
    fn test_zero_differences_are_dropped() {
        let x = [2.0, 2.0, 1.0, 3.0, 2.0, 4.0, 0.0];
        let result = wilcoxon_signed_rank(&x, &[1.0; 7]).unwrap();
        assert_eq!(result.n_nonzero, 6);
        assert_eq!(result.statistic, 2.5);
        assert!((result.p_value - 0.084469032253251808).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_in_argument_order() {
        let x = [3.1, 4.7, 2.2, 9.0, 5.5];
        let y = [2.0, 5.0, 1.0, 4.0, 5.0];
        let forward = wilcoxon_signed_rank(&x, &y).unwrap();
        let backward = wilcoxon_signed_rank(&y, &x).unwrap();
        assert_eq!(forward.statistic, backward.statistic);
        assert_eq!(forward.p_value, backward.p_value);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(wilcoxon_signed_rank(&[1.0, 2.0], &[1.0, 2.0]).is_none());
        assert!(wilcoxon_signed_rank(&[1.0], &[1.0, 2.0]).is_none());
        assert!(wilcoxon_signed_rank(&[], &[]).is_none());
    }

    #[test]
    fn test_exact_p_value_is_capped() {
        // One positive difference: R+ = 1, R- = 0, P(R+ <= 0) = 1/2
        let result = wilcoxon_signed_rank(&[2.0], &[1.0]).unwrap();
        assert_eq!(result.p_value, 1.0);
    }
}
