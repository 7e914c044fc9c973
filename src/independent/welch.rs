// Welch's unequal-variance two-sample t-test

use crate::stats::descriptive::{mean, variance};
use crate::stats::distribution::students_t_two_sided;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    pub t: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub df: f64,
    pub p_value: f64,
}

/// Two-sided Welch t-test of `a` against `b`
///
/// `None` when a group has fewer than two values or both groups have zero
/// variance.
///
/// # Example
/// ```
/// use consentlab::independent::welch_t_test;
///
/// let baseline = [10.0, 12.0, 11.0, 13.0, 10.0];
/// let shifted = [25.0, 27.0, 26.0, 28.0, 25.0];
/// let result = welch_t_test(&baseline, &shifted).unwrap();
/// assert!(result.t < 0.0);
/// assert!(result.p_value < 0.001);
/// ```
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchTest> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let (n_a, n_b) = (a.len() as f64, b.len() as f64);
    let se_a = variance(a)? / n_a;
    let se_b = variance(b)? / n_b;
    let se2 = se_a + se_b;
    if se2 <= 0.0 {
        return None;
    }

    let t = (mean(a)? - mean(b)?) / se2.sqrt();
    let df = se2 * se2 / (se_a * se_a / (n_a - 1.0) + se_b * se_b / (n_b - 1.0));
    let p_value = students_t_two_sided(t, df)?;

    Some(WelchTest { t, df, p_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_accepts_reference() {
        let a = [1.0, 1.0, 1.0, 0.0, 0.0];
        let b = [0.0, 0.0, 0.0, 0.0, 1.0];
        let result = welch_t_test(&a, &b).unwrap();
        assert!((result.t - 1.2649110640673515).abs() < 1e-12);
        assert!((result.df - 7.6923076923076925).abs() < 1e-9);
        assert!((result.p_value - 0.24287561215028297).abs() < 1e-8);
    }

    #[test]
    fn test_large_shift_reference() {
        let a = [10.0, 12.0, 11.0, 13.0, 10.0];
        let b = [25.0, 27.0, 26.0, 28.0, 25.0];
        let result = welch_t_test(&a, &b).unwrap();
        assert!((result.t + 18.190171877724975).abs() < 1e-9);
        assert!((result.df - 8.0).abs() < 1e-9);
        assert!((result.p_value - 8.5736e-8).abs() < 1e-10);
    }

    #[test]
    fn test_swapping_groups_flips_sign_only() {
        let a = [3.0, 4.5, 2.0, 8.0];
        let b = [1.0, 0.5, 2.5];
        let forward = welch_t_test(&a, &b).unwrap();
        let backward = welch_t_test(&b, &a).unwrap();
        assert_eq!(forward.t, -backward.t);
        assert_eq!(forward.p_value, backward.p_value);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(welch_t_test(&[1.0], &[1.0, 2.0]).is_none());
        assert!(welch_t_test(&[2.0, 2.0], &[5.0, 5.0, 5.0]).is_none());
        // One constant group is fine as long as the other varies
        assert!(welch_t_test(&[2.0, 2.0], &[5.0, 6.0, 7.0]).is_some());
    }
}
