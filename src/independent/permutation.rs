// Permutation test on the absolute difference in means

use crate::stats::descriptive::mean;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Relative tolerance when comparing permuted differences with the observed one
const RELATIVE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermutationTest {
    /// Observed |mean(a) - mean(b)|
    pub observed_difference: f64,
    pub p_value: f64,
    pub iterations: usize,
}

/// Two-sided permutation test with a caller-supplied seed
///
/// The pooled sample is sorted before shuffling and split at the smaller
/// group size, so the shuffle sequence depends only on the multiset of
/// values: swapping `a` and `b` gives a bit-identical p-value. `None` when a
/// group is empty or `iterations` is zero.
///
/// # Example
/// ```
/// use consentlab::independent::permutation_test;
///
/// let a = [5.1, 4.8, 6.0, 5.5];
/// let b = [3.9, 4.1, 4.4];
/// let first = permutation_test(&a, &b, 2_000, 57).unwrap();
/// let again = permutation_test(&b, &a, 2_000, 57).unwrap();
/// assert_eq!(first.p_value, again.p_value);
/// ```
pub fn permutation_test(a: &[f64], b: &[f64], iterations: usize, seed: u64) -> Option<PermutationTest> {
    if a.is_empty() || b.is_empty() || iterations == 0 {
        return None;
    }

    let observed_difference = (mean(a)? - mean(b)?).abs();
    let threshold = observed_difference * (1.0 - RELATIVE_TOLERANCE);

    let mut pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    pooled.sort_by(f64::total_cmp);
    let split = a.len().min(b.len());

    let mut rng = StdRng::seed_from_u64(seed);
    let mut extreme = 0usize;
    for _ in 0..iterations {
        pooled.shuffle(&mut rng);
        let (first, rest) = pooled.split_at(split);
        let difference = (mean(first)? - mean(rest)?).abs();
        if difference >= threshold {
            extreme += 1;
        }
    }

    Some(PermutationTest {
        observed_difference,
        p_value: extreme as f64 / iterations as f64,
        iterations,
    })
}
