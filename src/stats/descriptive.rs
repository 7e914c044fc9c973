// Descriptive statistics over present (non-missing) values

use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (ddof = 1), `None` below two values
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation (ddof = 1), `None` below two values
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Pooled standard deviation of two samples
///
/// `sqrt(((n_a - 1) s_a² + (n_b - 1) s_b²) / (n_a + n_b - 2))`; a sample with a
/// single value contributes no variance term. `None` when fewer than three
/// values are available in total.
pub fn pooled_sd(a: &[f64], b: &[f64]) -> Option<f64> {
    let df = (a.len() + b.len()).checked_sub(2).filter(|df| *df > 0)?;
    let ss = |values: &[f64]| -> f64 {
        match mean(values) {
            Some(m) => values.iter().map(|v| (v - m).powi(2)).sum(),
            None => 0.0,
        }
    };
    Some(((ss(a) + ss(b)) / df as f64).sqrt())
}

/// Percentile `q` in [0, 100] with linear interpolation between closest ranks
///
/// # Example
/// ```
/// use consentlab::stats::percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile(&values, 50.0), Some(2.5));
/// assert_eq!(percentile(&values, 100.0), Some(4.0));
/// ```
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Count, mean and SD of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptive {
    pub n: usize,
    pub mean: Option<f64>,
    pub sd: Option<f64>,
}

impl Descriptive {
    pub fn of(values: &[f64]) -> Self {
        Self {
            n: values.len(),
            mean: mean(values),
            sd: std_dev(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sd() {
        let values = [1.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(mean(&values), Some(0.6));
        let sd = std_dev(&values).unwrap();
        assert!((sd - 0.3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_small_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[4.0]), None);
        assert_eq!(Descriptive::of(&[4.0]).mean, Some(4.0));
        assert_eq!(Descriptive::of(&[]).n, 0);
    }

    #[test]
    fn test_pooled_sd() {
        let a = [2.0, 4.0, 6.0];
        let b = [1.0, 3.0];
        // ss_a = 8, ss_b = 2, df = 3
        let pooled = pooled_sd(&a, &b).unwrap();
        assert!((pooled - (10.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(pooled_sd(&[1.0], &[2.0]), None);
        assert_eq!(pooled_sd(&[5.0, 5.0], &[5.0]), Some(0.0));
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [10.0, 0.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(0.0));
        assert_eq!(percentile(&values, 25.0), Some(2.5));
        assert!((percentile(&values, 97.5).unwrap() - 9.75).abs() < 1e-9);
        assert_eq!(percentile(&[3.0], 2.5), Some(3.0));
        assert_eq!(percentile(&values, 101.0), None);
        assert_eq!(percentile(&[], 50.0), None);
    }
}
