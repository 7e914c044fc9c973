// Tail probabilities from statrs
//
// Constructors only fail for invalid parameters (non-positive degrees of
// freedom, NaN); callers receive `None` and report the test as not computed.

use statrs::distribution::{Binomial, ChiSquared, ContinuousCDF, DiscreteCDF, Normal, StudentsT};

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// P(T > t) for Student's t with `df` degrees of freedom
pub(crate) fn students_t_sf(t: f64, df: f64) -> Option<f64> {
    if !t.is_finite() || !(df > 0.0) {
        return None;
    }
    StudentsT::new(0.0, 1.0, df).ok().map(|dist| dist.sf(t))
}

/// Two-sided p-value for a t statistic
pub(crate) fn students_t_two_sided(t: f64, df: f64) -> Option<f64> {
    students_t_sf(t.abs(), df).map(|p| (2.0 * p).min(1.0))
}

/// P(Z > z) for the standard normal
pub(crate) fn normal_sf(z: f64) -> Option<f64> {
    if z.is_nan() {
        return None;
    }
    standard_normal().map(|dist| dist.sf(z))
}

/// Standard normal quantile
pub(crate) fn normal_quantile(p: f64) -> Option<f64> {
    if !(p > 0.0 && p < 1.0) {
        return None;
    }
    standard_normal().map(|dist| dist.inverse_cdf(p))
}

/// P(X > x) for chi-squared with `df` degrees of freedom
pub(crate) fn chi_squared_sf(x: f64, df: f64) -> Option<f64> {
    if x.is_nan() || !(df > 0.0) {
        return None;
    }
    if x <= 0.0 {
        return Some(1.0);
    }
    ChiSquared::new(df).ok().map(|dist| dist.sf(x))
}

/// P(X <= k) for X ~ Binomial(n, 1/2)
pub(crate) fn binomial_half_cdf(k: u64, n: u64) -> Option<f64> {
    Binomial::new(0.5, n).ok().map(|dist| dist.cdf(k))
}
