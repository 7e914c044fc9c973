// Shapiro-Wilk normality test
//
// Royston's approximation (Remark AS R94): Blom scores for the expected
// normal order statistics, polynomial corrections for the two extreme
// coefficients and a normalizing transform of W for the p-value. n = 3 uses
// the exact distribution of W.

use super::distribution::{normal_quantile, normal_sf};
use super::SampleGuard;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const GAMMA: [f64; 2] = [-2.273, 0.459];

/// W statistic and p-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

/// Per-group normality diagnostic attached to every group-test result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalityDiagnostic {
    Computed { w: f64, p_value: f64 },
    /// Too few observations for the test
    NotComputed,
}

impl NormalityDiagnostic {
    /// Run Shapiro-Wilk when the guard admits the sample size
    pub fn assess(values: &[f64], guard: &SampleGuard) -> Self {
        if !guard.admits("shapiro-wilk", values.len()) {
            return Self::NotComputed;
        }
        match shapiro_wilk(values) {
            Some(result) => Self::Computed {
                w: result.w,
                p_value: result.p_value,
            },
            None => Self::NotComputed,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed { .. })
    }

    pub fn w(&self) -> Option<f64> {
        match self {
            Self::Computed { w, .. } => Some(*w),
            Self::NotComputed => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        match self {
            Self::Computed { p_value, .. } => Some(*p_value),
            Self::NotComputed => None,
        }
    }
}

/// Shapiro-Wilk test
///
/// `None` below three values or when any value is non-finite. Data with zero
/// range is reported as W = 1, p = 1.
///
/// # Example
/// ```
/// use consentlab::stats::shapiro_wilk;
///
/// let result = shapiro_wilk(&[1.0, 2.0, 4.0]).unwrap();
/// assert!((result.w - 0.9642857142857142).abs() < 1e-12);
/// assert!(shapiro_wilk(&[1.0, 2.0]).is_none());
/// ```
pub fn shapiro_wilk(values: &[f64]) -> Option<ShapiroWilk> {
    let n = values.len();
    if n < 3 || values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);

    if x[n - 1] - x[0] <= 0.0 {
        return Some(ShapiroWilk { w: 1.0, p_value: 1.0 });
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();

    if n == 3 {
        let numerator = FRAC_1_SQRT_2 * (x[2] - x[0]);
        let w = (numerator * numerator / ss).clamp(0.75, 1.0);
        let p_value = (1.0 - 6.0 / PI * w.sqrt().acos()).clamp(0.0, 1.0);
        return Some(ShapiroWilk { w, p_value });
    }

    let a = coefficients(n)?;
    let half = n / 2;
    let numerator: f64 = (0..half).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let w = (numerator * numerator / ss).min(1.0);

    Some(ShapiroWilk {
        w,
        p_value: p_value(w, n)?.clamp(0.0, 1.0),
    })
}

fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, coefficient| acc * x + coefficient)
}

/// Positive coefficients a_1..a_{n/2} for the upper half of the order statistics
fn coefficients(n: usize) -> Option<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    // m_i are negative for the lower half
    let m: Vec<f64> = (0..half)
        .map(|i| normal_quantile((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect::<Option<_>>()?;
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let corrected = if n > 5 { 2 } else { 1 };
    let (fac_sq, one_minus) = if corrected == 2 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    } else {
        (summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return None;
    }

    let fac = (fac_sq / one_minus).sqrt();
    for (ai, mi) in a.iter_mut().zip(&m).skip(corrected) {
        *ai = -mi / fac;
    }
    Some(a)
}

fn p_value(w: f64, n: usize) -> Option<f64> {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Some(1.0);
    }
    let y = w1.ln();
    let nf = n as f64;

    let z = if n <= 11 {
        let gamma = poly(&GAMMA, nf);
        if y >= gamma {
            return Some(0.0);
        }
        let y = -(gamma - y).ln();
        (y - poly(&C3, nf)) / poly(&C4, nf).exp()
    } else {
        let ln_n = nf.ln();
        (y - poly(&C5, ln_n)) / poly(&C6, ln_n).exp()
    };
    normal_sf(z)
}
