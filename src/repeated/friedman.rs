// Friedman rank test for k related samples

use crate::stats::distribution::chi_squared_sf;
use crate::stats::ranks::{average_ranks, tie_term};

/// Minimum number of conditions for the Friedman statistic
pub const MIN_CONDITIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OmnibusStatistic {
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
}

/// Tie-corrected Friedman chi-square over complete rows
///
/// Each row is one participant and each column one condition. `None` with
/// fewer than three conditions or no rows.
///
/// Fully tied rows (one value per participant across all conditions) zero the
/// tie correction, so the statistic is undefined and the result is `None`.
/// Untied rows with balanced rank sums give a statistic of 0 and p = 1.
pub(crate) fn friedman(rows: &[Vec<f64>]) -> Option<OmnibusStatistic> {
    let k = rows.first()?.len();
    if k < MIN_CONDITIONS || rows.iter().any(|row| row.len() != k) {
        return None;
    }
    let n = rows.len() as f64;
    let kf = k as f64;

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for row in rows {
        for (sum, rank) in rank_sums.iter_mut().zip(average_ranks(row)) {
            *sum += rank;
        }
        ties += tie_term(row);
    }

    let correction = 1.0 - ties / (kf * (kf * kf - 1.0) * n);
    if correction <= 0.0 {
        return None;
    }
    let ssbn: f64 = rank_sums.iter().map(|r| r * r).sum();
    let statistic = (12.0 / (kf * n * (kf + 1.0)) * ssbn - 3.0 * n * (kf + 1.0)) / correction;
    let df = k - 1;

    Some(OmnibusStatistic {
        statistic,
        df,
        p_value: chi_squared_sf(statistic, df as f64)?,
    })
}
