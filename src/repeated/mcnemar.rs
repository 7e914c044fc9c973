// McNemar test for paired binary outcomes

use crate::independent::TestOutcome;
use crate::stats::distribution::{binomial_half_cdf, chi_squared_sf};
use serde::{Deserialize, Serialize};

/// 2x2 table of paired 0/1 outcomes, always fully populated
///
/// `counts[i][j]` is the number of rows with outcome `i` on the first
/// condition and `j` on the second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub counts: [[u64; 2]; 2],
}

impl ContingencyTable {
    /// Tally complete pairs; values must already be 0 or 1
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let mut counts = [[0u64; 2]; 2];
        for &(first, second) in pairs {
            counts[usize::from(first == 1.0)][usize::from(second == 1.0)] += 1;
        }
        Self { counts }
    }

    /// Rows with 0 on the first condition and 1 on the second
    pub fn b(&self) -> u64 {
        self.counts[0][1]
    }

    /// Rows with 1 on the first condition and 0 on the second
    pub fn c(&self) -> u64 {
        self.counts[1][0]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// McNemar test on the discordant cells
///
/// Exact: statistic min(b, c) with a two-sided binomial p-value. Approximate:
/// continuity-corrected chi-square with one degree of freedom. Without
/// discordant pairs the statistic is `None` and p is 1.
pub fn mcnemar(table: &ContingencyTable, exact: bool) -> TestOutcome {
    let (b, c) = (table.b(), table.c());
    let discordant = b + c;
    if discordant == 0 {
        return TestOutcome {
            statistic: None,
            p_value: Some(1.0),
        };
    }

    if exact {
        let smaller = b.min(c);
        let p_value = binomial_half_cdf(smaller, discordant).map(|p| (2.0 * p).min(1.0));
        TestOutcome {
            statistic: Some(smaller as f64),
            p_value,
        }
    } else {
        let difference = (b as f64 - c as f64).abs() - 1.0;
        let statistic = difference * difference / discordant as f64;
        TestOutcome {
            statistic: Some(statistic),
            p_value: chi_squared_sf(statistic, 1.0),
        }
    }
}
