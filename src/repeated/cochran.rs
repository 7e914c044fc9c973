// Cochran's Q test for k related binary samples

use super::friedman::OmnibusStatistic;
use crate::stats::distribution::chi_squared_sf;

/// Q = (k - 1)(k ΣC² - N²) / (kN - ΣR²) over complete 0/1 rows
///
/// C are column totals, R row totals and N the grand total. `None` with fewer
/// than two conditions, no rows, or a zero denominator (every row all-equal).
pub(crate) fn cochrans_q(rows: &[Vec<f64>]) -> Option<OmnibusStatistic> {
    let k = rows.first()?.len();
    if k < 2 || rows.iter().any(|row| row.len() != k) {
        return None;
    }
    let kf = k as f64;

    let mut column_totals = vec![0.0; k];
    let mut row_squares = 0.0;
    for row in rows {
        for (total, value) in column_totals.iter_mut().zip(row) {
            *total += value;
        }
        let row_total: f64 = row.iter().sum();
        row_squares += row_total * row_total;
    }
    let grand_total: f64 = column_totals.iter().sum();
    let column_squares: f64 = column_totals.iter().map(|c| c * c).sum();

    let denominator = kf * grand_total - row_squares;
    if denominator <= 0.0 {
        return None;
    }
    let statistic = (kf - 1.0) * (kf * column_squares - grand_total * grand_total) / denominator;
    let df = k - 1;

    Some(OmnibusStatistic {
        statistic,
        df,
        p_value: chi_squared_sf(statistic, df as f64)?,
    })
}
