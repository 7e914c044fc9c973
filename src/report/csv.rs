//! Flat CSV export of aggregated results
//!
//! One row per (variable, grouping, group). Numbers are written at full
//! precision; columns that do not apply to a result kind stay empty.

use crate::aggregate::{AggregatedResults, CellOutcome, CellResult};
use crate::dataset::FULL_DATASET;
use crate::stats::NormalityDiagnostic;

const HEADER: &[&str] = &[
    "variable",
    "grouping",
    "group",
    "n",
    "mean",
    "sd",
    "shapiro_w",
    "shapiro_p",
    "test",
    "statistic",
    "p_value",
    "mean_difference",
    "cohens_d",
    "ci_low",
    "ci_high",
    "error",
];

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Default)]
struct Row {
    group: String,
    n: Option<usize>,
    mean: Option<f64>,
    sd: Option<f64>,
    normality: Option<NormalityDiagnostic>,
    test: String,
    statistic: Option<f64>,
    p_value: Option<f64>,
    mean_difference: Option<f64>,
    cohens_d: Option<f64>,
    ci: Option<(f64, f64)>,
    error: String,
}

impl Row {
    fn fields(&self, variable: &str, grouping: &str) -> Vec<String> {
        vec![
            escape_field(variable),
            escape_field(grouping),
            escape_field(&self.group),
            self.n.map(|n| n.to_string()).unwrap_or_default(),
            number(self.mean),
            number(self.sd),
            number(self.normality.as_ref().and_then(NormalityDiagnostic::w)),
            number(self.normality.as_ref().and_then(NormalityDiagnostic::p_value)),
            escape_field(&self.test),
            number(self.statistic),
            number(self.p_value),
            number(self.mean_difference),
            number(self.cohens_d),
            number(self.ci.map(|(low, _)| low)),
            number(self.ci.map(|(_, high)| high)),
            escape_field(&self.error),
        ]
    }
}

fn rows(result: &CellResult) -> Vec<Row> {
    match result {
        CellResult::Population(summary) => vec![Row {
            group: FULL_DATASET.to_string(),
            n: Some(summary.n),
            mean: summary.mean,
            sd: summary.sd,
            ..Row::default()
        }],
        CellResult::MeanSd(r) => (0..2)
            .map(|i| Row {
                group: r.group_names[i].clone(),
                n: Some(r.group_sizes[i]),
                mean: r.group_means[i],
                sd: r.group_sds[i],
                ..Row::default()
            })
            .collect(),
        CellResult::Normality(r) => (0..2)
            .map(|i| Row {
                group: r.group_names[i].clone(),
                n: Some(r.group_sizes[i]),
                normality: Some(r.normality[i]),
                ..Row::default()
            })
            .collect(),
        CellResult::GroupTest(r) => (0..2)
            .map(|i| Row {
                group: r.group_names[i].clone(),
                n: Some(r.group_sizes[i]),
                mean: r.group_means[i],
                sd: r.group_sds[i],
                normality: Some(r.normality[i]),
                test: r.test_kind.to_string(),
                statistic: r.statistic,
                p_value: r.p_value,
                ..Row::default()
            })
            .collect(),
        CellResult::Bootstrap(r) => (0..2)
            .map(|i| Row {
                group: r.group_names[i].clone(),
                n: Some(r.group_sizes[i]),
                mean: r.group_means[i],
                sd: r.group_sds[i],
                test: "bootstrap".to_string(),
                mean_difference: r.observed_mean_difference,
                cohens_d: r.cohens_d,
                ci: r.bootstrap_ci.map(|ci| (ci.low, ci.high)),
                ..Row::default()
            })
            .collect(),
    }
}

/// Render aggregated results as CSV text, header included
pub fn aggregated_to_csv(results: &AggregatedResults) -> String {
    let mut output = HEADER.join(",");
    output.push('\n');

    for variable in &results.variables {
        for cell in &variable.cells {
            let cell_rows = match &cell.outcome {
                CellOutcome::Ok(result) => rows(result),
                CellOutcome::Failed { error } => vec![Row {
                    error: error.clone(),
                    ..Row::default()
                }],
            };
            for row in cell_rows {
                output.push_str(&row.fields(&variable.variable, &cell.grouping).join(","));
                output.push('\n');
            }
        }
    }

    output
}
