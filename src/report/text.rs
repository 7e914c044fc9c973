// Plain-text report tables
//
// Column layout: a left-aligned label followed by right-aligned numeric
// columns, so the numbers of a row are always its last whitespace-separated
// fields. Significant p-values and intervals that exclude zero are marked
// with `*`.

use super::format_number;
use crate::aggregate::{AggregatedResults, CellOutcome, CellResult, GroupingCell, VariableResults};
use crate::config::StudyConfig;
use crate::dataset::survey::SurveyQuestion;
use crate::dataset::{Dataset, FULL_DATASET};
use crate::repeated::{OmnibusResult, PairwiseResult};
use crate::stats::NormalityDiagnostic;
use serde::Serialize;
use std::fmt::Write;

const LABEL_WIDTH: usize = 48;
const NUMBER_WIDTH: usize = 10;

/// Row filters and number formatting for the tables
#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    /// Variables to show, all when `None`
    pub variables: Option<Vec<String>>,
    /// Groupings to show, all when `None`; the full-dataset row is always shown
    pub groupings: Option<Vec<String>>,
    pub precision: usize,
    pub significance_level: f64,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            variables: None,
            groupings: None,
            precision: 2,
            significance_level: 0.05,
        }
    }
}

impl TableOptions {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            precision: config.report_precision,
            significance_level: config.significance_level,
            ..Self::default()
        }
    }

    fn keeps_variable(&self, variable: &str) -> bool {
        self.variables
            .as_ref()
            .map_or(true, |vs| vs.iter().any(|v| v == variable))
    }

    fn keeps_grouping(&self, grouping: &str) -> bool {
        grouping == FULL_DATASET
            || self
                .groupings
                .as_ref()
                .map_or(true, |gs| gs.iter().any(|g| g == grouping))
    }

    fn number(&self, value: Option<f64>) -> String {
        format_number(value, self.precision)
    }

    fn p_value(&self, p: Option<f64>) -> String {
        let mark = match p {
            Some(p) if p < self.significance_level => "*",
            _ => "",
        };
        format!("{}{}", self.number(p), mark)
    }
}

/// Render aggregated results with the table matching their kind
pub fn render_aggregated(results: &AggregatedResults, options: &TableOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", results.kind);

    for variable in results
        .variables
        .iter()
        .filter(|v| options.keeps_variable(&v.variable))
    {
        write_variable_heading(&mut out, variable);
        for cell in variable
            .cells
            .iter()
            .filter(|c| options.keeps_grouping(&c.grouping))
        {
            write_cell(&mut out, cell, options);
        }
        out.push('\n');
    }
    out
}

fn write_variable_heading(out: &mut String, variable: &VariableResults) {
    let _ = writeln!(out, "{} ({})", variable.description, variable.variable);
    let _ = writeln!(out, "{}", "-".repeat(LABEL_WIDTH + 4 * (NUMBER_WIDTH + 1)));
}

fn write_row(out: &mut String, label: &str, numbers: &[String]) {
    let _ = write!(out, "  {:<width$}", label, width = LABEL_WIDTH);
    for number in numbers {
        let _ = write!(out, " {:>width$}", number, width = NUMBER_WIDTH);
    }
    out.push('\n');
}

fn normality_numbers(diagnostic: &NormalityDiagnostic, options: &TableOptions) -> [String; 2] {
    [
        options.number(diagnostic.w()),
        options.number(diagnostic.p_value()),
    ]
}

fn write_cell(out: &mut String, cell: &GroupingCell, options: &TableOptions) {
    let result = match &cell.outcome {
        CellOutcome::Ok(result) => result,
        CellOutcome::Failed { error } => {
            let _ = writeln!(out, "  [{}] FAILED: {}", cell.grouping, error);
            return;
        }
    };

    match result {
        CellResult::Population(summary) => write_row(
            out,
            FULL_DATASET,
            &[
                summary.n.to_string(),
                options.number(summary.mean),
                options.number(summary.sd),
            ],
        ),
        CellResult::MeanSd(r) => {
            let _ = writeln!(out, "  [{}]", cell.grouping);
            for i in 0..2 {
                write_row(
                    out,
                    &r.group_names[i],
                    &[
                        r.group_sizes[i].to_string(),
                        options.number(r.group_means[i]),
                        options.number(r.group_sds[i]),
                    ],
                );
            }
        }
        CellResult::Normality(r) => {
            let _ = writeln!(out, "  [{}]", cell.grouping);
            for i in 0..2 {
                let [w, p] = normality_numbers(&r.normality[i], options);
                write_row(out, &r.group_names[i], &[r.group_sizes[i].to_string(), w, p]);
            }
        }
        CellResult::GroupTest(r) => {
            let _ = writeln!(out, "  [{}]", cell.grouping);
            for i in 0..2 {
                let [w, p] = normality_numbers(&r.normality[i], options);
                write_row(
                    out,
                    &r.group_names[i],
                    &[
                        r.group_sizes[i].to_string(),
                        options.number(r.group_means[i]),
                        options.number(r.group_sds[i]),
                        w,
                        p,
                    ],
                );
            }
            let _ = writeln!(
                out,
                "  {}: statistic {}, p {}",
                r.test_kind,
                options.number(r.statistic),
                options.p_value(r.p_value)
            );
        }
        CellResult::Bootstrap(r) => {
            let interval = match r.bootstrap_ci {
                Some(ci) => format!(
                    "[{}, {}]{}",
                    options.number(Some(ci.low)),
                    options.number(Some(ci.high)),
                    if ci.excludes_zero() { "*" } else { "" }
                ),
                None => "-".to_string(),
            };
            let _ = writeln!(
                out,
                "  [{}] {} vs {}: difference {}, d {}, CI {}",
                cell.grouping,
                r.group_names[0],
                r.group_names[1],
                options.number(r.observed_mean_difference),
                options.number(r.cohens_d),
                interval
            );
        }
    }
}

/// Pairwise repeated-measures results, one row per condition pair
pub fn pairwise_table(results: &[PairwiseResult], options: &TableOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<width$} {:>8} {:>10} {:>10}",
        "pair",
        "n",
        "statistic",
        "p",
        width = LABEL_WIDTH
    );
    for result in results {
        let pair = format!("{} vs {}", result.site_pair.0, result.site_pair.1);
        let _ = writeln!(
            out,
            "  {:<width$} {:>8} {:>10} {:>10}",
            pair,
            result.n,
            options.number(result.statistic),
            options.p_value(result.p_value),
            width = LABEL_WIDTH
        );
    }
    out
}

/// Omnibus repeated-measures results, one row per test
pub fn omnibus_table(results: &[OmnibusResult], options: &TableOptions) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(
            out,
            "{} over {}: n {}, statistic {}, df {}, p {}",
            result.test.as_str(),
            result.conditions.join(", "),
            result.n,
            options.number(result.statistic),
            result.degrees_of_freedom,
            options.p_value(result.p_value)
        );
    }
    out
}

/// Answer distribution of one survey question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCount {
    pub question: SurveyQuestion,
    /// Every answer option in questionnaire order, including zero counts
    pub counts: Vec<(&'static str, usize)>,
    pub unanswered: usize,
}

/// Count answers per option for every survey question
pub fn survey_answer_counts(dataset: &Dataset) -> Vec<AnswerCount> {
    SurveyQuestion::ALL
        .iter()
        .map(|&question| {
            let mut counts: Vec<(&'static str, usize)> =
                question.options().into_iter().map(|o| (o, 0)).collect();
            let mut unanswered = 0;
            for participant in dataset.participants() {
                match question.answer(&participant.survey) {
                    Some(answer) => {
                        if let Some(entry) = counts.iter_mut().find(|(o, _)| *o == answer) {
                            entry.1 += 1;
                        }
                    }
                    None => unanswered += 1,
                }
            }
            AnswerCount {
                question,
                counts,
                unanswered,
            }
        })
        .collect()
}

pub fn answer_count_table(counts: &[AnswerCount]) -> String {
    let mut out = String::new();
    for count in counts {
        let _ = writeln!(out, "{}", count.question.text());
        for (option, n) in &count.counts {
            let _ = writeln!(out, "  {:<width$} {:>6}", option, n, width = LABEL_WIDTH);
        }
        if count.unanswered > 0 {
            let _ = writeln!(
                out,
                "  {:<width$} {:>6}",
                "(no answer)",
                count.unanswered,
                width = LABEL_WIDTH
            );
        }
        out.push('\n');
    }
    out
}
