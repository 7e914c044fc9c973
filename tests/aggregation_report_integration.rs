// Aggregator sweep and report adapters
//
// Runs every aggregate kind over the default splits and checks that
// rendered tables give back the numbers they were built from.

mod utils;

use consentlab::aggregate::{
    get_all_group_test_results, AggregateKind, AggregatedResults, CellOutcome, CellResult,
    ErrorPolicy,
};
use consentlab::config::StudyConfig;
use consentlab::dataset::FULL_DATASET;
use consentlab::report::csv::aggregated_to_csv;
use consentlab::report::text::{render_aggregated, TableOptions};
use consentlab::report::{to_json, write_json};
use consentlab::AnalysisError;
use utils::{small_config, study_dataset};

const KINDS: [&str; 6] = [
    "t-test",
    "mannwhitney",
    "permutation",
    "mean-sd",
    "shapiro-wilk",
    "bootstrap",
];

#[test]
fn test_full_cross_product_for_every_kind() {
    let dataset = study_dataset();
    let config = small_config();
    let variables = config.outcome_variables();
    assert_eq!(variables.len(), 7);

    for name in KINDS {
        let kind: AggregateKind = name.parse().unwrap();
        let results =
            get_all_group_test_results(&dataset, kind, &config, ErrorPolicy::Strict).unwrap();
        assert_eq!(results.kind.as_str(), name);
        assert_eq!(results.variables.len(), variables.len());

        let expected_cells = if kind == AggregateKind::MeanSd { 8 } else { 7 };
        for variable in &results.variables {
            assert_eq!(variable.cells.len(), expected_cells, "{} / {}", name, variable.variable);
            assert!(variable.cells.iter().all(|c| !c.outcome.is_failed()));
        }
        assert_eq!(results.failures().count(), 0);
    }
}

#[test]
fn test_unknown_kind_is_invalid_argument() {
    let err = "kruskal".parse::<AggregateKind>().unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument { .. }));
}

#[test]
fn test_best_effort_keeps_siblings_of_failing_variable() {
    let dataset = study_dataset();
    let config = StudyConfig {
        outcome_variables: Some(vec![
            "total_accepts".to_string(),
            "tablet_average_time".to_string(),
            "news_accepts_int".to_string(),
        ]),
        ..small_config()
    };

    let results = get_all_group_test_results(
        &dataset,
        AggregateKind::Bootstrap,
        &config,
        ErrorPolicy::BestEffort,
    )
    .unwrap();

    assert_eq!(results.failures().count(), 7);
    assert!(results
        .failures()
        .all(|(variable, _, _)| variable == "tablet_average_time"));
    for variable in ["total_accepts", "news_accepts_int"] {
        let cell = results.get(variable, "age").unwrap();
        assert!(matches!(cell.result(), Some(CellResult::Bootstrap(_))));
    }

    let err = get_all_group_test_results(&dataset, AggregateKind::Bootstrap, &config, ErrorPolicy::Strict)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("tablet_average_time"));
    assert!(message.contains("privacy_concern"));
}

fn mean_sd_results() -> (AggregatedResults, StudyConfig) {
    let config = StudyConfig {
        report_precision: 3,
        ..small_config()
    };
    let results =
        get_all_group_test_results(&study_dataset(), AggregateKind::MeanSd, &config, ErrorPolicy::Strict)
            .unwrap();
    (results, config)
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim_end_matches('*').parse().ok()
}

#[test]
fn test_text_table_round_trip() {
    let (results, config) = mean_sd_results();
    let options = TableOptions::from_config(&config);
    let text = render_aggregated(&results, &options);
    let tolerance = 0.5 * 10f64.powi(-(config.report_precision as i32)) + 1e-12;

    let variable = results.variable("total_average_time").unwrap();
    let section_start = text
        .find(&format!("({})", variable.variable))
        .unwrap();
    let section = &text[section_start..];

    let population = match variable.cells[0].outcome.result() {
        Some(CellResult::Population(summary)) => summary,
        other => panic!("expected population summary, got {:?}", other),
    };
    let line = section
        .lines()
        .find(|l| l.trim_start().starts_with(FULL_DATASET))
        .unwrap();
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [n, mean, sd] = [fields[1], fields[2], fields[3]];
    assert_eq!(n.parse::<usize>().unwrap(), population.n);
    assert!((parse_number(mean).unwrap() - population.mean.unwrap()).abs() <= tolerance);
    assert!((parse_number(sd).unwrap() - population.sd.unwrap()).abs() <= tolerance);

    let cell = match results
        .get("total_average_time", "age")
        .and_then(CellOutcome::result)
    {
        Some(CellResult::MeanSd(cell)) => cell,
        other => panic!("expected mean/sd cell, got {:?}", other),
    };
    for i in 0..2 {
        let line = section
            .lines()
            .find(|l| l.contains(&cell.group_names[i]))
            .unwrap();
        let fields: Vec<&str> = line.split_whitespace().collect();
        let numbers = &fields[fields.len() - 3..];
        assert_eq!(numbers[0].parse::<usize>().unwrap(), cell.group_sizes[i]);
        assert!((parse_number(numbers[1]).unwrap() - cell.group_means[i].unwrap()).abs() <= tolerance);
        assert!((parse_number(numbers[2]).unwrap() - cell.group_sds[i].unwrap()).abs() <= tolerance);
    }
}

#[test]
fn test_csv_round_trip() {
    let (results, _) = mean_sd_results();
    let csv = aggregated_to_csv(&results);

    let row = csv
        .lines()
        .find(|l| l.starts_with("total_average_time,full_dataset,full_dataset,"))
        .unwrap();
    let fields: Vec<&str> = row.split(',').collect();
    let population = match results
        .get("total_average_time", FULL_DATASET)
        .and_then(CellOutcome::result)
    {
        Some(CellResult::Population(summary)) => summary,
        other => panic!("expected population summary, got {:?}", other),
    };
    assert_eq!(fields[3].parse::<usize>().unwrap(), population.n);
    assert_eq!(fields[4].parse::<f64>().unwrap(), population.mean.unwrap());
    assert_eq!(fields[5].parse::<f64>().unwrap(), population.sd.unwrap());
}

#[test]
fn test_json_round_trip() {
    let dataset = study_dataset();
    let results = get_all_group_test_results(
        &dataset,
        AggregateKind::GroupTest(consentlab::independent::TestKind::TTest),
        &small_config(),
        ErrorPolicy::Strict,
    )
    .unwrap();

    let json = to_json(&results).unwrap();
    let back: AggregatedResults = serde_json::from_str(&json).unwrap();
    assert_eq!(back.kind, results.kind);
    assert_eq!(back.variables.len(), results.variables.len());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t-test.json");
    write_json(&results, &path).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("\"t-test\""));
}
