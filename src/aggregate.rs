// Cross-product aggregation over outcome variables and subgroup splits
//
// Every (variable, grouping) cell is computed independently. In best-effort
// mode a failing cell is recorded as `CellOutcome::Failed` and its siblings
// are still computed; in strict mode the first failure aborts the batch with
// an error naming the cell.

use crate::bootstrap::{run_bootstrap_test, BootstrapResult};
use crate::config::StudyConfig;
use crate::dataset::{Column, Dataset, RowSubset, FULL_DATASET};
use crate::error::{AnalysisError, Result};
use crate::grouping::{default_splits, partition, GroupSplit};
use crate::independent::{
    get_means_and_sd, run_group_test, run_normality_check, GroupTestResult, MeanSdResult,
    NormalityResult, TestKind,
};
use crate::stats::Descriptive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Computation applied to every cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AggregateKind {
    GroupTest(TestKind),
    MeanSd,
    Normality,
    Bootstrap,
}

impl AggregateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupTest(kind) => kind.as_str(),
            Self::MeanSd => "mean-sd",
            Self::Normality => "shapiro-wilk",
            Self::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean-sd" => Ok(Self::MeanSd),
            "shapiro-wilk" => Ok(Self::Normality),
            "bootstrap" => Ok(Self::Bootstrap),
            other => other.parse::<TestKind>().map(Self::GroupTest).map_err(|_| {
                AnalysisError::invalid_argument(
                    "test_kind",
                    format!(
                        "unsupported aggregate kind `{}`; expected t-test, mannwhitney, u-test, \
                         permutation, mean-sd, shapiro-wilk or bootstrap",
                        other
                    ),
                )
            }),
        }
    }
}

impl TryFrom<String> for AggregateKind {
    type Error = AnalysisError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AggregateKind> for String {
    fn from(kind: AggregateKind) -> Self {
        kind.as_str().to_string()
    }
}

/// What to do when a single cell fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the batch on the first failing cell
    Strict,
    /// Record failures per cell and keep going
    #[default]
    BestEffort,
}

/// Unsplit population statistics, reported alongside the mean/SD cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub variable: String,
    pub n: usize,
    pub mean: Option<f64>,
    pub sd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellResult {
    GroupTest(GroupTestResult),
    MeanSd(MeanSdResult),
    Population(PopulationSummary),
    Normality(NormalityResult),
    Bootstrap(BootstrapResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellOutcome {
    Ok(CellResult),
    Failed { error: String },
}

impl CellOutcome {
    pub fn result(&self) -> Option<&CellResult> {
        match self {
            Self::Ok(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingCell {
    pub grouping: String,
    pub outcome: CellOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableResults {
    pub variable: String,
    /// Human-readable label, the raw name when the variable did not resolve
    pub description: String,
    pub cells: Vec<GroupingCell>,
}

/// Results keyed by variable, then by grouping, in configuration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResults {
    pub kind: AggregateKind,
    pub variables: Vec<VariableResults>,
}

impl AggregatedResults {
    pub fn get(&self, variable: &str, grouping: &str) -> Option<&CellOutcome> {
        self.variable(variable)?
            .cells
            .iter()
            .find(|cell| cell.grouping == grouping)
            .map(|cell| &cell.outcome)
    }

    pub fn variable(&self, variable: &str) -> Option<&VariableResults> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    /// Failed cells as (variable, grouping, error)
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.variables.iter().flat_map(|v| {
            v.cells.iter().filter_map(move |cell| match &cell.outcome {
                CellOutcome::Failed { error } => {
                    Some((v.variable.as_str(), cell.grouping.as_str(), error.as_str()))
                }
                CellOutcome::Ok(_) => None,
            })
        })
    }
}

/// Run `kind` over every configured outcome variable and the default splits
///
/// # Errors
/// Invalid configuration, or under `ErrorPolicy::Strict` the first failing
/// cell wrapped in `AnalysisError::Cell`.
///
/// # Example
/// ```
/// use consentlab::aggregate::{get_all_group_test_results, AggregateKind, ErrorPolicy};
/// use consentlab::config::StudyConfig;
/// use consentlab::dataset::Dataset;
///
/// let config = StudyConfig::default();
/// let dataset = Dataset::new(config.design.clone(), Vec::new()).unwrap();
/// let kind: AggregateKind = "mean-sd".parse().unwrap();
/// let results = get_all_group_test_results(&dataset, kind, &config, ErrorPolicy::Strict).unwrap();
/// assert_eq!(results.variables.len(), 7);
/// assert!(results.get("total_accepts", "full_dataset").is_some());
/// ```
pub fn get_all_group_test_results(
    dataset: &Dataset,
    kind: AggregateKind,
    config: &StudyConfig,
    policy: ErrorPolicy,
) -> Result<AggregatedResults> {
    aggregate_with_splits(dataset, kind, &default_splits(), config, policy)
}

/// Same as [`get_all_group_test_results`] over caller-supplied splits
///
/// # Errors
/// `InvalidArgument` when the configuration and the dataset disagree on the
/// study design, before any cell is computed.
pub fn aggregate_with_splits(
    dataset: &Dataset,
    kind: AggregateKind,
    splits: &[GroupSplit],
    config: &StudyConfig,
    policy: ErrorPolicy,
) -> Result<AggregatedResults> {
    config.validate()?;
    if config.design != *dataset.design() {
        return Err(AnalysisError::invalid_argument(
            "design",
            format!(
                "configuration design (devices {:?}, websites {:?}) differs from the dataset design (devices {:?}, websites {:?})",
                config.design.devices,
                config.design.websites,
                dataset.design().devices,
                dataset.design().websites,
            ),
        ));
    }

    let partitions: Vec<(&str, [RowSubset; 2])> = splits
        .iter()
        .map(|split| (split.name.as_str(), partition(dataset, split)))
        .collect();

    let mut variables = Vec::new();
    for variable in config.outcome_variables() {
        let column = Column::parse(&variable, dataset.design());
        let description = column
            .as_ref()
            .map(Column::description)
            .unwrap_or_else(|_| variable.clone());

        let mut cells = Vec::with_capacity(partitions.len() + 1);
        if kind == AggregateKind::MeanSd {
            let outcome = column
                .clone()
                .and_then(|column| population_summary(dataset, &column));
            cells.push(record(&variable, FULL_DATASET, outcome, policy)?);
        }
        for (grouping, groups) in &partitions {
            let outcome = column
                .clone()
                .and_then(|column| compute_cell(dataset, groups, &column, kind, config));
            cells.push(record(&variable, grouping, outcome, policy)?);
        }

        variables.push(VariableResults {
            variable,
            description,
            cells,
        });
    }

    tracing::debug!(
        kind = kind.as_str(),
        variables = variables.len(),
        groupings = partitions.len(),
        "aggregation finished"
    );

    Ok(AggregatedResults { kind, variables })
}

fn compute_cell(
    dataset: &Dataset,
    groups: &[RowSubset; 2],
    column: &Column,
    kind: AggregateKind,
    config: &StudyConfig,
) -> Result<CellResult> {
    Ok(match kind {
        AggregateKind::GroupTest(test) => {
            CellResult::GroupTest(run_group_test(dataset, groups, column, test, config)?)
        }
        AggregateKind::MeanSd => CellResult::MeanSd(get_means_and_sd(dataset, groups, column)?),
        AggregateKind::Normality => {
            CellResult::Normality(run_normality_check(dataset, groups, column, config)?)
        }
        AggregateKind::Bootstrap => {
            CellResult::Bootstrap(run_bootstrap_test(dataset, groups, column, config)?)
        }
    })
}

fn population_summary(dataset: &Dataset, column: &Column) -> Result<CellResult> {
    let values = dataset.present_values(column, &dataset.all_rows())?;
    let Descriptive { n, mean, sd } = Descriptive::of(&values);
    Ok(CellResult::Population(PopulationSummary {
        variable: column.name(),
        n,
        mean,
        sd,
    }))
}

fn record(
    variable: &str,
    grouping: &str,
    outcome: Result<CellResult>,
    policy: ErrorPolicy,
) -> Result<GroupingCell> {
    let outcome = match outcome {
        Ok(result) => {
            tracing::debug!(variable, grouping, "cell computed");
            CellOutcome::Ok(result)
        }
        Err(e) => match policy {
            ErrorPolicy::Strict => return Err(e.in_cell(variable, grouping)),
            ErrorPolicy::BestEffort => {
                tracing::warn!(variable, grouping, error = %e, "cell failed");
                CellOutcome::Failed {
                    error: e.to_string(),
                }
            }
        },
    };
    Ok(GroupingCell {
        grouping: grouping.to_string(),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyDesign;
    use crate::dataset::survey::PrivacyConcern;
    use crate::dataset::{Decision, Observation, Participant, SurveyAnswers};

    fn design() -> StudyDesign {
        StudyDesign::new(&["phone"], &["a", "b"])
    }

    fn config() -> StudyConfig {
        StudyConfig {
            outcome_variables: Some(vec!["phone_accepts".to_string(), "total_average_time".to_string()]),
            ..StudyConfig::quick(design())
        }
    }

    fn dataset() -> Dataset {
        let concern = [
            PrivacyConcern::VeryConcerned,
            PrivacyConcern::VeryConcerned,
            PrivacyConcern::VeryConcerned,
            PrivacyConcern::QuiteConcerned,
            PrivacyConcern::SlightlyConcerned,
            PrivacyConcern::DontKnow,
        ];
        let participants = concern
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                let survey = SurveyAnswers {
                    privacy_concern: Some(level),
                    ..SurveyAnswers::default()
                };
                let decision = if i % 2 == 0 { Decision::Accept } else { Decision::Reject };
                Participant::new(format!("p{}", i), survey)
                    .observe(Observation::new("phone", "a", Some(decision), Some(2.0 + i as f64)))
                    .observe(Observation::new("phone", "b", Some(Decision::Accept), Some(4.0)))
            })
            .collect();
        Dataset::new(design(), participants).unwrap()
    }

    fn privacy_only() -> Vec<GroupSplit> {
        default_splits()
            .into_iter()
            .filter(|s| s.name == "privacy_concern")
            .collect()
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("mean-sd".parse::<AggregateKind>().unwrap(), AggregateKind::MeanSd);
        assert_eq!(
            "u-test".parse::<AggregateKind>().unwrap(),
            AggregateKind::GroupTest(TestKind::MannWhitney)
        );
        assert_eq!(
            "shapiro-wilk".parse::<AggregateKind>().unwrap(),
            AggregateKind::Normality
        );
        assert!(matches!(
            "anova".parse::<AggregateKind>(),
            Err(AnalysisError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_kind_serializes_as_string() {
        let json = serde_json::to_string(&AggregateKind::GroupTest(TestKind::TTest)).unwrap();
        assert_eq!(json, "\"t-test\"");
        let kind: AggregateKind = serde_json::from_str("\"bootstrap\"").unwrap();
        assert_eq!(kind, AggregateKind::Bootstrap);
    }

    #[test]
    fn test_mean_sd_has_population_cell_first() {
        let results = aggregate_with_splits(
            &dataset(),
            AggregateKind::MeanSd,
            &privacy_only(),
            &config(),
            ErrorPolicy::Strict,
        )
        .unwrap();

        let accepts = results.variable("phone_accepts").unwrap();
        assert_eq!(accepts.cells.len(), 2);
        assert_eq!(accepts.cells[0].grouping, FULL_DATASET);
        match accepts.cells[0].outcome.result() {
            Some(CellResult::Population(summary)) => {
                assert_eq!(summary.n, 6);
                // Accepts per participant: 2,1,2,1,2,1
                assert!((summary.mean.unwrap() - 1.5).abs() < 1e-12);
            }
            other => panic!("unexpected population cell {:?}", other),
        }

        match results.get("phone_accepts", "privacy_concern").and_then(CellOutcome::result) {
            Some(CellResult::MeanSd(cell)) => {
                // Don't-know answer is excluded from both groups
                assert_eq!(cell.group_sizes, [3, 2]);
            }
            other => panic!("unexpected mean-sd cell {:?}", other),
        }
    }

    #[test]
    fn test_population_cell_only_for_mean_sd() {
        let results = aggregate_with_splits(
            &dataset(),
            AggregateKind::GroupTest(TestKind::TTest),
            &privacy_only(),
            &config(),
            ErrorPolicy::Strict,
        )
        .unwrap();
        assert!(results.get("phone_accepts", FULL_DATASET).is_none());
        assert!(matches!(
            results.get("phone_accepts", "privacy_concern").and_then(CellOutcome::result),
            Some(CellResult::GroupTest(_))
        ));
    }

    #[test]
    fn test_best_effort_isolates_failing_variable() {
        let config = StudyConfig {
            outcome_variables: Some(vec![
                "tablet_accepts".to_string(),
                "phone_accepts".to_string(),
            ]),
            ..config()
        };
        let results = aggregate_with_splits(
            &dataset(),
            AggregateKind::Normality,
            &privacy_only(),
            &config,
            ErrorPolicy::BestEffort,
        )
        .unwrap();

        assert!(results
            .get("tablet_accepts", "privacy_concern")
            .unwrap()
            .is_failed());
        assert!(matches!(
            results.get("phone_accepts", "privacy_concern").and_then(CellOutcome::result),
            Some(CellResult::Normality(_))
        ));
        let failures: Vec<_> = results.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "tablet_accepts");
        assert_eq!(results.variable("tablet_accepts").unwrap().description, "tablet_accepts");
    }

    #[test]
    fn test_strict_names_failing_cell() {
        let config = StudyConfig {
            outcome_variables: Some(vec!["tablet_accepts".to_string()]),
            ..config()
        };
        let err = aggregate_with_splits(
            &dataset(),
            AggregateKind::Bootstrap,
            &privacy_only(),
            &config,
            ErrorPolicy::Strict,
        )
        .unwrap_err();
        match err {
            AnalysisError::Cell {
                variable,
                grouping,
                source,
            } => {
                assert_eq!(variable, "tablet_accepts");
                assert_eq!(grouping, "privacy_concern");
                assert!(matches!(*source, AnalysisError::MissingColumn { .. }));
            }
            other => panic!("expected a cell error, got {:?}", other),
        }
    }

    #[test]
    fn test_design_mismatch_is_rejected_up_front() {
        let config = StudyConfig {
            outcome_variables: Some(vec!["phone_accepts".to_string()]),
            ..StudyConfig::quick(StudyDesign::new(&["phone"], &["a", "c"]))
        };
        let err = aggregate_with_splits(
            &dataset(),
            AggregateKind::MeanSd,
            &privacy_only(),
            &config,
            ErrorPolicy::BestEffort,
        )
        .unwrap_err();
        match err {
            AnalysisError::InvalidArgument { argument, reason } => {
                assert_eq!(argument, "design");
                assert!(reason.contains("\"c\""));
            }
            other => panic!("expected an invalid argument, got {:?}", other),
        }
    }

    #[test]
    fn test_results_serialize_to_json() {
        let results = aggregate_with_splits(
            &dataset(),
            AggregateKind::Bootstrap,
            &privacy_only(),
            &config(),
            ErrorPolicy::BestEffort,
        )
        .unwrap();
        let json = serde_json::to_string(&results).unwrap();
        let back: AggregatedResults = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, AggregateKind::Bootstrap);
        assert_eq!(back.variables.len(), 2);
    }
}
