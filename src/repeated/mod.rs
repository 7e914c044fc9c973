// Repeated-measures test family
//
// One family parameterized by two axes:
//   Grouping: Omnibus (all k conditions), Pairwise (every unordered pair),
//             SinglePair (exactly two conditions)
//   Scale:    Binary (0/1 per condition) or Continuous
//
// Dispatch:
//   Omnibus    + Continuous -> Friedman
//   Omnibus    + Binary     -> Cochran's Q
//   Pairwise   + Continuous -> Wilcoxon signed-rank (rows whose values differ)
//   Pairwise   + Binary     -> McNemar
//   SinglePair + Continuous -> Wilcoxon signed-rank (complete rows)
//   SinglePair + Binary     -> McNemar
//
// Conditions come from a `ConditionMatrix`, built either from a
// (test variable, device selector) pair, one column per website, or from an
// explicit list of columns for single-pair comparisons such as device vs
// device.

mod cochran;
mod friedman;
mod mcnemar;
mod signed_rank;

pub use friedman::MIN_CONDITIONS as FRIEDMAN_MIN_CONDITIONS;
pub use mcnemar::{mcnemar, ContingencyTable};
pub use signed_rank::{wilcoxon_signed_rank, SignedRankTest};

use crate::config::{StudyConfig, StudyDesign};
use crate::dataset::{Column, Dataset};
use crate::error::{AnalysisError, Result};
use crate::independent::TestOutcome;
use crate::stats::SampleGuard;
use friedman::OmnibusStatistic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome measured per condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestVariable {
    Accepts,
    Time,
}

impl FromStr for TestVariable {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accepts" => Ok(Self::Accepts),
            "time" => Ok(Self::Time),
            other => Err(AnalysisError::invalid_argument(
                "test_variable",
                format!("must be `accepts` or `time`, got `{}`", other),
            )),
        }
    }
}

/// A single configured device, or both devices pooled
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSelector {
    Device(String),
    Both,
}

impl DeviceSelector {
    pub const BOTH: &'static str = "both";

    /// Resolve `both` or a device name from the design
    pub fn parse(selector: &str, design: &StudyDesign) -> Result<Self> {
        if selector == Self::BOTH {
            return Ok(Self::Both);
        }
        if design.device_index(selector).is_some() {
            return Ok(Self::Device(selector.to_string()));
        }
        Err(AnalysisError::invalid_argument(
            "device",
            format!(
                "must be one of {:?} or `{}`, got `{}`",
                design.devices,
                Self::BOTH,
                selector
            ),
        ))
    }

    /// Column holding `variable` for `website` under this selector
    pub fn column(&self, variable: TestVariable, website: &str) -> Column {
        let website = website.to_string();
        match (self, variable) {
            (Self::Device(device), TestVariable::Accepts) => Column::Answer {
                device: device.clone(),
                website,
            },
            (Self::Device(device), TestVariable::Time) => Column::Time {
                device: device.clone(),
                website,
            },
            (Self::Both, TestVariable::Accepts) => Column::WebsiteAccepts { website },
            (Self::Both, TestVariable::Time) => Column::WebsiteAverageTime { website },
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(device) => f.write_str(device),
            Self::Both => f.write_str(Self::BOTH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    Omnibus,
    Pairwise,
    SinglePair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatedTest {
    Friedman,
    CochransQ,
    Wilcoxon,
    McNemar,
}

impl RepeatedTest {
    pub fn select(grouping: Grouping, scale: Scale) -> Self {
        match (grouping, scale) {
            (Grouping::Omnibus, Scale::Continuous) => Self::Friedman,
            (Grouping::Omnibus, Scale::Binary) => Self::CochransQ,
            (_, Scale::Continuous) => Self::Wilcoxon,
            (_, Scale::Binary) => Self::McNemar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friedman => "friedman",
            Self::CochransQ => "cochrans_q",
            Self::Wilcoxon => "wilcoxon",
            Self::McNemar => "mcnemar",
        }
    }
}

/// Omnibus result over k conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmnibusResult {
    pub test: RepeatedTest,
    pub conditions: Vec<String>,
    /// Complete rows used
    pub n: usize,
    pub statistic: Option<f64>,
    pub degrees_of_freedom: usize,
    pub p_value: Option<f64>,
}

/// Result for one pair of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseResult {
    pub test: RepeatedTest,
    pub site_pair: (String, String),
    /// Rows entering the test
    pub n: usize,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    /// McNemar only
    pub contingency: Option<ContingencyTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "grouping", rename_all = "snake_case")]
pub enum FamilyOutcome {
    Omnibus(OmnibusResult),
    Pairwise { results: Vec<PairwiseResult> },
}

/// Per-participant values of k condition columns
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionMatrix {
    conditions: Vec<String>,
    /// rows[participant][condition]
    rows: Vec<Vec<Option<f64>>>,
}

impl ConditionMatrix {
    /// One condition per website for the selected variable and device
    pub fn for_selector(dataset: &Dataset, variable: TestVariable, device: &DeviceSelector) -> Result<Self> {
        if let DeviceSelector::Device(name) = device {
            if dataset.design().device_index(name).is_none() {
                return Err(AnalysisError::missing_column(
                    name,
                    "device is not part of the study design",
                ));
            }
        }
        let conditions = dataset
            .design()
            .websites
            .iter()
            .map(|website| (website.clone(), device.column(variable, website)))
            .collect::<Vec<_>>();
        Self::from_columns(dataset, &conditions)
    }

    /// Explicitly named condition columns
    pub fn from_columns(dataset: &Dataset, conditions: &[(String, Column)]) -> Result<Self> {
        let columns = conditions
            .iter()
            .map(|(_, column)| dataset.column(column))
            .collect::<Result<Vec<_>>>()?;
        let rows = (0..dataset.len())
            .map(|row| columns.iter().map(|values| values[row]).collect())
            .collect();
        Ok(Self {
            conditions: conditions.iter().map(|(name, _)| name.clone()).collect(),
            rows,
        })
    }

    /// Build directly from values, mainly for synthetic inputs
    pub fn from_rows(conditions: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != conditions.len()) {
            return Err(AnalysisError::invalid_argument(
                "rows",
                format!(
                    "row has {} values for {} conditions",
                    row.len(),
                    conditions.len()
                ),
            ));
        }
        Ok(Self { conditions, rows })
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Rows with a value for every condition
    pub fn complete_rows(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .filter_map(|row| row.iter().copied().collect::<Option<Vec<f64>>>())
            .collect()
    }

    /// Complete (first, second) pairs for two conditions
    pub fn pair(&self, first: usize, second: usize) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|row| Some((row[first]?, row[second]?)))
            .collect()
    }

    fn check_binary(&self) -> Result<()> {
        let offending = self
            .rows
            .iter()
            .flatten()
            .flatten()
            .find(|v| **v != 0.0 && **v != 1.0);
        match offending {
            Some(value) => Err(AnalysisError::invalid_argument(
                "scale",
                format!("binary tests need 0/1 values, found {}", value),
            )),
            None => Ok(()),
        }
    }
}

/// Run one member of the family on a condition matrix
///
/// # Errors
/// `InvalidArgument` for binary scale on non-0/1 data, for a single-pair
/// request on anything but two conditions, or for fewer than two conditions.
pub fn run_repeated_measures(
    matrix: &ConditionMatrix,
    grouping: Grouping,
    scale: Scale,
    config: &StudyConfig,
) -> Result<FamilyOutcome> {
    let k = matrix.conditions.len();
    if k < 2 {
        return Err(AnalysisError::invalid_argument(
            "conditions",
            format!("need at least two conditions, got {}", k),
        ));
    }
    if grouping == Grouping::SinglePair && k != 2 {
        return Err(AnalysisError::invalid_argument(
            "conditions",
            format!("single-pair tests need exactly two conditions, got {}", k),
        ));
    }
    if scale == Scale::Binary {
        matrix.check_binary()?;
    }

    let test = RepeatedTest::select(grouping, scale);
    tracing::debug!(
        test = test.as_str(),
        conditions = k,
        rows = matrix.n_rows(),
        "repeated-measures test"
    );

    if grouping == Grouping::Omnibus {
        return Ok(FamilyOutcome::Omnibus(omnibus(matrix, test)));
    }

    let guard = SampleGuard::new(config.min_sample_size);
    let mut results = Vec::with_capacity(k * (k - 1) / 2);
    for first in 0..k {
        for second in first + 1..k {
            let pairs = matrix.pair(first, second);
            let result = match test {
                RepeatedTest::McNemar => {
                    let table = ContingencyTable::from_pairs(&pairs);
                    let outcome = mcnemar(&table, config.mcnemar_exact);
                    pair_result(matrix, test, (first, second), pairs.len(), outcome, Some(table))
                }
                _ => {
                    let pairs: Vec<(f64, f64)> = if grouping == Grouping::Pairwise {
                        pairs.into_iter().filter(|(a, b)| a != b).collect()
                    } else {
                        pairs
                    };
                    let outcome = if guard.admits("wilcoxon", pairs.len()) {
                        let (x, y): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
                        wilcoxon_signed_rank(&x, &y)
                            .map(|r| TestOutcome::new(r.statistic, r.p_value))
                            .unwrap_or(TestOutcome::NOT_COMPUTED)
                    } else {
                        TestOutcome::NOT_COMPUTED
                    };
                    pair_result(matrix, test, (first, second), pairs.len(), outcome, None)
                }
            };
            results.push(result);
        }
    }
    Ok(FamilyOutcome::Pairwise { results })
}

fn omnibus(matrix: &ConditionMatrix, test: RepeatedTest) -> OmnibusResult {
    let k = matrix.conditions.len();
    let rows = matrix.complete_rows();
    let statistic: Option<OmnibusStatistic> = match test {
        RepeatedTest::Friedman => {
            if k < FRIEDMAN_MIN_CONDITIONS {
                tracing::warn!(
                    conditions = k,
                    "friedman test needs at least {} conditions, result not computed",
                    FRIEDMAN_MIN_CONDITIONS
                );
                None
            } else {
                friedman::friedman(&rows)
            }
        }
        _ => cochran::cochrans_q(&rows),
    };

    OmnibusResult {
        test,
        conditions: matrix.conditions.clone(),
        n: rows.len(),
        statistic: statistic.map(|s| s.statistic),
        degrees_of_freedom: k - 1,
        p_value: statistic.map(|s| s.p_value),
    }
}

fn pair_result(
    matrix: &ConditionMatrix,
    test: RepeatedTest,
    (first, second): (usize, usize),
    n: usize,
    outcome: TestOutcome,
    contingency: Option<ContingencyTable>,
) -> PairwiseResult {
    PairwiseResult {
        test,
        site_pair: (
            matrix.conditions[first].clone(),
            matrix.conditions[second].clone(),
        ),
        n,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        contingency,
    }
}

fn expect_omnibus(outcome: FamilyOutcome) -> Result<OmnibusResult> {
    match outcome {
        FamilyOutcome::Omnibus(result) => Ok(result),
        FamilyOutcome::Pairwise { .. } => Err(AnalysisError::invalid_argument(
            "grouping",
            "expected an omnibus outcome",
        )),
    }
}

fn expect_pairwise(outcome: FamilyOutcome) -> Result<Vec<PairwiseResult>> {
    match outcome {
        FamilyOutcome::Pairwise { results } => Ok(results),
        FamilyOutcome::Omnibus(_) => Err(AnalysisError::invalid_argument(
            "grouping",
            "expected pairwise outcomes",
        )),
    }
}

fn single_device(device: &DeviceSelector, test: &str) -> Result<()> {
    match device {
        DeviceSelector::Device(_) => Ok(()),
        DeviceSelector::Both => Err(AnalysisError::invalid_argument(
            "device",
            format!("{} compares binary decisions on a single device, not `both`", test),
        )),
    }
}

/// Friedman test across websites
pub fn run_friedman_test(
    dataset: &Dataset,
    variable: TestVariable,
    device: &DeviceSelector,
    config: &StudyConfig,
) -> Result<OmnibusResult> {
    let matrix = ConditionMatrix::for_selector(dataset, variable, device)?;
    expect_omnibus(run_repeated_measures(
        &matrix,
        Grouping::Omnibus,
        Scale::Continuous,
        config,
    )?)
}

/// Cochran's Q across websites on one device's accept/reject decisions
pub fn run_cochrans_q_test(
    dataset: &Dataset,
    device: &DeviceSelector,
    config: &StudyConfig,
) -> Result<OmnibusResult> {
    single_device(device, "cochran's q")?;
    let matrix = ConditionMatrix::for_selector(dataset, TestVariable::Accepts, device)?;
    expect_omnibus(run_repeated_measures(
        &matrix,
        Grouping::Omnibus,
        Scale::Binary,
        config,
    )?)
}

/// Wilcoxon signed-rank for every pair of websites
///
/// Only rows where both websites have values and the values differ are used;
/// pairs left with fewer than `min_sample_size` rows report `None`.
pub fn run_pairwise_wilcoxon_tests(
    dataset: &Dataset,
    variable: TestVariable,
    device: &DeviceSelector,
    config: &StudyConfig,
) -> Result<Vec<PairwiseResult>> {
    let matrix = ConditionMatrix::for_selector(dataset, variable, device)?;
    expect_pairwise(run_repeated_measures(
        &matrix,
        Grouping::Pairwise,
        Scale::Continuous,
        config,
    )?)
}

/// McNemar for every pair of websites on one device
pub fn run_pairwise_mcnemar_tests(
    dataset: &Dataset,
    device: &DeviceSelector,
    config: &StudyConfig,
) -> Result<Vec<PairwiseResult>> {
    single_device(device, "mcnemar")?;
    let matrix = ConditionMatrix::for_selector(dataset, TestVariable::Accepts, device)?;
    expect_pairwise(run_repeated_measures(
        &matrix,
        Grouping::Pairwise,
        Scale::Binary,
        config,
    )?)
}

/// Signed-rank test between two columns measured on the same participants
///
/// Typically the same outcome on two devices. Rows need values in both
/// columns; fewer than `min_sample_size` such rows report `None`.
pub fn run_device_wilcoxon_test(
    dataset: &Dataset,
    first: &Column,
    second: &Column,
    config: &StudyConfig,
) -> Result<PairwiseResult> {
    let conditions = [
        (first.name(), first.clone()),
        (second.name(), second.clone()),
    ];
    let matrix = ConditionMatrix::from_columns(dataset, &conditions)?;
    let mut results = expect_pairwise(run_repeated_measures(
        &matrix,
        Grouping::SinglePair,
        Scale::Continuous,
        config,
    )?)?;
    results.pop().ok_or_else(|| {
        AnalysisError::invalid_argument("conditions", "single-pair test produced no result")
    })
}

/// Average decision time versus average withdrawal time, over participants who withdrew
pub fn run_withdrawal_wilcoxon_test(dataset: &Dataset, config: &StudyConfig) -> Result<PairwiseResult> {
    run_device_wilcoxon_test(
        dataset,
        &Column::AverageConsentGivenWithdrawalTime,
        &Column::AverageWithdrawalTime,
        config,
    )
}
