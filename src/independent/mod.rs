// Independent-samples comparisons between two participant subgroups
//
// Every comparison runs through the same extraction path: pull the outcome
// column for both row subsets, drop missing values, then compute descriptives,
// per-group normality and (for group tests) the requested test. The result
// record has the same shape for every test kind.

mod mann_whitney;
mod permutation;
mod welch;

pub use mann_whitney::{mann_whitney_u, MannWhitneyMethod, MannWhitneyTest, EXACT_SIZE_LIMIT};
pub use permutation::{permutation_test, PermutationTest};
pub use welch::{welch_t_test, WelchTest};

use crate::config::StudyConfig;
use crate::dataset::{Column, Dataset, RowSubset};
use crate::error::{AnalysisError, Result};
use crate::stats::{Descriptive, NormalityDiagnostic, SampleGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Independent-samples test kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    #[serde(rename = "t-test")]
    TTest,
    #[serde(rename = "mannwhitney", alias = "u-test")]
    MannWhitney,
    #[serde(rename = "permutation")]
    Permutation,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TTest => "t-test",
            Self::MannWhitney => "mannwhitney",
            Self::Permutation => "permutation",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = AnalysisError;

    /// Accepts `t-test`, `mannwhitney`, `u-test` and `permutation`
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "t-test" => Ok(Self::TTest),
            "mannwhitney" | "u-test" => Ok(Self::MannWhitney),
            "permutation" => Ok(Self::Permutation),
            other => Err(AnalysisError::invalid_argument(
                "test_kind",
                format!(
                    "unsupported test kind `{}`; expected t-test, mannwhitney, u-test or permutation",
                    other
                ),
            )),
        }
    }
}

/// Statistic and p-value of one test; `None` when the test could not be computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

impl TestOutcome {
    pub const NOT_COMPUTED: TestOutcome = TestOutcome {
        statistic: None,
        p_value: None,
    };

    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic: Some(statistic),
            p_value: Some(p_value),
        }
    }
}

/// Outcome of one group test
///
/// Statistic conventions: Welch t of A minus B, U of group A, and the
/// observed absolute mean difference for the permutation test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTestResult {
    pub variable: String,
    pub test_kind: TestKind,
    pub group_names: [String; 2],
    /// Non-missing observations per group
    pub group_sizes: [usize; 2],
    pub group_means: [Option<f64>; 2],
    pub group_sds: [Option<f64>; 2],
    pub normality: [NormalityDiagnostic; 2],
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Group sizes, means and SDs without a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanSdResult {
    pub variable: String,
    pub group_names: [String; 2],
    pub group_sizes: [usize; 2],
    pub group_means: [Option<f64>; 2],
    pub group_sds: [Option<f64>; 2],
}

/// Per-group Shapiro-Wilk diagnostics without a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    pub variable: String,
    pub group_names: [String; 2],
    pub group_sizes: [usize; 2],
    pub normality: [NormalityDiagnostic; 2],
}

/// Run the requested test on two present-value samples
pub fn compare_samples(a: &[f64], b: &[f64], kind: TestKind, config: &StudyConfig) -> TestOutcome {
    match kind {
        TestKind::TTest => welch_t_test(a, b)
            .map(|r| TestOutcome::new(r.t, r.p_value))
            .unwrap_or(TestOutcome::NOT_COMPUTED),
        TestKind::MannWhitney => mann_whitney_u(a, b, config.mann_whitney_method)
            .map(|r| TestOutcome::new(r.u, r.p_value))
            .unwrap_or(TestOutcome::NOT_COMPUTED),
        TestKind::Permutation => {
            permutation_test(a, b, config.n_permutations, config.random_seed)
                .map(|r| TestOutcome::new(r.observed_difference, r.p_value))
                .unwrap_or(TestOutcome::NOT_COMPUTED)
        }
    }
}

/// Group test on already-extracted samples
pub fn run_group_test_on_samples(
    variable: &str,
    group_names: [&str; 2],
    samples: [&[f64]; 2],
    kind: TestKind,
    config: &StudyConfig,
) -> GroupTestResult {
    let guard = SampleGuard::new(config.min_sample_size);
    let [a, b] = samples;
    let descriptive = [Descriptive::of(a), Descriptive::of(b)];
    let outcome = compare_samples(a, b, kind, config);

    tracing::debug!(
        variable,
        test = kind.as_str(),
        n_a = a.len(),
        n_b = b.len(),
        p_value = ?outcome.p_value,
        "group test"
    );

    GroupTestResult {
        variable: variable.to_string(),
        test_kind: kind,
        group_names: group_names.map(str::to_string),
        group_sizes: [descriptive[0].n, descriptive[1].n],
        group_means: [descriptive[0].mean, descriptive[1].mean],
        group_sds: [descriptive[0].sd, descriptive[1].sd],
        normality: [
            NormalityDiagnostic::assess(a, &guard),
            NormalityDiagnostic::assess(b, &guard),
        ],
        statistic: outcome.statistic,
        p_value: outcome.p_value,
    }
}

/// Compare an outcome variable between two row subsets
///
/// # Errors
/// `MissingColumn` if the variable is not part of the dataset.
pub fn run_group_test(
    dataset: &Dataset,
    groups: &[RowSubset; 2],
    variable: &Column,
    kind: TestKind,
    config: &StudyConfig,
) -> Result<GroupTestResult> {
    let [a, b] = extract(dataset, groups, variable)?;
    Ok(run_group_test_on_samples(
        &variable.name(),
        [groups[0].name.as_str(), groups[1].name.as_str()],
        [a.as_slice(), b.as_slice()],
        kind,
        config,
    ))
}

/// Sizes, means and SDs of both groups
pub fn get_means_and_sd(
    dataset: &Dataset,
    groups: &[RowSubset; 2],
    variable: &Column,
) -> Result<MeanSdResult> {
    let [a, b] = extract(dataset, groups, variable)?;
    let (da, db) = (Descriptive::of(&a), Descriptive::of(&b));
    Ok(MeanSdResult {
        variable: variable.name(),
        group_names: [groups[0].name.clone(), groups[1].name.clone()],
        group_sizes: [da.n, db.n],
        group_means: [da.mean, db.mean],
        group_sds: [da.sd, db.sd],
    })
}

/// Shapiro-Wilk diagnostics for both groups
pub fn run_normality_check(
    dataset: &Dataset,
    groups: &[RowSubset; 2],
    variable: &Column,
    config: &StudyConfig,
) -> Result<NormalityResult> {
    let guard = SampleGuard::new(config.min_sample_size);
    let [a, b] = extract(dataset, groups, variable)?;
    Ok(NormalityResult {
        variable: variable.name(),
        group_names: [groups[0].name.clone(), groups[1].name.clone()],
        group_sizes: [a.len(), b.len()],
        normality: [
            NormalityDiagnostic::assess(&a, &guard),
            NormalityDiagnostic::assess(&b, &guard),
        ],
    })
}

pub(crate) fn extract(
    dataset: &Dataset,
    groups: &[RowSubset; 2],
    variable: &Column,
) -> Result<[Vec<f64>; 2]> {
    Ok([
        dataset.present_values(variable, &groups[0])?,
        dataset.present_values(variable, &groups[1])?,
    ])
}
