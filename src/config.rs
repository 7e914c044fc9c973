// Study configuration
//
// Everything the engines need from the outside world (device set, website set,
// iteration counts, seed) travels in one explicit value. No engine reads global
// state, so tests can run the battery against small synthetic designs.

use crate::error::{AnalysisError, Result};
use crate::independent::MannWhitneyMethod;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Devices and websites of the experiment
///
/// # Example
/// ```
/// use consentlab::config::StudyDesign;
///
/// let design = StudyDesign::new(&["computer", "phone"], &["news", "shop"]);
/// assert_eq!(design.device_index("phone"), Some(1));
/// assert_eq!(design.website_index("blog"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyDesign {
    pub devices: Vec<String>,
    pub websites: Vec<String>,
}

impl Default for StudyDesign {
    fn default() -> Self {
        Self::new(
            &["computer", "phone"],
            &["website_1", "website_2", "website_3", "website_4", "website_5"],
        )
    }
}

impl StudyDesign {
    pub fn new(devices: &[&str], websites: &[&str]) -> Self {
        Self {
            devices: devices.iter().map(|d| d.to_string()).collect(),
            websites: websites.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn device_index(&self, device: &str) -> Option<usize> {
        self.devices.iter().position(|d| d == device)
    }

    pub fn website_index(&self, website: &str) -> Option<usize> {
        self.websites.iter().position(|w| w == website)
    }

    /// Number of (device, website) cells per participant
    pub fn cell_count(&self) -> usize {
        self.devices.len() * self.websites.len()
    }

    pub fn validate(&self) -> Result<()> {
        validate_names("devices", &self.devices, 1)?;
        validate_names("websites", &self.websites, 2)?;
        for device in &self.devices {
            if self.websites.contains(device) {
                return Err(AnalysisError::invalid_argument(
                    "design",
                    format!("`{}` is used both as a device and as a website", device),
                ));
            }
        }
        Ok(())
    }
}

fn validate_names(field: &str, names: &[String], minimum: usize) -> Result<()> {
    if names.len() < minimum {
        return Err(AnalysisError::invalid_argument(
            field,
            format!("need at least {} entries, got {}", minimum, names.len()),
        ));
    }

    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(AnalysisError::invalid_argument(field, "empty name"));
        }
        // '.' separates the parts of raw column names
        if name.contains('.') {
            return Err(AnalysisError::invalid_argument(
                field,
                format!("name `{}` must not contain '.'", name),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(AnalysisError::invalid_argument(
                field,
                format!("duplicate name `{}`", name),
            ));
        }
    }
    Ok(())
}

/// Configuration for one analysis run
///
/// # Example
/// ```
/// use consentlab::config::StudyConfig;
///
/// let config = StudyConfig::default();
/// assert_eq!(config.n_bootstraps, 10_000);
/// assert_eq!(config.min_sample_size, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Devices and websites, in report order
    pub design: StudyDesign,

    /// Bootstrap resamples per bootstrap test
    pub n_bootstraps: usize,

    /// Label shuffles per permutation test
    pub n_permutations: usize,

    /// Seed for every randomized procedure; each test invocation seeds its own generator
    pub random_seed: u64,

    /// Minimum observations before a normality check or signed-rank test is attempted
    pub min_sample_size: usize,

    /// How Mann-Whitney p-values are computed
    pub mann_whitney_method: MannWhitneyMethod,

    /// Exact binomial McNemar instead of the chi-square approximation
    pub mcnemar_exact: bool,

    /// Explicit outcome variables for the aggregator; derived from the design when absent
    pub outcome_variables: Option<Vec<String>>,

    /// Threshold used by report adapters to highlight significant p-values
    pub significance_level: f64,

    /// Decimal places used by report adapters
    pub report_precision: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            design: StudyDesign::default(),
            n_bootstraps: 10_000,
            n_permutations: 10_000,
            random_seed: 57,
            min_sample_size: 3,
            mann_whitney_method: MannWhitneyMethod::Auto,
            mcnemar_exact: true,
            outcome_variables: None,
            significance_level: 0.05,
            report_precision: 2,
        }
    }
}

impl StudyConfig {
    /// Default configuration over a custom design
    pub fn with_design(design: StudyDesign) -> Self {
        Self {
            design,
            ..Self::default()
        }
    }

    /// Fewer resampling iterations for exploratory runs
    pub fn quick(design: StudyDesign) -> Self {
        Self {
            design,
            n_bootstraps: 1_000,
            n_permutations: 1_000,
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it
    ///
    /// # Example TOML
    /// ```toml
    /// n_bootstraps = 2000
    /// random_seed = 7
    ///
    /// [design]
    /// devices = ["computer", "phone"]
    /// websites = ["news", "shop", "blog"]
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StudyConfig =
            toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.design.validate()?;

        if self.n_bootstraps == 0 {
            return Err(AnalysisError::invalid_argument(
                "n_bootstraps",
                "must be >= 1",
            ));
        }

        if self.n_permutations == 0 {
            return Err(AnalysisError::invalid_argument(
                "n_permutations",
                "must be >= 1",
            ));
        }

        if self.min_sample_size == 0 {
            return Err(AnalysisError::invalid_argument(
                "min_sample_size",
                "must be >= 1",
            ));
        }

        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(AnalysisError::invalid_argument(
                "significance_level",
                format!("must be in (0, 1), got {}", self.significance_level),
            ));
        }

        if let Some(variables) = &self.outcome_variables {
            if variables.is_empty() {
                return Err(AnalysisError::invalid_argument(
                    "outcome_variables",
                    "explicit list must not be empty",
                ));
            }
        }

        Ok(())
    }

    /// Outcome variables swept by the aggregator, in report order
    ///
    /// Without an explicit list: the cookie knowledge score, accepts per device,
    /// total accepts, average time per device and total average time.
    pub fn outcome_variables(&self) -> Vec<String> {
        if let Some(variables) = &self.outcome_variables {
            return variables.clone();
        }

        let mut variables = vec!["cookie_questions_score".to_string()];
        variables.extend(self.design.devices.iter().map(|d| format!("{}_accepts", d)));
        variables.push("total_accepts".to_string());
        variables.extend(
            self.design
                .devices
                .iter()
                .map(|d| format!("{}_average_time", d)),
        );
        variables.push("total_average_time".to_string());
        variables
    }
}
