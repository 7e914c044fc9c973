//! Consentlab - statistical test battery for cookie-consent banner studies
//!
//! This library runs a fixed battery of classical hypothesis tests over a
//! participant table that joins survey answers with banner decisions and
//! response times, recorded per device and website:
//!
//! - independent-samples comparisons between survey-derived subgroups
//!   (Welch t-test, Mann-Whitney U, permutation test) with Shapiro-Wilk
//!   diagnostics
//! - bootstrap confidence intervals and Cohen's d for mean differences
//! - a repeated-measures family (Friedman, Cochran's Q, Wilcoxon signed-rank,
//!   McNemar) across websites and devices
//! - aggregation of a test over every outcome variable and subgroup split
//! - descriptive website/device summaries and plain-text, CSV and JSON reports
//!
//! Everything is driven by an explicit [`config::StudyConfig`]; randomized
//! procedures are seeded per call.

pub mod aggregate;
pub mod bootstrap;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grouping;
pub mod independent;
pub mod logging;
pub mod repeated;
pub mod report;
pub mod stats;
pub mod website_stats;

pub use error::{AnalysisError, Result};
