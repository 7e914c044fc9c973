// Participant table
//
// Built once per analysis run from ETL output and immutable afterwards. Every
// engine reads it through `Column` lookups over a `RowSubset`; derived
// aggregates (accept totals, average times, withdrawal averages) are computed
// on demand from the indexed (device, website) grid.

mod column;
mod participant;
pub mod survey;

pub use column::Column;
pub use participant::{Decision, Observation, Participant};
pub use survey::SurveyAnswers;

use crate::config::StudyDesign;
use crate::error::{AnalysisError, Result};
use participant::CellValues;
use std::collections::HashSet;

/// A named subset of dataset rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSubset {
    pub name: String,
    pub rows: Vec<usize>,
}

impl RowSubset {
    pub fn new(name: impl Into<String>, rows: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Name of the pseudo-group covering every participant
pub const FULL_DATASET: &str = "full_dataset";

#[derive(Debug, Clone)]
pub struct Dataset {
    design: StudyDesign,
    participants: Vec<Participant>,
    /// Per participant, cells indexed by `device * n_websites + website`
    grid: Vec<Vec<CellValues>>,
}

impl Dataset {
    /// Index participants against the design, enforcing the input contract
    ///
    /// Rejects unknown devices or websites, duplicated cells, negative or
    /// non-finite times, and response times recorded without a decision.
    pub fn new(design: StudyDesign, participants: Vec<Participant>) -> Result<Self> {
        design.validate()?;

        let mut ids = HashSet::new();
        let mut grid = Vec::with_capacity(participants.len());

        for participant in &participants {
            if !ids.insert(participant.id.as_str()) {
                return Err(AnalysisError::invalid_record(
                    &participant.id,
                    "duplicate participant id",
                ));
            }

            let mut cells = vec![CellValues::default(); design.cell_count()];
            let mut seen = vec![false; design.cell_count()];

            for observation in &participant.observations {
                let device = design.device_index(&observation.device).ok_or_else(|| {
                    AnalysisError::invalid_record(
                        &participant.id,
                        format!("unknown device `{}`", observation.device),
                    )
                })?;
                let website = design.website_index(&observation.website).ok_or_else(|| {
                    AnalysisError::invalid_record(
                        &participant.id,
                        format!("unknown website `{}`", observation.website),
                    )
                })?;
                let index = device * design.websites.len() + website;

                if seen[index] {
                    return Err(AnalysisError::invalid_record(
                        &participant.id,
                        format!(
                            "duplicate observation for {} on {}",
                            observation.website, observation.device
                        ),
                    ));
                }
                seen[index] = true;

                check_seconds(&participant.id, "time", observation.time_seconds)?;
                check_seconds(
                    &participant.id,
                    "withdrawal time",
                    observation.withdrawal_time_seconds,
                )?;
                if observation.time_seconds.is_some() && observation.decision.is_none() {
                    return Err(AnalysisError::invalid_record(
                        &participant.id,
                        format!(
                            "response time without decision for {} on {}",
                            observation.website, observation.device
                        ),
                    ));
                }

                cells[index] = CellValues::from(observation);
            }

            grid.push(cells);
        }

        tracing::debug!(
            participants = participants.len(),
            devices = design.devices.len(),
            websites = design.websites.len(),
            "dataset indexed"
        );

        Ok(Self {
            design,
            participants,
            grid,
        })
    }

    /// Build a dataset from a JSON array of participant records
    pub fn from_json_str(design: StudyDesign, text: &str) -> Result<Self> {
        let participants: Vec<Participant> = serde_json::from_str(text).map_err(|e| {
            AnalysisError::invalid_record("<json>", format!("cannot decode participants: {}", e))
        })?;
        Self::new(design, participants)
    }

    pub fn design(&self) -> &StudyDesign {
        &self.design
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Every row, under the `full_dataset` name
    pub fn all_rows(&self) -> RowSubset {
        RowSubset::new(FULL_DATASET, (0..self.len()).collect())
    }

    /// Column values for every participant, `None` where missing
    pub fn column(&self, column: &Column) -> Result<Vec<Option<f64>>> {
        self.values(column, &self.all_rows())
    }

    /// Column values for a row subset, `None` where missing
    pub fn values(&self, column: &Column, rows: &RowSubset) -> Result<Vec<Option<f64>>> {
        column.check(&self.design)?;
        rows.rows
            .iter()
            .map(|&row| {
                if row >= self.len() {
                    return Err(AnalysisError::invalid_argument(
                        "rows",
                        format!("row {} out of range for {} participants", row, self.len()),
                    ));
                }
                Ok(self.value(row, column))
            })
            .collect()
    }

    /// Column values for a row subset with missing values dropped
    pub fn present_values(&self, column: &Column, rows: &RowSubset) -> Result<Vec<f64>> {
        Ok(self.values(column, rows)?.into_iter().flatten().collect())
    }

    fn cell(&self, row: usize, device: usize, website: usize) -> &CellValues {
        &self.grid[row][device * self.design.websites.len() + website]
    }

    fn device_cells(&self, row: usize, device: usize) -> impl Iterator<Item = &CellValues> {
        (0..self.design.websites.len()).map(move |w| self.cell(row, device, w))
    }

    fn website_cells(&self, row: usize, website: usize) -> impl Iterator<Item = &CellValues> {
        (0..self.design.devices.len()).map(move |d| self.cell(row, d, website))
    }

    // Column was checked against the design by the caller, so index lookups succeed
    fn value(&self, row: usize, column: &Column) -> Option<f64> {
        let design = &self.design;
        let survey = &self.participants[row].survey;
        let device_of = |name: &str| design.device_index(name).unwrap_or_default();
        let website_of = |name: &str| design.website_index(name).unwrap_or_default();

        match column {
            Column::Answer { device, website } => self
                .cell(row, device_of(device), website_of(website))
                .decision
                .map(|d| d.as_f64()),
            Column::Time { device, website } => {
                self.cell(row, device_of(device), website_of(website)).time
            }
            Column::WithdrawalTime { device, website } => {
                self.cell(row, device_of(device), website_of(website))
                    .withdrawal_time
            }
            Column::WebsiteAccepts { website } => {
                sum_present(self.website_cells(row, website_of(website)).map(decision_value))
            }
            Column::WebsiteAverageTime { website } => {
                mean_present(self.website_cells(row, website_of(website)).map(|c| c.time))
            }
            Column::DeviceAccepts { device } => {
                sum_present(self.device_cells(row, device_of(device)).map(decision_value))
            }
            Column::TotalAccepts => sum_present(self.grid[row].iter().map(decision_value)),
            Column::DeviceAverageTime { device } => {
                mean_present(self.device_cells(row, device_of(device)).map(|c| c.time))
            }
            Column::TotalAverageTime => mean_present(self.grid[row].iter().map(|c| c.time)),
            Column::CookieQuestionsScore => Some(survey.cookie_questions_score() as f64),
            Column::AgeInt => survey.age_int().map(f64::from),
            Column::UnderstandCookieConsentInt => {
                survey.understand_cookie_consent_int().map(f64::from)
            }
            Column::AverageWithdrawalTime => {
                mean_present(self.grid[row].iter().map(|c| c.withdrawal_time))
            }
            Column::AverageConsentGivenWithdrawalTime => mean_present(
                self.grid[row]
                    .iter()
                    .filter(|c| c.withdrawal_time.is_some())
                    .map(|c| c.time),
            ),
        }
    }
}

fn decision_value(cell: &CellValues) -> Option<f64> {
    cell.decision.map(|d| d.as_f64())
}

fn check_seconds(participant: &str, field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(seconds) if !seconds.is_finite() || seconds < 0.0 => Err(
            AnalysisError::invalid_record(
                participant,
                format!("{} must be a non-negative number of seconds, got {}", field, seconds),
            ),
        ),
        _ => Ok(()),
    }
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

fn mean_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
