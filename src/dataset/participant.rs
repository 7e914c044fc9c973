// Participant records as delivered by the ETL collaborator

use crate::dataset::survey::SurveyAnswers;
use serde::{Deserialize, Serialize};

/// Banner decision; a missing decision is `None` at the use site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// 1.0 for accept, 0.0 for reject
    pub fn as_f64(self) -> f64 {
        match self {
            Decision::Accept => 1.0,
            Decision::Reject => 0.0,
        }
    }

    pub fn is_accept(self) -> bool {
        self == Decision::Accept
    }
}

/// Outcome of one banner shown on one device and website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub device: String,
    pub website: String,
    #[serde(default)]
    pub decision: Option<Decision>,
    /// Seconds until the decision
    #[serde(default)]
    pub time_seconds: Option<f64>,
    /// Seconds spent withdrawing consent, only present when the participant withdrew
    #[serde(default)]
    pub withdrawal_time_seconds: Option<f64>,
}

impl Observation {
    pub fn new(device: &str, website: &str, decision: Option<Decision>, time: Option<f64>) -> Self {
        Self {
            device: device.to_string(),
            website: website.to_string(),
            decision,
            time_seconds: time,
            withdrawal_time_seconds: None,
        }
    }

    pub fn with_withdrawal(mut self, seconds: f64) -> Self {
        self.withdrawal_time_seconds = Some(seconds);
        self
    }
}

/// One study participant: survey answers joined with experiment observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub survey: SurveyAnswers,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl Participant {
    pub fn new(id: impl Into<String>, survey: SurveyAnswers) -> Self {
        Self {
            id: id.into(),
            survey,
            observations: Vec::new(),
        }
    }

    pub fn observe(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }
}

/// Values of one (device, website) cell after indexing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CellValues {
    pub decision: Option<Decision>,
    pub time: Option<f64>,
    pub withdrawal_time: Option<f64>,
}

impl From<&Observation> for CellValues {
    fn from(observation: &Observation) -> Self {
        Self {
            decision: observation.decision,
            time: observation.time_seconds,
            withdrawal_time: observation.withdrawal_time_seconds,
        }
    }
}
