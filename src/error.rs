//! Error taxonomy for the statistical battery
//!
//! Only fatal conditions are errors. Too-small samples are reported through
//! "not computed" sentinels on the result records instead.

use thiserror::Error;

/// Errors raised by the dataset layer, the engines and the aggregator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Unrecognized test kind, selector or configuration value
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Requested variable, device or website does not exist in the study design
    #[error("missing column `{column}`: {reason}")]
    MissingColumn { column: String, reason: String },

    /// A participant record violates the dataset input contract
    #[error("invalid record for participant `{participant}`: {reason}")]
    InvalidRecord { participant: String, reason: String },

    /// Configuration text could not be parsed
    #[error("failed to parse study configuration: {0}")]
    Config(String),

    /// Failure of a single aggregation cell
    #[error("cell (variable `{variable}`, grouping `{grouping}`) failed: {source}")]
    Cell {
        variable: String,
        grouping: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_record(participant: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            participant: participant.into(),
            reason: reason.into(),
        }
    }

    /// Attach the aggregation cell coordinates to an error
    pub fn in_cell(self, variable: impl Into<String>, grouping: impl Into<String>) -> Self {
        Self::Cell {
            variable: variable.into(),
            grouping: grouping.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_error_names_variable_and_grouping() {
        let err = AnalysisError::missing_column("tablet_accepts", "device `tablet` is not configured")
            .in_cell("tablet_accepts", "privacy_concern");
        let message = err.to_string();
        assert!(message.contains("tablet_accepts"));
        assert!(message.contains("privacy_concern"));
        assert!(message.contains("tablet"));
    }

    #[test]
    fn test_cell_error_exposes_source() {
        use std::error::Error;

        let err = AnalysisError::invalid_argument("test_kind", "unknown").in_cell("x", "y");
        let source = err.source().expect("cell error should carry its source");
        assert!(source.to_string().contains("test_kind"));
    }
}
