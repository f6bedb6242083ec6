use thiserror::Error;

use crate::constants::FilterId;

#[derive(Error, Debug)]
pub enum MagstatsError {
    #[error("Unrecognized value for first/last selector: {0}")]
    InvalidSelector(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid detection {candid}: {reason}")]
    InvalidDetection { candid: String, reason: String },

    #[error("No saturation threshold configured for filter {0}")]
    UnknownFilter(FilterId),

    #[error("Unknown calculator: {0}")]
    UnknownCalculator(String),

    #[error("Invalid magstats parameters: {0}")]
    InvalidParams(String),

    #[error("Error during the JSON parsing: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Error during the CSV parsing: {0}")]
    CsvParsing(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for MagstatsError {
    fn eq(&self, other: &Self) -> bool {
        use MagstatsError::*;
        match (self, other) {
            (InvalidSelector(a), InvalidSelector(b)) => a == b,
            (MissingField(a), MissingField(b)) => a == b,
            (
                InvalidDetection {
                    candid: ca,
                    reason: ra,
                },
                InvalidDetection {
                    candid: cb,
                    reason: rb,
                },
            ) => ca == cb && ra == rb,
            (UnknownFilter(a), UnknownFilter(b)) => a == b,
            (UnknownCalculator(a), UnknownCalculator(b)) => a == b,
            (InvalidParams(a), InvalidParams(b)) => a == b,

            // Wrapped errors are not comparable: same variant is enough
            (JsonParsing(_), JsonParsing(_)) => true,
            (CsvParsing(_), CsvParsing(_)) => true,
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
