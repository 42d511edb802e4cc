//! Error types for the listing pipeline.

use std::fmt;

/// Why a single record could not be turned into a [`crate::listing::Listing`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedReason {
    MissingField { field: &'static str },
    InvalidNumber { field: &'static str, value: String },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingField { field } => {
                write!(f, "missing required field `{field}`")
            }
            MalformedReason::InvalidNumber { field, value } => {
                write!(f, "field `{field}` has non-numeric value {value:?}")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: MalformedReason },

    #[error("aggregation over empty group `{key}`")]
    EmptyGroup { key: String },

    #[error("unknown character encoding: {0}")]
    UnknownEncoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message() {
        let err = Error::MalformedRecord {
            line: 12,
            reason: MalformedReason::InvalidNumber {
                field: "price",
                value: "abc".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "malformed record at line 12: field `price` has non-numeric value \"abc\""
        );
    }

    #[test]
    fn test_empty_group_message() {
        let err = Error::EmptyGroup {
            key: "audi".into(),
        };
        assert_eq!(err.to_string(), "aggregation over empty group `audi`");
    }
}
