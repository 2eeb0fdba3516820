use thiserror::Error;

use crate::data::model::RangeSummary;

/// Failures of the classification and statistics pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("table has {found} column(s); at least two are needed for a time and a value axis")]
    InsufficientColumns { found: usize },

    #[error("could not identify distinct time and value columns")]
    MappingNotFound,

    #[error("column not found: {0}")]
    UnknownColumn(String),

    #[error("no observations between {start} and {end}")]
    EmptyRange { start: i32, end: i32 },

    #[error("trend is undefined: the {} observation(s) in range cover fewer than two distinct years", .summary.count)]
    DegenerateFit { summary: RangeSummary },

    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: i32, end: i32 },
}

impl Error {
    /// Corrective message for the UI.
    pub fn user_hint(&self) -> &'static str {
        match self {
            Error::InsufficientColumns { .. } => {
                "Select a valid CSV with at least two columns."
            }
            Error::MappingNotFound | Error::UnknownColumn(_) => {
                "Pick the time and value columns by hand."
            }
            Error::EmptyRange { .. } => "Select a time range that contains data.",
            Error::DegenerateFit { .. } => "Select a wider time range to see a trend.",
            Error::InvalidRange { .. } => "The start year must not be after the end year.",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to the external text service. Classification always
/// swallows these; narrative generation reports them.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::YearRange;

    #[test]
    fn degenerate_message_reports_count() {
        let err = Error::DegenerateFit {
            summary: RangeSummary {
                range: YearRange::new(2000, 2000),
                count: 1,
                start_value: 0.5,
                end_value: 0.5,
                net_change: 0.0,
                peak: 0.5,
                trough: 0.5,
            },
        };
        assert!(err.to_string().contains("the 1 observation(s)"));
        assert_eq!(err.user_hint(), "Select a wider time range to see a trend.");
    }
}
