use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::Observation;

pub mod ilmateenistus;

pub use ilmateenistus::{IlmateenistusFeed, parse_observations};

/// Errors raised while fetching or decoding an upstream observation feed.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Feed request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed feed XML: {0}")]
    Xml(#[from] xmltree::ParseError),
    #[error("Feed has no observations timestamp")]
    MissingTimestamp,
    #[error("Invalid observations timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("Invalid {field} '{value}' for station {station}")]
    InvalidField { station: String, field: &'static str, value: String },
}

/// Allow-listed observations from one feed run.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    /// Timestamp shared by every observation of the run.
    pub timestamp: i64,
    pub observations: Vec<Observation>,
}

/// A source of weather observation snapshots.
#[async_trait]
pub trait ObservationFeed: Send + Sync + Debug {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message() {
        let err = FeedError::Status { status: 503, body: "unavailable".into() };
        assert_eq!(err.to_string(), "Feed request failed with status 503: unavailable");
    }

    #[test]
    fn invalid_field_message_names_station() {
        let err = FeedError::InvalidField {
            station: "Pärnu".into(),
            field: "windspeed",
            value: "".into(),
        };
        assert_eq!(err.to_string(), "Invalid windspeed '' for station Pärnu");
    }
}
