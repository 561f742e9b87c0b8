//! Error types for sarathi-nav.

use thiserror::Error;

/// Planner error type.
///
/// None of these are fatal to the embedding process: a failing cycle is
/// skipped and retried on the next planning period.
#[derive(Error, Debug)]
pub enum SarathiError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("pose lookup failed: {0}")]
    PoseLookup(String),

    #[error("planner is missing a map or a goal")]
    NotReady,

    #[error("state ({0}, {1}) is outside the map")]
    OutOfMap(i32, i32),

    #[error("no path to the goal")]
    NoPath,

    #[error("search aborted after exceeding its time budget")]
    Aborted,
}

impl From<toml::de::Error> for SarathiError {
    fn from(e: toml::de::Error) -> Self {
        SarathiError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SarathiError>;
