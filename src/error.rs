//! Error types for the check plugin.

use thiserror::Error;

use crate::api::ApiError;
use crate::check::Side;
use crate::verdict::Verdict;

/// Everything that can stop a check from producing a verdict.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("malformed threshold '{0}': expected <low>:<high>")]
    MalformedThreshold(String),

    #[error("invalid {side} bound '{value}' in {kind} threshold: {reason}")]
    InvalidThresholdValue {
        kind: String,
        side: Side,
        value: String,
        reason: String,
    },

    #[error("invalid time format '{0}'")]
    InvalidTimeFormat(String),

    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("numeric thresholds given for non-numeric state")]
    NonNumericState,

    #[error("time thresholds given for non-time state")]
    NonTemporalState,

    #[error("{0}")]
    ConfigurationConflict(String),

    #[error("group {0} contains itself")]
    GroupCycle(String),

    #[error("group {name} is nested deeper than {limit} levels")]
    GroupTooDeep { name: String, limit: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckError {
    /// Every error is reported as UNKNOWN.
    pub fn verdict(&self) -> Verdict {
        Verdict::Unknown
    }
}
