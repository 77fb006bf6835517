//! Error taxonomy for mission validation, interpolation and engine runs.

use thiserror::Error;

use crate::models::TimeSpan;

pub type Result<T> = std::result::Result<T, DeconflictError>;

/// Why a mission (or a mission set) was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationReason {
    #[error("mission needs at least two waypoints, got {count}")]
    TooFewWaypoints { count: usize },

    #[error("waypoint {index} has timestamp {current} which does not follow {previous}")]
    NonIncreasingTimestamp {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("waypoint {index} has a non-finite coordinate or timestamp")]
    NonFiniteValue { index: usize },

    #[error("drone identifier appears more than once in the mission set")]
    DuplicateDroneId,

    #[error("drone identifier is empty")]
    EmptyDroneId,

    /// Scheduling bounds of a plan are reversed or not finite.
    #[error("schedule runs from {start} to {end}")]
    InvalidSchedule { start: f64, end: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeconflictError {
    #[error("invalid mission '{drone_id}': {reason}")]
    Validation {
        drone_id: String,
        reason: ValidationReason,
    },

    /// Interpolation was asked for a time outside the mission's span.
    #[error("time {time} is outside the span [{}, {}] of mission '{drone_id}'", .span.start, .span.end)]
    OutOfRange {
        drone_id: String,
        time: f64,
        span: TimeSpan,
    },

    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("run cancelled before all pairs were evaluated")]
    Cancelled,

    #[error("pair evaluation task failed: {reason}")]
    TaskFailed { reason: String },
}

impl DeconflictError {
    pub(crate) fn validation(drone_id: impl Into<String>, reason: ValidationReason) -> Self {
        Self::Validation {
            drone_id: drone_id.into(),
            reason,
        }
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Drone identifier the error is attributed to, if any.
    pub fn drone_id(&self) -> Option<&str> {
        match self {
            Self::Validation { drone_id, .. } | Self::OutOfRange { drone_id, .. } => {
                Some(drone_id)
            }
            _ => None,
        }
    }
}
