//! Shared error type across pulse crates.

use thiserror::Error;

use crate::metric::MetricKind;

/// Stable error codes (used in HTTP error bodies and logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid metric name or argument.
    Validation,
    /// Name already bound to another kind.
    KindMismatch,
    /// Per-series eviction failed during a sweep.
    SweepFailure,
    /// An event listener failed.
    SubscriberFailure,
    /// Config could not be read, parsed, or validated.
    Config,
    /// Lookup miss surfaced over HTTP (`get_metric` itself returns `None`).
    NotFound,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::KindMismatch => "KIND_MISMATCH",
            ErrorCode::SweepFailure => "SWEEP_FAILURE",
            ErrorCode::SubscriberFailure => "SUBSCRIBER_FAILURE",
            ErrorCode::Config => "CONFIG",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("metric {name} is a {existing}, not a {requested}")]
    KindMismatch {
        name: String,
        existing: MetricKind,
        requested: MetricKind,
    },
    #[error("sweep of {name} failed: {reason}")]
    SweepFailure { name: String, reason: String },
    #[error("listener {listener} failed: {reason}")]
    SubscriberFailure { listener: String, reason: String },
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TelemetryError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            TelemetryError::Validation(_) => ErrorCode::Validation,
            TelemetryError::KindMismatch { .. } => ErrorCode::KindMismatch,
            TelemetryError::SweepFailure { .. } => ErrorCode::SweepFailure,
            TelemetryError::SubscriberFailure { .. } => ErrorCode::SubscriberFailure,
            TelemetryError::Config(_) => ErrorCode::Config,
            TelemetryError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// True for errors a caller caused with bad input.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TelemetryError::Validation(_) | TelemetryError::KindMismatch { .. }
        )
    }
}
