use thiserror::Error;

use crate::validation::ValidationError;

/// Error taxonomy for the points-economy client. Public client methods return
/// these rather than raw transport errors; `kind()` gives the UI a stable tag
/// for choosing copy and retry affordances without inspecting transport
/// details.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("request timed out after {0}s")]
    RequestTimeout(u64),

    #[error("authentication failed (HTTP {status})")]
    AuthenticationFailure { status: u16 },

    #[error("validation failed: {}", summarize(.0))]
    ValidationFailure(Vec<ValidationError>),

    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("no rate source could produce a usable rate for {0}")]
    RateUnavailable(String),

    #[error("rate has a zero value per MyPt")]
    DivisionByZero,

    #[error("insufficient balance: requested {requested} MyPts, {available} available")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("transaction {id} is {status}, only RESERVED transactions can be actioned")]
    StateConflict { id: String, status: String },

    #[error("backend rejected the request: {0}")]
    Backend(String),

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Stable machine-readable tag matching the error taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::NetworkFailure(_) => "network_failure",
            ClientError::RequestTimeout(_) => "request_timeout",
            ClientError::AuthenticationFailure { .. } => "authentication_failure",
            ClientError::ValidationFailure(_) => "validation_failure",
            ClientError::UnsupportedCurrency(_) => "unsupported_currency",
            ClientError::RateUnavailable(_) => "rate_unavailable",
            ClientError::DivisionByZero => "division_by_zero",
            ClientError::InsufficientBalance { .. } => "insufficient_balance",
            ClientError::StateConflict { .. } => "state_conflict",
            ClientError::Backend(_) => "backend_failure",
            ClientError::InvalidResponse(_) => "invalid_response",
        }
    }

    /// True for errors the caller may resolve by simply retrying the whole
    /// operation. Authentication failures are excluded on purpose; they need
    /// a re-login first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkFailure(_) | ClientError::RequestTimeout(_)
        )
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ClientError::RequestTimeout(timeout_secs)
        } else {
            ClientError::NetworkFailure(err.to_string())
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
