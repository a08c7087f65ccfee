//! Error types for the wallet session core
//!
//! One enum per layer: the gateway reports transport and decoding failures,
//! transfer/login validation reports precondition failures, and the
//! orchestrator wraps both together with its own post-call invariants.

use thiserror::Error;

/// Failure of a single backend call
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport failure (connection refused, TLS, reset, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Backend answered with its error envelope
    #[error("API error {status} (code {code}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Client-side precondition failure; no network call was made
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("User ID is Empty")]
    EmptyUserId,

    #[error("Invalid Format")]
    InvalidFormat,

    #[error("send amount is Empty")]
    EmptyAmount,

    #[error("Insufficient Balance")]
    InsufficientBalance,
}

/// Outcome of an orchestrated flow that did not complete
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Another flow is already in progress
    #[error("Another operation is in progress ({0})")]
    Busy(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Session call succeeded but returned an empty credential
    #[error("Empty credential: {0}")]
    EmptyCredential(String),

    /// Registration finished without token, key and challenge id all present
    #[error("Incomplete registration: {0}")]
    IncompleteRegistration(String),

    #[error("Challenge failed (code {code}): {message}")]
    ChallengeFailure { code: i64, message: String },

    /// The session changed (logout) while the flow was suspended
    #[error("Session changed while the request was in flight")]
    StaleSession,
}

/// App id store failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_match_toasts() {
        assert_eq!(ValidationError::InvalidFormat.to_string(), "Invalid Format");
        assert_eq!(
            ValidationError::InsufficientBalance.to_string(),
            "Insufficient Balance"
        );
    }

    #[test]
    fn test_validation_converts_into_orchestrator_error() {
        let err: OrchestratorError = ValidationError::EmptyAmount.into();
        assert!(matches!(
            err,
            OrchestratorError::Validation(ValidationError::EmptyAmount)
        ));
    }
}
