//! Error types for gateway operations

use crate::connection::TransportError;
use crate::result::GatewayResult;
use crate::Document;
use thiserror::Error;

/// Short message for a rejected authentication.
pub const WRONG_CREDENTIALS: &str = "Wrong API credentials";

/// Short message for any other transport failure.
pub const WRONG_CALL: &str = "Wrong API call";

/// Gateway error types
#[derive(Error, Debug, Clone)]
pub enum PaylineError {
    /// Missing or invalid construction parameter
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service description could not be loaded or the network failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transport answered 401
    #[error("{}", WRONG_CREDENTIALS)]
    Credentials,

    /// Transport answered any other failure status
    #[error("{}", WRONG_CALL)]
    Call,

    /// The gateway answered with a non-success result code
    #[error("Declined: {} {}", .0.result.code, .0.result.short_message.as_deref().unwrap_or_default())]
    Declined(Box<Declined>),

    /// Caller input that cannot form a request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request or response document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaylineError {
    /// Short human-readable message, as surfaced for transport failures.
    pub fn short_message(&self) -> String {
        match self {
            Self::Credentials => WRONG_CREDENTIALS.to_string(),
            Self::Call => WRONG_CALL.to_string(),
            Self::Declined(declined) => declined
                .result
                .short_message
                .clone()
                .unwrap_or_else(|| declined.result.code.clone()),
            other => other.to_string(),
        }
    }

    /// Get the decline payload, if the gateway declined the operation.
    pub fn declined(&self) -> Option<&Declined> {
        match self {
            Self::Declined(declined) => Some(declined),
            _ => None,
        }
    }
}

impl From<TransportError> for PaylineError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, .. } => PaylineError::Credentials,
            TransportError::Status { .. } | TransportError::Fault { .. } | TransportError::Protocol(_) => {
                PaylineError::Call
            }
            TransportError::Network(message) => PaylineError::Connection(message),
        }
    }
}

impl From<serde_json::Error> for PaylineError {
    fn from(err: serde_json::Error) -> Self {
        PaylineError::Serialization(err.to_string())
    }
}

/// Result type for gateway operations
pub type PaylineResult<T> = Result<T, PaylineError>;

/// A declined operation: the parsed result block plus the whole response.
#[derive(Debug, Clone)]
pub struct Declined {
    /// Parsed result block
    pub result: GatewayResult,
    /// Full response document as returned by the gateway
    pub response: Document,
}
