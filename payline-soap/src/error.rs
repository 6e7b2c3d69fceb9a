//! SOAP client error types.

use thiserror::Error;

/// Result type for SOAP client operations.
pub type Result<T> = std::result::Result<T, SoapError>;

/// SOAP client errors.
#[derive(Debug, Error)]
pub enum SoapError {
    /// The service returned a non-2xx HTTP status.
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, possibly a SOAP fault.
        body: String,
    },

    /// The service answered 2xx with a SOAP fault.
    #[error("SOAP fault {code}: {message}")]
    Fault {
        /// Fault code.
        code: String,
        /// Fault string.
        message: String,
    },

    /// The service description could not be understood.
    #[error("Invalid service description: {0}")]
    Description(String),

    /// The operation is not declared by the service description.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Malformed XML in a description or response.
    #[error("XML error: {0}")]
    Xml(String),

    /// Invalid endpoint or description URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error while reading a local description.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SoapError {
    /// Get the HTTP status code if the failure carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for SoapError {
    fn from(err: quick_xml::Error) -> Self {
        SoapError::Xml(err.to_string())
    }
}

impl From<url::ParseError> for SoapError {
    fn from(err: url::ParseError) -> Self {
        SoapError::InvalidUrl(err.to_string())
    }
}
