//! Result codes and response classification

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Declined, PaylineError, PaylineResult};
use crate::Document;

/// Result codes the gateway uses for a successful operation.
pub const SUCCESS_CODES: [&str; 2] = ["00000", "02500"];

/// The `result` block every gateway response carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResult {
    /// Five-digit status code
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub short_message: Option<String>,
    #[serde(default)]
    pub long_message: Option<String>,
    #[serde(default)]
    pub partner_code: Option<String>,
    #[serde(default)]
    pub partner_code_label: Option<String>,
}

impl GatewayResult {
    /// Whether the code is one of [`SUCCESS_CODES`].
    pub fn is_successful(&self) -> bool {
        is_success_code(&self.code)
    }

    /// Read the `result` block of a response document.
    ///
    /// A missing or unreadable block yields an empty, unsuccessful result.
    pub fn from_response(response: &Document) -> Self {
        response
            .get("result")
            .and_then(|result| Self::deserialize(result).ok())
            .unwrap_or_default()
    }
}

/// Check a raw result code against [`SUCCESS_CODES`].
pub fn is_success_code(code: &str) -> bool {
    SUCCESS_CODES.contains(&code)
}

/// Full response of an operation, returned when callers want everything.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub result: GatewayResult,
    /// Response document, `result` included
    pub document: Document,
}

impl GatewayResponse {
    pub fn new(document: Document) -> Self {
        Self {
            result: GatewayResult::from_response(&document),
            document,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.result.is_successful()
    }

    /// Get a top-level response field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.document.get(field)
    }

    /// `transaction.id`, when the response carries a transaction.
    pub fn transaction_id(&self) -> Option<&str> {
        self.document
            .pointer("/transaction/id")
            .and_then(Value::as_str)
    }

    /// `redirectURL`, for web payment and web wallet responses.
    pub fn redirect_url(&self) -> Option<&str> {
        self.document.get("redirectURL").and_then(Value::as_str)
    }

    /// `token`, for web payment and web wallet responses.
    pub fn token(&self) -> Option<&str> {
        self.document.get("token").and_then(Value::as_str)
    }
}

/// Keep a successful response, turn any other code into a decline that
/// carries the whole response.
pub fn classify(response: Document) -> PaylineResult<GatewayResponse> {
    let response = GatewayResponse::new(response);
    if response.is_successful() {
        Ok(response)
    } else {
        tracing::debug!(code = %response.result.code, "Operation declined");
        Err(PaylineError::Declined(Box::new(Declined {
            result: response.result,
            response: response.document,
        })))
    }
}

/// Classify, then read the response as a typed payload.
pub fn classify_as<T: DeserializeOwned>(response: Document) -> PaylineResult<T> {
    let response = classify(response)?;
    Ok(serde_json::from_value(response.document)?)
}
