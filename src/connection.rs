//! Connection to the gateway
//!
//! [`Connector`] performs the one-time handshake and yields a
//! [`Transport`], which invokes single operations. The SOAP implementation
//! is [`SoapConnector`]; tests substitute in-memory ones.

use async_trait::async_trait;
use payline_soap::{SoapClient, SoapClientConfig, SoapError, WsdlSource};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::debug;

use crate::error::{PaylineError, PaylineResult};
use crate::types::Credentials;
use crate::Document;

/// Service description of API v4.44, compiled in.
pub const BUNDLED_WSDL: &str = include_str!("../wsdl/WebPaymentAPI.v4.44.wsdl");

/// Namespace of the gateway's nested object types.
pub const OBJECT_NAMESPACE: &str = "http://obj.ws.payline.experian.com";

/// Failure of a single operation invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Non-2xx HTTP status
    #[error("HTTP status {status}")]
    Status { status: u16, body: String },

    /// SOAP fault on a 2xx response
    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    /// Request or response could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),
}

impl From<SoapError> for TransportError {
    fn from(err: SoapError) -> Self {
        if let Some(status) = err.status_code() {
            let body = match err {
                SoapError::Status { body, .. } => body,
                _ => String::new(),
            };
            return TransportError::Status { status, body };
        }

        match err {
            SoapError::Fault { code, message } => TransportError::Fault { code, message },
            SoapError::UnknownOperation(_) | SoapError::Xml(_) | SoapError::InvalidUrl(_) => {
                TransportError::Protocol(err.to_string())
            }
            other => TransportError::Network(other.to_string()),
        }
    }
}

/// Single-operation invocation on an established connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `operation` with a request document and return the response
    /// document.
    async fn invoke(&self, operation: &str, document: Document) -> Result<Document, TransportError>;
}

/// One-time connection handshake.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use payline::{Connector, Credentials, Document, PaylineClient, PaylineResult, Transport, TransportError};
/// use serde_json::json;
///
/// struct Approving;
///
/// #[async_trait]
/// impl Transport for Approving {
///     async fn invoke(&self, _operation: &str, _document: Document) -> Result<Document, TransportError> {
///         Ok(json!({ "result": { "code": "00000", "shortMessage": "ACCEPTED" } }))
///     }
/// }
///
/// struct InMemory;
///
/// #[async_trait]
/// impl Connector for InMemory {
///     type Connection = Approving;
///
///     async fn connect(&self, _credentials: &Credentials) -> PaylineResult<Approving> {
///         Ok(Approving)
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let credentials = Credentials::new("merchant", "access-key", "1234567").unwrap();
/// let client = PaylineClient::with_connector(credentials, InMemory);
///
/// let result = client.do_reset("T1").await.unwrap();
/// assert_eq!(result.code, "00000");
/// # });
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connection produced by the handshake
    type Connection: Transport + 'static;

    /// Load the service description and configure authentication.
    async fn connect(&self, credentials: &Credentials) -> PaylineResult<Self::Connection>;
}

/// SOAP connector: loads a WSDL and authenticates with HTTP basic auth.
#[derive(Debug, Clone)]
pub struct SoapConnector {
    source: WsdlSource,
    options: SoapClientConfig,
}

impl SoapConnector {
    pub fn new(source: WsdlSource, options: SoapClientConfig) -> Self {
        Self { source, options }
    }
}

impl Default for SoapConnector {
    fn default() -> Self {
        Self::new(WsdlSource::Bundled(BUNDLED_WSDL), SoapClientConfig::default())
    }
}

#[async_trait]
impl Connector for SoapConnector {
    type Connection = SoapClient;

    async fn connect(&self, credentials: &Credentials) -> PaylineResult<SoapClient> {
        debug!(source = ?self.source, "Connecting to gateway");

        let client = SoapClient::connect(&self.source, self.options.clone())
            .await
            .map_err(|e| PaylineError::Connection(e.to_string()))?
            .with_basic_auth(
                credentials.merchant_id(),
                credentials.access_key().expose_secret(),
            )
            .with_object_namespace(OBJECT_NAMESPACE);

        debug!(
            operations = client.description().operations().count(),
            "Gateway connection ready"
        );
        Ok(client)
    }
}

#[async_trait]
impl Transport for SoapClient {
    async fn invoke(&self, operation: &str, document: Document) -> Result<Document, TransportError> {
        Ok(self.call(operation, &document).await?)
    }
}
