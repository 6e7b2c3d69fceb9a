//! # Payline SOAP
//!
//! A small SOAP 1.1 client: it loads a WSDL service description, routes each
//! operation to the port that declares it, and exchanges JSON-shaped
//! documents as SOAP envelopes over HTTP.
//!
//! ## Features
//!
//! - **Service description**: bundled, inline, file or URL WSDL sources
//! - **Routing**: per-operation endpoint and SOAP action from the bindings
//! - **Basic auth**: HTTP basic authentication on every call
//! - **Interceptors**: request/response envelope tracing hooks
//! - **Endpoint override**: point a production description at another host
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use payline_soap::{SoapClient, SoapClientConfig, WsdlSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = WsdlSource::from_location("https://example.com/service.wsdl");
//!     let client = SoapClient::connect(&source, SoapClientConfig::default())
//!         .await?
//!         .with_basic_auth("merchant", "secret");
//!
//!     let reply = client
//!         .call("doReset", &serde_json::json!({ "transactionID": "T1" }))
//!         .await?;
//!
//!     println!("{}", reply["result"]["code"]);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod interceptor;

pub mod envelope;
pub mod wsdl;

pub use client::SoapClient;
pub use config::{SoapClientConfig, SoapClientConfigBuilder};
pub use envelope::Namespaces;
pub use error::{Result, SoapError};
pub use interceptor::{IncomingEnvelope, Interceptor, LoggingInterceptor, OutgoingEnvelope};
pub use wsdl::{Endpoint, ServiceDescription, WsdlSource};

/// A request or response document.
///
/// Field order is significant and preserved.
pub type Document = serde_json::Value;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::SoapClient;
    pub use crate::config::{SoapClientConfig, SoapClientConfigBuilder};
    pub use crate::error::{Result, SoapError};
    pub use crate::interceptor::{IncomingEnvelope, Interceptor, LoggingInterceptor, OutgoingEnvelope};
    pub use crate::wsdl::{ServiceDescription, WsdlSource};
    pub use crate::Document;
}
