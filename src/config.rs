//! Client configuration

use std::env;
use std::time::Duration;

use payline_soap::{SoapClientConfig, SoapClientConfigBuilder, WsdlSource};

use crate::connection::{SoapConnector, BUNDLED_WSDL};
use crate::error::{PaylineError, PaylineResult};
use crate::types::Credentials;

/// Environment variable holding the merchant id.
pub const ENV_MERCHANT_ID: &str = "PAYLINE_MERCHANT_ID";
/// Environment variable holding the access key.
pub const ENV_ACCESS_KEY: &str = "PAYLINE_ACCESS_KEY";
/// Environment variable holding the contract number.
pub const ENV_CONTRACT_NUMBER: &str = "PAYLINE_CONTRACT_NUMBER";
/// Environment variable holding a WSDL URL or path.
pub const ENV_WSDL: &str = "PAYLINE_WSDL";
/// Environment variable holding an endpoint override.
pub const ENV_ENDPOINT: &str = "PAYLINE_ENDPOINT";

/// Gateway client configuration
#[derive(Debug)]
pub struct PaylineConfig {
    /// Merchant credentials
    pub credentials: Credentials,
    /// Service description, the bundled v4.44 one by default
    pub wsdl: WsdlSource,
    /// Transport options passed to the SOAP client
    pub transport: SoapClientConfig,
}

impl PaylineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PaylineConfigBuilder {
        PaylineConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn from_env() -> PaylineResult<Self> {
        dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PaylineResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| PaylineError::Config(format!("{key} is not set")))
        };

        let mut builder = Self::builder()
            .merchant_id(required(ENV_MERCHANT_ID)?)
            .access_key(required(ENV_ACCESS_KEY)?)
            .contract_number(required(ENV_CONTRACT_NUMBER)?);

        if let Some(location) = lookup(ENV_WSDL).filter(|v| !v.is_empty()) {
            builder = builder.wsdl(WsdlSource::from_location(location));
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            builder = builder.endpoint(endpoint);
        }

        builder.build()
    }

    /// SOAP connector for this configuration.
    pub fn connector(&self) -> SoapConnector {
        SoapConnector::new(self.wsdl.clone(), self.transport.clone())
    }
}

/// Builder for [`PaylineConfig`]
#[derive(Debug, Default)]
pub struct PaylineConfigBuilder {
    merchant_id: String,
    access_key: String,
    contract_number: String,
    wsdl: Option<WsdlSource>,
    transport: SoapClientConfigBuilder,
}

impl PaylineConfigBuilder {
    pub fn merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = merchant_id.into();
        self
    }

    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = access_key.into();
        self
    }

    pub fn contract_number(mut self, contract_number: impl Into<String>) -> Self {
        self.contract_number = contract_number.into();
        self
    }

    /// Use another service description.
    pub fn wsdl(mut self, source: WsdlSource) -> Self {
        self.wsdl = Some(source);
        self
    }

    /// Send every call to another host, keeping the service paths.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.transport = self.transport.endpoint(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.timeout(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.connect_timeout(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport = self.transport.user_agent(user_agent);
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport = self.transport.default_header(name, value);
        self
    }

    /// Log request and response envelopes at debug level.
    pub fn log_envelopes(mut self, enable: bool) -> Self {
        self.transport = self.transport.log_envelopes(enable);
        self
    }

    /// Include full envelope bodies, card data included, in those logs.
    pub fn log_bodies(mut self, enable: bool) -> Self {
        self.transport = self.transport.log_bodies(enable);
        self
    }

    /// Build the configuration, validating the credentials.
    pub fn build(self) -> PaylineResult<PaylineConfig> {
        Ok(PaylineConfig {
            credentials: Credentials::new(self.merchant_id, self.access_key, self.contract_number)?,
            wsdl: self.wsdl.unwrap_or(WsdlSource::Bundled(BUNDLED_WSDL)),
            transport: self.transport.build(),
        })
    }
}
