//! SOAP client configuration.

use std::time::Duration;

/// SOAP client configuration.
///
/// These are the transport options a caller may pass through the payment
/// client untouched.
#[derive(Debug, Clone)]
pub struct SoapClientConfig {
    /// Replaces scheme, host and port of every endpoint declared by the
    /// service description. Paths are kept.
    pub endpoint: Option<String>,
    /// Default request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Extra headers sent with every call.
    pub default_headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip compression.
    pub gzip: bool,
    /// Log request and response envelopes through `tracing`.
    pub log_envelopes: bool,
    /// Include envelope bodies in those logs. Bodies carry card data.
    pub log_bodies: bool,
}

impl Default for SoapClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_headers: Vec::new(),
            user_agent: format!("payline-soap/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            log_envelopes: true,
            log_bodies: false,
        }
    }
}

impl SoapClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SoapClientConfigBuilder {
        SoapClientConfigBuilder::default()
    }
}

/// Builder for SOAP client configuration.
#[derive(Debug, Default)]
pub struct SoapClientConfigBuilder {
    config: SoapClientConfig,
}

impl SoapClientConfigBuilder {
    /// Override the endpoints declared by the service description.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = Some(url.into());
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Add a default header for all calls.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable gzip compression.
    pub fn gzip(mut self, enable: bool) -> Self {
        self.config.gzip = enable;
        self
    }

    /// Enable or disable envelope logging.
    pub fn log_envelopes(mut self, enable: bool) -> Self {
        self.config.log_envelopes = enable;
        self
    }

    /// Enable or disable logging of full envelope bodies.
    pub fn log_bodies(mut self, enable: bool) -> Self {
        self.config.log_bodies = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SoapClientConfig {
        self.config
    }
}
