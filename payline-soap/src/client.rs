//! SOAP client implementation.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::envelope::{self, Namespaces};
use crate::{
    Document, IncomingEnvelope, Interceptor, LoggingInterceptor, OutgoingEnvelope, Result,
    ServiceDescription, SoapClientConfig, SoapError, WsdlSource,
};

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: String,
}

/// SOAP client bound to one service description.
#[derive(Clone)]
pub struct SoapClient {
    inner: reqwest::Client,
    description: Arc<ServiceDescription>,
    namespaces: Namespaces,
    auth: Option<BasicAuth>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    config: Arc<SoapClientConfig>,
}

impl SoapClient {
    /// Load a service description and build a client for it.
    pub async fn connect(source: &WsdlSource, config: SoapClientConfig) -> Result<Self> {
        let inner = build_http_client(&config)?;
        let text = source.fetch(&inner).await?;
        let description = ServiceDescription::parse(&text)?;
        debug!(
            target_namespace = description.target_namespace(),
            operations = description.operations().count(),
            "Loaded service description"
        );
        Self::with_http_client(inner, description, config)
    }

    /// Build a client for an already parsed description.
    pub fn from_description(description: ServiceDescription, config: SoapClientConfig) -> Result<Self> {
        let inner = build_http_client(&config)?;
        Self::with_http_client(inner, description, config)
    }

    fn with_http_client(
        inner: reqwest::Client,
        mut description: ServiceDescription,
        config: SoapClientConfig,
    ) -> Result<Self> {
        if let Some(endpoint) = &config.endpoint {
            description.override_endpoint(endpoint)?;
        }

        let namespaces = Namespaces::single(description.target_namespace());
        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
        if config.log_envelopes {
            let logging = if config.log_bodies {
                LoggingInterceptor::new().with_body()
            } else {
                LoggingInterceptor::new()
            };
            interceptors.push(Arc::new(logging));
        }

        Ok(Self {
            inner,
            description: Arc::new(description),
            namespaces,
            auth: None,
            interceptors,
            config: Arc::new(config),
        })
    }

    /// Authenticate every call with HTTP basic authentication.
    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
    }

    /// Builder form of [`SoapClient::set_basic_auth`].
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.set_basic_auth(username, password);
        self
    }

    /// Qualify nested request fields with a separate namespace.
    pub fn with_object_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces = self.namespaces.with_object(namespace);
        self
    }

    /// Add an interceptor. Interceptors run in insertion order.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Get the service description.
    pub fn description(&self) -> &ServiceDescription {
        &self.description
    }

    /// Get the client configuration.
    pub fn config(&self) -> &SoapClientConfig {
        &self.config
    }

    /// Invoke an operation with a request document and decode the reply.
    pub async fn call(&self, operation: &str, document: &Document) -> Result<Document> {
        let endpoint = self
            .description
            .endpoint(operation)
            .ok_or_else(|| SoapError::UnknownOperation(operation.to_string()))?;

        let xml = envelope::encode_request(operation, &self.namespaces, document)?;

        let outgoing = OutgoingEnvelope {
            operation,
            endpoint: &endpoint.address,
            xml: &xml,
        };
        for interceptor in &self.interceptors {
            interceptor.intercept_request(&outgoing).await?;
        }

        let mut request = self
            .inner
            .post(&endpoint.address)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", endpoint.soap_action));
        for (name, value) in &self.config.default_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        let response = request.body(xml).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let incoming = IncomingEnvelope {
            operation,
            status: status.as_u16(),
            xml: &body,
        };
        for interceptor in &self.interceptors {
            interceptor.intercept_response(&incoming).await?;
        }

        if !status.is_success() {
            if let Some(SoapError::Fault { code, message }) = envelope::decode_fault(&body) {
                debug!(operation, status = status.as_u16(), %code, %message, "SOAP fault");
            }
            return Err(SoapError::Status {
                status: status.as_u16(),
                body,
            });
        }

        envelope::decode_response(&body)
    }
}

fn build_http_client(config: &SoapClientConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .gzip(config.gzip)
        .build()?;
    Ok(client)
}
