//! Request and response interceptors.
//!
//! Interceptors observe every serialized envelope before it is sent and
//! every raw envelope received, which is where request tracing hooks in.

use crate::Result;
use async_trait::async_trait;

/// A serialized call about to be sent.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingEnvelope<'a> {
    /// Operation name.
    pub operation: &'a str,
    /// Endpoint address the call is posted to.
    pub endpoint: &'a str,
    /// Serialized SOAP envelope.
    pub xml: &'a str,
}

/// A raw response as received.
#[derive(Debug, Clone, Copy)]
pub struct IncomingEnvelope<'a> {
    /// Operation name.
    pub operation: &'a str,
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub xml: &'a str,
}

/// Interceptor trait for observing calls.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Called with the serialized request envelope.
    async fn intercept_request(&self, _request: &OutgoingEnvelope<'_>) -> Result<()> {
        Ok(())
    }

    /// Called with the received response body, before it is decoded.
    async fn intercept_response(&self, _response: &IncomingEnvelope<'_>) -> Result<()> {
        Ok(())
    }
}

/// Logging interceptor that traces envelopes at debug level.
pub struct LoggingInterceptor {
    log_body: bool,
}

impl LoggingInterceptor {
    /// Create a new logging interceptor. Bodies are not logged.
    pub fn new() -> Self {
        Self { log_body: false }
    }

    /// Enable logging of envelope bodies.
    pub fn with_body(mut self) -> Self {
        self.log_body = true;
        self
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept_request(&self, request: &OutgoingEnvelope<'_>) -> Result<()> {
        if self.log_body {
            tracing::debug!(
                target: "payline::soap",
                operation = request.operation,
                endpoint = request.endpoint,
                xml = request.xml,
                "REQUEST"
            );
        } else {
            tracing::debug!(
                target: "payline::soap",
                operation = request.operation,
                endpoint = request.endpoint,
                bytes = request.xml.len(),
                "REQUEST"
            );
        }
        Ok(())
    }

    async fn intercept_response(&self, response: &IncomingEnvelope<'_>) -> Result<()> {
        if self.log_body {
            tracing::debug!(
                target: "payline::soap",
                operation = response.operation,
                status = response.status,
                xml = response.xml,
                "RESPONSE"
            );
        } else {
            tracing::debug!(
                target: "payline::soap",
                operation = response.operation,
                status = response.status,
                bytes = response.xml.len(),
                "RESPONSE"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_interceptor_passes_through() {
        let request = OutgoingEnvelope {
            operation: "doReset",
            endpoint: "http://localhost/DirectPaymentAPI",
            xml: "<Envelope/>",
        };
        let response = IncomingEnvelope {
            operation: "doReset",
            status: 200,
            xml: "<Envelope/>",
        };

        for interceptor in [LoggingInterceptor::new(), LoggingInterceptor::new().with_body()] {
            tokio_test::block_on(async {
                tokio_test::assert_ok!(interceptor.intercept_request(&request).await);
                tokio_test::assert_ok!(interceptor.intercept_response(&response).await);
            });
        }
    }
}
