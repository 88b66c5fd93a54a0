//! The transport collaborator: sends a finalized request, returns the response.

use crate::constants;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::time::Duration;

/// Sends requests. Retries, pooling and timeouts are the transport's business.
pub trait Transport: Send + Sync {
    /// Sends `request` and reads the whole response.
    ///
    /// Non-success statuses are responses, not errors.
    ///
    /// # Errors
    /// Returns an error on connection or protocol failure.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send;
}

/// Installs the process-wide rustls crypto provider. Installing twice is
/// harmless.
fn install_crypto_provider() {
    #[cfg(not(windows))]
    let _ = rustls::crypto::ring::default_provider().install_default();
    #[cfg(windows)]
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Transport backed by a `reqwest` client using rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Client with the default timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying client cannot be created.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS))
    }

    /// Client whose requests time out after `timeout` unless a request sets
    /// its own.
    ///
    /// # Errors
    /// Returns an error if the underlying client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        install_crypto_provider();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from(e).with_context("Request failed"))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::from(e).with_context("Failed to read response body"))?;

        Ok(Response::new(status, headers, body.to_vec(), request))
    }
}
