//! Transport seam for issuing one API call.
//!
//! [`SerpTransport`] is the boundary the retry client drives; the
//! production implementation is a [`reqwest`]-backed GET against the
//! provider's JSON endpoint. Tests substitute scripted transports.

use crate::config::AcquireConfig;
use crate::error::SerpError;
use crate::params::CallParams;
use crate::types::SerpPage;
use std::time::Duration;
use url::Url;

/// Default endpoint of the search-results provider.
pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";

/// One-shot call executor.
///
/// Implementations issue exactly one request per `execute` call —
/// retries live above this seam, in the retry client. All
/// implementations must be `Send + Sync`.
pub trait SerpTransport: Send + Sync {
    /// Issue one API call and decode the response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SerpError::Transport`] for connection, timeout, status
    /// or decode failures. An engine-reported error travels inside the
    /// returned [`SerpPage`] (its `error` field), not as an `Err`.
    fn execute(
        &self,
        params: &CallParams,
    ) -> impl std::future::Future<Output = Result<SerpPage, SerpError>> + Send;
}

/// HTTPS transport against the provider's JSON endpoint.
///
/// Holds the API credential; it is appended to the outbound query at
/// send time and never logged or exposed through [`CallParams`].
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport against [`DEFAULT_ENDPOINT`].
    ///
    /// # Errors
    ///
    /// Returns [`SerpError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(api_key: impl Into<String>, config: &AcquireConfig) -> Result<Self, SerpError> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT, config)
    }

    /// Build a transport against a custom endpoint (used by tests).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: &str,
        config: &AcquireConfig,
    ) -> Result<Self, SerpError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SerpError::Transport(format!("invalid endpoint: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SerpError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }
}

impl SerpTransport for HttpTransport {
    async fn execute(&self, params: &CallParams) -> Result<SerpPage, SerpError> {
        tracing::trace!(engine = params.engine(), params = %params, api_key = "REDACTED", "outbound request");

        let mut pairs: Vec<(&str, &str)> = params.iter().collect();
        pairs.push(("api_key", self.api_key.as_str()));

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&pairs)
            .send()
            .await
            .map_err(|e| SerpError::Transport(format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SerpError::Transport(format!("HTTP status error: {e}")))?;

        let page: SerpPage = response
            .json()
            .await
            .map_err(|e| SerpError::Transport(format!("response decode failed: {e}")))?;

        tracing::trace!(
            engine = params.engine(),
            organic = page.organic_results.len(),
            has_error = page.error.is_some(),
            "response received"
        );
        Ok(page)
    }
}
