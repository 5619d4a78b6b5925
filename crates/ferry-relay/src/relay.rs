//! Relay endpoint logic: validate, fetch, rewrite

use std::sync::Arc;
use std::time::Duration;

use crate::envelope::{RelayRequest, RelayResponse};
use crate::error::RelayError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::resolver::validate_target;
use crate::rewrite;
use crate::Result;

/// Stateless relay over a shared fetcher. Clones share the fetcher, so one
/// instance can serve any number of concurrent calls.
pub struct Relay<F: Fetcher = HttpFetcher> {
    fetcher: Arc<F>,
}

impl Relay<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::with_timeout(timeout)?))
    }
}

impl<F: Fetcher> Relay<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    /// Run one relay call
    pub async fn handle(&self, request: RelayRequest) -> Result<RelayResponse> {
        let target = validate_target(request.url.as_deref())?;

        tracing::info!(mode = %request.mode, url = %target, "Proxying request");

        let upstream = self.fetcher.fetch(&target, request.mode).await?;
        let response = rewrite::render(request.mode, upstream);

        tracing::debug!(
            url = %response.url,
            content_type = %response.content_type,
            bytes = response.content.len(),
            "Relay response ready"
        );

        Ok(response)
    }

    /// Run one relay call from a raw JSON request body
    pub async fn handle_json(&self, body: &[u8]) -> Result<RelayResponse> {
        let request: RelayRequest = serde_json::from_slice(body).map_err(|e| {
            tracing::warn!(error = %e, "Rejected malformed relay request body");
            RelayError::from(e)
        })?;
        self.handle(request).await
    }
}

impl<F: Fetcher> Clone for Relay<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}
