//! Upstream fetcher
//!
//! One outbound GET per relay call, redirects followed, dressed up as a
//! desktop browser. The status code is recorded but never treated as a
//! failure: error pages are relayed like any other document.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_HEADER, CONTENT_TYPE, REFERER};
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

use crate::envelope::Mode;
use crate::error::RelayError;
use crate::Result;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

const MAX_REDIRECTS: usize = 10;

/// What came back from the target, fully buffered
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// URL after following redirects
    pub final_url: Url,
    pub status: u16,
    /// Raw `Content-Type` header, if the target sent one
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Decode the body as text, honoring the `charset` parameter.
    ///
    /// Falls back to UTF-8; malformed sequences become U+FFFD rather than errors.
    pub fn text(&self) -> String {
        let encoding = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .and_then(|m| {
                m.get_param(mime::CHARSET)
                    .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_str().as_bytes()))
            })
            .unwrap_or(encoding_rs::UTF_8);

        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }
}

/// Source of upstream responses.
///
/// The relay only depends on this trait so the rewrite pipeline can be driven
/// without network access.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &Url, mode: Mode) -> Result<UpstreamResponse>;
}

/// `reqwest`-backed fetcher; cheap to clone, shares one connection pool
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// `None` leaves timing entirely to the client defaults
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| RelayError::internal(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &Url, mode: Mode) -> Result<UpstreamResponse> {
        let mut request = self
            .client
            .get(target.clone())
            .header(ACCEPT, mode.accept_header())
            .header(ACCEPT_LANGUAGE_HEADER, ACCEPT_LANGUAGE);

        let origin = target.origin();
        if origin.is_tuple() {
            request = request.header(REFERER, origin.ascii_serialization());
        }

        let response = request.send().await?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            tracing::warn!(
                url = %target,
                final_url = %final_url,
                status = status.as_u16(),
                "Upstream returned non-success status; relaying body anyway"
            );
        }

        let body = response.bytes().await?;

        tracing::debug!(
            url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            "Fetched upstream"
        );

        Ok(UpstreamResponse {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
