//! How the client side reaches the relay
//!
//! Either in-process through `ferry_relay::Relay` or over HTTP against a
//! running relay server. Both speak the same request/response types.

use async_trait::async_trait;
use ferry_relay::{Fetcher, Relay, RelayEnvelope, RelayRequest, RelayResponse};
use url::Url;

use crate::error::CoreError;
use crate::Result;

#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn relay(&self, request: RelayRequest) -> Result<RelayResponse>;
}

#[async_trait]
impl<F: Fetcher + 'static> RelayClient for Relay<F> {
    async fn relay(&self, request: RelayRequest) -> Result<RelayResponse> {
        Ok(self.handle(request).await?)
    }
}

/// Posts relay requests to a remote endpoint
#[derive(Clone)]
pub struct HttpRelayClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpRelayClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| CoreError::Config(format!("Invalid relay endpoint {}: {}", endpoint, e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn relay(&self, request: RelayRequest) -> Result<RelayResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<RelayEnvelope>(&body) {
            Ok(envelope) => envelope.into_result().map_err(|message| {
                tracing::warn!(status = status.as_u16(), error = %message, "Relay rejected request");
                CoreError::RelayRejected {
                    status: status.as_u16(),
                    message,
                }
            }),
            Err(e) => {
                tracing::error!(status = status.as_u16(), error = %e, "Unreadable relay response");
                Err(CoreError::RelayRejected {
                    status: status.as_u16(),
                    message: format!("Relay returned an unreadable response (HTTP {})", status.as_u16()),
                })
            }
        }
    }
}
