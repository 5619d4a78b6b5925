//! Relay error types
//!
//! Display strings are part of the wire contract: they become the `error`
//! field of the failure envelope verbatim.

use thiserror::Error;

pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to fetch the requested URL";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL format")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// Network, DNS, TLS or body-read failure talking to the target
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    MalformedRequest(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    /// Internal failure, falling back to a fixed message when none is available
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            RelayError::Internal(FALLBACK_ERROR_MESSAGE.to_string())
        } else {
            RelayError::Internal(message)
        }
    }

    /// HTTP status reported for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl { .. } => 400,
            RelayError::Upstream(_)
            | RelayError::MalformedRequest(_)
            | RelayError::Internal(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        let message = e.to_string();
        if message.trim().is_empty() {
            RelayError::Upstream(FALLBACK_ERROR_MESSAGE.to_string())
        } else {
            RelayError::Upstream(message)
        }
    }
}
