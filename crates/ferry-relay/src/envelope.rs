//! Wire types for the relay endpoint
//!
//! Request:  `{ "url": string, "mode"?: "page" | "resource" }`
//! Success:  `{ "content", "contentType", "url", "title"?, "baseUrl"?, "status"? }`
//! Failure:  `{ "error": string }`

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// What the caller wants back from the target URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// A full document to display in a tab
    #[default]
    Page,
    /// A single asset requested by an embedded document
    Resource,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Page => "page",
            Mode::Resource => "resource",
        }
    }

    /// `Accept` header sent upstream
    pub fn accept_header(&self) -> &'static str {
        match self {
            Mode::Page => "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            Mode::Resource => "*/*",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything other than the string `"resource"` (including a missing field,
/// `null` or a non-string value) means page mode.
fn lenient_mode<'de, D>(deserializer: D) -> Result<Mode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(mode)) if mode == "resource" => Mode::Resource,
        _ => Mode::Page,
    })
}

/// Falsy values (`null`, `false`, `0`, `""`) read as absent. Any other
/// non-string keeps its JSON text, which never parses as an absolute URL,
/// so it is rejected as an invalid URL rather than a malformed body.
fn lenient_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(url)) if url.is_empty() => None,
        Some(Value::String(url)) => Some(url),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    #[serde(
        default,
        deserialize_with = "lenient_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: Mode,
}

impl RelayRequest {
    pub fn new(url: impl Into<String>, mode: Mode) -> Self {
        Self {
            url: Some(url.into()),
            mode,
        }
    }

    pub fn page(url: impl Into<String>) -> Self {
        Self::new(url, Mode::Page)
    }

    pub fn resource(url: impl Into<String>) -> Self {
        Self::new(url, Mode::Resource)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Rewritten markup/text, or a `data:` URI for binary assets
    pub content: String,
    pub content_type: String,
    /// Final URL after redirects
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Upstream HTTP status. Error pages are still relayed, so callers that
    /// care about 404s and friends look here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Either shape of a relay reply, as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayEnvelope {
    Failure(ErrorBody),
    Success(RelayResponse),
}

impl RelayEnvelope {
    pub fn into_result(self) -> Result<RelayResponse, String> {
        match self {
            RelayEnvelope::Success(response) => Ok(response),
            RelayEnvelope::Failure(body) => Err(body.error),
        }
    }
}
