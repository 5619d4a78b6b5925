//! Messages exchanged with the script injected into relayed pages
//!
//! Everything inbound comes from an untrusted document, so payloads are
//! parsed strictly and URLs must be absolute `http`/`https`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawMessage {
    #[serde(rename = "proxy-navigate")]
    Navigate {
        url: String,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        body: Option<String>,
        #[serde(default, rename = "newTab")]
        new_tab: bool,
    },
    #[serde(rename = "proxy-resource")]
    Resource {
        url: String,
        #[serde(rename = "elementId")]
        element_id: String,
    },
}

/// A validated message from an embedded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Link click, form submission or `window.open`
    Navigate {
        url: Url,
        method: FormMethod,
        /// URL-encoded form fields, only for POST
        body: Option<String>,
        new_tab: bool,
    },
    /// Asset the document wants fetched through the relay
    Resource { url: Url, element_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Result<Self> {
        let message: RawMessage = serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidMessage(e.to_string()))?;

        match message {
            RawMessage::Navigate {
                url,
                method,
                body,
                new_tab,
            } => {
                let method = match method.as_deref().map(str::to_ascii_uppercase).as_deref() {
                    None | Some("GET") => FormMethod::Get,
                    Some("POST") => FormMethod::Post,
                    Some(other) => {
                        return Err(CoreError::InvalidMessage(format!(
                            "unsupported method {}",
                            other
                        )))
                    }
                };
                Ok(InboundMessage::Navigate {
                    url: web_url(&url)?,
                    body: if method == FormMethod::Post { body } else { None },
                    method,
                    new_tab,
                })
            }
            RawMessage::Resource { url, element_id } => {
                if element_id.is_empty() {
                    return Err(CoreError::InvalidMessage("empty elementId".to_string()));
                }
                Ok(InboundMessage::Resource {
                    url: web_url(&url)?,
                    element_id,
                })
            }
        }
    }
}

fn web_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|_| CoreError::InvalidMessage(format!("bad url {:?}", raw)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(CoreError::InvalidMessage(format!(
            "refusing {} url",
            scheme
        ))),
    }
}

/// Reply to a `proxy-resource` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "proxy-resource-response", rename_all = "camelCase")]
pub struct ResourceResponse {
    pub element_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceResponse {
    pub fn loaded(element_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            content: content.into(),
            error: None,
        }
    }

    pub fn failed(element_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            content: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_navigation() {
        let message =
            InboundMessage::parse(r#"{"type":"proxy-navigate","url":"https://a.example/x"}"#)
                .unwrap();
        assert_eq!(
            message,
            InboundMessage::Navigate {
                url: Url::parse("https://a.example/x").unwrap(),
                method: FormMethod::Get,
                body: None,
                new_tab: false,
            }
        );
    }

    #[test]
    fn test_parse_post_and_popup() {
        let message = InboundMessage::parse(
            r#"{"type":"proxy-navigate","url":"https://a.example/login","method":"post","body":"u=1"}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            InboundMessage::Navigate { method: FormMethod::Post, body: Some(ref b), .. } if b == "u=1"
        ));

        let message = InboundMessage::parse(
            r#"{"type":"proxy-navigate","url":"https://a.example/","newTab":true,"body":"ignored"}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            InboundMessage::Navigate { new_tab: true, body: None, .. }
        ));
    }

    #[test]
    fn test_parse_resource() {
        let message = InboundMessage::parse(
            r#"{"type":"proxy-resource","url":"https://cdn.example/a.png","elementId":"abc123"}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            InboundMessage::Resource { ref element_id, .. } if element_id == "abc123"
        ));
    }

    #[test]
    fn test_rejects_untrusted_shapes() {
        for raw in [
            "not json",
            r#"{"type":"proxy-navigate"}"#,
            r#"{"type":"something-else","url":"https://a.example"}"#,
            r#"{"type":"proxy-navigate","url":"javascript:alert(1)"}"#,
            r#"{"type":"proxy-navigate","url":"file:///etc/passwd"}"#,
            r#"{"type":"proxy-navigate","url":"/relative"}"#,
            r#"{"type":"proxy-navigate","url":"https://a.example","method":"DELETE"}"#,
            r#"{"type":"proxy-resource","url":"https://a.example/a.png","elementId":""}"#,
            r#"{"type":"proxy-navigate","url":42}"#,
        ] {
            assert!(
                matches!(InboundMessage::parse(raw), Err(CoreError::InvalidMessage(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_resource_response_shape() {
        let value: serde_json::Value = serde_json::from_str(
            &ResourceResponse::loaded("e1", "data:image/png;base64,AA")
                .to_json()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(value["type"], "proxy-resource-response");
        assert_eq!(value["elementId"], "e1");
        assert_eq!(value["content"], "data:image/png;base64,AA");
        assert!(value.get("error").is_none());

        let value = serde_json::to_value(ResourceResponse::failed("e2", "boom")).unwrap();
        assert_eq!(value["error"], "boom");
    }
}
