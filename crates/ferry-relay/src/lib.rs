//! Ferry Relay
//!
//! The rewriting engine behind the relay endpoint. A relay call is one pass
//! through a fixed pipeline:
//!
//! ```text
//! RelayRequest ─▶ validate URL ─▶ fetch upstream ─▶ rewrite by (mode, content type) ─▶ RelayResponse
//!                                                     ├─ page + text/html: attribute rewrite, head injection, title
//!                                                     ├─ resource + image/*: base64 data URI
//!                                                     ├─ resource + text/css: url(...) rewrite
//!                                                     └─ anything else: raw text
//! ```
//!
//! Every call is independent. The only shared state is the HTTP client and the
//! process-wide constants (CORS headers, user agent).

mod envelope;
mod error;
mod fetch;
mod inject;
mod relay;
mod resolver;
pub mod rewrite;

pub use envelope::{
    ErrorBody, Mode, RelayEnvelope, RelayRequest, RelayResponse, CORS_ALLOW_HEADERS,
    CORS_ALLOW_ORIGIN,
};
pub use error::{RelayError, FALLBACK_ERROR_MESSAGE};
pub use fetch::{Fetcher, HttpFetcher, UpstreamResponse, ACCEPT_LANGUAGE, USER_AGENT};
pub use inject::{inject_into_head, injection_script, RESOURCE_RETRY_DELAYS_MS, SECURITY_OVERRIDE};
pub use relay::Relay;
pub use resolver::{base_url, validate_target};

pub type Result<T> = std::result::Result<T, RelayError>;
