//! Strict target validation
//!
//! The relay never guesses: the string must already be an absolute URL.
//! Default-scheme normalization is the caller's business.

use url::Url;

use crate::error::RelayError;
use crate::Result;

/// Validate the `url` field of a relay request
pub fn validate_target(raw: Option<&str>) -> Result<Url> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(RelayError::MissingUrl),
    };

    Url::parse(raw).map_err(|source| RelayError::InvalidUrl {
        input: raw.to_string(),
        source,
    })
}

/// `scheme://host[:port]` of a URL, with no trailing slash.
///
/// The port only appears when it is not the scheme default.
pub fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}
