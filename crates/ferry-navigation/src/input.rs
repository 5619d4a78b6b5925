//! Address input normalization
//!
//! Whatever the user types is turned into an absolute URL before the relay
//! sees it. The only policy applied here is the default scheme: input that
//! does not already start with `http://` or `https://` gets `https://`
//! prepended. Everything else is left to strict URL parsing.

use url::Url;

use crate::error::NavigationError;
use crate::Result;

const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// Trim the input and prepend `https://` unless an http(s) scheme is present.
pub fn normalize_input(input: &str) -> String {
    let trimmed = input.trim();
    if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME_PREFIX, trimmed)
    }
}

/// Normalize and validate address input into an absolute URL.
pub fn resolve_input(input: &str) -> Result<Url> {
    if input.trim().is_empty() {
        return Err(NavigationError::EmptyInput);
    }

    let normalized = normalize_input(input);
    Url::parse(&normalized).map_err(|e| {
        tracing::debug!(input = %normalized, error = %e, "Rejected address input");
        NavigationError::InvalidUrl(normalized)
    })
}

fn has_http_scheme(input: &str) -> bool {
    let lowered = input
        .get(..8)
        .unwrap_or(input)
        .to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}
