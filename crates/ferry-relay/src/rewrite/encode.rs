//! Binary payloads as `data:` URIs

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Bytes encoded per step. A multiple of 3, so the per-chunk encodings
/// concatenate without padding in the middle.
const CHUNK_SIZE: usize = 8190;

/// Base64-encode `body` in fixed-size chunks
pub fn encode_base64(body: &[u8]) -> String {
    let mut out = String::with_capacity(body.len().div_ceil(3) * 4);
    for chunk in body.chunks(CHUNK_SIZE) {
        STANDARD.encode_string(chunk, &mut out);
    }
    out
}

/// `data:{content_type};base64,{payload}`
pub fn to_data_uri(content_type: &str, body: &[u8]) -> String {
    let payload = encode_base64(body);
    tracing::debug!(
        content_type,
        bytes = body.len(),
        encoded = payload.len(),
        "Encoded resource as data URI"
    );
    format!("data:{};base64,{}", content_type, payload)
}
