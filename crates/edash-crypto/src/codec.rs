//! URL-safe base64 as stored in bundle JSON

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Decode a base64url (or standard base64) string.
///
/// `-` and `_` are mapped back to `+` and `/`, and `=` padding is restored to
/// a multiple of four before a strict standard decode.
pub fn decode(input: &str) -> CryptoResult<Vec<u8>> {
    let mut s: String = input
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while s.len() % 4 != 0 {
        s.push('=');
    }

    STANDARD
        .decode(s.as_bytes())
        .map_err(|e| CryptoError::format(format!("invalid base64: {e}")))
}

/// Standard base64 with padding.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// URL-safe base64 without padding, the alphabet bundles are written in.
pub fn encode_url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}
