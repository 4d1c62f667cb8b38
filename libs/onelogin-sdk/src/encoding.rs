use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose};
use regex::Regex;

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static BASE64: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("static regex should not panic")
});

/// Whether `s` already looks like standard base64.
#[must_use]
pub fn is_base64(s: &str) -> bool {
    BASE64.is_match(s)
}

/// Base64-encode `s` unless it is already encoded.
#[must_use]
pub fn encode_if_needed(s: &str) -> String {
    if is_base64(s) {
        return s.to_owned();
    }
    general_purpose::STANDARD.encode(s.as_bytes())
}

/// Decode base64 text. Input that is not base64, or does not decode to
/// UTF-8, is returned unchanged.
#[must_use]
pub fn decode_if_encoded(s: &str) -> String {
    if !is_base64(s) {
        return s.to_owned();
    }
    match general_purpose::STANDARD.decode(s) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| s.to_owned()),
        Err(e) => {
            tracing::warn!(error = %e, "unexpected base64 decoding error");
            s.to_owned()
        }
    }
}
