use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// 32 random bytes rendered as unpadded URL-safe base64 (43 characters).
pub fn url_safe_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Link tokens arrive from URLs; an empty value or a literal `None` is never valid.
pub fn is_blank_token(token: &str) -> bool {
    let token = token.trim();
    token.is_empty() || token.eq_ignore_ascii_case("none")
}
