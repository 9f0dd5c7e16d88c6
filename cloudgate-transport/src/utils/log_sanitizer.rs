//! Log sanitization utilities
//!
//! Response bodies can be large (object listings) and auth tokens must never
//! be written out in full.

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// Characters of a secret kept visible by [`redact`].
const REDACT_VISIBLE: usize = 4;

/// Largest char boundary not above `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a body for logging, noting the total length when cut.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Same as [`truncate_for_log`] for raw bytes, decoded lossily.
pub fn truncate_bytes_for_log(body: &[u8]) -> String {
    let cut = body.len().min(TRUNCATE_LIMIT + 4);
    let text = String::from_utf8_lossy(&body[..cut]);
    if body.len() <= TRUNCATE_LIMIT {
        text.into_owned()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &text[..floor_char_boundary(&text, TRUNCATE_LIMIT)],
            body.len()
        )
    }
}

/// Mask a secret, keeping a short prefix for correlation.
pub fn redact(secret: &str) -> String {
    if secret.len() <= REDACT_VISIBLE * 2 {
        "****".to_string()
    } else {
        format!("{}****", &secret[..floor_char_boundary(secret, REDACT_VISIBLE)])
    }
}
