use std::time::{SystemTime, UNIX_EPOCH};

/// Truncated sync code for log fields. Safe on arbitrary input, including
/// not-yet-validated codes with multibyte characters.
pub fn code_prefix(c: &str) -> &str {
    let mut end = c.len().min(12);
    while !c.is_char_boundary(end) {
        end -= 1;
    }
    &c[..end]
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
