use std::cmp::Ordering;

use chrono::{DateTime, Local};

/// Compare two strings case-insensitively
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Drop fractional seconds from a clock string ("12:59:47.328" -> "12:59:47")
pub fn truncate_fraction(time: &str) -> &str {
    match time.find('.') {
        Some(idx) => &time[..idx],
        None => time,
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an epoch-millisecond expiry for the status bar
pub fn format_expiry(expires_ms: Option<i64>) -> String {
    match expires_ms.and_then(DateTime::from_timestamp_millis) {
        Some(dt) => dt.with_timezone(&Local).format("%b %d, %Y %H:%M").to_string(),
        None => "no expiry".to_string(),
    }
}
