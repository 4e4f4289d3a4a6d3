// src/util.rs - Shared utility functions

/// Take at most `max_chars` characters from the front of `s`.
///
/// Counts Unicode scalar values, not bytes, so the cut never splits a
/// multi-byte character.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
