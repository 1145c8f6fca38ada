//! String utilities for the domain layer.

/// Marker appended to content that was cut short in a read-side projection.
pub const CONTINUATION_MARKER: &str = "...";

/// Truncate a string to at most `max_chars` characters, appending
/// [`CONTINUATION_MARKER`] when anything was cut.
///
/// Counts Unicode scalar values, not bytes, so the limit is the same for
/// ASCII and multibyte text.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}{}", &s[..cut], CONTINUATION_MARKER),
    }
}

/// Short single-line preview for log messages.
pub fn preview(s: &str, max_chars: usize) -> String {
    let single_line = s.replace('\n', " ");
    truncate_chars(single_line.trim(), max_chars)
}
