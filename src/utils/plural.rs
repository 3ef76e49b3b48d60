//! Count formatting for log lines.

/// Format a count with its noun, adding `s` unless the count is one.
///
/// - `plural_count(0, "bundle")` -> `"0 bundles"`
/// - `plural_count(1, "page")` -> `"1 page"`
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
