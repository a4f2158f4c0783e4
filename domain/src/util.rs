//! Small shared helpers.

/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis when anything was cut. Operates on character boundaries so
/// multi-byte text stays valid; a cut that lands on whitespace is trimmed
/// so the ellipsis never floats after a space.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}
