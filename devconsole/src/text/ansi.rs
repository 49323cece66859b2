//! Removal of terminal escape sequences from captured output.

/// Strip ANSI escape codes (colors, cursor movement, OSC titles) from `text`.
pub fn strip_ansi(text: &str) -> String {
    if !text.contains('\x1b') {
        return text.to_string();
    }
    strip_ansi_escapes::strip_str(text)
}
