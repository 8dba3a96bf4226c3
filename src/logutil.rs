//! Logging helper for client-supplied identifiers (guild ids, quest keys,
//! action names) so log lines stay single-line and printable.

/// Escape a string for single-line logging: newlines, carriage returns,
/// tabs, and backslashes are escaped, other control characters become
/// `\xNN`, and very long values are truncated with an ellipsis.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 120;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
