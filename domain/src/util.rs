//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Maximum number of characters kept when quoting a message in a reply.
pub const REPLY_QUOTE_CHARS: usize = 100;

/// Build the Markdown quote block prefixed to a reply.
///
/// The quoted text is flattened to a single line and cut at
/// [`REPLY_QUOTE_CHARS`] characters, with `...` appended when cut.
pub fn reply_quote(sender_name: &str, quoted: &str) -> String {
    let flattened = quoted.replace('\n', " ");
    let truncated: String = flattened.chars().take(REPLY_QUOTE_CHARS).collect();
    let ellipsis = if quoted.chars().count() > REPLY_QUOTE_CHARS {
        "..."
    } else {
        ""
    };
    format!("> **{}**: {}{}\n\n", sender_name, truncated, ellipsis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "あのね";
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }

    #[test]
    fn reply_quote_short_text() {
        let quote = reply_quote("Atlas", "Scale later.\nShip now.");
        assert_eq!(quote, "> **Atlas**: Scale later. Ship now.\n\n");
    }

    #[test]
    fn reply_quote_long_text_is_cut() {
        let long = "a".repeat(150);
        let quote = reply_quote("Rex", &long);
        assert!(quote.starts_with("> **Rex**: "));
        assert!(quote.ends_with("...\n\n"));
        assert_eq!(quote.matches('a').count(), REPLY_QUOTE_CHARS);
    }
}
