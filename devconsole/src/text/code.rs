//! Clean-up of code submitted through chat messages.

const FENCE: &str = "```";

/// Remove code-block or inline-code decoration from `content`.
///
/// A message that both starts and ends with a fence loses the opening fence
/// (with its language tag when the tag is one of `languages` and is followed
/// by whitespace) and the closing fence. Anything else has surrounding
/// backticks, spaces and newlines trimmed.
pub fn cleanup_code<'a, S: AsRef<str>>(content: &'a str, languages: &[S]) -> &'a str {
    if content.starts_with(FENCE) && content.ends_with(FENCE) {
        let body = strip_opening_fence(content, languages);
        // `body` is a suffix of `content`, so when it is long enough it ends with the fence.
        return body.get(..body.len().saturating_sub(FENCE.len())).unwrap_or("");
    }
    content.trim_matches(|c| matches!(c, '`' | ' ' | '\n'))
}

fn strip_opening_fence<'a, S: AsRef<str>>(content: &'a str, languages: &[S]) -> &'a str {
    let rest = &content[FENCE.len()..];

    let mut tags: Vec<&str> = languages.iter().map(AsRef::as_ref).collect();
    tags.sort_by_key(|tag| std::cmp::Reverse(tag.len()));

    for tag in tags {
        if tag.is_empty() {
            continue;
        }
        if let Some(after) = rest.strip_prefix(tag) {
            if after.starts_with(char::is_whitespace) {
                return after;
            }
        }
    }
    rest
}

/// Whether cleaned REPL input asks to end the session.
pub fn is_quit<S: AsRef<str>>(cleaned: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|k| k.as_ref() == cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANGS: &[&str] = &["py", "python"];

    #[test]
    fn test_fenced_block_with_language() {
        assert_eq!(cleanup_code("```py\nprint 1\n```", LANGS), "\nprint 1\n");
        assert_eq!(cleanup_code("```python\nx\n```", LANGS), "\nx\n");
    }

    #[test]
    fn test_fenced_block_without_language() {
        assert_eq!(cleanup_code("```\n1 + 1\n```", LANGS), "\n1 + 1\n");
    }

    #[test]
    fn test_unknown_language_tag_is_kept() {
        assert_eq!(cleanup_code("```rust\nx\n```", LANGS), "rust\nx\n");
        assert_eq!(cleanup_code("```pythonic x```", LANGS), "pythonic x");
    }

    #[test]
    fn test_tag_needs_trailing_whitespace() {
        assert_eq!(cleanup_code("```py```", LANGS), "py");
    }

    #[test]
    fn test_degenerate_fences() {
        assert_eq!(cleanup_code("```", LANGS), "");
        assert_eq!(cleanup_code("````", LANGS), "");
        assert_eq!(cleanup_code("``````", LANGS), "");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(cleanup_code("`1 + 1`", LANGS), "1 + 1");
        assert_eq!(cleanup_code("  `quit` \n", LANGS), "quit");
        assert_eq!(cleanup_code("plain", LANGS), "plain");
    }

    #[test]
    fn test_quit_keywords() {
        let keywords = ["quit", "exit", "exit()"];
        assert!(is_quit(cleanup_code("`quit`", LANGS), &keywords));
        assert!(is_quit(cleanup_code("```exit()```", LANGS), &keywords));
        assert!(!is_quit(cleanup_code("`quit()`", LANGS), &keywords));
        assert!(!is_quit(cleanup_code("`Quit`", LANGS), &keywords));
    }
}
