//! Terminal-safe text helpers for rendering feed content.

use std::borrow::Cow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Number of terminal columns `s` occupies (CJK counts double).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates `s` to at most `max_width` columns, ending in `...` when cut.
///
/// Borrows when the text already fits.
///
/// ```
/// use arxiv_getter::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Attention Is All You Need", 12), "Attention...");
/// assert_eq!(truncate_to_width("BERT", 12), "BERT");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS.len() {
        return Cow::Owned(".".repeat(max_width));
    }

    let budget = max_width - ELLIPSIS.len();
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }
    Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
}

fn is_unsafe_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

/// SEC-001: Removes terminal control characters and ANSI escape sequences.
///
/// Feed titles and abstracts are remote input; a stray `ESC [` could move the
/// cursor or recolor the screen. Tab, newline and carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_unsafe_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                // CSI: parameters until a final byte in 0x40..=0x7E
                Some('[') => {
                    chars.next();
                    for next in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&next) {
                            break;
                        }
                    }
                }
                // OSC: until BEL or ST (ESC \)
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_unsafe_control(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_is_borrowed() {
        assert!(matches!(truncate_to_width("Short", 10), Cow::Borrowed(_)));
    }

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
    }

    #[test]
    fn test_wide_chars_never_exceed_width() {
        // Each CJK char is two columns
        let out = truncate_to_width("量子重力理論", 7);
        assert_eq!(out, "量子...");
        assert!(display_width(&out) <= 7);
    }

    #[test]
    fn test_tiny_width() {
        assert_eq!(truncate_to_width("abcdef", 2), "..");
        assert_eq!(truncate_to_width("abcdef", 0), "");
    }

    #[test]
    fn test_strip_clean_is_borrowed() {
        assert!(matches!(
            strip_control_chars("Plain title\twith tab"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_strip_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m title"), "Red title");
        assert_eq!(
            strip_control_chars("\x1b]0;pwned\x07Title\x1b]8;;x\x1b\\"),
            "Title"
        );
        assert_eq!(strip_control_chars("a\x00b\x7fc\x1bd"), "abcd");
    }

    #[test]
    fn test_strip_keeps_whitespace_and_unicode() {
        assert_eq!(strip_control_chars("Schrödinger\n\x08cat"), "Schrödinger\ncat");
    }
}
