//! Text-fitting helpers for the 29-column character grid.
//!
//! All helpers count characters, not bytes, so multi-byte labels cannot
//! split a code point mid-row.

/// Take at most `max_chars` characters from `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Shorten `text` to `max_chars` with a trailing `...` when it does not fit.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return truncate_chars(text, max_chars);
    }
    let head: String = text.chars().take(max_chars - 3).collect();
    format!("{head}...")
}

/// Pad or trim `text` to exactly `width` characters.
///
/// Every menu row is written at the full row width so a shorter line always
/// overwrites leftovers from a previously longer one.
pub fn pad_row(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return truncate_chars(text, width);
    }
    let mut out = text.to_string();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// Center `text` within `width` characters, padding with spaces.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return truncate_chars(text, width);
    }
    let total = width - len;
    let left = total / 2;
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(' ').take(left));
    out.push_str(text);
    out.extend(std::iter::repeat(' ').take(total - left));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsize_keeps_short_text_untouched() {
        assert_eq!(ellipsize("Rain", 29), "Rain");
    }

    #[test]
    fn ellipsize_never_exceeds_bound() {
        for max in [1usize, 2, 3, 4, 8, 29] {
            let text = ellipsize("abcdefghijklmnopqrstuvwxyzabcdef", max);
            assert!(text.chars().count() <= max);
        }
    }

    #[test]
    fn pad_row_is_exact_width() {
        assert_eq!(pad_row("..", 29).chars().count(), 29);
        assert_eq!(pad_row("", 29), " ".repeat(29));
        assert_eq!(pad_row(&"x".repeat(40), 29).chars().count(), 29);
    }

    #[test]
    fn pad_never_goes_negative_for_overlong_rows() {
        // A 30-char line must trim to 29, not underflow the padding width.
        let line = "y".repeat(30);
        assert_eq!(pad_row(&line, 29), "y".repeat(29));
    }

    #[test]
    fn center_balances_padding() {
        assert_eq!(center("ab", 6), "  ab  ");
        assert_eq!(center("abc", 6), " abc  ");
        assert_eq!(center("abcdef", 4), "abcd");
    }

    #[test]
    fn truncation_is_char_aware() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(pad_row("é", 3).chars().count(), 3);
    }
}
