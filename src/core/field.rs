// Field text extraction and quote handling

use std::borrow::Cow;

/// Strip the wrapping quote characters from a column span.
///
/// Returns the inner text and whether the span was quoted. A span is quoted
/// when it starts with the quote character; the closing quote is removed
/// only when it is the last character. Text after an inner closing quote
/// is kept verbatim, so `"abc"def` yields `abc"def`.
#[inline]
pub fn strip_quotes(span: &str, quote: Option<char>) -> (&str, bool) {
    let Some(q) = quote else {
        return (span, false);
    };
    match span.strip_prefix(q) {
        Some(rest) => (rest.strip_suffix(q).unwrap_or(rest), true),
        None => (span, false),
    }
}

/// Collapse doubled quote characters into one.
/// Returns `Cow::Borrowed` unless the column actually saw a doubled quote.
#[inline]
pub fn unescape_quotes(inner: &str, quote: Option<char>, doubled: bool) -> Cow<'_, str> {
    let Some(q) = quote else {
        return Cow::Borrowed(inner);
    };
    if !doubled {
        return Cow::Borrowed(inner);
    }

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        result.push(c);
        if c == q && chars.peek() == Some(&q) {
            chars.next();
        }
    }
    Cow::Owned(result)
}

/// Blank = empty or whitespace only.
#[inline]
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes_simple() {
        assert_eq!(strip_quotes("hello", Some('"')), ("hello", false));
        assert_eq!(strip_quotes("\"hello\"", Some('"')), ("hello", true));
        assert_eq!(strip_quotes("", Some('"')), ("", false));
    }

    #[test]
    fn test_strip_quotes_without_quote_char() {
        assert_eq!(strip_quotes("\"hello\"", None), ("\"hello\"", false));
    }

    #[test]
    fn test_strip_quotes_custom_char() {
        assert_eq!(strip_quotes("*Claws*", Some('*')), ("Claws", true));
        assert_eq!(strip_quotes("\"\"", Some('"')), ("", true));
    }

    #[test]
    fn test_strip_quotes_keeps_text_after_closing_quote() {
        assert_eq!(strip_quotes("\"abc\"def", Some('"')), ("abc\"def", true));
        assert_eq!(strip_quotes("\"open", Some('"')), ("open", true));
    }

    #[test]
    fn test_unescape_borrowed_when_not_doubled() {
        let out = unescape_quotes("plain", Some('"'), false);
        assert!(matches!(out, Cow::Borrowed("plain")));
    }

    #[test]
    fn test_unescape_doubled() {
        let out = unescape_quotes("say \"\"hi\"\"", Some('"'), true);
        assert_eq!(out, "say \"hi\"");
        let out = unescape_quotes("it''s", Some('\''), true);
        assert_eq!(out, "it's");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \t"));
        assert!(!is_blank(" a "));
    }
}
