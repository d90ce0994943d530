//! Text helpers: input decoding, character offsets and whitespace rules.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<meta charset="...">`)
/// 3. Falls back to Windows-1252 (common in legacy HTML)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
///
/// # Examples
///
/// ```
/// use destyle::util::decode_text;
///
/// assert_eq!(decode_text("Hello".as_bytes(), None), "Hello");
/// assert_eq!(decode_text(b"caf\xe9", None), "caf\u{e9}");
/// ```
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    // Try UTF-8 first (handles BOM automatically)
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    // Fallback: Windows-1252 (superset of ISO-8859-1)
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the charset named by a `<meta>` tag.
///
/// Handles both `<meta charset="...">` and the `http-equiv` form, whose
/// `content` carries `charset=...`. Only the first 1024 bytes are checked,
/// matching where browsers look for it.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(1024);
    let prefix = &bytes[..check_len];
    let lowered = prefix.to_ascii_lowercase();

    let meta = memchr::memmem::find(&lowered, b"<meta")?;
    let enc_pos = memchr::memmem::find(&lowered[meta..], b"charset=")? + meta + 8;

    let mut value = &prefix[enc_pos..];
    if let Some(&quote) = value.first()
        && (quote == b'"' || quote == b'\'')
    {
        value = &value[1..];
    }
    let end = value
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(value.len());

    std::str::from_utf8(&value[..end])
        .ok()
        .filter(|s| !s.is_empty())
}

/// Byte index of the `chars`th character of `s`, clamped to `s.len()`.
pub fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

/// Length of `s` in characters, the unit of text boundary offsets.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// HTML whitespace: space, tab, LF, FF and CR.
///
/// U+00A0 is deliberately not whitespace: a non-breaking space is content.
pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0c}' | '\r')
}

/// Whether a text consists solely of HTML whitespace.
pub fn is_whitespace_only(s: &str) -> bool {
    s.chars().all(is_html_whitespace)
}

/// Collapse every run of CR/LF characters into a single space.
///
/// Outside preformatted content a source newline renders as a space, so the
/// flattened text keeps that rendering without carrying raw newlines.
pub fn collapse_newlines(s: &str) -> Cow<'_, str> {
    if !s.contains(['\r', '\n']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c == '\r' || c == '\n' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        assert_eq!(decode_text(b"\xef\xbb\xbfhi", None), "hi");
    }

    #[test]
    fn test_decode_with_hint() {
        // 0xE4 is 'ä' in ISO-8859-15 as well
        assert_eq!(decode_text(b"\xe4", Some("iso-8859-15")), "\u{e4}");
    }

    #[test]
    fn test_decode_unknown_hint_falls_back() {
        assert_eq!(
            decode_text(b"\x93q\x94", Some("bogus")),
            "\u{201c}q\u{201d}"
        );
    }

    #[test]
    fn test_extract_meta_charset() {
        assert_eq!(
            extract_meta_charset(br#"<head><meta charset="windows-1251"></head>"#),
            Some("windows-1251")
        );
        assert_eq!(
            extract_meta_charset(
                br#"<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=ISO-8859-2">"#
            ),
            Some("ISO-8859-2")
        );
        assert_eq!(extract_meta_charset(b"<p>charset=utf-8</p>"), None);
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(byte_offset("h\u{e9}llo", 2), 3);
        assert_eq!(byte_offset("abc", 10), 3);
        assert_eq!(char_len("h\u{e9}llo"), 5);
    }

    #[test]
    fn test_whitespace_excludes_nbsp() {
        assert!(is_whitespace_only(" \n\t"));
        assert!(!is_whitespace_only("\u{a0}"));
        assert!(is_whitespace_only(""));
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(collapse_newlines("one\r\ntwo\n\nthree"), "one two three");
        assert!(matches!(collapse_newlines("plain"), Cow::Borrowed(_)));
    }
}
