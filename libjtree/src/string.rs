//! String literal decoder.
//!
//! Resolves backslash escapes, including UTF-16 surrogate pairs written as
//! two `\uXXXX` escapes, into an owned UTF-8 `String`.

use crate::error::{ErrorKind, ParseError, Result};
use crate::scanner::Cursor;

/// Decode the string literal at the cursor, which must be on the opening quote.
///
/// On success the cursor is left just past the closing quote. On failure the
/// cursor position is unspecified and the error points at the offending byte:
/// the backslash of a bad escape, the control byte itself, or the end of input
/// for an unterminated literal.
pub fn decode_string(cursor: &mut Cursor<'_>) -> Result<String> {
    let input = cursor.input();
    let start = cursor.offset();
    if input.get(start) != Some(&b'"') {
        return Err(cursor.expected(ErrorKind::ExpectedKey));
    }

    let end = find_closing_quote(input, start + 1)
        .ok_or_else(|| ParseError::new(ErrorKind::UnterminatedString, input.len()))?;

    // Escapes only ever shrink, so the literal's length bounds the output.
    let mut out = String::with_capacity(end - start - 1);
    let mut i = start + 1;
    let mut run_start = i;

    while i < end {
        let b = input[i];
        if b == b'\\' {
            push_raw(&mut out, input, run_start, i)?;
            i = decode_escape(&mut out, input, i)?;
            run_start = i;
        } else if b < 0x20 {
            return Err(ParseError::new(ErrorKind::BadCharInString, i));
        } else {
            i += 1;
        }
    }
    push_raw(&mut out, input, run_start, end)?;

    cursor.set_offset(end + 1);
    Ok(out)
}

/// Offset of the unescaped closing quote, scanning from `from`.
fn find_closing_quote(input: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < input.len() {
        match input[i] {
            b'"' => return Some(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

/// Append unescaped bytes `input[from..to]`, validating UTF-8.
fn push_raw(out: &mut String, input: &[u8], from: usize, to: usize) -> Result<()> {
    if from == to {
        return Ok(());
    }
    match std::str::from_utf8(&input[from..to]) {
        Ok(s) => {
            out.push_str(s);
            Ok(())
        }
        Err(e) => Err(ParseError::new(
            ErrorKind::InvalidUtf8,
            from + e.valid_up_to(),
        )),
    }
}

/// Decode the escape whose backslash is at `at`; returns the offset after it.
fn decode_escape(out: &mut String, input: &[u8], at: usize) -> Result<usize> {
    let bad = |kind| ParseError::new(kind, at);
    let esc = *input.get(at + 1).ok_or_else(|| bad(ErrorKind::BadEscapedChar))?;
    let simple = match esc {
        b'"' => '"',
        b'\\' => '\\',
        b'/' => '/',
        b'b' => '\x08',
        b'f' => '\x0C',
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'u' => return decode_unicode_escape(out, input, at),
        _ => return Err(bad(ErrorKind::BadEscapedChar)),
    };
    out.push(simple);
    Ok(at + 2)
}

/// Decode `\uXXXX`, or a `\uXXXX\uXXXX` surrogate pair, starting at `at`.
fn decode_unicode_escape(out: &mut String, input: &[u8], at: usize) -> Result<usize> {
    let first = read_hex4(input, at + 2).ok_or(ParseError::new(ErrorKind::BadUnicodeEscape, at))?;

    let code = match first {
        0xDC00..=0xDFFF => {
            return Err(ParseError::new(ErrorKind::IllegalSurrogate, at));
        }
        0xD800..=0xDBFF => {
            let second_at = at + 6;
            if input.get(second_at) != Some(&b'\\') || input.get(second_at + 1) != Some(&b'u') {
                return Err(ParseError::new(ErrorKind::IllegalSurrogate, at));
            }
            let second = read_hex4(input, second_at + 2)
                .ok_or(ParseError::new(ErrorKind::BadUnicodeEscape, second_at))?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(ParseError::new(ErrorKind::IllegalSurrogate, at));
            }
            let code = 0x10000 + (((first - 0xD800) << 10) | (second - 0xDC00));
            out.push(char::from_u32(code).ok_or(ParseError::new(ErrorKind::IllegalSurrogate, at))?);
            return Ok(second_at + 6);
        }
        code => code,
    };

    // Non-surrogate BMP code points are always valid chars.
    out.push(char::from_u32(code).ok_or(ParseError::new(ErrorKind::BadUnicodeEscape, at))?);
    Ok(at + 6)
}

/// Four hex digits at `at`, case-insensitive.
fn read_hex4(input: &[u8], at: usize) -> Option<u32> {
    let digits = input.get(at..at + 4)?;
    digits.iter().try_fold(0u32, |acc, &d| {
        let v = (d as char).to_digit(16)?;
        Some((acc << 4) | v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<String> {
        decode_string(&mut Cursor::new(s.as_bytes(), 0))
    }

    #[test]
    fn test_plain() {
        assert_eq!(decode("\"hello\"").unwrap(), "hello");
        assert_eq!(decode("\"\"").unwrap(), "");
    }

    #[test]
    fn test_cursor_after_closing_quote() {
        let mut c = Cursor::new(b"\"ab\" : 1", 0);
        decode_string(&mut c).unwrap();
        assert_eq!(c.offset(), 4);
    }

    #[test]
    fn test_simple_escapes() {
        assert_eq!(
            decode(r#""a\"b\\c\/d\b\f\n\r\t""#).unwrap(),
            "a\"b\\c/d\x08\x0c\n\r\t"
        );
    }

    #[test]
    fn test_unicode_escape_mixed_case() {
        assert_eq!(decode(r#""\u0041\u00e9\u00E9""#).unwrap(), "Aéé");
    }

    #[test]
    fn test_nul_escape() {
        assert_eq!(decode(r#""a\u0000b""#).unwrap(), "a\0b");
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(decode(r#""\ud83d\ude00""#).unwrap(), "😀");
        assert_eq!(decode(r#""x\uD834\uDD1Ey""#).unwrap(), "x𝄞y");
    }

    #[test]
    fn test_lone_high_surrogate() {
        let err = decode(r#""ab\ud800""#).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::IllegalSurrogate, 3));
    }

    #[test]
    fn test_high_surrogate_followed_by_non_low() {
        let err = decode(r#""\ud800A""#).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::IllegalSurrogate, 1));
    }

    #[test]
    fn test_low_surrogate_first() {
        let err = decode(r#""\udc00\ud800""#).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::IllegalSurrogate, 1));
    }

    #[test]
    fn test_bad_hex() {
        let err = decode(r#""\u12G4""#).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::BadUnicodeEscape, 1));
        let err = decode(r#""\u12""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUnicodeEscape);
    }

    #[test]
    fn test_bad_escape_letter() {
        let err = decode(r#""a\x""#).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::BadEscapedChar, 2));
    }

    #[test]
    fn test_control_byte() {
        let err = decode("\"a\nb\"").unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::BadCharInString, 2));
    }

    #[test]
    fn test_unterminated() {
        let err = decode("\"abc").unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::UnterminatedString, 4));
        let err = decode("\"abc\\\"").unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::UnterminatedString, 6));
    }

    #[test]
    fn test_invalid_utf8() {
        let input = b"\"ab\xFFc\"";
        let err = decode_string(&mut Cursor::new(input, 0)).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::InvalidUtf8, 3));
    }

    #[test]
    fn test_multibyte_passthrough() {
        assert_eq!(decode("\"héllo wörld\"").unwrap(), "héllo wörld");
    }
}
