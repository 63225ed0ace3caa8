//! Number literal decoder.

use crate::error::{ErrorKind, ParseError, Result};
use crate::node::Number;
use crate::scanner::Cursor;

/// Decode the number literal at the cursor.
///
/// Grammar: `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`.
/// Any deviation fails at the offset where the token starts.
pub fn decode_number(cursor: &mut Cursor<'_>) -> Result<Number> {
    let input = cursor.input();
    let start = cursor.offset();
    let invalid = || ParseError::new(ErrorKind::InvalidNumber, start);

    let mut i = start;
    let negative = input.get(i) == Some(&b'-');
    if negative {
        i += 1;
    }

    // Integer part
    match input.get(i) {
        Some(b'0') => {
            i += 1;
            if input.get(i).is_some_and(u8::is_ascii_digit) {
                return Err(invalid());
            }
        }
        Some(b'1'..=b'9') => i = skip_digits(input, i),
        _ => return Err(invalid()),
    }

    let mut integral = true;

    // Fraction
    if input.get(i) == Some(&b'.') {
        integral = false;
        let digits = i + 1;
        i = skip_digits(input, digits);
        if i == digits {
            return Err(invalid());
        }
    }

    // Exponent
    if matches!(input.get(i), Some(b'e' | b'E')) {
        integral = false;
        i += 1;
        if matches!(input.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let digits = i;
        i = skip_digits(input, digits);
        if i == digits {
            return Err(invalid());
        }
    }

    // The grammar above admits only ASCII, so this cannot fail.
    let text = std::str::from_utf8(&input[start..i]).map_err(|_| invalid())?;
    let value: f64 = text.parse().map_err(|_| invalid())?;

    // -0 has no exact integer form that keeps its sign.
    let int = if integral && !(negative && value == 0.0) {
        text.parse::<i64>().ok()
    } else {
        None
    };

    cursor.set_offset(i);
    Ok(Number::with_int(value, int))
}

fn skip_digits(input: &[u8], mut i: usize) -> usize {
    while input.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}
