//! Scalar lexing and quoting

use std::fmt::Write as _;

use crate::node::{Chomping, Scalar, ScalarStyle};

/// Split a content line at its trailing comment
///
/// Returns `(content, comment)`; the comment keeps the whitespace gap in
/// front of `#` so it can be written back unchanged.
pub(super) fn split_comment(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if in_double {
            match c {
                b'\\' => i += 1,
                b'"' => in_double = false,
                _ => {}
            }
        } else if in_single {
            if c == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    in_single = false;
                }
            }
        } else if (c == b'"' || c == b'\'') && opens_quote(bytes, i) {
            in_double = c == b'"';
            in_single = c == b'\'';
        } else if c == b'#' && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')) {
            let content = line[..i].trim_end();
            return (content, Some(&line[content.len()..]));
        }
        i += 1;
    }
    (line.trim_end(), None)
}

/// Quotes only open at the start of a scalar token: line start, after a
/// flow indicator, or after a `:`, `-` or `?` indicator and whitespace
/// (`don't` and `x 'y` are plain)
fn opens_quote(bytes: &[u8], i: usize) -> bool {
    let Some(prev) = bytes[..i].iter().rposition(|b| !matches!(b, b' ' | b'\t')) else {
        return true;
    };
    let spaced = prev + 1 < i;
    match bytes[prev] {
        b'[' | b'{' | b',' => true,
        b':' => spaced,
        b'-' | b'?' => spaced && opens_quote(bytes, prev),
        _ => false,
    }
}

/// Byte offset just past a quoted scalar starting at `text[0]`
pub(super) fn quoted_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.first()? {
        b'"' => {
            let mut i = 1;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b'"' => return Some(i + 1),
                    _ => i += 1,
                }
            }
            None
        }
        b'\'' => {
            let mut i = 1;
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    return Some(i + 1);
                }
                i += 1;
            }
            None
        }
        _ => None,
    }
}

/// Decode a single-line scalar token
pub(super) fn parse_inline(text: &str) -> Result<Scalar, String> {
    match text.as_bytes().first() {
        Some(b'"') | Some(b'\'') => {
            let end = quoted_end(text).ok_or("unterminated quoted scalar")?;
            if !text[end..].trim().is_empty() {
                return Err(format!("unexpected text after quoted scalar: {:?}", &text[end..]));
            }
            let inner = &text[1..end - 1];
            if text.starts_with('"') {
                Ok(Scalar::new(unescape_double(inner)?, ScalarStyle::DoubleQuoted))
            } else {
                Ok(Scalar::new(inner.replace("''", "'"), ScalarStyle::SingleQuoted))
            }
        }
        _ => Ok(Scalar::new(text.trim(), ScalarStyle::Plain)),
    }
}

fn unescape_double(inner: &str) -> Result<String, String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or("dangling escape")?;
        match escaped {
            '0' => out.push('\0'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            't' | '\t' => out.push('\t'),
            'n' => out.push('\n'),
            'v' => out.push('\u{0B}'),
            'f' => out.push('\u{0C}'),
            'r' => out.push('\r'),
            'e' => out.push('\u{1B}'),
            ' ' => out.push(' '),
            '"' => out.push('"'),
            '/' => out.push('/'),
            '\\' => out.push('\\'),
            'N' => out.push('\u{85}'),
            '_' => out.push('\u{A0}'),
            'L' => out.push('\u{2028}'),
            'P' => out.push('\u{2029}'),
            'x' => out.push(hex_char(&mut chars, 2)?),
            'u' => out.push(hex_char(&mut chars, 4)?),
            'U' => out.push(hex_char(&mut chars, 8)?),
            other => return Err(format!("unknown escape \\{other}")),
        }
    }
    Ok(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, width: usize) -> Result<char, String> {
    let digits: String = chars.by_ref().take(width).collect();
    if digits.len() != width {
        return Err("truncated escape".to_string());
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid escape code {digits}"))
}

/// Parse a block scalar header (`|`, `>-`, `|+2`, ...)
///
/// Returns the style and the explicit indentation indicator, if any.
pub(super) fn parse_block_header(header: &str) -> Result<(ScalarStyle, Option<usize>), String> {
    let mut chars = header.chars();
    let literal = match chars.next() {
        Some('|') => true,
        Some('>') => false,
        _ => return Err(format!("invalid block scalar header {header:?}")),
    };
    let mut chomping = Chomping::Clip;
    let mut indent = None;
    for c in chars {
        match c {
            '-' => chomping = Chomping::Strip,
            '+' => chomping = Chomping::Keep,
            '1'..='9' if indent.is_none() => indent = c.to_digit(10).map(|d| d as usize),
            _ => return Err(format!("invalid block scalar header {header:?}")),
        }
    }
    let style = if literal {
        ScalarStyle::Literal(chomping)
    } else {
        ScalarStyle::Folded(chomping)
    };
    Ok((style, indent))
}

/// Whether `value` must be quoted to read back as the same plain scalar text
#[must_use]
pub fn needs_quotes(value: &str, flow: bool) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if value.trim() != value || value.contains(['\n', '\r', '\t']) {
        return true;
    }
    if value.chars().any(char::is_control) {
        return true;
    }
    let leading_indicator = match first {
        '-' | '?' | ':' => value.len() == 1 || value[1..].starts_with(' '),
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => true,
        _ => false,
    };
    leading_indicator
        || value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || (flow && value.contains([',', '[', ']', '{', '}']))
}

/// Render a non-block scalar for output
pub(super) fn render_inline(scalar: &Scalar, flow: bool) -> String {
    let value = scalar.value();
    match scalar.style() {
        ScalarStyle::Plain if value.is_empty() => {
            if flow {
                "null".to_string()
            } else {
                String::new()
            }
        }
        ScalarStyle::Plain if !needs_quotes(value, flow) => value.to_string(),
        ScalarStyle::SingleQuoted if !value.contains(['\n', '\r']) => {
            format!("'{}'", value.replace('\'', "''"))
        }
        _ => escape_double(value),
    }
}

fn escape_double(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
