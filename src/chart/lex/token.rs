//! Definitions of the token in the chart format.

use std::{borrow::Cow, fmt, ops::Range};

use crate::chart::mixin::{SourceRangeMixin, SourceRangeMixinExt};

use super::{LexError, LexErrorWithRange, Result};

/// A token content of the chart format. Each token is one line of the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Token<'a> {
    /// `[name]`. Starts a section header.
    Section(Cow<'a, str>),
    /// `{`. Opens the body of the preceding section.
    Open,
    /// `}`. Closes the current section body.
    Close,
    /// `key = value...`. A field of the Song section, or an event on a tick.
    Entry {
        /// The tick number or the field name, verbatim.
        key: Cow<'a, str>,
        /// The space separated value tokens.
        values: Vec<Value<'a>>,
        /// Whether a space is written after the last value, as some legacy tools do.
        trailing_space: bool,
    },
}

/// A token with its byte range in the source.
pub type TokenWithRange<'a> = SourceRangeMixin<Token<'a>>;

impl<'a> Token<'a> {
    /// Creates an entry without a trailing space.
    pub fn entry(key: impl Into<Cow<'a, str>>, values: Vec<Value<'a>>) -> Self {
        Self::Entry {
            key: key.into(),
            values,
            trailing_space: false,
        }
    }

    /// Creates a section header.
    pub fn section(name: impl Into<Cow<'a, str>>) -> Self {
        Self::Section(name.into())
    }

    /// Lexes one trimmed, non-blank line at `range` of the source.
    pub(crate) fn parse(line: &'a str, range: Range<usize>) -> Result<TokenWithRange<'a>> {
        let token = match line {
            "{" => Self::Open,
            "}" => Self::Close,
            _ if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 => {
                Self::Section(Cow::Borrowed(line[1..line.len() - 1].trim()))
            }
            _ => {
                let Some((key, value)) = line.split_once('=') else {
                    return Err(LexError::ExpectedEntry.into_wrapper_range(range));
                };
                let key = key.trim();
                if key.is_empty() {
                    return Err(LexError::EmptyKey.into_wrapper_range(range));
                }
                let value_start = range.start + (line.len() - value.trim_start().len());
                Self::Entry {
                    key: Cow::Borrowed(key),
                    values: lex_values(value.trim(), value_start)?,
                    trailing_space: false,
                }
            }
        };
        Ok(token.into_wrapper_range(range))
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Section(name) => write!(f, "[{name}]"),
            Token::Open => write!(f, "{{"),
            Token::Close => write!(f, "}}"),
            Token::Entry {
                key,
                values,
                trailing_space,
            } => {
                write!(f, "  {key} =")?;
                for value in values {
                    write!(f, " {value}")?;
                }
                if *trailing_space {
                    write!(f, " ")?;
                }
                Ok(())
            }
        }
    }
}

/// One value token of an entry.
///
/// Bare tokens made only of ASCII digits are numbers, every other token is a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value<'a> {
    /// A bare token of ASCII digits.
    Number(Cow<'a, str>),
    /// A bare token containing anything else, e.g. `TS` or `solo`.
    Bare(Cow<'a, str>),
    /// A double quoted token, stored unescaped.
    Quoted(Cow<'a, str>),
}

impl<'a> Value<'a> {
    /// Creates a value for `text` written without quotes, classifying it as a number if possible.
    pub fn plain(text: impl Into<Cow<'a, str>>) -> Self {
        let text = text.into();
        if is_number(&text) {
            Self::Number(text)
        } else {
            Self::Bare(text)
        }
    }

    /// Creates a quoted value.
    pub fn quoted(text: impl Into<Cow<'a, str>>) -> Self {
        Self::Quoted(text.into())
    }

    /// The text of the value, unescaped.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Value::Number(text) | Value::Bare(text) | Value::Quoted(text) => text,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(text) | Value::Bare(text) => f.write_str(text),
            Value::Quoted(text) => write!(f, "\"{}\"", escape(text)),
        }
    }
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `text` is read back as the same single value when written without quotes.
#[must_use]
pub fn is_bare_safe(text: &str) -> bool {
    !text.is_empty() && !text.starts_with('"') && !text.contains(char::is_whitespace)
}

/// Splits the value part of an entry into tokens. `offset` is the byte index of `text` in the
/// source.
fn lex_values(text: &str, offset: usize) -> Result<Vec<Value<'_>>> {
    let mut values = vec![];
    let mut rest = text;
    let mut index = offset;
    loop {
        let trimmed = rest.trim_start();
        index += rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() {
            return Ok(values);
        }
        if let Some(body) = rest.strip_prefix('"') {
            let Some(end) = find_closing_quote(body) else {
                return Err(unterminated(index..index + rest.len()));
            };
            values.push(Value::Quoted(unescape(&body[..end])));
            let consumed = end + 2;
            rest = &rest[consumed..];
            index += consumed;
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            values.push(Value::plain(&rest[..end]));
            rest = &rest[end..];
            index += end;
        }
    }
}

fn unterminated(range: Range<usize>) -> LexErrorWithRange {
    LexError::UnterminatedQuote.into_wrapper_range(range)
}

fn find_closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// The character an escape sequence `\<c>` stands for.
const fn escaped_char(c: char) -> Option<char> {
    match c {
        '\\' | '"' => Some(c),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

/// Decodes `\\`, `\"`, `\n`, `\r` and `\t`. Other backslashes are literal, so paths like
/// `C:\song` survive.
fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(decoded) = chars.peek().copied().and_then(escaped_char)
        {
            out.push(decoded);
            chars.next();
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Encodes a quoted value so that it stays on one line.
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['\\', '"', '\n', '\r', '\t']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_line(line: &str) -> Token<'_> {
        Token::parse(line, 0..line.len()).unwrap().into_content()
    }

    #[test]
    fn entry_values() {
        assert_eq!(
            lex_line("768 = N 0 96"),
            Token::entry(
                "768",
                vec![Value::plain("N"), Value::plain("0"), Value::plain("96")]
            )
        );
        assert_eq!(
            lex_line(r#"0 = E "section Intro""#),
            Token::entry(
                "0",
                vec![Value::plain("E"), Value::quoted("section Intro")]
            )
        );
        assert!(matches!(Value::plain("96"), Value::Number(_)));
        assert!(matches!(Value::plain("-1"), Value::Bare(_)));
    }

    #[test]
    fn headers_and_braces() {
        assert_eq!(lex_line("[ExpertSingle]"), Token::section("ExpertSingle"));
        assert_eq!(lex_line("{"), Token::Open);
        assert_eq!(lex_line("}"), Token::Close);
    }

    #[test]
    fn quoted_escapes() {
        assert_eq!(
            lex_line(r#"Name = "say \"hi\" \\ C:\song""#),
            Token::entry("Name", vec![Value::quoted(r#"say "hi" \ C:\song"#)])
        );
        let value = Value::quoted(r#"a "b" \c"#);
        assert_eq!(value.to_string(), r#""a \"b\" \\c""#);
        assert_eq!(
            lex_line(&format!("Name = {value}")),
            Token::entry("Name", vec![value])
        );
    }

    #[test]
    fn control_characters_stay_on_one_line() {
        let value = Value::quoted("one\ntwo\r\tthree");
        let written = value.to_string();
        assert_eq!(written, r#""one\ntwo\r\tthree""#);
        assert!(!written.contains('\n'));
        assert_eq!(
            lex_line(&format!("0 = E {value}")),
            Token::entry("0", vec![Value::plain("E"), value])
        );
        assert_eq!(
            lex_line(r#"Name = "C:\song\\""#),
            Token::entry("Name", vec![Value::quoted(r"C:\song\")])
        );
    }

    #[test]
    fn errors_point_at_the_failure() {
        let line = r#"0 = E "open"#;
        let err = Token::parse(line, 10..10 + line.len()).unwrap_err();
        assert_eq!(err.content(), &LexError::UnterminatedQuote);
        assert_eq!(err.start(), 16);

        let err = Token::parse("garbage", 0..7).unwrap_err();
        assert_eq!(err.content(), &LexError::ExpectedEntry);
        let err = Token::parse("= 5", 0..3).unwrap_err();
        assert_eq!(err.content(), &LexError::EmptyKey);
    }

    #[test]
    fn display_entry() {
        let token = Token::Entry {
            key: "0".into(),
            values: vec![Value::plain("N"), Value::plain("5"), Value::plain("0")],
            trailing_space: true,
        };
        assert_eq!(token.to_string(), "  0 = N 5 0 ");
    }
}
