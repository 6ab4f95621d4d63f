//! Lexical analyzer of the chart format.
//!
//! Raw [String] == [lex] ==> [`Token`]s == [parse](super::parse) ==> [`RawChart`](super::parse::RawChart)
//! ==> [`Chart`](super::Chart)

mod cursor;
pub mod token;

use thiserror::Error;

use super::mixin::SourceRangeMixin;

use self::{cursor::Cursor, token::Token, token::TokenWithRange};

/// An error occurred when lexical analysis.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LexError {
    /// The line is neither a section header, a brace nor a `key = value` entry.
    #[error("expected `[section]`, `{{`, `}}` or `key = value`")]
    ExpectedEntry,
    /// The entry has nothing before `=`.
    #[error("expected a key before `=`")]
    EmptyKey,
    /// A quoted value is not closed until the end of line.
    #[error("unterminated quoted value")]
    UnterminatedQuote,
}

/// A lex error with position information.
pub type LexErrorWithRange = SourceRangeMixin<LexError>;

/// type alias of `core::result::Result<T, LexErrorWithRange>`
pub(crate) type Result<T> = core::result::Result<T, LexErrorWithRange>;

/// Analyzes and converts the chart format text into [`Token`]s, one per non-blank line.
///
/// # Errors
///
/// Returns the first malformed line as [`LexErrorWithRange`].
pub fn parse_lex_tokens(source: &str) -> Result<Vec<TokenWithRange<'_>>> {
    let mut cursor = Cursor::new(source);

    let mut tokens = vec![];
    while !cursor.is_end() {
        let Some((range, line)) = cursor.next_line() else {
            break;
        };
        tokens.push(Token::parse(line, range)?);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{
        LexError, parse_lex_tokens,
        token::{Token, Value},
    };

    #[test]
    fn simple() {
        const SRC: &str = r#"
[Song]
{
  Name = "Test"
  Resolution = 192
}
[SyncTrack]
{
  0 = TS 4
  0 = B 120000
}
"#;

        let tokens: Vec<_> = parse_lex_tokens(SRC)
            .unwrap()
            .into_iter()
            .map(|token| token.into_content())
            .collect();

        assert_eq!(
            tokens,
            vec![
                Token::section("Song"),
                Token::Open,
                Token::entry("Name", vec![Value::quoted("Test")]),
                Token::entry("Resolution", vec![Value::plain("192")]),
                Token::Close,
                Token::section("SyncTrack"),
                Token::Open,
                Token::entry("0", vec![Value::plain("TS"), Value::plain("4")]),
                Token::entry("0", vec![Value::plain("B"), Value::plain("120000")]),
                Token::Close,
            ]
        );
    }

    #[test]
    fn stops_at_first_error() {
        let err = parse_lex_tokens("[Song]\n{\n  oops\n}\n").unwrap_err();
        assert_eq!(err.content(), &LexError::ExpectedEntry);
        assert_eq!(err.range(), 11..15);
    }
}
