//! KQML text parser.
//!
//! Recursive descent over bytes. Grammar:
//!
//! ```text
//! value  := list | string | token
//! list   := '(' value* ')'
//! string := '"' (escape | char)* '"'     escape := '\"' | '\\'
//! token  := one or more non-delimiter bytes
//! ```
//!
//! Errors carry the byte offset where parsing stopped.

use thiserror::Error;

use crate::value::{KqmlList, KqmlValue, Performative};

/// KQML codec error.
#[derive(Debug, Error)]
pub enum KqmlError {
    /// Input ended inside a list or before any expression.
    #[error("unexpected end of input at byte {pos}")]
    UnexpectedEof { pos: usize },

    /// A string literal was never closed.
    #[error("unterminated string starting at byte {pos}")]
    UnterminatedString { pos: usize },

    /// A `)` with no matching `(`.
    #[error("unbalanced ')' at byte {pos}")]
    UnbalancedClose { pos: usize },

    /// Non-whitespace bytes after the top-level expression.
    #[error("trailing data after expression at byte {pos}")]
    TrailingData { pos: usize },

    /// A performative list without a head token.
    #[error("performative has no verb")]
    MissingVerb,

    /// Transport-level failure while framing a message.
    #[error("i/o error while reading performative: {0}")]
    Io(#[from] std::io::Error),
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<KqmlValue, KqmlError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(KqmlError::UnexpectedEof { pos: self.pos }),
            Some(b'(') => self.parse_list().map(KqmlValue::List),
            Some(b')') => Err(KqmlError::UnbalancedClose { pos: self.pos }),
            Some(b'"') => self.parse_string(),
            Some(_) => Ok(self.parse_token()),
        }
    }

    fn parse_list(&mut self) -> Result<KqmlList, KqmlError> {
        self.bump(); // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(KqmlError::UnexpectedEof { pos: self.pos }),
                Some(b')') => {
                    self.bump();
                    return Ok(items.into());
                }
                Some(_) => items.push(self.parse_value()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<KqmlValue, KqmlError> {
        let start = self.pos;
        self.bump(); // consume '"'
        let mut out: Vec<u8> = Vec::new();
        loop {
            match self.bump() {
                None => return Err(KqmlError::UnterminatedString { pos: start }),
                Some(b'"') => {
                    return Ok(KqmlValue::Str(String::from_utf8_lossy(&out).into_owned()));
                }
                Some(b'\\') => match self.bump() {
                    None => return Err(KqmlError::UnterminatedString { pos: start }),
                    Some(b) => out.push(b),
                },
                Some(b) => out.push(b),
            }
        }
    }

    fn parse_token(&mut self) -> KqmlValue {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'"') {
                break;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        KqmlValue::Token(text)
    }
}

/// Parse exactly one KQML value from `input`.
///
/// Leading and trailing whitespace is ignored; any other trailing bytes
/// are a [`KqmlError::TrailingData`] error.
pub fn parse(input: &str) -> Result<KqmlValue, KqmlError> {
    let mut cur = Cursor::new(input);
    let value = cur.parse_value()?;
    cur.skip_whitespace();
    if cur.peek().is_some() {
        return Err(KqmlError::TrailingData { pos: cur.pos });
    }
    Ok(value)
}

/// Parse one performative: a list with a head token.
pub fn parse_performative(input: &str) -> Result<Performative, KqmlError> {
    match parse(input)? {
        KqmlValue::List(list) => Performative::from_list(list),
        _ => Err(KqmlError::MissingVerb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_roundtrip() {
        let wire = "(request :sender TRIPS :reply-with msg1 \
                    :content (FIND-TARGET-DRUG :target (:name BRAF)))";
        let perf = parse_performative(wire).unwrap();
        assert_eq!(perf.verb(), "request");
        let content = perf.get_list("content").unwrap();
        assert_eq!(content.head(), Some("FIND-TARGET-DRUG"));
        assert_eq!(
            content.get_list("target").unwrap().gets("name"),
            Some("BRAF")
        );
        // Canonical render parses back to the same value.
        let rendered = perf.to_string();
        assert_eq!(parse_performative(&rendered).unwrap(), perf);
    }

    #[test]
    fn test_parse_string_escapes() {
        let v = parse(r#""a \"b\" c\\d""#).unwrap();
        assert_eq!(v.text(), Some(r#"a "b" c\d"#));
    }

    #[test]
    fn test_empty_list_is_a_value_but_not_a_performative() {
        assert!(matches!(parse("()"), Ok(KqmlValue::List(l)) if l.is_empty()));
        assert!(matches!(parse_performative("()"), Err(KqmlError::MissingVerb)));
    }

    #[test]
    fn test_unbalanced_and_unterminated_inputs() {
        assert!(matches!(
            parse("(tell :content"),
            Err(KqmlError::UnexpectedEof { .. })
        ));
        assert!(matches!(parse(")"), Err(KqmlError::UnbalancedClose { pos: 0 })));
        assert!(matches!(
            parse("\"never closed"),
            Err(KqmlError::UnterminatedString { pos: 0 })
        ));
    }

    #[test]
    fn test_trailing_data_rejected() {
        assert!(matches!(
            parse("(tell) (tell)"),
            Err(KqmlError::TrailingData { .. })
        ));
    }

    #[test]
    fn test_bare_token_is_not_a_performative() {
        assert!(matches!(parse_performative("hello"), Err(KqmlError::MissingVerb)));
    }
}
