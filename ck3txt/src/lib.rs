//! A tokenizer for Crusader Kings III script files.
//!
//! The format is loosely based on braces `{}` and `key = value` assignments.
//! Files are usually UTF-8 (often with a BOM), but community mods still ship
//! WINDOWS-1252 encoded files, so decoding falls back to that codepage.
//!
//! Consumers in this workspace do not need a full syntax tree: they walk the
//! flat token stream, tracking brace depth themselves, and use [`read_block`]
//! to grab the contents of a single `{ ... }` block.

mod error;

pub use error::ParseError;

use std::fs;
use std::io;
use std::path::Path;

use encoding_rs::{UTF_8, WINDOWS_1252};

/// Represents a token scanned from a CK3 text file.
#[derive(Debug, Clone, PartialEq)]
pub enum Ck3TxtToken {
    /// A bare word: keys, title names, dates like `1066.9.15`, keywords.
    Identifier(String),
    /// A quoted string value, quotes removed.
    StringValue(String),
    /// An integer number.
    IntValue(i64),
    /// A floating point number.
    FloatValue(f64),
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `=`
    Equals,
}

impl Ck3TxtToken {
    /// Returns the integer payload, if this is an integer token.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Ck3TxtToken::IntValue(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the word payload, if this is an identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Ck3TxtToken::Identifier(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a scalar token as a plain string value.
    ///
    /// Braces and `=` have no scalar value and return `None`.
    pub fn scalar_value(&self) -> Option<String> {
        match self {
            Ck3TxtToken::Identifier(s) | Ck3TxtToken::StringValue(s) => Some(s.clone()),
            Ck3TxtToken::IntValue(i) => Some(i.to_string()),
            Ck3TxtToken::FloatValue(f) => Some(f.to_string()),
            _ => None,
        }
    }
}

/// Decodes raw file bytes into text.
///
/// UTF-8 is tried first (a leading BOM is dropped). If the bytes are not
/// valid UTF-8 the whole buffer is decoded as WINDOWS-1252 instead, which
/// never fails and matches Latin-1 for every printable character.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text.into_owned();
    }
    log::debug!("Input is not valid UTF-8, falling back to WINDOWS-1252");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Reads a whole file and decodes it with [`decode_text`].
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_text(&bytes))
}

pub trait Ck3Txt {
    /// Reads and tokenizes a file.
    fn open_txt(path: &Path) -> io::Result<Vec<Ck3TxtToken>> {
        let contents = read_text(path)?;
        Ok(Self::tokenize(&contents))
    }

    /// Splits text into tokens. Comments (`#` to end of line) are dropped.
    fn tokenize(contents: &str) -> Vec<Ck3TxtToken> {
        let mut tokens: Vec<Ck3TxtToken> = Vec::new();
        let mut chars = contents.chars().peekable();

        while let Some(&c) = chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    chars.next();
                }
                '#' => {
                    while let Some(&nc) = chars.peek() {
                        if nc == '\n' || nc == '\r' {
                            break;
                        }
                        chars.next();
                    }
                }
                '{' => {
                    tokens.push(Ck3TxtToken::LeftBrace);
                    chars.next();
                }
                '}' => {
                    tokens.push(Ck3TxtToken::RightBrace);
                    chars.next();
                }
                '=' => {
                    tokens.push(Ck3TxtToken::Equals);
                    chars.next();
                }
                '"' => {
                    chars.next();
                    let mut s = String::new();
                    for nc in chars.by_ref() {
                        if nc == '"' {
                            break;
                        }
                        s.push(nc);
                    }
                    tokens.push(Ck3TxtToken::StringValue(s));
                }
                _ => {
                    let mut s = String::new();
                    while let Some(&nc) = chars.peek() {
                        if nc.is_whitespace()
                            || nc == '='
                            || nc == '{'
                            || nc == '}'
                            || nc == '#'
                            || nc == '"'
                        {
                            break;
                        }
                        s.push(nc);
                        chars.next();
                    }

                    if let Ok(i) = s.parse::<i64>() {
                        tokens.push(Ck3TxtToken::IntValue(i));
                    } else if let Some(f) = parse_plain_float(&s) {
                        tokens.push(Ck3TxtToken::FloatValue(f));
                    } else {
                        tokens.push(Ck3TxtToken::Identifier(s));
                    }
                }
            }
        }
        tokens
    }
}

/// Parses decimal floats only. Rust's `f64` parser also accepts words like
/// `inf` and `NaN`, which are legitimate identifiers in script files.
fn parse_plain_float(s: &str) -> Option<f64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    s.parse::<f64>().ok()
}

pub struct DefaultCk3Txt {}
impl Ck3Txt for DefaultCk3Txt {}

/// Returns the tokens strictly inside the block opened at `open`, plus the
/// position just past its closing brace.
///
/// `tokens[open]` must be a [`Ck3TxtToken::LeftBrace`]. Nested blocks are
/// included verbatim in the returned slice.
pub fn read_block(
    tokens: &[Ck3TxtToken],
    open: usize,
) -> Result<(&[Ck3TxtToken], usize), ParseError> {
    match tokens.get(open) {
        Some(Ck3TxtToken::LeftBrace) => {}
        Some(other) => {
            return Err(ParseError::UnexpectedToken {
                position: open,
                token: format!("{:?}", other),
                expected: "'{'".to_string(),
            });
        }
        None => return Err(ParseError::UnexpectedEof { position: open }),
    }

    let mut depth = 0usize;
    for (pos, tok) in tokens.iter().enumerate().skip(open) {
        match tok {
            Ck3TxtToken::LeftBrace => depth += 1,
            Ck3TxtToken::RightBrace => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&tokens[open + 1..pos], pos + 1));
                }
            }
            _ => {}
        }
    }
    Err(ParseError::UnterminatedBlock { position: open })
}
