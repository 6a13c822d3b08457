//! Error types for the CK3 text tokenizer and block reader.

use std::fmt;

/// Errors that can occur while reading blocks out of a token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected end of input.
    UnexpectedEof {
        /// Position in the token stream where EOF was encountered.
        position: usize,
    },
    /// Encountered an unexpected token.
    UnexpectedToken {
        /// Position in the token stream.
        position: usize,
        /// The token that was found.
        token: String,
        /// What was expected instead.
        expected: String,
    },
    /// A `{` was never closed.
    UnterminatedBlock {
        /// Position of the opening brace.
        position: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof { position } => {
                write!(f, "Unexpected end of input at position {}", position)
            }
            ParseError::UnexpectedToken {
                position,
                token,
                expected,
            } => {
                write!(
                    f,
                    "Unexpected token '{}' at position {}, expected {}",
                    token, position, expected
                )
            }
            ParseError::UnterminatedBlock { position } => {
                write!(f, "Block opened at position {} is never closed", position)
            }
        }
    }
}

impl std::error::Error for ParseError {}
