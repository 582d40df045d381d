//! Error types for literal parsing

/// Errors raised while parsing literal text
///
/// Every syntax variant carries the byte offset into the input where the
/// problem was detected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    /// Input ended while a value was still expected
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    /// Character that cannot start or continue a value here
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { offset: usize, found: char },

    /// Bare name other than `None`, `True`, `False`, `inf` or `nan`
    #[error("unknown name '{name}' at offset {offset}")]
    UnknownName { offset: usize, name: String },

    /// String literal missing its closing quote
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    /// Malformed escape sequence inside a string
    #[error("invalid escape sequence at offset {offset}: {reason}")]
    InvalidEscape { offset: usize, reason: String },

    /// Malformed numeric literal
    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { offset: usize, text: String },

    /// Integer outside the 64-bit signed range
    #[error("integer '{text}' at offset {offset} does not fit in 64 bits")]
    IntegerOverflow { offset: usize, text: String },

    /// Dict key of a type that cannot be hashed
    #[error("unhashable dict key of type '{kind}' at offset {offset}")]
    UnhashableKey { offset: usize, kind: &'static str },

    /// Valid host syntax this notation does not carry (bytes, sets, complex)
    #[error("unsupported {what} literal at offset {offset}")]
    Unsupported { offset: usize, what: &'static str },

    /// Containers nested past the recursion limit
    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep { offset: usize, limit: usize },

    /// Extra input after a complete value
    #[error("unexpected trailing input {found:?} at offset {offset}")]
    TrailingInput { offset: usize, found: char },

    /// The grammar could not be loaded or the parse was abandoned
    #[error("parser failure: {0}")]
    Parser(String),
}

impl LiteralError {
    /// Byte offset where the error was detected, `0` for parser failures
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEnd { offset }
            | Self::UnexpectedChar { offset, .. }
            | Self::UnknownName { offset, .. }
            | Self::UnterminatedString { offset }
            | Self::InvalidEscape { offset, .. }
            | Self::InvalidNumber { offset, .. }
            | Self::IntegerOverflow { offset, .. }
            | Self::UnhashableKey { offset, .. }
            | Self::Unsupported { offset, .. }
            | Self::TooDeep { offset, .. }
            | Self::TrailingInput { offset, .. } => *offset,
            Self::Parser(_) => 0,
        }
    }
}
