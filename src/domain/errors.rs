use thiserror::Error;

/// Reasons a formula fails to compile.
///
/// The `Display` text is what callers show next to the formula input, so
/// every variant names the fragment that caused the failure when there is
/// one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("malformed number '{0}'")]
    MalformedNumber(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("function '{0}' expects a parenthesized argument")]
    MissingArgument(String),

    #[error("missing ')' to close '('")]
    UnclosedParenthesis,

    #[error("unmatched ')'")]
    UnmatchedParenthesis,

    #[error("unexpected '{0}'")]
    UnexpectedToken(String),

    #[error("unexpected '{found}' after '{after}'")]
    UnexpectedAfter { found: String, after: String },

    #[error("expression ends after '{0}'")]
    UnexpectedEnd(String),

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

pub type ParseResult<T> = Result<T, ParseError>;
