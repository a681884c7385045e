use std::fmt;

use crate::lexer::LexErrorKind;
use crate::token::Span;

/// Classifies a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A token the grammar does not allow here.
    UnexpectedToken {
        found: String,
        expected: Vec<&'static str>,
    },
    UnterminatedString,
    UnterminatedComment,
    /// `${` inside a string without its closing `}`.
    UnbalancedInterpolation,
    InvalidNumberLiteral,
    InvalidCharLiteral,
    InvalidEscape,
    UnexpectedCharacter(char),
    /// Nesting went past the configured limit. The parse stops here.
    RecursionLimitExceeded { limit: usize },
}

impl DiagnosticKind {
    /// Errors detected by the lexer or string scanner.
    #[must_use]
    pub const fn is_lexical(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedString
                | Self::UnterminatedComment
                | Self::InvalidNumberLiteral
                | Self::InvalidCharLiteral
                | Self::InvalidEscape
                | Self::UnexpectedCharacter(_)
        )
    }
}

impl From<LexErrorKind> for DiagnosticKind {
    fn from(kind: LexErrorKind) -> Self {
        match kind {
            LexErrorKind::UnterminatedString => Self::UnterminatedString,
            LexErrorKind::UnterminatedComment => Self::UnterminatedComment,
            LexErrorKind::InvalidNumberLiteral => Self::InvalidNumberLiteral,
            LexErrorKind::InvalidCharLiteral => Self::InvalidCharLiteral,
            LexErrorKind::InvalidEscape => Self::InvalidEscape,
            LexErrorKind::UnexpectedCharacter(ch) => Self::UnexpectedCharacter(ch),
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { found, expected } => {
                write!(f, "unexpected {found}")?;
                match expected.as_slice() {
                    [] => Ok(()),
                    [one] => write!(f, ", expected {one}"),
                    many => write!(f, ", expected one of: {}", many.join(", ")),
                }
            }
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::UnbalancedInterpolation => {
                write!(f, "string interpolation is missing its closing '}}'")
            }
            Self::InvalidNumberLiteral => write!(f, "invalid number literal"),
            Self::InvalidCharLiteral => write!(f, "invalid character literal"),
            Self::InvalidEscape => write!(f, "invalid escape sequence"),
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
            Self::RecursionLimitExceeded { limit } => {
                write!(f, "nesting deeper than {limit} levels")
            }
        }
    }
}

/// Problem found while parsing, with the span it applies to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Diagnostic {
    #[must_use]
    pub const fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Fatal diagnostics abort the whole parse.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, DiagnosticKind::RecursionLimitExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_token_message() {
        let diag = Diagnostic::new(
            DiagnosticKind::UnexpectedToken {
                found: "'{'".to_string(),
                expected: vec!["identifier", "')'"],
            },
            Span::new(9, 10, 1, 10),
        );
        assert_eq!(
            diag.to_string(),
            "unexpected '{', expected one of: identifier, ')' at line 1, column 10"
        );
    }

    #[test]
    fn lexical_kinds_convert() {
        let kind = DiagnosticKind::from(LexErrorKind::InvalidEscape);
        assert_eq!(kind, DiagnosticKind::InvalidEscape);
        assert!(kind.is_lexical());
        assert!(!DiagnosticKind::UnbalancedInterpolation.is_lexical());
    }

    #[test]
    fn recursion_limit_is_fatal() {
        let diag = Diagnostic::new(
            DiagnosticKind::RecursionLimitExceeded { limit: 4 },
            Span::empty_at(0, 1, 1),
        );
        assert!(diag.is_fatal());
        assert_eq!(diag.to_string(), "nesting deeper than 4 levels at line 1, column 1");
    }
}
