use std::fmt;

use crate::lexer::LexErrorKind;

/// Source location covering a byte range.
///
/// `line` and `column` are 1-based and describe the start of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Zero-width span at a position.
    #[must_use]
    pub const fn empty_at(offset: usize, line: usize, column: usize) -> Self {
        Self::new(offset, offset, line, column)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span containing both `self` and `other`.
    #[must_use]
    pub const fn cover(self, other: Self) -> Self {
        let (first, start) = if other.start < self.start {
            (other, other.start)
        } else {
            (self, self.start)
        };
        let end = if other.end > self.end {
            other.end
        } else {
            self.end
        };
        Self {
            start,
            end,
            line: first.line,
            column: first.column,
        }
    }

    /// The source text under this span, or `""` when out of range.
    #[must_use]
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Words the parser gives a grammatical role.
///
/// The lexer never produces these: every word is lexed as an identifier
/// and the parser re-tags it when it consumes it in a keyword position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Fn,
    Type,
    Enum,
    Var,
    Extends,
    Private,
    Static,
    Abstract,
    Native,
    Return,
    Throw,
    Break,
    Continue,
    Try,
    Catch,
    At,
    While,
    Do,
    If,
    Else,
    For,
    In,
    Sampling,
    Limit,
    Skip,
    As,
    Is,
    True,
    False,
    Null,
    This,
    Typeof,
}

impl Keyword {
    pub const ALL: [Self; 32] = [
        Self::Fn,
        Self::Type,
        Self::Enum,
        Self::Var,
        Self::Extends,
        Self::Private,
        Self::Static,
        Self::Abstract,
        Self::Native,
        Self::Return,
        Self::Throw,
        Self::Break,
        Self::Continue,
        Self::Try,
        Self::Catch,
        Self::At,
        Self::While,
        Self::Do,
        Self::If,
        Self::Else,
        Self::For,
        Self::In,
        Self::Sampling,
        Self::Limit,
        Self::Skip,
        Self::As,
        Self::Is,
        Self::True,
        Self::False,
        Self::Null,
        Self::This,
        Self::Typeof,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fn => "fn",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Var => "var",
            Self::Extends => "extends",
            Self::Private => "private",
            Self::Static => "static",
            Self::Abstract => "abstract",
            Self::Native => "native",
            Self::Return => "return",
            Self::Throw => "throw",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::At => "at",
            Self::While => "while",
            Self::Do => "do",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::Sampling => "sampling",
            Self::Limit => "limit",
            Self::Skip => "skip",
            Self::As => "as",
            Self::Is => "is",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::This => "this",
            Self::Typeof => "typeof",
        }
    }

    /// Look up the keyword spelled by `word`.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kw| kw.as_str() == word)
    }

    /// Reserved words can never be used as identifiers. The rest are
    /// contextual and only act as keywords where the grammar expects them.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        !matches!(
            self,
            Self::Extends
                | Self::Private
                | Self::Static
                | Self::Abstract
                | Self::Native
                | Self::At
                | Self::Sampling
                | Self::Limit
                | Self::Skip
                | Self::Typeof
        )
    }

    /// Modifier keywords that may precede a declaration.
    #[must_use]
    pub const fn is_modifier(self) -> bool {
        matches!(self, Self::Private | Self::Static | Self::Abstract | Self::Native)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token kinds produced by the lexer and string scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Word matching `[a-zA-Z_][a-zA-Z0-9_]*`.
    Ident,
    /// Word consumed by the parser in a keyword position.
    Keyword(Keyword),
    /// Numeric literal; `suffix_len` is the byte length of a unit suffix.
    Number { suffix_len: usize },
    /// Duration literal such as `1hour30min`.
    Duration,
    /// Single-quoted character or date/time literal.
    Char,
    /// Opening `"`.
    StringOpen,
    /// Closing `"`.
    StringClose,
    /// Literal run inside a string.
    StringFragment,
    /// Escape sequence inside a string.
    StringEscape,
    /// `${` inside a string.
    InterpolationStart,
    /// `}` closing an interpolation.
    InterpolationEnd,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    ColonColon,
    Dot,
    DotDot,
    Arrow,
    At,
    Question,
    QuestionQuestion,
    QuestionEq,
    Eq,
    EqEq,
    Bang,
    BangBang,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Star,
    Slash,
    Percent,
    Caret,
    AmpAmp,
    PipePipe,

    /// `// ...`
    LineComment,
    /// `/// ...`
    DocComment,
    /// `/* ... */`
    BlockComment,
    /// Malformed input; the lexer keeps going after emitting one.
    Error(LexErrorKind),
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Comments never take part in the grammar.
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::LineComment | Self::DocComment | Self::BlockComment)
    }

    /// Fixed spelling for punctuation, used in diagnostics.
    #[must_use]
    pub const fn punctuation(self) -> Option<&'static str> {
        let text = match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace | Self::InterpolationEnd => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Colon => ":",
            Self::ColonColon => "::",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::Arrow => "->",
            Self::At => "@",
            Self::Question => "?",
            Self::QuestionQuestion => "??",
            Self::QuestionEq => "?=",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::Bang => "!",
            Self::BangBang => "!!",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::PlusPlus => "++",
            Self::Minus => "-",
            Self::MinusMinus => "--",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::StringOpen | Self::StringClose => "\"",
            Self::InterpolationStart => "${",
            _ => return None,
        };
        Some(text)
    }
}

/// Normalized value of a numeric or duration literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Integer without fraction or exponent.
    Int(u64),
    /// Decimal or scientific notation.
    Float(f64),
    /// Total length in microseconds.
    Duration(u64),
}

/// A single token with its kind, location, and literal payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub literal: Option<Literal>,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            literal: None,
        }
    }

    /// Source text of the token.
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }

    /// Unit suffix of a number literal (`kg` in `12kg`).
    #[must_use]
    pub fn suffix<'s>(&self, source: &'s str) -> Option<&'s str> {
        match self.kind {
            TokenKind::Number { suffix_len } if suffix_len > 0 => {
                let text = self.text(source);
                text.get(text.len() - suffix_len..)
            }
            _ => None,
        }
    }

    /// Human-readable description for diagnostics.
    #[must_use]
    pub fn describe(&self, source: &str) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::StringOpen => "string".to_string(),
            _ => self.text(source).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_orders_spans() {
        let a = Span::new(4, 6, 1, 5);
        let b = Span::new(0, 2, 1, 1);
        let c = a.cover(b);
        assert_eq!((c.start, c.end, c.column), (0, 6, 1));
        assert_eq!(b.cover(a), c);
    }

    #[test]
    fn keyword_lookup() {
        assert_eq!(Keyword::from_word("sampling"), Some(Keyword::Sampling));
        assert_eq!(Keyword::from_word("foo"), None);
        assert!(Keyword::Fn.is_reserved());
        assert!(!Keyword::Limit.is_reserved());
        assert!(Keyword::Native.is_modifier());
    }

    #[test]
    fn number_suffix() {
        let src = "12kg";
        let tok = Token::new(TokenKind::Number { suffix_len: 2 }, Span::new(0, 4, 1, 1));
        assert_eq!(tok.suffix(src), Some("kg"));
        assert_eq!(tok.text(src), "12kg");
    }
}
