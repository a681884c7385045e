use std::fmt;

use crate::scanner::FragmentHook;
use crate::token::{Literal, Span, Token, TokenKind};

/// Classifies a malformed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    /// String literal reached end of input before its closing quote.
    UnterminatedString,
    /// `/*` without a matching `*/`.
    UnterminatedComment,
    /// Numeric literal that cannot be read as a number.
    InvalidNumberLiteral,
    /// Character literal without a closing quote or holding more than one character.
    InvalidCharLiteral,
    /// Escape sequence inside a string that does not match any escape form.
    InvalidEscape,
    /// Byte that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::InvalidNumberLiteral => write!(f, "invalid number literal"),
            Self::InvalidCharLiteral => write!(f, "invalid character literal"),
            Self::InvalidEscape => write!(f, "invalid escape sequence"),
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
        }
    }
}

/// Tokenize GreyCat source into the full token stream, comments included.
///
/// String interiors are split by the default fragment hook and the closing
/// brace of each interpolation is reported as
/// [`TokenKind::InterpolationEnd`]. Malformed input shows up as
/// [`TokenKind::Error`] tokens; tokenizing never stops early. The trailing
/// end-of-input token is not included.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_with(input, &crate::scanner::DefaultFragmentHook)
}

/// Like [`tokenize`], with a custom string fragment hook.
#[must_use]
pub fn tokenize_with(input: &str, hook: &dyn FragmentHook) -> Vec<Token> {
    #[derive(Clone, Copy)]
    enum Mode {
        Code { braces: usize },
        Str,
    }

    let mut lexer = Lexer::new(input);
    let mut modes = vec![Mode::Code { braces: 0 }];
    let mut tokens = Vec::new();

    loop {
        let Some(&mode) = modes.last() else {
            break;
        };
        let mut token = match mode {
            Mode::Str => lexer.next_string_token(hook),
            Mode::Code { .. } => lexer.next_token(),
        };
        if token.kind == TokenKind::Eof {
            break;
        }
        match (mode, token.kind) {
            (
                Mode::Str,
                TokenKind::StringClose | TokenKind::Error(LexErrorKind::UnterminatedString),
            ) => {
                modes.pop();
            }
            (Mode::Str, TokenKind::InterpolationStart) => {
                modes.push(Mode::Code { braces: 0 });
            }
            (Mode::Code { .. }, TokenKind::StringOpen) => modes.push(Mode::Str),
            (Mode::Code { braces }, TokenKind::LBrace) => {
                modes.pop();
                modes.push(Mode::Code {
                    braces: braces + 1,
                });
            }
            (Mode::Code { braces: 0 }, TokenKind::RBrace) if modes.len() > 1 => {
                token.kind = TokenKind::InterpolationEnd;
                modes.pop();
            }
            (Mode::Code { braces }, TokenKind::RBrace) => {
                modes.pop();
                modes.push(Mode::Code {
                    braces: braces.saturating_sub(1),
                });
            }
            _ => {}
        }
        tokens.push(token);
    }

    tokens
}

/// Position at the start of a token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    pos: usize,
    line: usize,
    col: usize,
}

/// Pull-based GreyCat lexer.
///
/// The lexer is a small `Copy` value, so a saved copy is a complete
/// checkpoint that the parser can restore when it backtracks.
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let start = if input.starts_with('\u{FEFF}') { 3 } else { 0 };
        Self {
            input,
            pos: start,
            line: 1,
            col: 1,
            done: false,
        }
    }

    /// Byte offset of the next unread character.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.pos
    }

    /// Zero-width span at the current position.
    #[must_use]
    pub const fn here(&self) -> Span {
        Span::empty_at(self.pos, self.line, self.col)
    }

    pub(crate) const fn source(&self) -> &'a str {
        self.input
    }

    /// Produce the next token in code mode. Returns
    /// [`TokenKind::Eof`] forever once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.mark();
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.here());
        };

        match ch {
            b'/' if self.peek_at(1) == Some(b'/') => self.read_line_comment(start),
            b'/' if self.peek_at(1) == Some(b'*') => self.read_block_comment(start),
            b'"' => {
                self.advance();
                self.finish(TokenKind::StringOpen, start)
            }
            b'\'' => self.read_char(start),
            b'0'..=b'9' => self.read_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.eat_while(is_ident_byte);
                self.finish(TokenKind::Ident, start)
            }
            _ => self.read_punctuation(start),
        }
    }

    pub(crate) const fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    pub(crate) const fn finish(&self, kind: TokenKind, start: Mark) -> Token {
        Token::new(
            kind,
            Span::new(start.pos, self.pos, start.line, start.col),
        )
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Advance one byte. Columns count characters, not bytes.
    pub(crate) fn advance(&mut self) {
        if let Some(b) = self.peek() {
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if b & 0xC0 != 0x80 {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    /// Advance over one whole character.
    pub(crate) fn advance_char(&mut self) {
        self.advance();
        while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
            self.pos += 1;
        }
    }

    pub(crate) fn advance_to(&mut self, end: usize) {
        while self.pos < end && self.pos < self.input.len() {
            self.advance();
        }
    }

    pub(crate) fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        self.pos - start
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C));
    }

    fn read_line_comment(&mut self, start: Mark) -> Token {
        let kind = if self.peek_at(2) == Some(b'/') {
            TokenKind::DocComment
        } else {
            TokenKind::LineComment
        };
        self.eat_while(|b| b != b'\n');
        let mut token = self.finish(kind, start);
        if token.text(self.input).ends_with('\r') {
            token.span.end -= 1;
        }
        token
    }

    fn read_block_comment(&mut self, start: Mark) -> Token {
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    return self.finish(
                        TokenKind::Error(LexErrorKind::UnterminatedComment),
                        start,
                    );
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return self.finish(TokenKind::BlockComment, start);
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn read_punctuation(&mut self, start: Mark) -> Token {
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.here());
        };
        let next = self.peek_at(1);
        let (kind, len) = match (ch, next) {
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b'{', _) => (TokenKind::LBrace, 1),
            (b'}', _) => (TokenKind::RBrace, 1),
            (b'[', _) => (TokenKind::LBracket, 1),
            (b']', _) => (TokenKind::RBracket, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b';', _) => (TokenKind::Semi, 1),
            (b':', Some(b':')) => (TokenKind::ColonColon, 2),
            (b':', _) => (TokenKind::Colon, 1),
            (b'.', Some(b'.')) => (TokenKind::DotDot, 2),
            (b'.', _) => (TokenKind::Dot, 1),
            (b'-', Some(b'>')) => (TokenKind::Arrow, 2),
            (b'-', Some(b'-')) => (TokenKind::MinusMinus, 2),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'+', Some(b'+')) => (TokenKind::PlusPlus, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'@', _) => (TokenKind::At, 1),
            (b'?', Some(b'?')) => (TokenKind::QuestionQuestion, 2),
            (b'?', Some(b'=')) => (TokenKind::QuestionEq, 2),
            (b'?', _) => (TokenKind::Question, 1),
            (b'=', Some(b'=')) => (TokenKind::EqEq, 2),
            (b'=', _) => (TokenKind::Eq, 1),
            (b'!', Some(b'!')) => (TokenKind::BangBang, 2),
            (b'!', Some(b'=')) => (TokenKind::BangEq, 2),
            (b'!', _) => (TokenKind::Bang, 1),
            (b'<', Some(b'=')) => (TokenKind::LtEq, 2),
            (b'<', _) => (TokenKind::Lt, 1),
            (b'>', Some(b'=')) => (TokenKind::GtEq, 2),
            (b'>', _) => (TokenKind::Gt, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'^', _) => (TokenKind::Caret, 1),
            (b'&', Some(b'&')) => (TokenKind::AmpAmp, 2),
            (b'|', Some(b'|')) => (TokenKind::PipePipe, 2),
            _ => {
                let found = self.input[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                self.advance_char();
                return self.finish(
                    TokenKind::Error(LexErrorKind::UnexpectedCharacter(found)),
                    start,
                );
            }
        };
        for _ in 0..len {
            self.advance();
        }
        self.finish(kind, start)
    }

    fn read_number(&mut self, start: Mark) -> Token {
        if let Some((end, micros)) = scan_duration(self.input.as_bytes(), self.pos) {
            self.advance_to(end);
            let mut token = self.finish(TokenKind::Duration, start);
            token.literal = Some(Literal::Duration(micros));
            return token;
        }

        let mut is_float = false;
        self.eat_while(is_digit_or_underscore);

        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.eat_while(is_digit_or_underscore);
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            let digit_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) {
                2
            } else {
                1
            };
            if self.peek_at(digit_at).is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                self.eat_while(is_digit_or_underscore);
                if self.peek() == Some(b'.')
                    && self.peek_at(1).is_some_and(|b| b.is_ascii_digit())
                {
                    self.advance();
                    self.eat_while(is_digit_or_underscore);
                }
            } else if digit_at == 2 {
                // exponent sign with nothing after it
                self.advance();
                self.advance();
                self.eat_while(is_ident_byte);
                return self.finish(TokenKind::Error(LexErrorKind::InvalidNumberLiteral), start);
            }
        }

        let numeric_end = self.pos;
        let suffix_len = self.eat_while(|b| b.is_ascii_alphabetic() || b == b'_');
        if suffix_len > 0 && self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.eat_while(is_ident_byte);
            return self.finish(TokenKind::Error(LexErrorKind::InvalidNumberLiteral), start);
        }

        let digits: String = self.input[start.pos..numeric_end]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        // integers past u64 keep their value as a float
        let literal = if is_float {
            digits.parse::<f64>().ok().map(Literal::Float)
        } else {
            digits
                .parse::<u64>()
                .map(Literal::Int)
                .or_else(|_| digits.parse::<f64>().map(Literal::Float))
                .ok()
        };

        let mut token = self.finish(TokenKind::Number { suffix_len }, start);
        token.literal = literal;
        token
    }

    fn read_char(&mut self, start: Mark) -> Token {
        self.advance();
        let input = self.input;
        let bytes = input.as_bytes();

        let body_ok = match self.peek() {
            Some(b'\'') => true,
            Some(b'\\') => {
                self.advance();
                match self.peek() {
                    Some(b'u') => {
                        self.advance();
                        self.eat_hex(4)
                    }
                    Some(b'x') => {
                        self.advance();
                        self.eat_hex(2)
                    }
                    Some(b'\n') | None => false,
                    Some(_) => {
                        self.advance_char();
                        true
                    }
                }
            }
            Some(b'\n') | None => false,
            Some(_) => {
                if let Some(end) = scan_iso8601(bytes, self.pos) {
                    self.advance_to(end);
                } else {
                    self.advance_char();
                }
                true
            }
        };

        if body_ok && self.peek() == Some(b'\'') {
            self.advance();
            return self.finish(TokenKind::Char, start);
        }

        self.eat_while(|b| b != b'\'' && b != b'\n');
        if self.peek() == Some(b'\'') {
            self.advance();
        }
        self.finish(TokenKind::Error(LexErrorKind::InvalidCharLiteral), start)
    }

    pub(crate) fn eat_hex(&mut self, count: usize) -> bool {
        for _ in 0..count {
            if !self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
                return false;
            }
            self.advance();
        }
        true
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every code-mode token up to and including end of input.
    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}

pub(crate) const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

const fn is_digit_or_underscore(b: u8) -> bool {
    b.is_ascii_digit() || b == b'_'
}

const DURATION_UNITS: [(&str, u64); 6] = [
    ("hour", 3_600_000_000),
    ("day", 86_400_000_000),
    ("min", 60_000_000),
    ("ms", 1_000),
    ("us", 1),
    ("s", 1_000_000),
];

/// Match `(number unit _*)+` at `pos`. Returns the end offset and total
/// microseconds, or `None` when the run is not a clean duration.
fn scan_duration(bytes: &[u8], mut pos: usize) -> Option<(usize, u64)> {
    let mut total: f64 = 0.0;
    let mut segments = 0;

    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        let start = pos;
        while bytes.get(pos).copied().is_some_and(is_digit_or_underscore) {
            pos += 1;
        }
        if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
            pos += 1;
            while bytes.get(pos).copied().is_some_and(is_digit_or_underscore) {
                pos += 1;
            }
        }
        let number: String = bytes[start..pos]
            .iter()
            .filter(|&&b| b != b'_')
            .map(|&b| char::from(b))
            .collect();
        let value: f64 = number.parse().ok()?;

        let rest = &bytes[pos..];
        let (unit, micros) = DURATION_UNITS
            .iter()
            .find(|(unit, _)| rest.starts_with(unit.as_bytes()))?;
        pos += unit.len();
        while bytes.get(pos) == Some(&b'_') {
            pos += 1;
        }

        #[allow(clippy::cast_precision_loss)]
        let scale = *micros as f64;
        total += value * scale;
        segments += 1;
    }

    if segments == 0 || bytes.get(pos).copied().is_some_and(is_ident_byte) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let micros = total.round() as u64;
    Some((pos, micros))
}

/// Match an ISO-8601 date or date-time at `pos` (at least a year).
fn scan_iso8601(bytes: &[u8], pos: usize) -> Option<usize> {
    let digits = |at: usize, n: usize| -> Option<usize> {
        let run = bytes.get(at..at + n)?;
        run.iter().all(u8::is_ascii_digit).then_some(at + n)
    };
    let sep = |at: usize, b: u8| bytes.get(at) == Some(&b);

    let mut end = digits(pos, 4)?;
    let date_parts = [b'-', b'-'];
    for mark in date_parts {
        if !sep(end, mark) {
            return Some(end);
        }
        let Some(next) = digits(end + 1, 2) else {
            return Some(end);
        };
        end = next;
    }

    if !sep(end, b'T') {
        return Some(end);
    }
    let Some(hour) = digits(end + 1, 2) else {
        return Some(end);
    };
    end = hour;
    for _ in 0..2 {
        if !sep(end, b':') {
            break;
        }
        let Some(next) = digits(end + 1, 2) else {
            break;
        };
        end = next;
    }
    if sep(end, b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if sep(end, b'Z') {
        end += 1;
    } else if sep(end, b'+') || sep(end, b'-') {
        if let Some(zone) = digits(end + 1, 2) {
            end = zone;
            if sep(end, b':') {
                if let Some(minutes) = digits(end + 1, 2) {
                    end = minutes;
                }
            }
        }
    }
    Some(end)
}
