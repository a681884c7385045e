//! String literal interiors.
//!
//! After an opening `"` the parser switches the lexer into string mode and
//! pulls tokens with [`Lexer::next_string_token`] until the closing quote.
//! Each call yields one literal fragment, one escape sequence, an
//! interpolation start `${`, or the closing quote. After `${` the parser
//! goes back to [`Lexer::next_token`] for the embedded expression and
//! resumes string mode once it has consumed the matching `}`.

use crate::lexer::{LexErrorKind, Lexer};
use crate::token::{Token, TokenKind};

/// Decides where a literal run inside a string ends.
///
/// `fragment_end` receives the whole source and the offset of the first
/// unconsumed byte of the string interior, and returns the exclusive end
/// offset of the literal run starting there. Escapes, `${`, and the closing
/// quote are handled by the scanner whenever the hook stops in front of
/// them.
pub trait FragmentHook {
    fn fragment_end(&self, source: &str, pos: usize) -> usize;
}

/// Stops at `"`, `\`, `${`, or end of input. A lone `$` is literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFragmentHook;

impl FragmentHook for DefaultFragmentHook {
    fn fragment_end(&self, source: &str, pos: usize) -> usize {
        let bytes = source.as_bytes();
        let mut end = pos;
        while let Some(&b) = bytes.get(end) {
            match b {
                b'"' | b'\\' => break,
                b'$' if bytes.get(end + 1) == Some(&b'{') => break,
                _ => end += 1,
            }
        }
        end
    }
}

impl<F> FragmentHook for F
where
    F: Fn(&str, usize) -> usize,
{
    fn fragment_end(&self, source: &str, pos: usize) -> usize {
        self(source, pos)
    }
}

impl Lexer<'_> {
    /// Produce the next token inside a string literal.
    ///
    /// At end of input this returns an
    /// [`UnterminatedString`](LexErrorKind::UnterminatedString) error token
    /// with an empty span.
    pub fn next_string_token(&mut self, hook: &dyn FragmentHook) -> Token {
        let start = self.mark();
        match self.peek() {
            None => Token::new(
                TokenKind::Error(LexErrorKind::UnterminatedString),
                self.here(),
            ),
            Some(b'"') => {
                self.advance();
                self.finish(TokenKind::StringClose, start)
            }
            Some(b'\\') => self.read_escape(),
            Some(b'$') if self.peek_at(1) == Some(b'{') => {
                self.advance();
                self.advance();
                self.finish(TokenKind::InterpolationStart, start)
            }
            Some(_) => {
                let source = self.source();
                let end = hook.fragment_end(source, self.offset());
                if end > self.offset() && source.is_char_boundary(end.min(source.len())) {
                    self.advance_to(end);
                } else {
                    // the hook made no progress, take one character
                    self.advance_char();
                }
                self.finish(TokenKind::StringFragment, start)
            }
        }
    }

    fn read_escape(&mut self) -> Token {
        let start = self.mark();
        self.advance();
        let valid = match self.peek() {
            None => false,
            Some(b'x') => {
                self.advance();
                self.eat_hex(2)
            }
            Some(b'u') => {
                self.advance();
                self.eat_hex(4)
            }
            Some(b'0'..=b'7') => {
                let mut digits = 0;
                while digits < 3 && matches!(self.peek(), Some(b'0'..=b'7')) {
                    self.advance();
                    digits += 1;
                }
                true
            }
            Some(_) => {
                self.advance_char();
                true
            }
        };
        let kind = if valid {
            TokenKind::StringEscape
        } else {
            TokenKind::Error(LexErrorKind::InvalidEscape)
        };
        self.finish(kind, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<(TokenKind, &str)> {
        let mut lexer = Lexer::new(src);
        let open = lexer.next_token();
        assert_eq!(open.kind, TokenKind::StringOpen);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_string_token(&DefaultFragmentHook);
            out.push((tok.kind, tok.text(src)));
            if matches!(
                tok.kind,
                TokenKind::StringClose | TokenKind::Error(LexErrorKind::UnterminatedString)
            ) {
                break;
            }
        }
        out
    }

    #[test]
    fn literal_only() {
        assert_eq!(
            scan(r#""Hello, world!""#),
            [
                (TokenKind::StringFragment, "Hello, world!"),
                (TokenKind::StringClose, "\""),
            ]
        );
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(
            scan(r#""cost $5""#),
            [
                (TokenKind::StringFragment, "cost $5"),
                (TokenKind::StringClose, "\""),
            ]
        );
    }

    #[test]
    fn escapes() {
        let toks = scan(r#""a\n\x41é\101\q""#);
        let escapes: Vec<_> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::StringEscape)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(escapes, [r"\n", r"\x41", r"\101", r"\q"]);
    }

    #[test]
    fn bad_escape() {
        let toks = scan(r#""\xZ""#);
        assert_eq!(toks[0], (TokenKind::Error(LexErrorKind::InvalidEscape), r"\x"));
    }

    #[test]
    fn interpolation_start() {
        let toks = scan(r#""a${"#);
        assert_eq!(toks[0], (TokenKind::StringFragment, "a"));
        assert_eq!(toks[1], (TokenKind::InterpolationStart, "${"));
    }

    #[test]
    fn unterminated() {
        let toks = scan(r#""abc"#);
        assert_eq!(
            toks.last().map(|t| t.0),
            Some(TokenKind::Error(LexErrorKind::UnterminatedString))
        );
    }

    #[test]
    fn closure_hook_splits_fragments() {
        let src = r#""abcd""#;
        let mut lexer = Lexer::new(src);
        lexer.next_token();
        let one_at_a_time = |source: &str, pos: usize| {
            if source.as_bytes()[pos] == b'"' { pos } else { pos + 1 }
        };
        let first = lexer.next_string_token(&one_at_a_time);
        assert_eq!(first.text(src), "a");
    }

    #[test]
    fn stuck_hook_still_progresses() {
        let src = r#""xy""#;
        let mut lexer = Lexer::new(src);
        lexer.next_token();
        let stuck = |_: &str, pos: usize| pos;
        let tok = lexer.next_string_token(&stuck);
        assert_eq!(tok.kind, TokenKind::StringFragment);
        assert_eq!(tok.text(src), "x");
    }
}
