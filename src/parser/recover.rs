//! Panic-mode recovery for declarations and statements.
//!
//! A failed production is rewound to where it started and re-consumed into
//! an `error` node, first up to the point of failure and then up to the
//! next boundary of the enclosing list. One diagnostic is recorded per
//! recovery.

use std::mem;

use super::{PResult, Parser, Snapshot};
use crate::cst::{Node, NodeBuilder, NodeKind};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::lexer::LexErrorKind;
use crate::token::{Keyword, TokenKind};

/// The list a failed item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Boundary {
    Module,
    TypeBody,
    Block,
}

impl Boundary {
    /// Keywords that start a fresh item in this list.
    const fn stops_at(self, kw: Keyword) -> bool {
        match self {
            Self::Module | Self::TypeBody => matches!(
                kw,
                Keyword::Fn
                    | Keyword::Type
                    | Keyword::Enum
                    | Keyword::Var
                    | Keyword::Private
                    | Keyword::Static
                    | Keyword::Abstract
                    | Keyword::Native
            ),
            Self::Block => matches!(
                kw,
                Keyword::Var
                    | Keyword::Return
                    | Keyword::Throw
                    | Keyword::Break
                    | Keyword::Continue
                    | Keyword::Try
                    | Keyword::While
                    | Keyword::Do
                    | Keyword::If
                    | Keyword::For
            ),
        }
    }
}

pub(crate) trait Recover {
    /// Turn a failed item into an `error` node. Fatal diagnostics are
    /// passed through.
    fn or_recover<'src>(
        self,
        parser: &mut Parser<'src, '_>,
        start: Snapshot<'src>,
        boundary: Boundary,
    ) -> PResult<Node>;
}

impl Recover for PResult<Node> {
    fn or_recover<'src>(
        self,
        parser: &mut Parser<'src, '_>,
        start: Snapshot<'src>,
        boundary: Boundary,
    ) -> PResult<Node> {
        match self {
            Ok(node) => Ok(node),
            Err(diagnostic) => parser.recover(start, diagnostic, boundary),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Str,
    Code { braces: usize },
}

impl<'src> Parser<'src, '_> {
    fn recover(
        &mut self,
        start: Snapshot<'src>,
        diagnostic: Diagnostic,
        boundary: Boundary,
    ) -> PResult<Node> {
        if diagnostic.is_fatal() {
            return Err(diagnostic);
        }
        let failed_at = diagnostic.span.start;
        self.restore(start);
        let mark = self.diagnostics.len();

        let mut node = NodeBuilder::new(NodeKind::Error).at(self.current_span());
        node.set_extras(self.take_trivia());
        let mut depth = 0usize;

        while self.peek().span.start < failed_at && !self.at(TokenKind::Eof) {
            match self.peek_kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.skip_token(&mut node);
        }

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Semi if depth == 0 => {
                    node.token(self.bump());
                    break;
                }
                TokenKind::RBrace if depth == 0 => {
                    // a stray `}` at top level has no enclosing list to end
                    if boundary == Boundary::Module && node.is_empty() {
                        node.token(self.bump());
                    }
                    break;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    node.token(self.bump());
                }
                TokenKind::RBrace => {
                    depth -= 1;
                    node.token(self.bump());
                }
                TokenKind::At
                    if depth == 0 && boundary == Boundary::Module && !node.is_empty() =>
                {
                    break;
                }
                TokenKind::Ident
                    if depth == 0
                        && !node.is_empty()
                        && self.peek_keyword().is_some_and(|kw| boundary.stops_at(kw)) =>
                {
                    break;
                }
                _ => self.skip_token(&mut node),
            }
        }

        let node = node.finish();
        log::debug!(
            "recovered {boundary:?} item at {}..{}: {diagnostic}",
            node.span.start,
            node.span.end
        );
        // string errors are reported again while skipping the literal
        let reported = matches!(
            diagnostic.kind,
            DiagnosticKind::UnterminatedString | DiagnosticKind::UnbalancedInterpolation
        ) && self.diagnostics[mark..]
                .iter()
                .any(|d| mem::discriminant(&d.kind) == mem::discriminant(&diagnostic.kind));
        if !reported {
            self.record(diagnostic);
        }
        Ok(node)
    }

    /// Consume the next token into `node`. A string is consumed whole,
    /// interpolations included.
    pub(crate) fn skip_token(&mut self, node: &mut NodeBuilder) {
        let token = self.bump();
        node.token(token);
        if token.kind == TokenKind::StringOpen {
            self.skip_string(node);
        }
    }

    fn skip_string(&mut self, node: &mut NodeBuilder) {
        let mut modes = vec![Mode::Str];
        while let Some(&mode) = modes.last() {
            match mode {
                Mode::Str => {
                    let token = self.string_token();
                    match token.kind {
                        TokenKind::StringClose => {
                            node.token(token);
                            modes.pop();
                        }
                        TokenKind::InterpolationStart => {
                            node.token(token);
                            modes.push(Mode::Code { braces: 0 });
                        }
                        TokenKind::Error(LexErrorKind::UnterminatedString) => {
                            self.record(Diagnostic::new(
                                DiagnosticKind::UnterminatedString,
                                token.span,
                            ));
                            return;
                        }
                        TokenKind::Error(kind) => {
                            self.record(Diagnostic::new(DiagnosticKind::from(kind), token.span));
                            node.token(token);
                        }
                        _ => node.token(token),
                    }
                }
                Mode::Code { braces } => {
                    let token = self.peek();
                    let next = match token.kind {
                        TokenKind::Eof => {
                            self.record(Diagnostic::new(
                                DiagnosticKind::UnbalancedInterpolation,
                                token.span,
                            ));
                            return;
                        }
                        TokenKind::LBrace => Some(Mode::Code { braces: braces + 1 }),
                        TokenKind::RBrace if braces == 0 => None,
                        TokenKind::RBrace => Some(Mode::Code { braces: braces - 1 }),
                        _ => Some(mode),
                    };
                    let mut token = self.bump();
                    modes.pop();
                    match next {
                        Some(next) => modes.push(next),
                        None => token.kind = TokenKind::InterpolationEnd,
                    }
                    node.token(token);
                    if token.kind == TokenKind::StringOpen {
                        modes.push(Mode::Str);
                    }
                }
            }
        }
    }
}
