//! Recursive-descent parser producing a concrete syntax tree.
//!
//! Declarations, statements, and expressions live in their own modules.
//! All of them share the [`Parser`] state defined here: a pull lexer with
//! one token of lookahead, a side log of comments, and the diagnostics
//! recorded so far. Backtracking copies that state into a [`Snapshot`] and
//! restores it on failure.

mod decl;
mod expr;
mod ops;
mod recover;
mod stmt;

pub use stmt::range_openness;

use crate::cst::{Node, NodeKind};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::lexer::Lexer;
use crate::options::ParseOptions;
use crate::scanner::FragmentHook;
use crate::token::{Keyword, Span, Token, TokenKind};

/// Output of a parse: the tree is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub module: Node,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Whether the source parsed without any diagnostic.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Parse GreyCat source with default options.
#[must_use]
pub fn parse(source: &str) -> ParseResult {
    parse_with(source, &ParseOptions::default())
}

/// Parse GreyCat source with explicit options.
#[must_use]
pub fn parse_with(source: &str, options: &ParseOptions<'_>) -> ParseResult {
    let mut parser = Parser::new(source, options);
    let module = parser.parse_module();
    log::debug!(
        "parsed {} bytes with {} diagnostics",
        source.len(),
        parser.diagnostics.len()
    );
    ParseResult {
        module,
        diagnostics: parser.diagnostics,
    }
}

pub(crate) type PResult<T> = Result<T, Diagnostic>;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Restrictions: u8 {
        /// Iterator of a `for .. in`: a `[` that opens a range ends the
        /// expression.
        const ITERATOR  = 1 << 0;
        /// Upper bound of a range: `[` only indexes when a range closer
        /// follows the index.
        const RANGE_END = 1 << 1;
    }
}

/// Everything needed to rewind the parser.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot<'src> {
    lexer: Lexer<'src>,
    peeked: Option<Token>,
    trivia_len: usize,
    trivia_cursor: usize,
    diagnostics: usize,
}

impl Snapshot<'_> {
    const fn offset(&self) -> usize {
        match self.peeked {
            Some(token) => token.span.start,
            None => self.lexer.offset(),
        }
    }
}

pub(crate) struct Parser<'src, 'h> {
    source: &'src str,
    lexer: Lexer<'src>,
    peeked: Option<Token>,
    /// Comments and malformed tokens in source order. Entries before
    /// `trivia_cursor` have been attached to a node.
    trivia: Vec<Token>,
    trivia_cursor: usize,
    diagnostics: Vec<Diagnostic>,
    hook: &'h dyn FragmentHook,
    depth: usize,
    max_depth: usize,
    aborted: bool,
}

impl<'src, 'h> Parser<'src, 'h> {
    pub(crate) fn new(source: &'src str, options: &ParseOptions<'h>) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            peeked: None,
            trivia: Vec::new(),
            trivia_cursor: 0,
            diagnostics: Vec::new(),
            hook: options.hook(),
            depth: 0,
            max_depth: options.depth_limit(),
            aborted: false,
        }
    }

    /// Next significant token. Comments and malformed tokens on the way
    /// go to the trivia log; malformed ones are also reported.
    pub(crate) fn peek(&mut self) -> Token {
        if let Some(token) = self.peeked {
            return token;
        }
        loop {
            let token = self.lexer.next_token();
            match token.kind {
                kind if kind.is_trivia() => self.trivia.push(token),
                TokenKind::Error(kind) => {
                    self.diagnostics
                        .push(Diagnostic::new(DiagnosticKind::from(kind), token.span));
                    self.trivia.push(token);
                }
                _ => {
                    self.peeked = Some(token);
                    return token;
                }
            }
        }
    }

    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    /// The token after the next one, without consuming anything.
    pub(crate) fn peek_second(&mut self) -> Token {
        let snapshot = self.snapshot();
        self.bump();
        let token = self.peek();
        self.restore(snapshot);
        token
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.peek();
        self.peeked = None;
        token
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, expected: &'static str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&[expected]))
        }
    }

    pub(crate) fn text(&self, token: &Token) -> &'src str {
        token.text(self.source)
    }

    /// Whether the next token is the word `kw`.
    pub(crate) fn at_keyword(&mut self, kw: Keyword) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Ident && self.text(&token) == kw.as_str()
    }

    /// Keyword spelled by the next token, if any.
    pub(crate) fn peek_keyword(&mut self) -> Option<Keyword> {
        let token = self.peek();
        if token.kind == TokenKind::Ident {
            Keyword::from_word(self.text(&token))
        } else {
            None
        }
    }

    /// Consume the next token as keyword `kw`.
    pub(crate) fn bump_keyword(&mut self, kw: Keyword) -> Token {
        let mut token = self.bump();
        token.kind = TokenKind::Keyword(kw);
        token
    }

    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> Option<Token> {
        if self.at_keyword(kw) {
            Some(self.bump_keyword(kw))
        } else {
            None
        }
    }

    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> PResult<Token> {
        self.eat_keyword(kw)
            .ok_or_else(|| self.unexpected(&[kw.as_str()]))
    }

    /// Whether the next token can be used as a name.
    pub(crate) fn at_ident(&mut self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Ident
            && Keyword::from_word(self.text(&token)).is_none_or(|kw| !kw.is_reserved())
    }

    pub(crate) fn expect_ident(&mut self) -> PResult<Node> {
        if self.at_ident() {
            Ok(Node::leaf(NodeKind::Ident, self.bump()))
        } else {
            Err(self.unexpected(&["identifier"]))
        }
    }

    /// Property names after `.`, `->`, and `::` may be any word.
    pub(crate) fn expect_property(&mut self) -> PResult<Node> {
        if self.at(TokenKind::Ident) {
            Ok(Node::leaf(NodeKind::Ident, self.bump()))
        } else {
            Err(self.unexpected(&["identifier"]))
        }
    }

    pub(crate) fn unexpected(&mut self, expected: &[&'static str]) -> Diagnostic {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text(&token)),
        };
        Diagnostic::new(
            DiagnosticKind::UnexpectedToken {
                found,
                expected: expected.to_vec(),
            },
            token.span,
        )
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        log::debug!("diagnostic: {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Comments collected since the last call, up to the next token.
    pub(crate) fn take_trivia(&mut self) -> Vec<Token> {
        self.peek();
        let pending = self.trivia[self.trivia_cursor..].to_vec();
        self.trivia_cursor = self.trivia.len();
        pending
    }

    fn current_span(&self) -> Span {
        self.peeked.map_or_else(|| self.lexer.here(), |token| token.span)
    }

    pub(crate) const fn snapshot(&self) -> Snapshot<'src> {
        Snapshot {
            lexer: self.lexer,
            peeked: self.peeked,
            trivia_len: self.trivia.len(),
            trivia_cursor: self.trivia_cursor,
            diagnostics: self.diagnostics.len(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot<'src>) {
        self.lexer = snapshot.lexer;
        self.peeked = snapshot.peeked;
        self.trivia.truncate(snapshot.trivia_len);
        self.trivia_cursor = snapshot.trivia_cursor;
        self.diagnostics.truncate(snapshot.diagnostics);
    }

    /// Run `f` as a speculative parse. On a non-fatal failure the parser is
    /// rewound and `None` is returned.
    pub(crate) fn speculate<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<Option<T>> {
        let snapshot = self.snapshot();
        match f(self) {
            Ok(value) => Ok(Some(value)),
            Err(diag) if diag.is_fatal() => Err(diag),
            Err(diag) => {
                log::trace!("backtracking to offset {}: {diag}", snapshot.offset());
                self.restore(snapshot);
                Ok(None)
            }
        }
    }

    /// Run `f` and always rewind afterwards. A non-fatal failure counts as
    /// `false`.
    pub(crate) fn lookahead(
        &mut self,
        f: impl FnOnce(&mut Self) -> PResult<bool>,
    ) -> PResult<bool> {
        let snapshot = self.snapshot();
        let result = f(self);
        self.restore(snapshot);
        match result {
            Err(diag) if diag.is_fatal() => Err(diag),
            Err(_) => Ok(false),
            Ok(found) => Ok(found),
        }
    }

    /// Run `f` one nesting level deeper, failing once the limit is hit.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.deepen()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Charge one nesting level. Trees that grow in a loop (access chains,
    /// operator folds) call this per link, inside [`links`](Self::links).
    pub(crate) fn deepen(&mut self) -> PResult<()> {
        if self.aborted || self.depth >= self.max_depth {
            self.aborted = true;
            return Err(Diagnostic::new(
                DiagnosticKind::RecursionLimitExceeded {
                    limit: self.max_depth,
                },
                self.current_span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `f`, then release every level it charged with
    /// [`deepen`](Self::deepen).
    pub(crate) fn links<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let depth = self.depth;
        let result = f(self);
        self.depth = depth;
        result
    }

    /// Next token in string mode. Only valid right after the opening quote,
    /// an escape, a fragment, or an interpolation's closing brace.
    pub(crate) fn string_token(&mut self) -> Token {
        debug_assert!(self.peeked.is_none());
        self.lexer.next_string_token(self.hook)
    }
}
