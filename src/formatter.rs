//! Pretty-printer that re-emits a CST as canonical GreyCat source.
//!
//! Produces tab-indented output with one declaration or statement per line
//! and a blank line between module-level declarations. Token text comes
//! from the original source; only the whitespace between tokens changes.
//! Comments are printed on their own lines ahead of the node they are
//! attached to.

use crate::cst::{Element, Node, NodeKind};
use crate::lexer::is_ident_byte;
use crate::token::{Token, TokenKind};

/// Render a tree back into source text.
///
/// ```
/// let src = "fn main(){print( \"hi\" ) ;}";
/// let result = greycat_syntax::parse(src);
/// let out = greycat_syntax::render(&result.module, src);
/// assert_eq!(out, "fn main() {\n\tprint(\"hi\");\n}\n");
/// ```
#[must_use]
pub fn render(node: &Node, source: &str) -> String {
    let mut printer = Printer::new(source);
    printer.node(node);
    printer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spacing {
    Auto,
    Glue,
    Space,
}

struct Printer<'s> {
    source: &'s str,
    out: String,
    indent: usize,
    line_start: bool,
    /// Suppress the space before the next token.
    glue: bool,
    prev: Option<Token>,
}

impl<'s> Printer<'s> {
    const fn new(source: &'s str) -> Self {
        Self {
            source,
            out: String::new(),
            indent: 0,
            line_start: true,
            glue: false,
            prev: None,
        }
    }

    fn finish(mut self) -> String {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    fn line(&mut self) {
        if !self.line_start {
            self.out.push('\n');
            self.line_start = true;
            self.glue = false;
        }
    }

    fn blank_line(&mut self) {
        self.line();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn comment(&mut self, token: &Token) {
        self.line();
        self.token(token, Spacing::Auto);
        self.line();
    }

    fn token(&mut self, token: &Token, spacing: Spacing) {
        let text = token.text(self.source);
        if self.line_start {
            for _ in 0..self.indent {
                self.out.push('\t');
            }
            self.line_start = false;
        } else if let Some(prev) = self.prev {
            let in_string = string_inner_after(prev.kind) || string_inner_before(token.kind);
            let glued = match spacing {
                Spacing::Glue => true,
                Spacing::Space => false,
                Spacing::Auto => {
                    self.glue || no_space_after(prev.kind) || no_space_before(token.kind)
                }
            };
            if !in_string && (!glued || would_merge(prev.text(self.source), text)) {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
        self.prev = Some(*token);
        self.glue = false;
    }

    fn node(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Module => self.module(node),
            NodeKind::Block | NodeKind::TypeBody | NodeKind::EnumBody => self.braced(node),
            NodeKind::Doc => {
                for token in node.tokens() {
                    self.comment(token);
                }
            }
            _ => self.children(node),
        }
    }

    fn module(&mut self, module: &Node) {
        for (i, item) in module.nodes().enumerate() {
            if i > 0 {
                self.blank_line();
            }
            self.item(item);
        }
        for extra in &module.extras {
            self.comment(extra);
        }
    }

    /// A declaration, member, statement, or enum field on a fresh line.
    fn item(&mut self, node: &Node) {
        self.line();
        let braced = is_braced(node.kind);
        for extra in node
            .extras
            .iter()
            .filter(|e| !braced || e.span.start < node.span.start)
        {
            self.comment(extra);
        }
        self.node(node);
    }

    fn braced(&mut self, node: &Node) {
        let mut open = false;
        let mut closed = false;
        let empty = node.nodes().next().is_none()
            && node.extras.iter().all(|e| e.span.start < node.span.start);
        for child in &node.children {
            match &child.element {
                Element::Token(token) if !open && token.kind == TokenKind::LBrace => {
                    self.token(token, Spacing::Auto);
                    self.indent += 1;
                    open = true;
                }
                Element::Token(token) if token.kind == TokenKind::RBrace => {
                    self.close(node, empty);
                    self.token(token, Spacing::Auto);
                    closed = true;
                }
                Element::Token(token) => self.token(token, Spacing::Auto),
                Element::Node(item) => self.item(item),
            }
        }
        if open && !closed {
            self.close(node, empty);
        }
    }

    fn close(&mut self, node: &Node, empty: bool) {
        for extra in node
            .extras
            .iter()
            .filter(|e| e.span.start >= node.span.start)
        {
            self.comment(extra);
        }
        self.indent = self.indent.saturating_sub(1);
        if !empty {
            self.line();
        }
    }

    fn children(&mut self, node: &Node) {
        let last = node.children.len().saturating_sub(1);
        for (i, child) in node.children.iter().enumerate() {
            match &child.element {
                Element::Node(inner) => self.node(inner),
                Element::Token(token) => {
                    let (spacing, glue_after) = contextual(node.kind, token.kind, i, last);
                    self.token(token, spacing);
                    self.glue = glue_after;
                }
            }
        }
    }
}

const fn is_braced(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Block | NodeKind::TypeBody | NodeKind::EnumBody)
}

/// Spacing before a token and whether the next token sticks to it, given
/// the node that owns the token.
const fn contextual(
    parent: NodeKind,
    kind: TokenKind,
    index: usize,
    last: usize,
) -> (Spacing, bool) {
    match (parent, kind) {
        (NodeKind::Args | NodeKind::FnParams, TokenKind::LParen) if index == 0 => {
            (Spacing::Glue, false)
        }
        (NodeKind::EnumField, TokenKind::LParen) => (Spacing::Glue, false),
        (NodeKind::TypeParams | NodeKind::TypeIdent, TokenKind::Lt) => (Spacing::Glue, true),
        (NodeKind::TypeParams | NodeKind::TypeIdent, TokenKind::Gt) => (Spacing::Glue, false),
        (NodeKind::OffsetExpr, TokenKind::LBracket) => (Spacing::Glue, false),
        (NodeKind::UnaryExpr, _) if index == 0 => (Spacing::Auto, true),
        (NodeKind::PostfixExpr, _) => (Spacing::Glue, false),
        (NodeKind::IteratorRange, _) if index == 0 => (Spacing::Space, true),
        (NodeKind::IteratorRange, _) if index == last => (Spacing::Glue, false),
        _ => (Spacing::Auto, false),
    }
}

const fn no_space_before(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Comma
            | TokenKind::Semi
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::Colon
            | TokenKind::ColonColon
            | TokenKind::Dot
            | TokenKind::DotDot
            | TokenKind::Arrow
            | TokenKind::Question
    )
}

const fn no_space_after(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Dot
            | TokenKind::DotDot
            | TokenKind::Arrow
            | TokenKind::ColonColon
            | TokenKind::At
    )
}

/// Tokens after which the lexer is still inside a string literal.
const fn string_inner_after(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::StringOpen
            | TokenKind::StringFragment
            | TokenKind::StringEscape
            | TokenKind::InterpolationStart
            | TokenKind::Error(_)
    )
}

/// Tokens that only occur inside a string literal.
const fn string_inner_before(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::StringFragment
            | TokenKind::StringEscape
            | TokenKind::StringClose
            | TokenKind::InterpolationStart
            | TokenKind::InterpolationEnd
            | TokenKind::Error(_)
    )
}

/// Whether two tokens written back to back would lex differently.
fn would_merge(prev: &str, next: &str) -> bool {
    let (Some(a), Some(b)) = (prev.bytes().last(), next.bytes().next()) else {
        return false;
    };
    if is_ident_byte(a) && is_ident_byte(b) {
        return true;
    }
    matches!(
        [a, b],
        [b':', b':']
            | [b'.', b'.']
            | [b'-', b'>' | b'-']
            | [b'?', b'?' | b'=']
            | [b'=' | b'!' | b'<' | b'>', b'=']
            | [b'!', b'!']
            | [b'+', b'+']
            | [b'&', b'&']
            | [b'|', b'|']
            | [b'/', b'/' | b'*']
    )
}
