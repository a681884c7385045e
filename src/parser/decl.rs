//! Module-level and type-level declarations, plus type references.

use super::expr::is_link_start;
use super::recover::{Boundary, Recover};
use super::{PResult, Parser};
use crate::cst::{Field, Node, NodeBuilder, NodeKind};
use crate::token::{Keyword, Span, Token, TokenKind};

/// Doc block, annotations, and modifiers in front of a declaration.
struct Prefix {
    extras: Vec<Token>,
    doc: Option<Node>,
    annotations: Option<Node>,
    modifiers: Option<Node>,
}

impl Prefix {
    fn builder(self, kind: NodeKind) -> NodeBuilder {
        let mut node = NodeBuilder::new(kind).extras(self.extras);
        node.opt_node(self.doc);
        node.opt_node(self.annotations);
        node.opt_field(Field::Modifiers, self.modifiers);
        node
    }

    fn is_pragma(&self) -> bool {
        self.modifiers.is_none()
            && self
                .annotations
                .as_ref()
                .is_some_and(|a| a.nodes().count() == 1)
    }
}

impl Parser<'_, '_> {
    pub(crate) fn parse_module(&mut self) -> Node {
        let mut module = NodeBuilder::new(NodeKind::Module).at(Span::empty_at(0, 1, 1));
        while !self.at(TokenKind::Eof) {
            let start = self.snapshot();
            match self
                .parse_module_item()
                .or_recover(self, start, Boundary::Module)
            {
                Ok(item) => module.node(item),
                Err(fatal) => {
                    self.record(fatal);
                    break;
                }
            }
        }
        module.set_extras(self.take_trivia());
        module.finish()
    }

    fn parse_module_item(&mut self) -> PResult<Node> {
        self.nested(|p| {
            let prefix = p.parse_prefix()?;
            if prefix.is_pragma() && p.at(TokenKind::Semi) {
                let mut node = prefix.builder(NodeKind::ModPragma);
                p.parse_semi(&mut node)?;
                return Ok(node.finish());
            }
            match p.peek_keyword() {
                Some(Keyword::Fn) => p.parse_fn_decl(prefix.builder(NodeKind::FnDecl)),
                Some(Keyword::Type) => p.parse_type_decl(prefix.builder(NodeKind::TypeDecl)),
                Some(Keyword::Enum) => p.parse_enum_decl(prefix.builder(NodeKind::EnumDecl)),
                Some(Keyword::Var) => p.parse_mod_var(prefix.builder(NodeKind::ModVar)),
                _ => Err(p.unexpected(&["fn", "type", "enum", "var", "'@'"])),
            }
        })
    }

    /// Comments, doc block, annotations, and modifiers. Doc comments form
    /// the `doc` node; every other comment becomes an extra.
    fn parse_prefix(&mut self) -> PResult<Prefix> {
        let (docs, mut extras): (Vec<Token>, Vec<Token>) = self
            .take_trivia()
            .into_iter()
            .partition(|t| t.kind == TokenKind::DocComment);
        let doc = (!docs.is_empty()).then(|| {
            let mut node = NodeBuilder::new(NodeKind::Doc);
            for token in docs {
                node.token(token);
            }
            node.finish()
        });
        let annotations = self.parse_annotations()?;
        let modifiers = self.parse_modifiers();
        extras.extend(self.take_trivia());
        Ok(Prefix {
            extras,
            doc,
            annotations,
            modifiers,
        })
    }

    /// `@name` or `@name(args)`, repeated.
    fn parse_annotations(&mut self) -> PResult<Option<Node>> {
        if !self.at(TokenKind::At) {
            return Ok(None);
        }
        let mut node = NodeBuilder::new(NodeKind::Annotations);
        while let Some(at) = self.eat(TokenKind::At) {
            let mut annotation = NodeBuilder::new(NodeKind::Annotation);
            annotation.token(at);
            annotation.field(Field::Name, self.expect_property()?);
            if self.at(TokenKind::LParen) {
                annotation.node(self.parse_args()?);
            }
            node.node(annotation.finish());
        }
        Ok(Some(node.finish()))
    }

    fn parse_modifiers(&mut self) -> Option<Node> {
        let mut node = NodeBuilder::new(NodeKind::Modifiers);
        while let Some(kw) = self.peek_keyword().filter(|kw| kw.is_modifier()) {
            // `static: int;` names an attribute
            let next = self.peek_second().kind;
            if matches!(next, TokenKind::Colon | TokenKind::Eq | TokenKind::Semi) {
                break;
            }
            node.token(self.bump_keyword(kw));
        }
        (!node.is_empty()).then(|| node.finish())
    }

    fn parse_fn_decl(&mut self, mut node: NodeBuilder) -> PResult<Node> {
        node.token(self.bump_keyword(Keyword::Fn));
        node.field(Field::Name, self.expect_ident()?);
        if self.at(TokenKind::Lt) {
            node.field(Field::Generics, self.parse_type_params()?);
        }
        node.field(Field::Params, self.parse_decl_params()?);
        if let Some(colon) = self.eat(TokenKind::Colon) {
            node.token(colon);
            node.field(Field::ReturnType, self.parse_type_ident()?);
        }
        if self.at(TokenKind::LBrace) {
            node.field(Field::Body, self.parse_block()?);
        } else {
            self.parse_semi(&mut node)?;
        }
        Ok(node.finish())
    }

    /// `<T, U>` on a function or type declaration.
    fn parse_type_params(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::TypeParams);
        node.token(self.expect(TokenKind::Lt, "'<'")?);
        self.comma_list(&mut node, TokenKind::Gt, "'>'", Self::expect_ident)?;
        Ok(node.finish())
    }

    /// `( name: [typeof] Type, ... )`
    pub(crate) fn parse_fn_params(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::FnParams);
        node.token(self.expect(TokenKind::LParen, "'('")?);
        self.comma_list(&mut node, TokenKind::RParen, "')'", |p| {
            let mut param = NodeBuilder::new(NodeKind::FnParam);
            param.field(Field::Name, p.expect_ident()?);
            param.token(p.expect(TokenKind::Colon, "':'")?);
            if p.at_keyword(Keyword::Typeof) && p.peek_second().kind == TokenKind::Ident {
                param.token(p.bump_keyword(Keyword::Typeof));
            }
            param.field(Field::Type, p.parse_type_ident()?);
            Ok(param.finish())
        })?;
        Ok(node.finish())
    }

    /// Parameter list of a declaration. A broken list becomes an `error`
    /// node reaching up to its `)`, or up to the body if `)` is missing.
    fn parse_decl_params(&mut self) -> PResult<Node> {
        let start = self.snapshot();
        let diagnostic = match self.parse_fn_params() {
            Ok(params) => return Ok(params),
            Err(diagnostic) if diagnostic.is_fatal() => return Err(diagnostic),
            Err(diagnostic) => diagnostic,
        };
        self.restore(start);
        let mut node = NodeBuilder::new(NodeKind::Error).at(self.current_span());
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semi | TokenKind::Eof => break,
                TokenKind::LParen => {
                    depth += 1;
                    node.token(self.bump());
                }
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    node.token(self.bump());
                    if depth == 0 {
                        break;
                    }
                }
                _ => self.skip_token(&mut node),
            }
        }
        let node = node.finish();
        log::debug!(
            "skipped parameter list at {}..{}",
            node.span.start,
            node.span.end
        );
        self.record(diagnostic);
        Ok(node)
    }

    fn parse_type_decl(&mut self, mut node: NodeBuilder) -> PResult<Node> {
        node.token(self.bump_keyword(Keyword::Type));
        node.field(Field::Name, self.expect_ident()?);
        if self.at(TokenKind::Lt) {
            node.field(Field::Generics, self.parse_type_params()?);
        }
        if let Some(extends) = self.eat_keyword(Keyword::Extends) {
            node.token(extends);
            node.field(Field::Supertype, self.parse_type_ident()?);
        }
        node.field(Field::Body, self.parse_type_body()?);
        Ok(node.finish())
    }

    fn parse_type_body(&mut self) -> PResult<Node> {
        self.nested(|p| {
            let mut body = NodeBuilder::new(NodeKind::TypeBody);
            body.token(p.expect(TokenKind::LBrace, "'{'")?);
            loop {
                match p.peek_kind() {
                    TokenKind::RBrace => {
                        body.set_extras(p.take_trivia());
                        body.token(p.bump());
                        break;
                    }
                    TokenKind::Eof => {
                        let diag = p.unexpected(&["'}'"]);
                        p.record(diag);
                        body.set_extras(p.take_trivia());
                        break;
                    }
                    _ => {
                        let start = p.snapshot();
                        let member = p
                            .parse_type_member()
                            .or_recover(p, start, Boundary::TypeBody)?;
                        body.node(member);
                    }
                }
            }
            Ok(body.finish())
        })
    }

    fn parse_type_member(&mut self) -> PResult<Node> {
        self.nested(|p| {
            let prefix = p.parse_prefix()?;
            if p.at_keyword(Keyword::Fn) {
                p.parse_fn_decl(prefix.builder(NodeKind::TypeMethod))
            } else if p.at_ident() {
                p.parse_type_attr(prefix.builder(NodeKind::TypeAttr))
            } else {
                Err(p.unexpected(&["fn", "identifier"]))
            }
        })
    }

    /// `name [: Type] [= init];`
    fn parse_type_attr(&mut self, mut node: NodeBuilder) -> PResult<Node> {
        node.field(Field::Name, self.expect_ident()?);
        if let Some(colon) = self.eat(TokenKind::Colon) {
            let mut ty = NodeBuilder::new(NodeKind::AttrType);
            ty.token(colon);
            ty.node(self.parse_type_ident()?);
            node.field(Field::Type, ty.finish());
        }
        if let Some(eq) = self.eat(TokenKind::Eq) {
            let mut init = NodeBuilder::new(NodeKind::AttrInit);
            init.token(eq);
            init.node(self.parse_expr()?);
            node.field(Field::Init, init.finish());
        }
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_enum_decl(&mut self, mut node: NodeBuilder) -> PResult<Node> {
        node.token(self.bump_keyword(Keyword::Enum));
        node.field(Field::Name, self.expect_ident()?);

        let mut body = NodeBuilder::new(NodeKind::EnumBody);
        body.token(self.expect(TokenKind::LBrace, "'{'")?);
        loop {
            if self.at(TokenKind::RBrace) {
                body.set_extras(self.take_trivia());
                body.token(self.bump());
                break;
            }
            let mut field = NodeBuilder::new(NodeKind::EnumField).extras(self.take_trivia());
            field.field(Field::Name, self.expect_ident()?);
            if let Some(open) = self.eat(TokenKind::LParen) {
                field.token(open);
                field.field(Field::Value, self.parse_expr()?);
                field.token(self.expect(TokenKind::RParen, "')'")?);
            }
            body.node(field.finish());
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::Semi => body.token(self.bump()),
                TokenKind::RBrace => {}
                _ => return Err(self.unexpected(&["','", "';'", "'}'"])),
            }
        }
        node.field(Field::Body, body.finish());
        Ok(node.finish())
    }

    /// `var name: Type;` at module scope.
    fn parse_mod_var(&mut self, mut node: NodeBuilder) -> PResult<Node> {
        node.token(self.bump_keyword(Keyword::Var));
        node.field(Field::Name, self.expect_ident()?);
        node.token(self.expect(TokenKind::Colon, "':'")?);
        node.field(Field::Type, self.parse_type_ident()?);
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    /// `: Type` after a local variable name.
    pub(crate) fn parse_type_decorator(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::TypeDecorator);
        node.token(self.expect(TokenKind::Colon, "':'")?);
        node.node(self.parse_type_ident()?);
        Ok(node.finish())
    }

    pub(crate) fn parse_type_ident(&mut self) -> PResult<Node> {
        self.type_ident(false)
    }

    /// `Name[<T, ...>][?]`. With `speculative`, a `<` that does not open a
    /// well-formed argument list is left alone.
    pub(crate) fn type_ident(&mut self, speculative: bool) -> PResult<Node> {
        let name = self.expect_ident()?;
        self.type_ident_rest(name, speculative)
    }

    pub(crate) fn type_ident_rest(&mut self, name: Node, speculative: bool) -> PResult<Node> {
        self.nested(|p| {
            let mut node = NodeBuilder::new(NodeKind::TypeIdent);
            node.field(Field::Name, name);
            if p.at(TokenKind::Lt) {
                if speculative {
                    let mut attempt = node.clone();
                    if p.speculate(|p| p.type_args(&mut attempt))?.is_some() {
                        node = attempt;
                    }
                } else {
                    p.type_args(&mut node)?;
                }
            }
            if p.at(TokenKind::Question) && !is_link_start(p.peek_second().kind) {
                node.field(Field::Optional, Node::leaf(NodeKind::Optional, p.bump()));
            }
            Ok(node.finish())
        })
    }

    fn type_args(&mut self, node: &mut NodeBuilder) -> PResult<()> {
        node.token(self.expect(TokenKind::Lt, "'<'")?);
        self.comma_list(node, TokenKind::Gt, "'>'", |p| p.type_ident(false))
    }
}
