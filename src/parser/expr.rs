//! Expressions: precedence climbing over the operator table, primaries,
//! access chains, object construction, and string literals.

use super::ops::{self, OpToken};
use super::{PResult, Parser, Restrictions};
use crate::cst::{Field, Node, NodeBuilder, NodeKind};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::lexer::LexErrorKind;
use crate::token::{Keyword, Span, Token, TokenKind};

impl Parser<'_, '_> {
    pub(crate) fn parse_expr(&mut self) -> PResult<Node> {
        self.parse_expr_with(Restrictions::empty())
    }

    pub(crate) fn parse_expr_with(&mut self, restrictions: Restrictions) -> PResult<Node> {
        self.parse_binary(0, restrictions)
    }

    /// Every fold deepens the left operand, so each one is charged
    /// against the nesting limit.
    fn parse_binary(&mut self, min: u8, restrictions: Restrictions) -> PResult<Node> {
        self.nested(|p| p.links(|p| p.fold_binary(min, restrictions)))
    }

    fn fold_binary(&mut self, min: u8, restrictions: Restrictions) -> PResult<Node> {
        let mut lhs = self.parse_unary(restrictions)?;
        loop {
            let token = self.peek();
            if ops::is_postfix(token.kind) && ops::POSTFIX >= min {
                self.deepen()?;
                let operator = self.bump();
                let mut node = NodeBuilder::new(NodeKind::PostfixExpr);
                node.field(Field::Operand, lhs);
                node.field_token(Field::Operator, operator);
                lhs = node.finish();
                continue;
            }

            let Some(op) = ops::binary(token.kind, self.text(&token)) else {
                break;
            };
            if op.precedence < min {
                break;
            }
            self.deepen()?;
            let operator = match op.token {
                OpToken::Word(kw) => self.bump_keyword(kw),
                OpToken::Punct(_) => self.bump(),
            };
            let rhs = if op.type_operand {
                self.type_ident(true)?
            } else {
                self.parse_binary(op.right_min(), restrictions)?
            };

            let mut node = NodeBuilder::new(NodeKind::BinaryExpr);
            node.field(Field::Left, lhs);
            node.field_token(Field::Operator, operator);
            node.field(Field::Right, rhs);
            lhs = node.finish();
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self, restrictions: Restrictions) -> PResult<Node> {
        if !ops::is_prefix(self.peek_kind()) {
            let primary = self.parse_primary()?;
            return self.parse_chain(primary, restrictions);
        }

        self.nested(|p| {
            let operator = p.bump();
            if operator.kind == TokenKind::BangBang {
                // prefix `!!` is two negations
                let (outer, inner) = split_bang_bang(operator);
                let operand = p.parse_unary(restrictions)?;
                return Ok(unary(outer, unary(inner, operand)));
            }
            let operand = p.parse_unary(restrictions)?;
            Ok(unary(operator, operand))
        })
    }

    fn parse_primary(&mut self) -> PResult<Node> {
        let token = self.peek();
        match token.kind {
            TokenKind::Number { .. } => Ok(Node::leaf(NodeKind::Number, self.bump())),
            TokenKind::Duration => Ok(Node::leaf(NodeKind::Duration, self.bump())),
            TokenKind::Char => Ok(Node::leaf(NodeKind::Char, self.bump())),
            TokenKind::StringOpen => self.parse_string(),
            TokenKind::LParen => self.parse_paren(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Ident => self.parse_word(),
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    fn parse_word(&mut self) -> PResult<Node> {
        match self.peek_keyword() {
            Some(kw @ (Keyword::True | Keyword::False | Keyword::Null | Keyword::This)) => {
                let kind = match kw {
                    Keyword::True => NodeKind::True,
                    Keyword::False => NodeKind::False,
                    Keyword::Null => NodeKind::Null,
                    _ => NodeKind::This,
                };
                Ok(Node::leaf(kind, self.bump_keyword(kw)))
            }
            Some(Keyword::Fn) => self.parse_lambda(),
            Some(kw) if kw.is_reserved() => Err(self.unexpected(&["expression"])),
            _ => self.parse_name_expr(),
        }
    }

    /// An identifier, possibly the start of a generic type reference or an
    /// object construction.
    fn parse_name_expr(&mut self) -> PResult<Node> {
        let name = self.expect_ident()?;
        match self.peek_kind() {
            TokenKind::Lt => {
                let candidate = name.clone();
                let ty = self.speculate(|p| {
                    let ty = p.type_ident_rest(candidate, false)?;
                    if matches!(p.peek_kind(), TokenKind::LBrace | TokenKind::ColonColon) {
                        Ok(ty)
                    } else {
                        Err(p.unexpected(&["'{'", "'::'"]))
                    }
                })?;
                match ty {
                    Some(ty) if self.at(TokenKind::LBrace) => self.parse_object(ty),
                    Some(ty) => Ok(ty),
                    None => Ok(name),
                }
            }
            TokenKind::LBrace => {
                let ty = type_ident_from(name.clone());
                Ok(self.speculate(|p| p.parse_object(ty))?.unwrap_or(name))
            }
            _ => Ok(name),
        }
    }

    /// Object construction after its type reference. The first item decides
    /// the form: named fields when a `:` follows it, positional otherwise.
    fn parse_object(&mut self, ty: Node) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ObjectExpr);
        node.field(Field::Type, ty);
        let open = self.expect(TokenKind::LBrace, "'{'")?;
        if let Some(close) = self.eat(TokenKind::RBrace) {
            let mut fields = NodeBuilder::new(NodeKind::ObjectFields);
            fields.token(open);
            fields.token(close);
            node.node(fields.finish());
            return Ok(node.finish());
        }

        let first = self.parse_expr()?;
        let body = if let Some(colon) = self.eat(TokenKind::Colon) {
            let mut fields = NodeBuilder::new(NodeKind::ObjectFields);
            fields.token(open);
            fields.node(self.object_field_value(first, colon)?);
            self.comma_tail(&mut fields, TokenKind::RBrace, "'}'", |p| {
                let name = p.parse_expr()?;
                let colon = p.expect(TokenKind::Colon, "':'")?;
                p.object_field_value(name, colon)
            })?;
            fields
        } else {
            let mut items = NodeBuilder::new(NodeKind::ObjectInitializers);
            items.token(open);
            items.node(first);
            self.comma_tail(&mut items, TokenKind::RBrace, "'}'", Self::parse_expr)?;
            items
        };
        node.node(body.finish());
        Ok(node.finish())
    }

    fn object_field_value(&mut self, name: Node, colon: Token) -> PResult<Node> {
        let mut field = NodeBuilder::new(NodeKind::ObjectField);
        field.field(Field::Name, name);
        field.token(colon);
        field.field(Field::Value, self.parse_expr()?);
        Ok(field.finish())
    }

    /// Items separated by `,` up to `close`, trailing comma allowed. The
    /// opening token must already be in `node`.
    pub(crate) fn comma_list(
        &mut self,
        node: &mut NodeBuilder,
        close: TokenKind,
        close_text: &'static str,
        mut item: impl FnMut(&mut Self) -> PResult<Node>,
    ) -> PResult<()> {
        if let Some(token) = self.eat(close) {
            node.token(token);
            return Ok(());
        }
        node.node(item(self)?);
        self.comma_tail(node, close, close_text, item)
    }

    /// The rest of a comma list once its first item is in `node`.
    fn comma_tail(
        &mut self,
        node: &mut NodeBuilder,
        close: TokenKind,
        close_text: &'static str,
        mut item: impl FnMut(&mut Self) -> PResult<Node>,
    ) -> PResult<()> {
        loop {
            if let Some(comma) = self.eat(TokenKind::Comma) {
                node.token(comma);
            } else if let Some(token) = self.eat(close) {
                node.token(token);
                return Ok(());
            } else {
                return Err(self.unexpected(&["','", close_text]));
            }
            if let Some(token) = self.eat(close) {
                node.token(token);
                return Ok(());
            }
            node.node(item(self)?);
        }
    }

    /// Member, arrow, static, index, and call links, left to right. Each
    /// link counts as one nesting level.
    fn parse_chain(&mut self, lhs: Node, restrictions: Restrictions) -> PResult<Node> {
        self.links(|p| p.chain_links(lhs, restrictions))
    }

    fn chain_links(&mut self, mut lhs: Node, restrictions: Restrictions) -> PResult<Node> {
        loop {
            lhs = match self.peek_kind() {
                TokenKind::Dot | TokenKind::Arrow => self.parse_access(lhs, None, restrictions)?,
                TokenKind::LBracket => {
                    if !self.index_allowed(restrictions)? {
                        break;
                    }
                    self.parse_offset(lhs, None, restrictions)?
                }
                TokenKind::LParen if is_callable(lhs.kind) => self.parse_call(lhs)?,
                TokenKind::ColonColon
                    if matches!(
                        lhs.kind,
                        NodeKind::Ident | NodeKind::TypeIdent | NodeKind::StaticExpr
                    ) =>
                {
                    self.parse_static(lhs, restrictions)?
                }
                TokenKind::Question => {
                    let next = self.peek_second().kind;
                    if !is_link_start(next) {
                        break;
                    }
                    let marker = Node::leaf(NodeKind::Optional, self.bump());
                    if next == TokenKind::LBracket {
                        self.parse_offset(lhs, Some(marker), restrictions)?
                    } else {
                        self.parse_access(lhs, Some(marker), restrictions)?
                    }
                }
                _ => break,
            };
        }
        Ok(lhs)
    }

    fn parse_access(
        &mut self,
        object: Node,
        optional: Option<Node>,
        restrictions: Restrictions,
    ) -> PResult<Node> {
        self.deepen()?;
        let operator = self.bump();
        let kind = if operator.kind == TokenKind::Dot {
            NodeKind::MemberExpr
        } else {
            NodeKind::ArrowExpr
        };
        let mut node = NodeBuilder::new(kind);
        node.field(Field::Object, object);
        node.opt_field(Field::Optional, optional);
        node.token(operator);
        node.field(Field::Property, self.expect_property()?);
        self.trailing_optional(&mut node, restrictions);
        Ok(node.finish())
    }

    fn parse_offset(
        &mut self,
        object: Node,
        optional: Option<Node>,
        restrictions: Restrictions,
    ) -> PResult<Node> {
        self.deepen()?;
        let mut node = NodeBuilder::new(NodeKind::OffsetExpr);
        node.field(Field::Object, object);
        node.opt_field(Field::Optional, optional);
        node.token(self.expect(TokenKind::LBracket, "'['")?);
        node.field(Field::Index, self.parse_expr()?);
        node.token(self.expect(TokenKind::RBracket, "']'")?);
        self.trailing_optional(&mut node, restrictions);
        Ok(node.finish())
    }

    /// A `?` right after a link marks that link, unless it introduces the
    /// next one. Inside an iterator it is left for the `for` header.
    fn trailing_optional(&mut self, node: &mut NodeBuilder, restrictions: Restrictions) {
        if restrictions.contains(Restrictions::ITERATOR) || !self.at(TokenKind::Question) {
            return;
        }
        if !is_link_start(self.peek_second().kind) {
            let marker = self.bump();
            node.field(Field::Optional, Node::leaf(NodeKind::Optional, marker));
        }
    }

    fn index_allowed(&mut self, restrictions: Restrictions) -> PResult<bool> {
        if restrictions.contains(Restrictions::ITERATOR) {
            // `coll [0..10]` is a range, not an index
            let is_range = self.lookahead(|p| {
                p.bump();
                if p.at(TokenKind::DotDot) {
                    return Ok(true);
                }
                p.parse_expr()?;
                Ok(p.at(TokenKind::DotDot))
            })?;
            return Ok(!is_range);
        }
        if restrictions.contains(Restrictions::RANGE_END) {
            return self.lookahead(|p| {
                p.bump();
                p.parse_expr()?;
                p.expect(TokenKind::RBracket, "']'")?;
                Ok(matches!(p.peek_kind(), TokenKind::RBracket | TokenKind::LBracket))
            });
        }
        Ok(true)
    }

    fn parse_static(&mut self, object: Node, restrictions: Restrictions) -> PResult<Node> {
        self.deepen()?;
        let object = if object.kind == NodeKind::Ident {
            type_ident_from(object)
        } else {
            object
        };
        let mut node = NodeBuilder::new(NodeKind::StaticExpr);
        node.field(Field::Object, object);
        node.token(self.expect(TokenKind::ColonColon, "'::'")?);
        node.field(Field::Property, self.expect_property()?);
        self.trailing_optional(&mut node, restrictions);
        Ok(node.finish())
    }

    fn parse_call(&mut self, callee: Node) -> PResult<Node> {
        self.deepen()?;
        let mut node = NodeBuilder::new(NodeKind::CallExpr);
        node.field(Field::Fn, callee);
        node.node(self.parse_args()?);
        Ok(node.finish())
    }

    /// `( expr, ... )`
    pub(crate) fn parse_args(&mut self) -> PResult<Node> {
        let mut args = NodeBuilder::new(NodeKind::Args);
        args.token(self.expect(TokenKind::LParen, "'('")?);
        self.comma_list(&mut args, TokenKind::RParen, "')'", Self::parse_expr)?;
        Ok(args.finish())
    }

    fn parse_paren(&mut self) -> PResult<Node> {
        let open = self.bump();
        let first = self.parse_expr()?;
        if let Some(comma) = self.eat(TokenKind::Comma) {
            let second = self.parse_expr()?;
            let mut node = NodeBuilder::new(NodeKind::TupleExpr);
            node.token(open);
            node.field(Field::Left, first);
            node.token(comma);
            node.field(Field::Right, second);
            node.token(self.expect(TokenKind::RParen, "')'")?);
            return Ok(node.finish());
        }
        let mut node = NodeBuilder::new(NodeKind::ParenExpr);
        node.token(open);
        node.field(Field::Expr, first);
        node.token(self.expect(TokenKind::RParen, "')'")?);
        Ok(node.finish())
    }

    fn parse_array(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ArrayExpr);
        node.token(self.bump());
        self.comma_list(&mut node, TokenKind::RBracket, "']'", Self::parse_expr)?;
        Ok(node.finish())
    }

    fn parse_lambda(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::LambdaExpr);
        node.token(self.bump_keyword(Keyword::Fn));
        node.field(Field::Params, self.parse_fn_params()?);
        if let Some(colon) = self.eat(TokenKind::Colon) {
            node.token(colon);
            node.field(Field::ReturnType, self.parse_type_ident()?);
        }
        node.field(Field::Body, self.parse_block()?);
        Ok(node.finish())
    }

    /// String literal, switching the lexer into string mode until the
    /// closing quote.
    pub(crate) fn parse_string(&mut self) -> PResult<Node> {
        let open = self.expect(TokenKind::StringOpen, "string")?;
        let mut node = NodeBuilder::new(NodeKind::String);
        node.token(open);
        loop {
            let token = self.string_token();
            match token.kind {
                TokenKind::StringClose => {
                    node.token(token);
                    return Ok(node.finish());
                }
                TokenKind::StringFragment => {
                    node.node(Node::leaf(NodeKind::StringFragment, token));
                }
                TokenKind::StringEscape => {
                    node.node(Node::leaf(NodeKind::StringEscapeSequence, token));
                }
                TokenKind::Error(LexErrorKind::InvalidEscape) => {
                    self.record(Diagnostic::new(DiagnosticKind::InvalidEscape, token.span));
                    node.node(Node::leaf(NodeKind::StringEscapeSequence, token));
                }
                TokenKind::InterpolationStart => {
                    let substitution = self.parse_substitution(token)?;
                    let closed = substitution.token_of(TokenKind::InterpolationEnd).is_some();
                    node.node(substitution);
                    if !closed {
                        let mut close = self.bump();
                        close.kind = TokenKind::StringClose;
                        node.token(close);
                        return Ok(node.finish());
                    }
                }
                _ => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::UnterminatedString,
                        open.span.cover(token.span),
                    ));
                }
            }
        }
    }

    fn parse_substitution(&mut self, start: Token) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::StringSubstitution);
        node.token(start);
        node.field(Field::Expr, self.parse_expr()?);
        match self.peek_kind() {
            TokenKind::RBrace => {
                let mut end = self.bump();
                end.kind = TokenKind::InterpolationEnd;
                node.token(end);
                Ok(node.finish())
            }
            TokenKind::StringOpen => {
                // the quote closes the string around an unclosed `${`
                self.record(Diagnostic::new(DiagnosticKind::UnbalancedInterpolation, start.span));
                Ok(node.finish())
            }
            TokenKind::Eof => Err(Diagnostic::new(
                DiagnosticKind::UnbalancedInterpolation,
                start.span,
            )),
            _ => Err(self.unexpected(&["'}'"])),
        }
    }
}

fn unary(operator: Token, operand: Node) -> Node {
    let mut node = NodeBuilder::new(NodeKind::UnaryExpr);
    node.field_token(Field::Operator, operator);
    node.field(Field::Operand, operand);
    node.finish()
}

fn split_bang_bang(token: Token) -> (Token, Token) {
    let span = token.span;
    let first = Token::new(
        TokenKind::Bang,
        Span::new(span.start, span.start + 1, span.line, span.column),
    );
    let second = Token::new(
        TokenKind::Bang,
        Span::new(span.start + 1, span.end, span.line, span.column + 1),
    );
    (first, second)
}

pub(crate) fn type_ident_from(name: Node) -> Node {
    let mut node = NodeBuilder::new(NodeKind::TypeIdent);
    node.field(Field::Name, name);
    node.finish()
}

const fn is_callable(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Ident | NodeKind::MemberExpr | NodeKind::ArrowExpr | NodeKind::StaticExpr
    )
}

pub(crate) const fn is_link_start(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Dot | TokenKind::Arrow | TokenKind::LBracket)
}

#[cfg(test)]
mod tests {
    use crate::cst::{Field, NodeKind};
    use crate::parser::parse;

    fn expr_sexp(src: &str) -> String {
        let source = format!("fn f() {{ {src}; }}");
        let result = parse(&source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let stmt = result
            .module
            .find(NodeKind::ExprStmt)
            .expect("expression statement");
        stmt.nodes().next().expect("expression").to_sexp()
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(
            expr_sexp("a + b * c"),
            "(binary_expr left: (ident) right: (binary_expr left: (ident) right: (ident)))"
        );
    }

    #[test]
    fn left_associative() {
        assert_eq!(
            expr_sexp("a - b - c"),
            "(binary_expr left: (binary_expr left: (ident) right: (ident)) right: (ident))"
        );
    }

    #[test]
    fn assignment_is_lowest() {
        assert_eq!(
            expr_sexp("x = a || b"),
            "(binary_expr left: (ident) right: (binary_expr left: (ident) right: (ident)))"
        );
    }

    #[test]
    fn prefix_then_postfix() {
        assert_eq!(
            expr_sexp("-a++"),
            "(postfix_expr operand: (unary_expr operand: (ident)))"
        );
    }

    #[test]
    fn prefix_bang_bang_splits() {
        assert_eq!(
            expr_sexp("!!a"),
            "(unary_expr operand: (unary_expr operand: (ident)))"
        );
    }

    #[test]
    fn postfix_bang_bang() {
        assert_eq!(expr_sexp("a!!"), "(postfix_expr operand: (ident))");
    }

    #[test]
    fn type_check_operand_is_a_type() {
        assert_eq!(
            expr_sexp("x is Array<int>"),
            "(binary_expr left: (ident) right: (type_ident name: (ident) (type_ident name: (ident))))"
        );
    }

    #[test]
    fn optional_chain_nests() {
        assert_eq!(
            expr_sexp("a?.b?.c"),
            "(member_expr object: (member_expr object: (ident) optional: (optional) property: (ident)) optional: (optional) property: (ident))"
        );
    }

    #[test]
    fn access_chain_and_call() {
        assert_eq!(
            expr_sexp("a.b->c(1)[0]"),
            "(offset_expr object: (call_expr fn: (arrow_expr object: (member_expr object: (ident) property: (ident)) property: (ident)) (args (number))) index: (number))"
        );
    }

    #[test]
    fn static_access_and_call() {
        assert_eq!(
            expr_sexp("Foo::bar(1)"),
            "(call_expr fn: (static_expr object: (type_ident name: (ident)) property: (ident)) (args (number)))"
        );
    }

    #[test]
    fn generic_object() {
        let sexp = expr_sexp("f(Type<A, B> { })");
        assert!(sexp.contains("(object_expr type: (type_ident name: (ident) (type_ident name: (ident)) (type_ident name: (ident))) (object_fields))"));
    }

    #[test]
    fn comparisons_not_generics() {
        assert_eq!(
            expr_sexp("f(a < b, c > d)"),
            "(call_expr fn: (ident) (args (binary_expr left: (ident) right: (ident)) (binary_expr left: (ident) right: (ident))))"
        );
    }

    #[test]
    fn positional_object() {
        assert_eq!(
            expr_sexp("Point { 1, 2 }"),
            "(object_expr type: (type_ident name: (ident)) (object_initializers (number) (number)))"
        );
    }

    #[test]
    fn tuple_and_lambda() {
        assert_eq!(
            expr_sexp("(1, 2)"),
            "(tuple_expr left: (number) right: (number))"
        );
        assert_eq!(
            expr_sexp("fn(x: int) { return x; }"),
            "(lambda_expr params: (fn_params (fn_param name: (ident) type: (type_ident name: (ident)))) body: (block (return_stmt (ident))))"
        );
    }

    #[test]
    fn keyword_literals() {
        assert_eq!(
            expr_sexp("[true, false, null, this,]"),
            "(array_expr (true) (false) (null) (this))"
        );
    }

    #[test]
    fn interpolation() {
        assert_eq!(
            expr_sexp(r#""a${b + 1}c""#),
            "(string (string_fragment) (string_substitution expr: (binary_expr left: (ident) right: (number))) (string_fragment))"
        );
    }

    #[test]
    fn unary_operator_field() {
        let result = parse("fn f() { -x; }");
        let unary = result.module.find(NodeKind::UnaryExpr).expect("unary");
        assert!(unary.field_token(Field::Operator).is_some());
    }
}
