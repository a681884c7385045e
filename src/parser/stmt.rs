//! Statements and blocks.

use super::recover::{Boundary, Recover};
use super::{PResult, Parser, Restrictions};
use crate::cst::{Field, Node, NodeBuilder, NodeKind};
use crate::token::{Keyword, Token, TokenKind};

impl Parser<'_, '_> {
    /// `{ statement* }`. A missing `}` at end of input is reported and the
    /// block ends there.
    pub(crate) fn parse_block(&mut self) -> PResult<Node> {
        self.nested(|p| {
            let mut block = NodeBuilder::new(NodeKind::Block);
            block.token(p.expect(TokenKind::LBrace, "'{'")?);
            loop {
                match p.peek_kind() {
                    TokenKind::RBrace => {
                        block.set_extras(p.take_trivia());
                        block.token(p.bump());
                        break;
                    }
                    TokenKind::Eof => {
                        let diag = p.unexpected(&["'}'"]);
                        p.record(diag);
                        block.set_extras(p.take_trivia());
                        break;
                    }
                    _ => {
                        let start = p.snapshot();
                        let stmt = p.parse_statement().or_recover(p, start, Boundary::Block)?;
                        block.node(stmt);
                    }
                }
            }
            Ok(block.finish())
        })
    }

    pub(crate) fn parse_statement(&mut self) -> PResult<Node> {
        self.nested(|p| {
            let extras = p.take_trivia();
            let mut node = match p.peek_keyword() {
                Some(Keyword::Var) => p.parse_var_decl(),
                Some(Keyword::Return) => p.parse_return(),
                Some(Keyword::Throw) => p.parse_throw(),
                Some(kw @ (Keyword::Break | Keyword::Continue)) => p.parse_jump(kw),
                Some(Keyword::Try) => p.parse_try(),
                Some(Keyword::While) => p.parse_while(),
                Some(Keyword::Do) => p.parse_do_while(),
                Some(Keyword::If) => p.parse_if(),
                Some(Keyword::For) => p.parse_for(),
                Some(Keyword::At) if p.peek_second().kind == TokenKind::LParen => {
                    p.parse_at_or_expr()
                }
                _ if p.at(TokenKind::LBrace) => p.parse_block(),
                _ => p.parse_expr_stmt(),
            }?;
            node.extras.splice(0..0, extras);
            Ok(node)
        })
    }

    /// `;` followed by any number of extra `;`.
    pub(crate) fn parse_semi(&mut self, node: &mut NodeBuilder) -> PResult<()> {
        node.token(self.expect(TokenKind::Semi, "';'")?);
        while let Some(extra) = self.eat(TokenKind::Semi) {
            node.node(Node::leaf(NodeKind::ExtraSemi, extra));
        }
        Ok(())
    }

    fn parse_expr_stmt(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ExprStmt);
        node.node(self.parse_expr()?);
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_var_decl(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::VarDecl);
        node.token(self.bump_keyword(Keyword::Var));
        node.field(Field::Name, self.expect_ident()?);
        if self.at(TokenKind::Colon) {
            node.field(Field::Type, self.parse_type_decorator()?);
        }
        if let Some(eq) = self.eat(TokenKind::Eq) {
            let mut init = NodeBuilder::new(NodeKind::Initializer);
            init.token(eq);
            init.node(self.parse_expr()?);
            node.field(Field::Init, init.finish());
        }
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_return(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ReturnStmt);
        node.token(self.bump_keyword(Keyword::Return));
        if !self.at(TokenKind::Semi) {
            node.node(self.parse_expr()?);
        }
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_throw(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ThrowStmt);
        node.token(self.bump_keyword(Keyword::Throw));
        node.node(self.parse_expr()?);
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_jump(&mut self, kw: Keyword) -> PResult<Node> {
        let kind = if kw == Keyword::Break {
            NodeKind::BreakStmt
        } else {
            NodeKind::ContinueStmt
        };
        let mut node = NodeBuilder::new(kind);
        node.token(self.bump_keyword(kw));
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_try(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::TryStmt);
        node.token(self.bump_keyword(Keyword::Try));
        node.field(Field::TryBlock, self.parse_block()?);
        node.token(self.expect_keyword(Keyword::Catch)?);
        if let Some(open) = self.eat(TokenKind::LParen) {
            node.token(open);
            node.field(Field::ErrorParam, self.expect_ident()?);
            node.token(self.expect(TokenKind::RParen, "')'")?);
        }
        node.field(Field::CatchBlock, self.parse_block()?);
        Ok(node.finish())
    }

    /// `at (expr) { }` when the header is followed by a block, otherwise an
    /// expression statement calling `at`.
    fn parse_at_or_expr(&mut self) -> PResult<Node> {
        let header = self.speculate(|p| {
            let kw = p.bump_keyword(Keyword::At);
            let open = p.expect(TokenKind::LParen, "'('")?;
            let expr = p.parse_expr()?;
            let close = p.expect(TokenKind::RParen, "')'")?;
            if p.at(TokenKind::LBrace) {
                Ok((kw, open, expr, close))
            } else {
                Err(p.unexpected(&["'{'"]))
            }
        })?;
        let Some((kw, open, expr, close)) = header else {
            return self.parse_expr_stmt();
        };
        let mut node = NodeBuilder::new(NodeKind::AtStmt);
        node.token(kw);
        node.token(open);
        node.field(Field::Expr, expr);
        node.token(close);
        node.field(Field::Block, self.parse_block()?);
        Ok(node.finish())
    }

    /// `( expr )` around a condition.
    fn parse_condition(&mut self, node: &mut NodeBuilder) -> PResult<()> {
        node.token(self.expect(TokenKind::LParen, "'('")?);
        node.field(Field::Condition, self.parse_expr()?);
        node.token(self.expect(TokenKind::RParen, "')'")?);
        Ok(())
    }

    fn parse_while(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::WhileStmt);
        node.token(self.bump_keyword(Keyword::While));
        self.parse_condition(&mut node)?;
        node.field(Field::Body, self.parse_block()?);
        Ok(node.finish())
    }

    fn parse_do_while(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::DoWhileStmt);
        node.token(self.bump_keyword(Keyword::Do));
        node.field(Field::Body, self.parse_block()?);
        node.token(self.expect_keyword(Keyword::While)?);
        self.parse_condition(&mut node)?;
        self.parse_semi(&mut node)?;
        Ok(node.finish())
    }

    fn parse_if(&mut self) -> PResult<Node> {
        self.nested(|p| {
            let mut node = NodeBuilder::new(NodeKind::IfStmt);
            node.token(p.bump_keyword(Keyword::If));
            p.parse_condition(&mut node)?;
            node.field(Field::ThenBranch, p.parse_block()?);
            if let Some(else_kw) = p.eat_keyword(Keyword::Else) {
                node.token(else_kw);
                let branch = if p.at_keyword(Keyword::If) {
                    p.parse_if()?
                } else {
                    p.parse_block()?
                };
                node.field(Field::ElseBranch, branch);
            }
            Ok(node.finish())
        })
    }

    fn parse_for(&mut self) -> PResult<Node> {
        let for_kw = self.bump_keyword(Keyword::For);
        let open = self.expect(TokenKind::LParen, "'('")?;
        if self.at_keyword(Keyword::Var) {
            self.parse_c_for(for_kw, open)
        } else {
            self.parse_for_in(for_kw, open)
        }
    }

    fn parse_c_for(&mut self, for_kw: Token, open: Token) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ForStmt);
        node.token(for_kw);
        node.token(open);
        node.token(self.bump_keyword(Keyword::Var));
        node.field(Field::ItName, self.expect_ident()?);
        if let Some(colon) = self.eat(TokenKind::Colon) {
            node.token(colon);
            node.field(Field::ItType, self.parse_type_ident()?);
        }
        node.token(self.expect(TokenKind::Eq, "'='")?);
        node.field(Field::ItValue, self.parse_expr()?);
        node.token(self.expect(TokenKind::Semi, "';'")?);
        node.field(Field::ItCondition, self.parse_expr()?);
        node.token(self.expect(TokenKind::Semi, "';'")?);
        node.field(Field::ItIncrement, self.parse_expr()?);
        node.token(self.expect(TokenKind::RParen, "')'")?);
        node.field(Field::Body, self.parse_block()?);
        Ok(node.finish())
    }

    fn parse_for_in(&mut self, for_kw: Token, open: Token) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::ForInStmt);
        node.token(for_kw);
        node.token(open);

        loop {
            let mut param = NodeBuilder::new(NodeKind::ForInParam);
            param.field(Field::Name, self.expect_ident()?);
            if let Some(colon) = self.eat(TokenKind::Colon) {
                param.token(colon);
                param.field(Field::Type, self.parse_type_ident()?);
            }
            node.field(Field::Param, param.finish());
            match self.eat(TokenKind::Comma) {
                Some(comma) => {
                    node.token(comma);
                    if self.at_keyword(Keyword::In) {
                        break;
                    }
                }
                None => break,
            }
        }

        node.token(self.expect_keyword(Keyword::In)?);
        node.field(Field::Iterator, self.parse_expr_with(Restrictions::ITERATOR)?);
        if matches!(self.peek_kind(), TokenKind::LBracket | TokenKind::RBracket) {
            node.field(Field::Range, self.parse_range()?);
        }
        if let Some(marker) = self.eat(TokenKind::Question) {
            node.field(Field::Optional, Node::leaf(NodeKind::Optional, marker));
        }
        for (kw, field) in [
            (Keyword::Sampling, Field::Sampling),
            (Keyword::Limit, Field::Limit),
            (Keyword::Skip, Field::Skip),
        ] {
            if let Some(token) = self.eat_keyword(kw) {
                node.token(token);
                node.field(field, self.parse_expr()?);
            }
        }
        node.token(self.expect(TokenKind::RParen, "')'")?);
        node.field(Field::Body, self.parse_block()?);
        Ok(node.finish())
    }

    /// `]from..to[` style bounds. `]` below and `[` above are open.
    fn parse_range(&mut self) -> PResult<Node> {
        let mut node = NodeBuilder::new(NodeKind::IteratorRange);
        node.token(self.bump());
        if !self.at(TokenKind::DotDot) {
            node.field(Field::From, self.parse_expr()?);
        }
        node.token(self.expect(TokenKind::DotDot, "'..'")?);
        if !matches!(self.peek_kind(), TokenKind::LBracket | TokenKind::RBracket) {
            node.field(Field::To, self.parse_expr_with(Restrictions::RANGE_END)?);
        }
        if matches!(self.peek_kind(), TokenKind::LBracket | TokenKind::RBracket) {
            node.token(self.bump());
            Ok(node.finish())
        } else {
            Err(self.unexpected(&["']'", "'['"]))
        }
    }
}

/// Whether each side of an `iterator_range` node is open (exclusive).
#[must_use]
pub fn range_openness(range: &Node) -> Option<(bool, bool)> {
    if range.kind != NodeKind::IteratorRange {
        return None;
    }
    let mut brackets = range
        .tokens()
        .filter(|t| matches!(t.kind, TokenKind::LBracket | TokenKind::RBracket));
    let lower = brackets.next()?;
    let upper = brackets.next()?;
    Some((
        lower.kind == TokenKind::RBracket,
        upper.kind == TokenKind::LBracket,
    ))
}
