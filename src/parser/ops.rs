//! Operator table for expression parsing, highest precedence first.

use crate::token::{Keyword, TokenKind};

/// Binding power of postfix `-- ++ !!`.
pub(crate) const POSTFIX: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpToken {
    Punct(TokenKind),
    Word(Keyword),
}

/// One binary operator row. Every binary operator is left-associative.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinaryOp {
    pub(crate) token: OpToken,
    pub(crate) precedence: u8,
    /// Right operand is a type reference (`as`, `is`).
    pub(crate) type_operand: bool,
}

impl BinaryOp {
    const fn punct(kind: TokenKind, precedence: u8) -> Self {
        Self {
            token: OpToken::Punct(kind),
            precedence,
            type_operand: false,
        }
    }

    const fn word(kw: Keyword, precedence: u8) -> Self {
        Self {
            token: OpToken::Word(kw),
            precedence,
            type_operand: true,
        }
    }

    /// Minimum precedence for the right operand.
    pub(crate) const fn right_min(&self) -> u8 {
        self.precedence + 1
    }
}

pub(crate) static BINARY: [BinaryOp; 19] = [
    BinaryOp::punct(TokenKind::Caret, 10),
    BinaryOp::punct(TokenKind::Star, 9),
    BinaryOp::punct(TokenKind::Slash, 9),
    BinaryOp::punct(TokenKind::Percent, 9),
    BinaryOp::punct(TokenKind::Plus, 8),
    BinaryOp::punct(TokenKind::Minus, 8),
    BinaryOp::punct(TokenKind::Gt, 7),
    BinaryOp::punct(TokenKind::GtEq, 7),
    BinaryOp::punct(TokenKind::Lt, 7),
    BinaryOp::punct(TokenKind::LtEq, 7),
    BinaryOp::punct(TokenKind::EqEq, 6),
    BinaryOp::punct(TokenKind::BangEq, 6),
    BinaryOp::word(Keyword::As, 5),
    BinaryOp::word(Keyword::Is, 5),
    BinaryOp::punct(TokenKind::AmpAmp, 4),
    BinaryOp::punct(TokenKind::PipePipe, 3),
    BinaryOp::punct(TokenKind::QuestionQuestion, 3),
    BinaryOp::punct(TokenKind::Eq, 2),
    BinaryOp::punct(TokenKind::QuestionEq, 2),
];

/// Binary operator spelled by a token. `word` is the token text, used for
/// the keyword operators.
pub(crate) fn binary(kind: TokenKind, word: &str) -> Option<&'static BinaryOp> {
    BINARY.iter().find(|op| match op.token {
        OpToken::Punct(punct) => punct == kind,
        OpToken::Word(kw) => kind == TokenKind::Ident && word == kw.as_str(),
    })
}

pub(crate) const fn is_prefix(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Plus
            | TokenKind::Star
            | TokenKind::MinusMinus
            | TokenKind::PlusPlus
            | TokenKind::BangBang
    )
}

pub(crate) const fn is_postfix(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::MinusMinus | TokenKind::PlusPlus | TokenKind::BangBang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_by_precedence() {
        assert!(BINARY.windows(2).all(|w| w[0].precedence >= w[1].precedence));
        assert!(BINARY.iter().all(|op| op.precedence < POSTFIX));
    }

    #[test]
    fn lookup() {
        let plus = binary(TokenKind::Plus, "+").map(|op| op.precedence);
        assert_eq!(plus, Some(8));
        let is = binary(TokenKind::Ident, "is").map(|op| op.type_operand);
        assert_eq!(is, Some(true));
        assert!(binary(TokenKind::Ident, "isnt").is_none());
        assert!(binary(TokenKind::Dot, ".").is_none());
    }

    #[test]
    fn right_operand_binds_tighter() {
        let assign = binary(TokenKind::Eq, "=").map(BinaryOp::right_min);
        assert_eq!(assign, Some(3));
    }
}
