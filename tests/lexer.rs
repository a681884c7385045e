//! Tokenizer behaviour through the public API.

use greycat_syntax::{
    FragmentHook, Keyword, LexErrorKind, Lexer, Literal, TokenKind, tokenize, tokenize_with,
};

fn texts(src: &str) -> Vec<&str> {
    tokenize(src).iter().map(|t| t.text(src)).collect()
}

fn kinds(src: &str) -> Vec<TokenKind> {
    tokenize(src).into_iter().map(|t| t.kind).collect()
}

// -----------------------------------------------------------
// Words, numbers, and punctuation
// -----------------------------------------------------------

#[test]
fn small_program() {
    let src = "fn main() {\n\tvar x: int = 1_000;\n}";
    assert_eq!(
        texts(src),
        [
            "fn", "main", "(", ")", "{", "var", "x", ":", "int", "=", "1_000", ";", "}"
        ]
    );
}

#[test]
fn keywords_are_plain_identifiers() {
    let tokens = tokenize("while sampling whilst");
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Ident));
    assert_eq!(Keyword::from_word("while"), Some(Keyword::While));
    assert_eq!(Keyword::from_word("whilst"), None);
}

#[test]
fn every_keyword_round_trips_through_its_spelling() {
    for kw in Keyword::ALL {
        assert_eq!(Keyword::from_word(kw.as_str()), Some(kw));
    }
}

#[test]
fn underscore_identifiers() {
    assert_eq!(texts("_a a_1 __"), ["_a", "a_1", "__"]);
}

#[test]
fn exponent_with_fraction_and_sign() {
    let tokens = tokenize("6.02e23 1E-3");
    assert!(matches!(tokens[0].literal, Some(Literal::Float(_))));
    assert_eq!(tokens[1].literal, Some(Literal::Float(0.001)));
}

#[test]
fn member_access_on_number_is_not_a_fraction() {
    assert_eq!(texts("1.abs()"), ["1", ".", "abs", "(", ")"]);
}

#[test]
fn duration_chain_is_one_token() {
    let src = "1day2hour3min4s5ms6us";
    let tokens = tokenize(src);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Duration);
    let expected = 86_400_000_000 + 7_200_000_000 + 180_000_000 + 4_000_000 + 5_000 + 6;
    assert_eq!(tokens[0].literal, Some(Literal::Duration(expected)));
}

#[test]
fn unknown_unit_is_a_suffix() {
    let src = "3weeks";
    let tokens = tokenize(src);
    assert_eq!(tokens[0].kind, TokenKind::Number { suffix_len: 5 });
    assert_eq!(tokens[0].suffix(src), Some("weeks"));
    assert_eq!(tokens[0].literal, Some(Literal::Int(3)));
}

#[test]
fn punctuation_table_matches_text() {
    let src = "( ) { } [ ] , ; : :: . .. -> @ ? ?? ?= = == ! != < <= > >= + ++ - -- * / % ^ && ||";
    for token in tokenize(src) {
        assert_eq!(token.kind.punctuation(), Some(token.text(src)));
    }
}

// -----------------------------------------------------------
// Strings
// -----------------------------------------------------------

#[test]
fn nested_interpolation_three_levels() {
    let src = r#""a${"b${"c${d}"}"}""#;
    let tokens = tokenize(src);
    let opens = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::StringOpen)
        .count();
    let closes = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::StringClose)
        .count();
    let ends = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::InterpolationEnd)
        .count();
    assert_eq!((opens, closes, ends), (3, 3, 3));
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::StringClose));
}

#[test]
fn braces_inside_interpolation_are_balanced() {
    assert_eq!(
        kinds(r#""${ a{} }""#),
        [
            TokenKind::StringOpen,
            TokenKind::InterpolationStart,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::InterpolationEnd,
            TokenKind::StringClose,
        ]
    );
}

#[test]
fn custom_fragment_hook_splits_on_spaces() {
    struct Words;

    impl FragmentHook for Words {
        fn fragment_end(&self, source: &str, pos: usize) -> usize {
            let rest = &source[pos..];
            let stop = rest
                .find(|c: char| c == ' ' || c == '"' || c == '\\' || c == '$')
                .unwrap_or(rest.len());
            pos + stop.max(1)
        }
    }

    let src = r#""ab cd""#;
    let fragments: Vec<_> = tokenize_with(src, &Words)
        .into_iter()
        .filter(|t| t.kind == TokenKind::StringFragment)
        .map(|t| t.text(src))
        .collect();
    assert_eq!(fragments, ["ab", " ", "cd"]);
}

// -----------------------------------------------------------
// Errors never stop tokenizing
// -----------------------------------------------------------

#[test]
fn errors_are_tokens() {
    assert_eq!(
        kinds("a # 1e+ b"),
        [
            TokenKind::Ident,
            TokenKind::Error(LexErrorKind::UnexpectedCharacter('#')),
            TokenKind::Error(LexErrorKind::InvalidNumberLiteral),
            TokenKind::Ident,
        ]
    );
}

#[test]
fn unterminated_string_ends_the_stream() {
    let tokens = tokenize("x = \"open");
    assert_eq!(
        tokens.last().map(|t| t.kind),
        Some(TokenKind::Error(LexErrorKind::UnterminatedString))
    );
}

#[test]
fn pull_lexer_is_finite() {
    let mut lexer = Lexer::new("a");
    assert_eq!(lexer.next_token().kind, TokenKind::Ident);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(Lexer::new("a b").count(), 3);
}
