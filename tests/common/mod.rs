#![allow(dead_code)]

use greycat_syntax::{Node, NodeKind, ParseResult, parse, render};

/// Parse and assert that no diagnostic was produced.
pub fn parse_clean(input: &str) -> ParseResult {
    let result = parse(input);
    assert!(
        result.is_clean(),
        "unexpected diagnostics: {:?}\n--- input ---\n{input}",
        result.diagnostics
    );
    result
}

/// S-expression of a clean parse.
pub fn sexp(input: &str) -> String {
    parse_clean(input).module.to_sexp()
}

/// S-expression of a single expression, parsed as `fn f() { <expr>; }`.
pub fn expr_sexp(expr: &str) -> String {
    let source = format!("fn f() {{ {expr}; }}");
    let result = parse_clean(&source);
    let stmt = result
        .module
        .find(NodeKind::ExprStmt)
        .expect("expression statement");
    stmt.nodes().next().expect("expression").to_sexp()
}

/// S-expressions of the statements in `fn f() { <body> }`.
pub fn body_sexp(body: &str) -> Vec<String> {
    let source = format!("fn f() {{ {body} }}");
    let result = parse_clean(&source);
    let block = result.module.find(NodeKind::Block).expect("block");
    block.nodes().map(Node::to_sexp).collect()
}

/// Token texts of a tree, in source order.
pub fn token_texts(node: &Node, source: &str) -> Vec<String> {
    node.all_tokens()
        .iter()
        .map(|t| t.text(source).to_string())
        .collect()
}

/// Render, parse the output again, and assert both trees match. Returns
/// the rendered text.
pub fn assert_reparses(input: &str) -> String {
    let first = parse_clean(input);
    let rendered = render(&first.module, input);
    let second = parse(&rendered);
    assert!(
        second.is_clean(),
        "rendered output does not parse: {:?}\n--- rendered ---\n{rendered}",
        second.diagnostics
    );
    assert_eq!(
        first.module.to_sexp(),
        second.module.to_sexp(),
        "tree mismatch\n--- rendered ---\n{rendered}"
    );
    assert_eq!(
        token_texts(&first.module, input),
        token_texts(&second.module, &rendered),
        "token mismatch\n--- rendered ---\n{rendered}"
    );
    rendered
}

/// Canonical text is a fixed point of parse then render.
pub fn roundtrip(input: &str) {
    let output = assert_reparses(input);
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}
