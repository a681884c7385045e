//! Property-based tests with proptest.
//!
//! Generate random expressions and function bodies as source text, render
//! them, parse the output back, and check that the tree and its tokens are
//! unchanged and that rendering is idempotent.

mod common;

use common::assert_reparses;
use greycat_syntax::{Lexer, TokenKind, parse, render};
use proptest::prelude::*;

// -- Leaf strategies --

/// Identifiers carry a prefix so they never spell a keyword.
fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_map(|s| format!("v_{s}"))
}

fn number() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,5}",
        ("[0-9]{1,3}", "[0-9]{1,3}").prop_map(|(a, b)| format!("{a}.{b}")),
        "[1-9][0-9]{0,2}(ms|s|min|hour|day)",
    ]
}

fn string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.:]{0,12}".prop_map(|s| format!("\"{s}\""))
}

fn binary_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "+", "-", "*", "/", "%", "^", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "??",
    ])
}

// -- Expressions --

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => ident(),
        2 => number(),
        1 => string(),
        1 => prop::sample::select(vec!["true", "false", "null", "this"]).prop_map(String::from),
    ]
}

fn expr() -> impl Strategy<Value = String> {
    atom().prop_recursive(4, 32, 4, |inner| {
        let items = prop::collection::vec(inner.clone(), 0..3);
        prop_oneof![
            (inner.clone(), binary_op(), inner.clone())
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("-{e}")),
            inner.clone().prop_map(|e| format!("!{e}")),
            ident().prop_map(|e| format!("{e}++")),
            (ident(), items.clone()).prop_map(|(f, args)| format!("{f}({})", args.join(", "))),
            (ident(), ident()).prop_map(|(o, p)| format!("{o}.{p}")),
            (ident(), ident()).prop_map(|(o, p)| format!("{o}?.{p}")),
            (ident(), ident()).prop_map(|(o, p)| format!("{o}->{p}")),
            (ident(), ident(), any::<bool>()).prop_map(|(t, p, optional)| {
                format!("{t}::{p}{}", if optional { "?" } else { "" })
            }),
            (ident(), inner.clone()).prop_map(|(o, i)| format!("{o}[{i}]")),
            (ident(), inner.clone()).prop_map(|(o, i)| format!("{o}?[{i}]")),
            items.clone().prop_map(|items| format!("[{}]", items.join(", "))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}, {b})")),
            (ident(), prop::collection::vec((ident(), inner.clone()), 0..3)).prop_map(
                |(ty, fields)| {
                    let fields: Vec<_> = fields.iter().map(|(n, v)| format!("{n}: {v}")).collect();
                    format!("{ty} {{ {} }}", fields.join(", "))
                }
            ),
            (ident(), prop::collection::vec(inner.clone(), 1..3))
                .prop_map(|(ty, items)| format!("{ty} {{ {} }}", items.join(", "))),
            (ident(), ident(), ident(), items)
                .prop_map(|(ty, a, b, items)| format!("{ty}<{a}, {b}> {{ {} }}", items.join(", "))),
            (ident(), ident(), ident())
                .prop_map(|(ty, param, method)| format!("{ty}<{param}>::{method}()")),
            inner.prop_map(|e| format!("\"a ${{{e}}} b\"")),
        ]
    })
}

fn range() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["[", "]"]),
        prop::option::of(number()),
        prop::option::of(number()),
        prop::sample::select(vec!["[", "]"]),
    )
        .prop_map(|(open, from, to, close)| {
            format!(
                "{open}{}..{}{close}",
                from.unwrap_or_default(),
                to.unwrap_or_default()
            )
        })
}

// -- Statements --

fn stmt() -> impl Strategy<Value = String> {
    let simple = prop_oneof![
        expr().prop_map(|e| format!("{e};")),
        (ident(), expr()).prop_map(|(n, e)| format!("var {n} = {e};")),
        (ident(), ident()).prop_map(|(n, t)| format!("var {n}: {t};")),
        expr().prop_map(|e| format!("return {e};")),
        (ident(), ident(), expr()).prop_map(|(n, p, e)| {
            format!("var {n} = fn({p}: int): int {{ return {e}; }};")
        }),
    ];
    simple.prop_recursive(2, 12, 3, |inner| {
        prop_oneof![
            (expr(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(c, body)| format!("if ({c}) {{ {} }}", body.join(" "))),
            (expr(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(c, body)| format!("while ({c}) {{ {} }}", body.join(" "))),
            (ident(), ident(), prop::collection::vec(inner.clone(), 0..3)).prop_map(
                |(v, c, body)| format!("for ({v} in {c}) {{ {} }}", body.join(" "))
            ),
            (ident(), ident(), range(), prop::collection::vec(inner, 0..3)).prop_map(
                |(v, c, range, body)| {
                    format!("for (k, {v} in {c} {range} limit 5) {{ {} }}", body.join(" "))
                }
            ),
        ]
    })
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec((ident(), prop::collection::vec(stmt(), 0..5)), 1..4).prop_map(|fns| {
        fns.into_iter()
            .map(|(name, body)| format!("fn {name}() {{ {} }}", body.join(" ")))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

// -- Properties --

proptest! {
    #[test]
    fn expression_reparses(e in expr()) {
        assert_reparses(&format!("fn f() {{ x = {e}; }}"));
    }

    #[test]
    fn program_reparses(src in program()) {
        assert_reparses(&src);
    }

    #[test]
    fn render_is_idempotent(src in program()) {
        let first = parse(&src);
        prop_assert!(first.is_clean());
        let once = render(&first.module, &src);
        let second = parse(&once);
        let twice = render(&second.module, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn lexer_never_panics_and_ends(src in "\\PC{0,64}") {
        let tokens: Vec<_> = Lexer::new(&src).collect();
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        prop_assert_eq!(eofs, 1);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        let covered: usize = tokens.iter().map(|t| t.span.end - t.span.start).sum();
        prop_assert!(covered <= src.len());
    }

    #[test]
    fn parser_never_panics(src in "[a-z(){}\\[\\];:,.=+\"$ \n]{0,64}") {
        let result = parse(&src);
        let rendered = render(&result.module, &src);
        prop_assert!(rendered.is_empty() || rendered.ends_with('\n'));
    }
}
