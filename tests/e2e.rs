//! End-to-end tests over realistic GreyCat programs.

mod common;

use common::{assert_reparses, parse_clean};
use greycat_syntax::{
    DiagnosticKind, Error, Field, FragmentHook, NodeKind, ParseOptions, parse, parse_strict,
    parse_with, render,
};

const SENSORS: &str = r#"@library("std", "7.0");

/// A single measurement.
type Reading {
    time: time;
    value: float;
    unit: String?;

    static fn create(value: float): Reading {
        return Reading { time: time::now(), value: value, unit: null };
    }
}

enum Level {
    low(0),
    high(10),
}

var readings: nodeTime<Reading>;

// Mean of a list, zero when empty.
fn average(values: Array<float>): float {
    if (values.size() == 0) {
        return 0.0;
    }
    var sum = 0.0;
    for (i, v in values) {
        sum = sum + v;
    }
    return sum / values.size();
}

fn main() {
    var n = nodeTime<float>::new();
    for (var i = 0; i < 10; i++) {
        n.setAt(time::now() + i * 1s, i as float);
    }
    for (t: time, v in n[0..10[ limit 5) {
        println("${t}: ${v}");
    }
    try {
        throw "boom";
    } catch (e) {
        error(e);
    }
}
"#;

// -----------------------------------------------------------
// Clean programs.
// -----------------------------------------------------------

#[test]
fn sensors_program_parses_clean() {
    let result = parse_clean(SENSORS);
    let kinds: Vec<_> = result.module.nodes().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        [
            NodeKind::ModPragma,
            NodeKind::TypeDecl,
            NodeKind::EnumDecl,
            NodeKind::ModVar,
            NodeKind::FnDecl,
            NodeKind::FnDecl,
        ]
    );
    assert!(!result.module.has_error());
}

#[test]
fn sensors_program_reparses() {
    assert_reparses(SENSORS);
}

#[test]
fn sensors_program_render_is_stable() {
    let result = parse_clean(SENSORS);
    let once = render(&result.module, SENSORS);
    let again = parse_clean(&once);
    assert_eq!(render(&again.module, &once), once);
}

#[test]
fn sensors_program_structure() {
    let result = parse_clean(SENSORS);
    let names: Vec<_> = result
        .module
        .nodes_of(NodeKind::FnDecl)
        .filter_map(|f| f.field(Field::Name))
        .map(|n| n.text(SENSORS))
        .collect();
    assert_eq!(names, ["average", "main"]);

    let method = result.module.find(NodeKind::TypeMethod).expect("method");
    assert_eq!(
        method.field(Field::Modifiers).map(|m| m.text(SENSORS)),
        Some("static")
    );

    let for_in = result.module.find(NodeKind::ForInStmt).expect("for-in");
    assert!(for_in.field(Field::Range).is_none());

    let ranged = result
        .module
        .walk()
        .filter(|n| n.kind == NodeKind::ForInStmt)
        .find(|n| n.field(Field::Range).is_some())
        .expect("ranged for-in");
    let range = ranged.field(Field::Range).expect("range");
    assert_eq!(greycat_syntax::range_openness(range), Some((false, true)));
    assert_eq!(ranged.field(Field::Limit).map(|n| n.text(SENSORS)), Some("5"));
}

#[test]
fn sensors_program_keeps_comments() {
    let result = parse_clean(SENSORS);
    let average = result
        .module
        .nodes_of(NodeKind::FnDecl)
        .next()
        .expect("average");
    assert_eq!(average.extras.len(), 1);
    assert_eq!(
        average.extras[0].text(SENSORS),
        "// Mean of a list, zero when empty."
    );
    let doc = result.module.find(NodeKind::Doc).expect("doc");
    assert_eq!(doc.text(SENSORS), "/// A single measurement.");
}

#[test]
fn hello_world_tree() {
    let result = parse_clean("fn main() { print(\"Hello, world!\"); }");
    assert_eq!(
        result.module.to_sexp(),
        "(module (fn_decl name: (ident) params: (fn_params) body: (block (expr_stmt (call_expr fn: (ident) (args (string (string_fragment))))))))"
    );
}

#[test]
fn tree_tokens_cover_source() {
    let src = "fn f(a: int) { return a; }";
    let result = parse_clean(src);
    let joined: String = result
        .module
        .all_tokens()
        .iter()
        .map(|t| t.text(src))
        .collect();
    let expected: String = src.chars().filter(|c| !c.is_whitespace()).collect();
    assert_eq!(joined, expected);
}

// -----------------------------------------------------------
// Broken programs.
// -----------------------------------------------------------

#[test]
fn broken_program_keeps_later_declarations() {
    let src = "fn a() { x = ; }\nfn b( { }\ntype T { 1; y: int; }\nfn c() { }";
    let result = parse(src);
    assert_eq!(result.diagnostics.len(), 3);
    let kinds: Vec<_> = result.module.nodes().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        [
            NodeKind::FnDecl,
            NodeKind::FnDecl,
            NodeKind::TypeDecl,
            NodeKind::FnDecl,
        ]
    );
    let errors = result
        .module
        .walk()
        .filter(|n| n.kind == NodeKind::Error)
        .count();
    assert_eq!(errors, 3);
}

#[test]
fn broken_program_still_renders() {
    let src = "fn a() { x = ; y; }";
    let result = parse(src);
    assert_eq!(render(&result.module, src), "fn a() {\n\tx =;\n\ty;\n}\n");
}

#[test]
fn diagnostics_are_in_source_order() {
    let result = parse("fn a() { x = ; }\nfn b() { y = ; }");
    let lines: Vec<_> = result.diagnostics.iter().map(|d| d.span.line).collect();
    assert_eq!(lines, [1, 2]);
}

// -----------------------------------------------------------
// Strict parsing and options.
// -----------------------------------------------------------

#[test]
fn strict_parse_accepts_clean_source() {
    let module = parse_strict("fn f() { }").expect("clean source");
    assert_eq!(module.kind, NodeKind::Module);
}

#[test]
fn strict_parse_splits_error_kinds() {
    let err = parse_strict("fn f() { x = ; }").expect_err("syntax error");
    assert!(matches!(err, Error::Parse(_)));

    let err = parse_strict("fn f() { x = 'ab'; }").expect_err("lexical error");
    assert!(matches!(
        err,
        Error::Lex(ref d) if d.kind == DiagnosticKind::InvalidCharLiteral
    ));
    assert!(err.to_string().starts_with("invalid character literal"));
}

#[test]
fn custom_fragment_hook_through_parse_options() {
    struct Chars;

    impl FragmentHook for Chars {
        fn fragment_end(&self, source: &str, pos: usize) -> usize {
            let len = source[pos..].chars().next().map_or(1, char::len_utf8);
            pos + len
        }
    }

    let src = "fn f() { s = \"abc\"; }";
    let result = parse_with(src, &ParseOptions::new().fragment_hook(&Chars));
    assert!(result.is_clean());
    let string = result.module.find(NodeKind::String).expect("string");
    assert_eq!(string.nodes().count(), 3);
}
