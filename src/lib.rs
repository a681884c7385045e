//! GreyCat lexer, recovering parser, and CST renderer.
//!
//! Parses GreyCat source into a concrete syntax tree that keeps every
//! token with its span, plus every comment. Parsing never fails outright:
//! malformed input yields `error` nodes alongside diagnostics, and the
//! tree can be re-printed in canonical form.
//!
//! # Quick start
//!
//! ## Parse and inspect a tree
//!
//! ```
//! use greycat_syntax::{Field, NodeKind, parse};
//!
//! let src = "fn main() { print(\"Hello, world!\"); }";
//! let result = parse(src);
//! assert!(result.is_clean());
//! assert_eq!(
//!     result.module.to_sexp(),
//!     "(module (fn_decl name: (ident) params: (fn_params) body: (block \
//!      (expr_stmt (call_expr fn: (ident) (args (string (string_fragment))))))))"
//! );
//!
//! let decl = result.module.find(NodeKind::FnDecl).unwrap();
//! assert_eq!(decl.field(Field::Name).unwrap().text(src), "main");
//! ```
//!
//! ## Recover from errors
//!
//! ```
//! use greycat_syntax::{DiagnosticKind, parse};
//!
//! let result = parse("fn main( { }");
//! assert_eq!(result.diagnostics.len(), 1);
//! assert!(matches!(
//!     result.diagnostics[0].kind,
//!     DiagnosticKind::UnexpectedToken { .. }
//! ));
//! assert!(result.module.has_error());
//! ```
//!
//! ## Re-format
//!
//! ```
//! use greycat_syntax::{parse, render};
//!
//! let src = "var   x :int ;";
//! let result = parse(src);
//! assert_eq!(render(&result.module, src), "var x: int;\n");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cst;
pub mod diagnostic;
pub mod formatter;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod scanner;
pub mod token;

pub use cst::{Child, Element, Field, Node, NodeBuilder, NodeKind, Walk};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use formatter::render;
pub use lexer::{LexErrorKind, Lexer, tokenize, tokenize_with};
pub use options::{DEFAULT_MAX_DEPTH, ParseOptions};
pub use parser::{ParseResult, parse, parse_with, range_openness};
pub use scanner::{DefaultFragmentHook, FragmentHook};
pub use token::{Keyword, Literal, Span, Token, TokenKind};

/// Unified error type for callers that want a clean parse or nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A malformed token.
    #[error("{0}")]
    Lex(Diagnostic),
    /// A token sequence the grammar rejects.
    #[error("{0}")]
    Parse(Diagnostic),
}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        if diagnostic.kind.is_lexical() {
            Self::Lex(diagnostic)
        } else {
            Self::Parse(diagnostic)
        }
    }
}

/// Parse a source string, failing on the first diagnostic.
pub fn parse_strict(input: &str) -> Result<Node, Error> {
    let result = parse(input);
    match result.diagnostics.into_iter().next() {
        Some(diagnostic) => Err(diagnostic.into()),
        None => Ok(result.module),
    }
}
