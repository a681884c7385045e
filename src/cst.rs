use crate::token::{Span, Token, TokenKind};

/// Node kinds of the concrete syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    ModPragma,
    Doc,
    Annotations,
    Annotation,
    Modifiers,
    FnDecl,
    TypeDecl,
    TypeParams,
    TypeBody,
    TypeAttr,
    AttrType,
    AttrInit,
    TypeMethod,
    EnumDecl,
    EnumBody,
    EnumField,
    ModVar,
    TypeDecorator,
    FnParams,
    FnParam,
    TypeIdent,
    Optional,

    Block,
    VarDecl,
    Initializer,
    ReturnStmt,
    ThrowStmt,
    BreakStmt,
    ContinueStmt,
    ExprStmt,
    TryStmt,
    AtStmt,
    WhileStmt,
    DoWhileStmt,
    IfStmt,
    ForStmt,
    ForInStmt,
    ForInParam,
    IteratorRange,
    ExtraSemi,

    UnaryExpr,
    PostfixExpr,
    BinaryExpr,
    ParenExpr,
    TupleExpr,
    ObjectExpr,
    ObjectFields,
    ObjectField,
    ObjectInitializers,
    ArrayExpr,
    CallExpr,
    Args,
    LambdaExpr,
    MemberExpr,
    ArrowExpr,
    StaticExpr,
    OffsetExpr,

    String,
    StringFragment,
    StringEscapeSequence,
    StringSubstitution,
    Ident,
    Number,
    Duration,
    Char,
    True,
    False,
    Null,
    This,

    Error,
}

impl NodeKind {
    /// Name used in s-expressions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::ModPragma => "mod_pragma",
            Self::Doc => "doc",
            Self::Annotations => "annotations",
            Self::Annotation => "annotation",
            Self::Modifiers => "modifiers",
            Self::FnDecl => "fn_decl",
            Self::TypeDecl => "type_decl",
            Self::TypeParams => "type_params",
            Self::TypeBody => "type_body",
            Self::TypeAttr => "type_attr",
            Self::AttrType => "attr_type",
            Self::AttrInit => "attr_init",
            Self::TypeMethod => "type_method",
            Self::EnumDecl => "enum_decl",
            Self::EnumBody => "enum_body",
            Self::EnumField => "enum_field",
            Self::ModVar => "modvar",
            Self::TypeDecorator => "type_decorator",
            Self::FnParams => "fn_params",
            Self::FnParam => "fn_param",
            Self::TypeIdent => "type_ident",
            Self::Optional => "optional",
            Self::Block => "block",
            Self::VarDecl => "var_decl",
            Self::Initializer => "initializer",
            Self::ReturnStmt => "return_stmt",
            Self::ThrowStmt => "throw_stmt",
            Self::BreakStmt => "break_stmt",
            Self::ContinueStmt => "continue_stmt",
            Self::ExprStmt => "expr_stmt",
            Self::TryStmt => "try_stmt",
            Self::AtStmt => "at_stmt",
            Self::WhileStmt => "while_stmt",
            Self::DoWhileStmt => "do_while_stmt",
            Self::IfStmt => "if_stmt",
            Self::ForStmt => "for_stmt",
            Self::ForInStmt => "for_in_stmt",
            Self::ForInParam => "for_in_param",
            Self::IteratorRange => "iterator_range",
            Self::ExtraSemi => "extra_semi",
            Self::UnaryExpr => "unary_expr",
            Self::PostfixExpr => "postfix_expr",
            Self::BinaryExpr => "binary_expr",
            Self::ParenExpr => "paren_expr",
            Self::TupleExpr => "tuple_expr",
            Self::ObjectExpr => "object_expr",
            Self::ObjectFields => "object_fields",
            Self::ObjectField => "object_field",
            Self::ObjectInitializers => "object_initializers",
            Self::ArrayExpr => "array_expr",
            Self::CallExpr => "call_expr",
            Self::Args => "args",
            Self::LambdaExpr => "lambda_expr",
            Self::MemberExpr => "member_expr",
            Self::ArrowExpr => "arrow_expr",
            Self::StaticExpr => "static_expr",
            Self::OffsetExpr => "offset_expr",
            Self::String => "string",
            Self::StringFragment => "string_fragment",
            Self::StringEscapeSequence => "string_escape_sequence",
            Self::StringSubstitution => "string_substitution",
            Self::Ident => "ident",
            Self::Number => "number",
            Self::Duration => "duration",
            Self::Char => "char",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::This => "this",
            Self::Error => "error",
        }
    }

    /// Nodes that sit directly in a block.
    #[must_use]
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::VarDecl
                | Self::ReturnStmt
                | Self::ThrowStmt
                | Self::BreakStmt
                | Self::ContinueStmt
                | Self::ExprStmt
                | Self::TryStmt
                | Self::AtStmt
                | Self::WhileStmt
                | Self::DoWhileStmt
                | Self::IfStmt
                | Self::ForStmt
                | Self::ForInStmt
        )
    }

    /// Nodes that sit directly in a module or type body.
    #[must_use]
    pub const fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::ModPragma
                | Self::FnDecl
                | Self::TypeDecl
                | Self::EnumDecl
                | Self::ModVar
                | Self::TypeAttr
                | Self::TypeMethod
        )
    }
}

/// Labels attached to child slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Params,
    Generics,
    ReturnType,
    Body,
    Modifiers,
    Supertype,
    Type,
    Init,
    Param,
    Expr,
    Condition,
    ThenBranch,
    ElseBranch,
    TryBlock,
    ErrorParam,
    CatchBlock,
    Block,
    ItName,
    ItType,
    ItValue,
    ItCondition,
    ItIncrement,
    Iterator,
    Range,
    Sampling,
    Limit,
    Skip,
    From,
    To,
    Left,
    Right,
    Operator,
    Operand,
    Fn,
    Object,
    Property,
    Index,
    Value,
    Optional,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Params => "params",
            Self::Generics => "generics",
            Self::ReturnType => "return_type",
            Self::Body => "body",
            Self::Modifiers => "modifiers",
            Self::Supertype => "supertype",
            Self::Type => "type",
            Self::Init => "init",
            Self::Param => "param",
            Self::Expr => "expr",
            Self::Condition => "condition",
            Self::ThenBranch => "then_branch",
            Self::ElseBranch => "else_branch",
            Self::TryBlock => "try_block",
            Self::ErrorParam => "error_param",
            Self::CatchBlock => "catch_block",
            Self::Block => "block",
            Self::ItName => "it_name",
            Self::ItType => "it_type",
            Self::ItValue => "it_value",
            Self::ItCondition => "it_condition",
            Self::ItIncrement => "it_increment",
            Self::Iterator => "iterator",
            Self::Range => "range",
            Self::Sampling => "sampling",
            Self::Limit => "limit",
            Self::Skip => "skip",
            Self::From => "from",
            Self::To => "to",
            Self::Left => "left",
            Self::Right => "right",
            Self::Operator => "operator",
            Self::Operand => "operand",
            Self::Fn => "fn",
            Self::Object => "object",
            Self::Property => "property",
            Self::Index => "index",
            Self::Value => "value",
            Self::Optional => "optional",
        }
    }
}

/// Content of a child slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Token(Token),
}

impl Element {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Node(node) => node.span,
            Self::Token(token) => token.span,
        }
    }
}

/// One ordered child slot, optionally labelled.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub field: Option<Field>,
    pub element: Element,
}

/// A CST node.
///
/// `children` holds every significant token of the production in source
/// order, either directly or inside a child node. `extras` holds the
/// comments that precede the node (or, for blocks and modules, the
/// comments before the closing brace or end of input).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<Child>,
    pub extras: Vec<Token>,
}

impl Node {
    /// Node wrapping a single token.
    #[must_use]
    pub fn leaf(kind: NodeKind, token: Token) -> Self {
        Self {
            kind,
            span: token.span,
            children: vec![Child {
                field: None,
                element: Element::Token(token),
            }],
            extras: Vec::new(),
        }
    }

    /// First child node in `field`.
    #[must_use]
    pub fn field(&self, field: Field) -> Option<&Self> {
        self.fields(field).next()
    }

    /// Every child node in `field`, in order.
    pub fn fields(&self, field: Field) -> impl Iterator<Item = &Self> {
        self.children
            .iter()
            .filter(move |c| c.field == Some(field))
            .filter_map(|c| match &c.element {
                Element::Node(node) => Some(node),
                Element::Token(_) => None,
            })
    }

    /// First token child in `field`.
    #[must_use]
    pub fn field_token(&self, field: Field) -> Option<&Token> {
        self.children
            .iter()
            .filter(|c| c.field == Some(field))
            .find_map(|c| match &c.element {
                Element::Token(token) => Some(token),
                Element::Node(_) => None,
            })
    }

    /// Direct child nodes, labelled or not.
    pub fn nodes(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|c| match &c.element {
            Element::Node(node) => Some(node),
            Element::Token(_) => None,
        })
    }

    /// Direct child tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(|c| match &c.element {
            Element::Token(token) => Some(token),
            Element::Node(_) => None,
        })
    }

    /// Direct child nodes of a kind.
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Self> {
        self.nodes().filter(move |n| n.kind == kind)
    }

    /// First direct token of a kind.
    #[must_use]
    pub fn token_of(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens().find(|t| t.kind == kind)
    }

    /// Source text covered by this node.
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }

    /// Pre-order traversal, starting with `self`.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// First node of `kind` in pre-order.
    #[must_use]
    pub fn find(&self, kind: NodeKind) -> Option<&Self> {
        self.walk().find(|n| n.kind == kind)
    }

    /// Whether any `error` node exists in this subtree.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.walk().any(|n| n.kind == NodeKind::Error)
    }

    /// Every token in this subtree, in source order, without extras.
    #[must_use]
    pub fn all_tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(&self, out: &mut Vec<Token>) {
        for child in &self.children {
            match &child.element {
                Element::Node(node) => node.collect_tokens(out),
                Element::Token(token) => out.push(*token),
            }
        }
    }

    /// S-expression of named nodes with field labels, e.g.
    /// `(fn_decl name: (ident) params: (fn_params) body: (block))`.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, None);
        out
    }

    /// Like [`to_sexp`](Self::to_sexp), with the source text of every leaf
    /// node appended, e.g. `(ident "main")`.
    #[must_use]
    pub fn to_sexp_with_text(&self, source: &str) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, Some(source));
        out
    }

    fn write_sexp(&self, out: &mut String, source: Option<&str>) {
        out.push('(');
        out.push_str(self.kind.as_str());
        let mut has_nodes = false;
        for child in &self.children {
            if let Element::Node(node) = &child.element {
                has_nodes = true;
                out.push(' ');
                if let Some(field) = child.field {
                    out.push_str(field.as_str());
                    out.push_str(": ");
                }
                node.write_sexp(out, source);
            }
        }
        if let Some(source) = source {
            if !has_nodes && !self.children.is_empty() {
                out.push(' ');
                out.push_str(&format!("{:?}", self.text(source)));
            }
        }
        out.push(')');
    }
}

/// Pre-order iterator over a subtree.
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.nodes().collect::<Vec<_>>().into_iter().rev());
        Some(node)
    }
}

/// Incremental node construction. The span is computed from the children
/// when the node is finished.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    kind: NodeKind,
    children: Vec<Child>,
    extras: Vec<Token>,
    fallback: Option<Span>,
}

impl NodeBuilder {
    #[must_use]
    pub const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            extras: Vec::new(),
            fallback: None,
        }
    }

    /// Span used when the node ends up with no children.
    #[must_use]
    pub const fn at(mut self, span: Span) -> Self {
        self.fallback = Some(span);
        self
    }

    #[must_use]
    pub fn extras(mut self, extras: Vec<Token>) -> Self {
        self.extras = extras;
        self
    }

    pub fn set_extras(&mut self, extras: Vec<Token>) {
        self.extras = extras;
    }

    pub fn token(&mut self, token: Token) {
        self.children.push(Child {
            field: None,
            element: Element::Token(token),
        });
    }

    pub fn node(&mut self, node: Node) {
        self.children.push(Child {
            field: None,
            element: Element::Node(node),
        });
    }

    pub fn field(&mut self, field: Field, node: Node) {
        self.children.push(Child {
            field: Some(field),
            element: Element::Node(node),
        });
    }

    pub fn field_token(&mut self, field: Field, token: Token) {
        self.children.push(Child {
            field: Some(field),
            element: Element::Token(token),
        });
    }

    pub fn opt_field(&mut self, field: Field, node: Option<Node>) {
        if let Some(node) = node {
            self.field(field, node);
        }
    }

    pub fn opt_node(&mut self, node: Option<Node>) {
        if let Some(node) = node {
            self.node(node);
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn finish(self) -> Node {
        let span = self
            .children
            .iter()
            .map(|c| c.element.span())
            .reduce(Span::cover)
            .or(self.fallback)
            .unwrap_or(Span::empty_at(0, 1, 1));
        Node {
            kind: self.kind,
            span,
            children: self.children,
            extras: self.extras,
        }
    }
}
