//! Typed syntax tree. Every node carries the [`Span`] of its source.

use crate::token::{Span, TokenKind};

/// Parsed file: exactly one top-level expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Root {
    pub expr: Expr,
    pub span: Span,
}

/// An expression: either a single operand or a resolved operator tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Binary(Box<BinaryExpr>),
    Sub(Box<SubExpr>),
}

impl Expr {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Binary(bin) => bin.span,
            Self::Sub(sub) => sub.span,
        }
    }

    #[must_use]
    pub fn as_sub(&self) -> Option<&SubExpr> {
        match self {
            Self::Sub(sub) => Some(sub),
            Self::Binary(_) => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&BinaryExpr> {
        match self {
            Self::Binary(bin) => Some(bin),
            Self::Sub(_) => None,
        }
    }

    /// `left op right` with a span covering both operands.
    #[must_use]
    pub fn binary(op: Operator, left: Self, right: Self) -> Self {
        let span = left.span().to(right.span());
        Self::Binary(Box::new(BinaryExpr {
            op,
            left,
            right,
            span,
        }))
    }

    /// The operand value when this is a plain sub-expression.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.as_sub().map(|sub| &sub.value)
    }
}

/// `left op right`. Associativity is baked into the tree shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryExpr {
    pub op: Operator,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}

/// Operator marker with its own location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operator {
    pub op: BinaryOp,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    /// `.`
    Select,
    /// `?`
    Has,
    /// `++`
    Concat,
    Mul,
    Div,
    Add,
    Sub,
    /// `//`
    Update,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `->`
    Imp,
    /// `or`
    Fallback,
}

impl BinaryOp {
    /// Binding tier, smaller binds tighter. `or` shares the selector tier.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Select | Self::Fallback => 1,
            Self::Has => 4,
            Self::Concat => 5,
            Self::Mul | Self::Div => 6,
            Self::Add | Self::Sub => 7,
            Self::Update => 9,
            Self::Lt | Self::Lte | Self::Gt | Self::Gte => 10,
            Self::Eq | Self::NotEq => 11,
            Self::And => 12,
            Self::Or | Self::Imp => 13,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Select => ".",
            Self::Has => "?",
            Self::Concat => "++",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Update => "//",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Imp => "->",
            Self::Fallback => "or",
        }
    }

    /// Operator for a symbolic token. `or` is a keyword and is handled
    /// by the parser directly.
    #[must_use]
    pub const fn from_token(kind: &TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Period => Self::Select,
            TokenKind::Has => Self::Has,
            TokenKind::Concat => Self::Concat,
            TokenKind::Mul => Self::Mul,
            TokenKind::Div => Self::Div,
            TokenKind::Add => Self::Add,
            TokenKind::Sub => Self::Sub,
            TokenKind::Update => Self::Update,
            TokenKind::Lt => Self::Lt,
            TokenKind::Lte => Self::Lte,
            TokenKind::Gt => Self::Gt,
            TokenKind::Gte => Self::Gte,
            TokenKind::EqEq => Self::Eq,
            TokenKind::NotEq => Self::NotEq,
            TokenKind::And => Self::And,
            TokenKind::Or => Self::Or,
            TokenKind::Imp => Self::Imp,
            _ => return None,
        };
        Some(op)
    }
}

/// One operand with its leading modifiers and attached comments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubExpr {
    /// `with E;` / `assert E;` prefixes in source order.
    pub modifiers: Vec<Modifier>,
    pub comments: Comments,
    pub value: Value,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comments {
    pub before: Vec<Comment>,
    pub after: Vec<Comment>,
}

impl Comments {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// `# text` or `/* text */`, delimiters excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    pub text: String,
    pub multiline: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierKind {
    With,
    Assert,
}

/// `with E;` or `assert E;` in front of an expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub kind: ModifierKind,
    pub expr: Expr,
    pub span: Span,
}

/// Operand of a [`SubExpr`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null(Span),
    Bool(Bool),
    Int(Int),
    Float(Float),
    String(StringLit),
    Path(PathLit),
    Interp(Interp),
    Identifier(Identifier),
    List(List),
    Attrs(Attrs),
    Function(Box<Function>),
    FnCall(FnCall),
    LetIn(Box<LetIn>),
    Import(Box<Import>),
    Conditional(Box<Conditional>),
    Unary(Box<UnaryExpr>),
    /// `( E )`
    Paren(Paren),
}

impl Value {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Null(span) => *span,
            Self::Bool(v) => v.span,
            Self::Int(v) => v.span,
            Self::Float(v) => v.span,
            Self::String(v) => v.span,
            Self::Path(v) => v.span,
            Self::Interp(v) => v.span,
            Self::Identifier(v) => v.span,
            Self::List(v) => v.span,
            Self::Attrs(v) => v.span,
            Self::Function(v) => v.span,
            Self::FnCall(v) => v.span,
            Self::LetIn(v) => v.span,
            Self::Import(v) => v.span,
            Self::Conditional(v) => v.span,
            Self::Unary(v) => v.span,
            Self::Paren(v) => v.span,
        }
    }

    /// Values that take juxtaposed arguments.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Paren(_) | Self::Identifier(_) | Self::Import(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bool {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Int {
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Float {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathLit {
    pub value: String,
    pub span: Span,
}

/// String literal: text fragments alternating with interpolations,
/// always starting and ending with a (possibly empty) text fragment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringLit {
    pub parts: Vec<StringPart>,
    pub multiline: bool,
    pub span: Span,
}

impl StringLit {
    /// Interpolation-free content, if there is no interpolation.
    #[must_use]
    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [StringPart::Text(text)] => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StringPart {
    Text(String),
    Interp(Interp),
}

/// `${ E }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interp {
    pub expr: Expr,
    pub span: Span,
}

/// Attribute path such as `a.b."c".${d}`. Never empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    pub segments: Vec<IdentSegment>,
    /// Leading comments, only filled for names inside `inherit`.
    pub comments: Vec<Comment>,
    pub span: Span,
}

impl Identifier {
    /// The name when this is a single plain segment.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [IdentSegment::Name(name)] => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdentSegment {
    Name(String),
    String(StringLit),
    Interp(Interp),
}

/// `[ a b c ]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct List {
    pub items: Vec<Expr>,
    /// Comments in an otherwise empty list.
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// `{ ... }` or `rec { ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attrs {
    pub recursive: bool,
    pub attrs: Vec<Attr>,
    /// Comments in an otherwise empty set.
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// One entry of an attribute set or `let` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attr {
    Binding(Binding),
    Inherit(Inherit),
}

impl Attr {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Binding(b) => b.span,
            Self::Inherit(i) => i.span,
        }
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        match self {
            Self::Binding(b) => &b.comments,
            Self::Inherit(i) => &i.comments,
        }
    }

    pub const fn comments_mut(&mut self) -> &mut Vec<Comment> {
        match self {
            Self::Binding(b) => &mut b.comments,
            Self::Inherit(i) => &mut i.comments,
        }
    }
}

/// `name = value;`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Binding {
    pub name: Identifier,
    pub value: Expr,
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// `inherit (from) names;`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inherit {
    pub from: Option<Expr>,
    pub names: Vec<Identifier>,
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// `params: body`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub params: FnParams,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FnParams {
    /// `x: ...`
    Named(Identifier),
    /// `{ a, b ? d, ... } @ x: ...`
    Destructured(Destructured),
}

impl FnParams {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Named(ident) => ident.span,
            Self::Destructured(d) => d.span,
        }
    }
}

/// Attribute-set pattern. The alias is stored the same way whether it
/// was written before (`x @ { }`) or after (`{ } @ x`) the pattern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destructured {
    pub params: Vec<FnParam>,
    /// `...` present.
    pub extra: bool,
    pub alias: Option<Identifier>,
    /// Comments before the closing brace.
    pub comments: Vec<Comment>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FnParam {
    pub name: Identifier,
    pub default: Option<Expr>,
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// `callee arg1 arg2 ...`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FnCall {
    pub callee: Box<Value>,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// `let bindings in body`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LetIn {
    pub bindings: Vec<Attr>,
    /// Comments in an otherwise empty `let`.
    pub comments: Vec<Comment>,
    pub body: Expr,
    pub span: Span,
}

/// `import E`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Import {
    pub expr: Expr,
    pub span: Span,
}

/// `if condition then then_branch else else_branch`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conditional {
    pub condition: Expr,
    pub then_branch: Expr,
    pub else_branch: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-` on a non-literal operand.
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paren {
    pub expr: Expr,
    pub span: Span,
}
