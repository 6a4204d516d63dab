//! Lexer and parser for the Nix expression language.
//!
//! Turns source text into a located token stream and then into a typed
//! syntax tree, without evaluating anything. Comments are kept and
//! attached to nearby nodes so tools such as formatters and linters can
//! work from the tree.
//!
//! # Quick start
//!
//! ## Parse an expression
//!
//! ```
//! use nixparse::{BinaryOp, Value, parse};
//!
//! let root = parse("x.y or 4").unwrap();
//! let bin = root.expr.as_binary().unwrap();
//! assert_eq!(bin.op.op, BinaryOp::Fallback);
//! assert!(matches!(bin.right.value(), Some(Value::Int(n)) if n.value == 4));
//! ```
//!
//! ## Inspect the token stream
//!
//! ```
//! use nixparse::{TokenKind, lex};
//!
//! let tokens = lex("a // b").unwrap();
//! assert_eq!(tokens[1].kind, TokenKind::Update);
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    Attr, Attrs, BinaryExpr, BinaryOp, Expr, FnParams, Identifier, Root, StringLit, SubExpr,
    Value,
};
pub use lexer::{LexError, LexErrorKind, lex};
pub use parser::{ParseError, ParseErrorKind, parse, parse_tokens};
pub use token::{Keyword, Position, Span, Token, TokenKind};

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Where the error was detected.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Lex(e) => e.span,
            Self::Parse(e) => e.token.span,
        }
    }
}
