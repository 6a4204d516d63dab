use std::fmt;

/// A point in the source text.
///
/// Lines and columns are 1-based; columns count Unicode scalar values.
/// `offset` is the 0-based byte offset into the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// Half-open source range `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`.
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Span from the start of `self` to the end of `other`.
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
        }
    }
}

/// Reserved words. `or` is contextual: it lexes as a keyword and the
/// parser treats it as the fallback operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Keyword {
    Let,
    In,
    Rec,
    With,
    Inherit,
    Assert,
    Or,
    Import,
    If,
    Then,
    Else,
}

impl Keyword {
    /// Classify an identifier-shaped word.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "let" => Self::Let,
            "in" => Self::In,
            "rec" => Self::Rec,
            "with" => Self::With,
            "inherit" => Self::Inherit,
            "assert" => Self::Assert,
            "or" => Self::Or,
            "import" => Self::Import,
            "if" => Self::If,
            "then" => Self::Then,
            "else" => Self::Else,
            _ => return None,
        };
        Some(keyword)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::In => "in",
            Self::Rec => "rec",
            Self::With => "with",
            Self::Inherit => "inherit",
            Self::Assert => "assert",
            Self::Or => "or",
            Self::Import => "import",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fragment of a lexed string literal.
///
/// A string's parts always start and end with `Text` (possibly empty)
/// and alternate with `Interp`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StringPart {
    /// Literal text with escapes already decoded.
    Text(String),
    /// `${ ... }` with its inner tokens (closing brace excluded).
    Interp { tokens: Vec<Token>, span: Span },
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// End of input. Always the last token of a top-level stream.
    Eof,
    /// Line break (`\n` or `\r\n`).
    NewLine,
    /// `# ...` or `/* ... */`, delimiters excluded from `text`.
    Comment { text: String, multiline: bool },
    Null,
    Bool(bool),
    /// `"..."` or `''...''`.
    Str {
        parts: Vec<StringPart>,
        multiline: bool,
    },
    Int(i64),
    Float(f64),
    /// Path literal with escapes decoded.
    Path(String),
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    OpenBracket,
    CloseBracket,
    Keyword(Keyword),
    Identifier(String),
    Semi,
    /// `?`
    Has,
    /// `@`
    At,
    Colon,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `!`
    Not,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    /// `->`
    Imp,
    /// `//`
    Update,
    /// `++`
    Concat,
    /// `||`
    Or,
    /// `&&`
    And,
    Period,
    Comma,
    /// `...`
    Ellipsis,
    /// Bare `${ ... }` outside a string, e.g. a dynamic attribute name.
    Interp(Vec<Token>),
}

impl TokenKind {
    /// Source spelling of fixed tokens; `None` for tokens with payloads.
    #[must_use]
    pub const fn symbol(&self) -> Option<&'static str> {
        let s = match self {
            Self::Null => "null",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::OpenCurly => "{",
            Self::CloseCurly => "}",
            Self::OpenBracket => "[",
            Self::CloseBracket => "]",
            Self::Semi => ";",
            Self::Has => "?",
            Self::At => "@",
            Self::Colon => ":",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Not => "!",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Imp => "->",
            Self::Update => "//",
            Self::Concat => "++",
            Self::Or => "||",
            Self::And => "&&",
            Self::Period => ".",
            Self::Comma => ",",
            Self::Ellipsis => "...",
            _ => return None,
        };
        Some(s)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(symbol) = self.symbol() {
            return write!(f, "'{symbol}'");
        }
        match self {
            Self::Eof => write!(f, "end of input"),
            Self::NewLine => write!(f, "newline"),
            Self::Comment { .. } => write!(f, "comment"),
            Self::Bool(b) => write!(f, "'{b}'"),
            Self::Str { .. } => write!(f, "string"),
            Self::Int(n) => write!(f, "integer '{n}'"),
            Self::Float(n) => write!(f, "float '{n}'"),
            Self::Path(p) => write!(f, "path '{p}'"),
            Self::Keyword(k) => write!(f, "keyword '{k}'"),
            Self::Identifier(name) => write!(f, "identifier '{name}'"),
            Self::Interp(_) => write!(f, "interpolation"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// A single token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Newlines and comments.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::NewLine | TokenKind::Comment { .. })
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if k == keyword)
    }
}
