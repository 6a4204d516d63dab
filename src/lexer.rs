use std::fmt;

use crate::token::{Keyword, Position, Span, StringPart, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Operator buffer that completes no entry of the operator table.
    UnknownOperator(String),
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// `"` or `''` string never closed.
    UnterminatedString,
    /// `${` never closed by a matching `}`.
    UnterminatedInterpolation,
    /// `/*` never closed by `*/`.
    UnterminatedComment,
    /// Numeric literal out of range.
    InvalidNumber(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOperator(op) => write!(f, "unknown operator: {op}"),
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::UnterminatedInterpolation => {
                write!(f, "unterminated interpolation, expected '}}'")
            }
            Self::UnterminatedComment => {
                write!(f, "unterminated block comment, expected '*/'")
            }
            Self::InvalidNumber(text) => write!(f, "invalid number: {text}"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.start.line, span.start.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize Nix source text.
///
/// The returned sequence always ends with a single [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns `LexError` on characters that start no token, unterminated
/// strings, interpolations or block comments, and out-of-range numbers.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).lex()?;
    tracing::debug!(tokens = tokens.len(), "lexed source");
    Ok(tokens)
}

/// Operators grow one character at a time while some entry still has
/// the buffer as a prefix.
const OPERATORS: &[&str] = &[
    "=", "==", "!=", "!", "+", "-", "*", "/", "->", "//", "++", "<", ">", "<=", ">=", ":", "@",
    "...", ",", "?", "||", "&&",
];

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let pos = if source.starts_with('\u{FEFF}') {
            '\u{FEFF}'.len_utf8()
        } else {
            0
        };
        Self {
            source,
            pos,
            line: 1,
            col: 1,
        }
    }

    fn lex(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let start = self.position();
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, Span::point(start)));
        };
        let next = self.peek_at(1);

        match ch {
            '.' if !matches!(next, Some('/' | '.')) => Ok(self.single(TokenKind::Period)),
            // whitespace skipping leaves a `\r` only when it starts `\r\n`
            '\n' | '\r' => Ok(self.single(TokenKind::NewLine)),
            ';' => Ok(self.single(TokenKind::Semi)),
            '(' => Ok(self.single(TokenKind::OpenParen)),
            ')' => Ok(self.single(TokenKind::CloseParen)),
            '{' => Ok(self.single(TokenKind::OpenCurly)),
            '}' => Ok(self.single(TokenKind::CloseCurly)),
            '[' => Ok(self.single(TokenKind::OpenBracket)),
            ']' => Ok(self.single(TokenKind::CloseBracket)),
            '$' if next == Some('{') => {
                let (tokens, span) = self.lex_interp()?;
                Ok(Token::new(TokenKind::Interp(tokens), span))
            }
            c if is_ident_start(c) => Ok(self.lex_ident()),
            '.' if next == Some('.') && self.peek_at(2) == Some('.') => self.lex_operator(),
            '/' if next == Some('*') => self.lex_block_comment(),
            c if is_path_start(c)
                && next.is_some_and(is_path_char)
                && !(c == '/' && next == Some('/')) =>
            {
                Ok(self.lex_path())
            }
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_operator_start(c) => self.lex_operator(),
            '"' => self.lex_string(false),
            '\'' if next == Some('\'') => self.lex_string(true),
            '#' => Ok(self.lex_line_comment()),
            c => {
                self.bump();
                Err(LexError {
                    kind: LexErrorKind::UnexpectedCharacter(c),
                    span: self.span_from(start),
                })
            }
        }
    }

    const fn position(&self) -> Position {
        Position::new(self.line, self.col, self.pos)
    }

    const fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.position())
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn at_newline(&self) -> bool {
        let rest = self.rest();
        rest.starts_with('\n') || rest.starts_with("\r\n")
    }

    /// Consume one unit of input and return its text. A `\r\n` pair is
    /// a single unit.
    fn bump(&mut self) -> &'a str {
        let rest = self.rest();
        let len = if rest.starts_with("\r\n") {
            2
        } else {
            rest.chars().next().map_or(0, char::len_utf8)
        };
        let text = &rest[..len];
        self.pos += len;

        if text == "\n" || text == "\r\n" {
            self.line += 1;
            self.col = 1;
        } else if !text.is_empty() {
            self.col += 1;
        }

        text
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.position();
        self.bump();
        Token::new(kind, self.span_from(start))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() || self.at_newline() {
                break;
            }
            self.bump();
        }
    }

    /// Lex `${ ... }`. Returns the inner tokens, without the closing
    /// brace, and the span of the whole interpolation.
    fn lex_interp(&mut self) -> Result<(Vec<Token>, Span), LexError> {
        let start = self.position();
        self.bump(); // $
        self.bump(); // {

        let mut depth = 0usize;
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::Eof => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedInterpolation,
                        span: self.span_from(start),
                    });
                }
                TokenKind::OpenCurly => depth += 1,
                TokenKind::CloseCurly => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            tokens.push(token);
        }

        tracing::trace!(tokens = tokens.len(), line = start.line, "lexed interpolation");

        Ok((tokens, self.span_from(start)))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.position();
        let begin = self.pos;

        self.bump();
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }

        let word = &self.source[begin..self.pos];
        let kind = match word {
            "null" => TokenKind::Null,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => Keyword::from_word(word)
                .map_or_else(|| TokenKind::Identifier(word.to_string()), TokenKind::Keyword),
        };

        Token::new(kind, self.span_from(start))
    }

    fn lex_path(&mut self) -> Token {
        let start = self.position();
        let mut value = String::from(self.bump());

        loop {
            match self.peek() {
                Some('\\') => {
                    // escaped character, e.g. `\ ` or `\;`
                    self.bump();
                    if self.peek().is_none() {
                        break;
                    }
                    value.push_str(self.bump());
                }
                Some(c) if is_path_char(c) => value.push_str(self.bump()),
                _ => break,
            }
        }

        Token::new(TokenKind::Path(value), self.span_from(start))
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        let start = self.position();
        let begin = self.pos;
        let mut is_float = false;

        self.bump();
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.bump();
                }
                Some('.') if !is_float && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    is_float = true;
                    self.bump();
                }
                _ => break,
            }
        }

        let text = &self.source[begin..self.pos];
        let span = self.span_from(start);
        let invalid = || LexError {
            kind: LexErrorKind::InvalidNumber(text.to_string()),
            span,
        };

        let kind = if is_float {
            TokenKind::Float(text.parse().map_err(|_| invalid())?)
        } else {
            TokenKind::Int(text.parse().map_err(|_| invalid())?)
        };

        Ok(Token::new(kind, span))
    }

    fn lex_operator(&mut self) -> Result<Token, LexError> {
        let start = self.position();
        let mut op = String::from(self.bump());

        while let Some(c) = self.peek() {
            let mut candidate = op.clone();
            candidate.push(c);
            if !OPERATORS.iter().any(|entry| entry.starts_with(&candidate)) {
                break;
            }
            op = candidate;
            self.bump();
        }

        let span = self.span_from(start);
        match operator_kind(&op) {
            Some(kind) => Ok(Token::new(kind, span)),
            None => Err(LexError {
                kind: LexErrorKind::UnknownOperator(op),
                span,
            }),
        }
    }

    fn lex_string(&mut self, multiline: bool) -> Result<Token, LexError> {
        let start = self.position();
        self.bump();
        if multiline {
            self.bump();
        }

        let mut parts = Vec::new();
        let mut text = String::new();

        loop {
            match self.peek() {
                None => return Err(self.unterminated_string(start)),
                Some('\'') if multiline && self.peek_at(1) == Some('\'') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some('"') if !multiline => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    if self.peek().is_none() {
                        return Err(self.unterminated_string(start));
                    }
                    text.push_str(unescape(self.bump()));
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    let (tokens, span) = self.lex_interp()?;
                    parts.push(StringPart::Text(std::mem::take(&mut text)));
                    parts.push(StringPart::Interp { tokens, span });
                }
                Some(_) => text.push_str(self.bump()),
            }
        }

        parts.push(StringPart::Text(text));

        Ok(Token::new(
            TokenKind::Str { parts, multiline },
            self.span_from(start),
        ))
    }

    const fn unterminated_string(&self, start: Position) -> LexError {
        LexError {
            kind: LexErrorKind::UnterminatedString,
            span: self.span_from(start),
        }
    }

    fn lex_line_comment(&mut self) -> Token {
        let start = self.position();
        self.bump(); // #

        let begin = self.pos;
        while self.peek().is_some() && !self.at_newline() {
            self.bump();
        }

        Token::new(
            TokenKind::Comment {
                text: self.source[begin..self.pos].to_string(),
                multiline: false,
            },
            self.span_from(start),
        )
    }

    fn lex_block_comment(&mut self) -> Result<Token, LexError> {
        let start = self.position();
        self.bump(); // /
        self.bump(); // *

        let begin = self.pos;
        loop {
            if self.rest().starts_with("*/") {
                let text = self.source[begin..self.pos].to_string();
                self.bump();
                self.bump();
                return Ok(Token::new(
                    TokenKind::Comment {
                        text,
                        multiline: true,
                    },
                    self.span_from(start),
                ));
            }
            if self.peek().is_none() {
                return Err(LexError {
                    kind: LexErrorKind::UnterminatedComment,
                    span: self.span_from(start),
                });
            }
            self.bump();
        }
    }
}

fn operator_kind(op: &str) -> Option<TokenKind> {
    let kind = match op {
        "=" => TokenKind::Eq,
        "==" => TokenKind::EqEq,
        "!=" => TokenKind::NotEq,
        "!" => TokenKind::Not,
        "+" => TokenKind::Add,
        "-" => TokenKind::Sub,
        "*" => TokenKind::Mul,
        "/" => TokenKind::Div,
        "->" => TokenKind::Imp,
        "//" => TokenKind::Update,
        "++" => TokenKind::Concat,
        "<" => TokenKind::Lt,
        ">" => TokenKind::Gt,
        "<=" => TokenKind::Lte,
        ">=" => TokenKind::Gte,
        ":" => TokenKind::Colon,
        "@" => TokenKind::At,
        "..." => TokenKind::Ellipsis,
        "," => TokenKind::Comma,
        "?" => TokenKind::Has,
        "||" => TokenKind::Or,
        "&&" => TokenKind::And,
        _ => return None,
    };
    Some(kind)
}

fn unescape(escaped: &str) -> &str {
    match escaped {
        "n" => "\n",
        "r" => "\r",
        "t" => "\t",
        other => other,
    }
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '-')
}

const fn is_path_start(c: char) -> bool {
    matches!(c, '.' | '/' | '~')
}

const fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '.' | '-' | '$' | '/' | '~')
}

const fn is_operator_start(c: char) -> bool {
    matches!(
        c,
        '=' | '!' | '+' | '-' | '*' | '/' | '<' | '>' | ':' | '@' | '.' | ',' | '?' | '|' | '&'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input)
            .expect("should tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_input_is_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn newlines_including_crlf() {
        let tokens = lex("\n\r\n\n").expect("should tokenize");
        assert_eq!(tokens.len(), 4);
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::NewLine));
        assert_eq!(tokens[1].span.start.line, 2);
        assert_eq!(tokens[1].span.end.line, 3);
        assert_eq!(tokens[1].span.end.offset, 3);
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("( ) { } [ ] ;"),
            vec![
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::OpenCurly,
                TokenKind::CloseCurly,
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn literals_and_keywords() {
        assert_eq!(
            kinds("null true false let in some-thing foldl'"),
            vec![
                TokenKind::Null,
                TokenKind::Bool(true),
                TokenKind::Bool(false),
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Keyword(Keyword::In),
                TokenKind::Identifier("some-thing".to_string()),
                TokenKind::Identifier("foldl'".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn period_vs_path() {
        assert_eq!(
            kinds("a.b ./c"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Period,
                TokenKind::Identifier("b".to_string()),
                TokenKind::Path("./c".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn escaped_path() {
        assert_eq!(
            kinds(r"/a\;/b\ c/d"),
            vec![TokenKind::Path("/a;/b c/d".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn update_is_not_a_path() {
        assert_eq!(
            kinds("a // b"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Update,
                TokenKind::Identifier("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 2.5"),
            vec![TokenKind::Int(42), TokenKind::Float(2.5), TokenKind::Eof]
        );
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            kinds("== != <= >= -> ++ || && ..."),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lte,
                TokenKind::Gte,
                TokenKind::Imp,
                TokenKind::Concat,
                TokenKind::Or,
                TokenKind::And,
                TokenKind::Ellipsis,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lone_pipe_is_unknown_operator() {
        let err = lex("a | b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownOperator("|".to_string()));
    }

    #[test]
    fn unexpected_character() {
        let err = lex("a % b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('%'));
        assert_eq!(err.span.start.column, 3);
    }

    #[test]
    fn string_with_interpolation() {
        let tokens = lex(r#""number ${1}""#).expect("should tokenize");
        let TokenKind::Str { parts, multiline } = &tokens[0].kind else {
            panic!("expected string, got {:?}", tokens[0].kind);
        };
        assert!(!multiline);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], StringPart::Text("number ".to_string()));
        let StringPart::Interp { tokens: inner, .. } = &parts[1] else {
            panic!("expected interpolation");
        };
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].kind, TokenKind::Int(1));
        assert_eq!(parts[2], StringPart::Text(String::new()));
    }

    #[test]
    fn string_escapes() {
        let tokens = lex(r#""a\"b\n\$""#).expect("should tokenize");
        assert_eq!(
            tokens[0].kind,
            TokenKind::Str {
                parts: vec![StringPart::Text("a\"b\n$".to_string())],
                multiline: false,
            }
        );
    }

    #[test]
    fn multiline_string_is_verbatim() {
        let tokens = lex("''\n\thello\n''").expect("should tokenize");
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[0].kind,
            TokenKind::Str {
                parts: vec![StringPart::Text("\n\thello\n".to_string())],
                multiline: true,
            }
        );
        assert_eq!(tokens[0].span.end.line, 3);
    }

    #[test]
    fn unterminated_string() {
        let err = lex("\"unclosed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn interpolation_excludes_closing_brace() {
        let tokens = lex("${ { a = 1; } }").expect("should tokenize");
        let TokenKind::Interp(inner) = &tokens[0].kind else {
            panic!("expected interpolation");
        };
        assert_eq!(inner.first().map(|t| &t.kind), Some(&TokenKind::OpenCurly));
        assert_eq!(inner.last().map(|t| &t.kind), Some(&TokenKind::CloseCurly));
        assert_eq!(tokens[0].span.end.column, 16);
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("# asdf\n/* a\nb */"),
            vec![
                TokenKind::Comment {
                    text: " asdf".to_string(),
                    multiline: false,
                },
                TokenKind::NewLine,
                TokenKind::Comment {
                    text: " a\nb ".to_string(),
                    multiline: true,
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn span_tracking() {
        let tokens = lex("a\n  bc").expect("should tokenize");
        assert_eq!(tokens[0].span.start, Position::new(1, 1, 0));
        assert_eq!(tokens[0].span.end, Position::new(1, 2, 1));
        assert_eq!(tokens[2].span.start, Position::new(2, 3, 4));
        assert_eq!(tokens[2].span.end, Position::new(2, 5, 6));
        assert_eq!(tokens[3].span, Span::point(Position::new(2, 5, 6)));
    }

    #[test]
    fn bom_stripping() {
        let tokens = lex("\u{FEFF}x").expect("should tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Identifier("x".to_string()));
        assert_eq!(tokens[0].span.start.column, 1);
    }
}
