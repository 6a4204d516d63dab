use std::fmt;

use crate::ast::{
    Attr, Attrs, BinaryOp, Binding, Bool, Comment, Comments, Conditional, Destructured, Expr,
    Float, FnCall, FnParam, FnParams, Function, IdentSegment, Identifier, Import, Inherit, Int,
    Interp, LetIn, List, Modifier, ModifierKind, Operator, Paren, PathLit, Root, StringLit,
    StringPart, SubExpr, UnaryExpr, UnaryOp, Value,
};
use crate::token::{Keyword, Position, Span, StringPart as TokenPart, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was required here.
    Expected { expected: String },
    /// No expression can start with this token.
    UnexpectedToken,
    /// Keyword that cannot start an expression, e.g. a stray `then`.
    UnexpectedKeyword(Keyword),
    /// Expected a name, string or interpolation in an attribute path.
    ExpectedIdentifier,
    /// A destructured parameter was not followed by `,` or `}`.
    ExpectedParamSeparator,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected } => write!(f, "expected {expected}"),
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::UnexpectedKeyword(_) => write!(f, "unexpected keyword"),
            Self::ExpectedIdentifier => write!(f, "expected identifier"),
            Self::ExpectedParamSeparator => {
                write!(f, "expected ',' or '}}' after parameter")
            }
        }
    }
}

/// Error produced during parsing. Carries the offending token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "{kind}, found {} at line {}, column {}",
    token.kind,
    token.span.start.line,
    token.span.start.column
)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub token: Token,
}

/// Lex and parse Nix source text.
///
/// # Errors
///
/// Returns [`crate::Error::Lex`] or [`crate::Error::Parse`] for the
/// first problem found.
pub fn parse(source: &str) -> Result<Root, crate::Error> {
    let tokens = crate::lexer::lex(source)?;
    Ok(parse_tokens(&tokens)?)
}

/// Parse a token stream produced by [`crate::lex`].
///
/// # Errors
///
/// Returns `ParseError` when a required token is missing, a token
/// cannot start an expression, or input remains after the top-level
/// expression.
pub fn parse_tokens(tokens: &[Token]) -> Result<Root, ParseError> {
    let end = tokens
        .last()
        .map_or_else(|| Position::new(1, 1, 0), |t| t.span.end);
    let expr = Parser::new(tokens, end).parse_complete()?;
    tracing::debug!(tokens = tokens.len(), "parsed expression");
    let span = expr.span();
    Ok(Root { expr, span })
}

/// Where an expression appears. Only `Expr` consumes binary operators
/// and juxtaposed call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Expr,
    CallArg,
    ListItem,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Location reported when the slice runs out.
    end: Position,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token], end: Position) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    /// One expression followed by nothing but trivia.
    fn parse_complete(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr(Context::Expr)?;
        self.skip_trivia();
        if self.peek().is_some() {
            return Err(self.error(ParseErrorKind::UnexpectedToken));
        }
        Ok(expr)
    }

    // Expressions

    /// Precedence climbing over sub-expressions.
    ///
    /// An operator that binds looser than the last one seen becomes the
    /// new root. Anything else replaces the right operand of the most
    /// recently built node, so equal tiers nest to the right.
    fn parse_expr(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let mut root = Expr::Sub(Box::new(self.parse_sub_expr(ctx)?));
        if ctx != Context::Expr {
            return Ok(root);
        }

        let mut current = 0;
        // depth of the last built node along the right spine
        let mut last = 0;

        while let Some(op) = self.peek_operator() {
            self.skip_trivia();
            let span = self.bump_span();
            let rhs = Expr::Sub(Box::new(self.parse_sub_expr(ctx)?));
            let operator = Operator { op, span };

            if matches!(root, Expr::Sub(_)) || op.precedence() > current {
                root = Expr::binary(operator, root, rhs);
                last = 0;
            } else {
                root = graft(root, last, operator, rhs);
                last += 1;
            }
            current = op.precedence();
        }

        Ok(root)
    }

    fn peek_operator(&self) -> Option<BinaryOp> {
        let token = self.peek_past_trivia()?;
        if token.is_keyword(Keyword::Or) {
            return Some(BinaryOp::Fallback);
        }
        BinaryOp::from_token(&token.kind)
    }

    fn parse_sub_expr(&mut self, ctx: Context) -> Result<SubExpr, ParseError> {
        let mut modifiers = Vec::new();
        let mut before = Vec::new();
        loop {
            let found = self.parse_modifiers()?;
            let comments = self.parse_comments();
            if found.is_empty() && comments.is_empty() {
                break;
            }
            modifiers.extend(found);
            before.extend(comments);
        }

        let mut value = self.parse_operand(ctx)?;

        if ctx == Context::Expr && value.is_callable() {
            let args = self.parse_call_args()?;
            if let Some(last) = args.last() {
                let span = value.span().to(last.span());
                value = Value::FnCall(FnCall {
                    callee: Box::new(value),
                    args,
                    span,
                });
            }
        }

        let after = self.parse_comments();

        let start = modifiers.first().map_or_else(|| value.span(), |m| m.span);
        let span = start.to(value.span());

        Ok(SubExpr {
            modifiers,
            comments: Comments { before, after },
            value,
            span,
        })
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while self
            .peek_past_trivia()
            .is_some_and(|t| starts_call_arg(&t.kind))
        {
            args.push(Expr::Sub(Box::new(self.parse_sub_expr(Context::CallArg)?)));
        }
        Ok(args)
    }

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, ParseError> {
        let mut modifiers = Vec::new();
        loop {
            self.skip_newlines();
            let kind = match self.peek() {
                Some(t) if t.is_keyword(Keyword::With) => ModifierKind::With,
                Some(t) if t.is_keyword(Keyword::Assert) => ModifierKind::Assert,
                _ => return Ok(modifiers),
            };
            let start = self.bump_span();
            let expr = self.parse_expr(Context::Expr)?;
            let semi = self.expect(&TokenKind::Semi)?;
            modifiers.push(Modifier {
                kind,
                expr,
                span: start.to(semi.span),
            });
        }
    }

    fn parse_comments(&mut self) -> Vec<Comment> {
        let mut comments = Vec::new();
        loop {
            self.skip_newlines();
            let Some(token) = self.peek() else {
                return comments;
            };
            let TokenKind::Comment { text, multiline } = &token.kind else {
                return comments;
            };
            comments.push(Comment {
                text: text.clone(),
                multiline: *multiline,
                span: token.span,
            });
            self.pos += 1;
        }
    }

    /// Unary prefix or a primary.
    fn parse_operand(&mut self, ctx: Context) -> Result<Value, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error(ParseErrorKind::UnexpectedToken));
        };

        let op = match token.kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Sub => UnaryOp::Negate,
            _ => return self.parse_primary(),
        };
        self.pos += 1;

        // `-` directly before a number is part of the literal
        let literal = match (op, self.peek()) {
            (UnaryOp::Negate, Some(next)) => {
                let span = token.span.to(next.span);
                match next.kind {
                    TokenKind::Int(n) => Some(Value::Int(Int { value: -n, span })),
                    TokenKind::Float(n) => Some(Value::Float(Float { value: -n, span })),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(literal) = literal {
            self.pos += 1;
            return Ok(literal);
        }

        let operand = Expr::Sub(Box::new(self.parse_sub_expr(ctx)?));
        let span = token.span.to(operand.span());
        Ok(Value::Unary(Box::new(UnaryExpr { op, operand, span })))
    }

    fn parse_primary(&mut self) -> Result<Value, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error(ParseErrorKind::UnexpectedToken));
        };
        let span = token.span;

        let value = match &token.kind {
            TokenKind::Null => {
                self.pos += 1;
                Value::Null(span)
            }
            TokenKind::Bool(value) => {
                self.pos += 1;
                Value::Bool(Bool {
                    value: *value,
                    span,
                })
            }
            TokenKind::Int(value) => {
                self.pos += 1;
                Value::Int(Int {
                    value: *value,
                    span,
                })
            }
            TokenKind::Float(value) => {
                self.pos += 1;
                Value::Float(Float {
                    value: *value,
                    span,
                })
            }
            TokenKind::Path(value) => {
                self.pos += 1;
                Value::Path(PathLit {
                    value: value.clone(),
                    span,
                })
            }
            TokenKind::Str { .. } => Value::String(self.parse_string()?),
            TokenKind::Interp(tokens) => {
                self.pos += 1;
                Value::Interp(parse_interp(tokens, span)?)
            }
            TokenKind::OpenBracket => Value::List(self.parse_list()?),
            TokenKind::OpenCurly => {
                if self.is_destructured_at(self.pos, false) {
                    Value::Function(Box::new(self.parse_destructured_fn(None)?))
                } else {
                    Value::Attrs(self.parse_attrs(span, false)?)
                }
            }
            TokenKind::Identifier(name) => match self.kind_at(self.pos + 1) {
                Some(TokenKind::Colon) => {
                    self.pos += 2;
                    let param = Identifier {
                        segments: vec![IdentSegment::Name(name.clone())],
                        comments: Vec::new(),
                        span,
                    };
                    let body = self.parse_expr(Context::Expr)?;
                    Value::Function(Box::new(Function {
                        span: span.to(body.span()),
                        params: FnParams::Named(param),
                        body,
                    }))
                }
                Some(TokenKind::At) if self.is_destructured_at(self.pos + 2, true) => {
                    let alias = self.parse_identifier()?;
                    self.pos += 1;
                    Value::Function(Box::new(self.parse_destructured_fn(Some(alias))?))
                }
                _ => Value::Identifier(self.parse_identifier()?),
            },
            TokenKind::OpenParen => {
                self.pos += 1;
                let expr = self.parse_expr(Context::Expr)?;
                let close = self.expect(&TokenKind::CloseParen)?;
                Value::Paren(Paren {
                    expr,
                    span: span.to(close.span),
                })
            }
            TokenKind::Keyword(keyword) => self.parse_keyword(*keyword)?,
            _ => return Err(self.error(ParseErrorKind::UnexpectedToken)),
        };

        Ok(value)
    }

    fn parse_keyword(&mut self, keyword: Keyword) -> Result<Value, ParseError> {
        match keyword {
            Keyword::Let => Ok(Value::LetIn(Box::new(self.parse_let_in()?))),
            Keyword::Import => {
                let start = self.bump_span();
                let expr = Expr::Sub(Box::new(self.parse_sub_expr(Context::CallArg)?));
                Ok(Value::Import(Box::new(Import {
                    span: start.to(expr.span()),
                    expr,
                })))
            }
            Keyword::If => Ok(Value::Conditional(Box::new(self.parse_conditional()?))),
            Keyword::Rec => {
                let start = self.bump_span();
                Ok(Value::Attrs(self.parse_attrs(start, true)?))
            }
            _ => Err(self.error(ParseErrorKind::UnexpectedKeyword(keyword))),
        }
    }

    fn parse_let_in(&mut self) -> Result<LetIn, ParseError> {
        let start = self.bump_span();
        let mut bindings = Vec::new();
        let mut comments = Vec::new();

        loop {
            match self.peek_past_trivia() {
                None => {
                    self.skip_trivia();
                    return Err(self.expected(&TokenKind::Keyword(Keyword::In)));
                }
                Some(t) if t.is_keyword(Keyword::In) => {
                    let trailing = self.parse_comments();
                    attach_to_last_attr(&mut bindings, trailing, &mut comments);
                    break;
                }
                Some(_) => bindings.push(self.parse_attr()?),
            }
        }

        self.expect(&TokenKind::Keyword(Keyword::In))?;
        let body = self.parse_expr(Context::Expr)?;

        Ok(LetIn {
            bindings,
            comments,
            span: start.to(body.span()),
            body,
        })
    }

    fn parse_conditional(&mut self) -> Result<Conditional, ParseError> {
        let start = self.bump_span();
        let condition = self.parse_expr(Context::Expr)?;
        self.expect(&TokenKind::Keyword(Keyword::Then))?;
        let then_branch = self.parse_expr(Context::Expr)?;
        self.expect(&TokenKind::Keyword(Keyword::Else))?;
        let else_branch = self.parse_expr(Context::Expr)?;

        Ok(Conditional {
            span: start.to(else_branch.span()),
            condition,
            then_branch,
            else_branch,
        })
    }

    // Literals

    fn parse_string(&mut self) -> Result<StringLit, ParseError> {
        let Some(Token {
            kind: TokenKind::Str { parts, multiline },
            span,
        }) = self.peek()
        else {
            return Err(self.error(ParseErrorKind::UnexpectedToken));
        };
        self.pos += 1;

        let parts = parts
            .iter()
            .map(|part| match part {
                TokenPart::Text(text) => Ok(StringPart::Text(text.clone())),
                TokenPart::Interp { tokens, span } => {
                    parse_interp(tokens, *span).map(StringPart::Interp)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StringLit {
            parts,
            multiline: *multiline,
            span: *span,
        })
    }

    /// Attribute path: segments joined by `.` with no space-sensitive
    /// lookahead past the last segment.
    fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        let mut segments = Vec::new();
        let mut span: Option<Span> = None;

        loop {
            let Some(token) = self.peek() else {
                return Err(self.error(ParseErrorKind::ExpectedIdentifier));
            };
            let segment = match &token.kind {
                TokenKind::Identifier(name) => {
                    self.pos += 1;
                    IdentSegment::Name(name.clone())
                }
                TokenKind::Str { .. } => IdentSegment::String(self.parse_string()?),
                TokenKind::Interp(tokens) => {
                    self.pos += 1;
                    IdentSegment::Interp(parse_interp(tokens, token.span)?)
                }
                _ => return Err(self.error(ParseErrorKind::ExpectedIdentifier)),
            };
            segments.push(segment);
            span = Some(span.map_or(token.span, |s| s.to(token.span)));

            if !matches!(self.kind_at(self.pos), Some(TokenKind::Period)) {
                break;
            }
            self.pos += 1;
        }

        Ok(Identifier {
            segments,
            comments: Vec::new(),
            span: span.unwrap_or_default(),
        })
    }

    // Collections

    fn parse_list(&mut self) -> Result<List, ParseError> {
        let start = self.bump_span();
        let mut items: Vec<Expr> = Vec::new();
        let mut comments = Vec::new();

        loop {
            match self.peek_past_trivia().map(|t| &t.kind) {
                None => {
                    self.skip_trivia();
                    return Err(self.expected(&TokenKind::CloseBracket));
                }
                Some(TokenKind::CloseBracket) => {
                    let trailing = self.parse_comments();
                    match items.last_mut() {
                        Some(Expr::Sub(last)) => last.comments.after.extend(trailing),
                        _ => comments.extend(trailing),
                    }
                    break;
                }
                Some(_) => {
                    let mut item = self.parse_expr(Context::ListItem)?;
                    if let (Some(Expr::Sub(prev)), Expr::Sub(next)) = (items.last_mut(), &mut item)
                    {
                        if !prev.comments.after.is_empty() {
                            let mut moved = std::mem::take(&mut prev.comments.after);
                            moved.append(&mut next.comments.before);
                            next.comments.before = moved;
                        }
                    }
                    items.push(item);
                }
            }
        }

        let close = self.expect(&TokenKind::CloseBracket)?;

        Ok(List {
            items,
            comments,
            span: start.to(close.span),
        })
    }

    /// `{ ... }`, with `start` covering a leading `rec` when present.
    fn parse_attrs(&mut self, start: Span, recursive: bool) -> Result<Attrs, ParseError> {
        self.expect(&TokenKind::OpenCurly)?;
        let mut attrs = Vec::new();
        let mut comments = Vec::new();

        loop {
            match self.peek_past_trivia().map(|t| &t.kind) {
                None => {
                    self.skip_trivia();
                    return Err(self.expected(&TokenKind::CloseCurly));
                }
                Some(TokenKind::CloseCurly) => {
                    let trailing = self.parse_comments();
                    attach_to_last_attr(&mut attrs, trailing, &mut comments);
                    break;
                }
                Some(_) => attrs.push(self.parse_attr()?),
            }
        }

        let close = self.expect(&TokenKind::CloseCurly)?;

        Ok(Attrs {
            recursive,
            attrs,
            comments,
            span: start.to(close.span),
        })
    }

    fn parse_attr(&mut self) -> Result<Attr, ParseError> {
        let mut comments = self.parse_comments();

        if self.peek().is_some_and(|t| t.is_keyword(Keyword::Inherit)) {
            return self.parse_inherit(comments).map(Attr::Inherit);
        }

        let name = self.parse_identifier()?;
        comments.extend(self.parse_comments());
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr(Context::Expr)?;
        let semi = self.expect(&TokenKind::Semi)?;

        Ok(Attr::Binding(Binding {
            span: name.span.to(semi.span),
            name,
            value,
            comments,
        }))
    }

    fn parse_inherit(&mut self, mut comments: Vec<Comment>) -> Result<Inherit, ParseError> {
        let start = self.bump_span();

        let from = if matches!(
            self.peek_past_trivia().map(|t| &t.kind),
            Some(TokenKind::OpenParen)
        ) {
            comments.extend(self.parse_comments());
            self.pos += 1;
            let expr = self.parse_expr(Context::Expr)?;
            self.expect(&TokenKind::CloseParen)?;
            Some(expr)
        } else {
            None
        };

        let mut names = Vec::new();
        loop {
            let leading = self.parse_comments();
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Semi) => {
                    comments.extend(leading);
                    break;
                }
                None => return Err(self.expected(&TokenKind::Semi)),
                Some(_) => {
                    let mut name = self.parse_identifier()?;
                    name.comments = leading;
                    names.push(name);
                }
            }
        }

        let semi = self.expect(&TokenKind::Semi)?;

        Ok(Inherit {
            from,
            names,
            comments,
            span: start.to(semi.span),
        })
    }

    // Functions

    /// Whether the tokens at `from` form a `{ ... }` pattern followed by
    /// `:`, or by `@` when no alias precedes it. Nothing is consumed.
    fn is_destructured_at(&self, from: usize, aliased: bool) -> bool {
        let rest = self.tokens.get(from..).unwrap_or_default();
        if !matches!(rest.first().map(|t| &t.kind), Some(TokenKind::OpenCurly)) {
            return false;
        }

        let mut depth = 0usize;
        for (i, token) in rest.iter().enumerate() {
            match token.kind {
                TokenKind::OpenCurly => depth += 1,
                TokenKind::CloseCurly => {
                    depth -= 1;
                    if depth == 0 {
                        let after = rest[i + 1..].iter().find(|t| !t.is_trivia());
                        return match after.map(|t| &t.kind) {
                            Some(TokenKind::Colon) => true,
                            Some(TokenKind::At) => !aliased,
                            _ => false,
                        };
                    }
                }
                _ => {}
            }
        }

        false
    }

    fn parse_destructured_fn(
        &mut self,
        prefix_alias: Option<Identifier>,
    ) -> Result<Function, ParseError> {
        let open = self.expect(&TokenKind::OpenCurly)?;
        let mut params = Vec::new();
        let mut extra = false;

        let mut comments = loop {
            let leading = self.parse_comments();
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::CloseCurly) => break leading,
                Some(TokenKind::Ellipsis) => {
                    self.pos += 1;
                    extra = true;
                    let mut trailing = leading;
                    trailing.extend(self.parse_comments());
                    break trailing;
                }
                _ => {}
            }

            params.push(self.parse_fn_param(leading)?);

            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::CloseCurly) => {}
                _ => return Err(self.error(ParseErrorKind::ExpectedParamSeparator)),
            }
        };

        let close = self.expect(&TokenKind::CloseCurly)?;
        comments.extend(self.parse_comments());

        let (alias, span) = match prefix_alias {
            Some(alias) => {
                let span = alias.span.to(close.span);
                (Some(alias), span)
            }
            None if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::At)) => {
                self.pos += 1;
                comments.extend(self.parse_comments());
                let alias = self.parse_identifier()?;
                comments.extend(self.parse_comments());
                let span = open.span.to(alias.span);
                (Some(alias), span)
            }
            None => (None, open.span.to(close.span)),
        };

        self.expect(&TokenKind::Colon)?;
        let body = self.parse_expr(Context::Expr)?;

        tracing::trace!(
            params = params.len(),
            extra,
            aliased = alias.is_some(),
            "parsed destructured function"
        );

        Ok(Function {
            span: span.to(body.span()),
            params: FnParams::Destructured(Destructured {
                params,
                extra,
                alias,
                comments,
                span,
            }),
            body,
        })
    }

    /// `name` or `name ? default`. Comments after the name or the default,
    /// before the separator, stay with the parameter.
    fn parse_fn_param(&mut self, mut comments: Vec<Comment>) -> Result<FnParam, ParseError> {
        let name = self.parse_identifier()?;
        comments.extend(self.parse_comments());

        let default = if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Has)) {
            self.pos += 1;
            Some(self.parse_expr(Context::Expr)?)
        } else {
            None
        };

        comments.extend(self.parse_comments());

        let span = default
            .as_ref()
            .map_or(name.span, |d| name.span.to(d.span()));

        Ok(FnParam {
            name,
            default,
            comments,
            span,
        })
    }

    // Cursor

    /// The current token, `None` at the end of the slice or on `Eof`.
    fn peek(&self) -> Option<&'a Token> {
        self.tokens
            .get(self.pos)
            .filter(|t| !matches!(t.kind, TokenKind::Eof))
    }

    fn kind_at(&self, index: usize) -> Option<&'a TokenKind> {
        self.tokens.get(index).map(|t| &t.kind)
    }

    fn peek_past_trivia(&self) -> Option<&'a Token> {
        self.tokens
            .get(self.pos..)
            .unwrap_or_default()
            .iter()
            .find(|t| !t.is_trivia())
            .filter(|t| !matches!(t.kind, TokenKind::Eof))
    }

    /// Consume the current token and return its span.
    fn bump_span(&mut self) -> Span {
        let span = self
            .tokens
            .get(self.pos)
            .map_or_else(|| Span::point(self.end), |t| t.span);
        self.pos += 1;
        span
    }

    fn skip_newlines(&mut self) {
        while matches!(self.kind_at(self.pos), Some(TokenKind::NewLine)) {
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        while self.tokens.get(self.pos).is_some_and(Token::is_trivia) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&'a Token, ParseError> {
        self.skip_newlines();
        match self.peek() {
            Some(token) if token.kind == *kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.expected(kind)),
        }
    }

    fn expected(&self, kind: &TokenKind) -> ParseError {
        self.error(ParseErrorKind::Expected {
            expected: kind.to_string(),
        })
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, Span::point(self.end)));
        ParseError { kind, token }
    }
}

/// Parse the inner tokens of `${ ... }` on their own.
fn parse_interp(tokens: &[Token], span: Span) -> Result<Interp, ParseError> {
    tracing::trace!(
        tokens = tokens.len(),
        line = span.start.line,
        "parsing interpolation"
    );
    let expr = Parser::new(tokens, span.end).parse_complete()?;
    Ok(Interp { expr, span })
}

/// Replace the right operand of the node `depth` steps down the right
/// spine with `right_operand op rhs`, refreshing spans on the way up.
fn graft(expr: Expr, depth: usize, op: Operator, rhs: Expr) -> Expr {
    match expr {
        Expr::Binary(bin) => {
            let mut node = *bin;
            node.right = if depth == 0 {
                Expr::binary(op, node.right, rhs)
            } else {
                graft(node.right, depth - 1, op, rhs)
            };
            node.span = node.left.span().to(node.right.span());
            Expr::Binary(Box::new(node))
        }
        sub @ Expr::Sub(_) => Expr::binary(op, sub, rhs),
    }
}

/// Whether `kind` can begin a juxtaposed call argument. `rec` is the one
/// keyword that can, since it opens an attribute set.
fn starts_call_arg(kind: &TokenKind) -> bool {
    if matches!(kind, TokenKind::Keyword(Keyword::Rec)) {
        return true;
    }
    !matches!(
        kind,
        TokenKind::Comma
            | TokenKind::Semi
            | TokenKind::CloseCurly
            | TokenKind::CloseBracket
            | TokenKind::CloseParen
            | TokenKind::Keyword(_)
            | TokenKind::Eq
            | TokenKind::Colon
            | TokenKind::At
            | TokenKind::Ellipsis
    ) && BinaryOp::from_token(kind).is_none()
}

fn attach_to_last_attr(attrs: &mut [Attr], trailing: Vec<Comment>, fallback: &mut Vec<Comment>) {
    match attrs.last_mut() {
        Some(attr) => attr.comments_mut().extend(trailing),
        None => fallback.extend(trailing),
    }
}
