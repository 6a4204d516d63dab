#![allow(dead_code)]

use nixparse::ast::{
    Attr, Attrs, Expr, FnParams, IdentSegment, Identifier, ModifierKind, StringLit, StringPart,
    UnaryOp, Value,
};
use nixparse::{Root, TokenKind, lex, parse};

/// Parse `input` and render its tree.
pub fn render_source(input: &str) -> String {
    let root = parse_ok(input);
    render(&root.expr)
}

pub fn parse_ok(input: &str) -> Root {
    parse(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
}

pub fn kinds(input: &str) -> Vec<TokenKind> {
    lex(input)
        .unwrap_or_else(|e| panic!("failed to tokenize {input:?}: {e}"))
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

/// Compact rendering with every binary node parenthesized, so tree
/// shape can be asserted as a string.
pub fn render(expr: &Expr) -> String {
    match expr {
        Expr::Binary(bin) => format!(
            "({} {} {})",
            render(&bin.left),
            bin.op.op.symbol(),
            render(&bin.right)
        ),
        Expr::Sub(sub) => {
            let mut parts: Vec<String> = sub
                .modifiers
                .iter()
                .map(|modifier| {
                    let keyword = match modifier.kind {
                        ModifierKind::With => "with",
                        ModifierKind::Assert => "assert",
                    };
                    format!("{keyword} {};", render(&modifier.expr))
                })
                .collect();
            parts.push(render_value(&sub.value));
            parts.join(" ")
        }
    }
}

pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null(_) => "null".to_string(),
        Value::Bool(b) => b.value.to_string(),
        Value::Int(n) => n.value.to_string(),
        Value::Float(n) => n.value.to_string(),
        Value::String(s) => render_string(s),
        Value::Path(p) => p.value.clone(),
        Value::Interp(i) => format!("${{{}}}", render(&i.expr)),
        Value::Identifier(ident) => render_ident(ident),
        Value::List(list) => {
            let items: Vec<String> = list.items.iter().map(render).collect();
            if items.is_empty() {
                "[ ]".to_string()
            } else {
                format!("[ {} ]", items.join(" "))
            }
        }
        Value::Attrs(attrs) => render_attrs(attrs),
        Value::Function(f) => {
            let params = match &f.params {
                FnParams::Named(ident) => render_ident(ident),
                FnParams::Destructured(d) => {
                    let mut parts: Vec<String> = d
                        .params
                        .iter()
                        .map(|p| match &p.default {
                            Some(default) => {
                                format!("{} ? {}", render_ident(&p.name), render(default))
                            }
                            None => render_ident(&p.name),
                        })
                        .collect();
                    if d.extra {
                        parts.push("...".to_string());
                    }
                    let pattern = format!("{{ {} }}", parts.join(", "));
                    match &d.alias {
                        Some(alias) => format!("{pattern} @ {}", render_ident(alias)),
                        None => pattern,
                    }
                }
            };
            format!("({params}: {})", render(&f.body))
        }
        Value::FnCall(call) => {
            let mut parts = vec![render_value(&call.callee)];
            parts.extend(call.args.iter().map(render));
            format!("({})", parts.join(" "))
        }
        Value::LetIn(let_in) => {
            let bindings: Vec<String> = let_in.bindings.iter().map(render_attr).collect();
            format!("(let {} in {})", bindings.join(" "), render(&let_in.body))
        }
        Value::Import(import) => format!("(import {})", render(&import.expr)),
        Value::Conditional(c) => format!(
            "(if {} then {} else {})",
            render(&c.condition),
            render(&c.then_branch),
            render(&c.else_branch)
        ),
        Value::Unary(unary) => {
            let op = match unary.op {
                UnaryOp::Not => "!",
                UnaryOp::Negate => "-",
            };
            format!("({op}{})", render(&unary.operand))
        }
        Value::Paren(paren) => format!("({})", render(&paren.expr)),
    }
}

pub fn render_ident(ident: &Identifier) -> String {
    ident
        .segments
        .iter()
        .map(|segment| match segment {
            IdentSegment::Name(name) => name.clone(),
            IdentSegment::String(s) => render_string(s),
            IdentSegment::Interp(i) => format!("${{{}}}", render(&i.expr)),
        })
        .collect::<Vec<_>>()
        .join(".")
}

pub fn render_string(s: &StringLit) -> String {
    let body: String = s
        .parts
        .iter()
        .map(|part| match part {
            StringPart::Text(text) => text.clone(),
            StringPart::Interp(i) => format!("${{{}}}", render(&i.expr)),
        })
        .collect();
    if s.multiline {
        format!("''{body}''")
    } else {
        format!("\"{body}\"")
    }
}

fn render_attrs(attrs: &Attrs) -> String {
    let rec = if attrs.recursive { "rec " } else { "" };
    if attrs.attrs.is_empty() {
        return format!("{rec}{{ }}");
    }
    let body: Vec<String> = attrs.attrs.iter().map(render_attr).collect();
    format!("{rec}{{ {} }}", body.join(" "))
}

fn render_attr(attr: &Attr) -> String {
    match attr {
        Attr::Binding(b) => format!("{} = {};", render_ident(&b.name), render(&b.value)),
        Attr::Inherit(i) => {
            let names: Vec<String> = i.names.iter().map(render_ident).collect();
            match &i.from {
                Some(from) => format!("inherit ({}) {};", render(from), names.join(" ")),
                None => format!("inherit {};", names.join(" ")),
            }
        }
    }
}
