//! Whole files taken from real Nix configurations.

mod common;

use common::{parse_ok, render, render_source};
use nixparse::ast::{Attr, Attrs, Binding, Expr, FnParams, Value};
use nixparse::{BinaryOp, lex};

const HOME_MODULE: &str = include_str!("fixtures/home-module.nix");
const GVARIANT: &str = include_str!("fixtures/gvariant.nix");
const SNOWFALL_LIB: &str = include_str!("fixtures/snowfall-lib.nix");
const FLAKE: &str = include_str!("fixtures/flake.nix");

fn attrs_of(expr: &Expr) -> &Attrs {
    match expr.value() {
        Some(Value::Attrs(attrs)) => attrs,
        other => panic!("expected attrs, got {other:?}"),
    }
}

fn binding<'a>(attrs: &'a [Attr], name: &str) -> &'a Binding {
    attrs
        .iter()
        .find_map(|attr| match attr {
            Attr::Binding(b) if common::render_ident(&b.name) == name => Some(b),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no binding named {name}"))
}

#[test]
fn all_samples_lex_and_parse() {
    for (name, source) in [
        ("home-module.nix", HOME_MODULE),
        ("gvariant.nix", GVARIANT),
        ("snowfall-lib.nix", SNOWFALL_LIB),
        ("flake.nix", FLAKE),
    ] {
        let tokens = lex(source).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert!(tokens.len() > 10, "{name}");
        let root = parse_ok(source);
        assert_eq!(root.span.start.line, 1, "{name}");
    }
}

// -----------------------------------------------------------
// home-module.nix
// -----------------------------------------------------------

#[test]
fn home_module_parameters() {
    let root = parse_ok(HOME_MODULE);
    let Some(Value::Function(f)) = root.expr.value() else {
        panic!("expected function");
    };
    let FnParams::Destructured(d) = &f.params else {
        panic!("expected destructured params");
    };

    let names: Vec<String> = d.params.iter().map(|p| common::render_ident(&p.name)).collect();
    assert_eq!(
        names,
        vec!["config", "pkgs", "system", "target", "format", "host", "virtual", "systems"]
    );
    assert!(d.extra);
    assert_eq!(d.alias.as_ref().map(common::render_ident), Some("args".to_string()));

    let virtual_default = d.params[6].default.as_ref().expect("default");
    assert_eq!(
        render(virtual_default),
        "((snowfall-lib.system.is-virtual target))"
    );
    assert_eq!(d.span.start.line, 1);
    assert_eq!(d.span.end.line, 10);
}

#[test]
fn home_module_body() {
    let root = parse_ok(HOME_MODULE);
    let Some(Value::Function(f)) = root.expr.value() else {
        panic!("expected function");
    };
    let body = attrs_of(&f.body);
    assert_eq!(body.attrs.len(), 2);

    let config = attrs_of(&binding(&body.attrs, "config").value);
    let extra = attrs_of(&binding(&config.attrs, "home-manager.extraSpecialArgs").value);
    let Attr::Inherit(inherit) = &extra.attrs[0] else {
        panic!("expected inherit");
    };
    assert_eq!(inherit.names.len(), 6);
    assert_eq!(
        render(&binding(&extra.attrs, "inputs").value),
        "(snowfall-lib.flake.without-src user-inputs)"
    );
    assert_eq!(root.span.end.line, 23);
}

// -----------------------------------------------------------
// snowfall-lib.nix
// -----------------------------------------------------------

#[test]
fn snowfall_lib_shape() {
    assert_eq!(
        render_source(SNOWFALL_LIB),
        "{ snowfall-top-level-lib = (filterAttrs ((name: (value: (!(builtins.isAttrs value))))) snowfall-lib); \
         base-lib = (merge-shallow [ core-inputs.nixpkgs.lib core-inputs-libs user-inputs-libs snowfall-top-level-lib { snowfall = snowfall-lib; } ]); }"
    );
}

// -----------------------------------------------------------
// gvariant.nix
// -----------------------------------------------------------

#[test]
fn gvariant_rec_attrs_as_argument() {
    let root = parse_ok(GVARIANT);
    let outer = attrs_of(&root.expr);
    let Some(Value::FnCall(call)) = binding(&outer.attrs, "gvariant").value.value() else {
        panic!("expected call");
    };
    assert_eq!(call.args.len(), 1);
    let inner = attrs_of(&call.args[0]);
    assert!(inner.recursive);
    assert_eq!(inner.span.start.line, 2);
    assert_eq!(inner.span.start.column, 27);
}

#[test]
fn gvariant_let_bindings() {
    let root = parse_ok(GVARIANT);
    let outer = attrs_of(&root.expr);
    let Some(Value::FnCall(call)) = binding(&outer.attrs, "gvariant").value.value() else {
        panic!("expected call");
    };
    let merge = &binding(&attrs_of(&call.args[0]).attrs, "merge").value;

    // loc: defs: let ... in ...
    let Some(Value::Function(loc)) = merge.value() else {
        panic!("expected function");
    };
    let Some(Value::Function(defs)) = loc.body.value() else {
        panic!("expected curried function");
    };
    let Some(Value::LetIn(let_in)) = defs.body.value() else {
        panic!("expected let");
    };
    assert_eq!(let_in.bindings.len(), 6);

    assert_eq!(
        render(&binding(&let_in.bindings, "sameOrNull").value),
        "(x: (y: (if (x == y) then y else null)))"
    );
    assert_eq!(
        render(&binding(&let_in.bindings, "sharedDefType").value),
        "(foldl' sameOrNull ((head defTypes)) defTypes)"
    );

    let commented = binding(&let_in.bindings, "sharedDefType");
    assert_eq!(commented.comments.len(), 1);
    assert!(commented.comments[0].text.contains("naive"));

    let Some(Value::Conditional(cond)) = let_in.body.value() else {
        panic!("expected conditional");
    };
    assert_eq!(
        render(&cond.condition),
        "((gvar.isArray sharedDefType) && allChecked)"
    );
    let then_branch = cond.then_branch.as_binary().expect("binary");
    assert_eq!(then_branch.op.op, BinaryOp::Update);
    assert_eq!(
        render(&cond.else_branch),
        "(mergeDefaultOption loc defs)"
    );
}

// -----------------------------------------------------------
// flake.nix
// -----------------------------------------------------------

#[test]
fn flake_outputs() {
    let root = parse_ok(FLAKE);
    let top = attrs_of(&root.expr);
    assert_eq!(top.attrs.len(), 3);

    let inputs = attrs_of(&binding(&top.attrs, "inputs").value);
    assert_eq!(
        render(&binding(&inputs.attrs, "nixpkgs.url").value),
        "\"github:nixos/nixpkgs/nixos-unstable\""
    );

    let Some(Value::Function(outputs)) = binding(&top.attrs, "outputs").value.value() else {
        panic!("expected function");
    };
    let FnParams::Destructured(d) = &outputs.params else {
        panic!("expected destructured params");
    };
    assert_eq!(d.params.len(), 3);
    assert!(d.extra);
    assert_eq!(d.alias.as_ref().map(common::render_ident), Some("inputs".to_string()));

    let Some(Value::FnCall(call)) = outputs.body.value() else {
        panic!("expected call");
    };
    assert_eq!(
        common::render_value(&call.callee),
        "flake-utils.lib.eachDefaultSystem"
    );
    assert_eq!(call.args.len(), 1);
}

#[test]
fn flake_let_bindings() {
    let root = parse_ok(FLAKE);
    let top = attrs_of(&root.expr);
    let Some(Value::Function(outputs)) = binding(&top.attrs, "outputs").value.value() else {
        panic!("expected function");
    };
    let Some(Value::FnCall(call)) = outputs.body.value() else {
        panic!("expected call");
    };
    let Some(Value::Paren(paren)) = call.args[0].value() else {
        panic!("expected parenthesized argument");
    };
    let Some(Value::Function(per_system)) = paren.expr.value() else {
        panic!("expected function");
    };
    let Some(Value::LetIn(let_in)) = per_system.body.value() else {
        panic!("expected let");
    };

    assert_eq!(
        render(&binding(&let_in.bindings, "pkgs").value),
        "((import nixpkgs) { inherit system; })"
    );

    let deps = binding(&let_in.bindings, "deps");
    assert!(deps.comments[0].multiline);
    assert_eq!(render(&deps.value), "with pkgs; [ openssl pkg-config ]");

    let outputs = attrs_of(&let_in.body);
    let shell = binding(&outputs.attrs, "devShells.default");
    let Some(Value::FnCall(mk_shell)) = shell.value.value() else {
        panic!("expected call");
    };
    let shell_attrs = attrs_of(&mk_shell.args[0]);
    let Some(Value::String(hook)) = binding(&shell_attrs.attrs, "shellHook").value.value() else {
        panic!("expected string");
    };
    assert!(hook.multiline);
    assert_eq!(hook.parts.len(), 3);

    assert_eq!(
        render(&binding(&outputs.attrs, "packages.default").value),
        "assert ((builtins.length deps) > 0); pkgs.hello"
    );
}
