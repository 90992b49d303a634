//! AST for the description language.
//!
//! The tree is a pair of sum types: [`Stmt`] for statements and [`Expr`] for
//! the two expression forms (string literal, array of string literals).
//! Deriving `Clone` gives the deep clone the engine relies on: schema bodies
//! and module descriptions are re-instantiated from fresh clones so no
//! resolution state leaks between instantiations or resolution passes.

use std::fmt::Write as _;

use crate::dsl::token::SourceInfo;

/// A whole description file body (an ordered compound of statements).
pub type Program = Vec<Stmt>;

/// A string literal. `resolved` starts empty and is filled in lazily by the
/// execution engine on first visit (placeholder substitution).
#[derive(Debug, Clone, PartialEq)]
pub struct StringNode {
    pub literal: String,
    pub resolved: String,
    pub src: SourceInfo,
}

impl StringNode {
    pub fn new(literal: impl Into<String>, src: SourceInfo) -> Self {
        StringNode {
            literal: literal.into(),
            resolved: String::new(),
            src,
        }
    }
}

/// An ordered array of string literals.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    pub items: Vec<StringNode>,
    pub src: SourceInfo,
}

impl ArrayNode {
    /// The resolved values of every element, in order.
    pub fn resolved_values(&self) -> Vec<String> {
        self.items.iter().map(|s| s.resolved.clone()).collect()
    }
}

/// The shape of an expression, used as the directive overload dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprShape {
    String,
    Array,
}

/// An expression: either a string literal or an array of string literals.
/// Directive arguments and field-statement right-hand sides are expressions;
/// nothing else is.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    String(StringNode),
    Array(ArrayNode),
}

impl Expr {
    pub fn shape(&self) -> ExprShape {
        match self {
            Expr::String(_) => ExprShape::String,
            Expr::Array(_) => ExprShape::Array,
        }
    }

    pub fn src(&self) -> &SourceInfo {
        match self {
            Expr::String(s) => &s.src,
            Expr::Array(a) => &a.src,
        }
    }
}

/// A directive invocation: `Name(args...)` with an optional `{ ... }` body.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveNode {
    pub name: String,
    pub params: Vec<Expr>,
    pub body: Option<Program>,
    pub src: SourceInfo,
}

impl DirectiveNode {
    /// Resolved string argument at `idx`. Only call after overload dispatch
    /// has matched a shape placing a string at that position.
    pub fn string_arg(&self, idx: usize) -> &StringNode {
        match &self.params[idx] {
            Expr::String(s) => s,
            Expr::Array(_) => unreachable!("overload dispatch guaranteed a string argument"),
        }
    }

    /// Resolved array argument at `idx`. Only call after overload dispatch
    /// has matched a shape placing an array at that position.
    pub fn array_arg(&self, idx: usize) -> &ArrayNode {
        match &self.params[idx] {
            Expr::Array(a) => a,
            Expr::String(_) => unreachable!("overload dispatch guaranteed an array argument"),
        }
    }
}

/// A field mutation statement: the field name plus the value expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWrite {
    pub field: String,
    pub value: Expr,
    pub src: SourceInfo,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Noop,
    Directive(DirectiveNode),
    /// `field = expr;`
    Assign(FieldWrite),
    /// `field += expr;`
    Append(FieldWrite),
    /// `field -= expr;`
    Erase(FieldWrite),
    /// `~field;`
    Unassign { field: String, src: SourceInfo },
    /// `field ?= expr;` — only legal inside a deferred scope.
    DubiousAssign(FieldWrite),
}

/// Re-emit a program as description-language source.
///
/// Used by `validate --dump-ast` style tooling and to check the
/// emit-then-reparse round-trip property in tests. Noop statements are not
/// emitted; they carry no source content.
pub fn emit(program: &[Stmt]) -> String {
    let mut out = String::new();
    emit_into(program, 0, &mut out);
    out
}

fn emit_into(program: &[Stmt], depth: usize, out: &mut String) {
    for stmt in program {
        if matches!(stmt, Stmt::Noop) {
            continue;
        }
        indent(depth, out);
        match stmt {
            Stmt::Noop => {}
            Stmt::Directive(d) => {
                let _ = write!(out, "{}(", d.name);
                for (i, param) in d.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    emit_expr(param, out);
                }
                out.push(')');
                if let Some(body) = &d.body {
                    out.push('\n');
                    indent(depth, out);
                    out.push_str("{\n");
                    emit_into(body, depth + 1, out);
                    indent(depth, out);
                    out.push('}');
                }
            }
            Stmt::Assign(w) => {
                let _ = write!(out, "{} = ", w.field);
                emit_expr(&w.value, out);
            }
            Stmt::Append(w) => {
                let _ = write!(out, "{} += ", w.field);
                emit_expr(&w.value, out);
            }
            Stmt::Erase(w) => {
                let _ = write!(out, "{} -= ", w.field);
                emit_expr(&w.value, out);
            }
            Stmt::Unassign { field, .. } => {
                let _ = write!(out, "~{}", field);
            }
            Stmt::DubiousAssign(w) => {
                let _ = write!(out, "{} ?= ", w.field);
                emit_expr(&w.value, out);
            }
        }
        out.push_str(";\n");
    }
}

fn emit_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::String(s) => emit_string(s, out),
        Expr::Array(a) => {
            out.push('[');
            for (i, item) in a.items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                emit_string(item, out);
            }
            out.push(']');
        }
    }
}

fn emit_string(s: &StringNode, out: &mut String) {
    out.push('"');
    for c in s.literal.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\x08' => out.push_str("\\b"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '\x07' => out.push_str("\\a"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("    ");
    }
}

/// Render the AST as an indented tree for debugging (`validate --dump-ast`).
pub fn dump(program: &[Stmt]) -> String {
    let mut out = String::new();
    dump_into(program, 0, &mut out);
    out
}

fn dump_into(program: &[Stmt], depth: usize, out: &mut String) {
    for stmt in program {
        indent(depth, out);
        match stmt {
            Stmt::Noop => out.push_str("Noop\n"),
            Stmt::Directive(d) => {
                let _ = writeln!(out, "Directive {}", d.name);
                for param in &d.params {
                    indent(depth + 1, out);
                    dump_expr(param, out);
                }
                if let Some(body) = &d.body {
                    indent(depth + 1, out);
                    out.push_str("Body:\n");
                    dump_into(body, depth + 2, out);
                }
            }
            Stmt::Assign(w) => dump_write("Assign", w, depth, out),
            Stmt::Append(w) => dump_write("Append", w, depth, out),
            Stmt::Erase(w) => dump_write("Erase", w, depth, out),
            Stmt::Unassign { field, .. } => {
                let _ = writeln!(out, "Unassign {field}");
            }
            Stmt::DubiousAssign(w) => dump_write("DubiousAssign", w, depth, out),
        }
    }
}

fn dump_write(label: &str, w: &FieldWrite, depth: usize, out: &mut String) {
    let _ = writeln!(out, "{label} {}", w.field);
    indent(depth + 1, out);
    dump_expr(&w.value, out);
}

fn dump_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::String(s) => {
            let _ = writeln!(out, "String lit={:?} res={:?}", s.literal, s.resolved);
        }
        Expr::Array(a) => {
            let items: Vec<&str> = a.items.iter().map(|s| s.literal.as_str()).collect();
            let _ = writeln!(out, "Array {items:?}");
        }
    }
}
