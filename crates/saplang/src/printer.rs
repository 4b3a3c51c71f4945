//! AST → saplang source pretty-printer (spec.md §8 Q5).
//!
//! Grounded on `parser.rs`'s own grammar comments (the precedence ladder at
//! its `// ---- expression precedence ladder ----` block, the `for`/`defer`/
//! `extern` shapes documented inline there) — this module is the inverse of
//! that grammar: every `print_*` function mirrors the `parse_*` function of
//! the same shape. `(type)expr` casts and `Unary`'s operand are never a raw
//! `Binary` by construction (the parser only ever recurses through
//! `parse_unary` for both), so those never need defensive parentheses; only
//! `Binary`-under-`Binary` nesting needs precedence-aware parenthesisation,
//! handled by `binop_prec`.
//!
//! The printer is lossy in a few places where the AST itself dropped source
//! detail the grammar doesn't require to round-trip: `export var` loses its
//! `export` marker before this module ever sees it (`VarDecl` has no such
//! field), and enum declarations always print an explicit `: <underlying>`
//! even when the source omitted it (the default is baked into the AST by
//! the time it gets here). Both are stable under `print -> parse -> print`,
//! which is what Q5 asks for.

use crate::ast::{
    Block, EnumDecl, Expr, ExprKind, FunctionDecl, ParamDecl, ParsedFile, Stmt, StmtKind, StructDecl, TopLevelDecl, VarDecl,
};
use crate::ast::BinOp;
use crate::intern::Interner;
use crate::types::Type;

const INDENT: &str = "    ";

fn binop_prec(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd | BinOp::Shl | BinOp::Shr => 3,
        BinOp::Eq | BinOp::Ne => 4,
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 5,
        BinOp::Add | BinOp::Sub => 6,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 7,
    }
}

fn binop_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
    }
}

/// An expression's own precedence tier for parenthesisation purposes: only
/// `Binary` ever needs it, everything else is atomic (postfix/primary,
/// already self-delimiting, or a prefix form whose operand the grammar
/// guarantees is never a raw `Binary`).
fn expr_prec(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Binary { op, .. } => binop_prec(*op),
        _ => u8::MAX,
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\\' => "\\\\".to_string(),
        '\'' => "\\'".to_string(),
        other => other.to_string(),
    }
}

struct Printer<'a> {
    interner: &'a Interner,
}

impl<'a> Printer<'a> {
    fn ty(&self, ty: &Type) -> String {
        use crate::types::BaseType;
        let mut s = match &ty.base {
            BaseType::Void => "void".to_string(),
            BaseType::Bool => "bool".to_string(),
            BaseType::Int(k) => k.name().to_string(),
            BaseType::Float(k) => k.to_string(),
            BaseType::Custom(id) => self.interner.resolve(*id).to_string(),
            BaseType::FunctionPointer(fp) => {
                let params = fp.params.iter().map(|p| self.ty(p)).collect::<Vec<_>>().join(", ");
                let variadic = match (fp.variadic, fp.params.is_empty()) {
                    (true, true) => "...",
                    (true, false) => ", ...",
                    (false, _) => "",
                };
                format!("fn*{}({params}{variadic})", self.ty(&fp.return_type))
            }
        };
        s.push_str(&"*".repeat(ty.pointer_depth as usize));
        if let Some(dims) = &ty.array {
            for d in &dims.0 {
                s.push_str(&format!("[{d}]"));
            }
        }
        s
    }

    fn expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::NumberLiteral { text, .. } => text.clone(),
            ExprKind::StringLiteral(s) => format!("\"{}\"", escape_string(s)),
            ExprKind::CharLiteral(s) => {
                let c = s.chars().next().unwrap_or('\0');
                format!("'{}'", escape_char(c))
            }
            ExprKind::Null => "null".to_string(),
            ExprKind::DeclRef(id) => self.interner.resolve(id.name).to_string(),
            ExprKind::MemberAccess { base, field, chain } => {
                let mut s = format!("{}.{}", self.expr(base), self.interner.resolve(*field));
                let mut next = chain.as_ref();
                while let Some(link) = next {
                    s.push_str(&format!(".{}", self.interner.resolve(link.field_name)));
                    next = link.next.as_deref();
                }
                s
            }
            ExprKind::ArrayElementAccess { base, indices } => {
                let mut s = self.expr(base);
                for idx in indices {
                    s.push_str(&format!("[{}]", self.expr(idx)));
                }
                s
            }
            ExprKind::Call { callee, args } => {
                let args = args.iter().map(|a| self.expr(a)).collect::<Vec<_>>().join(", ");
                format!("{}({args})", self.expr(callee))
            }
            ExprKind::StructLiteral { type_name, fields } => {
                let name = type_name.map(|n| self.interner.resolve(n).to_string()).unwrap_or_default();
                let fields = fields
                    .iter()
                    .filter_map(|f| {
                        let value = f.value.as_ref()?;
                        Some(match f.name {
                            Some(n) => format!(".{} = {}", self.interner.resolve(n), self.expr(value)),
                            None => self.expr(value),
                        })
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}.{{ {fields} }}")
            }
            ExprKind::ArrayLiteral { elements } => {
                let elements = elements.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", ");
                format!("[{elements}]")
            }
            ExprKind::EnumElementAccess { enum_name, member } => {
                format!("{}::{}", self.interner.resolve(*enum_name), self.interner.resolve(*member))
            }
            ExprKind::Grouping(inner) => format!("({})", self.expr(inner)),
            ExprKind::Binary { op, lhs, rhs } => {
                let prec = binop_prec(*op);
                let lhs_text = self.expr(lhs);
                let lhs_text = if expr_prec(lhs) < prec { format!("({lhs_text})") } else { lhs_text };
                let rhs_text = self.expr(rhs);
                let rhs_text = if expr_prec(rhs) <= prec { format!("({rhs_text})") } else { rhs_text };
                format!("{lhs_text} {} {rhs_text}", binop_symbol(*op))
            }
            ExprKind::Unary { op, rhs } => {
                let symbol = match op {
                    crate::ast::UnaryOp::Neg => "-",
                    crate::ast::UnaryOp::Not => "!",
                    crate::ast::UnaryOp::Deref => "*",
                    crate::ast::UnaryOp::AddrOf => "&",
                };
                format!("{symbol}{}", self.expr(rhs))
            }
            ExprKind::Cast { target, rhs } => format!("({}){}", self.ty(target), self.expr(rhs)),
        }
    }

    fn var_decl(&self, v: &VarDecl) -> String {
        let kind = if v.is_const { "const" } else { "var" };
        let mut s = format!("{kind} {} {}", self.ty(&v.ty), self.interner.resolve(v.name));
        if let Some(init) = &v.initializer {
            s.push_str(&format!(" = {}", self.expr(init)));
        }
        s
    }

    fn block(&self, block: &Block, indent: usize) -> String {
        let mut s = String::from("{\n");
        for stmt in &block.statements {
            s.push_str(&format!("{}{}\n", INDENT.repeat(indent + 1), self.stmt(stmt, indent + 1)));
        }
        s.push_str(&INDENT.repeat(indent));
        s.push('}');
        s
    }

    /// Statement text with no leading indentation and no trailing
    /// terminator/newline of its own beyond what the statement kind itself
    /// requires (`;` for simple statements, `{...}` for blocks).
    fn stmt(&self, stmt: &Stmt, indent: usize) -> String {
        match &stmt.kind {
            StmtKind::Block(b) => self.block(b, indent),
            StmtKind::Decl(v) => format!("{};", self.var_decl(v)),
            StmtKind::Assignment { lvalue, deref_count, rhs } => {
                format!("{}{} = {};", "*".repeat(*deref_count as usize), self.expr(lvalue), self.expr(rhs))
            }
            StmtKind::Return(None) => "return;".to_string(),
            StmtKind::Return(Some(e)) => format!("return {};", self.expr(e)),
            StmtKind::If { condition, then_block, else_branch } => {
                let mut s = format!("if ({}) {}", self.expr(condition), self.block(then_block, indent));
                if let Some(else_stmt) = else_branch {
                    s.push_str(" else ");
                    s.push_str(&self.stmt(else_stmt, indent));
                }
                s
            }
            StmtKind::While { condition, body } => format!("while ({}) {}", self.expr(condition), self.block(body, indent)),
            StmtKind::For {
                counter,
                condition,
                increment,
                body,
            } => format!(
                "for ({}; {}; {}) {}",
                self.var_decl(counter),
                self.expr(condition),
                self.stmt_no_terminator(increment),
                self.block(body, indent)
            ),
            StmtKind::Expr(e) => format!("{};", self.expr(e)),
            StmtKind::Defer(inner) => format!("defer {}", self.stmt(inner, indent)),
        }
    }

    /// `for`'s increment clause: restricted by construction to `Assignment`
    /// or `Expr`, printed without the trailing `;` those carry everywhere
    /// else.
    fn stmt_no_terminator(&self, stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::Assignment { lvalue, deref_count, rhs } => {
                format!("{}{} = {}", "*".repeat(*deref_count as usize), self.expr(lvalue), self.expr(rhs))
            }
            StmtKind::Expr(e) => self.expr(e),
            other => self.stmt(&Stmt { location: stmt.location.clone(), kind: other.clone() }, 0),
        }
    }

    fn params(&self, params: &[ParamDecl], variadic: bool) -> String {
        let mut parts: Vec<String> = params
            .iter()
            .map(|p| {
                let c = if p.is_const { "const " } else { "" };
                format!("{c}{} {}", self.ty(&p.ty), self.interner.resolve(p.name))
            })
            .collect();
        if variadic {
            parts.push("...".to_string());
        }
        parts.join(", ")
    }

    fn function_signature(&self, f: &FunctionDecl) -> String {
        format!(
            "fn {} {}({})",
            self.ty(&f.return_type),
            self.interner.resolve(f.name),
            self.params(&f.params, f.variadic)
        )
    }

    /// A top-level (non-`extern`) function: `[export ]fn ... { body }` or a
    /// bodyless forward declaration.
    fn function(&self, f: &FunctionDecl) -> String {
        let export = if f.exported { "export " } else { "" };
        let sig = format!("{export}{}", self.function_signature(f));
        match &f.body {
            Some(body) => format!("{sig} {}", self.block(body, 0)),
            None => format!("{sig};"),
        }
    }

    /// One `fn ...;` line inside an `extern` block, with its optional
    /// `alias` clause.
    fn extern_function_signature(&self, f: &FunctionDecl) -> String {
        let mut s = self.function_signature(f);
        if let Some(orig) = f.original_name {
            s.push_str(&format!(" alias {}", self.interner.resolve(orig)));
        }
        s.push(';');
        s
    }

    fn extern_block(&self, library: &str, funcs: &[&FunctionDecl]) -> String {
        let mut s = format!("extern \"{}\" {{\n", escape_string(library));
        for &f in funcs {
            s.push_str(INDENT);
            s.push_str(&self.extern_function_signature(f));
            s.push('\n');
        }
        s.push('}');
        s
    }

    fn struct_decl(&self, s: &StructDecl) -> String {
        let export = if s.exported { "export " } else { "" };
        let mut out = format!("{export}struct {} {{\n", self.interner.resolve(s.name));
        for field in &s.fields {
            out.push_str(&format!("{INDENT}{} {};\n", self.ty(&field.ty), self.interner.resolve(field.name)));
        }
        out.push('}');
        out
    }

    fn enum_decl(&self, e: &EnumDecl) -> String {
        let export = if e.exported { "export " } else { "" };
        let mut out = format!("{export}enum {}: {} {{\n", self.interner.resolve(e.name), self.ty(&e.underlying));
        for m in &e.members {
            let value = m.value.as_ref().map(|v| format!(" = {}", self.expr(v))).unwrap_or_default();
            out.push_str(&format!("{INDENT}{}{value},\n", self.interner.resolve(m.name)));
        }
        out.push('}');
        out
    }

    fn top_level_decl(&self, decl: &TopLevelDecl) -> String {
        match decl {
            TopLevelDecl::Struct(s) => self.struct_decl(s),
            TopLevelDecl::Enum(e) => self.enum_decl(e),
            TopLevelDecl::Function(f) => self.function(f),
            TopLevelDecl::Var(v) => format!("{};", self.var_decl(v)),
            TopLevelDecl::Import(id) => format!("import {};", self.interner.resolve(id.name)),
        }
    }
}

/// Prints a parsed file back to saplang source text that reparses to the
/// same AST (modulo source locations). `extern` blocks, flattened at parse
/// time into consecutive same-library `Function` declarations, are
/// re-grouped here so the output is valid `extern "lib" { ... }` syntax
/// rather than a run of bare bodyless functions.
#[must_use]
pub fn print_file(file: &ParsedFile, interner: &Interner) -> String {
    let printer = Printer { interner };
    let mut out = String::new();
    let mut i = 0;
    while i < file.decls.len() {
        if let TopLevelDecl::Function(f) = &file.decls[i] {
            if let Some(lib) = &f.library {
                let mut j = i;
                let mut funcs = Vec::new();
                while let Some(TopLevelDecl::Function(g)) = file.decls.get(j) {
                    if g.library.as_deref() != Some(lib.as_str()) {
                        break;
                    }
                    funcs.push(g);
                    j += 1;
                }
                out.push_str(&printer.extern_block(lib, &funcs));
                out.push_str("\n\n");
                i = j;
                continue;
            }
        }
        out.push_str(&printer.top_level_decl(&file.decls[i]));
        out.push_str("\n\n");
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::Parser;
    use crate::source::SourceFile;

    fn reparse(src: &str) -> (ParsedFile, Interner) {
        let diags = Diagnostics::new();
        let mut interner = Interner::new();
        let source = SourceFile::new("t.sl", src.to_string());
        let parsed = Parser::new(&source, &diags, &mut interner).parse_file();
        assert!(!diags.has_errors(), "unexpected parse errors for:\n{src}\n{diags:?}");
        assert!(parsed.is_complete_ast);
        (parsed, interner)
    }

    /// Printing is idempotent: reparsing printed output and printing it
    /// again yields identical text (spec.md §8 Q5, checked via a textual
    /// fixed point rather than an AST `PartialEq` derive).
    fn assert_round_trips(src: &str) {
        let (parsed, interner) = reparse(src);
        let printed_once = print_file(&parsed, &interner);
        let (reparsed, interner2) = reparse(&printed_once);
        let printed_twice = print_file(&reparsed, &interner2);
        assert_eq!(printed_once, printed_twice, "print -> parse -> print was not stable for:\n{src}");
    }

    #[test]
    fn round_trips_a_function_with_control_flow() {
        assert_round_trips(
            "fn i32 max(i32 a, i32 b) { if (a > b) { return a; } else { return b; } }",
        );
    }

    #[test]
    fn round_trips_structs_and_enums() {
        assert_round_trips("struct Point { i32 x; i32 y; } enum Color : i32 { Red, Green = 5, Blue }");
    }

    #[test]
    fn round_trips_extern_blocks_with_multiple_functions() {
        assert_round_trips(r#"extern "m" { fn i32 a(); fn i32 b(i32 x) alias c; }"#);
    }

    #[test]
    fn round_trips_a_for_loop_and_mixed_precedence_expression() {
        assert_round_trips(
            "fn i32 sum(i32 n) { var i32 total = 0; for (var i32 i = 0; i < n; i = i + 1) { total = total + i * 2 - 1; } return total; }",
        );
    }

    #[test]
    fn round_trips_casts_and_groupings() {
        assert_round_trips("fn i32 f(i32 x) { return (i32)(x + 1) * -x; }");
    }

    #[test]
    fn round_trips_struct_literals_and_member_chains() {
        assert_round_trips(
            "struct P { i32 x; i32 y; } fn i32 f() { var P p = P.{ .x = 1, .y = 2 }; return p.x + p.y; }",
        );
    }
}
