#![doc = include_str!("../../../README.md")]

mod ast;
mod backend;
mod cfg;
mod constexpr;
mod diagnostics;
mod intern;
mod lexer;
mod module;
mod parser;
mod printer;
mod resolved;
mod scope;
mod sema;
mod source;
mod token;
mod types;
mod value;

pub use crate::ast::{
    BinOp, Block, CastKind, EnumDecl, EnumMember, Expr, ExprKind, FunctionDecl, Identifier, MemberChain, NumberKind,
    ParamDecl, ParsedFile, Stmt, StmtKind, StructDecl, StructField, StructLiteralField, TopLevelDecl, UnaryOp, VarDecl,
};
pub use crate::backend::{BackendError, EmittedModule, IrBackend, PointerWidth, StructLayoutMap};
pub use crate::cfg::{BasicBlock, BlockId, BlockStmt, Cfg, CfgEdge};
pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
pub use crate::intern::{Interner, StringId};
pub use crate::lexer::Lexer;
pub use crate::module::{Program, collect_and_resolve};
pub use crate::parser::Parser;
pub use crate::printer::print_file;
pub use crate::resolved::{
    DeclArena, DeclId, ResolvedBlock, ResolvedDeclData, ResolvedEnumDecl, ResolvedExpr, ResolvedExprKind,
    ResolvedFunctionDecl, ResolvedModule, ResolvedParamDecl, ResolvedStmt, ResolvedStmtKind, ResolvedStructDecl,
    ResolvedVarDecl,
};
pub use crate::source::{SourceFile, SourceLocation};
pub use crate::token::{Token, TokenKind};
pub use crate::types::{ArrayDims, BaseType, FloatKind, FunctionPointerType, IntKind, Type};
pub use crate::value::ConstantValue;

/// Lexes and parses one source buffer into its AST, recording diagnostics as
/// it goes. Cross-module resolution (`collect_and_resolve`) is a separate
/// step since it additionally needs a set of import search paths.
#[must_use]
pub fn parse_source_file(source: &SourceFile, diags: &Diagnostics, interner: &mut Interner) -> ParsedFile {
    Parser::new(source, diags, interner).parse_file()
}

/// Builds the control-flow graph for one resolved function's body.
#[must_use]
pub fn build_cfg(body: &ResolvedBlock) -> Cfg {
    cfg::build(body)
}
