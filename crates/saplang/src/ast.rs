//! The parser's output tree: unresolved types and identifiers
//! are permitted here; the semantic analyser consumes this into the
//! resolved tree in `resolved.rs`.
//!
//! Every expression/statement is a location wrapped around a kind enum
//! rather than a polymorphic class hierarchy.

use crate::intern::StringId;
use crate::source::SourceLocation;
use crate::types::Type;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Identifier {
    pub location: SourceLocation,
    pub name: StringId,
}

/// A cons-list of `.field` accesses after the first, resolved form stores
/// indices; the AST form stores names.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MemberChain {
    pub field_name: StringId,
    pub next: Option<Box<MemberChain>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NumberKind {
    Integer,
    Real,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    Deref,
    AddrOf,
}

/// Cast kinds named explicitly by the cast-resolution rules; the AST only ever produces
/// `ExplicitCast` for the `Nop` placeholder — sema fills in the concrete
/// kind once both sides have a resolved `Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CastKind {
    Nop,
    Extend,
    Truncate,
    Ptr,
    IntToPtr,
    PtrToInt,
    FloatToInt,
    IntToFloat,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StructLiteralField {
    /// `None` for a positional initialiser.
    pub name: Option<StringId>,
    /// `None` means "leave uninitialised".
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ExprKind {
    NumberLiteral { kind: NumberKind, text: String },
    StringLiteral(String),
    CharLiteral(String),
    Null,
    DeclRef(Identifier),
    MemberAccess { base: Box<Expr>, field: StringId, chain: Option<MemberChain> },
    ArrayElementAccess { base: Box<Expr>, indices: Vec<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    StructLiteral { type_name: Option<StringId>, fields: Vec<StructLiteralField> },
    ArrayLiteral { elements: Vec<Expr> },
    EnumElementAccess { enum_name: StringId, member: StringId },
    Grouping(Box<Expr>),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnaryOp, rhs: Box<Expr> },
    Cast { target: Type, rhs: Box<Expr> },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Expr {
    pub location: SourceLocation,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VarDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub ty: Type,
    pub is_const: bool,
    pub is_global: bool,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParamDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub ty: Type,
    pub is_const: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub return_type: Type,
    pub params: Vec<ParamDecl>,
    pub variadic: bool,
    pub body: Option<Block>,
    pub exported: bool,
    /// Present only for `extern` function declarations (supplemented feature,
    /// see SPEC_FULL.md §3).
    pub library: Option<String>,
    pub original_name: Option<StringId>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StructField {
    pub name: StringId,
    pub ty: Type,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StructDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub fields: Vec<StructField>,
    pub exported: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnumMember {
    pub name: StringId,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnumDecl {
    pub location: SourceLocation,
    pub name: StringId,
    /// Defaults to `i32` when absent from the source.
    pub underlying: Type,
    pub members: Vec<EnumMember>,
    pub exported: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum StmtKind {
    Block(Block),
    Decl(VarDecl),
    Assignment { lvalue: Expr, deref_count: u32, rhs: Expr },
    Return(Option<Expr>),
    If { condition: Expr, then_block: Block, else_branch: Option<Box<Stmt>> },
    While { condition: Expr, body: Block },
    For { counter: VarDecl, condition: Expr, increment: Box<Stmt>, body: Block },
    Expr(Expr),
    /// Out of scope for this compiler: parsed, then rejected by sema with a
    /// diagnostic rather than silently accepted.
    Defer(Box<Stmt>),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Stmt {
    pub location: SourceLocation,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TopLevelDecl {
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Var(VarDecl),
    Import(Identifier),
}

/// Output of "parse a source file": an ordered list of
/// top-level declarations plus the completeness flag the driver uses to
/// decide whether to proceed past parsing.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ParsedFile {
    pub decls: Vec<TopLevelDecl>,
    pub is_complete_ast: bool,
}
