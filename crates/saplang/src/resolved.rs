//! The resolved tree: AST after semantic analysis, where every
//! expression has a concrete `Type` and every reference points at a
//! declaration.
//!
//! Declarations live in a `DeclArena` — a vector of declarations addressed
//! by a stable `DeclId` index — exactly the structure needed
//! for the `DeclRefExpr → Decl` back-pointer: "model them
//! with an arena... where an index is the non-owning handle. This breaks
//! would-be cycles... and makes the graph trivially serialisable." A
//! `DeclId` outlives nothing on its own; declarations live as long as the
//! owning `Module`'s arena, which always outlives every reference into it.

use indexmap::IndexMap;

use crate::ast::{BinOp, CastKind, UnaryOp};
use crate::intern::StringId;
use crate::source::SourceLocation;
use crate::types::Type;
use crate::value::ConstantValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeclId(u32);

impl DeclId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedVarDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub ty: Type,
    pub is_const: bool,
    pub is_global: bool,
    pub initializer: Option<ResolvedExpr>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedParamDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub ty: Type,
    pub is_const: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedFunctionDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub return_type: Type,
    pub params: Vec<DeclId>,
    pub variadic: bool,
    pub body: Option<ResolvedBlock>,
    pub exported: bool,
    pub library: Option<String>,
    pub original_name: Option<StringId>,
}

/// Ordered `(Type, name)` pairs — ABI layout order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedStructDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub fields: Vec<(StringId, Type)>,
    pub exported: bool,
}

impl ResolvedStructDecl {
    #[must_use]
    pub fn field_index(&self, name: StringId) -> Option<usize> {
        self.fields.iter().position(|(n, _)| *n == name)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedEnumDecl {
    pub location: SourceLocation,
    pub name: StringId,
    pub underlying: Type,
    pub members: IndexMap<StringId, i128>,
    pub exported: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ResolvedDeclData {
    Var(ResolvedVarDecl),
    Param(ResolvedParamDecl),
    Function(ResolvedFunctionDecl),
    Struct(ResolvedStructDecl),
    Enum(ResolvedEnumDecl),
}

impl ResolvedDeclData {
    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::Var(d) => &d.location,
            Self::Param(d) => &d.location,
            Self::Function(d) => &d.location,
            Self::Struct(d) => &d.location,
            Self::Enum(d) => &d.location,
        }
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        match self {
            Self::Var(d) => d.name,
            Self::Param(d) => d.name,
            Self::Function(d) => d.name,
            Self::Struct(d) => d.name,
            Self::Enum(d) => d.name,
        }
    }

    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Var(d) => d.ty.clone(),
            Self::Param(d) => d.ty.clone(),
            Self::Function(d) => d.return_type.clone(),
            Self::Struct(d) => Type::simple(crate::types::BaseType::Custom(d.name)),
            Self::Enum(d) => d.underlying.clone(),
        }
    }

    /// Whether assigning to this declaration directly is illegal (spec.md
    /// §7's "assignment to ... `const`" error kind). Functions, structs and
    /// enums aren't assignable targets at all (the parser's `is_assignable`
    /// check rules out a bare call/type-name as an lvalue already), so this
    /// only needs to distinguish `const` from non-`const` variables/params.
    #[must_use]
    pub fn is_const(&self) -> bool {
        match self {
            Self::Var(d) => d.is_const,
            Self::Param(d) => d.is_const,
            Self::Function(_) | Self::Struct(_) | Self::Enum(_) => true,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&ResolvedFunctionDecl> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&ResolvedStructDecl> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_enum(&self) -> Option<&ResolvedEnumDecl> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// Owns every declaration produced while resolving one module. An index
/// into it (`DeclId`) is the only way other resolved nodes refer to a
/// declaration, so declarations are never moved or freed out from under a
/// live reference.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct DeclArena {
    decls: Vec<ResolvedDeclData>,
}

impl DeclArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: ResolvedDeclData) -> DeclId {
        self.decls.push(decl);
        DeclId((self.decls.len() - 1) as u32)
    }

    #[must_use]
    pub fn get(&self, id: DeclId) -> &ResolvedDeclData {
        &self.decls[id.index()]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut ResolvedDeclData {
        &mut self.decls[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &ResolvedDeclData)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ResolvedExprKind {
    Literal(ConstantValue),
    StringLiteral(String),
    CharLiteral(char),
    Null,
    DeclRef(DeclId),
    /// Resolved `MemberAccess`: the flattened `(field_index, field_type)`
    /// chain after the base, standing in for the original's
    /// `InnerMemberAccess` cons-list — same information,
    /// idiomatic-Rust shape, collapsing the parallel AST/resolved-tree
    /// hierarchies into one flattened path.
    MemberAccess { base: Box<ResolvedExpr>, path: Vec<(u32, Type)> },
    ArrayElementAccess { base: Box<ResolvedExpr>, indices: Vec<ResolvedExpr> },
    Call { callee: DeclId, args: Vec<ResolvedExpr> },
    /// Ordered positional-or-by-index values; `None` at an index means "left
    /// uninitialised".
    StructLiteral { struct_decl: DeclId, fields: Vec<Option<ResolvedExpr>> },
    ArrayLiteral { elements: Vec<ResolvedExpr> },
    EnumElementAccess { enum_decl: DeclId, value: i128 },
    Grouping(Box<ResolvedExpr>),
    Binary { op: BinOp, lhs: Box<ResolvedExpr>, rhs: Box<ResolvedExpr> },
    Unary { op: UnaryOp, rhs: Box<ResolvedExpr> },
    Cast { kind: CastKind, rhs: Box<ResolvedExpr> },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedExpr {
    pub location: SourceLocation,
    pub ty: Type,
    pub constant: Option<ConstantValue>,
    pub kind: ResolvedExprKind,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ResolvedStmtKind {
    Block(ResolvedBlock),
    Decl(DeclId),
    Assignment { lvalue: ResolvedExpr, deref_count: u32, rhs: ResolvedExpr },
    Return(Option<ResolvedExpr>),
    If { condition: ResolvedExpr, then_block: ResolvedBlock, else_block: Option<ResolvedBlock> },
    While { condition: ResolvedExpr, body: ResolvedBlock },
    /// Treated as an opaque, non-terminator leaf statement by the CFG
    /// builder (see `cfg.rs`) — grounded on `compiler/src/cfg.cpp`, whose
    /// `insert_stmt` never recurses into `ResolvedForStmt` either.
    For {
        counter: DeclId,
        condition: ResolvedExpr,
        increment: Box<ResolvedStmt>,
        body: ResolvedBlock,
    },
    Expr(ResolvedExpr),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolvedStmt {
    pub location: SourceLocation,
    pub kind: ResolvedStmtKind,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ResolvedBlock {
    pub statements: Vec<ResolvedStmt>,
}

/// One fully resolved module: its declaration arena plus the ordered list
/// of top-level declarations the backend consumes.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ResolvedModule {
    pub name: String,
    pub arena: DeclArena,
    pub top_level: Vec<DeclId>,
}
