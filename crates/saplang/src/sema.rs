//! Name and type resolution: AST → resolved tree.
//!
//! Each module is resolved in three passes so forward references between
//! top-level declarations work regardless of textual order: (1) register
//! struct/enum names so `Custom` type references resolve, (2) resolve
//! struct fields, enum members, and function/global signatures, (3) resolve
//! function bodies and global initialisers. A third pass is needed beyond
//! the usual two because struct fields can themselves name structs declared
//! later in the file.

use indexmap::IndexMap;

use crate::ast::{
    self, Block, EnumDecl, FunctionDecl, ParsedFile, StmtKind, StructDecl, TopLevelDecl, VarDecl,
};
use crate::constexpr::{self, int_width_bytes};
use crate::diagnostics::Diagnostics;
use crate::intern::{Interner, StringId};
use crate::resolved::{
    DeclArena, DeclId, ResolvedBlock, ResolvedDeclData, ResolvedEnumDecl, ResolvedExpr, ResolvedExprKind,
    ResolvedFunctionDecl, ResolvedModule, ResolvedParamDecl, ResolvedStmt, ResolvedStmtKind, ResolvedStructDecl,
    ResolvedVarDecl,
};
use crate::scope::ScopeStack;
use crate::source::SourceLocation;
use crate::types::{BaseType, FloatKind, IntKind, Type};
use crate::value::ConstantValue;

pub struct Sema<'a> {
    diags: &'a Diagnostics,
    interner: &'a mut Interner,
    arena: DeclArena,
    scopes: ScopeStack,
    struct_table: IndexMap<StringId, DeclId>,
    enum_table: IndexMap<StringId, DeclId>,
    current_return_type: Option<Type>,
}

impl<'a> Sema<'a> {
    #[must_use]
    pub fn new(diags: &'a Diagnostics, interner: &'a mut Interner, imported: Vec<(StringId, ResolvedDeclData)>) -> Self {
        let mut sema = Self {
            diags,
            interner,
            arena: DeclArena::new(),
            scopes: ScopeStack::new(),
            struct_table: IndexMap::new(),
            enum_table: IndexMap::new(),
            current_return_type: None,
        };
        for (name, decl) in imported {
            let is_struct = matches!(decl, ResolvedDeclData::Struct(_));
            let is_enum = matches!(decl, ResolvedDeclData::Enum(_));
            let id = sema.arena.push(decl);
            if is_struct {
                sema.struct_table.insert(name, id);
            } else if is_enum {
                sema.enum_table.insert(name, id);
            } else {
                sema.scopes.bind(name, id);
            }
        }
        sema
    }

    /// A placeholder declaration handed out in place of a failed lookup so
    /// resolution can keep going after an error, matching the parser's
    /// synchronise-and-continue
    /// behaviour).
    fn error_decl_id(&mut self) -> DeclId {
        let name = self.interner.intern("<error>");
        self.arena.push(ResolvedDeclData::Var(ResolvedVarDecl {
            location: SourceLocation::synthetic(),
            name,
            ty: Type::void(),
            is_const: false,
            is_global: false,
            initializer: None,
        }))
    }

    pub fn resolve_file(mut self, module_name: String, parsed: &ParsedFile) -> ResolvedModule {
        // Pass 1: struct/enum names only, so `Custom` types resolve regardless
        // of declaration order.
        for decl in &parsed.decls {
            match decl {
                TopLevelDecl::Struct(s) => {
                    let id = self.arena.push(ResolvedDeclData::Struct(ResolvedStructDecl {
                        location: s.location.clone(),
                        name: s.name,
                        fields: Vec::new(),
                        exported: s.exported,
                    }));
                    self.struct_table.insert(s.name, id);
                }
                TopLevelDecl::Enum(e) => {
                    let id = self.arena.push(ResolvedDeclData::Enum(ResolvedEnumDecl {
                        location: e.location.clone(),
                        name: e.name,
                        underlying: e.underlying.clone(),
                        members: IndexMap::new(),
                        exported: e.exported,
                    }));
                    self.enum_table.insert(e.name, id);
                }
                _ => {}
            }
        }

        // Pass 2: struct fields, enum members, function/global signatures.
        let mut function_ids: IndexMap<StringId, DeclId> = IndexMap::new();
        for decl in &parsed.decls {
            match decl {
                TopLevelDecl::Struct(s) => self.resolve_struct_fields(s),
                TopLevelDecl::Enum(e) => self.resolve_enum_members(e),
                TopLevelDecl::Function(f) => {
                    if self.scopes.is_redeclared_in_current_scope(f.name) {
                        self.diags.error(
                            f.location.clone(),
                            format!("redeclaration of '{}'.", self.interner.resolve(f.name)),
                        );
                    }
                    let id = self.resolve_function_signature(f);
                    function_ids.insert(f.name, id);
                    self.scopes.bind(f.name, id);
                }
                TopLevelDecl::Var(v) => {
                    if self.scopes.is_redeclared_in_current_scope(v.name) {
                        self.diags.error(
                            v.location.clone(),
                            format!("redeclaration of '{}'.", self.interner.resolve(v.name)),
                        );
                    }
                    self.validate_type(&v.ty, &v.location);
                    let id = self.arena.push(ResolvedDeclData::Var(ResolvedVarDecl {
                        location: v.location.clone(),
                        name: v.name,
                        ty: v.ty.clone(),
                        is_const: v.is_const,
                        is_global: true,
                        initializer: None,
                    }));
                    self.scopes.bind(v.name, id);
                }
                TopLevelDecl::Import(_) => {}
            }
        }

        self.check_recursive_structs();

        // Pass 3: function bodies and global initialisers.
        for decl in &parsed.decls {
            match decl {
                TopLevelDecl::Function(f) => {
                    if let Some(body) = &f.body {
                        let id = function_ids[&f.name];
                        self.resolve_function_body(id, f, body);
                    }
                }
                TopLevelDecl::Var(v) => {
                    if let Some(init) = &v.initializer {
                        let id = self
                            .scopes
                            .lookup(v.name)
                            .map(|(id, _)| id)
                            .unwrap_or_else(|| self.error_decl_id());
                        let ty = self.arena.get(id).ty();
                        let resolved_init = self.resolve_expr(init, Some(&ty));
                        if let ResolvedDeclData::Var(var) = self.arena.get_mut(id) {
                            var.initializer = Some(resolved_init);
                        }
                    }
                }
                _ => {}
            }
        }

        let mut top_level = Vec::new();
        for decl in &parsed.decls {
            let id = match decl {
                TopLevelDecl::Struct(s) => self.struct_table.get(&s.name).copied(),
                TopLevelDecl::Enum(e) => self.enum_table.get(&e.name).copied(),
                TopLevelDecl::Function(f) => function_ids.get(&f.name).copied(),
                TopLevelDecl::Var(v) => self.scopes.lookup(v.name).map(|(id, _)| id),
                TopLevelDecl::Import(_) => None,
            };
            if let Some(id) = id {
                top_level.push(id);
            }
        }

        ResolvedModule {
            name: module_name,
            arena: self.arena,
            top_level,
        }
    }

    fn resolve_struct_fields(&mut self, s: &StructDecl) {
        let mut fields = Vec::with_capacity(s.fields.len());
        for field in &s.fields {
            self.validate_type(&field.ty, &s.location);
            fields.push((field.name, field.ty.clone()));
        }
        let id = self.struct_table[&s.name];
        if let ResolvedDeclData::Struct(decl) = self.arena.get_mut(id) {
            decl.fields = fields;
        }
    }

    /// Detects structs that contain themselves by value, directly or
    /// transitively through another by-value field (including an array of
    /// one, since an array still embeds its elements rather than pointing to
    /// them). Containment through a pointer is excluded: a pointer has a
    /// fixed size regardless of what it points to.
    fn check_recursive_structs(&mut self) {
        let struct_ids: Vec<DeclId> = self.struct_table.values().copied().collect();
        let mut color: IndexMap<DeclId, u8> = IndexMap::new();
        for id in struct_ids {
            if color.get(&id).copied().unwrap_or(0) == 0 {
                self.visit_struct_for_cycles(id, &mut color);
            }
        }
    }

    fn visit_struct_for_cycles(&mut self, id: DeclId, color: &mut IndexMap<DeclId, u8>) {
        color.insert(id, 1);
        let (location, self_name, fields) = match self.arena.get(id) {
            ResolvedDeclData::Struct(s) => (s.location.clone(), s.name, s.fields.clone()),
            _ => return,
        };
        for (_, field_ty) in &fields {
            if field_ty.pointer_depth != 0 {
                continue;
            }
            let BaseType::Custom(field_type_name) = &field_ty.base else { continue };
            let Some(&field_struct_id) = self.struct_table.get(field_type_name) else { continue };
            match color.get(&field_struct_id).copied().unwrap_or(0) {
                0 => self.visit_struct_for_cycles(field_struct_id, color),
                1 => {
                    self.diags.error(
                        location.clone(),
                        format!(
                            "struct '{}' recursively contains itself by value (through field of type '{}').",
                            self.interner.resolve(self_name),
                            self.interner.resolve(*field_type_name)
                        ),
                    );
                }
                _ => {}
            }
        }
        color.insert(id, 2);
    }

    fn resolve_enum_members(&mut self, e: &EnumDecl) {
        let underlying_kind = match e.underlying.base {
            BaseType::Int(k) => k,
            _ => IntKind::I32,
        };
        let mut members = IndexMap::new();
        let mut seen_values: IndexMap<i128, StringId> = IndexMap::new();
        let mut next_value: i128 = 0;
        for member in &e.members {
            if members.contains_key(&member.name) {
                self.diags.error(
                    e.location.clone(),
                    format!("redeclaration of enum member '{}'.", self.interner.resolve(member.name)),
                );
                continue;
            }
            let value = if let Some(expr) = &member.value {
                let resolved = self.resolve_expr(expr, Some(&e.underlying));
                match resolved.constant.and_then(ConstantValue::as_i128) {
                    Some(v) => v,
                    None => {
                        self.diags.error(
                            resolved.location.clone(),
                            format!("enum member '{}' initialiser must be a constant expression.", self.interner.resolve(member.name)),
                        );
                        next_value
                    }
                }
            } else {
                next_value
            };
            if let Some(&first_name) = seen_values.get(&value) {
                self.diags.error(
                    e.location.clone(),
                    format!(
                        "enum member '{}' has the same value as '{}'.",
                        self.interner.resolve(member.name),
                        self.interner.resolve(first_name)
                    ),
                );
            } else {
                seen_values.insert(value, member.name);
            }
            members.insert(member.name, value);
            next_value = value + 1;
        }
        let _ = underlying_kind;
        let id = self.enum_table[&e.name];
        if let ResolvedDeclData::Enum(decl) = self.arena.get_mut(id) {
            decl.members = members;
        }
    }

    fn resolve_function_signature(&mut self, f: &FunctionDecl) -> DeclId {
        self.validate_type(&f.return_type, &f.location);
        let mut params = Vec::with_capacity(f.params.len());
        for p in &f.params {
            self.validate_type(&p.ty, &p.location);
            let id = self.arena.push(ResolvedDeclData::Param(ResolvedParamDecl {
                location: p.location.clone(),
                name: p.name,
                ty: p.ty.clone(),
                is_const: p.is_const,
            }));
            params.push(id);
        }
        self.arena.push(ResolvedDeclData::Function(ResolvedFunctionDecl {
            location: f.location.clone(),
            name: f.name,
            return_type: f.return_type.clone(),
            params,
            variadic: f.variadic,
            body: None,
            exported: f.exported,
            library: f.library.clone(),
            original_name: f.original_name,
        }))
    }

    fn resolve_function_body(&mut self, id: DeclId, f: &FunctionDecl, body: &Block) {
        let params = match self.arena.get(id) {
            ResolvedDeclData::Function(func) => func.params.clone(),
            _ => return,
        };
        self.scopes.push();
        for (param_id, param) in params.iter().zip(&f.params) {
            self.scopes.bind(param.name, *param_id);
        }
        self.current_return_type = Some(f.return_type.clone());
        let statements = self.resolve_stmts(&body.statements);
        self.current_return_type = None;
        self.scopes.pop();
        if let ResolvedDeclData::Function(func) = self.arena.get_mut(id) {
            func.body = Some(ResolvedBlock { statements });
        }
    }

    /// Validates that every `Custom` type mentioned resolves to a known
    /// struct or enum, including inside function-pointer signatures.
    fn validate_type(&mut self, ty: &Type, loc: &SourceLocation) {
        match &ty.base {
            BaseType::Custom(name) => {
                if !self.struct_table.contains_key(name) && !self.enum_table.contains_key(name) {
                    self.diags.error(
                        loc.clone(),
                        format!("unknown type '{}'.", self.interner.resolve(*name)),
                    );
                }
            }
            BaseType::FunctionPointer(fp) => {
                self.validate_type(&fp.return_type, loc);
                for p in &fp.params {
                    self.validate_type(p, loc);
                }
            }
            _ => {}
        }
    }

    fn resolve_block(&mut self, block: &Block) -> ResolvedBlock {
        self.scopes.push();
        let statements = self.resolve_stmts(&block.statements);
        self.scopes.pop();
        ResolvedBlock { statements }
    }

    /// Resolves a statement list and warns once on the first statement that
    /// follows an unconditional `return` in the same block.
    /// Mirrors `sema.cpp`'s `unreachable_count` bookkeeping: the counter arms
    /// on a `return`, fires exactly once on the next statement, and never
    /// fires again for the remainder of the block.
    fn resolve_stmts(&mut self, stmts: &[ast::Stmt]) -> Vec<ResolvedStmt> {
        let mut resolved = Vec::with_capacity(stmts.len());
        let mut unreachable_count = 0u8;
        for stmt in stmts {
            if unreachable_count == 1 {
                self.diags.warning(stmt.location.clone(), "unreachable statement.".to_string());
                unreachable_count = 2;
            }
            let resolved_stmt = self.resolve_stmt(stmt);
            if matches!(resolved_stmt.kind, ResolvedStmtKind::Return(_)) && unreachable_count == 0 {
                unreachable_count = 1;
            }
            resolved.push(resolved_stmt);
        }
        resolved
    }

    fn resolve_stmt(&mut self, stmt: &ast::Stmt) -> ResolvedStmt {
        let location = stmt.location.clone();
        let kind = match &stmt.kind {
            StmtKind::Block(b) => ResolvedStmtKind::Block(self.resolve_block(b)),
            StmtKind::Decl(v) => ResolvedStmtKind::Decl(self.resolve_local_decl(v)),
            StmtKind::Assignment { lvalue, deref_count, rhs } => {
                let resolved_lvalue = self.resolve_expr(lvalue, None);
                if *deref_count == 0 {
                    if let ResolvedExprKind::DeclRef(target) = &resolved_lvalue.kind {
                        if self.arena.get(*target).is_const() {
                            self.diags.error(location.clone(), "assignment to a `const` variable.".to_string());
                        }
                    }
                }
                let mut target_ty = resolved_lvalue.ty.clone();
                for _ in 0..*deref_count {
                    target_ty = Type {
                        pointer_depth: target_ty.pointer_depth.saturating_sub(1),
                        ..target_ty
                    };
                }
                let resolved_rhs = self.resolve_expr(rhs, Some(&target_ty));
                ResolvedStmtKind::Assignment {
                    lvalue: resolved_lvalue,
                    deref_count: *deref_count,
                    rhs: resolved_rhs,
                }
            }
            StmtKind::Return(expr) => {
                let expected = self.current_return_type.clone();
                ResolvedStmtKind::Return(expr.as_ref().map(|e| self.resolve_expr(e, expected.as_ref())))
            }
            StmtKind::If { condition, then_block, else_branch } => {
                let condition = self.resolve_expr(condition, Some(&Type::bool_()));
                let then_block = self.resolve_block(then_block);
                let else_block = else_branch.as_ref().map(|stmt| match &stmt.kind {
                    StmtKind::Block(b) => self.resolve_block(b),
                    _ => ResolvedBlock { statements: vec![self.resolve_stmt(stmt)] },
                });
                ResolvedStmtKind::If { condition, then_block, else_block }
            }
            StmtKind::While { condition, body } => {
                let condition = self.resolve_expr(condition, Some(&Type::bool_()));
                let body = self.resolve_block(body);
                ResolvedStmtKind::While { condition, body }
            }
            StmtKind::For { counter, condition, increment, body } => {
                self.scopes.push();
                let counter_id = self.resolve_local_decl(counter);
                let condition = self.resolve_expr(condition, Some(&Type::bool_()));
                let increment = Box::new(self.resolve_stmt(increment));
                let body = self.resolve_block(body);
                self.scopes.pop();
                ResolvedStmtKind::For { counter: counter_id, condition, increment, body }
            }
            StmtKind::Expr(e) => ResolvedStmtKind::Expr(self.resolve_expr(e, None)),
            StmtKind::Defer(inner) => {
                self.diags.error(location.clone(), "defer statements are not supported.".to_string());
                self.resolve_stmt(inner).kind
            }
        };
        ResolvedStmt { location, kind }
    }

    fn resolve_local_decl(&mut self, v: &VarDecl) -> DeclId {
        if self.scopes.is_redeclared_in_current_scope(v.name) {
            self.diags.error(
                v.location.clone(),
                format!("redeclaration of '{}' in the same scope.", self.interner.resolve(v.name)),
            );
        }
        self.validate_type(&v.ty, &v.location);
        let initializer = v.initializer.as_ref().map(|e| self.resolve_expr(e, Some(&v.ty)));
        let id = self.arena.push(ResolvedDeclData::Var(ResolvedVarDecl {
            location: v.location.clone(),
            name: v.name,
            ty: v.ty.clone(),
            is_const: v.is_const,
            is_global: false,
            initializer,
        }));
        self.scopes.bind(v.name, id);
        id
    }

    fn resolve_expr(&mut self, expr: &ast::Expr, expected: Option<&Type>) -> ResolvedExpr {
        let location = expr.location.clone();
        match &expr.kind {
            ast::ExprKind::NumberLiteral { kind, text } => self.resolve_number_literal(*kind, text, location),
            ast::ExprKind::StringLiteral(s) => ResolvedExpr {
                location,
                ty: Type::pointer_to(BaseType::Int(IntKind::I8), 1),
                constant: None,
                kind: ResolvedExprKind::StringLiteral(s.clone()),
            },
            ast::ExprKind::CharLiteral(s) => {
                let c = s.chars().next().unwrap_or('\0');
                ResolvedExpr {
                    location,
                    ty: Type::int(IntKind::I8),
                    constant: Some(ConstantValue::Int { kind: IntKind::I8, value: i128::from(c as u32) }),
                    kind: ResolvedExprKind::CharLiteral(c),
                }
            }
            ast::ExprKind::Null => ResolvedExpr {
                location,
                ty: Type::pointer_to(BaseType::Void, 1),
                constant: None,
                kind: ResolvedExprKind::Null,
            },
            ast::ExprKind::DeclRef(id) => {
                let (decl_id, ty) = match self.scopes.lookup(id.name) {
                    Some((decl_id, _)) => (decl_id, self.arena.get(decl_id).ty()),
                    None => {
                        self.diags.error(
                            id.location.clone(),
                            format!("use of undeclared identifier '{}'.", self.interner.resolve(id.name)),
                        );
                        let err = self.error_decl_id();
                        (err, self.arena.get(err).ty())
                    }
                };
                ResolvedExpr { location, ty, constant: None, kind: ResolvedExprKind::DeclRef(decl_id) }
            }
            ast::ExprKind::MemberAccess { base, field, chain } => self.resolve_member_access(base, *field, chain.as_deref(), location),
            ast::ExprKind::ArrayElementAccess { base, indices } => self.resolve_array_access(base, indices, location),
            ast::ExprKind::Call { callee, args } => self.resolve_call(callee, args, location),
            ast::ExprKind::StructLiteral { type_name, fields } => self.resolve_struct_literal(*type_name, fields, expected, location),
            ast::ExprKind::ArrayLiteral { elements } => self.resolve_array_literal(elements, expected, location),
            ast::ExprKind::EnumElementAccess { enum_name, member } => {
                if self.enum_table.contains_key(enum_name) {
                    self.resolve_enum_element(*enum_name, *member, location)
                } else {
                    self.resolve_qualified_symbol(*enum_name, *member, location)
                }
            }
            ast::ExprKind::Grouping(inner) => {
                let resolved = self.resolve_expr(inner, expected);
                ResolvedExpr {
                    location,
                    ty: resolved.ty.clone(),
                    constant: resolved.constant,
                    kind: ResolvedExprKind::Grouping(Box::new(resolved)),
                }
            }
            ast::ExprKind::Binary { op, lhs, rhs } => self.resolve_binary(*op, lhs, rhs, location),
            ast::ExprKind::Unary { op, rhs } => self.resolve_unary(*op, rhs, location),
            ast::ExprKind::Cast { target, rhs } => self.resolve_cast(target, rhs, location),
        }
    }

    fn resolve_number_literal(&mut self, kind: ast::NumberKind, text: &str, location: SourceLocation) -> ResolvedExpr {
        match kind {
            ast::NumberKind::Integer => {
                let value: i128 = text.parse().unwrap_or(0);
                let int_kind = constexpr::smallest_unsigned_kind(value).unwrap_or_else(|| {
                    self.diags.error(location.clone(), format!("integer literal '{text}' is out of range."));
                    IntKind::U64
                });
                ResolvedExpr {
                    location,
                    ty: Type::int(int_kind),
                    constant: Some(ConstantValue::Int { kind: int_kind, value }),
                    kind: ResolvedExprKind::Literal(ConstantValue::Int { kind: int_kind, value }),
                }
            }
            ast::NumberKind::Real => {
                let value: f64 = text.parse().unwrap_or(0.0);
                let float_kind = if constexpr::literal_fits_float(value, FloatKind::F32) {
                    FloatKind::F32
                } else {
                    FloatKind::F64
                };
                ResolvedExpr {
                    location,
                    ty: Type::float(float_kind),
                    constant: Some(ConstantValue::Float { kind: float_kind, value }),
                    kind: ResolvedExprKind::Literal(ConstantValue::Float { kind: float_kind, value }),
                }
            }
            ast::NumberKind::Bool => {
                let value = text == "true";
                ResolvedExpr {
                    location,
                    ty: Type::bool_(),
                    constant: Some(ConstantValue::Bool(value)),
                    kind: ResolvedExprKind::Literal(ConstantValue::Bool(value)),
                }
            }
        }
    }

    fn resolve_member_access(
        &mut self,
        base: &ast::Expr,
        field: StringId,
        chain: Option<&ast::MemberChain>,
        location: SourceLocation,
    ) -> ResolvedExpr {
        let resolved_base = self.resolve_expr(base, None);
        let mut path = Vec::new();
        let mut current_ty = resolved_base.ty.clone();
        let mut current_field = Some(field);
        let mut next_link = chain;
        loop {
            let Some(field_name) = current_field else { break };
            let Some((idx, field_ty)) = self.lookup_struct_field(&current_ty, field_name, &location) else {
                break;
            };
            path.push((idx as u32, field_ty.clone()));
            current_ty = field_ty;
            current_field = next_link.map(|c| c.field_name);
            next_link = next_link.and_then(|c| c.next.as_deref());
        }
        let ty = path.last().map_or(current_ty, |(_, t)| t.clone());
        ResolvedExpr {
            location,
            ty,
            constant: None,
            kind: ResolvedExprKind::MemberAccess { base: Box::new(resolved_base), path },
        }
    }

    fn lookup_struct_field(&mut self, base_ty: &Type, field_name: StringId, loc: &SourceLocation) -> Option<(usize, Type)> {
        if base_ty.pointer_depth != 0 {
            self.diags.error(loc.clone(), "member access requires a struct value, not a pointer (use `*` to dereference first).".to_string());
            return None;
        }
        let BaseType::Custom(struct_name) = base_ty.base else {
            self.diags.error(loc.clone(), "member access on a non-struct type.".to_string());
            return None;
        };
        let Some(&struct_id) = self.struct_table.get(&struct_name) else {
            self.diags.error(loc.clone(), "member access on an unknown struct type.".to_string());
            return None;
        };
        let ResolvedDeclData::Struct(decl) = self.arena.get(struct_id) else {
            return None;
        };
        match decl.field_index(field_name) {
            Some(idx) => Some((idx, decl.fields[idx].1.clone())),
            None => {
                self.diags.error(
                    loc.clone(),
                    format!("struct '{}' has no field '{}'.", self.interner.resolve(struct_name), self.interner.resolve(field_name)),
                );
                None
            }
        }
    }

    fn resolve_array_access(&mut self, base: &ast::Expr, indices: &[ast::Expr], location: SourceLocation) -> ResolvedExpr {
        let resolved_base = self.resolve_expr(base, None);
        let mut resolved_indices = Vec::with_capacity(indices.len());
        let mut ty = resolved_base.ty.clone();
        for idx_expr in indices {
            resolved_indices.push(self.resolve_expr(idx_expr, Some(&Type::int(IntKind::I64))));
            ty = if ty.array.is_some() {
                ty.decay_one_dimension().unwrap_or(ty)
            } else if ty.pointer_depth > 0 {
                Type { pointer_depth: ty.pointer_depth - 1, ..ty }
            } else {
                self.diags.error(location.clone(), "indexing a non-array, non-pointer value.".to_string());
                ty
            };
        }
        ResolvedExpr {
            location,
            ty,
            constant: None,
            kind: ResolvedExprKind::ArrayElementAccess { base: Box::new(resolved_base), indices: resolved_indices },
        }
    }

    /// A call's callee is either a bare name or a module-qualified name
    /// (`module::symbol`, sharing `EnumElementAccess`'s shape with enum-member
    /// access — see `resolve_qualified_symbol`); either way it must name a
    /// plain identifier, never an arbitrary expression.
    fn callee_name(&self, callee: &ast::Expr) -> Option<StringId> {
        match &callee.kind {
            ast::ExprKind::DeclRef(id) => Some(id.name),
            ast::ExprKind::EnumElementAccess { enum_name, member } if !self.enum_table.contains_key(enum_name) => Some(*member),
            _ => None,
        }
    }

    fn resolve_call(&mut self, callee: &ast::Expr, args: &[ast::Expr], location: SourceLocation) -> ResolvedExpr {
        let Some(name) = self.callee_name(callee) else {
            self.diags.error(location.clone(), "call target must be a function name.".to_string());
            let err = self.error_decl_id();
            return ResolvedExpr { location, ty: Type::void(), constant: None, kind: ResolvedExprKind::Call { callee: err, args: Vec::new() } };
        };
        let Some((decl_id, _)) = self.scopes.lookup(name) else {
            self.diags.error(location.clone(), format!("call to undeclared function '{}'.", self.interner.resolve(name)));
            let err = self.error_decl_id();
            let resolved_args = args.iter().map(|a| self.resolve_expr(a, None)).collect();
            return ResolvedExpr { location, ty: Type::void(), constant: None, kind: ResolvedExprKind::Call { callee: err, args: resolved_args } };
        };
        let (return_type, param_types, variadic) = match self.arena.get(decl_id) {
            ResolvedDeclData::Function(f) => (
                f.return_type.clone(),
                f.params.iter().map(|p| self.arena.get(*p).ty()).collect::<Vec<_>>(),
                f.variadic,
            ),
            _ => {
                self.diags.error(location.clone(), format!("'{}' is not a function.", self.interner.resolve(name)));
                (Type::void(), Vec::new(), true)
            }
        };
        if args.len() < param_types.len() || (!variadic && args.len() > param_types.len()) {
            self.diags.error(
                location.clone(),
                format!("'{}' expects {} argument(s), found {}.", self.interner.resolve(name), param_types.len(), args.len()),
            );
        }
        let resolved_args = args
            .iter()
            .enumerate()
            .map(|(i, a)| self.resolve_expr(a, param_types.get(i)))
            .collect();
        ResolvedExpr { location, ty: return_type, constant: None, kind: ResolvedExprKind::Call { callee: decl_id, args: resolved_args } }
    }

    fn resolve_struct_literal(
        &mut self,
        type_name: Option<StringId>,
        fields: &[ast::StructLiteralField],
        expected: Option<&Type>,
        location: SourceLocation,
    ) -> ResolvedExpr {
        let inferred_name = type_name.or_else(|| match expected.map(|t| &t.base) {
            Some(BaseType::Custom(name)) => Some(*name),
            _ => None,
        });
        let Some(struct_name) = inferred_name else {
            self.diags.error(location.clone(), "struct literal needs a type name or a typed target to infer one.".to_string());
            return ResolvedExpr { location, ty: Type::void(), constant: None, kind: ResolvedExprKind::StructLiteral { struct_decl: self.error_decl_id(), fields: Vec::new() } };
        };
        let Some(&struct_id) = self.struct_table.get(&struct_name) else {
            self.diags.error(location.clone(), format!("unknown struct type '{}'.", self.interner.resolve(struct_name)));
            return ResolvedExpr { location, ty: Type::void(), constant: None, kind: ResolvedExprKind::StructLiteral { struct_decl: self.error_decl_id(), fields: Vec::new() } };
        };
        let struct_fields = match self.arena.get(struct_id) {
            ResolvedDeclData::Struct(s) => s.fields.clone(),
            _ => Vec::new(),
        };
        let mut resolved_fields: Vec<Option<ResolvedExpr>> = vec![None; struct_fields.len()];
        for (positional_index, field) in fields.iter().enumerate() {
            let slot = match field.name {
                Some(name) => struct_fields.iter().position(|(n, _)| *n == name),
                None => Some(positional_index),
            };
            let Some(slot) = slot else {
                self.diags.error(location.clone(), "struct literal names a field that doesn't exist.".to_string());
                continue;
            };
            if let Some(value) = &field.value {
                let expected_ty = struct_fields.get(slot).map(|(_, t)| t);
                resolved_fields[slot] = Some(self.resolve_expr(value, expected_ty));
            }
        }
        ResolvedExpr {
            location,
            ty: Type::simple(BaseType::Custom(struct_name)),
            constant: None,
            kind: ResolvedExprKind::StructLiteral { struct_decl: struct_id, fields: resolved_fields },
        }
    }

    fn resolve_array_literal(&mut self, elements: &[ast::Expr], expected: Option<&Type>, location: SourceLocation) -> ResolvedExpr {
        let element_expected = expected.and_then(Type::decay_one_dimension);
        let resolved: Vec<ResolvedExpr> = elements.iter().map(|e| self.resolve_expr(e, element_expected.as_ref())).collect();
        let element_base = resolved.first().map_or(Type::void(), |e| e.ty.clone());
        let ty = Type {
            base: element_base.base,
            pointer_depth: element_base.pointer_depth,
            array: Some(crate::types::ArrayDims(vec![resolved.len() as u64])),
        };
        ResolvedExpr { location, ty, constant: None, kind: ResolvedExprKind::ArrayLiteral { elements: resolved } }
    }

    /// `module::symbol` shares its `::` syntax with `EnumName::member`
    /// (§4.2); the parser can't tell them apart since both sides are bare
    /// identifiers at parse time. Once `enum_name` fails to name a known
    /// enum we treat it as the module-qualifier case instead: imports are
    /// flattened into the importer's scope by name (§3 "Ownership"), so
    /// resolving `symbol` alone after the already-merged exported tables is
    /// exactly cross-module lookup.
    fn resolve_qualified_symbol(&mut self, module_name: StringId, member: StringId, location: SourceLocation) -> ResolvedExpr {
        let (decl_id, ty) = match self.scopes.lookup(member) {
            Some((decl_id, _)) => (decl_id, self.arena.get(decl_id).ty()),
            None => {
                self.diags.error(
                    location.clone(),
                    format!(
                        "could not resolve module '{}' (no symbol '{}' is visible).",
                        self.interner.resolve(module_name),
                        self.interner.resolve(member)
                    ),
                );
                let err = self.error_decl_id();
                (err, self.arena.get(err).ty())
            }
        };
        ResolvedExpr { location, ty, constant: None, kind: ResolvedExprKind::DeclRef(decl_id) }
    }

    fn resolve_enum_element(&mut self, enum_name: StringId, member: StringId, location: SourceLocation) -> ResolvedExpr {
        let Some(&enum_id) = self.enum_table.get(&enum_name) else {
            self.diags.error(location.clone(), format!("unknown enum type '{}'.", self.interner.resolve(enum_name)));
            return ResolvedExpr { location, ty: Type::int(IntKind::I32), constant: None, kind: ResolvedExprKind::EnumElementAccess { enum_decl: self.error_decl_id(), value: 0 } };
        };
        let (value, underlying) = match self.arena.get(enum_id) {
            ResolvedDeclData::Enum(e) => (e.members.get(&member).copied(), e.underlying.clone()),
            _ => (None, Type::int(IntKind::I32)),
        };
        let Some(value) = value else {
            self.diags.error(
                location.clone(),
                format!("enum '{}' has no member '{}'.", self.interner.resolve(enum_name), self.interner.resolve(member)),
            );
            return ResolvedExpr { location, ty: underlying, constant: None, kind: ResolvedExprKind::EnumElementAccess { enum_decl: enum_id, value: 0 } };
        };
        let kind = match underlying.base {
            BaseType::Int(k) => k,
            _ => IntKind::I32,
        };
        ResolvedExpr {
            location,
            ty: underlying,
            constant: Some(ConstantValue::Int { kind, value }),
            kind: ResolvedExprKind::EnumElementAccess { enum_decl: enum_id, value },
        }
    }

    fn resolve_binary(&mut self, op: ast::BinOp, lhs: &ast::Expr, rhs: &ast::Expr, location: SourceLocation) -> ResolvedExpr {
        let resolved_lhs = self.resolve_expr(lhs, None);
        let resolved_rhs = self.resolve_expr(rhs, None);
        use ast::BinOp::{And, Eq, Ge, Gt, Le, Lt, Ne, Or};

        if matches!(op, And | Or) {
            let constant = constexpr::fold_logical(op, resolved_lhs.constant, resolved_rhs.constant);
            return ResolvedExpr {
                location,
                ty: Type::bool_(),
                constant,
                kind: ResolvedExprKind::Binary { op, lhs: Box::new(resolved_lhs), rhs: Box::new(resolved_rhs) },
            };
        }

        let result_ty = if matches!(op, Eq | Ne | Lt | Le | Gt | Ge) {
            Type::bool_()
        } else {
            self.promote_arithmetic(&resolved_lhs.ty, &resolved_rhs.ty)
        };
        let constant = match (resolved_lhs.constant, resolved_rhs.constant) {
            (Some(a), Some(b)) => constexpr::fold_binary_arithmetic(op, a, b),
            _ => None,
        };
        ResolvedExpr {
            location,
            ty: result_ty,
            constant,
            kind: ResolvedExprKind::Binary { op, lhs: Box::new(resolved_lhs), rhs: Box::new(resolved_rhs) },
        }
    }

    /// §4.5 P1–P4: same-kind ints keep their kind, mixed int kinds widen per
    /// `constexpr::promote_int_pair`, any float operand wins over int (P3),
    /// and two bools stay `Bool` while a bool mixed with an int is treated
    /// as `u8` (P4).
    fn promote_arithmetic(&self, lhs: &Type, rhs: &Type) -> Type {
        if lhs.is_float() || rhs.is_float() {
            let lk = if let BaseType::Float(k) = lhs.base { k } else { FloatKind::F32 };
            let rk = if let BaseType::Float(k) = rhs.base { k } else { FloatKind::F32 };
            return Type::float(constexpr::promote_float_pair(lk, rk));
        }
        if lhs.is_bool() && rhs.is_bool() {
            return Type::bool_();
        }
        let lk = int_kind_of(lhs);
        let rk = int_kind_of(rhs);
        Type::int(constexpr::promote_int_pair(lk, rk))
    }

    fn resolve_unary(&mut self, op: ast::UnaryOp, rhs: &ast::Expr, location: SourceLocation) -> ResolvedExpr {
        // L1's negative-literal rule is realised here: `-<int literal>` is
        // folded as one unit rather than negating a pre-typed literal
        // afterwards (see constexpr.rs's `fold_unary` doc comment).
        if let (ast::UnaryOp::Neg, ast::ExprKind::NumberLiteral { kind: ast::NumberKind::Integer, text }) = (op, &rhs.kind) {
            let magnitude: i128 = text.parse().unwrap_or(0);
            let negated = -magnitude;
            let int_kind = constexpr::smallest_signed_kind(negated).unwrap_or(IntKind::I64);
            let (int_kind, value) = constexpr::widen_or_wrap(negated, int_kind);
            return ResolvedExpr {
                location,
                ty: Type::int(int_kind),
                constant: Some(ConstantValue::Int { kind: int_kind, value }),
                kind: ResolvedExprKind::Unary {
                    op,
                    rhs: Box::new(self.resolve_number_literal(ast::NumberKind::Integer, text, rhs.location.clone())),
                },
            };
        }

        let resolved_rhs = self.resolve_expr(rhs, None);
        let (ty, constant) = match op {
            ast::UnaryOp::Not => {
                if !resolved_rhs.ty.is_bool() {
                    self.diags.error(location.clone(), "`!` requires a bool operand.".to_string());
                }
                (Type::bool_(), resolved_rhs.constant.and_then(|c| constexpr::fold_unary(op, c)))
            }
            ast::UnaryOp::Neg => (resolved_rhs.ty.clone(), resolved_rhs.constant.and_then(|c| constexpr::fold_unary(op, c))),
            ast::UnaryOp::Deref => {
                if resolved_rhs.ty.pointer_depth == 0 {
                    self.diags.error(location.clone(), "cannot dereference a non-pointer value.".to_string());
                }
                (
                    Type { pointer_depth: resolved_rhs.ty.pointer_depth.saturating_sub(1), ..resolved_rhs.ty.clone() },
                    None,
                )
            }
            ast::UnaryOp::AddrOf => (Type { pointer_depth: resolved_rhs.ty.pointer_depth + 1, ..resolved_rhs.ty.clone() }, None),
        };
        ResolvedExpr { location, ty, constant, kind: ResolvedExprKind::Unary { op, rhs: Box::new(resolved_rhs) } }
    }

    fn resolve_cast(&mut self, target: &Type, rhs: &ast::Expr, location: SourceLocation) -> ResolvedExpr {
        self.validate_type(target, &location);
        let resolved_rhs = self.resolve_expr(rhs, None);
        let kind = cast_kind(target, &resolved_rhs.ty);
        ResolvedExpr {
            location,
            ty: target.clone(),
            constant: None,
            kind: ResolvedExprKind::Cast { kind, rhs: Box::new(resolved_rhs) },
        }
    }
}

fn int_kind_of(ty: &Type) -> IntKind {
    match ty.base {
        BaseType::Int(k) => k,
        BaseType::Bool => IntKind::U8,
        _ => IntKind::I32,
    }
}

/// §4.5 cast-kind selection: which of the concrete cast variants a
/// `(type)expr` compiles down to, based purely on the source/target type
/// shapes (grounded in `compiler/src/sema.cpp`'s equivalent switch, as
/// described above).
fn cast_kind(target: &Type, source: &Type) -> ast::CastKind {
    if target.pointer_depth > 0 && source.pointer_depth > 0 {
        return ast::CastKind::Ptr;
    }
    if target.pointer_depth > 0 && source.is_integer() {
        return ast::CastKind::IntToPtr;
    }
    if target.is_integer() && source.pointer_depth > 0 {
        return ast::CastKind::PtrToInt;
    }
    if target.is_float() && (source.is_integer() || source.is_bool()) {
        return ast::CastKind::IntToFloat;
    }
    if (target.is_integer() || target.is_bool()) && source.is_float() {
        return ast::CastKind::FloatToInt;
    }
    if target.is_integer() && (source.is_integer() || source.is_bool()) {
        return if int_width_bytes(int_kind_of(target)) >= int_width_bytes(int_kind_of(source)) {
            ast::CastKind::Extend
        } else {
            ast::CastKind::Truncate
        };
    }
    ast::CastKind::Nop
}
