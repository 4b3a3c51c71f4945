//! Tokens → AST: recursive descent with precedence climbing
//! for expressions, error recovery by synchronisation.
//!
//! The whole file is lexed up front into a token buffer so the parser can
//! freely save/restore a cursor position — needed for the `(type)` cast vs.
//! `(expr)` grouping disambiguation (try parsing a type, back up on
//! failure) and for the module pre-pass in `module.rs`.

use crate::ast::{
    Block, BinOp, EnumDecl, EnumMember, Expr, ExprKind, FunctionDecl, Identifier, NumberKind, ParamDecl, ParsedFile,
    StructDecl, StructField, StructLiteralField, Stmt, StmtKind, TopLevelDecl, UnaryOp, VarDecl,
};
use crate::diagnostics::Diagnostics;
use crate::intern::Interner;
use crate::lexer::Lexer;
use crate::source::{SourceFile, SourceLocation};
use crate::token::{Token, TokenKind};
use crate::types::{BaseType, FloatKind, FunctionPointerType, IntKind, Type};

/// Token kinds that resynchronise the parser after a top-level error:
/// the next top-level keyword, or a terminating `;`/`}` at brace depth 0.
const SYNC_KINDS: &[TokenKind] = &[
    TokenKind::KwFn,
    TokenKind::KwStruct,
    TokenKind::KwEnum,
    TokenKind::KwVar,
    TokenKind::KwConst,
    TokenKind::KwExtern,
    TokenKind::Eof,
    TokenKind::Semicolon,
];

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    diags: &'a Diagnostics,
    interner: &'a mut Interner,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &SourceFile, diags: &'a Diagnostics, interner: &'a mut Interner) -> Self {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Self {
            tokens,
            pos: 0,
            diags,
            interner,
        }
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.tokens.get(self.pos + ahead).map_or(TokenKind::Eof, |t| t.kind)
    }

    fn loc(&self) -> SourceLocation {
        self.cur().location.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn eat_if(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.error_unexpected(&[kind]);
            None
        }
    }

    fn error_unexpected(&mut self, expected: &[TokenKind]) {
        let expected_list = expected
            .iter()
            .map(|k| k.describe())
            .collect::<Vec<_>>()
            .join(" or ");
        let found = self.cur().kind.describe();
        self.diags.error(
            self.loc(),
            format!("unexpected token: expected {expected_list}, found {found}."),
        );
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diags.error(self.loc(), message);
    }

    fn intern_identifier(&mut self) -> Option<Identifier> {
        if !self.at(TokenKind::Identifier) {
            self.error_unexpected(&[TokenKind::Identifier]);
            return None;
        }
        let tok = self.advance();
        let name = self.interner.intern(tok.value.as_deref().unwrap_or_default());
        Some(Identifier {
            location: tok.location,
            name,
        })
    }

    /// Skips to the next top-level synchronisation point.
    fn synchronise(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match self.cur().kind {
                TokenKind::Eof => return,
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                kind if depth == 0 && SYNC_KINDS.contains(&kind) && kind != TokenKind::Semicolon => {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Entry point: "parse a source file".
    pub fn parse_file(mut self) -> ParsedFile {
        let mut decls = Vec::new();
        let mut is_complete_ast = true;
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::KwExtern) {
                match self.parse_extern_block() {
                    Some(mut funcs) => decls.append(&mut funcs),
                    None => {
                        is_complete_ast = false;
                        self.synchronise();
                    }
                }
                continue;
            }
            match self.parse_top_level_decl() {
                Some(decl) => decls.push(decl),
                None => {
                    is_complete_ast = false;
                    self.synchronise();
                }
            }
        }
        ParsedFile { decls, is_complete_ast }
    }

    fn parse_top_level_decl(&mut self) -> Option<TopLevelDecl> {
        if self.eat_if(TokenKind::KwImport) {
            let name = self.intern_identifier()?;
            self.expect(TokenKind::Semicolon)?;
            return Some(TopLevelDecl::Import(name));
        }
        let exported = self.eat_if(TokenKind::KwExport);
        if self.at(TokenKind::KwStruct) {
            return self.parse_struct_decl(exported).map(TopLevelDecl::Struct);
        }
        if self.at(TokenKind::KwEnum) {
            return self.parse_enum_decl(exported).map(TopLevelDecl::Enum);
        }
        if self.at(TokenKind::KwFn) {
            return self.parse_function_decl(exported, None).map(TopLevelDecl::Function);
        }
        if self.at(TokenKind::KwVar) || self.at(TokenKind::KwConst) {
            return self.parse_var_decl_stmt(true).map(TopLevelDecl::Var);
        }
        self.error_unexpected(&[
            TokenKind::KwImport,
            TokenKind::KwExtern,
            TokenKind::KwStruct,
            TokenKind::KwEnum,
            TokenKind::KwFn,
            TokenKind::KwVar,
            TokenKind::KwConst,
        ]);
        None
    }

    /// `extern "libname" { (fn decl)* }` — supplemented grammar, see
    /// SPEC_FULL.md §3. Grounded on `parser.cpp`'s `parse_extern_block`,
    /// which loops collecting every `fn` declaration up to the closing
    /// brace rather than admitting just one.
    fn parse_extern_block(&mut self) -> Option<Vec<TopLevelDecl>> {
        self.expect(TokenKind::KwExtern)?;
        let lib_tok = self.expect(TokenKind::StringLiteral)?;
        let library = lib_tok.value.unwrap_or_default();
        self.expect(TokenKind::LBrace)?;
        let mut decls = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            self.expect(TokenKind::KwFn)?;
            let func = self.parse_function_decl(false, Some(library.clone()))?;
            decls.push(TopLevelDecl::Function(func));
        }
        self.expect(TokenKind::RBrace)?;
        Some(decls)
    }

    fn parse_struct_decl(&mut self, exported: bool) -> Option<StructDecl> {
        let location = self.loc();
        self.expect(TokenKind::KwStruct)?;
        let name = self.intern_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let ty = self.parse_type()?;
            let field_name = self.intern_identifier()?;
            self.expect(TokenKind::Semicolon)?;
            fields.push(StructField {
                name: field_name.name,
                ty,
            });
        }
        self.expect(TokenKind::RBrace)?;
        Some(StructDecl {
            location,
            name: name.name,
            fields,
            exported,
        })
    }

    fn parse_enum_decl(&mut self, exported: bool) -> Option<EnumDecl> {
        let location = self.loc();
        self.expect(TokenKind::KwEnum)?;
        let name = self.intern_identifier()?;
        let underlying = if self.eat_if(TokenKind::Colon) {
            self.parse_type()?
        } else {
            Type::int(IntKind::I32)
        };
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let member_name = self.intern_identifier()?;
            let value = if self.eat_if(TokenKind::Equal) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name.name,
                value,
            });
            if !self.eat_if(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(EnumDecl {
            location,
            name: name.name,
            underlying,
            members,
            exported,
        })
    }

    fn parse_function_decl(&mut self, exported: bool, library: Option<String>) -> Option<FunctionDecl> {
        let location = self.loc();
        self.expect(TokenKind::KwFn)?;
        let return_type = self.parse_type()?;
        let name = self.intern_identifier()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut variadic = false;
        while !self.at(TokenKind::RParen) {
            if self.eat_if(TokenKind::Ellipsis) {
                variadic = true;
                break;
            }
            let is_const = self.eat_if(TokenKind::KwConst);
            let ty = self.parse_type()?;
            let param_name = self.intern_identifier()?;
            params.push(ParamDecl {
                location: param_name.location.clone(),
                name: param_name.name,
                ty,
                is_const,
            });
            if !self.eat_if(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let original_name = if library.is_some() && self.eat_if(TokenKind::KwAlias) {
            Some(self.intern_identifier()?.name)
        } else {
            None
        };

        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.expect(TokenKind::Semicolon)?;
            None
        };

        Some(FunctionDecl {
            location,
            name: name.name,
            return_type,
            params,
            variadic,
            body,
            exported,
            library,
            original_name,
        })
    }

    /// `(const|var) type id (= expr)? ;`
    fn parse_var_decl_stmt(&mut self, is_global: bool) -> Option<VarDecl> {
        let location = self.loc();
        let is_const = self.at(TokenKind::KwConst);
        if !self.eat_if(TokenKind::KwConst) {
            self.expect(TokenKind::KwVar)?;
        }
        let ty = self.parse_type()?;
        let name = self.intern_identifier()?;
        let initializer = if self.eat_if(TokenKind::Equal) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Some(VarDecl {
            location,
            name: name.name,
            ty,
            is_const,
            is_global,
            initializer,
        })
    }

    /// `<type> ::= 'void' ('*')* | <identifier> ('*')* ('[' integer ']')* | 'fn' '*' rtype '(' ptype,... ')'`
    fn parse_type(&mut self) -> Option<Type> {
        if self.eat_if(TokenKind::KwVoid) {
            let depth = self.parse_pointer_depth();
            return Some(Type {
                base: BaseType::Void,
                pointer_depth: depth,
                array: None,
            });
        }
        if self.at(TokenKind::KwFn) {
            return self.parse_function_pointer_type();
        }
        if self.at(TokenKind::Identifier) {
            let tok = self.advance();
            let text = tok.value.clone().unwrap_or_default();
            let base = builtin_base_type(&text).unwrap_or_else(|| BaseType::Custom(self.interner.intern(&text)));
            let pointer_depth = self.parse_pointer_depth();
            let array = self.parse_array_dims();
            return Some(Type {
                base,
                pointer_depth,
                array,
            });
        }
        self.error_unexpected(&[TokenKind::KwVoid, TokenKind::KwFn, TokenKind::Identifier]);
        None
    }

    fn parse_pointer_depth(&mut self) -> u32 {
        let mut depth = 0;
        while self.eat_if(TokenKind::Asterisk) {
            depth += 1;
        }
        depth
    }

    fn parse_array_dims(&mut self) -> Option<crate::types::ArrayDims> {
        if !self.at(TokenKind::LBracket) {
            return None;
        }
        let mut dims = Vec::new();
        while self.eat_if(TokenKind::LBracket) {
            if self.at(TokenKind::Integer) {
                let tok = self.advance();
                let n: u64 = tok.value.as_deref().unwrap_or("0").parse().unwrap_or(0);
                dims.push(n);
            } else {
                dims.push(0);
            }
            self.expect(TokenKind::RBracket);
        }
        Some(crate::types::ArrayDims(dims))
    }

    fn parse_function_pointer_type(&mut self) -> Option<Type> {
        self.expect(TokenKind::KwFn)?;
        self.expect(TokenKind::Asterisk)?;
        let return_type = self.parse_type()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut variadic = false;
        while !self.at(TokenKind::RParen) {
            if self.eat_if(TokenKind::Ellipsis) {
                variadic = true;
                break;
            }
            params.push(self.parse_type()?);
            if !self.eat_if(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Some(Type {
            base: BaseType::FunctionPointer(FunctionPointerType {
                return_type: Box::new(return_type),
                params,
                variadic,
            }),
            pointer_depth: 0,
            array: None,
        })
    }

    fn parse_block(&mut self) -> Option<Block> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.parse_stmt() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronise(),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(Block { statements })
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        let location = self.loc();
        if self.at(TokenKind::LBrace) {
            let block = self.parse_block()?;
            return Some(Stmt {
                location,
                kind: StmtKind::Block(block),
            });
        }
        if self.at(TokenKind::KwWhile) {
            return self.parse_while_stmt();
        }
        if self.at(TokenKind::KwFor) {
            return self.parse_for_stmt();
        }
        if self.at(TokenKind::KwIf) {
            return self.parse_if_stmt();
        }
        if self.eat_if(TokenKind::KwReturn) {
            let expr = if self.at(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::Semicolon)?;
            return Some(Stmt {
                location,
                kind: StmtKind::Return(expr),
            });
        }
        if self.eat_if(TokenKind::KwDefer) {
            let inner = self.parse_stmt()?;
            return Some(Stmt {
                location,
                kind: StmtKind::Defer(Box::new(inner)),
            });
        }
        if self.at(TokenKind::KwVar) || self.at(TokenKind::KwConst) {
            let decl = self.parse_var_decl_stmt(false)?;
            return Some(Stmt {
                location,
                kind: StmtKind::Decl(decl),
            });
        }
        self.parse_assignment_or_expr_stmt()
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let location = self.loc();
        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Some(Stmt {
            location,
            kind: StmtKind::While { condition, body },
        })
    }

    /// `for ( var-decl ; expr ; simple-stmt ) block` — the loop variable
    /// lives in its own scope.
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let location = self.loc();
        self.expect(TokenKind::KwFor)?;
        self.expect(TokenKind::LParen)?;
        let counter = self.parse_var_decl_stmt(false)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let increment = self.parse_assignment_or_expr_stmt_no_semicolon()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Some(Stmt {
            location,
            kind: StmtKind::For {
                counter,
                condition,
                increment: Box::new(increment),
                body,
            },
        })
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let location = self.loc();
        self.expect(TokenKind::KwIf)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_block = self.parse_block()?;
        let else_branch = if self.eat_if(TokenKind::KwElse) {
            if self.at(TokenKind::KwIf) {
                Some(Box::new(self.parse_if_stmt()?))
            } else {
                let else_loc = self.loc();
                let block = self.parse_block()?;
                Some(Box::new(Stmt {
                    location: else_loc,
                    kind: StmtKind::Block(block),
                }))
            }
        } else {
            None
        };
        Some(Stmt {
            location,
            kind: StmtKind::If {
                condition,
                then_block,
                else_branch,
            },
        })
    }

    fn parse_assignment_or_expr_stmt(&mut self) -> Option<Stmt> {
        let stmt = self.parse_assignment_or_expr_stmt_no_semicolon()?;
        self.expect(TokenKind::Semicolon)?;
        Some(stmt)
    }

    fn parse_assignment_or_expr_stmt_no_semicolon(&mut self) -> Option<Stmt> {
        let location = self.loc();
        let expr = self.parse_expr()?;
        if self.eat_if(TokenKind::Equal) {
            let rhs = self.parse_expr()?;
            let (deref_count, lvalue) = strip_deref_layers(expr);
            if !is_assignable(&lvalue) {
                self.diags.error(
                    lvalue.location.clone(),
                    "assignment to non-lvalue expression.",
                );
            }
            return Some(Stmt {
                location,
                kind: StmtKind::Assignment {
                    lvalue,
                    deref_count,
                    rhs,
                },
            });
        }
        Some(Stmt {
            location,
            kind: StmtKind::Expr(expr),
        })
    }

    // ---- expression precedence ladder ----
    // `||` < `&&` < `| ^ & << >>` < `== !=` < `< <= > >=` < `+ -` < `* / %`
    // < unary < postfix.

    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_and()?;
        while self.at(TokenKind::PipePipe) {
            let location = self.loc();
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(location, BinOp::Or, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_bitwise()?;
        while self.at(TokenKind::AmpAmp) {
            let location = self.loc();
            self.advance();
            let rhs = self.parse_bitwise()?;
            lhs = binary(location, BinOp::And, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_bitwise(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_equality()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::Pipe => BinOp::BitOr,
                TokenKind::Hat => BinOp::BitXor,
                TokenKind::Amp => BinOp::BitAnd,
                TokenKind::BitwiseShiftL => BinOp::Shl,
                TokenKind::BitwiseShiftR => BinOp::Shr,
                _ => break,
            };
            let location = self.loc();
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = binary(location, op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::EqualEqual => BinOp::Eq,
                TokenKind::ExclamationEqual => BinOp::Ne,
                _ => break,
            };
            let location = self.loc();
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = binary(location, op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_relational(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::LessThan => BinOp::Lt,
                TokenKind::LessThanOrEqual => BinOp::Le,
                TokenKind::GreaterThan => BinOp::Gt,
                TokenKind::GreaterThanOrEqual => BinOp::Ge,
                _ => break,
            };
            let location = self.loc();
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = binary(location, op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let location = self.loc();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(location, op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::Asterisk => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let location = self.loc();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(location, op, lhs, rhs);
        }
        Some(lhs)
    }

    /// Unary prefix `! - * &`, right-associative, above all binary
    /// operators.
    fn parse_unary(&mut self) -> Option<Expr> {
        let location = self.loc();
        let op = match self.cur().kind {
            TokenKind::Exclamation => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Asterisk => Some(UnaryOp::Deref),
            TokenKind::Amp => Some(UnaryOp::AddrOf),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_unary()?;
            return Some(Expr {
                location,
                kind: ExprKind::Unary { op, rhs: Box::new(rhs) },
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.cur().kind {
                TokenKind::LParen => {
                    let location = self.loc();
                    self.advance();
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        if !self.eat_if(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Expr {
                        location,
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                    };
                }
                TokenKind::LBracket => {
                    let location = self.loc();
                    self.advance();
                    let mut indices = vec![self.parse_expr()?];
                    self.expect(TokenKind::RBracket)?;
                    while self.eat_if(TokenKind::LBracket) {
                        indices.push(self.parse_expr()?);
                        self.expect(TokenKind::RBracket)?;
                    }
                    expr = Expr {
                        location,
                        kind: ExprKind::ArrayElementAccess {
                            base: Box::new(expr),
                            indices,
                        },
                    };
                }
                TokenKind::Dot => {
                    let location = self.loc();
                    self.advance();
                    if self.at(TokenKind::LBrace) {
                        expr = self.parse_struct_literal_tail(expr, location)?;
                        continue;
                    }
                    let field = self.intern_identifier()?;
                    expr = Expr {
                        location,
                        kind: ExprKind::MemberAccess {
                            base: Box::new(expr),
                            field: field.name,
                            chain: None,
                        },
                    };
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// `. { (.field = expr | expr) (, )* }` — struct literal syntax
    ///. `expr` at this point must itself be a type-name
    /// reference (`DeclRef`); sema later resolves it against struct decls.
    fn parse_struct_literal_tail(&mut self, type_expr: Expr, location: SourceLocation) -> Option<Expr> {
        let type_name = match type_expr.kind {
            ExprKind::DeclRef(id) => Some(id.name),
            _ => None,
        };
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Dot) {
                self.advance();
                let name = self.intern_identifier()?;
                self.expect(TokenKind::Equal)?;
                let value = self.parse_expr()?;
                fields.push(StructLiteralField {
                    name: Some(name.name),
                    value: Some(value),
                });
            } else {
                let value = self.parse_expr()?;
                fields.push(StructLiteralField {
                    name: None,
                    value: Some(value),
                });
            }
            if !self.eat_if(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(Expr {
            location,
            kind: ExprKind::StructLiteral { type_name, fields },
        })
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let location = self.loc();
        match self.cur().kind {
            TokenKind::Integer => {
                let tok = self.advance();
                Some(Expr {
                    location,
                    kind: ExprKind::NumberLiteral {
                        kind: NumberKind::Integer,
                        text: tok.value.unwrap_or_default(),
                    },
                })
            }
            TokenKind::BinInteger => {
                let tok = self.advance();
                let text = tok.value.unwrap_or_default();
                let digits = text.trim_start_matches("0b");
                let value = u64::from_str_radix(digits, 2).unwrap_or(0);
                Some(Expr {
                    location,
                    kind: ExprKind::NumberLiteral {
                        kind: NumberKind::Integer,
                        text: value.to_string(),
                    },
                })
            }
            TokenKind::Real => {
                let tok = self.advance();
                Some(Expr {
                    location,
                    kind: ExprKind::NumberLiteral {
                        kind: NumberKind::Real,
                        text: tok.value.unwrap_or_default(),
                    },
                })
            }
            TokenKind::BoolConstant => {
                let tok = self.advance();
                Some(Expr {
                    location,
                    kind: ExprKind::NumberLiteral {
                        kind: NumberKind::Bool,
                        text: tok.value.unwrap_or_default(),
                    },
                })
            }
            TokenKind::StringLiteral => {
                let tok = self.advance();
                Some(Expr {
                    location,
                    kind: ExprKind::StringLiteral(tok.value.unwrap_or_default()),
                })
            }
            TokenKind::CharLiteral => {
                let tok = self.advance();
                Some(Expr {
                    location,
                    kind: ExprKind::CharLiteral(tok.value.unwrap_or_default()),
                })
            }
            TokenKind::KwNull => {
                self.advance();
                Some(Expr {
                    location,
                    kind: ExprKind::Null,
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    elements.push(self.parse_expr()?);
                    if !self.eat_if(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Some(Expr {
                    location,
                    kind: ExprKind::ArrayLiteral { elements },
                })
            }
            TokenKind::LParen => self.parse_paren_expr_or_cast(location),
            TokenKind::Identifier => {
                let id = self.intern_identifier()?;
                if self.at(TokenKind::ColonColon) {
                    self.advance();
                    let member = self.intern_identifier()?;
                    return Some(Expr {
                        location,
                        kind: ExprKind::EnumElementAccess {
                            enum_name: id.name,
                            member: member.name,
                        },
                    });
                }
                Some(Expr {
                    location,
                    kind: ExprKind::DeclRef(id),
                })
            }
            _ => {
                self.error("expected an expression.".to_string());
                None
            }
        }
    }

    /// Disambiguates `(type)expr` (explicit cast) from `(expr)` (grouping):
    /// try to parse a type, and if that succeeds *and* is immediately
    /// followed by `)` followed by something that can start an expression,
    /// commit to the cast; otherwise back up and parse a grouped expression.
    fn parse_paren_expr_or_cast(&mut self, location: SourceLocation) -> Option<Expr> {
        self.expect(TokenKind::LParen)?;
        let checkpoint = self.pos;
        if let Some(ty) = self.parse_type() {
            if self.at(TokenKind::RParen) {
                self.advance();
                if starts_expression(self.cur().kind) {
                    let rhs = self.parse_unary()?;
                    return Some(Expr {
                        location,
                        kind: ExprKind::Cast {
                            target: ty,
                            rhs: Box::new(rhs),
                        },
                    });
                }
            }
        }
        self.pos = checkpoint;
        let inner = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Some(Expr {
            location,
            kind: ExprKind::Grouping(Box::new(inner)),
        })
    }
}

fn binary(location: SourceLocation, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr {
        location,
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    }
}

fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Integer
            | TokenKind::BinInteger
            | TokenKind::Real
            | TokenKind::BoolConstant
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::KwNull
            | TokenKind::LBracket
            | TokenKind::LParen
            | TokenKind::Identifier
            | TokenKind::Exclamation
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Amp
    )
}

fn builtin_base_type(name: &str) -> Option<BaseType> {
    Some(match name {
        "i8" => BaseType::Int(IntKind::I8),
        "i16" => BaseType::Int(IntKind::I16),
        "i32" => BaseType::Int(IntKind::I32),
        "i64" => BaseType::Int(IntKind::I64),
        "u8" => BaseType::Int(IntKind::U8),
        "u16" => BaseType::Int(IntKind::U16),
        "u32" => BaseType::Int(IntKind::U32),
        "u64" => BaseType::Int(IntKind::U64),
        "f32" => BaseType::Float(FloatKind::F32),
        "f64" => BaseType::Float(FloatKind::F64),
        "bool" => BaseType::Bool,
        _ => return None,
    })
}

/// Strips leading `Unary::Deref` wrappers (and any `Grouping`) off an
/// already-parsed expression, returning how many there were plus the
/// remaining base expression — used once `=` commits a parse to being an
/// assignment (only declref/deref/member/array-access LHS forms are legal).
fn strip_deref_layers(mut expr: Expr) -> (u32, Expr) {
    let mut derefs = 0;
    loop {
        match expr.kind {
            ExprKind::Grouping(inner) => {
                expr = *inner;
            }
            ExprKind::Unary {
                op: UnaryOp::Deref,
                rhs,
            } => {
                derefs += 1;
                expr = *rhs;
            }
            _ => break,
        }
    }
    (derefs, expr)
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::DeclRef(_) | ExprKind::MemberAccess { .. } | ExprKind::ArrayElementAccess { .. } | ExprKind::EnumElementAccess { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (ParsedFile, Diagnostics, Interner) {
        let diags = Diagnostics::new();
        let mut interner = Interner::new();
        let source = SourceFile::new("t.sl", src);
        let parsed = Parser::new(&source, &diags, &mut interner).parse_file();
        (parsed, diags, interner)
    }

    #[test]
    fn parses_a_function_with_if_else_and_return() {
        let (parsed, diags, _) = parse(
            "fn i32 max(i32 a, i32 b) { if (a > b) { return a; } else { return b; } }",
        );
        assert!(!diags.has_errors());
        assert!(parsed.is_complete_ast);
        assert_eq!(parsed.decls.len(), 1);
        let TopLevelDecl::Function(f) = &parsed.decls[0] else { panic!("expected a function") };
        assert_eq!(f.params.len(), 2);
        assert!(f.body.is_some());
    }

    #[test]
    fn parses_struct_and_enum_decls() {
        let (parsed, diags, interner) = parse(
            "struct Point { i32 x; i32 y; } enum Color : i32 { Red, Green = 5, Blue }",
        );
        assert!(!diags.has_errors());
        assert_eq!(parsed.decls.len(), 2);
        let TopLevelDecl::Struct(s) = &parsed.decls[0] else { panic!("expected a struct") };
        assert_eq!(s.fields.len(), 2);
        assert_eq!(interner.resolve(s.fields[0].name), "x");
        let TopLevelDecl::Enum(e) = &parsed.decls[1] else { panic!("expected an enum") };
        assert_eq!(e.members.len(), 3);
        assert!(e.members[1].value.is_some());
    }

    #[test]
    fn parses_extern_block_with_alias() {
        let (parsed, diags, interner) = parse(r#"extern "m" { fn void foo() alias bar; }"#);
        assert!(!diags.has_errors());
        let TopLevelDecl::Function(f) = &parsed.decls[0] else { panic!("expected a function") };
        assert_eq!(f.library.as_deref(), Some("m"));
        assert_eq!(interner.resolve(f.original_name.expect("original_name set")), "bar");
        assert!(f.body.is_none());
    }

    #[test]
    fn extern_block_admits_more_than_one_function() {
        let (parsed, diags, interner) = parse(r#"extern "m" { fn i32 a(); fn i32 b(i32 x); }"#);
        assert!(!diags.has_errors(), "{diags:?}");
        assert_eq!(parsed.decls.len(), 2);
        for decl in &parsed.decls {
            let TopLevelDecl::Function(f) = decl else { panic!("expected a function") };
            assert_eq!(f.library.as_deref(), Some("m"));
            assert!(f.body.is_none());
        }
        let TopLevelDecl::Function(second) = &parsed.decls[1] else { panic!("expected a function") };
        assert_eq!(interner.resolve(second.name), "b");
        assert_eq!(second.params.len(), 1);
    }

    #[test]
    fn disambiguates_cast_from_grouping() {
        let (parsed, diags, _) = parse("fn i32 f(i32 x) { return (i32)(x + 1); }");
        assert!(!diags.has_errors());
        assert!(parsed.is_complete_ast);
    }

    #[test]
    fn synchronises_after_a_malformed_top_level_decl_and_keeps_parsing() {
        let (parsed, diags, _) = parse("fn i32 (bad; fn i32 ok() { return 0; }");
        assert!(diags.has_errors());
        assert!(!parsed.is_complete_ast);
        assert!(parsed.decls.iter().any(|d| matches!(d, TopLevelDecl::Function(_))));
    }

    #[test]
    fn bitwise_operators_sit_below_equality_and_above_logical_and() {
        let (parsed, diags, _) = parse("fn i32 f(i32 a, i32 b) { return a & b == 0 && a | b != 0; }");
        assert!(!diags.has_errors());
        let TopLevelDecl::Function(f) = &parsed.decls[0] else { panic!("expected a function") };
        let body = f.body.as_ref().unwrap();
        let StmtKind::Return(Some(expr)) = &body.statements[0].kind else { panic!("expected a return") };
        // top level op must be `&&`, since `==`/`&`/`!=`/`|` all bind tighter.
        assert!(matches!(&expr.kind, ExprKind::Binary { op: BinOp::And, .. }));
    }
}
