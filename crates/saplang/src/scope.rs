//! The scope stack used by the semantic analyser: pushed at
//! function entry, each nested block, and each `for`-loop header so the
//! loop counter lives in its own scope.

use indexmap::IndexMap;

use crate::intern::StringId;
use crate::resolved::DeclId;

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<IndexMap<StringId, DeclId>>,
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self { scopes: vec![IndexMap::new()] }
    }

    pub fn push(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
        assert!(!self.scopes.is_empty(), "popped the outermost scope");
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// A lookup walks the stack outward, returning the first match and its
    /// scope depth.
    #[must_use]
    pub fn lookup(&self, name: StringId) -> Option<(DeclId, usize)> {
        for (depth, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(&id) = scope.get(&name) {
                return Some((id, depth));
            }
        }
        None
    }

    /// Whether `name` is already bound at the current (innermost) scope
    /// level — a hit here is redeclaration: a depth-0 hit
    /// within the current scope for a new declaration is redeclaration.
    #[must_use]
    pub fn is_redeclared_in_current_scope(&self, name: StringId) -> bool {
        self.scopes
            .last()
            .expect("scope stack is never empty")
            .contains_key(&name)
    }

    /// Binds `name` in the current (innermost) scope. Caller must have
    /// already checked `is_redeclared_in_current_scope`.
    pub fn bind(&mut self, name: StringId, decl: DeclId) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, decl);
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeStack;
    use crate::intern::Interner;
    use crate::resolved::DeclId;

    fn fresh_id(arena: &mut crate::resolved::DeclArena) -> DeclId {
        arena.push(crate::resolved::ResolvedDeclData::Param(crate::resolved::ResolvedParamDecl {
            location: crate::source::SourceFile::new("t.sl", "").location_at(1, 1, 0),
            name: Interner::new().intern("x"),
            ty: crate::types::Type::void(),
            is_const: false,
        }))
    }

    #[test]
    fn shadowing_across_nested_scopes_is_allowed() {
        let mut interner = Interner::new();
        let name = interner.intern("x");
        let mut arena = crate::resolved::DeclArena::new();
        let mut scopes = ScopeStack::new();
        let outer = fresh_id(&mut arena);
        scopes.bind(name, outer);
        scopes.push();
        assert!(!scopes.is_redeclared_in_current_scope(name));
        let inner = fresh_id(&mut arena);
        scopes.bind(name, inner);
        let (found, depth) = scopes.lookup(name).unwrap();
        assert_eq!(found, inner);
        assert_eq!(depth, 1);
        scopes.pop();
        let (found, depth) = scopes.lookup(name).unwrap();
        assert_eq!(found, outer);
        assert_eq!(depth, 0);
    }

    #[test]
    fn redeclaration_in_same_scope_is_detected() {
        let mut interner = Interner::new();
        let name = interner.intern("x");
        let mut arena = crate::resolved::DeclArena::new();
        let mut scopes = ScopeStack::new();
        scopes.bind(name, fresh_id(&mut arena));
        assert!(scopes.is_redeclared_in_current_scope(name));
    }
}
