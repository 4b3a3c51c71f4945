//! Identifier interning.
//!
//! Identifiers (variable names, type names, field names, module names) are
//! interned into a per-pipeline-run arena and referred to by `StringId`
//! everywhere downstream. A plain `indexmap::IndexSet` gives us both the
//! dedupe-on-insert map and stable, insertion-ordered indices in one
//! structure.

use std::fmt;

use indexmap::IndexSet;

/// Index into the interner's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.strings.len()).finish()
    }
}

/// Owns every identifier string seen while parsing a single module.
#[derive(Default)]
pub struct Interner {
    strings: IndexSet<Box<str>>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(idx) = self.strings.get_index_of(s) {
            return StringId(idx as u32);
        }
        let (idx, _) = self.strings.insert_full(Box::from(s));
        StringId(idx as u32)
    }

    #[must_use]
    pub fn resolve(&self, id: StringId) -> &str {
        self.strings
            .get_index(id.index())
            .expect("StringId must have been produced by this interner")
    }
}

#[cfg(test)]
mod tests {
    use super::Interner;

    #[test]
    fn interning_same_string_twice_returns_same_id() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "foo");
        assert_eq!(interner.resolve(c), "bar");
    }
}
