//! The backend contract/(b), §6, §1.9): trait-only interface
//! between the front/mid-end this crate implements and an external IR
//! emitter + linker-driver, both explicitly out of scope for this crate.
//!
//! The core hands a backend four things: the ordered resolved modules, a
//! struct layout map (ABI field order), the target pointer width, and the
//! `constexpr.rs` integer-encoding rules already baked into every resolved
//! `Type`. What it gets back is per-module emitted IR text (or an error) —
//! nothing about how that IR is produced is this crate's concern.

use std::collections::HashMap;
use std::fmt;

use crate::intern::{Interner, StringId};
use crate::resolved::ResolvedModule;
use crate::types::Type;

/// The target's pointer width in bits. The core only ever targets 64-bit
/// hosts; a cross-compiling backend would widen this contract,
/// not this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerWidth(u32);

impl PointerWidth {
    pub const DEFAULT: Self = Self(64);

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for PointerWidth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Struct-declaration identity (its interned name) to its ABI-ordered
/// `(name, Type)` field list, merged across every resolved module the
/// backend is handed.
#[derive(Debug, Default)]
pub struct StructLayoutMap {
    layouts: HashMap<StringId, Vec<(StringId, Type)>>,
}

impl StructLayoutMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the layout map from every struct declaration in `modules`,
    /// in the order they are encountered — later modules never overwrite an
    /// earlier struct of the same name, matching how `Sema::new` folds
    /// imported declarations in (first writer wins).
    #[must_use]
    pub fn from_modules(modules: &[ResolvedModule]) -> Self {
        let mut map = Self::new();
        for module in modules {
            for &id in &module.top_level {
                if let crate::resolved::ResolvedDeclData::Struct(s) = module.arena.get(id) {
                    map.layouts.entry(s.name).or_insert_with(|| s.fields.clone());
                }
            }
        }
        map
    }

    #[must_use]
    pub fn fields(&self, struct_name: StringId) -> Option<&[(StringId, Type)]> {
        self.layouts.get(&struct_name).map(Vec::as_slice)
    }
}

/// An error an `IrBackend` implementation reports back to the driver. Kept
/// deliberately thin: the concrete backend owns its own diagnostic detail,
/// this is just the shape the driver needs to print it and pick an exit
/// code.
#[derive(Debug)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

/// One emitted module: its name (used to derive the temporary IR file name,
/// matching the original driver's `tmp-<name>.ll` convention) and its IR
/// text.
#[derive(Debug)]
pub struct EmittedModule {
    pub name: String,
    pub ir_text: String,
}

/// The seam drawn around code generation: given the whole
/// resolved program, produce per-module IR text. Everything past this
/// point — instruction selection, register allocation, object emission —
/// belongs to whatever concrete type implements this trait.
///
/// `interner` is handed alongside the resolved tree because every
/// declaration/field name in it is a `StringId`; a backend needs it to turn
/// those back into text.
pub trait IrBackend {
    fn emit(
        &self,
        modules: &[ResolvedModule],
        layouts: &StructLayoutMap,
        interner: &Interner,
        pointer_width: PointerWidth,
    ) -> Result<Vec<EmittedModule>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::PointerWidth;

    #[test]
    fn default_pointer_width_is_64_bits() {
        assert_eq!(PointerWidth::default().bits(), 64);
    }
}
