//! Cross-module collection and dependency-ordered resolution.
//!
//! Grounded on `driver.cpp`'s `Driver::run`: every `-i` search path (or, when
//! none is given, the main source file's parent directory) is scanned for
//! `*.sl` files, each is parsed as its own module, and the main source file
//! is parsed last and resolved against the union of what every module it
//! (transitively) imports exports. Where the original drives that union
//! through a single `Sema` built over the whole module set, this collector
//! resolves dependency-first (each module's imports are fully resolved
//! before the module itself) so a module only ever sees the *exported*
//! declarations of the modules it names with `import`, not the entire
//! program's symbol soup.
//!
//! `import` cycles are rejected outright: the language has no
//! forward-declaration syntax for cross-module references, so a cycle can
//! never be broken the way same-module forward references are.

use std::collections::HashMap;

use crate::ast::TopLevelDecl;
use crate::diagnostics::Diagnostics;
use crate::intern::{Interner, StringId};
use crate::parser::Parser;
use crate::resolved::{ResolvedDeclData, ResolvedModule};
use crate::sema::Sema;
use crate::source::SourceFile;

/// One `.sl` file discovered on an import search path, parsed but not yet
/// resolved.
struct PendingModule {
    name: String,
    file: SourceFile,
    parsed: crate::ast::ParsedFile,
}

/// The result of collecting and resolving every module reachable from a
/// program's main source file.
pub struct Program {
    /// Dependency order: every import of `modules[i]` appears at some index
    /// `< i`. The main source file is always last.
    pub modules: Vec<ResolvedModule>,
}

/// Scans `search_paths` for `*.sl` files (other than `main_source`'s own
/// file name), parses each, and returns them alongside the parsed main file.
/// Does not resolve anything yet — just discovery, matching the driver's
/// directory-iteration step before any `Sema` runs.
fn discover(
    main_source: &SourceFile,
    search_paths: &[std::path::PathBuf],
    interner: &mut Interner,
    diags: &Diagnostics,
) -> Result<Vec<PendingModule>, std::io::Error> {
    let main_file_name = std::path::Path::new(main_source.path())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let mut seen_paths = std::collections::HashSet::new();
    let mut pending = Vec::new();
    for dir in search_paths {
        let Ok(entries) = std::fs::read_dir(dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sl") {
                continue;
            }
            if path.file_name().map(|n| n.to_string_lossy().into_owned()) == main_file_name {
                continue;
            }
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !seen_paths.insert(canonical) {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            let source_file = SourceFile::new(path.to_string_lossy().into_owned(), contents);
            let parser = Parser::new(&source_file, diags, interner);
            let parsed = parser.parse_file();
            pending.push(PendingModule {
                name: source_file.module_stem().to_string(),
                file: source_file,
                parsed,
            });
        }
    }
    Ok(pending)
}

/// Import names a module's `ParsedFile` names, in source order.
fn import_names(parsed: &crate::ast::ParsedFile, interner: &Interner) -> Vec<String> {
    parsed
        .decls
        .iter()
        .filter_map(|d| match d {
            TopLevelDecl::Import(id) => Some(interner.resolve(id.name).to_string()),
            _ => None,
        })
        .collect()
}

/// Topologically sorts `pending` by import dependency, depth-first, and
/// reports a cycle by naming the two modules that close the
/// loop rather than the whole cycle.
fn dependency_order(pending: &[PendingModule], interner: &Interner, diags: &Diagnostics) -> Vec<usize> {
    let by_name: HashMap<&str, usize> = pending.iter().enumerate().map(|(i, m)| (m.name.as_str(), i)).collect();
    let mut state = vec![0u8; pending.len()]; // 0 = unvisited, 1 = in progress, 2 = done
    let mut order = Vec::with_capacity(pending.len());

    fn visit(
        idx: usize,
        pending: &[PendingModule],
        by_name: &HashMap<&str, usize>,
        interner: &Interner,
        diags: &Diagnostics,
        state: &mut Vec<u8>,
        order: &mut Vec<usize>,
    ) {
        if state[idx] == 2 {
            return;
        }
        if state[idx] == 1 {
            diags.error(
                pending[idx].file.location_at(1, 1, 0),
                format!("import cycle detected involving module '{}'.", pending[idx].name),
            );
            return;
        }
        state[idx] = 1;
        for dep_name in import_names(&pending[idx].parsed, interner) {
            if let Some(&dep_idx) = by_name.get(dep_name.as_str()) {
                visit(dep_idx, pending, by_name, interner, diags, state, order);
            }
        }
        state[idx] = 2;
        order.push(idx);
    }

    for idx in 0..pending.len() {
        visit(idx, pending, &by_name, interner, diags, &mut state, &mut order);
    }
    order
}

/// The exported declarations of an already-resolved module, ready to feed
/// into `Sema::new` for anything that imports it.
fn exported_decls(module: &ResolvedModule) -> Vec<(StringId, ResolvedDeclData)> {
    let mut out = Vec::new();
    for &id in &module.top_level {
        let decl = module.arena.get(id);
        // Only functions, structs and enums carry an `export` marker in the
        // grammar — top-level variables are always
        // module-private, so they never cross into `imported_decls`.
        let exported = match decl {
            ResolvedDeclData::Function(d) => d.exported,
            ResolvedDeclData::Struct(d) => d.exported,
            ResolvedDeclData::Enum(d) => d.exported,
            ResolvedDeclData::Var(_) | ResolvedDeclData::Param(_) => false,
        };
        if exported {
            out.push((decl.name(), decl.clone()));
        }
    }
    out
}

/// Resolves the whole program rooted at `main_source`: every module on
/// `search_paths` that `main_source` transitively imports, in dependency
/// order, followed by `main_source` itself.
#[must_use]
pub fn collect_and_resolve(
    main_source: &SourceFile,
    main_parsed: &crate::ast::ParsedFile,
    search_paths: &[std::path::PathBuf],
    interner: &mut Interner,
    diags: &Diagnostics,
) -> Program {
    let pending = discover(main_source, search_paths, interner, diags).unwrap_or_default();
    let order = dependency_order(&pending, interner, diags);

    // Resolved in dependency order and kept in that order: a module always
    // appears after everything it (transitively) imports, so a backend can
    // emit/link modules in this same sequence.
    let mut modules: Vec<ResolvedModule> = Vec::with_capacity(pending.len() + 1);
    for idx in order {
        let module = &pending[idx];
        let imports = import_names(&module.parsed, interner);
        let mut imported_decls = Vec::new();
        for name in &imports {
            match modules.iter().find(|m| &m.name == name) {
                Some(resolved) => imported_decls.extend(exported_decls(resolved)),
                None => diags.error(module.file.location_at(1, 1, 0), format!("could not resolve module '{name}'.")),
            }
        }
        let sema = Sema::new(diags, interner, imported_decls);
        let resolved = sema.resolve_file(module.name.clone(), &module.parsed);
        modules.push(resolved);
    }

    let main_imports = import_names(main_parsed, interner);
    let mut imported_decls = Vec::new();
    for name in &main_imports {
        match modules.iter().find(|m| &m.name == name) {
            Some(resolved) => imported_decls.extend(exported_decls(resolved)),
            None => diags.error(main_source.location_at(1, 1, 0), format!("could not resolve module '{name}'.")),
        }
    }
    let sema = Sema::new(diags, interner, imported_decls);
    let main_module = sema.resolve_file(main_source.module_stem().to_string(), main_parsed);
    modules.push(main_module);

    Program { modules }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_module_program_has_no_imports_to_resolve() {
        let mut interner = Interner::new();
        let diags = Diagnostics::new();
        let source = SourceFile::new("main.sl", "fn i32 main() { return 0; }");
        let parser = Parser::new(&source, &diags, &mut interner);
        let parsed = parser.parse_file();
        let program = collect_and_resolve(&source, &parsed, &[], &mut interner, &diags);
        assert_eq!(program.modules.len(), 1);
        assert!(!diags.has_errors());
    }
}
