//! The one concrete `saplang::IrBackend` this driver ships.
//!
//! Deliberately not LLVM IR — LLVM-IR generation is out of scope (see
//! `SPEC_FULL.md` §1.9). This renders each resolved function's
//! control-flow graph as a flat, block-labelled pseudo-assembly text so the
//! pipeline has a real, runnable end-to-end path; a production backend
//! swaps in for this by implementing the same trait.

use saplang::{
    BackendError, Cfg, EmittedModule, Interner, IrBackend, PointerWidth, ResolvedDeclData, ResolvedModule,
    StructLayoutMap, Type,
};

pub struct TextIrBackend;

impl IrBackend for TextIrBackend {
    fn emit(
        &self,
        modules: &[ResolvedModule],
        layouts: &StructLayoutMap,
        interner: &Interner,
        pointer_width: PointerWidth,
    ) -> Result<Vec<EmittedModule>, BackendError> {
        let mut out = Vec::with_capacity(modules.len());
        for module in modules {
            let mut text = String::new();
            text.push_str(&format!("; module {}\n; pointer-width: {} bits\n", module.name, pointer_width.bits()));
            for &id in &module.top_level {
                match module.arena.get(id) {
                    ResolvedDeclData::Struct(s) => {
                        let fields = layouts.fields(s.name).unwrap_or(&[]);
                        text.push_str(&format!("type @{} {{\n", interner.resolve(s.name)));
                        for (name, ty) in fields {
                            text.push_str(&format!("  {}: {}\n", interner.resolve(*name), render_type(ty, interner)));
                        }
                        text.push_str("}\n");
                    }
                    ResolvedDeclData::Enum(e) => {
                        text.push_str(&format!("; enum @{} : {}\n", interner.resolve(e.name), render_type(&e.underlying, interner)));
                        for (name, value) in &e.members {
                            text.push_str(&format!(";   {} = {value}\n", interner.resolve(*name)));
                        }
                    }
                    ResolvedDeclData::Function(f) if f.body.is_none() => {
                        let lib = f.library.as_deref().unwrap_or("<unknown>");
                        let original = f.original_name.map_or_else(|| interner.resolve(f.name).to_string(), |n| interner.resolve(n).to_string());
                        text.push_str(&format!("declare @{} -> {} ; extern \"{lib}\" as {original}\n", interner.resolve(f.name), render_type(&f.return_type, interner)));
                    }
                    ResolvedDeclData::Function(f) => {
                        let params = f
                            .params
                            .iter()
                            .map(|p| match module.arena.get(*p) {
                                ResolvedDeclData::Param(p) => format!("{}: {}", interner.resolve(p.name), render_type(&p.ty, interner)),
                                _ => String::new(),
                            })
                            .collect::<Vec<_>>()
                            .join(", ");
                        text.push_str(&format!(
                            "define @{}({params}{variadic}) -> {} {{\n",
                            interner.resolve(f.name),
                            render_type(&f.return_type, interner),
                            variadic = if f.variadic { ", ..." } else { "" },
                        ));
                        let cfg = saplang::build_cfg(f.body.as_ref().expect("body checked above"));
                        render_cfg(&cfg, &mut text);
                        text.push_str("}\n");
                    }
                    ResolvedDeclData::Var(v) => {
                        text.push_str(&format!("global @{}: {}\n", interner.resolve(v.name), render_type(&v.ty, interner)));
                    }
                    ResolvedDeclData::Param(_) => {}
                }
            }
            out.push(EmittedModule { name: module.name.clone(), ir_text: text });
        }
        Ok(out)
    }
}

fn render_cfg(cfg: &Cfg, text: &mut String) {
    let reachable = cfg.reachable_blocks();
    for block in &cfg.blocks {
        let marker = if reachable.contains(&block.id) { "" } else { " ; unreachable" };
        let label = block.stmt.as_ref().map_or("exit", |s| s.label.as_str());
        text.push_str(&format!("  bb{}: {label}{marker}\n", block.id.index()));
        for edge in &block.successors {
            let reach = if edge.reachable { "" } else { " (unreachable)" };
            text.push_str(&format!("    -> bb{}{reach}\n", edge.target.index()));
        }
    }
}

fn render_type(ty: &Type, interner: &Interner) -> String {
    let base = match &ty.base {
        saplang::BaseType::Void => "void".to_string(),
        saplang::BaseType::Bool => "bool".to_string(),
        saplang::BaseType::Int(k) => format!("{k:?}").to_lowercase(),
        saplang::BaseType::Float(k) => format!("{k:?}").to_lowercase(),
        saplang::BaseType::Custom(name) => interner.resolve(*name).to_string(),
        saplang::BaseType::FunctionPointer(_) => "fn*".to_string(),
    };
    format!("{}{}", "*".repeat(ty.pointer_depth as usize), base)
}

#[cfg(test)]
mod tests {
    use super::TextIrBackend;
    use saplang::{Diagnostics, Interner, IrBackend, PointerWidth, SourceFile, StructLayoutMap};

    #[test]
    fn emits_one_module_with_a_define_block() {
        let mut interner = Interner::new();
        let diags = Diagnostics::new();
        let source = SourceFile::new("main.sl", "fn i32 main() { return 0; }");
        let parsed = saplang::parse_source_file(&source, &diags, &mut interner);
        let program = saplang::collect_and_resolve(&source, &parsed, &[], &mut interner, &diags);
        let layouts = StructLayoutMap::from_modules(&program.modules);
        let emitted = TextIrBackend
            .emit(&program.modules, &layouts, &interner, PointerWidth::DEFAULT)
            .expect("reference backend never fails");
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].ir_text.contains("define @main"));
    }
}
