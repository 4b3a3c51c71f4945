use saplang::{collect_and_resolve, parse_source_file, Diagnostics, Interner, IrBackend, PointerWidth, SourceFile, StructLayoutMap};

fn main() {
    // --- Parse and resolve a single-module program ---
    let source = SourceFile::new(
        "fib.sl",
        r#"
fn i32 fib(i32 n) {
    if (n <= 1) {
        return n;
    }
    return fib(n - 1) + fib(n - 2);
}

fn i32 main() {
    return fib(10);
}
"#,
    );

    let diags = Diagnostics::new();
    let mut interner = Interner::new();
    let parsed = parse_source_file(&source, &diags, &mut interner);
    assert!(parsed.is_complete_ast, "parse errors: {:?}", diags.snapshot());

    let program = collect_and_resolve(&source, &parsed, &[], &mut interner, &diags);
    assert!(!diags.has_errors(), "resolution errors: {:?}", diags.snapshot());
    println!("resolved {} module(s)", program.modules.len());

    // --- Build a CFG for each function and count its blocks ---
    for module in &program.modules {
        for &id in &module.top_level {
            if let saplang::ResolvedDeclData::Function(f) = module.arena.get(id) {
                if let Some(body) = &f.body {
                    let cfg = saplang::build_cfg(body);
                    println!(
                        "{}::{} -> {} basic block(s), {} reachable",
                        module.name,
                        interner.resolve(f.name),
                        cfg.blocks.len(),
                        cfg.reachable_blocks().len()
                    );
                }
            }
        }
    }

    // --- Run the reference textual backend ---
    let layouts = StructLayoutMap::from_modules(&program.modules);
    let emitted = DemoBackend
        .emit(&program.modules, &layouts, &interner, PointerWidth::DEFAULT)
        .expect("reference backend never fails");
    for module in &emitted {
        println!("--- {} ---\n{}", module.name, module.ir_text);
    }
}

/// A stand-in for `saplang-cli`'s real `TextIrBackend`, shown here so this
/// demo doesn't need to depend on the driver crate: any type implementing
/// `IrBackend` plugs into the same pipeline.
struct DemoBackend;

impl IrBackend for DemoBackend {
    fn emit(
        &self,
        modules: &[saplang::ResolvedModule],
        _layouts: &StructLayoutMap,
        interner: &Interner,
        _pointer_width: PointerWidth,
    ) -> Result<Vec<saplang::EmittedModule>, saplang::BackendError> {
        let mut out = Vec::with_capacity(modules.len());
        for module in modules {
            let mut text = String::new();
            for &id in &module.top_level {
                if let saplang::ResolvedDeclData::Function(f) = module.arena.get(id) {
                    text.push_str(&format!("fn {}\n", interner.resolve(f.name)));
                }
            }
            out.push(saplang::EmittedModule { name: module.name.clone(), ir_text: text });
        }
        Ok(out)
    }
}
