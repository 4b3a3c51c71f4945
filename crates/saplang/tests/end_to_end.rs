//! End-to-end pipeline scenarios: one source file (or a small module set)
//! through parse -> resolve -> CFG, checked against the folded constants,
//! diagnostics and reachability a correct implementation must produce.

use saplang::{collect_and_resolve, parse_source_file, ConstantValue, Diagnostics, Interner, ResolvedDeclData, ResolvedExprKind, ResolvedStmtKind, SourceFile};

fn single_module(src: &str) -> (Vec<saplang::ResolvedModule>, Diagnostics, Interner) {
    let diags = Diagnostics::new();
    let mut interner = Interner::new();
    let source = SourceFile::new("t.sl", src);
    let parsed = parse_source_file(&source, &diags, &mut interner);
    assert!(parsed.is_complete_ast, "parse errors: {:?}", diags.snapshot());
    let program = collect_and_resolve(&source, &parsed, &[], &mut interner, &diags);
    (program.modules, diags, interner)
}

fn main_function<'a>(modules: &'a [saplang::ResolvedModule]) -> &'a saplang::ResolvedFunctionDecl {
    let module = modules.last().expect("at least one module");
    module
        .top_level
        .iter()
        .find_map(|&id| module.arena.get(id).as_function())
        .expect("a function declaration")
}

#[test]
fn s1_constant_folds_and_cfg_is_a_single_reachable_path() {
    let (modules, diags, _) = single_module("fn i32 main(){ return 3 + 4 * 2; }");
    assert!(!diags.has_errors());
    let f = main_function(&modules);
    let body = f.body.as_ref().unwrap();
    let ResolvedStmtKind::Return(Some(expr)) = &body.statements[0].kind else { panic!("expected a return") };
    assert_eq!(expr.constant, Some(ConstantValue::Int { kind: saplang::IntKind::I32, value: 11 }));

    let cfg = saplang::build_cfg(body);
    assert_eq!(cfg.blocks.len(), 2); // one statement block + exit
    assert_eq!(cfg.reachable_blocks().len(), cfg.blocks.len());
}

#[test]
fn s2_redeclaration_is_an_error_with_no_successful_resolution() {
    let (_, diags, _) = single_module("fn void foo(){} fn void foo(){}");
    assert!(diags.has_errors());
    let messages: Vec<String> = diags.snapshot().iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains("redeclaration of 'foo'")), "{messages:?}");
}

#[test]
fn s3_unreachable_statement_warns_once_and_cfg_marks_only_first_return_reachable() {
    let (modules, diags, _) = single_module("fn i32 main(){ 3; return 3; 2; return 2; }");
    let warnings: Vec<_> = diags.snapshot().into_iter().filter(|d| d.severity == saplang::Severity::Warning).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].to_string().contains("unreachable statement"));

    let f = main_function(&modules);
    let body = f.body.as_ref().unwrap();
    assert_eq!(body.statements.len(), 4, "both return statements must still appear in the resolved tree");

    let cfg = saplang::build_cfg(body);
    let reachable = cfg.reachable_blocks();
    assert!(reachable.len() < cfg.blocks.len(), "the block following the first return must be unreachable");
}

#[test]
fn s4_call_argument_folds_to_a_constant_of_the_parameters_kind() {
    let (modules, diags, _) = single_module("fn void foo(i32 x){} fn void main(){ foo(1 + 2); }");
    assert!(!diags.has_errors());
    let f = main_function(&modules);
    let body = f.body.as_ref().unwrap();
    let ResolvedStmtKind::Expr(expr) = &body.statements[0].kind else { panic!("expected an expr statement") };
    let ResolvedExprKind::Call { args, .. } = &expr.kind else { panic!("expected a call") };
    assert_eq!(args[0].constant, Some(ConstantValue::Int { kind: saplang::IntKind::I32, value: 3 }));
}

#[test]
fn s5_short_circuit_and_folds_to_true_when_both_sides_are_constant_true() {
    let (modules, diags, _) = single_module("fn i32 main(){ return true && (1 < 2); }");
    assert!(!diags.has_errors());
    let f = main_function(&modules);
    let body = f.body.as_ref().unwrap();
    let ResolvedStmtKind::Return(Some(expr)) = &body.statements[0].kind else { panic!("expected a return") };
    assert_eq!(expr.constant, Some(ConstantValue::Bool(true)));
}

#[test]
fn s6_cross_module_call_resolves_to_the_imported_functions_decl() {
    let diags = Diagnostics::new();
    let mut interner = Interner::new();
    let b_dir = std::env::temp_dir().join(format!("saplang-s6-{}", std::process::id()));
    std::fs::create_dir_all(&b_dir).unwrap();
    std::fs::write(b_dir.join("b.sl"), "export fn void foo(){}").unwrap();
    let main_path = b_dir.join("a.sl");
    let main_source = SourceFile::new(main_path.to_string_lossy().into_owned(), "import b; fn void main(){ b::foo(); }");
    let parsed = parse_source_file(&main_source, &diags, &mut interner);
    assert!(parsed.is_complete_ast);

    let program = collect_and_resolve(&main_source, &parsed, &[b_dir.clone()], &mut interner, &diags);
    assert!(!diags.has_errors(), "{:?}", diags.snapshot());
    let main_module = program.modules.last().unwrap();
    let main_fn = main_module
        .top_level
        .iter()
        .find_map(|&id| main_module.arena.get(id).as_function())
        .unwrap();
    let ResolvedStmtKind::Expr(expr) = &main_fn.body.as_ref().unwrap().statements[0].kind else { panic!("expected an expr statement") };
    let ResolvedExprKind::Call { callee, .. } = &expr.kind else { panic!("expected a call") };
    let b_module = &program.modules[0];
    assert!(matches!(b_module.arena.get(*callee), ResolvedDeclData::Function(_)));

    let diags_no_path = Diagnostics::new();
    let mut interner2 = Interner::new();
    let parsed2 = parse_source_file(&main_source, &diags_no_path, &mut interner2);
    let _ = collect_and_resolve(&main_source, &parsed2, &[], &mut interner2, &diags_no_path);
    assert!(diags_no_path.has_errors(), "compiling without -i should fail to resolve the import");

    std::fs::remove_dir_all(&b_dir).ok();
}
