//! Scenario tests for the semantic analyser that go beyond the
//! parse-resolve-CFG pipeline in `end_to_end.rs`: forward references,
//! recursive-struct detection, enum member values and reserved-but-inert
//! statement forms.

use saplang::{collect_and_resolve, parse_source_file, Diagnostics, Interner, ResolvedDeclData, SourceFile};

fn resolve(src: &str) -> (Vec<saplang::ResolvedModule>, Diagnostics) {
    let diags = Diagnostics::new();
    let mut interner = Interner::new();
    let source = SourceFile::new("t.sl", src);
    let parsed = parse_source_file(&source, &diags, &mut interner);
    assert!(parsed.is_complete_ast, "parse errors: {:?}", diags.snapshot());
    let program = collect_and_resolve(&source, &parsed, &[], &mut interner, &diags);
    (program.modules, diags)
}

#[test]
fn struct_fields_may_reference_a_struct_declared_later_in_the_file() {
    // pass 1 registers every struct name before pass 2 resolves fields, so
    // declaration order within a file doesn't matter.
    let (modules, diags) = resolve("struct Node { Next* next; } struct Next { i32 v; }");
    assert!(!diags.has_errors(), "{:?}", diags.snapshot());
    let module = modules.last().unwrap();
    assert_eq!(module.top_level.len(), 2);
}

#[test]
fn direct_self_containment_by_value_is_a_recursive_struct_error() {
    let (_, diags) = resolve("struct Bad { Bad inner; }");
    assert!(diags.has_errors());
    let messages: Vec<String> = diags.snapshot().iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains("recursively contains itself")), "{messages:?}");
}

#[test]
fn self_containment_through_a_pointer_is_allowed() {
    let (_, diags) = resolve("struct Node { Node* next; i32 value; }");
    assert!(!diags.has_errors(), "{:?}", diags.snapshot());
}

#[test]
fn enum_members_default_to_the_previous_value_plus_one() {
    let (modules, diags) = resolve("enum Color : i32 { Red, Green = 5, Blue } fn i32 main(){ return Color::Blue; }");
    assert!(!diags.has_errors(), "{:?}", diags.snapshot());
    let module = modules.last().unwrap();
    let enum_decl = module.top_level.iter().find_map(|&id| match module.arena.get(id) {
        ResolvedDeclData::Enum(e) => Some(e),
        _ => None,
    });
    let enum_decl = enum_decl.expect("an enum declaration");
    let values: Vec<i128> = enum_decl.members.values().copied().collect();
    assert_eq!(values, vec![0, 5, 6]);
}

#[test]
fn duplicate_enum_member_names_are_rejected() {
    let (_, diags) = resolve("enum Color : i32 { Red, Red }");
    assert!(diags.has_errors());
}

#[test]
fn defer_is_parsed_but_rejected_by_the_analyser_as_unsupported() {
    let (_, diags) = resolve("fn void main(){ defer 1; }");
    assert!(diags.has_errors());
    let messages: Vec<String> = diags.snapshot().iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains("defer statements are not supported")), "{messages:?}");
}

#[test]
fn assigning_to_a_const_local_is_an_error() {
    let (_, diags) = resolve("fn void main(){ const i32 x = 1; x = 2; }");
    assert!(diags.has_errors());
    let messages: Vec<String> = diags.snapshot().iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains("assignment to a `const` variable")), "{messages:?}");
}

#[test]
fn cross_module_call_through_the_qualified_syntax_resolves_to_the_imported_function() {
    let diags = Diagnostics::new();
    let mut interner = Interner::new();
    let dir = std::env::temp_dir().join(format!("saplang-sema-qualified-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("lib.sl"), "export fn i32 double(i32 x){ return x * 2; }").unwrap();
    let main_path = dir.join("main.sl");
    let main_source = SourceFile::new(main_path.to_string_lossy().into_owned(), "import lib; fn i32 main(){ return lib::double(21); }");
    let parsed = parse_source_file(&main_source, &diags, &mut interner);
    assert!(parsed.is_complete_ast);
    let program = collect_and_resolve(&main_source, &parsed, &[dir.clone()], &mut interner, &diags);
    assert!(!diags.has_errors(), "{:?}", diags.snapshot());
    let main_module = program.modules.last().unwrap();
    assert!(main_module.top_level.iter().any(|&id| matches!(main_module.arena.get(id), ResolvedDeclData::Function(_))));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn calling_an_undeclared_function_is_an_error_naming_the_callee() {
    let (_, diags) = resolve("fn void main(){ nope(); }");
    assert!(diags.has_errors());
    let messages: Vec<String> = diags.snapshot().iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains("call to undeclared function 'nope'")), "{messages:?}");
}
