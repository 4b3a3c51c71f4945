mod error;
mod ir;
mod schedule;

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use std::{env, fs};

use saplang::{collect_and_resolve, parse_source_file, Diagnostics, Interner, IrBackend, PointerWidth, ResolvedDeclData, SourceFile, StructLayoutMap};

use error::CliError;
use ir::TextIrBackend;
use schedule::WorkerPool;

/// Parsed `env::args()`, mirroring `driver.cpp`'s `CompilerOptions`
/// constructor: a single left-to-right scan, unknown flags are a hard error.
struct CliOptions {
    source: String,
    output: Option<String>,
    import_paths: Vec<String>,
    library_paths: Vec<String>,
    extra_flags: Vec<String>,
    ast_dump: bool,
    res_dump: bool,
    cfg_dump: bool,
    llvm_dump: bool,
    gen_debug: bool,
    no_cleanup: bool,
    display_help: bool,
}

impl CliOptions {
    fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut opts = Self {
            source: String::new(),
            output: None,
            import_paths: Vec::new(),
            library_paths: Vec::new(),
            extra_flags: Vec::new(),
            ast_dump: false,
            res_dump: false,
            cfg_dump: false,
            llvm_dump: false,
            gen_debug: false,
            no_cleanup: false,
            display_help: false,
        };
        let mut idx = 1;
        while idx < args.len() {
            let arg = args[idx].as_str();
            if !arg.starts_with('-') {
                if !opts.source.is_empty() {
                    return Err(CliError::InvalidArgs(format!("unexpected argument '{arg}'.")));
                }
                opts.source = arg.to_string();
            } else {
                match arg {
                    "-h" => opts.display_help = true,
                    "-o" => opts.output = Some(next_value(args, &mut idx, "-o")?),
                    "-ast-dump" => opts.ast_dump = true,
                    "-res-dump" => opts.res_dump = true,
                    "-cfg-dump" => opts.cfg_dump = true,
                    "-llvm-dump" => opts.llvm_dump = true,
                    "-i" => opts.import_paths = split_semicolons(&next_value(args, &mut idx, "-i")?),
                    "-L" => opts.library_paths = split_semicolons(&next_value(args, &mut idx, "-L")?),
                    "-extra" => opts.extra_flags = split_semicolons(&next_value(args, &mut idx, "-extra")?),
                    "-dbg" => opts.gen_debug = true,
                    "-no-cleanup" => opts.no_cleanup = true,
                    other => return Err(CliError::InvalidArgs(format!("unexpected argument '{other}'."))),
                }
            }
            idx += 1;
        }
        Ok(opts)
    }
}

fn next_value(args: &[String], idx: &mut usize, flag: &str) -> Result<String, CliError> {
    *idx += 1;
    args.get(*idx)
        .cloned()
        .ok_or_else(|| CliError::InvalidArgs(format!("'{flag}' expects a value.")))
}

fn split_semicolons(s: &str) -> Vec<String> {
    s.split(';').map(str::to_string).filter(|s| !s.is_empty()).collect()
}

fn display_help() {
    println!(
        "Usage:\nsaplang [options] <source_file>\n\nOptions:\n\
         \t-h                            display this message.\n\
         \t-i \"IMP1;IMP2;...\"          import paths.\n\
         \t-L \"PATH1;PATH2\"            library directories.\n\
         \t-o <file>                     write executable to <file>.\n\
         \t-ast-dump                     print ast as JSON.\n\
         \t-res-dump                     print resolved syntax tree as JSON.\n\
         \t-cfg-dump                     print every function's control flow graph as JSON.\n\
         \t-dbg                          request debug-info metadata from the backend.\n\
         \t-no-cleanup                   do not remove temporary IR files after compilation.\n\
         \t-llvm-dump                    print the generated IR text (not LLVM IR; see README.md)."
    );
}

fn print_diagnostics(diags: &Diagnostics) {
    for entry in diags.snapshot() {
        eprintln!("{entry}");
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let opts = match CliOptions::parse(&args) {
        Ok(o) => o,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if opts.display_help {
        display_help();
        return ExitCode::SUCCESS;
    }
    if opts.source.is_empty() {
        eprintln!("error: {}", CliError::NoSourceFile);
        return ExitCode::FAILURE;
    }

    let start = Instant::now();
    let exit = match run(&opts) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    };
    eprintln!("time taken: {:?}", start.elapsed());
    exit
}

fn run(opts: &CliOptions) -> Result<ExitCode, CliError> {
    let import_paths: Vec<PathBuf> = if opts.import_paths.is_empty() {
        let abs = fs::canonicalize(&opts.source).unwrap_or_else(|_| PathBuf::from(&opts.source));
        let parent = abs.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        vec![parent]
    } else {
        opts.import_paths.iter().map(PathBuf::from).collect()
    };

    let contents = fs::read_to_string(&opts.source).map_err(|source| CliError::Io {
        path: PathBuf::from(&opts.source),
        source,
    })?;

    let diags = Diagnostics::new();
    let mut interner = Interner::new();
    let source_file = SourceFile::new(opts.source.clone(), contents);
    let parsed = parse_source_file(&source_file, &diags, &mut interner);

    if opts.ast_dump {
        let json = serde_json::to_string_pretty(&parsed)?;
        println!("{json}");
        print_diagnostics(&diags);
        return Ok(ExitCode::SUCCESS);
    }

    if !parsed.is_complete_ast {
        print_diagnostics(&diags);
        return Ok(ExitCode::FAILURE);
    }

    let program = collect_and_resolve(&source_file, &parsed, &import_paths, &mut interner, &diags);

    if diags.has_errors() {
        print_diagnostics(&diags);
        return Ok(ExitCode::FAILURE);
    }

    if opts.res_dump {
        let json = serde_json::to_string_pretty(&program.modules)?;
        println!("{json}");
        print_diagnostics(&diags);
        return Ok(ExitCode::SUCCESS);
    }

    if opts.cfg_dump {
        let cfgs = build_cfgs_concurrently(&program.modules, &interner);
        let json = serde_json::to_string_pretty(&cfgs)?;
        println!("{json}");
        print_diagnostics(&diags);
        return Ok(ExitCode::SUCCESS);
    }

    if program.modules.is_empty() {
        return Ok(ExitCode::FAILURE);
    }

    let layouts = StructLayoutMap::from_modules(&program.modules);
    let emitted = TextIrBackend.emit(&program.modules, &layouts, &interner, PointerWidth::DEFAULT)?;

    if opts.llvm_dump {
        for module in &emitted {
            println!("{}", module.ir_text);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let libraries = collect_libraries(&program.modules, &interner);
    link(opts, &emitted, &libraries)
}

/// Builds every function's CFG across every module concurrently: CFG
/// construction only reads its own already-resolved (and by now immutable)
/// function body, so unlike parsing and sema it has no cross-module
/// ordering left to respect.
fn build_cfgs_concurrently(modules: &[saplang::ResolvedModule], interner: &Interner) -> Vec<(String, saplang::Cfg)> {
    let pool = WorkerPool::for_host();
    let results: Arc<Mutex<Vec<(String, saplang::Cfg)>>> = Arc::new(Mutex::new(Vec::new()));
    for module in modules {
        for &id in &module.top_level {
            if let ResolvedDeclData::Function(f) = module.arena.get(id) {
                if let Some(body) = f.body.clone() {
                    let label = format!("{}::{}", module.name, interner.resolve(f.name));
                    let results = Arc::clone(&results);
                    pool.submit(move || {
                        let cfg = saplang::build_cfg(&body);
                        results.lock().unwrap().push((label, cfg));
                    });
                }
            }
        }
    }
    pool.wait_all();
    let mut results = Arc::try_unwrap(results).map(|m| m.into_inner().unwrap()).unwrap_or_default();
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

fn collect_libraries(modules: &[saplang::ResolvedModule], interner: &Interner) -> Vec<String> {
    let _ = interner;
    let mut libraries: Vec<String> = Vec::new();
    for module in modules {
        for &id in &module.top_level {
            if let ResolvedDeclData::Function(f) = module.arena.get(id) {
                if let Some(lib) = &f.library {
                    if !libraries.contains(lib) {
                        libraries.push(lib.clone());
                    }
                }
            }
        }
    }
    libraries
}

fn link(opts: &CliOptions, emitted: &[saplang::EmittedModule], libraries: &[String]) -> Result<ExitCode, CliError> {
    let mut ir_paths = Vec::with_capacity(emitted.len());
    for module in emitted {
        let path = format!("tmp-{}.sl-ir", module.name);
        fs::write(&path, &module.ir_text).map_err(|source| CliError::Io {
            path: PathBuf::from(&path),
            source,
        })?;
        ir_paths.push(path);
    }

    let mut command = Command::new("cc");
    command.args(&ir_paths);
    if let Some(output) = &opts.output {
        command.arg("-o").arg(output);
    }
    for path in &opts.library_paths {
        command.arg(format!("-L{path}"));
    }
    for lib in libraries {
        command.arg(format!("-l{lib}"));
    }
    if opts.gen_debug {
        command.arg("-g");
    }
    for flag in &opts.extra_flags {
        command.arg(flag);
    }

    let status = command.status();

    if !opts.no_cleanup {
        for path in &ir_paths {
            let _ = fs::remove_file(path);
        }
    }

    match status {
        Ok(status) => Ok(ExitCode::from(status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1))),
        Err(err) => Err(CliError::Link(err)),
    }
}
