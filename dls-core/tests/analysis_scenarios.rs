// End-to-end analysis scenarios over real files

use dls_core::analysis::symbol::SymbolKind;
use dls_core::diagnostic::DiagnosticKind;
use dls_core::source::Position;
use dls_core::{DeviceAnalysis, IsolatedAnalysis};
use std::fs;
use std::path::Path;

#[test]
fn clean_device_file_has_no_diagnostics() {
    let analysis = DeviceAnalysis::new();
    let diags = analysis.analyze(Path::new("a.dml"), "dml 1.4;\ndevice foo;\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags.as_slice());

    let symbols = analysis.symbols_in_file(Path::new("a.dml"));
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "foo");
    assert_eq!(symbols[0].kind, SymbolKind::Device);
    // line 2, column 8 at the one-indexed presentation boundary
    let one_indexed = symbols[0].span.to_one_indexed();
    assert_eq!(one_indexed.start().line, 2);
    assert_eq!(one_indexed.start().column, 8);
}

#[test]
fn device_before_version_is_a_semantic_error() {
    let analysis = DeviceAnalysis::new();
    let diags = analysis.analyze(Path::new("a.dml"), "device foo;\ndml 1.4;\n");
    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().expect("diagnostic");
    assert_eq!(diag.kind, DiagnosticKind::Semantic);
    assert_eq!(diag.message, "Device declaration must be second statement in file");
    let one_indexed = diag.span.to_one_indexed();
    assert_eq!((one_indexed.start().line, one_indexed.start().column), (1, 1));

    // analysis still produced the device symbol
    assert!(analysis
        .symbols_in_file(Path::new("a.dml"))
        .iter()
        .any(|s| s.name == "foo" && s.kind == SymbolKind::Device));
}

#[test]
fn unresolved_import_with_empty_search_path() {
    let analysis = DeviceAnalysis::new();
    let diags = analysis.analyze(
        Path::new("a.dml"),
        "dml 1.4;\nimport \"missing.dml\";\ndevice foo;\n",
    );
    let import_errors: Vec<_> = diags
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Import)
        .collect();
    assert_eq!(import_errors.len(), 1);
    assert!(import_errors[0]
        .message
        .contains("Cannot resolve import 'missing.dml'"));
    // attached to the import statement
    assert_eq!(import_errors[0].span.start().line, 1);

    assert!(analysis
        .symbols_in_file(Path::new("a.dml"))
        .iter()
        .any(|s| s.name == "foo" && s.kind == SymbolKind::Device));
}

#[test]
fn duplicate_top_level_symbol_keeps_first_binding() {
    let analysis = DeviceAnalysis::new();
    let diags = analysis.analyze(
        Path::new("a.dml"),
        "dml 1.4;\ndevice foo;\ntemplate t { }\ntemplate t { }\n",
    );
    let duplicates: Vec<_> = diags
        .iter()
        .filter(|d| d.kind == DiagnosticKind::DuplicateSymbol)
        .collect();
    assert_eq!(duplicates.len(), 1);
    // the error sits on the second declaration
    assert_eq!(duplicates[0].span.start().line, 3);

    let definitions = analysis.definitions_of("t");
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].1.symbol.span.start().line, 2);
}

#[test]
fn template_cycle_yields_sentinels_without_overflow() {
    let analysis = DeviceAnalysis::new();
    let diags = analysis.analyze(
        Path::new("a.dml"),
        "template a is b { }\ntemplate b is a { }\n",
    );
    let cycles: Vec<_> = diags
        .iter()
        .filter(|d| d.kind == DiagnosticKind::CircularDependency)
        .collect();
    assert_eq!(cycles.len(), 2, "one cycle error per declaration");
    let lines: Vec<u32> = cycles.iter().map(|d| d.span.start().line).collect();
    assert!(lines.contains(&0) && lines.contains(&1));

    let a = analysis.resolve_template("a").expect("sentinel for a");
    let b = analysis.resolve_template("b").expect("sentinel for b");
    assert!(a.is_error && b.is_error);
    assert!(a.parameters.is_empty() && a.methods.is_empty());
    assert!(b.parameters.is_empty() && b.methods.is_empty());
}

#[test]
fn invalidation_covers_the_reverse_closure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lib = dir.path().join("lib.dml");
    let dev = dir.path().join("dev.dml");
    let other = dir.path().join("other.dml");
    fs::write(&lib, "dml 1.4;\ndevice lib_dev;\ntemplate util { }\n").expect("write lib");
    fs::write(&dev, "dml 1.4;\nimport \"lib.dml\";\ndevice dev;\n").expect("write dev");
    fs::write(&other, "dml 1.4;\ndevice other;\n").expect("write other");

    let analysis = DeviceAnalysis::new();
    let dev_text = fs::read_to_string(&dev).expect("read dev");
    let diags = analysis.analyze(&dev, &dev_text);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags.as_slice());
    let other_text = fs::read_to_string(&other).expect("read other");
    analysis.analyze(&other, &other_text);

    // the import pulled lib.dml in
    assert!(analysis
        .analyzed_files()
        .iter()
        .any(|f| f.file_name().map(|n| n.to_string_lossy() == "lib.dml").unwrap_or(false)));

    let invalidated = analysis.invalidate(&lib);
    let names: Vec<String> = invalidated
        .iter()
        .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert!(names.contains(&"lib.dml".to_string()));
    assert!(names.contains(&"dev.dml".to_string()));
    assert!(!names.contains(&"other.dml".to_string()));

    // dev.dml needs re-analysis, other.dml kept its cached analysis
    assert!(analysis.symbols_in_file(&dev).is_empty());
    assert!(!analysis.symbols_in_file(&other).is_empty());

    // re-analysis restores the symbols
    analysis.analyze(&dev, &dev_text);
    assert!(!analysis.symbols_in_file(&dev).is_empty());
}

#[test]
fn imports_resolve_through_include_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let include_dir = dir.path().join("include");
    fs::create_dir_all(&include_dir).expect("mkdir");
    let util = include_dir.join("util.dml");
    fs::write(&util, "dml 1.4;\ndevice util_dev;\nparam util_param = 1;\n").expect("write util");
    let dev = dir.path().join("dev.dml");
    fs::write(&dev, "dml 1.4;\nimport \"util.dml\";\ndevice dev;\n").expect("write dev");

    let mut config = dls_core::CompileConfig::new();
    config.insert(
        std::fs::canonicalize(&dev).expect("canonical dev"),
        dls_core::CompileInfo {
            includes: vec![include_dir.clone()],
            dmlc_flags: vec![],
        },
    );
    let analysis = DeviceAnalysis::with_config(config);
    let dev_text = fs::read_to_string(&dev).expect("read dev");
    let diags = analysis.analyze(&dev, &dev_text);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags.as_slice());

    // the dependency was discovered and analyzed
    let defs = analysis.definitions_of("util_param");
    assert_eq!(defs.len(), 1);
}

#[test]
fn import_cycles_terminate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = dir.path().join("a.dml");
    let b = dir.path().join("b.dml");
    fs::write(&a, "dml 1.4;\nimport \"b.dml\";\ndevice a_dev;\n").expect("write a");
    fs::write(&b, "dml 1.4;\nimport \"a.dml\";\ndevice b_dev;\n").expect("write b");

    let analysis = DeviceAnalysis::new();
    let text = fs::read_to_string(&a).expect("read a");
    let diags = analysis.analyze(&a, &text);
    // tolerated: no circular-dependency diagnostics for file imports
    assert!(!diags
        .iter()
        .any(|d| d.kind == DiagnosticKind::CircularDependency));
    assert_eq!(analysis.analyzed_files().len(), 2);
    assert_eq!(analysis.topological_order().len(), 2);
}

#[test]
fn analysis_is_idempotent_at_the_device_level() {
    let analysis = DeviceAnalysis::new();
    let source = "dml 1.4;\ndevice dev;\nbank b { register r size 4 @ 0x0; }\n";
    let first = analysis.analyze(Path::new("dev.dml"), source);
    let first_symbols = analysis.symbols_in_file(Path::new("dev.dml"));
    let second = analysis.analyze(Path::new("dev.dml"), source);
    let second_symbols = analysis.symbols_in_file(Path::new("dev.dml"));
    assert_eq!(first, second);
    assert_eq!(first_symbols, second_symbols);
}

#[test]
fn scope_queries_reach_nested_registers() {
    let source = "dml 1.4;\n\
                  device dev;\n\
                  bank regs {\n\
                  \x20   register ctrl size 4 @ 0x0 {\n\
                  \x20       field enable @ [0];\n\
                  \x20   }\n\
                  }\n";
    let analysis = IsolatedAnalysis::analyze("dev.dml", source);
    assert!(!analysis.diagnostics.has_errors());

    let in_scope = analysis.symbols_in_scope(Position::new(4, 12));
    let names: Vec<&str> = in_scope
        .iter()
        .map(|definition| definition.symbol.name.as_str())
        .collect();
    assert!(names.contains(&"enable"));
    assert!(names.contains(&"ctrl"));
    assert!(names.contains(&"regs"));
    assert!(names.contains(&"dev"));
}

#[test]
fn hover_sources_for_templates() {
    let analysis = DeviceAnalysis::new();
    analysis.analyze(
        Path::new("dev.dml"),
        "dml 1.4;\ndevice dev is ticker;\ntemplate ticker { param rate = 50; method tick() { } }\n",
    );
    let hover = analysis.template_hover("ticker").expect("hover text");
    assert!(hover.contains("**Template ticker**"));
    assert!(hover.contains("rate"));
    assert!(hover.contains("tick()"));
}
