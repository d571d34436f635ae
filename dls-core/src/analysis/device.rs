// Cross-file device analysis
//
// DeviceAnalysis owns the per-file analyses, the dependency graph and
// the template registry. Its two mutable resources sit behind one
// reader/writer lock each: lexing, parsing and per-file analysis happen
// outside the critical section and only the finished IsolatedAnalysis is
// published under the write lock, so readers always observe one coherent
// version of a file. A publish happens before dependency recursion,
// which is what terminates import cycles.

use indexmap::IndexSet;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ast::Declaration;
use crate::config::CompileConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::source::ZeroPosition;
use crate::templates::{ResolvedTemplate, TemplateRegistry};

use super::imports::resolve_import;
use super::graph::DependencyGraph;
use super::isolated::IsolatedAnalysis;
use super::symbol::{Reference, Symbol, SymbolDefinition};

#[derive(Default)]
struct AnalysisState {
    files: BTreeMap<PathBuf, IsolatedAnalysis>,
    graph: DependencyGraph,
    order: Vec<PathBuf>,
    /// Name to the files defining it; the definitions themselves stay
    /// owned by the per-file analyses and are looked up through this key
    global: HashMap<String, Vec<PathBuf>>,
}

/// Process-wide analysis coordinator
pub struct DeviceAnalysis {
    config: CompileConfig,
    state: RwLock<AnalysisState>,
    templates: RwLock<TemplateRegistry>,
}

impl Default for DeviceAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAnalysis {
    pub fn new() -> Self {
        Self::with_config(CompileConfig::new())
    }

    pub fn with_config(config: CompileConfig) -> Self {
        Self {
            config,
            state: RwLock::new(AnalysisState::default()),
            templates: RwLock::new(TemplateRegistry::new()),
        }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, AnalysisState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AnalysisState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_templates(&self) -> RwLockWriteGuard<'_, TemplateRegistry> {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Build or rebuild the analysis for a file, resolving its imports
    /// and recursively analyzing any dependency not yet in the cache.
    /// A rebuild first drops the stale analysis and its reverse closure;
    /// dropped dependents are re-analyzed lazily on their next request.
    /// Returns the file's diagnostics.
    pub fn analyze(&self, file: &Path, text: &str) -> Diagnostics {
        let file = normalize(file);
        if self.is_analyzed(&file) {
            self.invalidate(&file);
        }
        let includes = self.config.include_paths_for(&file).to_vec();
        self.analyze_inner(file, text, &includes)
    }

    fn analyze_inner(&self, file: PathBuf, text: &str, includes: &[PathBuf]) -> Diagnostics {
        let mut analysis = IsolatedAnalysis::analyze(&file, text);

        // resolve imports against the include paths, then the file's own
        // directory
        let mut dependencies = Vec::new();
        for import in analysis.imports.clone() {
            match resolve_import(&import.path, &file, includes) {
                Some(path) => {
                    let path = normalize(&path);
                    analysis.dependencies.insert(path.clone());
                    dependencies.push((path, import.span));
                }
                None => {
                    analysis.diagnostics.add(Diagnostic::error(
                        DiagnosticKind::Import,
                        format!("Cannot resolve import '{}'", import.path),
                        import.span,
                    ));
                }
            }
        }

        let template_decls: Vec<_> = analysis
            .declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Template(template) => Some(template.clone()),
                _ => None,
            })
            .collect();
        let resolved_dependencies = analysis.dependencies.clone();

        // publish before recursing so import cycles terminate
        {
            let mut state = self.write_state();
            state.graph.clear_imports_of(&file);
            state.graph.add_node(&file);
            for dependency in &resolved_dependencies {
                state.graph.add_edge(&file, dependency);
            }
            state.files.insert(file.clone(), analysis);
            state.order = state.graph.topological_order();
            rebuild_global(&mut state);
        }
        {
            let mut registry = self.write_templates();
            registry.invalidate_file(&file);
            for template in &template_decls {
                registry.add_template(template, Some(&file));
            }
        }

        // analyze unseen dependencies from disk; a read failure is a
        // diagnostic on the importer, not a fatal error
        for (dependency, import_span) in dependencies {
            let already = self.read_state().files.contains_key(&dependency);
            if already {
                continue;
            }
            match std::fs::read_to_string(&dependency) {
                Ok(dep_text) => {
                    self.analyze_inner(dependency, &dep_text, includes);
                }
                Err(err) => {
                    let mut state = self.write_state();
                    if let Some(owner) = state.files.get_mut(&file) {
                        owner.diagnostics.add(Diagnostic::error(
                            DiagnosticKind::Import,
                            format!("Cannot read import '{}': {}", dependency.display(), err),
                            import_span,
                        ));
                    }
                }
            }
        }

        self.diagnostics_for_file(&file)
    }

    /// Drop the analysis for a file and everything that transitively
    /// imports it; returns the set so callers can re-request lazily
    pub fn invalidate(&self, file: &Path) -> IndexSet<PathBuf> {
        let file = normalize(file);
        let closure = {
            let mut state = self.write_state();
            let closure = state.graph.reverse_closure(&file);
            for stale in &closure {
                state.files.remove(stale);
                state.graph.remove_file(stale);
            }
            state.order = state.graph.topological_order();
            rebuild_global(&mut state);
            closure
        };
        let mut registry = self.write_templates();
        for stale in &closure {
            registry.invalidate_file(stale);
        }
        closure
    }

    // =========================================================================
    // Read-only queries
    // =========================================================================

    pub fn is_analyzed(&self, file: &Path) -> bool {
        self.read_state().files.contains_key(&normalize(file))
    }

    pub fn analyzed_files(&self) -> Vec<PathBuf> {
        self.read_state().files.keys().cloned().collect()
    }

    pub fn topological_order(&self) -> Vec<PathBuf> {
        self.read_state().order.clone()
    }

    pub fn diagnostics_for_file(&self, file: &Path) -> Diagnostics {
        self.read_state()
            .files
            .get(&normalize(file))
            .map(|analysis| analysis.diagnostics.clone())
            .unwrap_or_default()
    }

    pub fn all_diagnostics(&self) -> Vec<(PathBuf, Diagnostics)> {
        self.read_state()
            .files
            .iter()
            .map(|(file, analysis)| (file.clone(), analysis.diagnostics.clone()))
            .collect()
    }

    pub fn symbols_in_file(&self, file: &Path) -> Vec<Symbol> {
        self.read_state()
            .files
            .get(&normalize(file))
            .map(|analysis| analysis.symbols.clone())
            .unwrap_or_default()
    }

    /// Top-level symbols with children nested, for document outlines
    pub fn document_symbols(&self, file: &Path) -> Vec<Symbol> {
        self.read_state()
            .files
            .get(&normalize(file))
            .map(|analysis| analysis.document_symbols())
            .unwrap_or_default()
    }

    pub fn symbol_at_position(&self, file: &Path, pos: ZeroPosition) -> Option<Symbol> {
        self.read_state()
            .files
            .get(&normalize(file))
            .and_then(|analysis| analysis.symbol_at_position(pos))
            .cloned()
    }

    /// The name referred to at a position: a defined symbol or a
    /// reference site
    pub fn name_at_position(&self, file: &Path, pos: ZeroPosition) -> Option<String> {
        let state = self.read_state();
        let analysis = state.files.get(&normalize(file))?;
        if let Some(symbol) = analysis.symbol_at_position(pos) {
            return Some(symbol.name.clone());
        }
        analysis
            .reference_at_position(pos)
            .map(|reference| reference.name.clone())
    }

    /// Every file-level definition of a name, one per defining file
    pub fn definitions_of(&self, name: &str) -> Vec<(PathBuf, SymbolDefinition)> {
        let state = self.read_state();
        let Some(files) = state.global.get(name) else {
            return Vec::new();
        };
        files
            .iter()
            .filter_map(|file| {
                state
                    .files
                    .get(file)
                    .and_then(|analysis| analysis.find_definition(name))
                    .map(|definition| (file.clone(), definition.clone()))
            })
            .collect()
    }

    /// References to a name across every analyzed file
    pub fn references_of(&self, name: &str) -> Vec<Reference> {
        self.read_state()
            .files
            .values()
            .flat_map(|analysis| {
                analysis
                    .references
                    .iter()
                    .filter(|reference| reference.name == name)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Symbols visible from a position, for completion
    pub fn symbols_in_scope(&self, file: &Path, pos: ZeroPosition) -> Vec<Symbol> {
        self.read_state()
            .files
            .get(&normalize(file))
            .map(|analysis| {
                analysis
                    .symbols_in_scope(pos)
                    .into_iter()
                    .map(|definition| definition.symbol.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve a template from the shared registry
    pub fn resolve_template(&self, name: &str) -> Option<ResolvedTemplate> {
        let mut registry = self.write_templates();
        let resolved = registry.resolve(name).cloned();
        // resolution diagnostics raised here belong to queries, not to a
        // file rebuild; drop them
        registry.take_diagnostics();
        resolved
    }

    pub fn template_names(&self) -> Vec<String> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .template_names()
            .map(str::to_string)
            .collect()
    }

    /// Markdown hover text for a template: its parameters and methods
    pub fn template_hover(&self, name: &str) -> Option<String> {
        let resolved = self.resolve_template(name)?;
        let mut text = format!("**Template {}**\n", name);
        if !resolved.parameters.is_empty() {
            text.push_str("\n**Parameters:**\n");
            for parameter in resolved.parameters.values() {
                let ty = parameter.ty.as_deref().unwrap_or("auto");
                text.push_str(&format!("- `{}: {}`\n", parameter.name, ty));
            }
        }
        if !resolved.methods.is_empty() {
            text.push_str("\n**Methods:**\n");
            for method in resolved.methods.values() {
                text.push_str(&format!("- `{}`\n", method.display_signature));
            }
        }
        Some(text)
    }
}

fn rebuild_global(state: &mut AnalysisState) {
    state.global.clear();
    for (file, analysis) in &state.files {
        for name in analysis.definitions.keys() {
            state
                .global
                .entry(name.clone())
                .or_default()
                .push(file.clone());
        }
    }
}

/// Absolute, symlink-free form of a path when it exists on disk
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Position;

    #[test]
    fn test_analyze_and_query() {
        let analysis = DeviceAnalysis::new();
        let diags = analysis.analyze(Path::new("mem.dml"), "dml 1.4;\ndevice mem;\n");
        assert!(diags.is_empty());
        let symbols = analysis.symbols_in_file(Path::new("mem.dml"));
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "mem");
        let defs = analysis.definitions_of("mem");
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn test_unresolved_import_is_reported_at_site() {
        let analysis = DeviceAnalysis::new();
        let diags = analysis.analyze(
            Path::new("dev.dml"),
            "dml 1.4;\nimport \"missing.dml\";\ndevice dev;\n",
        );
        assert_eq!(diags.error_count(), 1);
        let diag = diags.iter().next().expect("diagnostic");
        assert_eq!(diag.kind, DiagnosticKind::Import);
        assert!(diag.message.contains("Cannot resolve import 'missing.dml'"));
        assert_eq!(diag.span.start().line, 1);
        // the device symbol still exists
        assert!(analysis
            .symbols_in_file(Path::new("dev.dml"))
            .iter()
            .any(|s| s.name == "dev"));
    }

    #[test]
    fn test_definitions_across_files() {
        let analysis = DeviceAnalysis::new();
        analysis.analyze(Path::new("one.dml"), "dml 1.4;\ndevice one;\nparam shared_name = 1;\n");
        analysis.analyze(Path::new("two.dml"), "dml 1.4;\ndevice two;\nparam shared_name = 2;\n");
        let defs = analysis.definitions_of("shared_name");
        assert_eq!(defs.len(), 2);
    }

    #[test]
    fn test_name_at_position_falls_back_to_references() {
        let analysis = DeviceAnalysis::new();
        analysis.analyze(
            Path::new("dev.dml"),
            "dml 1.4;\ndevice dev is blinky;\ntemplate blinky { }\n",
        );
        // position on the `blinky` reference in the is clause
        let name = analysis.name_at_position(Path::new("dev.dml"), Position::new(1, 16));
        assert_eq!(name.as_deref(), Some("blinky"));
    }
}
