// Per-file analysis
//
// One IsolatedAnalysis exists per (file path, text); an edit rebuilds it
// from scratch. Construction parses, builds the scope tree and symbol
// table, collects references, validates the file-structure rules (version
// first, device second) and runs the file's templates through the
// template system so devices surface their inherited symbols. A parse
// error never suppresses the analysis of later declarations.

use crate::ast::{Declaration, DeviceDecl, Expression, ImportDecl, LiteralValue, ObjectKind};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parser::parse;
use crate::source::{file_span, ZeroPosition};
use crate::templates::{apply_templates, TemplateRegistry};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::refs::ReferenceCollector;
use super::scope::{ScopeId, ScopeTree};
use super::symbol::{Reference, ReferenceKind, Symbol, SymbolDefinition, SymbolKind};

/// Analysis results for a single file
pub struct IsolatedAnalysis {
    pub file: PathBuf,
    pub source: String,
    pub scopes: ScopeTree,
    pub diagnostics: Diagnostics,
    /// Flat symbol list, template contributions included
    pub symbols: Vec<Symbol>,
    /// First binding per name at file level
    pub definitions: IndexMap<String, SymbolDefinition>,
    pub references: Vec<Reference>,
    pub imports: Vec<ImportDecl>,
    pub dml_version: Option<String>,
    /// Resolved dependency paths, filled in by the device analysis
    pub dependencies: IndexSet<PathBuf>,
    pub declarations: Vec<Declaration>,
}

impl IsolatedAnalysis {
    pub fn analyze(file: impl AsRef<Path>, source: &str) -> Self {
        let file = file.as_ref().to_path_buf();
        let parsed = parse(source, &file);

        let line_count = source.lines().count() as u32;
        let root_name = format!(
            "file:{}",
            file.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string())
        );
        let mut scopes = ScopeTree::new(root_name, file_span(&file, line_count));
        let mut diagnostics = parsed.diagnostics;
        let mut symbols = Vec::new();
        let mut definitions = IndexMap::new();

        validate_structure(&parsed.declarations, &mut diagnostics);

        for declaration in &parsed.declarations {
            extract_symbol(
                declaration,
                ScopeId::ROOT,
                &mut scopes,
                &mut symbols,
                &mut definitions,
                &mut diagnostics,
            );
        }

        // reference collection, including file-level `is` applications
        let mut collector = ReferenceCollector::new();
        collector.collect_declarations(&parsed.declarations);
        let mut references = collector.finish();
        for template in &parsed.device_templates {
            references.push(Reference::new(
                &template.name,
                ReferenceKind::Template,
                template.span.clone(),
            ));
        }
        for reference in &references {
            if let Some(definition) = definitions.get_mut(&reference.name) {
                definition.add_reference(reference.clone());
            }
        }
        if let Some(root) = scopes.get_mut(ScopeId::ROOT) {
            root.references = references.clone();
        }

        // template materialization and application
        let mut registry = TemplateRegistry::new();
        for declaration in &parsed.declarations {
            if let Declaration::Template(template) = declaration {
                registry.add_template(template, Some(&file));
            }
        }
        registry.resolve_all();
        diagnostics.merge(registry.take_diagnostics());

        for declaration in &parsed.declarations {
            if let Declaration::Device(device) = declaration {
                apply_device_templates(
                    device,
                    &parsed.device_templates,
                    &mut registry,
                    &mut scopes,
                    &mut symbols,
                    &mut definitions,
                    &mut diagnostics,
                );
            }
        }

        Self {
            file,
            source: source.to_string(),
            scopes,
            diagnostics,
            symbols,
            definitions,
            references,
            imports: parsed.imports,
            dml_version: parsed.dml_version,
            dependencies: IndexSet::new(),
            declarations: parsed.declarations,
        }
    }

    /// The symbol whose defining span contains the position
    pub fn symbol_at_position(&self, pos: ZeroPosition) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.span.contains(pos))
    }

    /// The reference whose span contains the position
    pub fn reference_at_position(&self, pos: ZeroPosition) -> Option<&Reference> {
        self.references
            .iter()
            .find(|reference| reference.span.contains(pos))
    }

    pub fn find_definition(&self, name: &str) -> Option<&SymbolDefinition> {
        self.definitions.get(name)
    }

    /// Symbols visible from a position: the innermost scope's chain
    pub fn symbols_in_scope(&self, pos: ZeroPosition) -> Vec<&SymbolDefinition> {
        let scope = self.scopes.find_scope_at_position(pos);
        self.scopes.symbols_visible_from(scope)
    }

    /// Top-level symbols with their children nested, for outlines
    pub fn document_symbols(&self) -> Vec<Symbol> {
        self.scopes
            .root()
            .symbols
            .values()
            .map(|definition| definition.symbol.clone())
            .collect()
    }
}

/// Version must be the first declaration and the device the second.
/// Imports are allowed in between and do not count toward the
/// positions. Deviations are semantic errors, never fatal; a missing
/// declaration is tolerated.
fn validate_structure(declarations: &[Declaration], diagnostics: &mut Diagnostics) {
    let ordered: Vec<&Declaration> = declarations
        .iter()
        .filter(|d| !matches!(d, Declaration::Import(_)))
        .collect();
    let version_index = ordered
        .iter()
        .position(|d| matches!(d, Declaration::DmlVersion(_)));
    let device_index = ordered
        .iter()
        .position(|d| matches!(d, Declaration::Device(_)));

    if let (Some(version_index), Some(device_index)) = (version_index, device_index) {
        if device_index < version_index {
            let span = ordered[device_index].span().clone();
            diagnostics.add(Diagnostic::error(
                DiagnosticKind::Semantic,
                "Device declaration must be second statement in file",
                span,
            ));
            return;
        }
    }
    if let Some(version_index) = version_index {
        if version_index != 0 {
            let span = ordered[version_index].span().clone();
            diagnostics.add(Diagnostic::error(
                DiagnosticKind::Semantic,
                "Version declaration must be first statement in file",
                span,
            ));
        }
    }
    if let (Some(_), Some(device_index)) = (version_index, device_index) {
        if device_index != 1 {
            let span = ordered[device_index].span().clone();
            diagnostics.add(Diagnostic::error(
                DiagnosticKind::Semantic,
                "Device declaration must be second statement in file",
                span,
            ));
        }
    }
}

/// Build the symbol for one declaration, opening nested scopes for the
/// container kinds, and record it in the enclosing scope. The first
/// binding of a name wins; a duplicate is recorded as an error only.
fn extract_symbol(
    declaration: &Declaration,
    scope: ScopeId,
    scopes: &mut ScopeTree,
    flat: &mut Vec<Symbol>,
    definitions: &mut IndexMap<String, SymbolDefinition>,
    diagnostics: &mut Diagnostics,
) -> Option<Symbol> {
    let mut symbol = declaration_symbol(declaration)?;

    // nested containers open a scope anchored on the declaration span
    let children: &[Declaration] = match declaration {
        Declaration::Template(template) => &template.body,
        Declaration::Object(object) => &object.body,
        Declaration::Device(device) => device.body.as_deref().unwrap_or(&[]),
        _ => &[],
    };

    if !children.is_empty() || symbol.kind.opens_scope() {
        let child_scope = scopes.create_child(
            scope,
            symbol.name.clone(),
            declaration.span().clone(),
        );
        for child in children {
            if let Some(child_symbol) = extract_symbol(
                child,
                child_scope,
                scopes,
                flat,
                definitions,
                diagnostics,
            ) {
                symbol.children.push(child_symbol);
            }
        }
    }

    let definition = SymbolDefinition::new(symbol.clone());
    match scopes.add_symbol(scope, definition) {
        Ok(()) => {
            flat.push(symbol.clone());
            definitions
                .entry(symbol.name.clone())
                .or_insert_with(|| SymbolDefinition::new(symbol.clone()));
            Some(symbol)
        }
        Err(duplicate) => {
            diagnostics.add(Diagnostic::error(
                DiagnosticKind::DuplicateSymbol,
                format!("Duplicate symbol '{}'", duplicate.symbol.name),
                declaration.span().clone(),
            ));
            None
        }
    }
}

/// The symbol a declaration introduces, if any
fn declaration_symbol(declaration: &Declaration) -> Option<Symbol> {
    match declaration {
        Declaration::DmlVersion(_) => None,
        Declaration::Import(import) => Some(
            Symbol::new(
                import.path.clone(),
                SymbolKind::Module,
                import.span.clone(),
            )
            .with_detail("Imported module"),
        ),
        Declaration::Device(device) => {
            let detail = if device.templates.is_empty() {
                "device".to_string()
            } else {
                let names: Vec<&str> =
                    device.templates.iter().map(|t| t.name.as_str()).collect();
                format!("device is ({})", names.join(", "))
            };
            Some(
                Symbol::new(
                    device.name.name.clone(),
                    SymbolKind::Device,
                    device.name.span.clone(),
                )
                .with_detail(detail)
                .with_documentation(format!("DML device {}", device.name.name)),
            )
        }
        Declaration::Template(template) => Some(
            Symbol::new(
                template.name.name.clone(),
                SymbolKind::Template,
                template.name.span.clone(),
            )
            .with_detail(format!(
                "Template with {} parameters",
                template.params().count()
            ))
            .with_documentation(format!("DML template {}", template.name.name)),
        ),
        Declaration::Object(object) => {
            let kind = match &object.kind {
                ObjectKind::Bank => SymbolKind::Bank,
                ObjectKind::Register { .. } => SymbolKind::Register,
                ObjectKind::Field { .. } => SymbolKind::Field,
                ObjectKind::Attribute => SymbolKind::Attribute,
                ObjectKind::Connect => SymbolKind::Connect,
                ObjectKind::Interface => SymbolKind::Interface,
                ObjectKind::Port => SymbolKind::Port,
                ObjectKind::Implement => SymbolKind::Implement,
                ObjectKind::Event => SymbolKind::Event,
                ObjectKind::Group => SymbolKind::Group,
                ObjectKind::Subdevice => SymbolKind::Subdevice,
            };
            let detail = match &object.kind {
                ObjectKind::Register { offset: Some(offset), .. } => {
                    match literal_text(offset) {
                        Some(text) => format!("register @ {}", text),
                        None => "register".to_string(),
                    }
                }
                other => other.keyword().to_string(),
            };
            Some(
                Symbol::new(object.name.name.clone(), kind, object.name.span.clone())
                    .with_detail(detail),
            )
        }
        Declaration::Method(method) => Some(
            Symbol::new(
                method.name.name.clone(),
                SymbolKind::Method,
                method.name.span.clone(),
            )
            .with_detail(method.signature()),
        ),
        Declaration::Param(param) => {
            let detail = param
                .ty
                .as_ref()
                .map(|ty| ty.display_name())
                .unwrap_or_else(|| "parameter".to_string());
            Some(
                Symbol::new(
                    param.name.name.clone(),
                    SymbolKind::Parameter,
                    param.name.span.clone(),
                )
                .with_detail(detail),
            )
        }
        Declaration::Session(var) | Declaration::Saved(var) | Declaration::Data(var) => Some(
            Symbol::new(
                var.name.name.clone(),
                SymbolKind::Variable,
                var.name.span.clone(),
            )
            .with_detail(var.ty.display_name()),
        ),
        Declaration::Constant(constant) => Some(
            Symbol::new(
                constant.name.name.clone(),
                SymbolKind::Constant,
                constant.name.span.clone(),
            )
            .with_detail("constant"),
        ),
        Declaration::Typedef(typedef) => Some(
            Symbol::new(
                typedef.name.name.clone(),
                SymbolKind::Typedef,
                typedef.name.span.clone(),
            )
            .with_detail(typedef.ty.display_name()),
        ),
        Declaration::Struct(decl) | Declaration::Union(decl) => Some(Symbol::new(
            decl.name.name.clone(),
            SymbolKind::Struct,
            decl.name.span.clone(),
        )),
        Declaration::Enum(decl) => Some(Symbol::new(
            decl.name.name.clone(),
            SymbolKind::Enum,
            decl.name.span.clone(),
        )),
        Declaration::Extern(decl) => Some(
            Symbol::new(
                decl.name.name.clone(),
                SymbolKind::Variable,
                decl.name.span.clone(),
            )
            .with_detail("extern"),
        ),
        Declaration::LogGroup(decl) => Some(Symbol::new(
            decl.name.name.clone(),
            SymbolKind::LogGroup,
            decl.name.span.clone(),
        )),
    }
}

fn literal_text(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Literal(literal) => match &literal.value {
            LiteralValue::Int(value) => Some(format!("{:#x}", value)),
            _ => None,
        },
        _ => None,
    }
}

/// Apply the device's `is` clause plus the file-level `is` items, then
/// fold the contributed symbols into the file's tables
fn apply_device_templates(
    device: &DeviceDecl,
    file_level: &[crate::ast::Ident],
    registry: &mut TemplateRegistry,
    scopes: &mut ScopeTree,
    flat: &mut Vec<Symbol>,
    definitions: &mut IndexMap<String, SymbolDefinition>,
    diagnostics: &mut Diagnostics,
) {
    let mut templates: Vec<String> = device
        .templates
        .iter()
        .map(|t| t.name.clone())
        .collect();
    for ident in file_level {
        if !templates.contains(&ident.name) {
            templates.push(ident.name.clone());
        }
    }
    if templates.is_empty() {
        return;
    }

    // the device owns everything bound in the file root scope;
    // template-internal names live in the template's own scope and do
    // not count as overrides
    let existing: HashSet<String> = scopes.root().symbols.keys().cloned().collect();
    let application = apply_templates(
        registry,
        &device.name.name,
        &device.span,
        &templates,
        &existing,
    );
    diagnostics.merge(application.diagnostics);

    for symbol in application.symbols {
        if scopes
            .add_symbol(ScopeId::ROOT, SymbolDefinition::new(symbol.clone()))
            .is_ok()
        {
            definitions
                .entry(symbol.name.clone())
                .or_insert_with(|| SymbolDefinition::new(symbol.clone()));
            flat.push(symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Position;

    #[test]
    fn test_minimal_device_file() {
        let analysis = IsolatedAnalysis::analyze("a.dml", "dml 1.4;\ndevice foo;\n");
        assert!(analysis.diagnostics.is_empty());
        assert_eq!(analysis.symbols.len(), 1);
        let device = &analysis.symbols[0];
        assert_eq!(device.name, "foo");
        assert_eq!(device.kind, SymbolKind::Device);
        // name span: line 2, column 8 when one-indexed
        assert_eq!(device.span.start(), Position::new(1, 7));
        assert_eq!(analysis.dml_version.as_deref(), Some("1.4"));
    }

    #[test]
    fn test_device_before_version() {
        let analysis = IsolatedAnalysis::analyze("a.dml", "device foo;\ndml 1.4;\n");
        assert_eq!(analysis.diagnostics.error_count(), 1);
        let diag = analysis.diagnostics.iter().next().expect("diagnostic");
        assert_eq!(diag.kind, DiagnosticKind::Semantic);
        assert_eq!(
            diag.message,
            "Device declaration must be second statement in file"
        );
        assert_eq!(diag.span.start(), Position::new(0, 0));
        // the device symbol is still produced
        assert!(analysis.symbols.iter().any(|s| s.name == "foo"));
    }

    #[test]
    fn test_duplicate_template_first_binding_wins() {
        let analysis = IsolatedAnalysis::analyze(
            "a.dml",
            "dml 1.4;\ndevice foo;\ntemplate t { }\ntemplate t { }\n",
        );
        let duplicates: Vec<_> = analysis
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::DuplicateSymbol)
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].span.start().line, 3);
        let definition = analysis.find_definition("t").expect("definition");
        assert_eq!(definition.symbol.span.start().line, 2);
    }

    #[test]
    fn test_template_cycle_has_no_stack_overflow() {
        let analysis = IsolatedAnalysis::analyze(
            "a.dml",
            "template a is b { }\ntemplate b is a { }\n",
        );
        let cycles: Vec<_> = analysis
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::CircularDependency)
            .collect();
        assert_eq!(cycles.len(), 2);
        let lines: Vec<u32> = cycles.iter().map(|d| d.span.start().line).collect();
        assert!(lines.contains(&0) && lines.contains(&1));
    }

    #[test]
    fn test_nested_scopes_and_children() {
        let source = "dml 1.4;\n\
                      device dev;\n\
                      bank regs {\n\
                      \x20   register ctrl size 4 @ 0x0 {\n\
                      \x20       field enable @ [0];\n\
                      \x20   }\n\
                      }\n";
        let analysis = IsolatedAnalysis::analyze("a.dml", source);
        assert!(!analysis.diagnostics.has_errors());
        let bank = analysis
            .symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Bank)
            .expect("bank symbol");
        assert_eq!(bank.children.len(), 1);
        assert_eq!(bank.children[0].children.len(), 1);

        // position inside the register body resolves to its scope
        let scope = analysis.scopes.find_scope_at_position(Position::new(4, 10));
        let names = analysis.scopes.scope_chain(scope);
        assert!(names.contains(&"ctrl".to_string()));
    }

    #[test]
    fn test_template_contributions_reach_device() {
        let source = "dml 1.4;\n\
                      device dev is blinker;\n\
                      template blinker {\n\
                      \x20   param period = 100;\n\
                      \x20   method blink() { }\n\
                      }\n";
        let analysis = IsolatedAnalysis::analyze("a.dml", source);
        assert!(!analysis.diagnostics.has_errors());
        // the contributed symbols carry provenance and land in the file
        // symbol list and root scope
        assert!(analysis
            .symbols
            .iter()
            .any(|s| s.name == "period"
                && s.detail.as_deref() == Some("Parameter from template blinker")));
        assert!(analysis
            .symbols
            .iter()
            .any(|s| s.name == "blink"
                && s.detail.as_deref() == Some("Method from template blinker")));
        assert!(analysis.find_definition("period").is_some());
        assert!(analysis.find_definition("blink").is_some());
    }

    #[test]
    fn test_references_attach_to_definitions() {
        let source = "dml 1.4;\n\
                      device dev;\n\
                      param width = 4;\n\
                      method grow() -> (int) { return width + 1; }\n";
        let analysis = IsolatedAnalysis::analyze("a.dml", source);
        let width = analysis.find_definition("width").expect("width");
        assert_eq!(width.references.len(), 1);
        assert_eq!(width.references[0].kind, ReferenceKind::Variable);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let source = "dml 1.4;\ndevice dev;\nbank b { register r size 4 @ 0x0; }\n";
        let first = IsolatedAnalysis::analyze("a.dml", source);
        let second = IsolatedAnalysis::analyze("a.dml", source);
        assert_eq!(first.symbols, second.symbols);
        assert_eq!(first.references, second.references);
        assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn test_every_span_carries_the_file_path() {
        let source = "dml 1.4;\ndevice dev;\nimport \"x.dml\";\ntemplate t { param p = 1; }\n";
        let analysis = IsolatedAnalysis::analyze("a.dml", source);
        let expected = PathBuf::from("a.dml");
        for symbol in &analysis.symbols {
            assert_eq!(symbol.span.file.as_ref(), Some(&expected));
        }
        for reference in &analysis.references {
            assert_eq!(reference.span.file.as_ref(), Some(&expected));
        }
        for diagnostic in analysis.diagnostics.iter() {
            assert_eq!(diagnostic.span.file.as_ref(), Some(&expected));
        }
    }
}
