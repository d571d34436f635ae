// Template application
//
// Applying a template to a host object contributes every non-overriding
// parameter and method of the resolved template as symbols, each tagged
// with its source template. Abstract methods left without a concrete
// implementation anywhere in the linearization are reported at the
// host's span.

use crate::analysis::symbol::{Symbol, SymbolKind};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::source::ZeroSpan;
use std::collections::HashSet;

use super::registry::TemplateRegistry;

/// Result of applying templates to one host object
pub struct Application {
    /// Symbols contributed by the templates, provenance in the detail
    pub symbols: Vec<Symbol>,
    pub diagnostics: Diagnostics,
}

/// Apply `templates` to a host (usually the device). `existing_names` are
/// the names the host already defines; contributions never override them.
pub fn apply_templates(
    registry: &mut TemplateRegistry,
    host_name: &str,
    host_span: &ZeroSpan,
    templates: &[String],
    existing_names: &HashSet<String>,
) -> Application {
    let mut symbols = Vec::new();
    let mut diagnostics = Diagnostics::new();
    let mut contributed: HashSet<String> = existing_names.clone();

    for template_name in templates {
        let Some(resolved) = registry.resolve(template_name) else {
            diagnostics.add(Diagnostic::error(
                DiagnosticKind::Template,
                format!(
                    "Cannot resolve template '{}' for '{}'",
                    template_name, host_name
                ),
                host_span.clone(),
            ));
            continue;
        };
        let resolved = resolved.clone();
        diagnostics.merge(registry.take_diagnostics());

        if resolved.is_error {
            // the sentinel propagates no symbols
            continue;
        }

        for parameter in resolved.parameters.values() {
            if !contributed.insert(parameter.name.clone()) {
                continue;
            }
            let mut symbol = Symbol::new(
                parameter.name.clone(),
                SymbolKind::Parameter,
                parameter.span.clone(),
            )
            .with_detail(format!("Parameter from template {}", parameter.source_template));
            if let Some(ty) = &parameter.ty {
                symbol = symbol.with_documentation(format!("Type: {}", ty));
            }
            symbols.push(symbol);
        }

        for method in resolved.methods.values() {
            if !method.has_implementation && !existing_names.contains(&method.name) {
                diagnostics.add(Diagnostic::error(
                    DiagnosticKind::Semantic,
                    format!(
                        "abstract method '{}' from template '{}' not implemented",
                        method.name, method.source_template
                    ),
                    host_span.clone(),
                ));
            }
            if !contributed.insert(method.name.clone()) {
                continue;
            }
            symbols.push(
                Symbol::new(method.name.clone(), SymbolKind::Method, method.span.clone())
                    .with_detail(format!("Method from template {}", method.source_template))
                    .with_documentation(method.display_signature.clone()),
            );
        }
    }

    Application {
        symbols,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Declaration;
    use crate::parser::parse;
    use crate::source::{Position, ZeroRange};

    fn registry_from(source: &str) -> TemplateRegistry {
        let result = parse(source, "templates.dml");
        let mut registry = TemplateRegistry::new();
        for decl in &result.declarations {
            if let Declaration::Template(template) = decl {
                registry.add_template(template, None);
            }
        }
        registry
    }

    fn device_span() -> ZeroSpan {
        ZeroSpan::in_file(
            "dev.dml",
            ZeroRange::new(Position::new(1, 0), Position::new(1, 10)),
        )
    }

    #[test]
    fn test_contributed_symbols_carry_provenance() {
        let mut registry = registry_from(
            "template counter { param step = 1; method bump() { } }",
        );
        let result = apply_templates(
            &mut registry,
            "dev",
            &device_span(),
            &["counter".to_string()],
            &HashSet::new(),
        );
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.symbols.len(), 2);
        let step = result.symbols.iter().find(|s| s.name == "step").expect("step");
        assert_eq!(
            step.detail.as_deref(),
            Some("Parameter from template counter")
        );
    }

    #[test]
    fn test_host_names_are_not_overridden() {
        let mut registry = registry_from("template t { param width = 4; }");
        let mut existing = HashSet::new();
        existing.insert("width".to_string());
        let result = apply_templates(
            &mut registry,
            "dev",
            &device_span(),
            &["t".to_string()],
            &existing,
        );
        assert!(result.symbols.is_empty());
    }

    #[test]
    fn test_unknown_template_is_reported_at_host() {
        let mut registry = TemplateRegistry::new();
        let result = apply_templates(
            &mut registry,
            "dev",
            &device_span(),
            &["ghost".to_string()],
            &HashSet::new(),
        );
        assert_eq!(result.diagnostics.error_count(), 1);
        let diag = result.diagnostics.iter().next().expect("diagnostic");
        assert_eq!(diag.kind, DiagnosticKind::Template);
        assert_eq!(diag.span, device_span());
    }

    #[test]
    fn test_unimplemented_abstract_method() {
        let mut registry = registry_from("template hw { method read() -> (uint64); }");
        let result = apply_templates(
            &mut registry,
            "dev",
            &device_span(),
            &["hw".to_string()],
            &HashSet::new(),
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Semantic
                && d.message.contains("abstract method 'read'")));
    }

    #[test]
    fn test_abstract_satisfied_by_host() {
        let mut registry = registry_from("template hw { method read() -> (uint64); }");
        let mut existing = HashSet::new();
        existing.insert("read".to_string());
        let result = apply_templates(
            &mut registry,
            "dev",
            &device_span(),
            &["hw".to_string()],
            &existing,
        );
        assert!(!result.diagnostics.has_errors());
    }
}
