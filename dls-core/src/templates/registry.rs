// Template registry: raw declarations plus memoized resolutions
//
// A template moves Registered -> Visiting -> Resolved (or an error
// sentinel). Resolution is memoized; once settled a template never
// re-enters Visiting unless the registry is invalidated. Cycles are
// detected against the visiting stack and reported once per member, and
// every error still yields a best-effort resolved form so downstream
// name resolution has something to chew on.

use crate::ast::{MethodDecl, ParamDecl, TemplateDecl};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::source::ZeroSpan;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::linearize::c3_linearize;

/// A parameter after inheritance merging
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub name: String,
    pub ty: Option<String>,
    pub has_value: bool,
    pub source_template: String,
    pub span: ZeroSpan,
}

/// A method after inheritance merging
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMethod {
    pub name: String,
    /// Types-only signature used for override compatibility
    pub type_signature: String,
    /// Full signature for hover and symbol details
    pub display_signature: String,
    pub source_template: String,
    /// Position of the contributing template in the linearization;
    /// 0 is most specific
    pub override_level: u32,
    /// Whether any level of the linearization provides a body
    pub has_implementation: bool,
    pub span: ZeroSpan,
}

/// A template with its inheritance fully applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub name: String,
    pub parameters: IndexMap<String, ResolvedParameter>,
    pub methods: IndexMap<String, ResolvedMethod>,
    pub parents: Vec<String>,
    /// Method resolution order: this template first, ancestors after,
    /// each exactly once
    pub linearization: Vec<String>,
    /// Error sentinel: resolution failed, no symbols propagate
    pub is_error: bool,
    pub span: ZeroSpan,
}

impl ResolvedTemplate {
    fn sentinel(name: &str, parents: Vec<String>, span: ZeroSpan) -> Self {
        Self {
            name: name.to_string(),
            parameters: IndexMap::new(),
            methods: IndexMap::new(),
            parents,
            linearization: vec![name.to_string()],
            is_error: true,
            span,
        }
    }
}

struct Registered {
    decl: TemplateDecl,
    origin: Option<PathBuf>,
}

/// Owner of raw and resolved templates
#[derive(Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, Registered>,
    resolved: IndexMap<String, ResolvedTemplate>,
    diagnostics: Diagnostics,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template declaration. The first registration of a name
    /// wins; duplicates are reported where the symbols are extracted, not
    /// here.
    pub fn add_template(&mut self, decl: &TemplateDecl, origin: Option<&Path>) {
        if self.templates.contains_key(&decl.name.name) {
            return;
        }
        self.templates.insert(
            decl.name.name.clone(),
            Registered {
                decl: decl.clone(),
                origin: origin.map(Path::to_path_buf),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn declaration(&self, name: &str) -> Option<&TemplateDecl> {
        self.templates.get(name).map(|t| &t.decl)
    }

    /// Drop templates contributed by a file and forget every memoized
    /// resolution; the next query re-resolves.
    pub fn invalidate_file(&mut self, file: &Path) {
        self.templates
            .retain(|_, registered| registered.origin.as_deref() != Some(file));
        self.resolved.clear();
    }

    /// Diagnostics recorded since the last drain
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Resolve every registered template, surfacing conflicts and cycles
    pub fn resolve_all(&mut self) {
        let names: Vec<String> = self.templates.keys().cloned().collect();
        for name in names {
            self.resolve(&name);
        }
    }

    /// Resolve a template by name; None when the name is not registered
    pub fn resolve(&mut self, name: &str) -> Option<&ResolvedTemplate> {
        if !self.templates.contains_key(name) {
            return None;
        }
        if !self.resolved.contains_key(name) {
            let mut stack = Vec::new();
            let mut cycle_members = HashSet::new();
            self.resolve_rec(name, &mut stack, &mut cycle_members);
        }
        self.resolved.get(name)
    }

    fn template_span(&self, name: &str) -> ZeroSpan {
        self.templates
            .get(name)
            .map(|t| t.decl.span.clone())
            .unwrap_or_else(|| {
                ZeroSpan::new(crate::source::ZeroRange::new(
                    crate::source::Position::new(0, 0),
                    crate::source::Position::new(0, 0),
                ))
            })
    }

    fn resolve_rec(
        &mut self,
        name: &str,
        stack: &mut Vec<String>,
        cycle_members: &mut HashSet<String>,
    ) {
        if self.resolved.contains_key(name) {
            return;
        }

        // revisit while Visiting: a cycle; report every member once
        if let Some(pos) = stack.iter().position(|entry| entry == name) {
            let members: Vec<String> = stack[pos..].to_vec();
            let path = {
                let mut path = members.join(" -> ");
                path.push_str(" -> ");
                path.push_str(name);
                path
            };
            for member in members {
                if cycle_members.insert(member.clone()) {
                    let span = self.template_span(&member);
                    self.diagnostics.add(Diagnostic::error(
                        DiagnosticKind::CircularDependency,
                        format!("circular template dependency: {}", path),
                        span,
                    ));
                }
            }
            return;
        }

        let Some(registered) = self.templates.get(name) else {
            return;
        };
        let span = registered.decl.span.clone();
        let parents: Vec<String> = registered
            .decl
            .parents
            .iter()
            .map(|p| p.name.clone())
            .collect();

        stack.push(name.to_string());
        let mut parent_linearizations = Vec::new();
        for parent in &parents {
            if !self.templates.contains_key(parent) {
                self.diagnostics.add(Diagnostic::error(
                    DiagnosticKind::Template,
                    format!(
                        "Parent template '{}' not found for template '{}'",
                        parent, name
                    ),
                    span.clone(),
                ));
                continue;
            }
            self.resolve_rec(parent, stack, cycle_members);
            if let Some(resolved) = self.resolved.get(parent) {
                if !resolved.is_error {
                    parent_linearizations.push(resolved.linearization.clone());
                }
            }
        }
        stack.pop();

        if cycle_members.contains(name) {
            self.resolved.insert(
                name.to_string(),
                ResolvedTemplate::sentinel(name, parents, span),
            );
            return;
        }

        let known_parents: Vec<String> = parents
            .iter()
            .filter(|p| {
                self.resolved
                    .get(p.as_str())
                    .map(|r| !r.is_error)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let linearization = match c3_linearize(name, &parent_linearizations, &known_parents) {
            Ok(order) => order,
            Err(conflict) => {
                self.diagnostics.add(Diagnostic::error(
                    DiagnosticKind::Template,
                    format!(
                        "inheritance conflict in template '{}': cannot order {}",
                        name,
                        conflict.join(", ")
                    ),
                    span.clone(),
                ));
                self.resolved.insert(
                    name.to_string(),
                    ResolvedTemplate::sentinel(name, parents, span),
                );
                return;
            }
        };

        let parameters = self.merge_parameters(name, &linearization);
        let methods = self.merge_methods(&linearization);

        self.resolved.insert(
            name.to_string(),
            ResolvedTemplate {
                name: name.to_string(),
                parameters,
                methods,
                parents,
                linearization,
                is_error: false,
                span,
            },
        );
    }

    /// Walk ancestors least specific to most; each parameter is entered
    /// or overwritten, and the binding that sticks is the most specific
    /// definition carrying a declared value.
    fn merge_parameters(
        &mut self,
        own_name: &str,
        linearization: &[String],
    ) -> IndexMap<String, ResolvedParameter> {
        let mut merged: IndexMap<String, ResolvedParameter> = IndexMap::new();
        let mut duplicates = Vec::new();

        for template_name in linearization.iter().rev() {
            let Some(registered) = self.templates.get(template_name) else {
                continue;
            };
            let mut seen_here: HashSet<String> = HashSet::new();
            let own_params: Vec<ParamDecl> = registered.decl.params().cloned().collect();
            for param in own_params {
                if !seen_here.insert(param.name.name.clone()) {
                    // same name twice at the same specificity
                    if template_name == own_name {
                        duplicates.push((param.name.name.clone(), param.span.clone()));
                    }
                    continue;
                }
                let has_value = param.value.is_some();
                let resolved = ResolvedParameter {
                    name: param.name.name.clone(),
                    ty: param.ty.as_ref().map(|t| t.display_name()),
                    has_value,
                    source_template: template_name.clone(),
                    span: param.name.span.clone(),
                };
                let existing_has_value =
                    merged.get(&param.name.name).map(|entry| entry.has_value);
                match existing_has_value {
                    None => {
                        merged.insert(param.name.name.clone(), resolved);
                    }
                    Some(existing_has_value) => {
                        if has_value || !existing_has_value {
                            merged.insert(param.name.name.clone(), resolved);
                        }
                    }
                }
            }
        }

        for (name, span) in duplicates {
            self.diagnostics.add(Diagnostic::error(
                DiagnosticKind::DuplicateSymbol,
                format!("parameter '{}' is declared twice", name),
                span,
            ));
        }
        merged
    }

    /// Walk the linearization most specific first with an override-level
    /// counter; a more specific method replaces a less specific one of
    /// the same signature, and a signature conflict is a TemplateError.
    fn merge_methods(&mut self, linearization: &[String]) -> IndexMap<String, ResolvedMethod> {
        let mut merged: IndexMap<String, ResolvedMethod> = IndexMap::new();
        let mut conflicts = Vec::new();

        for (level, template_name) in linearization.iter().enumerate() {
            let Some(registered) = self.templates.get(template_name) else {
                continue;
            };
            let own_methods: Vec<MethodDecl> = registered.decl.methods().cloned().collect();
            for method in own_methods {
                let signature = type_signature(&method);
                if !merged.contains_key(&method.name.name) {
                    merged.insert(
                        method.name.name.clone(),
                        ResolvedMethod {
                            name: method.name.name.clone(),
                            type_signature: signature,
                            display_signature: method.signature(),
                            source_template: template_name.clone(),
                            override_level: level as u32,
                            has_implementation: !method.is_abstract(),
                            span: method.name.span.clone(),
                        },
                    );
                    continue;
                }
                let compatible = merged
                    .get(&method.name.name)
                    .map(|existing| existing.type_signature == signature)
                    .unwrap_or(true);
                if !compatible {
                    if let Some(existing) = merged.get(&method.name.name) {
                        conflicts.push((
                            method.name.name.clone(),
                            existing.source_template.clone(),
                            template_name.clone(),
                            existing.span.clone(),
                        ));
                    }
                } else if !method.is_abstract() {
                    if let Some(existing) = merged.get_mut(&method.name.name) {
                        existing.has_implementation = true;
                    }
                }
            }
        }

        for (name, specific, general, span) in conflicts {
            self.diagnostics.add(Diagnostic::error(
                DiagnosticKind::Template,
                format!(
                    "method '{}' in template '{}' conflicts with incompatible signature in template '{}'",
                    name, specific, general
                ),
                span,
            ));
        }
        merged
    }
}

/// Types-only signature for override compatibility: parameter types,
/// return types and the throws marker
fn type_signature(method: &MethodDecl) -> String {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| {
            p.ty.as_ref()
                .map(|t| t.display_name())
                .unwrap_or_else(|| "?".to_string())
        })
        .collect();
    let returns: Vec<String> = method.returns.iter().map(|t| t.display_name()).collect();
    let mut sig = format!("({}) -> ({})", params.join(","), returns.join(","));
    if method.throws {
        sig.push_str(" throws");
    }
    sig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Declaration;
    use crate::parser::parse;

    fn registry_from(source: &str) -> TemplateRegistry {
        let result = parse(source, "templates.dml");
        assert!(
            !result.diagnostics.has_errors(),
            "parse errors: {:?}",
            result.diagnostics.as_slice()
        );
        let mut registry = TemplateRegistry::new();
        for decl in &result.declarations {
            if let Declaration::Template(template) = decl {
                registry.add_template(template, None);
            }
        }
        registry
    }

    #[test]
    fn test_state_machine_memoizes() {
        let mut registry = registry_from("template a { param x = 1; }");
        let first = registry.resolve("a").expect("resolves").clone();
        let second = registry.resolve("a").expect("resolves").clone();
        assert_eq!(first, second);
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_linearization_order() {
        let mut registry = registry_from(
            "template base { param width = 4; }\n\
             template mid is base { }\n\
             template leaf is mid { }",
        );
        let leaf = registry.resolve("leaf").expect("resolves");
        assert_eq!(leaf.linearization, vec!["leaf", "mid", "base"]);
        assert!(!leaf.is_error);
    }

    #[test]
    fn test_diamond_each_ancestor_once() {
        let mut registry = registry_from(
            "template root { }\n\
             template left is root { }\n\
             template right is root { }\n\
             template bottom is (left, right) { }",
        );
        let bottom = registry.resolve("bottom").expect("resolves");
        assert_eq!(bottom.linearization, vec!["bottom", "left", "right", "root"]);
        let roots = bottom
            .linearization
            .iter()
            .filter(|n| n.as_str() == "root")
            .count();
        assert_eq!(roots, 1);
    }

    #[test]
    fn test_parameter_override_most_specific_value_wins() {
        let mut registry = registry_from(
            "template base { param width = 4; param depth = 1; }\n\
             template leaf is base { param width = 8; }",
        );
        let leaf = registry.resolve("leaf").expect("resolves").clone();
        let width = leaf.parameters.get("width").expect("width");
        assert_eq!(width.source_template, "leaf");
        let depth = leaf.parameters.get("depth").expect("depth");
        assert_eq!(depth.source_template, "base");
        assert!(registry.take_diagnostics().is_empty());
    }

    #[test]
    fn test_valueless_override_keeps_value_binding() {
        // leaf redeclares width abstractly; the binding with a declared
        // value is the most specific one that has one
        let mut registry = registry_from(
            "template base { param width = 4; }\n\
             template leaf is base { param width; }",
        );
        let leaf = registry.resolve("leaf").expect("resolves");
        let width = leaf.parameters.get("width").expect("width");
        assert!(width.has_value);
        assert_eq!(width.source_template, "base");
    }

    #[test]
    fn test_duplicate_parameter_same_specificity() {
        let mut registry = registry_from("template t { param x = 1; param x = 2; }");
        registry.resolve("t");
        let diags = registry.take_diagnostics();
        assert_eq!(diags.error_count(), 1);
        assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateSymbol));
    }

    #[test]
    fn test_method_override_levels() {
        let mut registry = registry_from(
            "template base { method reset() { } }\n\
             template leaf is base { method reset() { } method extra() { } }",
        );
        let leaf = registry.resolve("leaf").expect("resolves");
        let reset = leaf.methods.get("reset").expect("reset");
        assert_eq!(reset.source_template, "leaf");
        assert_eq!(reset.override_level, 0);
        let extra = leaf.methods.get("extra").expect("extra");
        assert_eq!(extra.override_level, 0);
    }

    #[test]
    fn test_signature_conflict_reported() {
        let mut registry = registry_from(
            "template base { method get() -> (uint64) { return 0; } }\n\
             template leaf is base { method get() -> (bool) { return false; } }",
        );
        registry.resolve("leaf");
        let diags = registry.take_diagnostics();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::Template));
    }

    #[test]
    fn test_abstract_satisfied_by_parent_impl() {
        let mut registry = registry_from(
            "template base { method size() -> (int) { return 1; } }\n\
             template leaf is base { method size() -> (int); }",
        );
        let leaf = registry.resolve("leaf").expect("resolves");
        let size = leaf.methods.get("size").expect("size");
        assert!(size.has_implementation);
    }

    #[test]
    fn test_cycle_reports_both_members() {
        let mut registry =
            registry_from("template a is b { }\ntemplate b is a { }");
        registry.resolve_all();
        let diags = registry.take_diagnostics();
        let cycle_errors: Vec<_> = diags
            .iter()
            .filter(|d| d.kind == DiagnosticKind::CircularDependency)
            .collect();
        assert_eq!(cycle_errors.len(), 2);
        // both resolve to sentinels with no merged contributions
        let a = registry.resolve("a").expect("sentinel").clone();
        let b = registry.resolve("b").expect("sentinel").clone();
        assert!(a.is_error && b.is_error);
        assert!(a.parameters.is_empty() && a.methods.is_empty());
        assert!(b.parameters.is_empty() && b.methods.is_empty());
    }

    #[test]
    fn test_missing_parent_is_template_error() {
        let mut registry = registry_from("template t is ghost { param x = 1; }");
        let resolved = registry.resolve("t").expect("resolves").clone();
        // best-effort: own parameter still merged
        assert!(resolved.parameters.contains_key("x"));
        let diags = registry.take_diagnostics();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::Template));
    }

    #[test]
    fn test_invalidate_file_clears_memoization() {
        use std::path::PathBuf;
        let result = parse("template t { param x = 1; }", "lib.dml");
        let mut registry = TemplateRegistry::new();
        for decl in &result.declarations {
            if let Declaration::Template(template) = decl {
                registry.add_template(template, Some(&PathBuf::from("lib.dml")));
            }
        }
        assert!(registry.resolve("t").is_some());
        registry.invalidate_file(&PathBuf::from("lib.dml"));
        assert!(registry.resolve("t").is_none());
    }
}
