// Diagnostics for DML analysis
//
// Every stage of the pipeline records diagnostics and continues; nothing
// here is fatal. A diagnostic carries a kind from the closed taxonomy, a
// severity, a message and the zero-indexed span of the offending site.
// The kind maps to a stable kebab-case code surfaced to tooling.

use crate::source::ZeroSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

/// The closed taxonomy of analysis errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The lexer or parser cannot reconcile a token
    Syntax,
    /// A structural language rule is violated
    Semantic,
    /// A type constraint fails during resolution
    Type,
    /// A referenced name binds to nothing
    UndefinedSymbol,
    /// A name is bound twice in the same scope
    DuplicateSymbol,
    /// An import cannot be located
    Import,
    /// Template resolution conflict
    Template,
    /// Cycle in the template or file-import graph
    CircularDependency,
    /// A symbol is used outside its legal scope
    Scope,
    /// A reference is structurally malformed
    Reference,
}

impl DiagnosticKind {
    /// Stable code surfaced alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax-error",
            DiagnosticKind::Semantic => "semantic-error",
            DiagnosticKind::Type => "type-error",
            DiagnosticKind::UndefinedSymbol => "undefined-symbol",
            DiagnosticKind::DuplicateSymbol => "duplicate-symbol",
            DiagnosticKind::Import => "import-error",
            DiagnosticKind::Template => "template-error",
            DiagnosticKind::CircularDependency => "circular-dependency",
            DiagnosticKind::Scope => "scope-error",
            DiagnosticKind::Reference => "reference-error",
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: ZeroSpan,
}

impl Diagnostic {
    /// Create an error-severity diagnostic
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: ZeroSpan) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    /// Create a warning-severity diagnostic
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: ZeroSpan) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span,
            self.severity.as_str(),
            self.code(),
            self.message
        )
    }
}

/// Collection of diagnostics accumulated during analysis
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: ZeroSpan) {
        self.add(Diagnostic::error(kind, message, span));
    }

    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: ZeroSpan) {
        self.add(Diagnostic::warning(kind, message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Move all diagnostics from another collection into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.diagnostics.extend(other.diagnostics);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            diagnostics: iter.into_iter().collect(),
        }
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.diagnostics.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, ZeroRange, ZeroSpan};

    fn span() -> ZeroSpan {
        ZeroSpan::in_file(
            "test.dml",
            ZeroRange::new(Position::new(0, 0), Position::new(0, 5)),
        )
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(DiagnosticKind::Syntax.code(), "syntax-error");
        assert_eq!(DiagnosticKind::Import.code(), "import-error");
        assert_eq!(
            DiagnosticKind::CircularDependency.code(),
            "circular-dependency"
        );
    }

    #[test]
    fn test_collection_counts() {
        let mut diags = Diagnostics::new();
        diags.error(DiagnosticKind::Syntax, "unexpected token", span());
        diags.warning(DiagnosticKind::Semantic, "odd structure", span());
        diags.error(DiagnosticKind::Import, "cannot resolve", span());

        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 2);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn test_merge() {
        let mut a = Diagnostics::new();
        a.error(DiagnosticKind::Syntax, "one", span());
        let mut b = Diagnostics::new();
        b.error(DiagnosticKind::Template, "two", span());
        a.merge(b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let diag = Diagnostic::error(DiagnosticKind::DuplicateSymbol, "duplicate 't'", span());
        let json = serde_json::to_string(&diag).expect("serializes");
        assert!(json.contains("duplicate_symbol"));
        let back: Diagnostic = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, diag);
    }
}
