// Symbols and references
//
// A Symbol is what a declaration introduces; a Reference is one observed
// use of a name. SymbolDefinition bundles a symbol with its references
// and the chain of enclosing scope names, which is what the cross-file
// table and the LSP queries hand out.

use crate::source::ZeroSpan;
use serde::{Deserialize, Serialize};

/// What a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Device,
    Bank,
    Register,
    Field,
    Method,
    Parameter,
    Attribute,
    Template,
    Connect,
    Interface,
    Port,
    Implement,
    Event,
    Group,
    Subdevice,
    Constant,
    Typedef,
    Struct,
    Enum,
    Variable,
    LogGroup,
    /// An imported module
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Device => "device",
            SymbolKind::Bank => "bank",
            SymbolKind::Register => "register",
            SymbolKind::Field => "field",
            SymbolKind::Method => "method",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Attribute => "attribute",
            SymbolKind::Template => "template",
            SymbolKind::Connect => "connect",
            SymbolKind::Interface => "interface",
            SymbolKind::Port => "port",
            SymbolKind::Implement => "implement",
            SymbolKind::Event => "event",
            SymbolKind::Group => "group",
            SymbolKind::Subdevice => "subdevice",
            SymbolKind::Constant => "constant",
            SymbolKind::Typedef => "typedef",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::LogGroup => "loggroup",
            SymbolKind::Module => "module",
        }
    }

    /// Kinds whose declarations open a nested scope
    pub fn opens_scope(&self) -> bool {
        matches!(
            self,
            SymbolKind::Device
                | SymbolKind::Bank
                | SymbolKind::Register
                | SymbolKind::Template
                | SymbolKind::Group
                | SymbolKind::Subdevice
                | SymbolKind::Port
                | SymbolKind::Attribute
                | SymbolKind::Connect
        )
    }
}

/// A named entity produced by analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Span of the defining site
    pub span: ZeroSpan,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Symbol>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, span: ZeroSpan) -> Self {
        Self {
            name: name.into(),
            kind,
            span,
            detail: None,
            documentation: None,
            children: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

/// The role a referring site plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Template,
    Type,
    Variable,
    Method,
    Parameter,
    Constant,
}

/// One observed use of a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub kind: ReferenceKind,
    pub span: ZeroSpan,
}

impl Reference {
    pub fn new(name: impl Into<String>, kind: ReferenceKind, span: ZeroSpan) -> Self {
        Self {
            name: name.into(),
            kind,
            span,
        }
    }
}

/// A symbol definition with its observed references and the names of the
/// scopes enclosing it, root first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDefinition {
    pub symbol: Symbol,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub references: Vec<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub scope_chain: Vec<String>,
}

impl SymbolDefinition {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            references: Vec::new(),
            scope_chain: Vec::new(),
        }
    }

    pub fn with_scope_chain(mut self, chain: Vec<String>) -> Self {
        self.scope_chain = chain;
        self
    }

    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, ZeroRange, ZeroSpan};

    fn span() -> ZeroSpan {
        ZeroSpan::in_file(
            "dev.dml",
            ZeroRange::new(Position::new(1, 7), Position::new(1, 10)),
        )
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(SymbolKind::Device.as_str(), "device");
        assert_eq!(SymbolKind::LogGroup.as_str(), "loggroup");
    }

    #[test]
    fn test_opens_scope() {
        assert!(SymbolKind::Bank.opens_scope());
        assert!(SymbolKind::Template.opens_scope());
        assert!(!SymbolKind::Constant.opens_scope());
    }

    #[test]
    fn test_definition_references() {
        let mut def = SymbolDefinition::new(Symbol::new("foo", SymbolKind::Device, span()));
        def.add_reference(Reference::new("foo", ReferenceKind::Variable, span()));
        assert_eq!(def.references.len(), 1);
    }
}
