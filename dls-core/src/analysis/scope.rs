// Scope tree for a single file
//
// Scopes live in an arena indexed by ScopeId; parent and child links are
// indices, so invalidation is a whole-arena drop and no back-pointers
// exist. The member map is insertion-ordered: document symbols come out
// in source order.

use super::symbol::{Reference, SymbolDefinition};
use crate::source::{ZeroPosition, ZeroSpan};
use indexmap::IndexMap;

/// Index of a scope in its ScopeTree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The file-root scope
    pub const ROOT: ScopeId = ScopeId(0);
}

/// A named, span-bounded scope
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub span: ZeroSpan,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: IndexMap<String, SymbolDefinition>,
    pub references: Vec<Reference>,
}

/// Arena storage for the scope tree of one file
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Create the tree with its file-root scope spanning the whole file
    pub fn new(root_name: impl Into<String>, span: ZeroSpan) -> Self {
        let root = Scope {
            id: ScopeId::ROOT,
            name: root_name.into(),
            span,
            parent: None,
            children: Vec::new(),
            symbols: IndexMap::new(),
            references: Vec::new(),
        };
        Self { scopes: vec![root] }
    }

    pub fn create_child(
        &mut self,
        parent: ScopeId,
        name: impl Into<String>,
        span: ZeroSpan,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            name: name.into(),
            span,
            parent: Some(parent),
            children: Vec::new(),
            symbols: IndexMap::new(),
            references: Vec::new(),
        });
        if let Some(parent_scope) = self.scopes.get_mut(parent.0 as usize) {
            parent_scope.children.push(id);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id.0 as usize)
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|scope| scope.parent)
    }

    /// Ancestors of a scope, nearest first, excluding the scope itself
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(self.parent(id), move |&scope| self.parent(scope))
    }

    /// Names of the scopes enclosing `id`, root first, including `id`
    pub fn scope_chain(&self, id: ScopeId) -> Vec<String> {
        let mut chain: Vec<String> = self
            .ancestors(id)
            .filter_map(|ancestor| self.get(ancestor).map(|scope| scope.name.clone()))
            .collect();
        chain.reverse();
        if let Some(scope) = self.get(id) {
            chain.push(scope.name.clone());
        }
        chain
    }

    /// Add a symbol definition to a scope. The first binding of a name
    /// wins; on a duplicate the existing definition is returned as Err.
    pub fn add_symbol(
        &mut self,
        id: ScopeId,
        mut definition: SymbolDefinition,
    ) -> Result<(), SymbolDefinition> {
        definition.scope_chain = self.scope_chain(id);
        let Some(scope) = self.get_mut(id) else {
            return Ok(());
        };
        if scope.symbols.contains_key(&definition.symbol.name) {
            return Err(definition);
        }
        scope
            .symbols
            .insert(definition.symbol.name.clone(), definition);
        Ok(())
    }

    /// Resolve a name from a scope, walking up the parent chain
    pub fn resolve(&self, from: ScopeId, name: &str) -> Option<&SymbolDefinition> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id)?;
            if let Some(definition) = scope.symbols.get(name) {
                return Some(definition);
            }
            current = scope.parent;
        }
        None
    }

    /// The deepest scope whose span contains the position; the file-root
    /// scope when no nested scope matches
    pub fn find_scope_at_position(&self, pos: ZeroPosition) -> ScopeId {
        fn descend(tree: &ScopeTree, id: ScopeId, pos: ZeroPosition) -> Option<ScopeId> {
            let scope = tree.get(id)?;
            if !scope.span.contains(pos) {
                return None;
            }
            for &child in &scope.children {
                if let Some(inner) = descend(tree, child, pos) {
                    return Some(inner);
                }
            }
            Some(id)
        }
        descend(self, ScopeId::ROOT, pos).unwrap_or(ScopeId::ROOT)
    }

    /// All symbols visible from a scope: the scope itself plus ancestors
    pub fn symbols_visible_from(&self, id: ScopeId) -> Vec<&SymbolDefinition> {
        let mut result = Vec::new();
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let Some(scope) = self.get(scope_id) else {
                break;
            };
            result.extend(scope.symbols.values());
            current = scope.parent;
        }
        result
    }

    /// Every symbol definition in the tree, in scope creation order
    pub fn all_symbols(&self) -> impl Iterator<Item = &SymbolDefinition> {
        self.scopes.iter().flat_map(|scope| scope.symbols.values())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::symbol::{Symbol, SymbolKind};
    use crate::source::{Position, ZeroRange};

    fn span(start_line: u32, end_line: u32) -> ZeroSpan {
        ZeroSpan::in_file(
            "dev.dml",
            ZeroRange::new(Position::new(start_line, 0), Position::new(end_line, 0)),
        )
    }

    fn definition(name: &str, kind: SymbolKind) -> SymbolDefinition {
        SymbolDefinition::new(Symbol::new(name, kind, span(1, 1)))
    }

    #[test]
    fn test_tree_structure() {
        let mut tree = ScopeTree::new("file:dev.dml", span(0, 10));
        let bank = tree.create_child(ScopeId::ROOT, "regs", span(2, 8));
        let register = tree.create_child(bank, "ctrl", span(3, 5));

        assert_eq!(tree.parent(register), Some(bank));
        let ancestors: Vec<_> = tree.ancestors(register).collect();
        assert_eq!(ancestors, vec![bank, ScopeId::ROOT]);
        assert_eq!(
            tree.scope_chain(register),
            vec!["file:dev.dml", "regs", "ctrl"]
        );
    }

    #[test]
    fn test_first_binding_wins() {
        let mut tree = ScopeTree::new("file:dev.dml", span(0, 10));
        assert!(tree
            .add_symbol(ScopeId::ROOT, definition("t", SymbolKind::Template))
            .is_ok());
        assert!(tree
            .add_symbol(ScopeId::ROOT, definition("t", SymbolKind::Template))
            .is_err());
        let root = tree.root();
        assert_eq!(root.symbols.len(), 1);
    }

    #[test]
    fn test_resolve_walks_parents() {
        let mut tree = ScopeTree::new("file:dev.dml", span(0, 10));
        let bank = tree.create_child(ScopeId::ROOT, "regs", span(2, 8));
        tree.add_symbol(ScopeId::ROOT, definition("outer", SymbolKind::Constant))
            .expect("fresh name");
        tree.add_symbol(bank, definition("inner", SymbolKind::Register))
            .expect("fresh name");

        assert!(tree.resolve(bank, "inner").is_some());
        assert!(tree.resolve(bank, "outer").is_some());
        assert!(tree.resolve(ScopeId::ROOT, "inner").is_none());
    }

    #[test]
    fn test_find_scope_at_position() {
        let mut tree = ScopeTree::new("file:dev.dml", span(0, 10));
        let bank = tree.create_child(ScopeId::ROOT, "regs", span(2, 8));
        let register = tree.create_child(bank, "ctrl", span(3, 5));

        assert_eq!(tree.find_scope_at_position(Position::new(4, 2)), register);
        assert_eq!(tree.find_scope_at_position(Position::new(7, 0)), bank);
        assert_eq!(
            tree.find_scope_at_position(Position::new(9, 0)),
            ScopeId::ROOT
        );
        // outside every scope falls back to the root
        assert_eq!(
            tree.find_scope_at_position(Position::new(99, 0)),
            ScopeId::ROOT
        );
    }

    #[test]
    fn test_symbols_visible_from() {
        let mut tree = ScopeTree::new("file:dev.dml", span(0, 10));
        let bank = tree.create_child(ScopeId::ROOT, "regs", span(2, 8));
        tree.add_symbol(ScopeId::ROOT, definition("dev_param", SymbolKind::Parameter))
            .expect("fresh name");
        tree.add_symbol(bank, definition("ctrl", SymbolKind::Register))
            .expect("fresh name");

        let visible = tree.symbols_visible_from(bank);
        let names: Vec<_> = visible.iter().map(|d| d.symbol.name.as_str()).collect();
        assert!(names.contains(&"ctrl"));
        assert!(names.contains(&"dev_param"));
    }
}
