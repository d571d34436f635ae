// File dependency graph
//
// Forward edges record "A imports B", reverse edges the inverse. Import
// cycles are legal DML and are tolerated: the topological walk colors
// nodes gray/black and simply skips back edges, so the order is total
// over reachable files and consistent with the acyclic part of the
// graph. The reverse closure drives invalidation.

use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    forward: IndexMap<PathBuf, IndexSet<PathBuf>>,
    reverse: IndexMap<PathBuf, IndexSet<PathBuf>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record "importer imports dependency"
    pub fn add_edge(&mut self, importer: &Path, dependency: &Path) {
        self.forward
            .entry(importer.to_path_buf())
            .or_default()
            .insert(dependency.to_path_buf());
        self.reverse
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(importer.to_path_buf());
        self.forward.entry(dependency.to_path_buf()).or_default();
        self.reverse.entry(importer.to_path_buf()).or_default();
    }

    pub fn add_node(&mut self, file: &Path) {
        self.forward.entry(file.to_path_buf()).or_default();
        self.reverse.entry(file.to_path_buf()).or_default();
    }

    /// Drop a file's outgoing edges, keeping edges pointing at it
    pub fn clear_imports_of(&mut self, importer: &Path) {
        let dependencies = self
            .forward
            .get(importer)
            .map(|deps| deps.iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        for dependency in dependencies {
            if let Some(reverse) = self.reverse.get_mut(&dependency) {
                reverse.shift_remove(importer);
            }
        }
        if let Some(forward) = self.forward.get_mut(importer) {
            forward.clear();
        }
    }

    pub fn remove_file(&mut self, file: &Path) {
        self.clear_imports_of(file);
        self.forward.shift_remove(file);
        if let Some(importers) = self.reverse.shift_remove(file) {
            for importer in importers {
                if let Some(forward) = self.forward.get_mut(&importer) {
                    forward.shift_remove(file);
                }
            }
        }
    }

    pub fn dependencies_of(&self, file: &Path) -> impl Iterator<Item = &PathBuf> {
        self.forward.get(file).into_iter().flatten()
    }

    pub fn dependents_of(&self, file: &Path) -> impl Iterator<Item = &PathBuf> {
        self.reverse.get(file).into_iter().flatten()
    }

    /// The file plus everything that transitively imports it
    pub fn reverse_closure(&self, file: &Path) -> IndexSet<PathBuf> {
        let mut closure = IndexSet::new();
        closure.insert(file.to_path_buf());
        let mut queue = vec![file.to_path_buf()];
        while let Some(current) = queue.pop() {
            for importer in self.dependents_of(&current) {
                if closure.insert(importer.clone()) {
                    queue.push(importer.clone());
                }
            }
        }
        closure
    }

    /// Total order of all known files, dependencies before importers.
    /// Back edges from import cycles are skipped, not reported.
    pub fn topological_order(&self) -> Vec<PathBuf> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: IndexMap<&PathBuf, Color> =
            self.forward.keys().map(|file| (file, Color::White)).collect();
        let mut order = Vec::new();

        fn visit<'a>(
            graph: &'a DependencyGraph,
            node: &'a PathBuf,
            colors: &mut IndexMap<&'a PathBuf, Color>,
            order: &mut Vec<PathBuf>,
        ) {
            match colors.get(node) {
                Some(Color::White) => {}
                // gray means a back edge: tolerated import cycle
                _ => return,
            }
            colors.insert(node, Color::Gray);
            if let Some(dependencies) = graph.forward.get(node) {
                for dependency in dependencies {
                    visit(graph, dependency, colors, order);
                }
            }
            colors.insert(node, Color::Black);
            order.push(node.clone());
        }

        let nodes: Vec<&PathBuf> = self.forward.keys().collect();
        for node in nodes {
            visit(self, node, &mut colors, &mut order);
        }
        order
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
