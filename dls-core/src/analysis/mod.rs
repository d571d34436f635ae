// Analysis pipeline: per-file analysis and the cross-file coordinator

mod device;
mod graph;
mod imports;
mod isolated;
mod refs;
mod scope;
pub mod symbol;

pub use device::DeviceAnalysis;
pub use graph::DependencyGraph;
pub use imports::resolve_import;
pub use isolated::IsolatedAnalysis;
pub use refs::ReferenceCollector;
pub use scope::{Scope, ScopeId, ScopeTree};
pub use symbol::{Reference, ReferenceKind, Symbol, SymbolDefinition, SymbolKind};
