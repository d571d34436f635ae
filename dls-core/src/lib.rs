// dls-core: analysis core for the DML language server
//
// The pipeline is leaves-first: source text -> lexer -> parser -> per-file
// IsolatedAnalysis -> cross-file DeviceAnalysis. Everything is in-memory
// and no stage is fatal; each records diagnostics and continues.

pub mod analysis;
pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod templates;

pub use analysis::{DeviceAnalysis, IsolatedAnalysis};
pub use config::{CompileConfig, CompileInfo, ConfigError};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};

/// Version of the analysis core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The fixed keyword list offered by completion alongside in-scope
/// symbols
pub const COMPLETION_KEYWORDS: &[&str] = &[
    "dml", "device", "bank", "register", "field", "method", "param", "attribute", "template",
    "connect", "interface", "port", "implement", "import", "typedef", "struct", "is", "each",
    "after", "session", "saved", "constant", "data", "event", "group", "subdevice", "loggroup",
    "independent", "memoized", "startup", "throws", "shared", "inline", "default", "if", "else",
    "while", "for", "foreach", "switch", "return", "try", "catch", "throw", "log", "assert",
    "local", "cast", "sizeof", "typeof", "defined", "undefined", "true", "false",
];
