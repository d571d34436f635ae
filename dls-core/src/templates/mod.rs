// Template system: linearization, resolution and application

mod apply;
mod linearize;
mod registry;

pub use apply::{apply_templates, Application};
pub use linearize::c3_linearize;
pub use registry::{ResolvedMethod, ResolvedParameter, ResolvedTemplate, TemplateRegistry};
