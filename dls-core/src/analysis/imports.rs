// Import resolution
//
// An import name is looked up against the include paths configured for
// the importing device, in order, then against the importing file's own
// directory. The first existing match wins; a miss is an ImportError on
// the importer at the import's span.

use std::path::{Path, PathBuf};

/// Resolve one import name for `importer`, searching `include_paths`
/// first and the importer's directory last
pub fn resolve_import(
    import_name: &str,
    importer: &Path,
    include_paths: &[PathBuf],
) -> Option<PathBuf> {
    for include in include_paths {
        let candidate = include.join(import_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    let candidate = importer.parent()?.join(import_name);
    if candidate.is_file() {
        return Some(candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_include_path_order_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(&first).expect("mkdir");
        fs::create_dir_all(&second).expect("mkdir");
        fs::write(first.join("util.dml"), "dml 1.4;\n").expect("write");
        fs::write(second.join("util.dml"), "dml 1.4;\n").expect("write");

        let importer = dir.path().join("dev.dml");
        let resolved = resolve_import(
            "util.dml",
            &importer,
            &[first.clone(), second.clone()],
        )
        .expect("resolves");
        assert_eq!(resolved, first.join("util.dml"));
    }

    #[test]
    fn test_falls_back_to_importer_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("util.dml"), "dml 1.4;\n").expect("write");
        let importer = dir.path().join("dev.dml");
        let resolved = resolve_import("util.dml", &importer, &[]).expect("resolves");
        assert_eq!(resolved, dir.path().join("util.dml"));
    }

    #[test]
    fn test_unresolved_import() {
        let dir = tempfile::tempdir().expect("tempdir");
        let importer = dir.path().join("dev.dml");
        assert!(resolve_import("missing.dml", &importer, &[]).is_none());
    }
}
