// Compile-commands configuration
//
// A JSON object mapping absolute device-file paths to the include search
// path and dmlc flags used for that device:
//
// {
//   "/abs/path/dev.dml": {
//     "includes": ["/abs/include/dir"],
//     "dmlc_flags": ["-g"]
//   }
// }
//
// The includes list is the ordered search path for the device and every
// file it transitively imports. Unknown keys are ignored.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read compile commands from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse compile commands from {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// How to compile one DML device
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompileInfo {
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub dmlc_flags: Vec<String>,
}

/// The full compile-commands map
#[derive(Debug, Clone, Default)]
pub struct CompileConfig {
    commands: HashMap<PathBuf, CompileInfo>,
}

impl CompileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a compile-commands JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let commands: HashMap<PathBuf, CompileInfo> =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { commands })
    }

    pub fn insert(&mut self, file: PathBuf, info: CompileInfo) {
        self.commands.insert(file, info);
    }

    /// The configured include search path for a device file
    pub fn include_paths_for(&self, file: &Path) -> &[PathBuf] {
        self.commands
            .get(file)
            .map(|info| info.includes.as_slice())
            .unwrap_or(&[])
    }

    pub fn info_for(&self, file: &Path) -> Option<&CompileInfo> {
        self.commands.get(file)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
