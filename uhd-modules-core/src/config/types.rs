//! Configuration type definitions

use super::module_paths_from_env;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Module loader configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Extra module paths, processed after the environment entries
    #[serde(default)]
    pub module_paths: Vec<PathBuf>,
}

impl LoaderConfig {
    /// Read a `.toml` or `.json` configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            _ => Err(Error::Config(format!(
                "{}: expected a .toml or .json file",
                path.display()
            ))),
        }
    }

    /// The environment entries followed by `module_paths`.
    pub fn paths_from_env(&self) -> Vec<PathBuf> {
        let mut paths = module_paths_from_env();
        paths.extend(self.module_paths.iter().cloned());
        paths
    }
}
