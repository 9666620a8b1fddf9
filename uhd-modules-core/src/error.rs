//! Error types for the UHD module loader

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for module loader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the module loader
#[derive(Error, Debug)]
pub enum Error {
    /// A listed module path does not exist
    #[error("Module path \"{}\" not found.", .0.display())]
    PathNotFound(PathBuf),

    /// The platform loader rejected a module
    #[error(transparent)]
    Load(#[from] ModuleLoadError),

    /// A module directory or config file could not be read
    #[error("Failed to read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Format the error as the single diagnostic line written to stderr.
    ///
    /// Missing paths are reported verbatim, everything else is prefixed
    /// with `Error: `.
    pub fn diagnostic_line(&self) -> String {
        match self {
            Error::PathNotFound(_) => self.to_string(),
            other => format!("Error: {}", other),
        }
    }
}

/// Failure of the platform dynamic-load primitive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleLoadError {
    /// `dlopen` returned null
    #[error("dlopen failed to load \"{}\": {reason}", path.display())]
    Dlopen { path: PathBuf, reason: String },

    /// `LoadLibrary` returned null
    #[error("LoadLibrary failed to load \"{}\": {reason}", path.display())]
    LoadLibrary { path: PathBuf, reason: String },

    /// This build has no dynamic loading support
    #[error("Module loading not supported: Cannot load \"{}\"", path.display())]
    Unsupported { path: PathBuf },
}

impl ModuleLoadError {
    /// The module path the load was attempted on
    pub fn path(&self) -> &Path {
        match self {
            ModuleLoadError::Dlopen { path, .. }
            | ModuleLoadError::LoadLibrary { path, .. }
            | ModuleLoadError::Unsupported { path } => path,
        }
    }
}
