//! UHD Modules Core Library
//!
//! This crate provides the shared pieces of the UHD module loader:
//! error types, the module path configuration and path-list splitting.

pub mod config;
pub mod error;

pub use config::{module_paths_from_env, LoaderConfig, MODULE_PATH_KEY, PATH_SEPARATOR};
pub use error::{Error, ModuleLoadError, Result};
