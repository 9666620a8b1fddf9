//! Module path configuration
//!
//! The environment key and path separator are fixed per build. A
//! [`LoaderConfig`] file can only append extra paths.

mod types;

pub use types::LoaderConfig;

use std::ffi::OsStr;
use std::path::PathBuf;

/// Environment variable holding the module path list
pub const MODULE_PATH_KEY: &str = "UHD_MODULE_PATH";

/// Separator between entries of the module path list
#[cfg(windows)]
pub const PATH_SEPARATOR: u8 = b';';

/// Separator between entries of the module path list
#[cfg(not(windows))]
pub const PATH_SEPARATOR: u8 = b':';

/// Split a module path list on the ASCII `separator`, keeping the given
/// order.
///
/// An empty value yields no entries. Otherwise empty segments are kept as
/// empty paths. No UTF-8 conversion takes place.
pub fn split_path_list(value: &OsStr, separator: u8) -> Vec<PathBuf> {
    assert!(separator.is_ascii(), "path separator must be ASCII");
    if value.is_empty() {
        return Vec::new();
    }
    value
        .as_encoded_bytes()
        .split(|&b| b == separator)
        // SAFETY: each segment is delimited by an ASCII byte or by the ends
        // of a valid `OsStr`, which keeps it a valid encoded `OsStr`.
        .map(|segment| PathBuf::from(unsafe { OsStr::from_encoded_bytes_unchecked(segment) }))
        .collect()
}

/// Split a module path list on the platform separator.
pub fn split_module_paths(value: &OsStr) -> Vec<PathBuf> {
    split_path_list(value, PATH_SEPARATOR)
}

/// Read [`MODULE_PATH_KEY`] from the process environment and split it.
///
/// Unset or empty means no entries.
pub fn module_paths_from_env() -> Vec<PathBuf> {
    std::env::var_os(MODULE_PATH_KEY)
        .map(|value| split_module_paths(&value))
        .unwrap_or_default()
}
