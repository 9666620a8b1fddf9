//! Platform dynamic-load primitives
//!
//! Exactly one of these backs [`NativeOpener`] for a given build.

use crate::traits::ModuleOpener;
use std::path::Path;
use uhd_modules_core::ModuleLoadError;

/// `dlopen` with lazy symbol binding
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct DlopenOpener;

#[cfg(unix)]
impl ModuleOpener for DlopenOpener {
    fn open(&self, path: &Path) -> Result<(), ModuleLoadError> {
        use libloading::os::unix::{Library, RTLD_LAZY};

        // SAFETY: running the module's initializers is the whole point of
        // loading it; nothing else about the library is trusted or used.
        let library = unsafe { Library::open(Some(path), RTLD_LAZY) }.map_err(|e| {
            ModuleLoadError::Dlopen {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        // Never unloaded.
        let _ = library.into_raw();
        Ok(())
    }
}

/// `LoadLibrary`
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadLibraryOpener;

#[cfg(windows)]
impl ModuleOpener for LoadLibraryOpener {
    fn open(&self, path: &Path) -> Result<(), ModuleLoadError> {
        use libloading::os::windows::Library;

        // SAFETY: see DlopenOpener.
        let library = unsafe { Library::new(path) }.map_err(|e| ModuleLoadError::LoadLibrary {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let _ = library.into_raw();
        Ok(())
    }
}

/// Fallback for targets without dynamic loading; every load fails
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedOpener;

impl ModuleOpener for UnsupportedOpener {
    fn open(&self, path: &Path) -> Result<(), ModuleLoadError> {
        Err(ModuleLoadError::Unsupported {
            path: path.to_path_buf(),
        })
    }
}

/// The opener for the current target
#[cfg(unix)]
pub type NativeOpener = DlopenOpener;

/// The opener for the current target
#[cfg(windows)]
pub type NativeOpener = LoadLibraryOpener;

/// The opener for the current target
#[cfg(not(any(unix, windows)))]
pub type NativeOpener = UnsupportedOpener;
