//! Loader capability traits

use std::path::Path;
use uhd_modules_core::{Error, ModuleLoadError};

/// Platform dynamic-load primitive
///
/// A successful `open` leaves the library loaded for the rest of the
/// process lifetime. No handle is returned.
pub trait ModuleOpener {
    /// Load `path` as a shared library
    fn open(&self, path: &Path) -> Result<(), ModuleLoadError>;
}

impl<O: ModuleOpener + ?Sized> ModuleOpener for &O {
    fn open(&self, path: &Path) -> Result<(), ModuleLoadError> {
        (**self).open(path)
    }
}

/// Destination for loader diagnostics
pub trait DiagnosticSink {
    /// Report one non-fatal error
    fn report(&mut self, error: &Error);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, error: &Error) {
        (**self).report(error)
    }
}
