//! UHD Module Loader
//!
//! Scans the directories listed in `UHD_MODULE_PATH` and loads every file
//! found as a shared library, so that each library's initializers run.
//! Failures are reported as diagnostics and never returned to the caller.

mod loader;
mod platform;
mod report;
mod traits;

pub use loader::{load_all_modules, load_modules, ModuleLoader};
pub use platform::{NativeOpener, UnsupportedOpener};
#[cfg(unix)]
pub use platform::DlopenOpener;
#[cfg(windows)]
pub use platform::LoadLibraryOpener;
pub use report::{LoadReport, RecordingSink, StderrSink};
pub use traits::{DiagnosticSink, ModuleOpener};
