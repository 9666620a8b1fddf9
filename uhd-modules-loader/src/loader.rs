//! Module loader

use crate::platform::NativeOpener;
use crate::report::{LoadReport, StderrSink};
use crate::traits::{DiagnosticSink, ModuleOpener};
use std::path::{Path, PathBuf};
use uhd_modules_core::{module_paths_from_env, Error};

/// Load every module listed by `UHD_MODULE_PATH`.
///
/// Call once at the very start of program entry. Unset or empty means
/// nothing happens. Failures only show up on stderr.
pub fn load_all_modules() {
    load_modules(module_paths_from_env());
}

/// Load `paths` in order with the native opener, reporting diagnostics to
/// stderr.
pub fn load_modules(paths: Vec<PathBuf>) -> LoadReport {
    if paths.is_empty() {
        return LoadReport::default();
    }
    let report = ModuleLoader::native().load_all(paths);
    tracing::debug!(
        "Module pass finished: {} attempted, {} loaded, {} failed, {} missing",
        report.attempted,
        report.loaded.len(),
        report.failed,
        report.missing
    );
    report
}

/// Recursive module path walker
pub struct ModuleLoader<O, S> {
    opener: O,
    sink: S,
}

impl ModuleLoader<NativeOpener, StderrSink> {
    /// Loader using the platform opener and writing to stderr
    pub fn native() -> Self {
        Self::new(NativeOpener::default(), StderrSink)
    }
}

impl<O: ModuleOpener, S: DiagnosticSink> ModuleLoader<O, S> {
    /// Create a loader
    pub fn new(opener: O, sink: S) -> Self {
        Self { opener, sink }
    }

    /// The diagnostic sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the loader, returning its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Resolve each path to absolute form and load it, in order.
    pub fn load_all<I>(&mut self, paths: I) -> LoadReport
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut report = LoadReport::default();
        for path in paths {
            if let Some(path) = self.resolve(&path, &mut report) {
                self.load_path(&path, &mut report);
            }
        }
        report
    }

    /// Load `path`, recursing into directories.
    ///
    /// Errors are reported to the sink and recorded in `report`.
    pub fn load_path(&mut self, path: &Path, report: &mut LoadReport) {
        let Self { opener, sink } = self;
        walk(path, sink, report, &mut |file, sink, report| {
            report.attempted += 1;
            match opener.open(file) {
                Ok(()) => {
                    tracing::debug!("Loaded module {}", file.display());
                    report.loaded.push(file.to_path_buf());
                }
                Err(e) => {
                    report.failed += 1;
                    emit(sink, report, &Error::Load(e));
                }
            }
        });
    }

    /// List the files a load pass over `paths` would attempt, without
    /// loading anything. Missing paths are still reported.
    pub fn scan<I>(&mut self, paths: I) -> (Vec<PathBuf>, LoadReport)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut report = LoadReport::default();
        let mut files = Vec::new();
        for path in paths {
            if let Some(path) = self.resolve(&path, &mut report) {
                walk(&path, &mut self.sink, &mut report, &mut |file, _, _| {
                    files.push(file.to_path_buf())
                });
            }
        }
        (files, report)
    }

    fn resolve(&mut self, path: &Path, report: &mut LoadReport) -> Option<PathBuf> {
        // An empty entry stays empty and is never found.
        if path.as_os_str().is_empty() {
            report.missing += 1;
            emit(&mut self.sink, report, &Error::PathNotFound(PathBuf::new()));
            return None;
        }
        match std::path::absolute(path) {
            Ok(path) => Some(path),
            Err(source) => {
                let err = Error::Io {
                    path: path.to_path_buf(),
                    source,
                };
                emit(&mut self.sink, report, &err);
                None
            }
        }
    }
}

type Visit<'a, S> = dyn FnMut(&Path, &mut S, &mut LoadReport) + 'a;

fn walk<S: DiagnosticSink>(
    path: &Path,
    sink: &mut S,
    report: &mut LoadReport,
    visit: &mut Visit<'_, S>,
) {
    match path.try_exists() {
        Ok(true) => {}
        Ok(false) => {
            report.missing += 1;
            emit(sink, report, &Error::PathNotFound(path.to_path_buf()));
            return;
        }
        Err(source) => {
            let err = Error::Io {
                path: path.to_path_buf(),
                source,
            };
            emit(sink, report, &err);
            return;
        }
    }

    if !path.is_dir() {
        visit(path, sink, report);
        return;
    }

    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(source) => {
            let err = Error::Io {
                path: path.to_path_buf(),
                source,
            };
            emit(sink, report, &err);
            return;
        }
    };
    for entry in entries {
        match entry {
            Ok(entry) => walk(&entry.path(), sink, report, visit),
            Err(source) => {
                let err = Error::Io {
                    path: path.to_path_buf(),
                    source,
                };
                emit(sink, report, &err);
            }
        }
    }
}

fn emit<S: DiagnosticSink>(sink: &mut S, report: &mut LoadReport, error: &Error) {
    tracing::warn!("{}", error);
    sink.report(error);
    report.diagnostics.push(error.diagnostic_line());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UnsupportedOpener;
    use crate::report::RecordingSink;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::fs;
    use uhd_modules_core::ModuleLoadError;

    /// Records every open and fails for file names listed in `reject`
    #[derive(Default)]
    struct RecordingOpener {
        opened: RefCell<Vec<PathBuf>>,
        reject: HashSet<String>,
    }

    impl RecordingOpener {
        fn rejecting(names: &[&str]) -> Self {
            Self {
                opened: RefCell::new(Vec::new()),
                reject: names.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl ModuleOpener for RecordingOpener {
        fn open(&self, path: &Path) -> Result<(), ModuleLoadError> {
            self.opened.borrow_mut().push(path.to_path_buf());
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if self.reject.contains(name) {
                return Err(ModuleLoadError::Dlopen {
                    path: path.to_path_buf(),
                    reason: "invalid ELF header".to_string(),
                });
            }
            Ok(())
        }
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"module").unwrap();
    }

    #[test]
    fn test_empty_path_list_does_nothing() {
        let opener = RecordingOpener::default();
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let report = loader.load_all(Vec::new());

        assert_eq!(report, LoadReport::default());
        assert!(opener.opened.borrow().is_empty());
        assert!(loader.sink().lines().is_empty());
    }

    #[test]
    fn test_missing_path_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let missing = dir.path().join("missing");
        let last = dir.path().join("last");
        touch(&first.join("liba.so"));
        touch(&last.join("libb.so"));

        let opener = RecordingOpener::default();
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let report = loader.load_all(vec![first.clone(), missing.clone(), last.clone()]);

        assert_eq!(report.missing, 1);
        assert_eq!(report.attempted, 2);
        assert_eq!(
            loader.sink().lines(),
            &[format!("Module path \"{}\" not found.", missing.display())]
        );
        assert_eq!(
            *opener.opened.borrow(),
            vec![first.join("liba.so"), last.join("libb.so")]
        );
    }

    #[test]
    fn test_recurses_into_every_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("mods");
        let expected = [
            root.join("top.so"),
            root.join("a/one.so"),
            root.join("a/b/two.so"),
            root.join("a/b/c/d/deep.so"),
            root.join("x/readme.txt"),
        ];
        for file in &expected {
            touch(file);
        }
        fs::create_dir_all(root.join("empty")).unwrap();

        let opener = RecordingOpener::default();
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let report = loader.load_all(vec![root]);

        assert_eq!(report.attempted, expected.len());
        assert!(report.is_clean());

        let mut opened = opener.opened.borrow().clone();
        opened.sort();
        let mut expected = expected.to_vec();
        expected.sort();
        assert_eq!(opened, expected);
    }

    #[test]
    fn test_failed_load_is_reported_once_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let file_a = dir.path().join("bad.so");
        let file_b = dir.path().join("good.so");
        touch(&file_a);
        touch(&file_b);

        let opener = RecordingOpener::rejecting(&["bad.so"]);
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let report = loader.load_all(vec![file_a.clone(), file_b.clone()]);

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.loaded, vec![file_b]);
        assert_eq!(
            loader.sink().lines(),
            &[format!(
                "Error: dlopen failed to load \"{}\": invalid ELF header",
                file_a.display()
            )]
        );
        assert_eq!(report.diagnostics, loader.sink().lines());
    }

    #[test]
    fn test_relative_paths_are_made_absolute() {
        let opener = RecordingOpener::default();
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let report = loader.load_all(vec![PathBuf::from("uhd-modules-test-no-such-dir")]);

        assert_eq!(report.missing, 1);
        let line = &loader.sink().lines()[0];
        let expected = std::env::current_dir()
            .unwrap()
            .join("uhd-modules-test-no-such-dir");
        assert_eq!(line, &format!("Module path \"{}\" not found.", expected.display()));
    }

    #[test]
    fn test_unsupported_opener_logs_every_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("one.so"));
        touch(&dir.path().join("sub/two.so"));

        let mut loader = ModuleLoader::new(UnsupportedOpener, RecordingSink::new());
        let report = loader.load_all(vec![dir.path().to_path_buf()]);

        assert_eq!(report.failed, 2);
        assert!(report.loaded.is_empty());
        assert!(loader
            .into_sink()
            .lines()
            .iter()
            .all(|l| l.starts_with("Error: Module loading not supported: Cannot load")));
    }

    #[test]
    fn test_scan_lists_without_loading() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.so"));
        touch(&dir.path().join("nested/b.so"));
        let missing = dir.path().join("nope");

        let opener = RecordingOpener::default();
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let (mut files, report) = loader.scan(vec![dir.path().to_path_buf(), missing]);
        files.sort();

        assert_eq!(
            files,
            vec![dir.path().join("a.so"), dir.path().join("nested/b.so")]
        );
        assert_eq!(report.attempted, 0);
        assert_eq!(report.missing, 1);
        assert!(opener.opened.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_native_loader_rejects_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.so");
        fs::write(&junk, "not a shared object").unwrap();

        let mut loader = ModuleLoader::new(NativeOpener::default(), RecordingSink::new());
        let report = loader.load_all(vec![dir.path().to_path_buf()]);

        assert_eq!(report.failed, 1);
        let lines = loader.sink().lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(&format!(
            "Error: dlopen failed to load \"{}\"",
            junk.display()
        )));
    }

    #[test]
    fn test_empty_entry_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.so"));

        let opener = RecordingOpener::default();
        let mut loader = ModuleLoader::new(&opener, RecordingSink::new());
        let report = loader.load_all(vec![PathBuf::new(), dir.path().to_path_buf()]);

        assert_eq!(report.missing, 1);
        assert_eq!(report.attempted, 1);
        assert_eq!(loader.sink().lines(), &["Module path \"\" not found.".to_string()]);
    }

    #[test]
    fn test_load_modules_without_paths_is_clean() {
        assert_eq!(load_modules(Vec::new()), LoadReport::default());
    }

    #[test]
    fn test_load_all_modules_without_env_is_silent() {
        if std::env::var_os(uhd_modules_core::MODULE_PATH_KEY).is_some() {
            return;
        }
        load_all_modules();
    }

    /// Candidate locations of a system library that is safe to load
    #[cfg(target_os = "linux")]
    fn system_library() -> Option<PathBuf> {
        [
            "/lib/x86_64-linux-gnu/libm.so.6",
            "/usr/lib/x86_64-linux-gnu/libm.so.6",
            "/lib/aarch64-linux-gnu/libm.so.6",
            "/usr/lib/aarch64-linux-gnu/libm.so.6",
            "/lib64/libm.so.6",
            "/usr/lib64/libm.so.6",
            "/lib/libm.so.6",
            "/usr/lib/libm.so.6",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_native_loader_loads_shared_library() {
        let Some(library) = system_library() else {
            eprintln!("no system libm found, skipping");
            return;
        };

        let mut loader = ModuleLoader::new(NativeOpener::default(), RecordingSink::new());
        let report = loader.load_all(vec![library.clone()]);

        assert_eq!(report.attempted, 1);
        assert_eq!(report.loaded, vec![library]);
        assert!(report.is_clean());
        assert!(loader.sink().lines().is_empty());
    }
}
