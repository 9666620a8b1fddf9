//! Diagnostic sinks and load summaries

use crate::traits::DiagnosticSink;
use std::io::Write;
use std::path::PathBuf;
use uhd_modules_core::Error;

/// Writes one line per diagnostic to the process error stream
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&mut self, error: &Error) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", error.diagnostic_line());
    }
}

/// Collects diagnostic lines in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Vec<String>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines reported so far, in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&mut self, error: &Error) {
        self.lines.push(error.diagnostic_line());
    }
}

/// Outcome of one load pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Files handed to the opener
    pub attempted: usize,
    /// Files that loaded successfully, in load order
    pub loaded: Vec<PathBuf>,
    /// Files the opener rejected
    pub failed: usize,
    /// Listed paths that did not exist
    pub missing: usize,
    /// Every diagnostic line reported during the pass
    pub diagnostics: Vec<String>,
}

impl LoadReport {
    /// True when no diagnostics were reported
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
