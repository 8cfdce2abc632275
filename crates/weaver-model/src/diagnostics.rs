//! Diagnostics sink.
//!
//! The resolver writes every finding to an injected [`DiagnosticSink`]
//! capability in addition to returning accumulated error vectors. Tooling
//! that wants best-effort graphs substitutes [`NullSink`]; tests and
//! batch drivers use [`CollectingSink`].

use std::sync::Mutex;

use crate::error::ResolveError;

/// Receives structured findings as resolution progresses.
///
/// Implementations must be shareable across worker threads: batch resolution
/// fans independent components out with `rayon` and reports into one sink.
pub trait DiagnosticSink: Send + Sync {
    /// Reports a single finding.
    fn report(&self, finding: &ResolveError);
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _finding: &ResolveError) {}
}

/// A sink that collects findings for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    findings: Mutex<Vec<ResolveError>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything reported so far.
    pub fn findings(&self) -> Vec<ResolveError> {
        self.findings
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Drains and returns everything reported so far.
    pub fn drain(&self) -> Vec<ResolveError> {
        self.findings
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, finding: &ResolveError) {
        if let Ok(mut guard) = self.findings.lock() {
            guard.push(finding.clone());
        }
    }
}
