//! Behavioral toggles the resolver honors.
//!
//! Each toggle is a named option with an enumerated effect, not free-form
//! configuration. Defaults are the strict generator-facing configuration;
//! [`CompilerOptions::analysis`] is the lenient preset used by indexing and
//! cross-reference tooling, which wants a best-effort graph rather than
//! hard failures.

use serde::{Deserialize, Serialize};

use crate::error::Severity;

/// Strictness of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Skip the pass entirely.
    None,
    /// Run the pass, report findings as warnings (non-fatal).
    Warning,
    /// Run the pass, report findings as errors (fatal).
    Error,
}

/// Resolver behavior toggles supplied by the enclosing build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Whether producer-style (asynchronous) requests are permitted.
    pub producers_enabled: bool,
    /// Suppress private/static member-injection findings entirely.
    pub ignore_private_and_static_injection: bool,
    /// Strictness of scope validation over the closed graph.
    pub scope_validation: ValidationLevel,
    /// Severity of nullability conflicts (nullable binding consumed by a
    /// non-nullable request).
    pub nullability: Severity,
    /// Severity of private-member injection findings.
    pub private_members: Severity,
    /// Severity of static-member injection findings.
    pub static_members: Severity,
    /// Severity of cross-module scope conflicts (a scoped binding pulled in
    /// from an ancestor component's modules).
    pub cross_module_scope: Severity,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            producers_enabled: true,
            ignore_private_and_static_injection: false,
            scope_validation: ValidationLevel::Error,
            nullability: Severity::Error,
            private_members: Severity::Error,
            static_members: Severity::Error,
            cross_module_scope: Severity::Warning,
        }
    }
}

impl CompilerOptions {
    /// Lenient preset for analysis tooling: everything downgraded so a
    /// best-effort graph is still produced for inspection.
    pub fn analysis() -> Self {
        Self {
            producers_enabled: true,
            ignore_private_and_static_injection: false,
            scope_validation: ValidationLevel::None,
            nullability: Severity::Note,
            private_members: Severity::Note,
            static_members: Severity::Note,
            cross_module_scope: Severity::Note,
        }
    }
}
