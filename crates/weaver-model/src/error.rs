//! Structured resolution diagnostics.
//!
//! - `ResolveError` — single finding with an origin, message, and notes
//! - `ErrorKind` — classifies findings by failure class
//! - `Severity` — error, warning, or note
//!
//! The resolver only classifies failures; rendering them for humans is the
//! caller's concern. Passes accumulate `Vec<ResolveError>` rather than
//! short-circuiting, so one resolution surfaces every independent problem.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::Origin;

/// Classification of a resolution finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// An injection point's type and modifier are contradictory.
    InvalidRequest,
    /// A declaration is structurally invalid (no return key, map
    /// contribution without a map key, unknown included module, ...).
    MalformedDeclaration,
    /// A type has no eligible injectable constructor.
    NotInjectable,
    /// More than one explicit binding targets the same key.
    DuplicateBinding,
    /// Two map contributions share a literal map key.
    DuplicateMapKey,
    /// A requested key has no explicit, implicit, or multibinding
    /// declaration anywhere in scope.
    MissingBinding,
    /// A dependency cycle with no deferred edge to break it.
    DependencyCycle,
    /// A scoped binding resolved in a component whose scope set does not
    /// contain its scope.
    ScopeMismatch,
    /// Nullability conflict between a binding and a consuming request.
    Nullability,
    /// Programming-contract violation inside the resolver (a bug).
    Internal,
}

impl ErrorKind {
    /// Human-readable class name.
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::MalformedDeclaration => "malformed declaration",
            Self::NotInjectable => "not injectable",
            Self::DuplicateBinding => "duplicate binding",
            Self::DuplicateMapKey => "duplicate map key",
            Self::MissingBinding => "missing binding",
            Self::DependencyCycle => "dependency cycle",
            Self::ScopeMismatch => "scope mismatch",
            Self::Nullability => "nullability conflict",
            Self::Internal => "internal resolver error",
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational note (not an error).
    Note,
    /// Warning (graph is usable but suspicious).
    Warning,
    /// Error (no code may be generated from this graph).
    Error,
}

/// A single resolution finding.
///
/// # Examples
///
/// ```
/// # use weaver_model::error::{ErrorKind, ResolveError};
/// # use weaver_model::foundation::Origin;
/// let err = ResolveError::new(
///     ErrorKind::MissingBinding,
///     Origin::of_type("app.AppComponent"),
///     "no binding for app.Database".to_string(),
/// );
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveError {
    /// Failure class.
    pub kind: ErrorKind,
    /// Severity level.
    pub severity: Severity,
    /// The declaration site the finding is attached to.
    pub origin: Origin,
    /// Primary message.
    pub message: String,
    /// Additional context (e.g. "first bound here: ...").
    pub notes: Vec<String>,
}

impl ResolveError {
    /// Creates an error-severity finding.
    pub fn new(kind: ErrorKind, origin: Origin, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, origin, message)
    }

    /// Creates a warning-severity finding.
    pub fn warning(kind: ErrorKind, origin: Origin, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, origin, message)
    }

    /// Creates a note-severity finding.
    pub fn note(kind: ErrorKind, origin: Origin, message: String) -> Self {
        Self::with_severity(kind, Severity::Note, origin, message)
    }

    /// Creates a finding at an explicit severity (used where an option
    /// toggle decides how severe a rule class is).
    pub fn with_severity(
        kind: ErrorKind,
        severity: Severity,
        origin: Origin,
        message: String,
    ) -> Self {
        Self {
            kind,
            severity,
            origin,
            message,
            notes: Vec::new(),
        }
    }

    /// Adds a context note. Returns self for chaining.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// True if this finding is fatal for code generation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{level}[{}] at {}: {}",
            self.kind.name(),
            self.origin,
            self.message
        )
    }
}
