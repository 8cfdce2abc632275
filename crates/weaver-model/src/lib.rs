// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Foundation and input model for the weaver binding-graph resolver.
//!
//! This crate contains the types shared between the external front end and
//! the resolution engine: type identities, keys, dependency requests, raw
//! declarations, compiler options, and diagnostics. The resolution engine
//! itself lives in `weaver-resolve`.

pub mod decl;
pub mod diagnostics;
pub mod error;
pub mod foundation;
pub mod key;
pub mod options;
pub mod request;

// Re-export commonly used types
pub use decl::{
    ComponentDecl, ConstructorDecl, ContributionAnnotation, DeclarationSet, EntryPoint,
    InjectableDecl, InjectionPoint, MapKey, MemberKind, ModuleDecl, ModuleMember, Scope,
};
pub use diagnostics::{CollectingSink, DiagnosticSink, NullSink};
pub use error::{ErrorKind, ResolveError, Severity};
pub use foundation::{wk, Origin, TypePath, TypeRef};
pub use key::{ContributionKind, Key, Qualifier};
pub use options::{CompilerOptions, ValidationLevel};
pub use request::{DependencyRequest, RequestKind};
