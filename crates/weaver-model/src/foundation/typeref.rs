//! Structural type references.
//!
//! A [`TypeRef`] is a [`TypePath`] plus generic arguments. The front end
//! normalizes framework types to the canonical paths in [`wk`] (well-known)
//! before handing declarations to the resolver, so wrapper recognition is a
//! plain path comparison here rather than a framework-specific lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::TypePath;

/// Canonical paths for well-known framework types.
///
/// The request builder and key canonicalizer treat these paths specially;
/// everything else is an opaque user type.
pub mod wk {
    /// `Provider<T>` — deferred, repeatable provision.
    pub const PROVIDER: &str = "runtime.Provider";
    /// `Lazy<T>` — deferred, memoized provision.
    pub const LAZY: &str = "runtime.Lazy";
    /// `Producer<T>` — asynchronous provision.
    pub const PRODUCER: &str = "runtime.Producer";
    /// `Future<T>` — the settled value of an asynchronous provision.
    pub const FUTURE: &str = "runtime.Future";
    /// `Optional<T>` — present/absent provision.
    pub const OPTIONAL: &str = "runtime.Optional";
    /// `MembersInjector<T>` — injects members into an existing instance.
    pub const MEMBERS_INJECTOR: &str = "runtime.MembersInjector";
    /// `Set<T>` — aggregated set multibinding.
    pub const SET: &str = "collections.Set";
    /// `Map<K, V>` — aggregated map multibinding.
    pub const MAP: &str = "collections.Map";
}

/// A type with its generic arguments.
///
/// Equality and hashing are structural, so two references to `Set<Foo>`
/// built independently compare equal. This is what makes [`Key`] a usable
/// identity throughout the graph.
///
/// [`Key`]: crate::key::Key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef {
    /// The named type.
    pub path: TypePath,
    /// Generic arguments, empty for non-generic types.
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    /// A non-generic type.
    pub fn named(path: impl Into<TypePath>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// A generic type application.
    pub fn generic(path: impl Into<TypePath>, args: Vec<TypeRef>) -> Self {
        Self {
            path: path.into(),
            args,
        }
    }

    /// `Set<element>`.
    pub fn set_of(element: TypeRef) -> Self {
        Self::generic(wk::SET, vec![element])
    }

    /// `Map<key, value>`.
    pub fn map_of(key: TypeRef, value: TypeRef) -> Self {
        Self::generic(wk::MAP, vec![key, value])
    }

    /// `Provider<inner>`.
    pub fn provider_of(inner: TypeRef) -> Self {
        Self::generic(wk::PROVIDER, vec![inner])
    }

    /// `Lazy<inner>`.
    pub fn lazy_of(inner: TypeRef) -> Self {
        Self::generic(wk::LAZY, vec![inner])
    }

    /// `Producer<inner>`.
    pub fn producer_of(inner: TypeRef) -> Self {
        Self::generic(wk::PRODUCER, vec![inner])
    }

    /// `Optional<inner>`.
    pub fn optional_of(inner: TypeRef) -> Self {
        Self::generic(wk::OPTIONAL, vec![inner])
    }

    /// `MembersInjector<inner>`.
    pub fn members_injector_of(inner: TypeRef) -> Self {
        Self::generic(wk::MEMBERS_INJECTOR, vec![inner])
    }

    /// True if this is one of the deferral/optional framework wrappers
    /// (`Provider`, `Lazy`, `Producer`, `Future`, `Optional`,
    /// `MembersInjector`).
    pub fn is_framework_wrapper(&self) -> bool {
        matches!(
            self.path.to_string().as_str(),
            wk::PROVIDER | wk::LAZY | wk::PRODUCER | wk::FUTURE | wk::OPTIONAL | wk::MEMBERS_INJECTOR
        )
    }

    /// True if this is an aggregated multibinding collection (`Set`/`Map`).
    pub fn is_collection(&self) -> bool {
        matches!(self.path.to_string().as_str(), wk::SET | wk::MAP)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl From<&str> for TypeRef {
    fn from(s: &str) -> Self {
        Self::named(s)
    }
}
