//! Dependency requests.
//!
//! A [`DependencyRequest`] is a typed ask for a [`Key`] with a delivery
//! modifier: direct instance, deferred (`Provider`/`Lazy`/`Producer`),
//! future, optional, or members injection. Requests are built once by the
//! request builder and are read-only afterwards; they form the edges of the
//! binding graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::Origin;
use crate::key::Key;

/// Delivery modifier of a dependency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// A direct instance of the keyed type.
    Instance,
    /// A `Provider<T>`: deferred, re-invocable provision.
    Provider,
    /// A `Lazy<T>`: deferred, memoized provision.
    Lazy,
    /// A `Producer<T>`: asynchronous provision.
    Producer,
    /// A `Future<T>`: the settled value of an asynchronous provision.
    Future,
    /// An `Optional<T>`: present if the underlying key is bound.
    Optional,
    /// Members injection into an already-constructed instance.
    MembersInjection,
}

impl RequestKind {
    /// True if this request defers instantiation and therefore breaks
    /// dependency cycles at runtime.
    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Provider | Self::Lazy | Self::Producer)
    }

    /// True if this request belongs to the producer (asynchronous) family.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Producer | Self::Future)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "instance",
            Self::Provider => "provider",
            Self::Lazy => "lazy",
            Self::Producer => "producer",
            Self::Future => "future",
            Self::Optional => "optional",
            Self::MembersInjection => "members injection",
        };
        write!(f, "{name}")
    }
}

/// A typed ask for a key, owned by the injection point that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRequest {
    /// The key being requested.
    pub key: Key,
    /// Delivery modifier.
    pub kind: RequestKind,
    /// Whether the injection point tolerates a null provision.
    pub nullable: bool,
    /// The injection point this request came from.
    pub origin: Origin,
}

impl DependencyRequest {
    /// A direct, non-nullable request, useful for synthesized edges.
    pub fn instance(key: Key, origin: Origin) -> Self {
        Self {
            key,
            kind: RequestKind::Instance,
            nullable: false,
            origin,
        }
    }

    /// True if this request defers instantiation (see
    /// [`RequestKind::is_deferred`]).
    pub fn is_deferred(&self) -> bool {
        self.kind.is_deferred()
    }
}

impl fmt::Display for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.kind)
    }
}
