//! Canonicalized binding declarations.
//!
//! Descriptor extraction turns raw module members into these declaration
//! values: each carries the canonical [`Key`] it contributes to, its
//! originating member, and an ordinal preserving source declaration order
//! (which fixes multibinding element ordering). Declarations are immutable
//! once extracted; the binding synthesizer consumes every declaration in
//! scope that targets a key and produces a single [`Binding`].
//!
//! [`Binding`]: crate::resolve::binding::Binding

use serde::{Deserialize, Serialize};

use weaver_model::decl::{MapKey, Scope};
use weaver_model::foundation::Origin;
use weaver_model::key::Key;
use weaver_model::request::DependencyRequest;

/// A source-level contribution targeting one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingDeclaration {
    /// An explicit provider method.
    Provision(ProvisionDeclaration),
    /// A set/map multibinding contribution.
    Contribution(ContributionDeclaration),
    /// A delegate/alias: the key forwards to another key.
    Delegate(DelegateDeclaration),
    /// An optional-binding declaration (`Optional<T>` may be injected).
    OptionalOf(OptionalOfDeclaration),
    /// Declares a set/map multibinding that may be empty.
    Multibinds(MultibindsDeclaration),
}

/// An explicit provider method binding its return key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionDeclaration {
    pub key: Key,
    pub scope: Option<Scope>,
    pub nullable: bool,
    /// Parameter requests, in declaration order.
    pub dependencies: Vec<DependencyRequest>,
    pub origin: Origin,
    pub ordinal: usize,
}

/// One contribution to a set or map multibinding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDeclaration {
    /// The aggregated collection key this contributes to
    /// (`Set<T>`/`Map<K, V>`, unique).
    pub collection_key: Key,
    /// The element-form key of the contribution itself.
    pub element_key: Key,
    /// Literal map key; present exactly for map contributions.
    pub map_key: Option<MapKey>,
    /// Requests needed to produce the contributed element.
    pub dependencies: Vec<DependencyRequest>,
    pub origin: Origin,
    pub ordinal: usize,
}

/// A delegate/alias declaration; the aliased key becomes a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateDeclaration {
    pub key: Key,
    /// Request for the aliased key.
    pub source: DependencyRequest,
    pub scope: Option<Scope>,
    pub origin: Origin,
    pub ordinal: usize,
}

/// Declares that `Optional<T>` is injectable for some underlying `T`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalOfDeclaration {
    /// The optional key consumers request (`Optional<T>`, unique).
    pub key: Key,
    /// The underlying key whose availability decides present/absent.
    pub underlying: Key,
    pub origin: Origin,
    pub ordinal: usize,
}

/// Declares a multibinding collection with possibly zero contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultibindsDeclaration {
    pub key: Key,
    pub origin: Origin,
    pub ordinal: usize,
}

impl BindingDeclaration {
    /// The key this declaration contributes to (the aggregated collection
    /// key for multibinding contributions).
    pub fn target_key(&self) -> &Key {
        match self {
            Self::Provision(d) => &d.key,
            Self::Contribution(d) => &d.collection_key,
            Self::Delegate(d) => &d.key,
            Self::OptionalOf(d) => &d.key,
            Self::Multibinds(d) => &d.key,
        }
    }

    /// The declaring member.
    pub fn origin(&self) -> &Origin {
        match self {
            Self::Provision(d) => &d.origin,
            Self::Contribution(d) => &d.origin,
            Self::Delegate(d) => &d.origin,
            Self::OptionalOf(d) => &d.origin,
            Self::Multibinds(d) => &d.origin,
        }
    }

    /// Source declaration ordinal, stable across runs.
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Provision(d) => d.ordinal,
            Self::Contribution(d) => d.ordinal,
            Self::Delegate(d) => d.ordinal,
            Self::OptionalOf(d) => d.ordinal,
            Self::Multibinds(d) => d.ordinal,
        }
    }
}
