//! Resolved bindings.
//!
//! A [`Binding`] is the synthesized answer for a key: its kind, the
//! dependency requests it needs (the outgoing edges of its graph node), and
//! its scope. Binding kinds are a tagged variant, one case per production
//! strategy, each carrying only the fields relevant to that kind.

use serde::{Deserialize, Serialize};

use weaver_model::decl::{MapKey, Scope};
use weaver_model::foundation::Origin;
use weaver_model::key::Key;
use weaver_model::request::DependencyRequest;

/// The resolved production strategy for a key.
///
/// Invariant: at most one binding exists per key per resolution context;
/// multibinding keys aggregate every contribution into a single binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub key: Key,
    pub kind: BindingKind,
    /// Requests this binding itself requires; these become graph edges. For
    /// multibindings this is the flattened concatenation of all
    /// contributions' requests, in element order.
    pub dependencies: Vec<DependencyRequest>,
    /// The component scope this binding is pinned to, if any.
    pub scope: Option<Scope>,
    /// Whether the binding may legally provide null.
    pub nullable: bool,
    /// The declaration this binding was synthesized from.
    pub origin: Origin,
}

/// One resolved production strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    /// One-shot factory from an explicit provider method.
    Provision,
    /// Implicit binding derived from an injectable constructor.
    ConstructorInjection,
    /// Aggregated set multibinding; elements in stable declaration order.
    Set { contributions: Vec<SetContribution> },
    /// Aggregated map multibinding; entries keyed by literal map key.
    Map { entries: Vec<MapContribution> },
    /// Forwards to another key; the target is also a dependency edge.
    Delegate { target: Key },
    /// Present iff the underlying key is independently resolvable in scope.
    Optional { underlying: Key, present: bool },
    /// Injects members into an already-constructed instance.
    MembersInjection,
}

/// One element of a set multibinding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetContribution {
    pub origin: Origin,
    /// Source declaration ordinal; fixes element order.
    pub ordinal: usize,
    /// Requests needed to produce this element.
    pub dependencies: Vec<DependencyRequest>,
}

/// One entry of a map multibinding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapContribution {
    pub map_key: MapKey,
    pub origin: Origin,
    pub ordinal: usize,
    pub dependencies: Vec<DependencyRequest>,
}

impl Binding {
    /// True for set/map aggregations.
    pub fn is_multibinding(&self) -> bool {
        matches!(self.kind, BindingKind::Set { .. } | BindingKind::Map { .. })
    }
}
