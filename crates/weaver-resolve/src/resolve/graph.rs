//! The resolved binding graph.
//!
//! One [`BindingGraph`] per component, with nested graphs for its
//! subcomponents. Nodes are bindings keyed by their canonical key, edges are
//! the dependency requests that discovered them. Node and edge order is the
//! deterministic traversal order: entry points in declaration order, then
//! each binding's dependencies depth-first.
//!
//! The graph is a plain serializable artifact; resolution logic lives in
//! the resolver and validation passes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use weaver_model::decl::Scope;
use weaver_model::foundation::TypePath;
use weaver_model::key::Key;
use weaver_model::request::DependencyRequest;

use crate::resolve::binding::Binding;
use crate::resolve::extract::EntryPointRequest;

/// One dependency edge: `source` requested `request.key`.
///
/// Entry-point edges have no source binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: Option<Key>,
    pub request: DependencyRequest,
}

/// The fully resolved graph of one component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingGraph {
    /// The component type this graph belongs to.
    pub component: TypePath,
    /// Scopes the component declares.
    pub scopes: Vec<Scope>,
    /// The component's entry points, in declaration order.
    pub entry_points: Vec<EntryPointRequest>,
    /// Every binding resolved in this component, in discovery order.
    /// Serialized as an ordered sequence of pairs (keys are structured).
    #[serde(with = "indexmap::map::serde_seq")]
    pub nodes: IndexMap<Key, Binding>,
    /// Every dependency edge observed during traversal, including edges
    /// into inherited and failed keys.
    pub edges: Vec<Edge>,
    /// Keys satisfied by an ancestor component rather than locally, mapped
    /// to the ancestor that owns the binding.
    #[serde(with = "indexmap::map::serde_seq")]
    pub inherited: IndexMap<Key, TypePath>,
    /// Keys that could not be resolved. Present so a partial graph still
    /// accounts for every edge target.
    pub failed: Vec<Key>,
    /// Graphs of this component's subcomponents, in declaration order.
    pub subgraphs: Vec<BindingGraph>,
}

impl BindingGraph {
    /// The binding resolved locally for `key`, if any.
    pub fn node(&self, key: &Key) -> Option<&Binding> {
        self.nodes.get(key)
    }

    /// True if `key` is accounted for in this graph: resolved locally,
    /// inherited from an ancestor, or recorded as failed.
    pub fn accounts_for(&self, key: &Key) -> bool {
        self.nodes.contains_key(key)
            || self.inherited.contains_key(key)
            || self.failed.contains(key)
    }

    /// The subgraph for `component`, searched depth-first through the
    /// subcomponent tree. Returns `self` when the component matches.
    pub fn subgraph(&self, component: &TypePath) -> Option<&BindingGraph> {
        if &self.component == component {
            return Some(self);
        }
        self.subgraphs
            .iter()
            .find_map(|sub| sub.subgraph(component))
    }

    /// Total binding count across this graph and all subgraphs.
    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
            + self
                .subgraphs
                .iter()
                .map(BindingGraph::total_nodes)
                .sum::<usize>()
    }
}
