//! Graph resolution.
//!
//! Walks a component descriptor's entry points and resolves every reachable
//! key into a binding node, memoized per key, depth-first. Traversal order
//! is deterministic: entry points in declaration order, then each binding's
//! dependencies in order, so the node map and edge list come out identical
//! across runs.
//!
//! # What This Pass Does
//!
//! - Synthesizes one binding per reachable key and records every dependency
//!   edge, including edges into failed keys.
//! - Classifies cycles: a dependency cycle is fatal unless at least one
//!   edge along it is deferred (provider/lazy/producer), which breaks the
//!   instantiation-at-construction chain.
//! - Resolves subcomponents recursively. A child sees its ancestors' nodes
//!   and declarations through a frame chain; a key an ancestor already
//!   resolved is inherited, not re-resolved, unless the child declares its
//!   own binding for it, which is a duplicate.
//!
//! # What This Pass Does NOT Do
//!
//! - No scope or nullability checking; that is the validation pass, which
//!   runs on the finished graph.
//! - No short-circuiting on error. Failed keys are recorded and traversal
//!   continues, so one resolution surfaces as many problems as possible.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::trace;

use weaver_model::error::{ErrorKind, ResolveError};
use weaver_model::foundation::TypePath;
use weaver_model::key::Key;
use weaver_model::request::DependencyRequest;

use crate::resolve::binding::Binding;
use crate::resolve::declarations::BindingDeclaration;
use crate::resolve::extract::ComponentDescriptor;
use crate::resolve::graph::{BindingGraph, Edge};
use crate::resolve::synthesize::Synthesizer;

/// Resolves a component descriptor (and its subcomponent tree) into a
/// binding graph, accumulating findings along the way.
pub fn resolve_descriptor(
    descriptor: &ComponentDescriptor,
    synthesizer: &Synthesizer<'_>,
) -> (BindingGraph, Vec<ResolveError>) {
    resolve_in_frames(descriptor, &[], synthesizer)
}

/// One ancestor component's view, visible to descendant resolutions.
#[derive(Clone, Copy)]
struct Frame<'f, 'd> {
    component: &'f TypePath,
    nodes: &'f IndexMap<Key, Binding>,
    decls: &'f IndexMap<Key, Vec<&'d BindingDeclaration>>,
}

fn resolve_in_frames<'d>(
    descriptor: &'d ComponentDescriptor,
    frames: &[Frame<'_, 'd>],
    synthesizer: &Synthesizer<'_>,
) -> (BindingGraph, Vec<ResolveError>) {
    // Index this component's declarations by target key, preserving
    // declaration order within each key.
    let mut decl_index: IndexMap<Key, Vec<&'d BindingDeclaration>> = IndexMap::new();
    for declaration in descriptor.local_declarations() {
        decl_index
            .entry(declaration.target_key().clone())
            .or_default()
            .push(declaration);
    }

    let mut traversal = Traversal {
        component: &descriptor.ty,
        decl_index: &decl_index,
        frames,
        synthesizer,
        states: HashMap::new(),
        nodes: IndexMap::new(),
        inherited: IndexMap::new(),
        edges: Vec::new(),
        errors: Vec::new(),
        stack: Vec::new(),
        reported_cycles: HashSet::new(),
    };
    for entry_point in &descriptor.entry_points {
        traversal.resolve_request(None, &entry_point.request);
    }
    let Traversal {
        states,
        nodes,
        inherited,
        edges,
        mut errors,
        ..
    } = traversal;

    let mut failed: Vec<Key> = states
        .into_iter()
        .filter(|(_, state)| *state == KeyState::Failed)
        .map(|(key, _)| key)
        .collect();
    failed.sort();

    let mut subgraphs = Vec::new();
    {
        let mut child_frames: Vec<Frame<'_, 'd>> = frames.to_vec();
        child_frames.push(Frame {
            component: &descriptor.ty,
            nodes: &nodes,
            decls: &decl_index,
        });
        for sub in &descriptor.subcomponents {
            let (graph, mut sub_errors) = resolve_in_frames(sub, &child_frames, synthesizer);
            errors.append(&mut sub_errors);
            subgraphs.push(graph);
        }
    }

    (
        BindingGraph {
            component: descriptor.ty.clone(),
            scopes: descriptor.scopes.clone(),
            entry_points: descriptor.entry_points.clone(),
            nodes,
            edges,
            inherited,
            failed,
            subgraphs,
        },
        errors,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Resolving,
    Resolved,
    Failed,
}

struct StackEntry {
    key: Key,
    /// Whether the request that pushed this entry was deferred
    /// (provider/lazy/producer). A cycle containing such an edge is legal.
    deferred_entry: bool,
}

struct Traversal<'t, 'd, 's> {
    component: &'t TypePath,
    decl_index: &'t IndexMap<Key, Vec<&'d BindingDeclaration>>,
    frames: &'t [Frame<'t, 'd>],
    synthesizer: &'t Synthesizer<'s>,
    states: HashMap<Key, KeyState>,
    nodes: IndexMap<Key, Binding>,
    inherited: IndexMap<Key, TypePath>,
    edges: Vec<Edge>,
    errors: Vec<ResolveError>,
    stack: Vec<StackEntry>,
    reported_cycles: HashSet<Vec<Key>>,
}

impl<'t, 'd, 's> Traversal<'t, 'd, 's> {
    fn resolve_request(&mut self, source: Option<&Key>, request: &DependencyRequest) {
        self.edges.push(Edge {
            source: source.cloned(),
            request: request.clone(),
        });

        let key = &request.key;
        match self.states.get(key) {
            Some(KeyState::Resolved | KeyState::Failed) => return,
            Some(KeyState::Resolving) => {
                self.check_cycle(request);
                return;
            }
            None => {}
        }
        trace!(%key, component = %self.component, "resolving key");

        let local = self.decl_index.get(key);
        let has_local = local.is_some_and(|declarations| !declarations.is_empty());
        let ancestor = self
            .frames
            .iter()
            .rev()
            .find(|frame| frame.nodes.contains_key(key));

        if let Some(frame) = ancestor {
            if has_local {
                self.errors.push(
                    ResolveError::new(
                        ErrorKind::DuplicateBinding,
                        request.origin.clone(),
                        format!(
                            "{key} is bound in {} and bound again in {}",
                            frame.component, self.component
                        ),
                    )
                    .with_note("a subcomponent may not redefine an ancestor's binding"),
                );
                // Fall through and synthesize the local binding anyway so
                // its dependencies still get explored.
            } else {
                self.inherited.insert(key.clone(), frame.component.clone());
                self.states.insert(key.clone(), KeyState::Resolved);
                return;
            }
        }

        // Declarations in scope: this component's own, or failing that the
        // nearest ancestor's unresolved ones.
        let declarations: Vec<&BindingDeclaration> = if has_local {
            local.cloned().unwrap_or_default()
        } else {
            self.frames
                .iter()
                .rev()
                .find_map(|frame| frame.decls.get(key))
                .cloned()
                .unwrap_or_default()
        };

        self.states.insert(key.clone(), KeyState::Resolving);
        self.stack.push(StackEntry {
            key: key.clone(),
            deferred_entry: request.is_deferred(),
        });

        let decl_index = self.decl_index;
        let frames = self.frames;
        let synthesizer = self.synthesizer;
        let mut probe = move |probed: &Key| probe_key(probed, decl_index, frames, synthesizer);
        let synthesis = synthesizer.synthesize(key, &declarations, &request.origin, &mut probe);
        self.errors.extend(synthesis.findings);

        match synthesis.binding {
            Some(binding) => {
                let dependencies = binding.dependencies.clone();
                self.nodes.insert(key.clone(), binding);
                for dependency in &dependencies {
                    self.resolve_request(Some(key), dependency);
                }
                self.states.insert(key.clone(), KeyState::Resolved);
            }
            None => {
                self.states.insert(key.clone(), KeyState::Failed);
            }
        }
        self.stack.pop();
    }

    /// A request landed on a key currently being resolved. Report a fatal
    /// dependency cycle unless some edge along the cycle is deferred.
    fn check_cycle(&mut self, request: &DependencyRequest) {
        if request.is_deferred() {
            return;
        }
        let key = &request.key;
        let Some(start) = self.stack.iter().position(|entry| &entry.key == key) else {
            self.errors.push(ResolveError::new(
                ErrorKind::Internal,
                request.origin.clone(),
                format!("{key} is marked in-flight but absent from the resolution stack"),
            ));
            return;
        };
        // Edges entering stack entries after the cycle head are the edges
        // within the cycle; any deferred one breaks it.
        if self.stack[start + 1..]
            .iter()
            .any(|entry| entry.deferred_entry)
        {
            return;
        }

        let cycle: Vec<Key> = self.stack[start..]
            .iter()
            .map(|entry| entry.key.clone())
            .collect();
        let mut signature = cycle.clone();
        signature.sort();
        if !self.reported_cycles.insert(signature) {
            return;
        }

        let mut path: Vec<String> = cycle.iter().map(Key::to_string).collect();
        path.push(key.to_string());
        self.errors.push(
            ResolveError::new(
                ErrorKind::DependencyCycle,
                request.origin.clone(),
                format!("dependency cycle: {}", path.join(" → ")),
            )
            .with_note("break the cycle by requesting one participant as a provider or lazy"),
        );
    }
}

/// Best-effort, non-reporting check whether a key is resolvable in scope.
/// Used for optional-binding presence; deliberately shallow, it does not
/// verify the candidate's own dependencies.
fn probe_key(
    key: &Key,
    decl_index: &IndexMap<Key, Vec<&BindingDeclaration>>,
    frames: &[Frame<'_, '_>],
    synthesizer: &Synthesizer<'_>,
) -> bool {
    if decl_index.get(key).is_some_and(|d| !d.is_empty()) {
        return true;
    }
    if frames.iter().any(|frame| {
        frame.nodes.contains_key(key) || frame.decls.get(key).is_some_and(|d| !d.is_empty())
    }) {
        return true;
    }
    synthesizer.implicit_available(key)
}
