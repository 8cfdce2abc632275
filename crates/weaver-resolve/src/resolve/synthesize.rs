//! Binding synthesis.
//!
//! Given a key and every declaration in scope that targets it, constructs
//! the single concrete [`Binding`] for that key. Resolution policy, in
//! priority order:
//!
//! 1. Multibinding contributions (and `multibinds` declarations) aggregate
//!    into one set/map binding; an explicit binding of the same collection
//!    key is a duplicate.
//! 2. Exactly one explicit provision wins the key outright.
//! 3. Several explicit provisions are a duplicate binding.
//! 4. A delegate applies when no stronger declaration exists; the aliased
//!    key becomes a dependency edge.
//! 5. An optional-binding declaration resolves to present or absent via a
//!    best-effort, non-failing probe of the underlying key.
//! 6. Otherwise the implicit-binding registry is consulted; if that also
//!    comes up empty, the key is missing.
//!
//! Synthesis accumulates findings instead of failing fast, and produces a
//! best-effort binding alongside duplicate-binding errors so the graph
//! resolver can keep exploring and surface further problems in one pass.

use std::cell::Cell;

use weaver_model::decl::DeclarationSet;
use weaver_model::error::{ErrorKind, ResolveError};
use weaver_model::foundation::{wk, Origin};
use weaver_model::key::Key;
use weaver_model::options::CompilerOptions;
use weaver_model::request::DependencyRequest;

use crate::resolve::binding::{Binding, BindingKind, MapContribution, SetContribution};
use crate::resolve::declarations::{
    BindingDeclaration, ContributionDeclaration, DelegateDeclaration, MultibindsDeclaration,
    OptionalOfDeclaration, ProvisionDeclaration,
};
use crate::resolve::implicit::{ImplicitBindingCache, ImplicitRegistry, ImplicitResolution};
use crate::resolve::requests::build_request;

/// Outcome of one synthesis: a best-effort binding (absent only when the
/// key is missing or hopeless) plus accumulated findings.
#[derive(Debug)]
pub struct Synthesis {
    pub binding: Option<Binding>,
    pub findings: Vec<ResolveError>,
}

/// Synthesizes bindings from in-scope declarations.
///
/// One synthesizer serves one top-level resolution (including its
/// subcomponent tree); the call counter makes memoization observable.
pub struct Synthesizer<'a> {
    decls: &'a DeclarationSet,
    options: &'a CompilerOptions,
    registry: ImplicitRegistry<'a>,
    calls: Cell<usize>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        decls: &'a DeclarationSet,
        options: &'a CompilerOptions,
        cache: &'a ImplicitBindingCache,
    ) -> Self {
        Self {
            decls,
            options,
            registry: ImplicitRegistry::new(decls, options, cache),
            calls: Cell::new(0),
        }
    }

    /// How many times [`Self::synthesize`] has run. Memoized re-requests of
    /// a key must not increase this.
    pub fn synthesis_calls(&self) -> usize {
        self.calls.get()
    }

    /// Non-failing availability check used by the optional presence probe.
    pub fn implicit_available(&self, key: &Key) -> bool {
        self.registry.is_available(key)
    }

    /// Synthesizes the binding for `key` from every in-scope declaration
    /// targeting it.
    ///
    /// `probe` answers "is this key independently resolvable in scope?"
    /// without recording errors; the graph resolver supplies it with
    /// visibility into ancestor components.
    pub fn synthesize(
        &self,
        key: &Key,
        declarations: &[&BindingDeclaration],
        requested_by: &Origin,
        probe: &mut dyn FnMut(&Key) -> bool,
    ) -> Synthesis {
        self.calls.set(self.calls.get() + 1);

        let mut provisions: Vec<&ProvisionDeclaration> = Vec::new();
        let mut contributions: Vec<&ContributionDeclaration> = Vec::new();
        let mut delegates: Vec<&DelegateDeclaration> = Vec::new();
        let mut optionals: Vec<&OptionalOfDeclaration> = Vec::new();
        let mut multibinds: Vec<&MultibindsDeclaration> = Vec::new();
        for declaration in declarations {
            match declaration {
                BindingDeclaration::Provision(d) => provisions.push(d),
                BindingDeclaration::Contribution(d) => contributions.push(d),
                BindingDeclaration::Delegate(d) => delegates.push(d),
                BindingDeclaration::OptionalOf(d) => optionals.push(d),
                BindingDeclaration::Multibinds(d) => multibinds.push(d),
            }
        }

        let mut findings = Vec::new();

        if !contributions.is_empty() || !multibinds.is_empty() {
            if let Some(conflict) = provisions
                .first()
                .map(|d| &d.origin)
                .or_else(|| delegates.first().map(|d| &d.origin))
            {
                findings.push(
                    ResolveError::new(
                        ErrorKind::DuplicateBinding,
                        conflict.clone(),
                        format!(
                            "{key} is bound explicitly and also receives multibinding contributions"
                        ),
                    )
                    .with_note(format!(
                        "first contribution at {}",
                        contributions
                            .first()
                            .map(|c| &c.origin)
                            .or_else(|| multibinds.first().map(|m| &m.origin))
                            .cloned()
                            .unwrap_or_default()
                    )),
                );
            }
            let binding = self.aggregate(key, &contributions, &multibinds, &mut findings);
            return Synthesis {
                binding: Some(binding),
                findings,
            };
        }

        if !provisions.is_empty() {
            if provisions.len() > 1 {
                let mut err = ResolveError::new(
                    ErrorKind::DuplicateBinding,
                    provisions[0].origin.clone(),
                    format!("{key} is bound more than once"),
                );
                for dup in &provisions[1..] {
                    err = err.with_note(format!("also bound at {}", dup.origin));
                }
                findings.push(err);
            }
            let first = provisions
                .iter()
                .min_by_key(|d| d.ordinal)
                .unwrap_or(&provisions[0]);
            return Synthesis {
                binding: Some(Binding {
                    key: key.clone(),
                    kind: BindingKind::Provision,
                    dependencies: first.dependencies.clone(),
                    scope: first.scope.clone(),
                    nullable: first.nullable,
                    origin: first.origin.clone(),
                }),
                findings,
            };
        }

        if !delegates.is_empty() {
            if delegates.len() > 1 {
                let mut err = ResolveError::new(
                    ErrorKind::DuplicateBinding,
                    delegates[0].origin.clone(),
                    format!("{key} is delegated more than once"),
                );
                for dup in &delegates[1..] {
                    err = err.with_note(format!("also delegated at {}", dup.origin));
                }
                findings.push(err);
            }
            let first = delegates
                .iter()
                .min_by_key(|d| d.ordinal)
                .unwrap_or(&delegates[0]);
            return Synthesis {
                binding: Some(Binding {
                    key: key.clone(),
                    kind: BindingKind::Delegate {
                        target: first.source.key.clone(),
                    },
                    dependencies: vec![first.source.clone()],
                    scope: first.scope.clone(),
                    nullable: false,
                    origin: first.origin.clone(),
                }),
                findings,
            };
        }

        if let Some(optional) = optionals.first() {
            let present = probe(&optional.underlying);
            let dependencies = if present {
                vec![DependencyRequest::instance(
                    optional.underlying.clone(),
                    optional.origin.clone(),
                )]
            } else {
                Vec::new()
            };
            return Synthesis {
                binding: Some(Binding {
                    key: key.clone(),
                    kind: BindingKind::Optional {
                        underlying: optional.underlying.clone(),
                        present,
                    },
                    dependencies,
                    scope: None,
                    nullable: false,
                    origin: optional.origin.clone(),
                }),
                findings,
            };
        }

        // No explicit declaration in scope targets this key.
        if key.ty.path.to_string() == wk::MEMBERS_INJECTOR {
            return Synthesis {
                binding: Some(self.members_injection(key, &mut findings)),
                findings,
            };
        }

        match self.registry.resolve(key) {
            ImplicitResolution::Resolved(binding) => Synthesis {
                binding: Some(binding),
                findings,
            },
            ImplicitResolution::NotInjectable(err) => {
                findings.push(
                    err.with_note(format!("requested at {requested_by}")),
                );
                Synthesis {
                    binding: None,
                    findings,
                }
            }
            ImplicitResolution::NoDeclaration => {
                findings.push(
                    ResolveError::new(
                        ErrorKind::MissingBinding,
                        requested_by.clone(),
                        format!("no binding for {key}"),
                    )
                    .with_note(
                        "the key has no explicit, implicit, or multibinding declaration in scope",
                    ),
                );
                Synthesis {
                    binding: None,
                    findings,
                }
            }
        }
    }

    /// Aggregates all contributions targeting a collection key into one
    /// multibinding. Element order is the stable declaration order; map
    /// entries are keyed by literal map key.
    fn aggregate(
        &self,
        key: &Key,
        contributions: &[&ContributionDeclaration],
        multibinds: &[&MultibindsDeclaration],
        findings: &mut Vec<ResolveError>,
    ) -> Binding {
        let mut ordered: Vec<&ContributionDeclaration> = contributions.to_vec();
        ordered.sort_by_key(|c| c.ordinal);

        let origin = ordered
            .first()
            .map(|c| c.origin.clone())
            .or_else(|| multibinds.first().map(|m| m.origin.clone()))
            .unwrap_or_default();

        let mut dependencies = Vec::new();
        let kind = if key.ty.path.to_string() == wk::MAP {
            let mut entries: Vec<MapContribution> = Vec::new();
            for contribution in &ordered {
                dependencies.extend(contribution.dependencies.iter().cloned());
                let Some(map_key) = contribution.map_key.clone() else {
                    // Extraction guarantees map contributions carry a key.
                    findings.push(ResolveError::new(
                        ErrorKind::Internal,
                        contribution.origin.clone(),
                        format!("map contribution to {key} lost its map key"),
                    ));
                    continue;
                };
                if let Some(existing) = entries.iter().find(|e| e.map_key == map_key) {
                    findings.push(
                        ResolveError::new(
                            ErrorKind::DuplicateMapKey,
                            contribution.origin.clone(),
                            format!("map key {map_key} is contributed more than once to {key}"),
                        )
                        .with_note(format!("first contributed at {}", existing.origin)),
                    );
                    continue;
                }
                entries.push(MapContribution {
                    map_key,
                    origin: contribution.origin.clone(),
                    ordinal: contribution.ordinal,
                    dependencies: contribution.dependencies.clone(),
                });
            }
            BindingKind::Map { entries }
        } else {
            let elements = ordered
                .iter()
                .map(|contribution| {
                    dependencies.extend(contribution.dependencies.iter().cloned());
                    SetContribution {
                        origin: contribution.origin.clone(),
                        ordinal: contribution.ordinal,
                        dependencies: contribution.dependencies.clone(),
                    }
                })
                .collect();
            BindingKind::Set {
                contributions: elements,
            }
        };

        Binding {
            key: key.clone(),
            kind,
            dependencies,
            scope: None,
            nullable: false,
            origin,
        }
    }

    /// Synthesizes a members-injection binding for a `MembersInjector<T>`
    /// key. Always resolvable; a type with no known injected members gets
    /// an empty binding.
    fn members_injection(&self, key: &Key, findings: &mut Vec<ResolveError>) -> Binding {
        let inner = key.ty.args.first();
        let mut dependencies = Vec::new();
        if let Some(inner) = inner {
            if let Some(injectable) = self.decls.injectable(&inner.path) {
                for member in &injectable.members {
                    match build_request(member, self.options) {
                        Ok(request) => dependencies.push(request),
                        Err(err) => findings.push(err),
                    }
                }
            }
        }
        let origin = inner
            .map(|t| Origin::of_type(t.path.clone()))
            .unwrap_or_default();
        Binding {
            key: key.clone(),
            kind: BindingKind::MembersInjection,
            dependencies,
            scope: None,
            nullable: false,
            origin,
        }
    }
}
