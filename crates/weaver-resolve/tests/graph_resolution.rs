//! End-to-end graph resolution tests.
//!
//! These tests run whole components through the public pipeline and assert
//! on the resulting graphs and findings:
//! - Deterministic node/edge order and memoized synthesis
//! - Cycle classification (deferred edges break cycles)
//! - Multibinding aggregation and element order
//! - Optional bindings, implicit constructor bindings, members injection
//! - Subcomponent inheritance and redefinition
//! - Scope validation and error reporting through the sink

use weaver_model::decl::{
    ComponentDecl, ConstructorDecl, ContributionAnnotation, DeclarationSet, EntryPoint,
    InjectableDecl, InjectionPoint, MapKey, MemberKind, ModuleDecl, ModuleMember, Scope,
};
use weaver_model::diagnostics::{CollectingSink, NullSink};
use weaver_model::error::ErrorKind;
use weaver_model::foundation::{Origin, TypePath, TypeRef};
use weaver_model::key::Key;
use weaver_model::options::CompilerOptions;
use weaver_resolve::{
    resolve, resolve_batch, resolve_with_stats, BindingKind, ImplicitBindingCache,
};

// =============================================================================
// Fixture helpers
// =============================================================================

fn provides(name: &str, ret: &str, params: &[&str]) -> ModuleMember {
    provides_type(name, TypeRef::named(ret), params)
}

fn provides_type(name: &str, ret: TypeRef, params: &[&str]) -> ModuleMember {
    ModuleMember {
        name: name.to_string(),
        kind: MemberKind::Provides {
            ret: Some(ret),
            qualifier: None,
            scope: None,
            contribution: None,
            map_key: None,
            nullable: false,
            is_static: false,
            is_private: false,
            params: params
                .iter()
                .map(|p| InjectionPoint::new(TypeRef::named(*p), Origin::unknown()))
                .collect(),
        },
    }
}

fn provides_wrapped_param(name: &str, ret: &str, param: TypeRef) -> ModuleMember {
    ModuleMember {
        name: name.to_string(),
        kind: MemberKind::Provides {
            ret: Some(TypeRef::named(ret)),
            qualifier: None,
            scope: None,
            contribution: None,
            map_key: None,
            nullable: false,
            is_static: false,
            is_private: false,
            params: vec![InjectionPoint::new(param, Origin::unknown())],
        },
    }
}

fn scoped_provides(name: &str, ret: &str, scope: &str) -> ModuleMember {
    ModuleMember {
        name: name.to_string(),
        kind: MemberKind::Provides {
            ret: Some(TypeRef::named(ret)),
            qualifier: None,
            scope: Some(Scope::new(scope)),
            contribution: None,
            map_key: None,
            nullable: false,
            is_static: false,
            is_private: false,
            params: Vec::new(),
        },
    }
}

fn into_set(name: &str, ret: &str) -> ModuleMember {
    ModuleMember {
        name: name.to_string(),
        kind: MemberKind::Provides {
            ret: Some(TypeRef::named(ret)),
            qualifier: None,
            scope: None,
            contribution: Some(ContributionAnnotation::IntoSet),
            map_key: None,
            nullable: false,
            is_static: false,
            is_private: false,
            params: Vec::new(),
        },
    }
}

fn into_map(name: &str, ret: &str, map_key: MapKey) -> ModuleMember {
    ModuleMember {
        name: name.to_string(),
        kind: MemberKind::Provides {
            ret: Some(TypeRef::named(ret)),
            qualifier: None,
            scope: None,
            contribution: Some(ContributionAnnotation::IntoMap),
            map_key: Some(map_key),
            nullable: false,
            is_static: false,
            is_private: false,
            params: Vec::new(),
        },
    }
}

fn optional_of(name: &str, ty: &str) -> ModuleMember {
    ModuleMember {
        name: name.to_string(),
        kind: MemberKind::BindsOptionalOf {
            ty: TypeRef::named(ty),
            qualifier: None,
        },
    }
}

fn module(ty: &str, members: Vec<ModuleMember>) -> ModuleDecl {
    let mut decl = ModuleDecl::new(ty);
    decl.members = members;
    decl
}

fn entry(name: &str, ty: TypeRef) -> EntryPoint {
    EntryPoint {
        name: name.to_string(),
        point: InjectionPoint::new(ty, Origin::unknown()),
        members_injection: false,
    }
}

fn component(ty: &str, modules: &[&str], entries: Vec<EntryPoint>) -> ComponentDecl {
    let mut decl = ComponentDecl::new(ty);
    decl.modules = modules.iter().map(|m| TypePath::from(*m)).collect();
    decl.entry_points = entries;
    decl
}

fn key(ty: &str) -> Key {
    Key::unique(TypeRef::named(ty))
}

// =============================================================================
// Determinism and memoization
// =============================================================================

/// Diamond: A needs B and C, both need D. One synthesis per distinct key.
fn diamond_fixture() -> (DeclarationSet, ComponentDecl) {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![
            provides("provideA", "app.A", &["app.B", "app.C"]),
            provides("provideB", "app.B", &["app.D"]),
            provides("provideC", "app.C", &["app.D"]),
            provides("provideD", "app.D", &[]),
        ],
    ));
    let component = component(
        "app.C",
        &["app.M"],
        vec![entry("a", TypeRef::named("app.A"))],
    );
    (decls, component)
}

#[test]
fn diamond_dependency_synthesizes_each_key_once() {
    let (decls, comp) = diamond_fixture();
    let cache = ImplicitBindingCache::new();
    let (result, stats) = resolve_with_stats(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &cache,
        &NullSink,
    );
    let graph = result.unwrap();
    assert_eq!(graph.nodes.len(), 4);
    // app.D is requested by both app.B and app.C but synthesized once.
    assert_eq!(stats.synthesis_calls, 4);
    // Both requests for app.D are still recorded as edges.
    let d_edges = graph
        .edges
        .iter()
        .filter(|e| e.request.key == key("app.D"))
        .count();
    assert_eq!(d_edges, 2);
}

#[test]
fn resolution_is_deterministic() {
    let (decls, comp) = diamond_fixture();
    let options = CompilerOptions::default();

    let first = resolve(
        &comp,
        &decls,
        &options,
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    let second = resolve(
        &comp,
        &decls,
        &options,
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();

    // Identical serialized artifacts, node order included.
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    let keys: Vec<&Key> = first.nodes.keys().collect();
    assert_eq!(
        keys,
        vec![&key("app.A"), &key("app.B"), &key("app.D"), &key("app.C")]
    );
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn direct_cycle_is_fatal() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![
            provides("provideA", "app.A", &["app.B"]),
            provides("provideB", "app.B", &["app.A"]),
        ],
    ));
    let comp = component(
        "app.C",
        &["app.M"],
        vec![entry("a", TypeRef::named("app.A"))],
    );

    let failure = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap_err();
    let cycles: Vec<_> = failure
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::DependencyCycle)
        .collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("app.A"));
    assert!(cycles[0].message.contains("app.B"));
    // The partial graph still rides along in the failure.
    assert!(!failure.partial.nodes.is_empty());
}

#[test]
fn provider_edge_breaks_cycle() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![
            provides("provideA", "app.A", &["app.B"]),
            provides_wrapped_param(
                "provideB",
                "app.B",
                TypeRef::provider_of(TypeRef::named("app.A")),
            ),
        ],
    ));
    let comp = component(
        "app.C",
        &["app.M"],
        vec![entry("a", TypeRef::named("app.A"))],
    );

    let graph = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert!(graph.failed.is_empty());
}

// =============================================================================
// Multibindings
// =============================================================================

#[test]
fn set_elements_keep_declaration_order() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.First",
        vec![into_set("one", "app.Plugin"), into_set("two", "app.Plugin")],
    ));
    decls.add_module(module("app.Second", vec![into_set("three", "app.Plugin")]));
    let set_ty = TypeRef::set_of(TypeRef::named("app.Plugin"));
    let comp = component(
        "app.C",
        &["app.First", "app.Second"],
        vec![entry("plugins", set_ty.clone())],
    );

    let graph = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    let binding = graph.node(&Key::unique(set_ty)).unwrap();
    match &binding.kind {
        BindingKind::Set { contributions } => {
            let members: Vec<&str> = contributions
                .iter()
                .map(|c| c.origin.member.as_deref().unwrap())
                .collect();
            assert_eq!(members, vec!["one", "two", "three"]);
        }
        other => panic!("expected set binding, got {other:?}"),
    }
}

#[test]
fn colliding_map_keys_are_reported() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![
            into_map("home", "app.Handler", MapKey::Str("x".into())),
            into_map("away", "app.Handler", MapKey::Str("x".into())),
        ],
    ));
    let map_ty = TypeRef::map_of(TypeRef::named("std.String"), TypeRef::named("app.Handler"));
    let comp = component("app.C", &["app.M"], vec![entry("handlers", map_ty)]);

    let failure = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap_err();
    assert!(failure
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::DuplicateMapKey && e.message.contains("\"x\"")));
}

// =============================================================================
// Missing, optional, and implicit bindings
// =============================================================================

#[test]
fn missing_binding_names_the_unresolved_key() {
    let decls = DeclarationSet::new();
    let comp = component("app.C", &[], vec![entry("gone", TypeRef::named("app.Gone"))]);

    let sink = CollectingSink::new();
    let failure = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &sink,
    )
    .unwrap_err();
    let missing: Vec<_> = failure
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::MissingBinding)
        .collect();
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("app.Gone"));
    assert_eq!(failure.partial.failed, vec![key("app.Gone")]);
    // Every finding also reached the sink.
    assert_eq!(sink.findings().len(), failure.errors.len());
}

#[test]
fn optional_binding_present_and_absent() {
    let optional_ty = TypeRef::optional_of(TypeRef::named("app.Feature"));

    // Present: a provision for the underlying key exists.
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![
            optional_of("maybeFeature", "app.Feature"),
            provides("provideFeature", "app.Feature", &[]),
        ],
    ));
    let comp = component(
        "app.C",
        &["app.M"],
        vec![entry("feature", optional_ty.clone())],
    );
    let graph = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    let binding = graph.node(&Key::unique(optional_ty.clone())).unwrap();
    match &binding.kind {
        BindingKind::Optional { present, .. } => assert!(present),
        other => panic!("expected optional binding, got {other:?}"),
    }
    // The underlying key was resolved through the dependency edge.
    assert!(graph.node(&key("app.Feature")).is_some());

    // Absent: no backing binding anywhere in scope.
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![optional_of("maybeFeature", "app.Feature")],
    ));
    let comp = component(
        "app.C",
        &["app.M"],
        vec![entry("feature", optional_ty.clone())],
    );
    let graph = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    let binding = graph.node(&Key::unique(optional_ty)).unwrap();
    match &binding.kind {
        BindingKind::Optional { present, .. } => assert!(!present),
        other => panic!("expected optional binding, got {other:?}"),
    }
    assert!(binding.dependencies.is_empty());
}

#[test]
fn implicit_constructor_binding_fills_the_gap() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![provides("provideDb", "app.Db", &[])],
    ));
    let mut service = InjectableDecl::new("app.Service");
    service.constructors.push(ConstructorDecl {
        injectable: true,
        scope: None,
        params: vec![InjectionPoint::new(
            TypeRef::named("app.Db"),
            Origin::unknown(),
        )],
    });
    decls.add_injectable(service);
    let comp = component(
        "app.C",
        &["app.M"],
        vec![entry("service", TypeRef::named("app.Service"))],
    );

    let cache = ImplicitBindingCache::new();
    let graph = resolve(&comp, &decls, &CompilerOptions::default(), &cache, &NullSink).unwrap();
    let binding = graph.node(&key("app.Service")).unwrap();
    assert_eq!(binding.kind, BindingKind::ConstructorInjection);
    assert_eq!(cache.len(), 1);
}

#[test]
fn members_injection_entry_point_resolves_member_requests() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![provides("provideDb", "app.Db", &[])],
    ));
    let mut widget = InjectableDecl::new("app.Widget");
    widget.members.push(InjectionPoint::new(
        TypeRef::named("app.Db"),
        Origin::of_member("app.Widget", "db"),
    ));
    decls.add_injectable(widget);

    let mut comp = component("app.C", &["app.M"], Vec::new());
    comp.entry_points.push(EntryPoint {
        name: "inject".to_string(),
        point: InjectionPoint::new(TypeRef::named("app.Widget"), Origin::unknown()),
        members_injection: true,
    });

    let graph = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    let injector_key = Key::unique(TypeRef::members_injector_of(TypeRef::named("app.Widget")));
    let binding = graph.node(&injector_key).unwrap();
    assert_eq!(binding.kind, BindingKind::MembersInjection);
    assert_eq!(binding.dependencies.len(), 1);
    assert!(graph.node(&key("app.Db")).is_some());
}

// =============================================================================
// Duplicates and scopes
// =============================================================================

#[test]
fn duplicate_provisions_fail_with_both_sites() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![
            provides("first", "app.Foo", &[]),
            provides("second", "app.Foo", &[]),
        ],
    ));
    let comp = component(
        "app.C",
        &["app.M"],
        vec![entry("foo", TypeRef::named("app.Foo"))],
    );

    let failure = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap_err();
    let duplicate = failure
        .errors
        .iter()
        .find(|e| e.kind == ErrorKind::DuplicateBinding)
        .unwrap();
    assert!(duplicate.notes.iter().any(|n| n.contains("second")));
}

#[test]
fn scoped_binding_in_wrong_component_is_a_mismatch() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.M",
        vec![scoped_provides("provideDb", "app.Db", "Singleton")],
    ));
    let mut comp = component(
        "app.RequestComponent",
        &["app.M"],
        vec![entry("db", TypeRef::named("app.Db"))],
    );
    comp.scopes.push(Scope::new("PerRequest"));

    let failure = resolve(
        &comp,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap_err();
    assert!(failure
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::ScopeMismatch));

    // The lenient preset suppresses the pass entirely.
    assert!(resolve(
        &comp,
        &decls,
        &CompilerOptions::analysis(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .is_ok());
}

// =============================================================================
// Subcomponents
// =============================================================================

#[test]
fn subcomponent_inherits_ancestor_bindings() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.ParentModule",
        vec![provides("provideDb", "app.Db", &[])],
    ));
    decls.add_module(module(
        "app.ChildModule",
        vec![provides("provideRepo", "app.Repo", &["app.Db"])],
    ));
    let child = component(
        "app.Child",
        &["app.ChildModule"],
        vec![entry("repo", TypeRef::named("app.Repo"))],
    );
    decls.add_component(child);

    let mut parent = component(
        "app.Parent",
        &["app.ParentModule"],
        vec![entry("db", TypeRef::named("app.Db"))],
    );
    parent.subcomponents.push(TypePath::from("app.Child"));

    let graph = resolve(
        &parent,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap();
    assert!(graph.node(&key("app.Db")).is_some());
    let child_graph = graph.subgraph(&TypePath::from("app.Child")).unwrap();
    assert!(child_graph.node(&key("app.Repo")).is_some());
    // app.Db is not re-resolved in the child; it is inherited.
    assert!(child_graph.node(&key("app.Db")).is_none());
    assert_eq!(
        child_graph.inherited.get(&key("app.Db")),
        Some(&TypePath::from("app.Parent"))
    );
}

#[test]
fn subcomponent_redefining_ancestor_binding_is_a_duplicate() {
    let mut decls = DeclarationSet::new();
    decls.add_module(module(
        "app.ParentModule",
        vec![provides("provideDb", "app.Db", &[])],
    ));
    decls.add_module(module(
        "app.ChildModule",
        vec![provides("provideDbAgain", "app.Db", &[])],
    ));
    let child = component(
        "app.Child",
        &["app.ChildModule"],
        vec![entry("db", TypeRef::named("app.Db"))],
    );
    decls.add_component(child);

    let mut parent = component(
        "app.Parent",
        &["app.ParentModule"],
        vec![entry("db", TypeRef::named("app.Db"))],
    );
    parent.subcomponents.push(TypePath::from("app.Child"));

    let failure = resolve(
        &parent,
        &decls,
        &CompilerOptions::default(),
        &ImplicitBindingCache::new(),
        &NullSink,
    )
    .unwrap_err();
    let duplicate = failure
        .errors
        .iter()
        .find(|e| e.kind == ErrorKind::DuplicateBinding)
        .unwrap();
    assert!(duplicate.message.contains("app.Parent"));
    assert!(duplicate.message.contains("app.Child"));
}

// =============================================================================
// Batch resolution
// =============================================================================

#[test]
fn batch_resolution_preserves_order_and_shares_the_cache() {
    let mut decls = DeclarationSet::new();
    let mut service = InjectableDecl::new("app.Service");
    service.constructors.push(ConstructorDecl {
        injectable: true,
        scope: None,
        params: Vec::new(),
    });
    decls.add_injectable(service);

    let good = component(
        "app.Good",
        &[],
        vec![entry("service", TypeRef::named("app.Service"))],
    );
    let bad = component(
        "app.Bad",
        &[],
        vec![entry("gone", TypeRef::named("app.Gone"))],
    );
    let also_good = component(
        "app.AlsoGood",
        &[],
        vec![entry("service", TypeRef::named("app.Service"))],
    );

    let cache = ImplicitBindingCache::new();
    let sink = CollectingSink::new();
    let results = resolve_batch(
        &[good, bad, also_good],
        &decls,
        &CompilerOptions::default(),
        &cache,
        &sink,
    );
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    // One derivation of app.Service serves both components.
    assert_eq!(cache.len(), 1);
    assert!(sink
        .findings()
        .iter()
        .any(|f| f.kind == ErrorKind::MissingBinding));
}
