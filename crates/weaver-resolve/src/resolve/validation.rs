//! Whole-graph validation.
//!
//! Runs after resolution over the finished (possibly partial) graph tree.
//! Three checks:
//!
//! - **Scope**: every scoped binding must be scoped to one of the scopes of
//!   the component that owns it. Strictness follows
//!   [`CompilerOptions::scope_validation`]; a conflict on a binding whose
//!   declaring type is not one of the component's own modules is downgraded
//!   to [`CompilerOptions::cross_module_scope`].
//! - **Nullability**: a nullable binding consumed by a non-nullable direct
//!   instance request is a conflict at
//!   [`CompilerOptions::nullability`] severity. Deferred and optional
//!   requests tolerate nullable producers.
//! - **Integrity**: every edge target must be accounted for somewhere in
//!   the graph tree (a local node, an inherited key, a recorded failure, or
//!   an ancestor's node). A hole here is an internal resolver fault, never
//!   a user error.

use weaver_model::error::{ErrorKind, ResolveError, Severity};
use weaver_model::options::{CompilerOptions, ValidationLevel};
use weaver_model::request::RequestKind;

use crate::resolve::extract::ComponentDescriptor;
use crate::resolve::graph::BindingGraph;

/// Validates a resolved graph tree against its descriptor tree.
pub fn validate_graph(
    graph: &BindingGraph,
    descriptor: &ComponentDescriptor,
    options: &CompilerOptions,
) -> Vec<ResolveError> {
    let mut findings = Vec::new();
    let mut ancestors = Vec::new();
    validate_inner(graph, Some(descriptor), options, &mut ancestors, &mut findings);
    findings
}

fn validate_inner<'g>(
    graph: &'g BindingGraph,
    descriptor: Option<&ComponentDescriptor>,
    options: &CompilerOptions,
    ancestors: &mut Vec<&'g BindingGraph>,
    findings: &mut Vec<ResolveError>,
) {
    check_scopes(graph, descriptor, options, findings);
    check_nullability(graph, options, findings);
    check_integrity(graph, ancestors, findings);

    ancestors.push(graph);
    for (index, sub) in graph.subgraphs.iter().enumerate() {
        let sub_descriptor = descriptor.and_then(|d| d.subcomponents.get(index));
        validate_inner(sub, sub_descriptor, options, ancestors, findings);
    }
    ancestors.pop();
}

fn check_scopes(
    graph: &BindingGraph,
    descriptor: Option<&ComponentDescriptor>,
    options: &CompilerOptions,
    findings: &mut Vec<ResolveError>,
) {
    let base = match options.scope_validation {
        ValidationLevel::None => return,
        ValidationLevel::Warning => Severity::Warning,
        ValidationLevel::Error => Severity::Error,
    };
    let own_modules = descriptor.map(ComponentDescriptor::module_types);

    for binding in graph.nodes.values() {
        let Some(scope) = &binding.scope else {
            continue;
        };
        if graph.scopes.contains(scope) {
            continue;
        }
        let cross_module = match (&own_modules, &binding.origin.ty) {
            (Some(modules), Some(ty)) => !modules.contains(ty),
            _ => true,
        };
        let severity = if cross_module {
            options.cross_module_scope
        } else {
            base
        };
        let declared = if graph.scopes.is_empty() {
            "declares no scopes".to_string()
        } else {
            let names: Vec<&str> = graph.scopes.iter().map(|s| s.0.as_str()).collect();
            format!("declares scopes [{}]", names.join(", "))
        };
        findings.push(ResolveError::with_severity(
            ErrorKind::ScopeMismatch,
            severity,
            binding.origin.clone(),
            format!(
                "{} is scoped @{} but component {} {declared}",
                binding.key, scope.0, graph.component
            ),
        ));
    }
}

fn check_nullability(
    graph: &BindingGraph,
    options: &CompilerOptions,
    findings: &mut Vec<ResolveError>,
) {
    for edge in &graph.edges {
        if edge.request.nullable || edge.request.kind != RequestKind::Instance {
            continue;
        }
        let Some(binding) = graph.nodes.get(&edge.request.key) else {
            continue;
        };
        if !binding.nullable {
            continue;
        }
        findings.push(
            ResolveError::with_severity(
                ErrorKind::Nullability,
                options.nullability,
                edge.request.origin.clone(),
                format!(
                    "{} is nullable but is injected at a non-nullable site",
                    edge.request.key
                ),
            )
            .with_note(format!("nullable binding declared at {}", binding.origin)),
        );
    }
}

fn check_integrity(
    graph: &BindingGraph,
    ancestors: &[&BindingGraph],
    findings: &mut Vec<ResolveError>,
) {
    for edge in &graph.edges {
        let target = &edge.request.key;
        if graph.accounts_for(target)
            || ancestors.iter().any(|g| g.nodes.contains_key(target))
        {
            continue;
        }
        findings.push(ResolveError::new(
            ErrorKind::Internal,
            edge.request.origin.clone(),
            format!("edge target {target} has no node, inherited owner, or failure record"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use weaver_model::decl::Scope;
    use weaver_model::foundation::{Origin, TypePath, TypeRef};
    use weaver_model::key::Key;
    use weaver_model::request::DependencyRequest;

    use crate::resolve::binding::{Binding, BindingKind};
    use crate::resolve::graph::Edge;

    fn graph_with_binding(component: &str, scopes: Vec<Scope>, binding: Binding) -> BindingGraph {
        let mut nodes = IndexMap::new();
        nodes.insert(binding.key.clone(), binding);
        BindingGraph {
            component: TypePath::from(component),
            scopes,
            entry_points: Vec::new(),
            nodes,
            edges: Vec::new(),
            inherited: IndexMap::new(),
            failed: Vec::new(),
            subgraphs: Vec::new(),
        }
    }

    fn scoped_binding(ty: &str, scope: &str, origin: Origin) -> Binding {
        Binding {
            key: Key::unique(TypeRef::named(ty)),
            kind: BindingKind::Provision,
            dependencies: Vec::new(),
            scope: Some(Scope(scope.to_string())),
            nullable: false,
            origin,
        }
    }

    #[test]
    fn foreign_scope_is_a_mismatch() {
        let binding = scoped_binding(
            "app.Db",
            "Singleton",
            Origin::of_member("app.DbModule", "provideDb"),
        );
        let graph = graph_with_binding(
            "app.RequestComponent",
            vec![Scope("PerRequest".to_string())],
            binding,
        );
        let findings = validate_graph(&graph, &descriptor_for(&graph), &CompilerOptions::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ErrorKind::ScopeMismatch);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn scope_pass_can_be_disabled() {
        let binding = scoped_binding(
            "app.Db",
            "Singleton",
            Origin::of_member("app.DbModule", "provideDb"),
        );
        let graph = graph_with_binding("app.C", Vec::new(), binding);
        let options = CompilerOptions {
            scope_validation: ValidationLevel::None,
            ..CompilerOptions::default()
        };
        let findings = validate_graph(&graph, &descriptor_for(&graph), &options);
        assert!(findings.is_empty());
    }

    #[test]
    fn cross_module_scope_conflict_is_downgraded() {
        // Origin type is not one of the component's own modules.
        let binding = scoped_binding(
            "app.Db",
            "Singleton",
            Origin::of_member("lib.ForeignModule", "provideDb"),
        );
        let graph = graph_with_binding("app.C", Vec::new(), binding);
        let findings = validate_graph(&graph, &descriptor_for(&graph), &CompilerOptions::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn nullable_binding_at_non_nullable_site_is_reported() {
        let mut binding = scoped_binding(
            "app.Token",
            "Singleton",
            Origin::of_member("app.AuthModule", "provideToken"),
        );
        binding.scope = None;
        binding.nullable = true;
        let key = binding.key.clone();
        let mut graph = graph_with_binding("app.C", Vec::new(), binding);
        graph.edges.push(Edge {
            source: None,
            request: DependencyRequest::instance(key, Origin::of_member("app.C", "token")),
        });

        let findings = validate_graph(&graph, &descriptor_for(&graph), &CompilerOptions::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ErrorKind::Nullability);
    }

    #[test]
    fn unaccounted_edge_target_is_internal() {
        let binding = scoped_binding(
            "app.Db",
            "S",
            Origin::of_member("app.DbModule", "provideDb"),
        );
        let mut graph = graph_with_binding("app.C", vec![Scope("S".to_string())], binding);
        graph.edges.push(Edge {
            source: None,
            request: DependencyRequest::instance(
                Key::unique(TypeRef::named("app.Ghost")),
                Origin::unknown(),
            ),
        });

        let findings = validate_graph(&graph, &descriptor_for(&graph), &CompilerOptions::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ErrorKind::Internal);
    }

    // A descriptor whose own modules are exactly the app.* module origins
    // used above.
    fn descriptor_for(graph: &BindingGraph) -> ComponentDescriptor {
        use crate::resolve::extract::extract_component;
        use weaver_model::decl::{ComponentDecl, DeclarationSet, MemberKind, ModuleDecl, ModuleMember};

        let mut decls = DeclarationSet::new();
        for module in ["app.DbModule", "app.AuthModule"] {
            let mut decl = ModuleDecl::new(module);
            decl.members.push(ModuleMember {
                name: "provide".to_string(),
                kind: MemberKind::Provides {
                    ret: Some(TypeRef::named("app.Placeholder")),
                    qualifier: None,
                    scope: None,
                    contribution: None,
                    map_key: None,
                    nullable: false,
                    is_static: false,
                    is_private: false,
                    params: Vec::new(),
                },
            });
            decls.add_module(decl);
        }
        let mut component = ComponentDecl::new(graph.component.to_string());
        component.modules.push(TypePath::from("app.DbModule"));
        component.modules.push(TypePath::from("app.AuthModule"));
        let (descriptor, errors) = extract_component(&component, &decls, &CompilerOptions::default());
        assert!(errors.is_empty());
        descriptor
    }
}
