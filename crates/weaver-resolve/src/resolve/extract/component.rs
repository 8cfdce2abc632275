//! Component descriptor extraction.
//!
//! Turns a raw [`ComponentDecl`] into an immutable [`ComponentDescriptor`]:
//! entry-point requests, the transitively included module descriptors, and
//! the declared subcomponent tree.
//!
//! # Flattening
//!
//! Includes-of-includes are flattened by a depth-first traversal that
//! de-duplicates module occurrences by module identity, not inclusion path,
//! so a diamond-included module contributes its bindings exactly once and a
//! module including itself is handled by de-duplication rather than error.
//!
//! # Descriptor tree
//!
//! Each descriptor owns its subcomponent descriptors by value. The same
//! component type can legitimately appear at multiple tree positions, so
//! descriptors are recomputed per occurrence, never shared. A component
//! nested inside itself is a malformed declaration (the tree would be
//! infinite) and stops recursion.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use weaver_model::decl::{ComponentDecl, DeclarationSet, Scope};
use weaver_model::error::{ErrorKind, ResolveError};
use weaver_model::foundation::{Origin, TypePath, TypeRef};
use weaver_model::key::Key;
use weaver_model::options::CompilerOptions;
use weaver_model::request::{DependencyRequest, RequestKind};

use crate::resolve::declarations::BindingDeclaration;
use crate::resolve::extract::module::{extract_module, ModuleDescriptor};
use crate::resolve::requests::build_request;

/// A named entry-point request exposed by a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointRequest {
    pub name: String,
    pub request: DependencyRequest,
}

/// A component's extracted, immutable descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub ty: TypePath,
    /// The scope set applicable to this component.
    pub scopes: Vec<Scope>,
    pub is_production: bool,
    pub entry_points: Vec<EntryPointRequest>,
    /// Transitively included modules, flattened, identity-deduplicated.
    pub modules: Vec<ModuleDescriptor>,
    /// Declared subcomponents, owned by value.
    pub subcomponents: Vec<ComponentDescriptor>,
}

impl ComponentDescriptor {
    /// All binding declarations of the flattened module list, in stable
    /// declaration order.
    pub fn local_declarations(&self) -> impl Iterator<Item = &BindingDeclaration> {
        self.modules.iter().flat_map(|m| m.declarations.iter())
    }

    /// The identities of this component's own flattened modules.
    pub fn module_types(&self) -> IndexSet<&TypePath> {
        self.modules.iter().map(|m| &m.ty).collect()
    }
}

/// Extracts a component descriptor, recursing into declared subcomponents.
///
/// Extraction never short-circuits: structurally invalid declarations are
/// reported and skipped, and the descriptor covers everything that was
/// valid.
pub fn extract_component(
    decl: &ComponentDecl,
    decls: &DeclarationSet,
    options: &CompilerOptions,
) -> (ComponentDescriptor, Vec<ResolveError>) {
    let mut ancestry = Vec::new();
    extract_component_inner(decl, decls, options, &mut ancestry)
}

fn extract_component_inner(
    decl: &ComponentDecl,
    decls: &DeclarationSet,
    options: &CompilerOptions,
    ancestry: &mut Vec<TypePath>,
) -> (ComponentDescriptor, Vec<ResolveError>) {
    let mut errors = Vec::new();
    let mut ordinal = 0usize;

    // Flatten the transitive module closure, depth-first, deduplicated.
    let mut visited = IndexSet::new();
    let mut modules = Vec::new();
    for module_ty in &decl.modules {
        flatten_module(
            module_ty,
            &decl.ty,
            decls,
            options,
            &mut ordinal,
            &mut visited,
            &mut modules,
            &mut errors,
        );
    }

    // Entry points: the requests this component exposes to callers.
    let mut entry_points = Vec::new();
    for ep in &decl.entry_points {
        let origin = Origin::of_member(decl.ty.clone(), ep.name.clone());
        if ep.members_injection {
            if ep.point.ty.is_framework_wrapper() {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin,
                    format!(
                        "members-injection entry point '{}' cannot target framework type {}",
                        ep.name, ep.point.ty
                    ),
                ));
                continue;
            }
            entry_points.push(EntryPointRequest {
                name: ep.name.clone(),
                request: DependencyRequest {
                    key: Key::unique(TypeRef::members_injector_of(ep.point.ty.clone())),
                    kind: RequestKind::MembersInjection,
                    nullable: false,
                    origin,
                },
            });
            continue;
        }
        match build_request(&ep.point, options) {
            Ok(request) => {
                if request.kind.is_production() && !decl.is_production {
                    errors.push(ResolveError::new(
                        ErrorKind::InvalidRequest,
                        request.origin.clone(),
                        format!(
                            "entry point '{}' is asynchronous but {} is not a production component",
                            ep.name, decl.ty
                        ),
                    ));
                    continue;
                }
                entry_points.push(EntryPointRequest {
                    name: ep.name.clone(),
                    request,
                });
            }
            Err(err) => errors.push(err),
        }
    }

    // Subcomponents declared on the component itself or installed by any
    // flattened module, deduplicated in discovery order.
    let mut subcomponent_types: IndexSet<TypePath> = decl.subcomponents.iter().cloned().collect();
    for module in &modules {
        for sub in &module.subcomponents {
            subcomponent_types.insert(sub.clone());
        }
    }

    ancestry.push(decl.ty.clone());
    let mut subcomponents = Vec::new();
    for sub_ty in subcomponent_types {
        if ancestry.contains(&sub_ty) {
            errors.push(ResolveError::new(
                ErrorKind::MalformedDeclaration,
                Origin::of_type(decl.ty.clone()),
                format!("component {sub_ty} is declared as a subcomponent of itself"),
            ));
            continue;
        }
        let Some(sub_decl) = decls.component(&sub_ty) else {
            errors.push(ResolveError::new(
                ErrorKind::MalformedDeclaration,
                Origin::of_type(decl.ty.clone()),
                format!("unknown subcomponent {sub_ty} declared on {}", decl.ty),
            ));
            continue;
        };
        let (descriptor, mut sub_errors) =
            extract_component_inner(sub_decl, decls, options, ancestry);
        errors.append(&mut sub_errors);
        subcomponents.push(descriptor);
    }
    ancestry.pop();

    (
        ComponentDescriptor {
            ty: decl.ty.clone(),
            scopes: decl.scopes.clone(),
            is_production: decl.is_production,
            entry_points,
            modules,
            subcomponents,
        },
        errors,
    )
}

#[allow(clippy::too_many_arguments)]
fn flatten_module(
    module_ty: &TypePath,
    component_ty: &TypePath,
    decls: &DeclarationSet,
    options: &CompilerOptions,
    ordinal: &mut usize,
    visited: &mut IndexSet<TypePath>,
    out: &mut Vec<ModuleDescriptor>,
    errors: &mut Vec<ResolveError>,
) {
    // Identity-based dedup: diamond and self inclusion contribute once.
    if !visited.insert(module_ty.clone()) {
        return;
    }
    let Some(module) = decls.module(module_ty) else {
        errors.push(ResolveError::new(
            ErrorKind::MalformedDeclaration,
            Origin::of_type(component_ty.clone()),
            format!("unknown module {module_ty} included by {component_ty}"),
        ));
        return;
    };
    let (descriptor, mut module_errors) = extract_module(module, options, ordinal);
    errors.append(&mut module_errors);
    out.push(descriptor);
    for include in &module.includes {
        flatten_module(
            include,
            component_ty,
            decls,
            options,
            ordinal,
            visited,
            out,
            errors,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_model::decl::{EntryPoint, InjectionPoint, MemberKind, ModuleDecl, ModuleMember};

    fn provides(name: &str, ret: &str) -> ModuleMember {
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
                params: Vec::new(),
            },
        }
    }

    fn entry(name: &str, ty: &str) -> EntryPoint {
        EntryPoint {
            name: name.to_string(),
            point: InjectionPoint::new(TypeRef::named(ty), Origin::unknown()),
            members_injection: false,
        }
    }

    #[test]
    fn diamond_inclusion_contributes_once() {
        // shared is included via left and right; it must appear once.
        let mut decls = DeclarationSet::new();
        let mut shared = ModuleDecl::new("app.Shared");
        shared.members.push(provides("provideFoo", "app.Foo"));
        decls.add_module(shared);
        let mut left = ModuleDecl::new("app.Left");
        left.includes.push(TypePath::from("app.Shared"));
        decls.add_module(left);
        let mut right = ModuleDecl::new("app.Right");
        right.includes.push(TypePath::from("app.Shared"));
        decls.add_module(right);

        let mut component = ComponentDecl::new("app.C");
        component.modules.push(TypePath::from("app.Left"));
        component.modules.push(TypePath::from("app.Right"));

        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert!(errors.is_empty());
        let shared_count = descriptor
            .modules
            .iter()
            .filter(|m| m.ty == TypePath::from("app.Shared"))
            .count();
        assert_eq!(shared_count, 1);
        assert_eq!(descriptor.local_declarations().count(), 1);
    }

    #[test]
    fn self_inclusion_is_deduplicated_not_an_error() {
        let mut decls = DeclarationSet::new();
        let mut module = ModuleDecl::new("app.M");
        module.includes.push(TypePath::from("app.M"));
        module.members.push(provides("provideFoo", "app.Foo"));
        decls.add_module(module);

        let mut component = ComponentDecl::new("app.C");
        component.modules.push(TypePath::from("app.M"));

        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert!(errors.is_empty());
        assert_eq!(descriptor.modules.len(), 1);
    }

    #[test]
    fn unknown_module_is_reported_and_skipped() {
        let decls = DeclarationSet::new();
        let mut component = ComponentDecl::new("app.C");
        component.modules.push(TypePath::from("app.Nope"));

        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MalformedDeclaration);
        assert!(descriptor.modules.is_empty());
    }

    #[test]
    fn subcomponents_are_extracted_per_occurrence() {
        let mut decls = DeclarationSet::new();
        decls.add_component(ComponentDecl::new("app.Child"));

        let mut parent = ComponentDecl::new("app.Parent");
        parent.subcomponents.push(TypePath::from("app.Child"));
        parent.entry_points.push(entry("foo", "app.Foo"));

        let (descriptor, _errors) =
            extract_component(&parent, &decls, &CompilerOptions::default());
        assert_eq!(descriptor.subcomponents.len(), 1);
        assert_eq!(descriptor.subcomponents[0].ty, TypePath::from("app.Child"));
    }

    #[test]
    fn self_nested_subcomponent_is_malformed() {
        let mut decls = DeclarationSet::new();
        let mut component = ComponentDecl::new("app.C");
        component.subcomponents.push(TypePath::from("app.C"));
        decls.add_component(component.clone());

        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert!(descriptor.subcomponents.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MalformedDeclaration);
    }

    #[test]
    fn producer_entry_point_requires_production_component() {
        let decls = DeclarationSet::new();
        let mut component = ComponentDecl::new("app.C");
        component.entry_points.push(EntryPoint {
            name: "foo".to_string(),
            point: InjectionPoint::new(
                TypeRef::producer_of(TypeRef::named("app.Foo")),
                Origin::unknown(),
            ),
            members_injection: false,
        });

        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert!(descriptor.entry_points.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::InvalidRequest);

        component.is_production = true;
        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert!(errors.is_empty());
        assert_eq!(descriptor.entry_points[0].request.kind, RequestKind::Producer);
    }

    #[test]
    fn members_injection_entry_point_builds_injector_request() {
        let decls = DeclarationSet::new();
        let mut component = ComponentDecl::new("app.C");
        component.entry_points.push(EntryPoint {
            name: "inject".to_string(),
            point: InjectionPoint::new(TypeRef::named("app.Widget"), Origin::unknown()),
            members_injection: true,
        });

        let (descriptor, errors) =
            extract_component(&component, &decls, &CompilerOptions::default());
        assert!(errors.is_empty());
        let request = &descriptor.entry_points[0].request;
        assert_eq!(request.kind, RequestKind::MembersInjection);
        assert_eq!(
            request.key,
            Key::unique(TypeRef::members_injector_of(TypeRef::named("app.Widget")))
        );
    }
}
