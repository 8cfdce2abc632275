//! Module descriptor extraction.
//!
//! Turns a raw [`ModuleDecl`] into an immutable [`ModuleDescriptor`]:
//! every binding-contributing member becomes a canonicalized
//! [`BindingDeclaration`]. Extraction is deterministic and preserves
//! declaration order via ordinals (multibinding element order depends on
//! it).
//!
//! A structurally invalid member is reported as
//! [`ErrorKind::MalformedDeclaration`] and skipped; extraction continues
//! with the remaining members so one bad binding does not abort the whole
//! module.

use weaver_model::decl::{
    ContributionAnnotation, InjectionPoint, MemberKind, ModuleDecl, ModuleMember,
};
use weaver_model::error::{ErrorKind, ResolveError};
use weaver_model::foundation::{Origin, TypePath, TypeRef};
use weaver_model::key::{ContributionKind, Key, Qualifier};
use weaver_model::options::CompilerOptions;
use weaver_model::request::DependencyRequest;

use crate::resolve::declarations::{
    BindingDeclaration, ContributionDeclaration, DelegateDeclaration, MultibindsDeclaration,
    OptionalOfDeclaration, ProvisionDeclaration,
};
use crate::resolve::requests::build_request;

/// A module's extracted binding declarations plus the subcomponents it
/// installs. Immutable after extraction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModuleDescriptor {
    pub ty: TypePath,
    /// Declarations in source order.
    pub declarations: Vec<BindingDeclaration>,
    pub subcomponents: Vec<TypePath>,
}

/// Extracts a module descriptor.
///
/// `ordinal` is the component-wide declaration counter; it keeps element
/// order stable across the flattened module list.
pub fn extract_module(
    decl: &ModuleDecl,
    options: &CompilerOptions,
    ordinal: &mut usize,
) -> (ModuleDescriptor, Vec<ResolveError>) {
    let mut declarations = Vec::new();
    let mut errors = Vec::new();

    for member in &decl.members {
        let origin = Origin::of_member(decl.ty.clone(), member.name.clone());
        if let Some(extracted) =
            extract_member(decl, member, origin, options, ordinal, &mut errors)
        {
            declarations.push(extracted);
        }
    }

    (
        ModuleDescriptor {
            ty: decl.ty.clone(),
            declarations,
            subcomponents: decl.subcomponents.clone(),
        },
        errors,
    )
}

fn extract_member(
    module: &ModuleDecl,
    member: &ModuleMember,
    origin: Origin,
    options: &CompilerOptions,
    ordinal: &mut usize,
    errors: &mut Vec<ResolveError>,
) -> Option<BindingDeclaration> {
    match &member.kind {
        MemberKind::Provides {
            ret,
            qualifier,
            scope,
            contribution,
            map_key,
            nullable,
            is_static,
            is_private,
            params,
        } => {
            let Some(ret) = ret else {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin,
                    format!(
                        "provider method '{}' on {} has no meaningful return key",
                        member.name, module.ty
                    ),
                ));
                return None;
            };

            report_member_visibility(*is_private, *is_static, &origin, options, errors);

            let dependencies = build_params(params, options, errors)?;

            let declaration = match classify_contribution(
                contribution,
                map_key.clone(),
                ret,
                qualifier,
                &origin,
                errors,
            )? {
                ContributionTarget::Unique(key) => {
                    BindingDeclaration::Provision(ProvisionDeclaration {
                        key,
                        scope: scope.clone(),
                        nullable: *nullable,
                        dependencies,
                        origin,
                        ordinal: *ordinal,
                    })
                }
                ContributionTarget::Collection {
                    collection_key,
                    element_key,
                    map_key,
                } => BindingDeclaration::Contribution(ContributionDeclaration {
                    collection_key,
                    element_key,
                    map_key,
                    dependencies,
                    origin,
                    ordinal: *ordinal,
                }),
            };
            *ordinal += 1;
            Some(declaration)
        }

        MemberKind::Binds {
            ret,
            qualifier,
            scope,
            contribution,
            map_key,
            source,
        } => {
            let Some(ret) = ret else {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin,
                    format!(
                        "delegate declaration '{}' on {} has no meaningful return key",
                        member.name, module.ty
                    ),
                ));
                return None;
            };

            let source = match build_request(source, options) {
                Ok(request) => request,
                Err(err) => {
                    errors.push(err);
                    return None;
                }
            };

            let declaration = match classify_contribution(
                contribution,
                map_key.clone(),
                ret,
                qualifier,
                &origin,
                errors,
            )? {
                ContributionTarget::Unique(key) => {
                    BindingDeclaration::Delegate(DelegateDeclaration {
                        key,
                        source,
                        scope: scope.clone(),
                        origin,
                        ordinal: *ordinal,
                    })
                }
                ContributionTarget::Collection {
                    collection_key,
                    element_key,
                    map_key,
                } => BindingDeclaration::Contribution(ContributionDeclaration {
                    collection_key,
                    element_key,
                    map_key,
                    dependencies: vec![source],
                    origin,
                    ordinal: *ordinal,
                }),
            };
            *ordinal += 1;
            Some(declaration)
        }

        MemberKind::BindsOptionalOf { ty, qualifier } => {
            if ty.is_framework_wrapper() {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin,
                    format!("optional-binding declaration cannot target framework type {ty}"),
                ));
                return None;
            }
            let underlying =
                Key::canonicalize(ty.clone(), qualifier.clone(), ContributionKind::Unique);
            let key = Key::canonicalize(
                TypeRef::optional_of(ty.clone()),
                qualifier.clone(),
                ContributionKind::Unique,
            );
            let declaration = BindingDeclaration::OptionalOf(OptionalOfDeclaration {
                key,
                underlying,
                origin,
                ordinal: *ordinal,
            });
            *ordinal += 1;
            Some(declaration)
        }

        MemberKind::Multibinds { ty, qualifier } => {
            if !ty.is_collection() {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin,
                    format!("multibinds declaration must target Set or Map, found {ty}"),
                ));
                return None;
            }
            let key = Key::canonicalize(ty.clone(), qualifier.clone(), ContributionKind::Unique);
            let declaration = BindingDeclaration::Multibinds(MultibindsDeclaration {
                key,
                origin,
                ordinal: *ordinal,
            });
            *ordinal += 1;
            Some(declaration)
        }
    }
}

/// Where a provider/delegate member directs its result.
enum ContributionTarget {
    Unique(Key),
    Collection {
        collection_key: Key,
        element_key: Key,
        map_key: Option<weaver_model::decl::MapKey>,
    },
}

fn classify_contribution(
    contribution: &Option<ContributionAnnotation>,
    map_key: Option<weaver_model::decl::MapKey>,
    ret: &TypeRef,
    qualifier: &Option<Qualifier>,
    origin: &Origin,
    errors: &mut Vec<ResolveError>,
) -> Option<ContributionTarget> {
    match contribution {
        None => {
            if map_key.is_some() {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin.clone(),
                    "map key on a declaration that is not a map contribution".to_string(),
                ));
                return None;
            }
            Some(ContributionTarget::Unique(Key::canonicalize(
                ret.clone(),
                qualifier.clone(),
                ContributionKind::Unique,
            )))
        }
        Some(ContributionAnnotation::IntoSet) => {
            if map_key.is_some() {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin.clone(),
                    "map key on a set contribution".to_string(),
                ));
                return None;
            }
            Some(ContributionTarget::Collection {
                collection_key: Key::canonicalize(
                    TypeRef::set_of(ret.clone()),
                    qualifier.clone(),
                    ContributionKind::Unique,
                ),
                element_key: Key::set_element(ret.clone(), qualifier.clone()),
                map_key: None,
            })
        }
        Some(ContributionAnnotation::IntoMap) => {
            let Some(map_key) = map_key else {
                errors.push(ResolveError::new(
                    ErrorKind::MalformedDeclaration,
                    origin.clone(),
                    "map contribution is missing a map key".to_string(),
                ));
                return None;
            };
            Some(ContributionTarget::Collection {
                collection_key: Key::canonicalize(
                    TypeRef::map_of(map_key.key_type(), ret.clone()),
                    qualifier.clone(),
                    ContributionKind::Unique,
                ),
                element_key: Key::map_entry(ret.clone(), qualifier.clone()),
                map_key: Some(map_key),
            })
        }
    }
}

fn build_params(
    params: &[InjectionPoint],
    options: &CompilerOptions,
    errors: &mut Vec<ResolveError>,
) -> Option<Vec<DependencyRequest>> {
    let mut requests = Vec::with_capacity(params.len());
    let mut failed = false;
    for param in params {
        match build_request(param, options) {
            Ok(request) => requests.push(request),
            Err(err) => {
                errors.push(err);
                failed = true;
            }
        }
    }
    if failed {
        None
    } else {
        Some(requests)
    }
}

fn report_member_visibility(
    is_private: bool,
    is_static: bool,
    origin: &Origin,
    options: &CompilerOptions,
    errors: &mut Vec<ResolveError>,
) {
    if options.ignore_private_and_static_injection {
        return;
    }
    if is_private {
        errors.push(ResolveError::with_severity(
            ErrorKind::MalformedDeclaration,
            options.private_members,
            origin.clone(),
            "provider member is private".to_string(),
        ));
    }
    if is_static {
        errors.push(ResolveError::with_severity(
            ErrorKind::MalformedDeclaration,
            options.static_members,
            origin.clone(),
            "provider member is static".to_string(),
        ));
    }
}
