//! Dependency request building.
//!
//! Turns an [`InjectionPoint`] (a constructor parameter, injected field,
//! provider-method parameter, or component entry point) into a
//! [`DependencyRequest`]: the canonical key it wants plus its delivery
//! modifier. At most one framework wrapper is unwrapped; contradictory
//! wrappings are rejected as [`ErrorKind::InvalidRequest`].
//!
//! # What This Pass Does NOT Do
//!
//! - **No resolution** — whether the key is actually bound is the graph
//!   resolver's job
//! - **No qualifier validation** — malformed qualifiers are rejected by the
//!   front end before declarations reach this crate

use weaver_model::decl::InjectionPoint;
use weaver_model::error::{ErrorKind, ResolveError};
use weaver_model::foundation::{wk, TypeRef};
use weaver_model::key::Key;
use weaver_model::options::CompilerOptions;
use weaver_model::request::{DependencyRequest, RequestKind};

/// Builds the dependency request for an injection point.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidRequest`] when the declared type combined
/// with its modifier is contradictory:
/// - a framework wrapper applied to another framework wrapper
///   (`Provider<Lazy<T>>`, `Optional<Optional<T>>`, ...)
/// - a wrapper with the wrong number of type arguments
/// - a producer-family wrapper when producers are disabled
pub fn build_request(
    point: &InjectionPoint,
    options: &CompilerOptions,
) -> Result<DependencyRequest, ResolveError> {
    let (kind, keyed_ty) = match wrapper_kind(&point.ty) {
        Some(kind) => {
            if point.ty.args.len() != 1 {
                return Err(ResolveError::new(
                    ErrorKind::InvalidRequest,
                    point.origin.clone(),
                    format!(
                        "framework type {} expects exactly one type argument, found {}",
                        point.ty.path,
                        point.ty.args.len()
                    ),
                ));
            }
            let inner = &point.ty.args[0];
            if inner.is_framework_wrapper() {
                return Err(ResolveError::new(
                    ErrorKind::InvalidRequest,
                    point.origin.clone(),
                    format!(
                        "{} cannot wrap the framework type {}; nested wrappers are contradictory",
                        point.ty.path, inner.path
                    ),
                ));
            }
            if kind.is_production() && !options.producers_enabled {
                return Err(ResolveError::new(
                    ErrorKind::InvalidRequest,
                    point.origin.clone(),
                    format!(
                        "{} requests are not permitted in this build (producers are disabled)",
                        point.ty.path
                    ),
                ));
            }
            // Optional and members-injection requests keep the full wrapper
            // type in their key; the synthesizer binds those keys directly.
            match kind {
                RequestKind::Optional | RequestKind::MembersInjection => (kind, point.ty.clone()),
                _ => (kind, inner.clone()),
            }
        }
        None => (RequestKind::Instance, point.ty.clone()),
    };

    Ok(DependencyRequest {
        key: Key::canonicalize(keyed_ty, point.qualifier.clone(), Default::default()),
        kind,
        nullable: point.nullable,
        origin: point.origin.clone(),
    })
}

/// Maps a well-known wrapper path to its request kind.
fn wrapper_kind(ty: &TypeRef) -> Option<RequestKind> {
    match ty.path.to_string().as_str() {
        wk::PROVIDER => Some(RequestKind::Provider),
        wk::LAZY => Some(RequestKind::Lazy),
        wk::PRODUCER => Some(RequestKind::Producer),
        wk::FUTURE => Some(RequestKind::Future),
        wk::OPTIONAL => Some(RequestKind::Optional),
        wk::MEMBERS_INJECTOR => Some(RequestKind::MembersInjection),
        _ => None,
    }
}
