//! Implicit constructor-injection bindings.
//!
//! When no explicit declaration in scope supplies a key, the resolver falls
//! back to the key's type itself: a type with exactly one injectable
//! constructor yields an implicit provision binding whose dependencies are
//! the constructor's parameters.
//!
//! Outcomes are memoized in an [`ImplicitBindingCache`], an explicit,
//! passed-in object rather than ambient state. The cache is append-only and
//! idempotent per key: concurrent first-resolutions derive equivalent
//! entries and the first insert wins, so no lock is held across derivation
//! and a cache hit never re-derives.

use std::collections::HashMap;
use std::sync::RwLock;

use weaver_model::decl::DeclarationSet;
use weaver_model::error::{ErrorKind, ResolveError};
use weaver_model::foundation::Origin;
use weaver_model::key::{ContributionKind, Key};
use weaver_model::options::CompilerOptions;
use weaver_model::request::DependencyRequest;

use crate::resolve::binding::{Binding, BindingKind};
use crate::resolve::requests::build_request;

/// Outcome of an implicit-binding lookup.
#[derive(Debug, Clone)]
pub enum ImplicitResolution {
    /// The type has an injectable constructor; here is its binding.
    Resolved(Binding),
    /// The type is known but cannot be instantiated implicitly.
    NotInjectable(ResolveError),
    /// The type is not in the declaration set at all; the caller decides
    /// whether that is a missing binding.
    NoDeclaration,
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Binding(Binding),
    NotInjectable(ResolveError),
}

/// Shared memo of derived implicit bindings, keyed by key identity.
///
/// Reads and idempotent inserts only; no deletes, no in-place updates. Safe
/// to share across components resolved in parallel.
#[derive(Debug, Default)]
pub struct ImplicitBindingCache {
    entries: RwLock<HashMap<Key, CacheEntry>>,
}

impl ImplicitBindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &Key) -> Option<CacheEntry> {
        self.entries
            .read()
            .ok()
            .and_then(|guard| guard.get(key).cloned())
    }

    /// Inserts unless an equivalent entry is already present; returns the
    /// entry that ended up stored, so racing derivations converge on one
    /// binding.
    fn insert_idempotent(&self, key: Key, entry: CacheEntry) -> CacheEntry {
        match self.entries.write() {
            Ok(mut guard) => guard.entry(key).or_insert(entry).clone(),
            // A poisoned lock means another worker panicked mid-insert;
            // fall back to the freshly derived entry.
            Err(_) => entry,
        }
    }

    /// Number of memoized keys (derived bindings plus negative results).
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lazily resolves keys to implicit constructor-injection bindings.
pub struct ImplicitRegistry<'a> {
    decls: &'a DeclarationSet,
    options: &'a CompilerOptions,
    cache: &'a ImplicitBindingCache,
}

impl<'a> ImplicitRegistry<'a> {
    pub fn new(
        decls: &'a DeclarationSet,
        options: &'a CompilerOptions,
        cache: &'a ImplicitBindingCache,
    ) -> Self {
        Self {
            decls,
            options,
            cache,
        }
    }

    /// Resolves a key to an implicit binding, consulting the cache first.
    ///
    /// Qualified keys, framework wrapper types, multibinding collections,
    /// and contribution-tagged keys never have implicit bindings.
    pub fn resolve(&self, key: &Key) -> ImplicitResolution {
        if key.contribution != ContributionKind::Unique
            || key.qualifier.is_some()
            || key.ty.is_framework_wrapper()
            || key.ty.is_collection()
        {
            return ImplicitResolution::NoDeclaration;
        }

        if let Some(entry) = self.cache.get(key) {
            return entry.into();
        }

        let Some(injectable) = self.decls.injectable(&key.ty.path) else {
            return ImplicitResolution::NoDeclaration;
        };

        let entry = match self.derive(key, injectable) {
            Ok(binding) => CacheEntry::Binding(binding),
            Err(err) => CacheEntry::NotInjectable(err),
        };
        self.cache.insert_idempotent(key.clone(), entry).into()
    }

    /// True if the key would resolve implicitly; used by the optional
    /// binding presence probe. Never reports errors.
    pub fn is_available(&self, key: &Key) -> bool {
        matches!(self.resolve(key), ImplicitResolution::Resolved(_))
    }

    fn derive(
        &self,
        key: &Key,
        injectable: &weaver_model::decl::InjectableDecl,
    ) -> Result<Binding, ResolveError> {
        let origin = Origin::of_member(injectable.ty.clone(), "<init>");

        if injectable.is_abstract {
            return Err(ResolveError::new(
                ErrorKind::NotInjectable,
                origin,
                format!("{} is abstract and cannot be instantiated", injectable.ty),
            ));
        }

        let eligible: Vec<_> = injectable
            .constructors
            .iter()
            .filter(|c| c.injectable)
            .collect();
        let constructor = match eligible.as_slice() {
            [] => {
                return Err(ResolveError::new(
                    ErrorKind::NotInjectable,
                    origin,
                    format!("{} has no injectable constructor", injectable.ty),
                ));
            }
            [one] => *one,
            _ => {
                return Err(ResolveError::new(
                    ErrorKind::NotInjectable,
                    origin,
                    format!(
                        "{} has {} injectable constructors; at most one is allowed",
                        injectable.ty,
                        eligible.len()
                    ),
                ));
            }
        };

        let mut dependencies: Vec<DependencyRequest> =
            Vec::with_capacity(constructor.params.len());
        for param in &constructor.params {
            match build_request(param, self.options) {
                Ok(request) => dependencies.push(request),
                Err(err) => {
                    return Err(ResolveError::new(
                        ErrorKind::NotInjectable,
                        origin.clone(),
                        format!("constructor of {} has an invalid parameter", injectable.ty),
                    )
                    .with_note(err.message));
                }
            }
        }

        Ok(Binding {
            key: key.clone(),
            kind: BindingKind::ConstructorInjection,
            dependencies,
            scope: constructor.scope.clone(),
            nullable: false,
            origin,
        })
    }
}

impl From<CacheEntry> for ImplicitResolution {
    fn from(entry: CacheEntry) -> Self {
        match entry {
            CacheEntry::Binding(binding) => Self::Resolved(binding),
            CacheEntry::NotInjectable(err) => Self::NotInjectable(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_model::decl::{ConstructorDecl, InjectableDecl, InjectionPoint};
    use weaver_model::foundation::TypeRef;

    fn injectable_with_ctor(ty: &str, params: Vec<&str>) -> InjectableDecl {
        let mut decl = InjectableDecl::new(ty);
        decl.constructors.push(ConstructorDecl {
            injectable: true,
            scope: None,
            params: params
                .into_iter()
                .map(|p| InjectionPoint::new(TypeRef::named(p), Origin::unknown()))
                .collect(),
        });
        decl
    }

    #[test]
    fn resolves_injectable_constructor() {
        let mut decls = DeclarationSet::new();
        decls.add_injectable(injectable_with_ctor("app.Service", vec!["app.Database"]));
        let options = CompilerOptions::default();
        let cache = ImplicitBindingCache::new();
        let registry = ImplicitRegistry::new(&decls, &options, &cache);

        let key = Key::unique(TypeRef::named("app.Service"));
        match registry.resolve(&key) {
            ImplicitResolution::Resolved(binding) => {
                assert_eq!(binding.kind, BindingKind::ConstructorInjection);
                assert_eq!(binding.dependencies.len(), 1);
                assert_eq!(
                    binding.dependencies[0].key,
                    Key::unique(TypeRef::named("app.Database"))
                );
            }
            other => panic!("expected resolved binding, got {other:?}"),
        }
    }

    #[test]
    fn abstract_type_is_not_injectable() {
        let mut decls = DeclarationSet::new();
        let mut abstract_decl = injectable_with_ctor("app.Iface", vec![]);
        abstract_decl.is_abstract = true;
        decls.add_injectable(abstract_decl);
        let options = CompilerOptions::default();
        let cache = ImplicitBindingCache::new();
        let registry = ImplicitRegistry::new(&decls, &options, &cache);

        let key = Key::unique(TypeRef::named("app.Iface"));
        match registry.resolve(&key) {
            ImplicitResolution::NotInjectable(err) => {
                assert_eq!(err.kind, ErrorKind::NotInjectable);
            }
            other => panic!("expected not-injectable, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_constructors_are_not_injectable() {
        let mut decls = DeclarationSet::new();
        let mut decl = injectable_with_ctor("app.Service", vec![]);
        decl.constructors.push(ConstructorDecl {
            injectable: true,
            scope: None,
            params: Vec::new(),
        });
        decls.add_injectable(decl);
        let options = CompilerOptions::default();
        let cache = ImplicitBindingCache::new();
        let registry = ImplicitRegistry::new(&decls, &options, &cache);

        let key = Key::unique(TypeRef::named("app.Service"));
        assert!(matches!(
            registry.resolve(&key),
            ImplicitResolution::NotInjectable(_)
        ));
    }

    #[test]
    fn unknown_type_is_no_declaration() {
        let decls = DeclarationSet::new();
        let options = CompilerOptions::default();
        let cache = ImplicitBindingCache::new();
        let registry = ImplicitRegistry::new(&decls, &options, &cache);

        let key = Key::unique(TypeRef::named("app.Nope"));
        assert!(matches!(
            registry.resolve(&key),
            ImplicitResolution::NoDeclaration
        ));
        // Negative lookups for unknown types are not cached.
        assert!(cache.is_empty());
    }

    #[test]
    fn qualified_keys_never_resolve_implicitly() {
        let mut decls = DeclarationSet::new();
        decls.add_injectable(injectable_with_ctor("app.Service", vec![]));
        let options = CompilerOptions::default();
        let cache = ImplicitBindingCache::new();
        let registry = ImplicitRegistry::new(&decls, &options, &cache);

        let key = Key::qualified(
            TypeRef::named("app.Service"),
            weaver_model::key::Qualifier::marker("Blue"),
        );
        assert!(matches!(
            registry.resolve(&key),
            ImplicitResolution::NoDeclaration
        ));
    }

    #[test]
    fn cache_hit_never_rederives() {
        let mut decls = DeclarationSet::new();
        decls.add_injectable(injectable_with_ctor("app.Service", vec![]));
        let options = CompilerOptions::default();
        let cache = ImplicitBindingCache::new();
        let registry = ImplicitRegistry::new(&decls, &options, &cache);

        let key = Key::unique(TypeRef::named("app.Service"));
        let first = registry.resolve(&key);
        assert_eq!(cache.len(), 1);
        let second = registry.resolve(&key);
        assert_eq!(cache.len(), 1);
        match (first, second) {
            (ImplicitResolution::Resolved(a), ImplicitResolution::Resolved(b)) => {
                assert_eq!(a, b);
            }
            other => panic!("expected two resolved bindings, got {other:?}"),
        }
    }
}
