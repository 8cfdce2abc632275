//! Raw declarations supplied by the external front end.
//!
//! The resolver never parses source text. An external front end turns
//! annotated source into the declaration objects in this module and
//! registers them in a [`DeclarationSet`]; resolution then runs over the
//! fully materialized set with no further I/O.
//!
//! Declarations here are deliberately close to the source shape (a provider
//! method with its parameter list, a component with its module list). The
//! extraction passes in `weaver-resolve` turn them into immutable
//! descriptors with canonicalized keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::{Origin, TypePath, TypeRef};
use crate::key::Qualifier;

/// A lifetime/caching domain a binding may be pinned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope(pub String);

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Literal key of a map multibinding entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapKey {
    /// String-keyed entry.
    Str(String),
    /// Integer-keyed entry.
    Int(i64),
    /// Class-literal-keyed entry.
    Class(TypePath),
}

impl MapKey {
    /// The canonical key type of the aggregated map for this literal kind.
    ///
    /// Consumers request `Map<std.String, V>` etc., so contributions must
    /// aggregate under the same canonical key type.
    pub fn key_type(&self) -> TypeRef {
        match self {
            Self::Str(_) => TypeRef::named("std.String"),
            Self::Int(_) => TypeRef::named("std.Int"),
            Self::Class(_) => TypeRef::named("std.Class"),
        }
    }
}

impl std::fmt::Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Int(i) => write!(f, "{i}"),
            Self::Class(p) => write!(f, "{p}.class"),
        }
    }
}

/// An injection point: a constructor/provider parameter, an injected field,
/// or a component entry point, as declared in source.
///
/// The declared type may still carry a framework wrapper (`Provider<T>`,
/// `Lazy<T>`, …); the request builder unwraps it into a
/// [`DependencyRequest`].
///
/// [`DependencyRequest`]: crate::request::DependencyRequest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPoint {
    /// Declared (possibly wrapper) type.
    pub ty: TypeRef,
    /// Optional qualifier on the injection point.
    pub qualifier: Option<Qualifier>,
    /// Whether the point is annotated nullable.
    pub nullable: bool,
    /// The declaring site.
    pub origin: Origin,
}

impl InjectionPoint {
    pub fn new(ty: TypeRef, origin: Origin) -> Self {
        Self {
            ty,
            qualifier: None,
            nullable: false,
            origin,
        }
    }

    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Multibinding contribution annotation on a module member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionAnnotation {
    /// `@IntoSet` — contributes one element to a set.
    IntoSet,
    /// `@IntoMap` — contributes one entry to a map (requires a map key).
    IntoMap,
}

/// A binding-contributing member of a module declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMember {
    /// Member name within the module.
    pub name: String,
    /// What this member declares.
    pub kind: MemberKind,
}

/// The kinds of binding-contributing module members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    /// A provider method: explicitly constructs its return key.
    Provides {
        /// Returned type; `None` is a malformed declaration (no meaningful
        /// return key) and is rejected by extraction.
        ret: Option<TypeRef>,
        qualifier: Option<Qualifier>,
        scope: Option<Scope>,
        contribution: Option<ContributionAnnotation>,
        map_key: Option<MapKey>,
        nullable: bool,
        is_static: bool,
        is_private: bool,
        params: Vec<InjectionPoint>,
    },
    /// A delegate/alias declaration: the returned key is satisfied by the
    /// single parameter's key.
    Binds {
        ret: Option<TypeRef>,
        qualifier: Option<Qualifier>,
        scope: Option<Scope>,
        contribution: Option<ContributionAnnotation>,
        map_key: Option<MapKey>,
        source: InjectionPoint,
    },
    /// Declares that `Optional<T>` may be injected, present when `T` is
    /// independently bound somewhere in scope.
    BindsOptionalOf {
        ty: TypeRef,
        qualifier: Option<Qualifier>,
    },
    /// Declares a set/map multibinding that may have zero contributions.
    Multibinds {
        /// Must be `Set<T>` or `Map<K, V>`.
        ty: TypeRef,
        qualifier: Option<Qualifier>,
    },
}

/// A module declaration: a named set of binding-contributing members plus
/// the modules it includes and the subcomponents it installs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub ty: TypePath,
    /// Included modules, flattened transitively during extraction.
    pub includes: Vec<TypePath>,
    /// Subcomponents installed by this module.
    pub subcomponents: Vec<TypePath>,
    pub members: Vec<ModuleMember>,
}

impl ModuleDecl {
    pub fn new(ty: impl Into<TypePath>) -> Self {
        Self {
            ty: ty.into(),
            includes: Vec::new(),
            subcomponents: Vec::new(),
            members: Vec::new(),
        }
    }
}

/// An entry point a component exposes to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Accessor name on the component.
    pub name: String,
    /// The exposed injection point.
    pub point: InjectionPoint,
    /// True for `inject(Foo)`-style members-injection entry points.
    pub members_injection: bool,
}

/// A component declaration: entry points, module list, declared
/// subcomponents, and scope annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDecl {
    pub ty: TypePath,
    pub modules: Vec<TypePath>,
    pub entry_points: Vec<EntryPoint>,
    /// Subcomponents declared directly on the component (module-installed
    /// subcomponents are discovered through the module descriptors).
    pub subcomponents: Vec<TypePath>,
    /// The scope set applicable to this component.
    pub scopes: Vec<Scope>,
    /// True for production (asynchronous) components.
    pub is_production: bool,
}

impl ComponentDecl {
    pub fn new(ty: impl Into<TypePath>) -> Self {
        Self {
            ty: ty.into(),
            modules: Vec::new(),
            entry_points: Vec::new(),
            subcomponents: Vec::new(),
            scopes: Vec::new(),
            is_production: false,
        }
    }
}

/// A constructor of an injectable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    /// Whether the constructor is annotated for injection.
    pub injectable: bool,
    /// Scope annotation on the type, carried by its injectable constructor.
    pub scope: Option<Scope>,
    pub params: Vec<InjectionPoint>,
}

/// A type eligible (or not) for implicit constructor injection, plus its
/// member-injection sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectableDecl {
    pub ty: TypePath,
    /// Abstract types cannot be instantiated implicitly.
    pub is_abstract: bool,
    pub constructors: Vec<ConstructorDecl>,
    /// Injected fields/methods, used by members-injection bindings.
    pub members: Vec<InjectionPoint>,
}

impl InjectableDecl {
    pub fn new(ty: impl Into<TypePath>) -> Self {
        Self {
            ty: ty.into(),
            is_abstract: false,
            constructors: Vec::new(),
            members: Vec::new(),
        }
    }
}

/// The fully materialized declaration world resolution runs over.
///
/// Lookup tables only; no resolution state lives here. The set is immutable
/// during resolution and may be shared across components resolved in
/// parallel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationSet {
    modules: HashMap<TypePath, ModuleDecl>,
    components: HashMap<TypePath, ComponentDecl>,
    injectables: HashMap<TypePath, InjectableDecl>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: ModuleDecl) {
        self.modules.insert(module.ty.clone(), module);
    }

    pub fn add_component(&mut self, component: ComponentDecl) {
        self.components.insert(component.ty.clone(), component);
    }

    pub fn add_injectable(&mut self, injectable: InjectableDecl) {
        self.injectables.insert(injectable.ty.clone(), injectable);
    }

    pub fn module(&self, ty: &TypePath) -> Option<&ModuleDecl> {
        self.modules.get(ty)
    }

    pub fn component(&self, ty: &TypePath) -> Option<&ComponentDecl> {
        self.components.get(ty)
    }

    pub fn injectable(&self, ty: &TypePath) -> Option<&InjectableDecl> {
        self.injectables.get(ty)
    }
}
