//! Key canonicalization.
//!
//! A [`Key`] is the canonical identity of a requested type in the binding
//! graph: a [`TypeRef`], an optional [`Qualifier`], and a
//! [`ContributionKind`] tag. Canonicalization is a total, side-effect-free
//! function: structurally equal inputs always produce keys that compare
//! equal and hash identically. Malformed qualifiers are rejected upstream by
//! the descriptor extractors, never here.
//!
//! Multibinding contributions carry element-form keys (the contributed
//! element type tagged `SetElement`/`MapEntry`); the aggregated collection
//! they contribute to is identified by a separate `Unique` key over
//! `Set<T>`/`Map<K, V>`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::TypeRef;

/// Discriminator distinguishing otherwise identical type bindings.
///
/// Equality is structural over name and value, so `@Named("prod")` and
/// `@Named("prod")` written in two modules refer to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qualifier {
    /// Qualifier annotation name, e.g. `Named`.
    pub name: String,
    /// Optional literal value, e.g. `"prod"`.
    pub value: Option<String>,
}

impl Qualifier {
    /// A qualifier with no value, e.g. `@Blue`.
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// A qualifier with a literal value, e.g. `@Named("prod")`.
    pub fn valued(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}(\"{}\")", self.name, value),
            None => write!(f, "@{}", self.name),
        }
    }
}

/// How a key participates in multibinding aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContributionKind {
    /// An ordinary, uniquely bound key.
    #[default]
    Unique,
    /// An element contributed to a set multibinding.
    SetElement,
    /// An entry contributed to a map multibinding.
    MapEntry,
}

/// Canonical identity of a requested type in the dependency graph.
///
/// Immutable; equality and hashing are structural. Two requests referring to
/// the same type and qualifier always resolve to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// The requested type.
    pub ty: TypeRef,
    /// Optional qualifier discriminator.
    pub qualifier: Option<Qualifier>,
    /// Multibinding contribution tag.
    pub contribution: ContributionKind,
}

impl Key {
    /// Canonicalize a (type, qualifier, contribution-kind) triple.
    ///
    /// Total function: no side effects, no failure modes.
    pub fn canonicalize(
        ty: TypeRef,
        qualifier: Option<Qualifier>,
        contribution: ContributionKind,
    ) -> Self {
        Self {
            ty,
            qualifier,
            contribution,
        }
    }

    /// An unqualified, uniquely bound key.
    pub fn unique(ty: TypeRef) -> Self {
        Self::canonicalize(ty, None, ContributionKind::Unique)
    }

    /// A qualified, uniquely bound key.
    pub fn qualified(ty: TypeRef, qualifier: Qualifier) -> Self {
        Self::canonicalize(ty, Some(qualifier), ContributionKind::Unique)
    }

    /// The element-form key of a set contribution.
    pub fn set_element(element: TypeRef, qualifier: Option<Qualifier>) -> Self {
        Self::canonicalize(element, qualifier, ContributionKind::SetElement)
    }

    /// The entry-form key of a map contribution.
    pub fn map_entry(value: TypeRef, qualifier: Option<Qualifier>) -> Self {
        Self::canonicalize(value, qualifier, ContributionKind::MapEntry)
    }

    /// A copy of this key with a different type, keeping qualifier and tag.
    pub fn with_type(&self, ty: TypeRef) -> Self {
        Self::canonicalize(ty, self.qualifier.clone(), self.contribution)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = &self.qualifier {
            write!(f, "{q} ")?;
        }
        write!(f, "{}", self.ty)?;
        match self.contribution {
            ContributionKind::Unique => Ok(()),
            ContributionKind::SetElement => write!(f, " (set element)"),
            ContributionKind::MapEntry => write!(f, " (map entry)"),
        }
    }
}
