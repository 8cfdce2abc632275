//! Foundation types shared across the resolver.
//!
//! - [`TypePath`] — dot-separated type identity
//! - [`TypeRef`] — type plus generic arguments, structural equality
//! - [`Origin`] — declaring-site reference for diagnostics
//! - [`wk`] — canonical paths of well-known framework types

pub mod origin;
pub mod path;
pub mod typeref;

pub use origin::Origin;
pub use path::TypePath;
pub use typeref::{wk, TypeRef};
