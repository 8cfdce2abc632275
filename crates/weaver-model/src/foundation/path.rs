//! Type-path representation for namespaced type identities.
//!
//! Paths are dot-separated identifiers naming a declared type:
//! - `app.http.RequestHandler`
//! - `runtime.Provider`
//! - `collections.Set`
//!
//! The resolver uses `TypePath` extensively as lookup identity into the
//! declaration set and as the structural backbone of [`Key`] equality.
//!
//! [`Key`]: crate::key::Key

use std::fmt;

use serde::{Deserialize, Serialize};

/// A hierarchical path naming a declared type.
///
/// Paths are immutable and support efficient comparison and hashing.
/// They are used as keys in the declaration set and inside [`TypeRef`].
///
/// # Examples
///
/// ```
/// # use weaver_model::foundation::TypePath;
/// let path = TypePath::from("app.http.RequestHandler");
/// assert_eq!(path.segments(), &["app", "http", "RequestHandler"]);
/// assert_eq!(path.to_string(), "app.http.RequestHandler");
/// ```
///
/// [`TypeRef`]: crate::foundation::TypeRef
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypePath {
    segments: Vec<String>,
}

impl TypePath {
    /// Create a new path from a vector of segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a path from a dot-separated string.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s.split('.').map(String::from).collect(),
        }
    }

    /// Get the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the last segment (the simple type name).
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Get the enclosing namespace (all segments except the last).
    ///
    /// Returns None if this is a single-segment path.
    pub fn namespace(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Self::new(self.segments[..self.segments.len() - 1].to_vec()))
        }
    }

    /// Append a segment to create a new path.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::new(segments)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for TypePath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for TypePath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}
