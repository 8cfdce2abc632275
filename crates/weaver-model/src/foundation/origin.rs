//! Declaring-site references for diagnostics.
//!
//! The resolver consumes already-extracted declarations, so there is no
//! source text to point into. Diagnostics instead reference the declaring
//! type and member: `app.NetworkModule#provideClient`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::TypePath;

/// Reference to the declaration site a diagnostic or binding came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// The declaring module, component, or injectable type.
    pub ty: Option<TypePath>,
    /// The declaring member (provider method, constructor, entry point).
    pub member: Option<String>,
}

impl Origin {
    /// An origin with no known declaration site.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// An origin pointing at a type declaration itself.
    pub fn of_type(ty: impl Into<TypePath>) -> Self {
        Self {
            ty: Some(ty.into()),
            member: None,
        }
    }

    /// An origin pointing at a member of a type.
    pub fn of_member(ty: impl Into<TypePath>, member: impl Into<String>) -> Self {
        Self {
            ty: Some(ty.into()),
            member: Some(member.into()),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.ty, &self.member) {
            (Some(ty), Some(member)) => write!(f, "{ty}#{member}"),
            (Some(ty), None) => write!(f, "{ty}"),
            (None, Some(member)) => write!(f, "#{member}"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(
            Origin::of_member("app.NetModule", "provideClient").to_string(),
            "app.NetModule#provideClient"
        );
        assert_eq!(Origin::of_type("app.AppComponent").to_string(), "app.AppComponent");
        assert_eq!(Origin::unknown().to_string(), "<unknown>");
    }
}
