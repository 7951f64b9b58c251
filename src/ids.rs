//! Newtype key for priced items.
//!
//! The ledger never interprets the reference; it is an opaque key
//! supplied by the catalog and matched by equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a priced catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef(String);

impl ProductRef {
    /// Create a reference from a string key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
