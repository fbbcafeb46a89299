//! Hierarchical resource paths.

use derive_more::{AsRef, Deref, Display};
use serde::{Deserialize, Serialize};

/// A `/`-delimited resource path, or the `*` wildcard.
///
/// Paths are case-sensitive and compared segment-wise: `dc/region` covers
/// `dc/region/zone1` but not `dc/region2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, AsRef, Deref, Display)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(transparent)]
#[as_ref(forward)]
pub struct Resource(String);

impl Resource {
    /// Matches every resource.
    pub const WILDCARD: &'static str = "*";

    /// Separator between path segments.
    pub const DELIMITER: char = '/';

    /// Creates a new resource from its string form.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Creates the wildcard resource.
    pub fn wildcard() -> Self {
        Self(Self::WILDCARD.to_owned())
    }

    /// Returns whether this is the wildcard resource.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    /// Returns the resource path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether a grant on `self` extends to `requested`.
    pub fn covers(&self, requested: &Resource) -> bool {
        if self.is_wildcard() {
            return true;
        }

        match requested.0.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(Self::DELIMITER),
            None => false,
        }
    }
}

impl From<&str> for Resource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Resource {
    fn from(value: String) -> Self {
        Self(value)
    }
}
