//! Ordered ownership levels.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How strongly a permission is held.
///
/// Levels are totally ordered by declaration order. A holder at a given level
/// implicitly holds every lesser level on the same scope. New levels must be
/// declared before [`OwnershipLevel::Owner`], which stays the unique maximum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum OwnershipLevel {
    /// May use the grant but not delegate it.
    #[default]
    #[serde(rename = "Lender")]
    #[strum(serialize = "Lender")]
    Lender,

    /// May use and delegate the grant.
    #[serde(rename = "Owner")]
    #[strum(serialize = "Owner")]
    Owner,
}

impl OwnershipLevel {
    /// The highest level, required to delegate anything.
    pub const MAX: Self = Self::Owner;

    /// Returns whether this is the delegation level.
    #[inline]
    pub fn is_owner(self) -> bool {
        self == Self::MAX
    }

    /// Returns whether holding `self` satisfies a request at `requested`.
    #[inline]
    pub fn implies(self, requested: Self) -> bool {
        self >= requested
    }
}
