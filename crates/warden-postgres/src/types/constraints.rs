//! Database constraint violations organized by table.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Categories of database constraint violations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Data validation constraints (format, length, range checks).
    Validation,
    /// Chronological integrity constraints (timestamp relationships).
    Chronological,
    /// Business logic constraints (domain-specific rules).
    BusinessLogic,
    /// Uniqueness constraints (primary keys, unique indexes).
    Uniqueness,
}

/// Service accounts table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum ServiceAccountConstraints {
    #[strum(serialize = "service_accounts_name_not_empty")]
    NameNotEmpty,
    #[strum(serialize = "service_accounts_oauth2_requires_email")]
    OAuth2RequiresEmail,
    #[strum(serialize = "service_accounts_keypair_forbids_email")]
    KeyPairForbidsEmail,
    #[strum(serialize = "service_accounts_keypair_requires_key")]
    KeyPairRequiresKey,
    #[strum(serialize = "service_accounts_updated_after_created")]
    UpdatedAfterCreated,
    #[strum(serialize = "service_accounts_email_unique_idx")]
    EmailUnique,
    #[strum(serialize = "service_accounts_key_id_unique_idx")]
    KeyIdUnique,
    #[strum(serialize = "service_accounts_base_role_unique_idx")]
    BaseRoleUnique,
    #[strum(serialize = "service_accounts_base_role_id_fkey")]
    BaseRoleExists,
}

impl ServiceAccountConstraints {
    /// Creates a new [`ServiceAccountConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::NameNotEmpty => ConstraintCategory::Validation,
            Self::OAuth2RequiresEmail
            | Self::KeyPairForbidsEmail
            | Self::KeyPairRequiresKey
            | Self::BaseRoleExists => ConstraintCategory::BusinessLogic,
            Self::UpdatedAfterCreated => ConstraintCategory::Chronological,
            Self::EmailUnique | Self::KeyIdUnique | Self::BaseRoleUnique => {
                ConstraintCategory::Uniqueness
            }
        }
    }
}

/// Roles table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum RoleConstraints {
    #[strum(serialize = "roles_name_not_empty")]
    NameNotEmpty,
    #[strum(serialize = "roles_updated_after_created")]
    UpdatedAfterCreated,
}

impl RoleConstraints {
    /// Creates a new [`RoleConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::NameNotEmpty => ConstraintCategory::Validation,
            Self::UpdatedAfterCreated => ConstraintCategory::Chronological,
        }
    }
}

/// Role bindings table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum RoleBindingConstraints {
    #[strum(serialize = "role_bindings_unique_idx")]
    BindingUnique,
    #[strum(serialize = "role_bindings_role_id_fkey")]
    RoleExists,
    #[strum(serialize = "role_bindings_service_account_id_fkey")]
    ServiceAccountExists,
}

impl RoleBindingConstraints {
    /// Creates a new [`RoleBindingConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::BindingUnique => ConstraintCategory::Uniqueness,
            Self::RoleExists | Self::ServiceAccountExists => ConstraintCategory::BusinessLogic,
        }
    }
}

/// Permissions table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum PermissionConstraints {
    #[strum(serialize = "permissions_service_not_empty")]
    ServiceNotEmpty,
    #[strum(serialize = "permissions_action_not_empty")]
    ActionNotEmpty,
    #[strum(serialize = "permissions_resource_not_empty")]
    ResourceNotEmpty,
    #[strum(serialize = "permissions_role_id_fkey")]
    RoleExists,
}

impl PermissionConstraints {
    /// Creates a new [`PermissionConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::ServiceNotEmpty | Self::ActionNotEmpty | Self::ResourceNotEmpty => {
                ConstraintCategory::Validation
            }
            Self::RoleExists => ConstraintCategory::BusinessLogic,
        }
    }
}

macro_rules! impl_string_conversions {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for String {
            #[inline]
            fn from(val: $ty) -> Self {
                val.to_string()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = strum::ParseError;

            #[inline]
            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    )*};
}

impl_string_conversions!(
    ServiceAccountConstraints,
    RoleConstraints,
    RoleBindingConstraints,
    PermissionConstraints,
);

/// Unified constraint violation enum that can represent any database constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConstraintViolation {
    ServiceAccount(ServiceAccountConstraints),
    Role(RoleConstraints),
    RoleBinding(RoleBindingConstraints),
    Permission(PermissionConstraints),
}

impl ConstraintViolation {
    /// Creates a new [`ConstraintViolation`] from the constraint name.
    ///
    /// Returns `None` if the constraint name is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_postgres::types::ConstraintViolation;
    ///
    /// let violation = ConstraintViolation::new("service_accounts_email_unique_idx");
    /// assert!(violation.is_some());
    ///
    /// let unknown = ConstraintViolation::new("unknown_constraint");
    /// assert!(unknown.is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        if constraint.starts_with("service_accounts_") {
            ServiceAccountConstraints::new(constraint).map(Self::ServiceAccount)
        } else if constraint.starts_with("roles_") {
            RoleConstraints::new(constraint).map(Self::Role)
        } else if constraint.starts_with("role_bindings_") {
            RoleBindingConstraints::new(constraint).map(Self::RoleBinding)
        } else if constraint.starts_with("permissions_") {
            PermissionConstraints::new(constraint).map(Self::Permission)
        } else {
            None
        }
    }

    /// Returns the table name associated with this constraint.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_accounts",
            Self::Role(_) => "roles",
            Self::RoleBinding(_) => "role_bindings",
            Self::Permission(_) => "permissions",
        }
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::ServiceAccount(c) => c.categorize(),
            Self::Role(c) => c.categorize(),
            Self::RoleBinding(c) => c.categorize(),
            Self::Permission(c) => c.categorize(),
        }
    }

    /// Returns the raw constraint name.
    pub fn constraint_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceAccount(c) => write!(f, "{c}"),
            Self::Role(c) => write!(f, "{c}"),
            Self::RoleBinding(c) => write!(f, "{c}"),
            Self::Permission(c) => write!(f, "{c}"),
        }
    }
}

impl From<ConstraintViolation> for String {
    #[inline]
    fn from(val: ConstraintViolation) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for ConstraintViolation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or(value)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_constraint_round_trips() {
        for c in ServiceAccountConstraints::iter() {
            let violation = ConstraintViolation::new(&c.to_string());
            assert_eq!(violation, Some(ConstraintViolation::ServiceAccount(c)));
        }
        for c in RoleBindingConstraints::iter() {
            let violation = ConstraintViolation::new(&c.to_string());
            assert_eq!(violation, Some(ConstraintViolation::RoleBinding(c)));
        }
        for c in PermissionConstraints::iter() {
            let violation = ConstraintViolation::new(&c.to_string());
            assert_eq!(violation, Some(ConstraintViolation::Permission(c)));
        }
    }

    #[test]
    fn email_uniqueness() {
        let violation = ConstraintViolation::new("service_accounts_email_unique_idx").unwrap();
        assert_eq!(violation.table_name(), "service_accounts");
        assert_eq!(violation.categorize(), ConstraintCategory::Uniqueness);
    }
}
