//! Structured permissions and their string codec.
//!
//! A permission is serialized as `service::ownershipLevel::action::resource`,
//! for example `iam::Owner::read::dc/region`. Strings only exist at the
//! boundary; everything past parsing works on [`Permission`] values.

mod level;
mod matcher;
mod resource;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use self::level::OwnershipLevel;
pub use self::matcher::is_present;
pub use self::resource::Resource;
use crate::{Error, Result, TRACING_TARGET_PERMISSION};

/// A single grant of `action` on `resource` within `service`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Permission {
    service: String,
    ownership_level: OwnershipLevel,
    action: String,
    resource: Resource,
}

impl Permission {
    /// Separator between the four encoded fields.
    pub const SEPARATOR: &'static str = "::";

    /// Creates a new permission, validating every component.
    pub fn new(
        service: impl Into<String>,
        ownership_level: OwnershipLevel,
        action: impl Into<String>,
        resource: impl Into<Resource>,
    ) -> Result<Self> {
        let permission = Self {
            service: service.into(),
            ownership_level,
            action: action.into(),
            resource: resource.into(),
        };

        for (name, value) in [
            ("service", permission.service.as_str()),
            ("action", permission.action.as_str()),
            ("resource", permission.resource.as_str()),
        ] {
            if value.is_empty() {
                return Err(Error::malformed_permission(
                    &permission.to_string(),
                    &format!("{name} must not be empty"),
                ));
            }

            if value.contains(Self::SEPARATOR) {
                return Err(Error::malformed_permission(
                    &permission.to_string(),
                    &format!("{name} must not contain '{}'", Self::SEPARATOR),
                ));
            }
        }

        Ok(permission)
    }

    /// Returns the service namespace.
    #[inline]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the ownership level.
    #[inline]
    pub fn ownership_level(&self) -> OwnershipLevel {
        self.ownership_level
    }

    /// Returns the action.
    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the resource scope.
    #[inline]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Returns a copy of this permission at another ownership level.
    pub fn with_ownership_level(&self, ownership_level: OwnershipLevel) -> Self {
        Self {
            ownership_level,
            ..self.clone()
        }
    }

    /// Returns a copy of this permission at the delegation level.
    pub fn to_owner(&self) -> Self {
        self.with_ownership_level(OwnershipLevel::MAX)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.service,
            self.ownership_level,
            self.action,
            self.resource,
            sep = Self::SEPARATOR,
        )
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(Self::SEPARATOR).collect();
        let [service, level, action, resource] = fields.as_slice() else {
            tracing::debug!(
                target: TRACING_TARGET_PERMISSION,
                permission = %s,
                fields = fields.len(),
                "rejected permission with wrong field count",
            );
            return Err(Error::malformed_permission(s, "expected four '::' separated fields"));
        };

        let ownership_level = level.parse::<OwnershipLevel>().map_err(|_| {
            Error::malformed_permission(s, &format!("unknown ownership level '{level}'"))
        })?;

        Self::new(*service, ownership_level, *action, *resource)
            .map_err(|_| Error::malformed_permission(s, "fields must not be empty"))
    }
}

impl TryFrom<String> for Permission {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

/// Parses a single permission string.
pub fn build_permission(s: &str) -> Result<Permission> {
    s.parse()
}

/// Parses a list of permission strings, failing on the first malformed entry.
pub fn build_permissions<I, S>(strings: I) -> Result<Vec<Permission>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .map(|s| build_permission(s.as_ref()))
        .collect()
}

/// A permission attached to a role, with an optional human-readable alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// The granted permission.
    pub permission: Permission,
    /// Optional label for the grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl PermissionGrant {
    /// Creates a grant without an alias.
    pub fn new(permission: Permission) -> Self {
        Self {
            permission,
            alias: None,
        }
    }

    /// Sets the alias of this grant.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl From<Permission> for PermissionGrant {
    fn from(permission: Permission) -> Self {
        Self::new(permission)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parses_four_fields() {
        let permission = build_permission("iam::Owner::read::dc/region").unwrap();
        assert_eq!(permission.service(), "iam");
        assert_eq!(permission.ownership_level(), OwnershipLevel::Owner);
        assert_eq!(permission.action(), "read");
        assert_eq!(permission.resource().as_str(), "dc/region");
    }

    #[test]
    fn rejects_malformed_strings() {
        for input in [
            "",
            "iam::Owner::read",
            "iam::Owner::read::dc::extra",
            "iam::Admin::read::*",
            "::Owner::read::*",
            "iam::Owner::::*",
            "iam::Owner::read::",
            "iam:Owner:read:*",
        ] {
            let error = build_permission(input).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MalformedPermission, "{input}");
        }
    }

    #[test]
    fn build_permissions_is_all_or_nothing() {
        let ok = build_permissions(["a::Owner::x::*", "b::Lender::y::p/q"]).unwrap();
        assert_eq!(ok.len(), 2);

        let error = build_permissions(["a::Owner::x::*", "broken", "b::Lender::y::p"]).unwrap_err();
        assert!(error.to_string().contains("broken"));
    }

    #[test]
    fn to_owner_keeps_scope() {
        let lender = build_permission("iam::Lender::write::dc").unwrap();
        let owner = lender.to_owner();
        assert_eq!(owner.to_string(), "iam::Owner::write::dc");
        assert_eq!(owner.resource(), lender.resource());
    }

    #[test]
    fn serde_uses_string_form() {
        let permission = build_permission("iam::Lender::read::*").unwrap();
        let json = serde_json::to_string(&permission).unwrap();
        assert_eq!(json, "\"iam::Lender::read::*\"");
        let back: Permission = serde_json::from_str(&json).unwrap();
        assert_eq!(back, permission);
        assert!(serde_json::from_str::<Permission>("\"nope\"").is_err());
    }

    fn field() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_.-]{1,12}"
    }

    fn resource() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("*".to_owned()),
            prop::collection::vec("[a-z0-9]{1,6}", 1..4).prop_map(|segments| segments.join("/")),
        ]
    }

    fn level() -> impl Strategy<Value = OwnershipLevel> {
        prop_oneof![Just(OwnershipLevel::Lender), Just(OwnershipLevel::Owner)]
    }

    proptest! {
        #[test]
        fn round_trip(service in field(), level in level(), action in field(), resource in resource()) {
            let permission = Permission::new(service, level, action, resource).unwrap();
            let parsed = build_permission(&permission.to_string()).unwrap();
            prop_assert_eq!(parsed, permission);
        }

        #[test]
        fn string_round_trip(service in field(), level in level(), action in field(), resource in resource()) {
            let s = format!("{service}::{level}::{action}::{resource}");
            prop_assert_eq!(build_permission(&s).unwrap().to_string(), s);
        }
    }
}
