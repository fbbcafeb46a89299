//! Service account request types.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use warden_core::{AuthenticationType, PermissionGrant, build_permission};

use super::Pagination;
use crate::service::{Result, ServiceAccountInput};

/// Request payload to create or replace a service account.
///
/// Field rules that depend on stored state, such as role existence or the
/// email requirement for OAuth2 accounts, are checked by the service.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountRequest {
    /// Display name.
    #[validate(length(max = 255))]
    pub name: String,

    /// Email address, required for OAuth2 accounts and rejected for key-pair ones.
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar URL. Omitting it on update keeps the stored value.
    #[serde(default)]
    pub picture: Option<String>,

    /// How the account authenticates. Required on create, immutable after.
    #[serde(default)]
    pub authentication_type: Option<AuthenticationType>,

    /// Permission strings granted through the account's base role.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Optional labels keyed by permission string.
    #[serde(default)]
    pub permissions_aliases: HashMap<String, String>,

    /// Shared roles to bind.
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

impl ServiceAccountRequest {
    /// Parses the permission strings and converts into service input.
    ///
    /// Fails on the first permission string that does not parse.
    pub fn into_input(self) -> Result<ServiceAccountInput> {
        let aliases = self.permissions_aliases;
        let permissions = self
            .permissions
            .iter()
            .map(|raw| {
                let permission = build_permission(raw)?;
                let alias = aliases
                    .get(raw)
                    .or_else(|| aliases.get(&permission.to_string()))
                    .cloned();

                let grant = PermissionGrant::new(permission);
                Ok(match alias {
                    Some(alias) => grant.with_alias(alias),
                    None => grant,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ServiceAccountInput {
            name: self.name,
            email: self.email,
            picture: self.picture,
            authentication_type: self.authentication_type,
            permissions,
            role_ids: self.role_ids,
        })
    }
}

/// Query parameters for listing service accounts.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListServiceAccountsQuery {
    /// Page to return, starting at 1.
    #[validate(range(min = 1, max = 100000))]
    pub page: Option<i64>,

    /// Records per page.
    #[validate(range(min = 1, max = 1000))]
    pub page_size: Option<i64>,

    /// Only list accounts holding this permission. The caller must hold its
    /// Owner-level counterpart.
    pub permission: Option<String>,
}

impl ListServiceAccountsQuery {
    /// Returns the requested page.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Query parameters for searching service accounts.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchServiceAccountsQuery {
    /// Substring matched against name and email.
    #[validate(length(min = 1, max = 255))]
    pub term: String,

    /// Page to return, starting at 1.
    #[validate(range(min = 1, max = 100000))]
    pub page: Option<i64>,

    /// Records per page.
    #[validate(range(min = 1, max = 1000))]
    pub page_size: Option<i64>,
}

impl SearchServiceAccountsQuery {
    /// Returns the requested page.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
        }
    }
}
