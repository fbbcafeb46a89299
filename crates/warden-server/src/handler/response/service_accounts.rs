//! Service account response types.

use std::collections::HashMap;

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::AuthenticationType;
use warden_postgres::model;

use crate::service::{CreatedServiceAccount, ServiceAccountWithNested};

/// Represents a service account in listings.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// Unique identifier of the service account.
    pub id: Uuid,
    /// How the service account authenticates.
    pub authentication_type: AuthenticationType,
    /// Display name.
    pub name: String,
    /// Email address, required for OAuth2 accounts.
    pub email: Option<String>,
    /// Avatar URL.
    pub picture: Option<String>,
    /// Identifier of the account's private role.
    pub base_role_id: Uuid,

    /// Timestamp when the service account was created.
    pub created_at: Timestamp,
    /// Timestamp when the service account was last updated.
    pub updated_at: Timestamp,
}

impl ServiceAccount {
    pub fn from_model(account: model::ServiceAccount) -> Self {
        Self {
            id: account.id,
            authentication_type: account.authentication_type.into(),
            name: account.name,
            email: account.email,
            picture: account.picture,
            base_role_id: account.base_role_id,

            created_at: account.created_at.into(),
            updated_at: account.updated_at.into(),
        }
    }
}

/// A shared role bound to a service account.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoundRole {
    /// Unique identifier of the role.
    pub id: Uuid,
    /// Display name of the role.
    pub name: String,
}

impl BoundRole {
    pub fn from_model(role: model::Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
        }
    }
}

/// A service account with its directly granted permissions and bound roles.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountDetail {
    #[serde(flatten)]
    pub service_account: ServiceAccount,
    /// Permissions granted through the account's base role.
    pub permissions: Vec<String>,
    /// Aliases keyed by permission string.
    pub permissions_aliases: HashMap<String, String>,
    /// Shared roles bound to the account.
    pub roles: Vec<BoundRole>,
}

impl ServiceAccountDetail {
    pub fn from_nested(nested: ServiceAccountWithNested) -> Self {
        let permissions_aliases = nested.permission_aliases();
        let permissions = nested
            .permissions
            .iter()
            .map(|grant| grant.permission.to_string())
            .collect();

        Self {
            service_account: ServiceAccount::from_model(nested.service_account),
            permissions,
            permissions_aliases,
            roles: nested.roles.into_iter().map(BoundRole::from_model).collect(),
        }
    }
}

/// A newly created service account.
///
/// Key-pair accounts carry their credentials. The secret is shown once and
/// only its digest is stored.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedServiceAccountResponse {
    #[serde(flatten)]
    pub service_account: ServiceAccount,
    /// Public key identifier, for key-pair accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Plaintext key secret, for key-pair accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_secret: Option<String>,
}

impl CreatedServiceAccountResponse {
    pub fn from_created(created: CreatedServiceAccount) -> Self {
        let (key_id, key_secret) = match created.key_pair {
            Some(key_pair) => (Some(key_pair.key_id), Some(key_pair.key_secret)),
            None => (None, None),
        };

        Self {
            service_account: ServiceAccount::from_model(created.service_account),
            key_id,
            key_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{PermissionGrant, build_permission};

    use super::*;

    fn account() -> model::ServiceAccount {
        model::ServiceAccount {
            id: Uuid::new_v4(),
            name: "ci".to_owned(),
            email: None,
            picture: None,
            authentication_type: AuthenticationType::KeyPair.into(),
            base_role_id: Uuid::new_v4(),
            key_id: Some("key".to_owned()),
            key_secret_digest: Some("digest".to_owned()),
            created_at: Timestamp::now().into(),
            updated_at: Timestamp::now().into(),
        }
    }

    #[test]
    fn detail_lists_permissions_and_aliases() {
        let permission = build_permission("iam::Owner::read::dc/a").unwrap();
        let nested = ServiceAccountWithNested {
            service_account: account(),
            permissions: vec![PermissionGrant::new(permission).with_alias("reader")],
            roles: Vec::new(),
        };

        let detail = ServiceAccountDetail::from_nested(nested);
        assert_eq!(detail.permissions, vec!["iam::Owner::read::dc/a"]);
        assert_eq!(
            detail.permissions_aliases.get("iam::Owner::read::dc/a").map(String::as_str),
            Some("reader")
        );

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["authenticationType"], "keypair");
        assert!(json.get("keySecretDigest").is_none());
    }

    #[test]
    fn created_response_omits_absent_key_pair() {
        let created = CreatedServiceAccount {
            service_account: account(),
            key_pair: None,
        };
        let json = serde_json::to_value(CreatedServiceAccountResponse::from_created(created)).unwrap();
        assert!(json.get("keyId").is_none());
        assert!(json.get("keySecret").is_none());
    }
}
