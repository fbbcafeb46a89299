//! Service account model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::service_accounts;
use crate::types::AuthenticationType;

/// A principal that authenticates through OAuth2 or a key pair.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = service_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceAccount {
    /// Unique account identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address, unique among accounts that have one.
    pub email: Option<String>,
    /// Profile picture URL reported by the OAuth2 provider.
    pub picture: Option<String>,
    /// How the account authenticates.
    pub authentication_type: AuthenticationType,
    /// Private role created together with the account.
    pub base_role_id: Uuid,
    /// Public key identifier, for key-pair accounts.
    pub key_id: Option<String>,
    /// Hex SHA-256 digest of the key secret, for key-pair accounts.
    pub key_secret_digest: Option<String>,
    /// Timestamp when the account was created.
    pub created_at: Timestamp,
    /// Timestamp when the account was last updated.
    pub updated_at: Timestamp,
}

impl ServiceAccount {
    /// Returns whether the account authenticates through OAuth2.
    #[inline]
    pub fn is_oauth2(&self) -> bool {
        self.authentication_type == AuthenticationType::OAuth2
    }

    /// Returns whether the account authenticates with a key pair.
    #[inline]
    pub fn is_key_pair(&self) -> bool {
        self.authentication_type == AuthenticationType::KeyPair
    }

    /// Returns the authenticated identity of this account.
    pub fn to_identity(&self) -> warden_core::Identity {
        warden_core::Identity {
            service_account_id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            authentication_type: self.authentication_type.into(),
        }
    }
}

/// Data for creating a new service account.
///
/// The id is chosen by the caller so the base role can be named after it
/// before the account row exists.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = service_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewServiceAccount {
    /// Account identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Profile picture URL.
    pub picture: Option<String>,
    /// How the account authenticates.
    pub authentication_type: AuthenticationType,
    /// Private role of the account.
    pub base_role_id: Uuid,
    /// Public key identifier.
    pub key_id: Option<String>,
    /// Hex SHA-256 digest of the key secret.
    pub key_secret_digest: Option<String>,
}

/// Data for updating a service account.
///
/// Only `Some` fields are written. The authentication type, base role and
/// key pair are immutable.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = service_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateServiceAccount {
    /// Display name.
    pub name: Option<String>,
    /// Email address; `Some(None)` clears it.
    pub email: Option<Option<String>>,
    /// Profile picture URL; `Some(None)` clears it.
    pub picture: Option<Option<String>>,
}

impl UpdateServiceAccount {
    /// Returns whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.picture.is_none()
    }
}
