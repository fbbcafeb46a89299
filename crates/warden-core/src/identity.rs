//! Authenticated principals.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// How a service account proves who it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum AuthenticationType {
    /// Human operator signing in through an OAuth2 provider.
    #[serde(rename = "oauth2")]
    #[strum(serialize = "oauth2")]
    OAuth2,

    /// Machine client presenting a key id and secret.
    #[serde(rename = "keypair")]
    #[strum(serialize = "keypair")]
    KeyPair,
}

/// The authenticated caller of a request.
///
/// Produced by the authentication middleware and passed explicitly to
/// handlers and services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Service account the credential resolved to.
    pub service_account_id: Uuid,
    /// Display name of the account.
    pub name: String,
    /// Email address, present for OAuth2 accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Protocol used for this request.
    pub authentication_type: AuthenticationType,
}

/// Result of exchanging an OAuth2 access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenAuth {
    /// Service account matching the token's email.
    pub service_account_id: Uuid,
    /// Token to use from now on, possibly refreshed by the provider.
    pub access_token: String,
    /// Email reported by the provider.
    pub email: String,
}
