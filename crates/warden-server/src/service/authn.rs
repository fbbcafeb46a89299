//! Credential parsing and authentication.
//!
//! Two credential forms are accepted in the `Authorization` header:
//!
//! ```text
//! Authorization: Bearer <access token>
//! Authorization: KeyPair <key id>:<key secret>
//! ```
//!
//! Access tokens are verified by the configured OAuth2 provider; the first
//! successful login for an email provisions its service account. Key pairs
//! are looked up by key id and secret digest and never provision.

use std::fmt;
use std::str::FromStr;

use warden_core::{AccessTokenAuth, Identity, KeyPair, OAuth2Identity, OAuth2Service};
use warden_postgres::model::{ServiceAccount, UpdateServiceAccount};
use warden_postgres::query::AccessStore;

use super::lifecycle::create_oauth2_type;
use crate::{Error, ErrorKind, Result, TRACING_TARGET_AUTHENTICATION};

/// Credentials extracted from an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// An OAuth2 access token.
    Bearer(String),
    /// A key id and its plaintext secret.
    KeyPair(KeyPair),
}

impl Credentials {
    /// Scheme name of OAuth2 access tokens.
    pub const BEARER: &'static str = "Bearer";
    /// Scheme name of key pairs.
    pub const KEY_PAIR: &'static str = "KeyPair";

    /// Parses an optional header value, treating absence as unauthenticated.
    pub fn from_header(value: Option<&str>) -> Result<Self> {
        value
            .ok_or_else(|| Error::unauthenticated("Missing authorization header"))?
            .parse()
    }

    /// Returns the scheme name.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Bearer(_) => Self::BEARER,
            Self::KeyPair(_) => Self::KEY_PAIR,
        }
    }
}

impl FromStr for Credentials {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        // Exactly one space separates the scheme from the credential.
        let Some((scheme, credential)) = value.split_once(' ') else {
            return Err(Error::unauthenticated("Malformed authorization header"));
        };
        if credential.is_empty() || credential.contains(char::is_whitespace) {
            return Err(Error::unauthenticated("Malformed authorization header"));
        }

        match scheme {
            Self::BEARER => Ok(Self::Bearer(credential.to_owned())),
            Self::KEY_PAIR => {
                let (key_id, key_secret) = credential
                    .split_once(':')
                    .ok_or_else(|| Error::unauthenticated("Malformed key pair"))?;
                if key_id.is_empty() || key_secret.is_empty() {
                    return Err(Error::unauthenticated("Malformed key pair"));
                }
                Ok(Self::KeyPair(KeyPair::new(key_id, key_secret)))
            }
            other => Err(Error::invalid_authorization_scheme(other)),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"[REDACTED]").finish(),
            Self::KeyPair(key_pair) => f.debug_tuple("KeyPair").field(key_pair).finish(),
        }
    }
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub identity: Identity,
    /// Present when a bearer token was verified.
    pub access_token: Option<AccessTokenAuth>,
    /// Whether the provider issued a different token than the one presented.
    pub refreshed: bool,
}

impl Authenticated {
    /// Returns the token to hand back to the caller, if it changed.
    pub fn refreshed_token(&self) -> Option<&str> {
        self.access_token
            .as_ref()
            .filter(|_| self.refreshed)
            .map(|auth| auth.access_token.as_str())
    }
}

/// Authenticates parsed credentials.
pub async fn authenticate<C: AccessStore>(
    store: &mut C,
    oauth2: &OAuth2Service,
    credentials: &Credentials,
) -> Result<Authenticated> {
    match credentials {
        Credentials::Bearer(access_token) => {
            let (identity, auth) = authenticate_access_token(store, oauth2, access_token).await?;
            let refreshed = auth.access_token != *access_token;
            Ok(Authenticated {
                identity,
                access_token: Some(auth),
                refreshed,
            })
        }
        Credentials::KeyPair(key_pair) => Ok(Authenticated {
            identity: authenticate_key_pair(store, key_pair).await?,
            access_token: None,
            refreshed: false,
        }),
    }
}

/// Verifies an access token, provisioning the account on first login.
///
/// A non-empty picture reported by the provider replaces a different stored
/// one; nothing else about an existing account changes.
pub async fn authenticate_access_token<C: AccessStore>(
    store: &mut C,
    oauth2: &OAuth2Service,
    access_token: &str,
) -> Result<(Identity, AccessTokenAuth)> {
    let verified = oauth2.authenticate(access_token).await?;

    let account = match store.find_service_account_by_email(&verified.email).await? {
        Some(account) => refresh_picture(store, account, &verified).await?,
        None => provision(store, &verified).await?,
    };

    let auth = AccessTokenAuth {
        service_account_id: account.id,
        access_token: verified.access_token,
        email: verified.email,
    };

    Ok((account.to_identity(), auth))
}

async fn provision<C: AccessStore>(
    store: &mut C,
    verified: &OAuth2Identity,
) -> Result<ServiceAccount> {
    let email = verified.email.as_str();
    match create_oauth2_type(store, email, email, verified.picture.clone()).await {
        Ok(account) => {
            tracing::info!(
                target: TRACING_TARGET_AUTHENTICATION,
                service_account_id = %account.id,
                email = %email,
                "Provisioned service account on first login"
            );
            Ok(account)
        }
        // Lost a race against a concurrent first login for the same email.
        Err(error) if error.kind() == ErrorKind::Conflict => store
            .find_service_account_by_email(email)
            .await?
            .ok_or(error),
        Err(error) => Err(error),
    }
}

async fn refresh_picture<C: AccessStore>(
    store: &mut C,
    account: ServiceAccount,
    verified: &OAuth2Identity,
) -> Result<ServiceAccount> {
    let Some(picture) = verified.picture.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(account);
    };

    if account.picture.as_deref() == Some(picture) {
        return Ok(account);
    }

    tracing::debug!(
        target: TRACING_TARGET_AUTHENTICATION,
        service_account_id = %account.id,
        "Updating picture from identity provider"
    );

    let changes = UpdateServiceAccount {
        picture: Some(Some(picture.to_owned())),
        ..Default::default()
    };
    Ok(store.update_service_account(account.id, changes).await?)
}

/// Resolves a key pair to its account.
///
/// Fails with [`ErrorKind::NotFound`] without saying which half was wrong.
pub async fn authenticate_key_pair<C: AccessStore>(
    store: &mut C,
    key_pair: &KeyPair,
) -> Result<Identity> {
    let account = store
        .find_service_account_by_key_pair(&key_pair.key_id, &key_pair.digest())
        .await?
        .filter(ServiceAccount::is_key_pair)
        .ok_or_else(|| Error::not_found("Unknown key pair"))?;

    Ok(account.to_identity())
}
