//! Service layer: authorization, account lifecycle and authentication.
//!
//! Every operation is a free function generic over [`AccessStore`], so the
//! same code runs against a pooled Postgres connection and the in-memory
//! store used in tests.
//!
//! [`AccessStore`]: warden_postgres::query::AccessStore

pub mod authn;
pub mod authz;
mod config;
pub mod lifecycle;
mod oauth2;

use warden_core::OAuth2Service;
use warden_postgres::PgClient;

pub use crate::service::authn::{Authenticated, Credentials};
pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::lifecycle::{
    CreatedServiceAccount, ServiceAccountInput, ServiceAccountWithNested,
};
pub use crate::service::oauth2::{OAuth2Config, UserInfoProvider};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pg_client: PgClient,
    oauth2: OAuth2Service,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres, applies migrations and builds the identity
    /// provider.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            pg_client: config.connect_postgres().await?,
            oauth2: config.create_oauth2_service()?,
        })
    }

    /// Assembles state from already constructed services.
    pub fn new(pg_client: PgClient, oauth2: OAuth2Service) -> Self {
        Self { pg_client, oauth2 }
    }

    /// Returns the database client.
    #[inline]
    pub fn pg_client(&self) -> &PgClient {
        &self.pg_client
    }

    /// Returns the OAuth2 service.
    #[inline]
    pub fn oauth2(&self) -> &OAuth2Service {
        &self.oauth2
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(pg_client: PgClient);
impl_di!(oauth2: OAuth2Service);
