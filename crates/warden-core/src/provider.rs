//! OAuth2 identity providers.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{Result, TRACING_TARGET_PROVIDER};

/// Identity reported by an OAuth2 provider for an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Identity {
    /// Verified email address of the token's owner.
    pub email: String,
    /// Access token to use from now on; equal to the presented one unless
    /// the provider refreshed it.
    pub access_token: String,
    /// Profile picture URL, when the provider reports one.
    pub picture: Option<String>,
}

/// Exchanges an OAuth2 access token for the identity behind it.
#[async_trait::async_trait]
pub trait OAuth2Provider: Send + Sync {
    /// Validates `access_token` and returns the identity it belongs to.
    ///
    /// Fails with [`crate::ErrorKind::InvalidCredentials`] or
    /// [`crate::ErrorKind::Forbidden`] when the token is rejected, and with
    /// [`crate::ErrorKind::ExternalError`] when the provider is unreachable.
    async fn authenticate(&self, access_token: &str) -> Result<OAuth2Identity>;
}

/// OAuth2 provider wrapper with observability.
///
/// The inner provider is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct OAuth2Service {
    inner: Arc<dyn OAuth2Provider>,
}

impl fmt::Debug for OAuth2Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Service").finish_non_exhaustive()
    }
}

impl OAuth2Service {
    /// Creates a new service wrapping the given provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: OAuth2Provider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Exchanges an access token for an identity.
    pub async fn authenticate(&self, access_token: &str) -> Result<OAuth2Identity> {
        let started_at = Instant::now();
        let result = self.inner.authenticate(access_token).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(identity) => {
                tracing::debug!(
                    target: TRACING_TARGET_PROVIDER,
                    email = %identity.email,
                    refreshed = identity.access_token != access_token,
                    elapsed_ms = elapsed.as_millis(),
                    "Access token accepted"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_PROVIDER,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Access token rejected"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ErrorKind};

    struct Static;

    #[async_trait::async_trait]
    impl OAuth2Provider for Static {
        async fn authenticate(&self, access_token: &str) -> Result<OAuth2Identity> {
            if access_token == "good" {
                Ok(OAuth2Identity {
                    email: "a@example.com".to_owned(),
                    access_token: "refreshed".to_owned(),
                    picture: None,
                })
            } else {
                Err(Error::invalid_credentials())
            }
        }
    }

    #[tokio::test]
    async fn forwards_to_provider() {
        let service = OAuth2Service::new(Static);
        let identity = service.authenticate("good").await.unwrap();
        assert_eq!(identity.email, "a@example.com");
        assert_eq!(identity.access_token, "refreshed");

        let error = service.authenticate("bad").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidCredentials);
    }
}
