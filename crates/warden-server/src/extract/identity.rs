//! Authenticated identity extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use derive_more::Deref;
use warden_core::Identity;

use crate::TRACING_TARGET_AUTHENTICATION;
use crate::handler::{Error, ErrorKind};

/// The caller's [`Identity`], as resolved by the authentication middleware.
///
/// Extraction fails with 401 on routes not behind the middleware, so a
/// handler taking this argument can never run unauthenticated.
#[must_use]
#[derive(Debug, Clone, Deref)]
pub struct AuthIdentity(pub Identity);

impl AuthIdentity {
    /// Returns the inner identity.
    #[inline]
    pub fn into_inner(self) -> Identity {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(Self(identity.clone())),
            None => {
                tracing::error!(
                    target: TRACING_TARGET_AUTHENTICATION,
                    path = %parts.uri.path(),
                    "Identity requested on a route without authentication"
                );
                Err(ErrorKind::Unauthorized.into_error())
            }
        }
    }
}

impl aide::OperationInput for AuthIdentity {}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use uuid::Uuid;
    use warden_core::AuthenticationType;

    use super::*;

    #[tokio::test]
    async fn reads_identity_from_extensions() {
        let identity = Identity {
            service_account_id: Uuid::new_v4(),
            name: "ci".to_owned(),
            email: None,
            authentication_type: AuthenticationType::KeyPair,
        };

        let mut request = Request::new(());
        request.extensions_mut().insert(identity.clone());
        let (mut parts, ()) = request.into_parts();

        let AuthIdentity(extracted) = AuthIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted, identity);
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let (mut parts, ()) = Request::new(()).into_parts();
        let error = AuthIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
    }
}
