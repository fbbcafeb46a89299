//! Authentication middleware for validating request credentials.
//!
//! On success the resolved [`Identity`] is stored in the request extensions
//! for [`AuthIdentity`] and the response is annotated with who the caller
//! turned out to be.
//!
//! [`Identity`]: warden_core::Identity
//! [`AuthIdentity`]: crate::extract::AuthIdentity

use aide::axum::ApiRouter;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use warden_core::{AuthenticationType, OAuth2Service};
use warden_postgres::query::AccessStore;

use crate::handler::{Error, ErrorKind, Result};
use crate::service::{Authenticated, Credentials, ServiceState, authn};
use crate::{ErrorKind as ServiceErrorKind, TRACING_TARGET_AUTHENTICATION};

/// Response header naming the key-pair account that made the request.
pub const HEADER_SERVICE_ACCOUNT_NAME: HeaderName =
    HeaderName::from_static("x-service-account-name");

/// Response header carrying the email of an OAuth2 caller.
pub const HEADER_EMAIL: HeaderName = HeaderName::from_static("x-email");

/// Response header carrying an access token reissued by the provider.
pub const HEADER_ACCESS_TOKEN: HeaderName = HeaderName::from_static("x-access-token");

/// Extension trait for [`ApiRouter`] to apply authentication middleware.
pub trait RouterAuthExt<S> {
    /// Requires valid credentials for all routes added so far.
    fn with_authentication(self, state: ServiceState) -> Self;
}

impl<S> RouterAuthExt<S> for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_authentication(self, state: ServiceState) -> Self {
        self.route_layer(from_fn_with_state(state, require_authentication))
    }
}

/// Rejects requests without valid credentials before any handler runs.
///
/// Missing, malformed or unknown credentials answer 401. Storage and
/// identity provider failures answer 500.
pub async fn require_authentication(
    State(state): State<ServiceState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let credentials = parse_credentials(&request)?;

    // The connection goes back to the pool before the handler runs.
    let authenticated = {
        let mut conn = state.pg_client().get_connection().await?;
        authenticate_credentials(conn.connection(), state.oauth2(), &credentials).await?
    };

    Ok(run_as(authenticated, request, next).await)
}

/// Resolves credentials against `store`, mapping failures onto responses.
async fn authenticate_credentials<C: AccessStore>(
    store: &mut C,
    oauth2: &OAuth2Service,
    credentials: &Credentials,
) -> Result<Authenticated> {
    let authenticated = authn::authenticate(store, oauth2, credentials)
        .await
        .map_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                scheme = credentials.scheme(),
                error = %error,
                "Authentication failed"
            );
            reject(error)
        })?;

    tracing::debug!(
        target: TRACING_TARGET_AUTHENTICATION,
        service_account_id = %authenticated.identity.service_account_id,
        scheme = credentials.scheme(),
        "Request authenticated"
    );

    Ok(authenticated)
}

/// Runs the rest of the stack as the authenticated caller.
async fn run_as(authenticated: Authenticated, mut request: Request, next: Next) -> Response {
    let headers = identity_headers(&authenticated);
    request.extensions_mut().insert(authenticated.identity);

    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    response
}

fn parse_credentials(request: &Request) -> Result<Credentials> {
    let Some(value) = request.headers().get(AUTHORIZATION) else {
        return Err(ErrorKind::MissingAuthToken.into_error());
    };

    let value = value.to_str().map_err(|_| {
        ErrorKind::MalformedAuthToken.with_context("Authorization header is not valid ASCII")
    })?;

    value.parse().map_err(|error: crate::Error| match error.kind() {
        ServiceErrorKind::InvalidAuthorizationScheme => ErrorKind::InvalidAuthScheme
            .with_message(error.message().to_owned())
            .with_resource(AUTHORIZATION.as_str()),
        _ => ErrorKind::MalformedAuthToken
            .with_message(error.message().to_owned())
            .with_resource(AUTHORIZATION.as_str()),
    })
}

/// Maps a failed authentication onto the response.
///
/// An unknown key pair is indistinguishable from a wrong secret.
fn reject(error: crate::Error) -> Error<'static> {
    match error.kind() {
        ServiceErrorKind::NotFound | ServiceErrorKind::Unauthenticated => ErrorKind::Unauthorized
            .with_message("Invalid credentials")
            .with_resource(AUTHORIZATION.as_str()),
        _ => error.into(),
    }
}

fn identity_headers(authenticated: &Authenticated) -> Vec<(HeaderName, HeaderValue)> {
    let identity = &authenticated.identity;
    let mut headers = Vec::with_capacity(2);

    let mut push = |name: HeaderName, value: &str| match HeaderValue::from_str(value) {
        Ok(value) => headers.push((name, value)),
        Err(_) => tracing::warn!(
            target: TRACING_TARGET_AUTHENTICATION,
            header = %name,
            "Skipping response header with invalid characters"
        ),
    };

    match identity.authentication_type {
        AuthenticationType::KeyPair => push(HEADER_SERVICE_ACCOUNT_NAME, &identity.name),
        AuthenticationType::OAuth2 => {
            if let Some(email) = identity.email.as_deref() {
                push(HEADER_EMAIL, email);
            }
            if let Some(token) = authenticated.refreshed_token() {
                push(HEADER_ACCESS_TOKEN, token);
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use axum_test::TestServer;
    use uuid::Uuid;
    use warden_core::{AccessTokenAuth, Identity, OAuth2Identity};
    use warden_test::{MemoryStore, MockOAuth2Provider};

    use super::*;
    use crate::extract::AuthIdentity;
    use crate::service::lifecycle::create_key_pair_type;

    /// Same steps as [`require_authentication`], over an in-memory store.
    async fn authenticate_in_memory(
        State((mut store, oauth2)): State<(MemoryStore, OAuth2Service)>,
        request: Request,
        next: Next,
    ) -> Result<Response> {
        let credentials = parse_credentials(&request)?;
        let authenticated = authenticate_credentials(&mut store, &oauth2, &credentials).await?;
        Ok(run_as(authenticated, request, next).await)
    }

    async fn whoami(AuthIdentity(identity): AuthIdentity) -> Json<Identity> {
        Json(identity)
    }

    fn create_test_server(
        store: &MemoryStore,
        provider: &MockOAuth2Provider,
    ) -> anyhow::Result<TestServer> {
        let state = (store.clone(), OAuth2Service::new(provider.clone()));
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state, authenticate_in_memory));
        Ok(TestServer::new(app)?)
    }

    #[tokio::test]
    async fn bearer_caller_reaches_the_handler() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let provider = MockOAuth2Provider::new().with_identity(
            "stale",
            OAuth2Identity {
                email: "alice@example.com".to_owned(),
                access_token: "renewed".to_owned(),
                picture: None,
            },
        );
        let server = create_test_server(&store, &provider)?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer stale"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.header("x-email"), "alice@example.com");
        assert_eq!(response.header("x-access-token"), "renewed");
        assert!(!response.headers().contains_key(HEADER_SERVICE_ACCOUNT_NAME));

        let identity: Identity = response.json();
        assert_eq!(identity.authentication_type, AuthenticationType::OAuth2);
        assert_eq!(identity.email.as_deref(), Some("alice@example.com"));
        assert_eq!(store.service_account_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn key_pair_caller_reaches_the_handler() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        let created = create_key_pair_type(&mut store, "ci-runner").await?;
        let key_pair = created.key_pair.ok_or_else(|| anyhow::anyhow!("no key pair"))?;
        let server = create_test_server(&store, &MockOAuth2Provider::new())?;

        let header = format!("KeyPair {}:{}", key_pair.key_id, key_pair.key_secret);
        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&header)?)
            .await;
        response.assert_status_ok();
        assert_eq!(response.header("x-service-account-name"), "ci-runner");
        assert!(!response.headers().contains_key(HEADER_EMAIL));
        assert!(!response.headers().contains_key(HEADER_ACCESS_TOKEN));

        let identity: Identity = response.json();
        assert_eq!(identity.service_account_id, created.service_account.id);
        assert_eq!(identity.authentication_type, AuthenticationType::KeyPair);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credentials_never_reach_the_handler() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        let created = create_key_pair_type(&mut store, "ci-runner").await?;
        let key_id = created.service_account.key_id.unwrap_or_default();
        let server = create_test_server(&store, &MockOAuth2Provider::new())?;

        let header = format!("KeyPair {key_id}:wrong");
        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&header)?)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key(HEADER_SERVICE_ACCOUNT_NAME));

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer unknown"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(store.service_account_count(), 1);
        Ok(())
    }

    fn oauth2_identity() -> Identity {
        Identity {
            service_account_id: Uuid::new_v4(),
            name: "alice@example.com".to_owned(),
            email: Some("alice@example.com".to_owned()),
            authentication_type: AuthenticationType::OAuth2,
        }
    }

    fn request_with(value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[test]
    fn header_parse_failures_are_classified() {
        let error = parse_credentials(&request_with(None)).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingAuthToken);

        let error = parse_credentials(&request_with(Some("Bearer"))).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedAuthToken);

        let error = parse_credentials(&request_with(Some("KeyPair abc"))).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedAuthToken);

        let error = parse_credentials(&request_with(Some("Basic dXNlcjpwYXNz"))).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidAuthScheme);
    }

    #[test]
    fn unknown_key_pair_is_unauthorized() {
        let error = reject(crate::Error::not_found("Unknown key pair"));
        assert_eq!(error.kind(), ErrorKind::Unauthorized);

        let error = reject(crate::Error::storage("down"));
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }

    #[test]
    fn oauth2_headers_include_refreshed_token_only() {
        let identity = oauth2_identity();
        let auth = AccessTokenAuth {
            service_account_id: identity.service_account_id,
            access_token: "new-token".to_owned(),
            email: "alice@example.com".to_owned(),
        };

        let unchanged = Authenticated {
            identity: identity.clone(),
            access_token: Some(auth.clone()),
            refreshed: false,
        };
        let headers = identity_headers(&unchanged);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, HEADER_EMAIL);

        let refreshed = Authenticated {
            identity,
            access_token: Some(auth),
            refreshed: true,
        };
        let headers = identity_headers(&refreshed);
        assert!(headers.iter().any(|(name, value)| {
            *name == HEADER_ACCESS_TOKEN && value == "new-token"
        }));
    }

    #[test]
    fn key_pair_headers_name_the_account() {
        let authenticated = Authenticated {
            identity: Identity {
                service_account_id: Uuid::new_v4(),
                name: "ci-runner".to_owned(),
                email: None,
                authentication_type: AuthenticationType::KeyPair,
            },
            access_token: None,
            refreshed: false,
        };

        let headers = identity_headers(&authenticated);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, HEADER_SERVICE_ACCOUNT_NAME);
        assert_eq!(headers[0].1, "ci-runner");
    }
}
