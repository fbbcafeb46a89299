//! Axum middleware guarding routes with a remote permission check.

use std::fmt;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use warden_core::{OwnershipLevel, Permission, Resource};

use crate::client::{HEADER_ACCESS_TOKEN, HEADER_EMAIL};
use crate::{Decision, PermissionClient, TRACING_TARGET_MIDDLEWARE};

type ResourceFn = dyn Fn(&Request) -> String + Send + Sync;

/// Permission a route requires, with the client that checks it.
///
/// The service namespace comes from the client configuration; the resource
/// is computed from each request.
#[derive(Clone)]
pub struct PermissionGuard {
    client: PermissionClient,
    ownership_level: OwnershipLevel,
    action: String,
    resource: Arc<ResourceFn>,
}

impl fmt::Debug for PermissionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGuard")
            .field("client", &self.client)
            .field("ownership_level", &self.ownership_level)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl PermissionGuard {
    /// Creates a new guard.
    pub fn new<F>(
        client: PermissionClient,
        ownership_level: OwnershipLevel,
        action: impl Into<String>,
        resource: F,
    ) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        Self {
            client,
            ownership_level,
            action: action.into(),
            resource: Arc::new(resource),
        }
    }

    /// Builds the permission required for `request`.
    pub fn permission(&self, request: &Request) -> warden_core::Result<Permission> {
        Permission::new(
            self.client.config().service.as_str(),
            self.ownership_level,
            self.action.as_str(),
            Resource::new((self.resource)(request)),
        )
    }
}

/// Extension trait for `axum::`[`Router`] to require a permission.
pub trait RouterPermissionExt<S> {
    /// Requires the guard's permission for all routes added so far.
    fn with_permission(self, guard: PermissionGuard) -> Self;
}

impl<S> RouterPermissionExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_permission(self, guard: PermissionGuard) -> Self {
        self.route_layer(from_fn_with_state(guard, require_permission))
    }
}

/// Forwards the request only when Warden grants the guard's permission.
///
/// Denied requests answer 403, or 401 when Warden rejected the credentials.
/// Requests without an `Authorization` header answer 401 without a remote
/// call. A failed check answers 500. A disabled configuration lets every
/// request through.
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    request: Request,
    next: Next,
) -> Response {
    if !guard.client.config().enabled {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned);

    let Some(authorization) = authorization else {
        tracing::warn!(
            target: TRACING_TARGET_MIDDLEWARE,
            "Request without authorization header"
        );
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let permission = match guard.permission(&request) {
        Ok(permission) => permission,
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_MIDDLEWARE,
                error = %err,
                "Failed to build required permission"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match guard.client.has_permission(&authorization, &permission).await {
        Ok(Decision::Granted {
            access_token,
            email,
        }) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();

            for (name, value) in [(HEADER_ACCESS_TOKEN, access_token), (HEADER_EMAIL, email)] {
                if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
                    headers.insert(HeaderName::from_static(name), value);
                }
            }

            response
        }
        Ok(Decision::Denied { status }) => {
            tracing::info!(
                target: TRACING_TARGET_MIDDLEWARE,
                permission = %permission,
                status = status.as_u16(),
                "Permission denied"
            );
            status.into_response()
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_MIDDLEWARE,
                error = %err,
                permission = %permission,
                "Failed to check permission"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
