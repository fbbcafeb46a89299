//! Permission check handlers.
//!
//! Other services forward their caller's `Authorization` header here and
//! ask whether the resolved account holds a permission.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use validator::Validate;

use crate::extract::{AuthIdentity, Json, PgPool, Query, ValidateJson};
use crate::handler::request::{HasPermissionQuery, HasPermissions as HasPermissionsRequest};
use crate::handler::response::{ErrorResponse, HasPermissions};
use crate::handler::{ErrorKind, Result};
use crate::service::{ServiceState, authz};

/// Tracing target for permission checks.
const TRACING_TARGET: &str = "warden_server::handler::permissions";

/// Checks a single permission for the caller.
///
/// Answers 200 when held and 403 otherwise.
#[tracing::instrument(
    skip_all,
    fields(
        service_account_id = %identity.service_account_id,
        permission = %query.permission,
    )
)]
async fn has_permission(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    Query(query): Query<HasPermissionQuery>,
) -> Result<()> {
    query.validate()?;

    let granted = authz::has_permission_string(
        conn.connection(),
        identity.service_account_id,
        &query.permission,
    )
    .await?;

    tracing::debug!(target: TRACING_TARGET, granted, "Permission checked");

    if !granted {
        return Err(ErrorKind::Forbidden
            .with_message("Missing required permission")
            .with_resource(query.permission));
    }

    Ok(())
}

fn has_permission_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Check permission")
        .description(
            "Answers 200 when the caller holds the permission, directly or through \
            a bound role, and 403 otherwise.",
        )
        .response::<200, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Checks several permissions for the caller in one request.
#[tracing::instrument(
    skip_all,
    fields(
        service_account_id = %identity.service_account_id,
        count = request.permissions.len(),
    )
)]
async fn has_permissions(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    ValidateJson(request): ValidateJson<HasPermissionsRequest>,
) -> Result<(StatusCode, Json<HasPermissions>)> {
    let results = authz::has_permissions_strings(
        conn.connection(),
        identity.service_account_id,
        &request.permissions,
    )
    .await?;

    tracing::debug!(
        target: TRACING_TARGET,
        granted = results.iter().filter(|granted| **granted).count(),
        "Permissions checked"
    );

    Ok((StatusCode::OK, Json(HasPermissions { results })))
}

fn has_permissions_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Check permissions")
        .description("Returns one boolean per requested permission, in request order.")
        .response::<200, Json<HasPermissions>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Returns an [`ApiRouter`] with permission check routes.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/permissions/has",
            get_with(has_permission, has_permission_docs)
                .post_with(has_permissions, has_permissions_docs),
        )
        .with_path_items(|item| item.tag("Permissions"))
}
