//! Service account management handlers.
//!
//! Creating or updating an account delegates permissions and roles from the
//! caller, who must hold the Owner-level counterpart of everything granted.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use validator::Validate;
use warden_core::build_permission;

use crate::extract::{AuthIdentity, Json, Path, PgPool, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{
    ListServiceAccountsQuery, SearchServiceAccountsQuery, ServiceAccountPathParams,
    ServiceAccountRequest,
};
use crate::handler::response::{
    CreatedServiceAccountResponse, ErrorResponse, Listing, ServiceAccount, ServiceAccountDetail,
};
use crate::service::{ServiceState, authz, lifecycle};

/// Tracing target for service account operations.
const TRACING_TARGET: &str = "warden_server::handler::service_accounts";

/// Lists service accounts, optionally only those holding a permission.
#[tracing::instrument(
    skip_all,
    fields(service_account_id = %identity.service_account_id)
)]
async fn list_service_accounts(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    Query(query): Query<ListServiceAccountsQuery>,
) -> Result<(StatusCode, Json<Listing<ServiceAccount>>)> {
    query.validate()?;
    let pagination = query.pagination().into();

    let page = match query.permission.as_deref() {
        Some(permission) => {
            let permission = build_permission(permission).map_err(crate::Error::from)?;
            authz::list_with_permission(
                conn.connection(),
                identity.service_account_id,
                &permission,
                pagination,
            )
            .await?
        }
        None => lifecycle::list(conn.connection(), pagination).await?,
    };

    tracing::debug!(
        target: TRACING_TARGET,
        count = page.1,
        filtered = query.permission.is_some(),
        "Service accounts listed"
    );

    let listing = Listing::from_page(page, ServiceAccount::from_model);
    Ok((StatusCode::OK, Json(listing)))
}

fn list_service_accounts_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List service accounts")
        .description(
            "Returns one page of service accounts. With `permission`, only accounts \
            holding it are listed and the caller must hold its Owner-level counterpart.",
        )
        .response::<200, Json<Listing<ServiceAccount>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Searches service accounts by name or email.
#[tracing::instrument(
    skip_all,
    fields(service_account_id = %identity.service_account_id)
)]
async fn search_service_accounts(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    Query(query): Query<SearchServiceAccountsQuery>,
) -> Result<(StatusCode, Json<Listing<ServiceAccount>>)> {
    query.validate()?;

    let page = lifecycle::search(conn.connection(), &query.term, query.pagination().into()).await?;

    tracing::debug!(target: TRACING_TARGET, count = page.1, "Service accounts searched");

    let listing = Listing::from_page(page, ServiceAccount::from_model);
    Ok((StatusCode::OK, Json(listing)))
}

fn search_service_accounts_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Search service accounts")
        .description("Returns one page of service accounts whose name or email contains the term.")
        .response::<200, Json<Listing<ServiceAccount>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Creates a service account with its roles and permissions.
///
/// Key-pair accounts are returned with their secret, shown only once.
#[tracing::instrument(
    skip_all,
    fields(service_account_id = %identity.service_account_id)
)]
async fn create_service_account(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    ValidateJson(request): ValidateJson<ServiceAccountRequest>,
) -> Result<(StatusCode, Json<CreatedServiceAccountResponse>)> {
    let input = request.into_input()?;
    let created = lifecycle::create_with_nested(conn.connection(), &identity, input).await?;

    tracing::info!(
        target: TRACING_TARGET,
        created_id = %created.service_account.id,
        "Service account created"
    );

    let response = CreatedServiceAccountResponse::from_created(created);
    Ok((StatusCode::CREATED, Json(response)))
}

fn create_service_account_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create service account")
        .description(
            "Creates a service account. Every granted permission and every permission \
            of a bound role must be held by the caller at Owner level. Key-pair accounts \
            are returned with their key secret, which is only shown once.",
        )
        .response::<201, Json<CreatedServiceAccountResponse>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Returns a service account with its permissions and bound roles.
#[tracing::instrument(
    skip_all,
    fields(
        service_account_id = %identity.service_account_id,
        target_id = %path_params.service_account_id,
    )
)]
async fn read_service_account(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    Path(path_params): Path<ServiceAccountPathParams>,
) -> Result<(StatusCode, Json<ServiceAccountDetail>)> {
    let nested =
        lifecycle::get_with_nested(conn.connection(), path_params.service_account_id).await?;

    Ok((StatusCode::OK, Json(ServiceAccountDetail::from_nested(nested))))
}

fn read_service_account_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get service account")
        .description("Returns the account, its directly granted permissions and its bound roles.")
        .response::<200, Json<ServiceAccountDetail>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Replaces a service account's fields, roles and permissions.
#[tracing::instrument(
    skip_all,
    fields(
        service_account_id = %identity.service_account_id,
        target_id = %path_params.service_account_id,
    )
)]
async fn update_service_account(
    PgPool(mut conn): PgPool,
    AuthIdentity(identity): AuthIdentity,
    Path(path_params): Path<ServiceAccountPathParams>,
    ValidateJson(request): ValidateJson<ServiceAccountRequest>,
) -> Result<(StatusCode, Json<ServiceAccountDetail>)> {
    let input = request.into_input()?;
    let nested = lifecycle::update_with_nested(
        conn.connection(),
        &identity,
        path_params.service_account_id,
        input,
    )
    .await?;

    tracing::info!(target: TRACING_TARGET, "Service account updated");

    Ok((StatusCode::OK, Json(ServiceAccountDetail::from_nested(nested))))
}

fn update_service_account_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update service account")
        .description(
            "Replaces the account's name, email, roles and permissions. An omitted \
            picture keeps the stored one. The authentication type cannot change.",
        )
        .response::<200, Json<ServiceAccountDetail>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Returns an [`ApiRouter`] with service account routes.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/service_accounts",
            get_with(list_service_accounts, list_service_accounts_docs)
                .post_with(create_service_account, create_service_account_docs),
        )
        .api_route(
            "/service_accounts/search",
            get_with(search_service_accounts, search_service_accounts_docs),
        )
        .api_route(
            "/service_accounts/{serviceAccountId}",
            get_with(read_service_account, read_service_account_docs)
                .put_with(update_service_account, update_service_account_docs),
        )
        .with_path_items(|item| item.tag("Service Accounts"))
}
