//! Liveness and connection pool status.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use warden_postgres::PgClient;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::Health;
use crate::service::ServiceState;

/// Tracing target for health checks.
const TRACING_TARGET: &str = "warden_server::handler::health";

/// Reports whether a database connection can be acquired.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(pg_client): State<PgClient>,
) -> Result<(StatusCode, Json<Health>)> {
    let is_connected = match pg_client.get_connection().await {
        Ok(_conn) => true,
        Err(error) => {
            tracing::warn!(target: TRACING_TARGET, error = %error, "Health check failed");
            false
        }
    };

    let response = Health {
        is_healthy: is_connected,
        ..Health::from_pool_status(pg_client.pool_status())
    };

    let status_code = if response.is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy = response.is_healthy,
        status_code = status_code.as_u16(),
        "Health status response prepared"
    );

    Ok((status_code, Json(response)))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health status")
        .description("Reports liveness, database reachability and connection pool statistics.")
        .response::<200, Json<Health>>()
        .response::<503, Json<Health>>()
}

/// Returns an [`ApiRouter`] with the public health route.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Health"))
}
