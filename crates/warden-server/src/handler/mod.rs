//! All `aide::axum::`[`ApiRouter`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use aide::openapi::OpenApi;
//! use warden_server::handler::routes;
//! use warden_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example(config: ServiceConfig) -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&config).await?;
//! let router = routes(state.clone()).with_state(state);
//!
//! let mut api = OpenApi::default();
//! let app: axum::Router = router.finish_api(&mut api);
//! # Ok(())
//! # }
//! ```
//!
//! [`Handler`]: axum::handler::Handler

mod error;
mod health;
mod permissions;
mod request;
mod response;
mod service_accounts;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::request::Pagination;
pub use crate::handler::response::ValidationErrorDetail;
use crate::middleware::RouterAuthExt;
use crate::service::ServiceState;

/// Tracing target for handler-level events.
pub(crate) const TRACING_TARGET: &str = "warden_server::handler";

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes that require credentials.
fn private_routes(state: ServiceState) -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(permissions::routes())
        .merge(service_accounts::routes())
        .with_authentication(state)
}

/// Returns an [`ApiRouter`] with all public routes.
fn public_routes() -> ApiRouter<ServiceState> {
    ApiRouter::new().merge(health::routes())
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes(state: ServiceState) -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(private_routes(state))
        .merge(public_routes())
        .fallback(handler)
}
