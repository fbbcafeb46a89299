//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Authentication: resolves the `Authorization` header to an identity.
//! - Recovery: panics, timeouts and tower service errors.
//! - Observability: request ids, tracing spans, header redaction.
//! - Specification: OpenAPI JSON and the Scalar UI.

mod authentication;
mod observability;
mod recovery;
mod specification;

pub use authentication::{
    HEADER_ACCESS_TOKEN, HEADER_EMAIL, HEADER_SERVICE_ACCOUNT_NAME, RouterAuthExt,
    require_authentication,
};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
