//! PostgreSQL connection extractor for request handlers.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut};
use warden_postgres::error::ErrorHint;
use warden_postgres::{PgClient, PgConn, PgError};

use crate::handler::{Error, ErrorKind};

/// Tracing target for connection acquisition.
const TRACING_TARGET: &str = "warden_server::extract::postgres";

/// Extractor that provides a database connection from the pool.
///
/// The connection is returned to the pool when the extractor is dropped.
///
/// ```rust,ignore
/// async fn get_account(PgPool(mut conn): PgPool) {
///     lifecycle::get_with_nested(conn.connection(), id).await?;
/// }
/// ```
#[derive(Debug, Deref, DerefMut)]
pub struct PgPool(pub PgConn);

impl<S> FromRequestParts<S> for PgPool
where
    PgClient: FromRef<S>,
    S: Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let conn = PgClient::from_ref(state)
            .get_connection()
            .await
            .map_err(unavailable)?;

        Ok(PgPool(conn))
    }
}

fn unavailable(error: PgError) -> Error<'static> {
    let context = match &error {
        PgError::Timeout(timeout) => timeout.hint().into_owned(),
        other => other.to_string(),
    };

    tracing::error!(
        target: TRACING_TARGET,
        error = %error,
        transient = error.is_transient(),
        "Failed to acquire database connection"
    );

    ErrorKind::InternalServerError
        .with_message("Database connection unavailable")
        .with_context(context)
}

impl aide::OperationInput for PgPool {}

#[cfg(test)]
mod tests {
    use warden_postgres::error::TimeoutType;

    use super::*;

    #[test]
    fn pool_timeouts_carry_a_hint() {
        let error = unavailable(PgError::Timeout(TimeoutType::Wait));
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert!(error.context().is_some_and(|c| c.contains("pool is exhausted")));
    }
}
