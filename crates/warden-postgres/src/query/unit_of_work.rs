//! Explicit transaction control.

use std::future::Future;

use diesel_async::{AnsiTransactionManager, TransactionManager};

use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY};

/// A store whose writes can be grouped into one atomic unit.
///
/// Every `begin` must be matched by exactly one `commit` or `rollback`.
/// Reads issued between `begin` and the end of the unit observe its
/// uncommitted writes.
pub trait UnitOfWork {
    /// Starts a unit of work.
    fn begin(&mut self) -> impl Future<Output = PgResult<()>> + Send;

    /// Makes every write since `begin` durable.
    fn commit(&mut self) -> impl Future<Output = PgResult<()>> + Send;

    /// Discards every write since `begin`.
    fn rollback(&mut self) -> impl Future<Output = PgResult<()>> + Send;
}

impl UnitOfWork for PgConnection {
    async fn begin(&mut self) -> PgResult<()> {
        tracing::trace!(target: TRACING_TARGET_QUERY, "Beginning transaction");
        AnsiTransactionManager::begin_transaction(self)
            .await
            .map_err(PgError::from)
    }

    async fn commit(&mut self) -> PgResult<()> {
        tracing::trace!(target: TRACING_TARGET_QUERY, "Committing transaction");
        AnsiTransactionManager::commit_transaction(self)
            .await
            .map_err(PgError::from)
    }

    async fn rollback(&mut self) -> PgResult<()> {
        tracing::trace!(target: TRACING_TARGET_QUERY, "Rolling back transaction");
        AnsiTransactionManager::rollback_transaction(self)
            .await
            .map_err(PgError::from)
    }
}
