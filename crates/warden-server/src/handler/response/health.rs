//! Health check response types.

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use warden_postgres::PgPoolStatus;

/// Liveness report with connection pool statistics.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Whether the service considers itself healthy.
    pub is_healthy: bool,
    /// Whether the connection pool is saturated.
    pub is_under_pressure: bool,
    /// Maximum number of pooled connections.
    pub pool_max_size: usize,
    /// Connections currently open.
    pub pool_size: usize,
    /// Open connections not in use.
    pub pool_available: usize,
    /// Requests waiting for a connection.
    pub pool_waiting: usize,
    /// Time the report was produced.
    pub checked_at: Timestamp,
}

impl Health {
    pub fn from_pool_status(status: PgPoolStatus) -> Self {
        Self {
            is_healthy: true,
            is_under_pressure: status.is_under_pressure(),
            pool_max_size: status.max_size,
            pool_size: status.size,
            pool_available: status.available,
            pool_waiting: status.waiting,
            checked_at: Timestamp::now(),
        }
    }
}
