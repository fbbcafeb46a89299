//! Database query repositories for all entities in the system.
//!
//! Each repository is a trait with `impl Future` methods, implemented for
//! [`PgConnection`]. The service layer is generic over [`AccessStore`], so
//! any store implementing every repository plus [`UnitOfWork`] can stand in
//! for Postgres.
//!
//! # Pagination
//!
//! All queries that may return large result sets use the [`Pagination`]
//! struct to provide consistent, bounded pagination across the system.
//!
//! [`PgConnection`]: crate::PgConnection

mod permission;
mod role;
mod service_account;
mod unit_of_work;

pub use permission::PermissionRepository;
pub use role::RoleRepository;
use serde::{Deserialize, Serialize};
pub use service_account::{ServiceAccountRepository, resource_ancestors};
pub use unit_of_work::UnitOfWork;

/// Every repository plus transaction control.
pub trait AccessStore:
    ServiceAccountRepository + RoleRepository + PermissionRepository + UnitOfWork + Send
{
}

impl<T> AccessStore for T where
    T: ServiceAccountRepository + RoleRepository + PermissionRepository + UnitOfWork + Send
{
}

/// Pagination parameters for database queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: i64,
    /// Number of records to skip.
    pub offset: i64,
}

impl Pagination {
    /// Largest page a caller may request.
    pub const MAX_LIMIT: i64 = 1000;

    /// Creates a new pagination instance.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }

    /// Creates pagination from page number and page size.
    pub fn from_page(page: i64, page_size: i64) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, Self::MAX_LIMIT);
        Self::new(page_size, (page - 1) * page_size)
    }

    /// Gets the current page number (1-based).
    pub fn page_number(&self) -> i64 {
        (self.offset / self.limit) + 1
    }

    /// Gets the page size.
    pub fn page_size(&self) -> i64 {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(50, 0)
    }
}
