//! Page-based pagination parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;
use warden_postgres::query::Pagination as QueryPagination;

/// One-based page number and page size.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page to return, starting at 1.
    #[validate(range(min = 1, max = 100000))]
    pub page: Option<i64>,

    /// Records per page.
    #[validate(range(min = 1, max = 1000))]
    pub page_size: Option<i64>,
}

impl Pagination {
    /// Default page size.
    const DEFAULT_PAGE_SIZE: i64 = 20;

    /// Creates pagination for the given page and size.
    #[inline]
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

impl From<Pagination> for QueryPagination {
    fn from(pagination: Pagination) -> Self {
        QueryPagination::from_page(
            pagination.page.unwrap_or(1),
            pagination.page_size.unwrap_or(Pagination::DEFAULT_PAGE_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let pagination: QueryPagination = Pagination::default().into();
        assert_eq!(pagination.offset, 0);
        assert_eq!(pagination.limit, 20);
    }

    #[test]
    fn pages_are_one_based() {
        let pagination: QueryPagination = Pagination::new(3, 10).into();
        assert_eq!(pagination.offset, 20);
        assert_eq!(pagination.limit, 10);
    }

    #[test]
    fn rejects_zero_page() {
        assert!(Pagination::new(0, 10).validate().is_err());
        assert!(Pagination::new(1, 5000).validate().is_err());
    }
}
