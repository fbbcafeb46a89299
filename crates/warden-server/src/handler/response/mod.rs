//! Response types for HTTP handlers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod errors;
mod health;
mod permissions;
mod service_accounts;

pub use errors::*;
pub use health::*;
pub use permissions::*;
pub use service_accounts::*;

/// Generic offset-paginated response wrapper.
///
/// `count` is the total number of records matching the query, not the
/// length of `results`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "{T}List")]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    /// Total count of matching records.
    pub count: i64,
    /// Records in this page.
    pub results: Vec<T>,
}

impl<T> Listing<T> {
    /// Creates a listing from a page of records and the total count.
    pub fn new(results: Vec<T>, count: i64) -> Self {
        Self { count, results }
    }

    /// Creates a listing by mapping each record of a page.
    pub fn from_page<M, F>((records, count): (Vec<M>, i64), f: F) -> Self
    where
        F: FnMut(M) -> T,
    {
        Self::new(records.into_iter().map(f).collect(), count)
    }
}
