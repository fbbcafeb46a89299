//! Permission check response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of a batch permission check.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HasPermissions {
    /// One entry per requested permission, in request order.
    pub results: Vec<bool>,
}
