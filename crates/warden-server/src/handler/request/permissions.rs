//! Permission check request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters for a single permission check.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HasPermissionQuery {
    /// Permission string, `<service>::<level>::<action>::<resource>`.
    #[validate(length(min = 1, max = 1024))]
    pub permission: String,
}

/// Request payload for a batch permission check.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HasPermissions {
    /// Permission strings to check, answered in order.
    #[validate(length(max = 256))]
    pub permissions: Vec<String>,
}
