//! Role binding model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::role_bindings;

/// Binds a service account to a role.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = role_bindings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleBinding {
    /// Unique binding identifier.
    pub id: Uuid,
    /// Bound service account.
    pub service_account_id: Uuid,
    /// Bound role.
    pub role_id: Uuid,
    /// Timestamp when the binding was created.
    pub created_at: Timestamp,
}

/// Data for creating a new role binding.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = role_bindings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRoleBinding {
    /// Service account to bind.
    pub service_account_id: Uuid,
    /// Role to bind to.
    pub role_id: Uuid,
}
