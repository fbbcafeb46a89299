//! Role model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::roles;

/// A named set of permissions that accounts can be bound to.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Human-readable role name.
    pub name: String,
    /// Whether this is the private role of a single service account.
    pub is_base_role: bool,
    /// Timestamp when the role was created.
    pub created_at: Timestamp,
    /// Timestamp when the role was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new role.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRole {
    /// Human-readable role name.
    pub name: String,
    /// Whether this is the private role of a single service account.
    pub is_base_role: bool,
}

impl NewRole {
    /// Creates a shareable role.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_base_role: false,
        }
    }

    /// Creates the base role of the given service account.
    pub fn base_for(service_account_id: Uuid) -> Self {
        Self {
            name: format!("service-account:{service_account_id}"),
            is_base_role: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_role_name() {
        let id = Uuid::nil();
        let role = NewRole::base_for(id);
        assert!(role.is_base_role);
        assert_eq!(role.name, format!("service-account:{id}"));
        assert!(!NewRole::new("ops").is_base_role);
    }
}
