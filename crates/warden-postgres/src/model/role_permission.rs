//! Permission model attached to a role.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;
use warden_core::{Permission, PermissionGrant};

use crate::schema::permissions;
use crate::types::OwnershipLevel;

/// A permission row, attached to exactly one role.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RolePermission {
    /// Unique permission identifier.
    pub id: Uuid,
    /// Role the permission is attached to.
    pub role_id: Uuid,
    /// Service namespace.
    pub service: String,
    /// Ownership level of the grant.
    pub ownership_level: OwnershipLevel,
    /// Granted action.
    pub action: String,
    /// Resource path or `*`.
    pub resource: String,
    /// Optional label for the grant.
    pub alias: Option<String>,
    /// Timestamp when the permission was created.
    pub created_at: Timestamp,
}

impl RolePermission {
    /// Converts the row into a domain permission.
    pub fn to_permission(&self) -> warden_core::Result<Permission> {
        Permission::new(
            self.service.as_str(),
            self.ownership_level.into(),
            self.action.as_str(),
            self.resource.as_str(),
        )
    }

    /// Converts the row into a domain grant, keeping the alias.
    pub fn to_grant(&self) -> warden_core::Result<PermissionGrant> {
        Ok(PermissionGrant {
            permission: self.to_permission()?,
            alias: self.alias.clone(),
        })
    }
}

/// Data for attaching a new permission to a role.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRolePermission {
    /// Role to attach the permission to.
    pub role_id: Uuid,
    /// Service namespace.
    pub service: String,
    /// Ownership level of the grant.
    pub ownership_level: OwnershipLevel,
    /// Granted action.
    pub action: String,
    /// Resource path or `*`.
    pub resource: String,
    /// Optional label for the grant.
    pub alias: Option<String>,
}

impl NewRolePermission {
    /// Prepares `grant` for insertion on `role_id`.
    pub fn new(role_id: Uuid, grant: &PermissionGrant) -> Self {
        let permission = &grant.permission;
        Self {
            role_id,
            service: permission.service().to_owned(),
            ownership_level: permission.ownership_level().into(),
            action: permission.action().to_owned(),
            resource: permission.resource().to_string(),
            alias: grant.alias.clone(),
        }
    }
}
