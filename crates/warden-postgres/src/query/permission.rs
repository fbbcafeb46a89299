//! Permission repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewRolePermission, RolePermission};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for permissions attached to roles.
pub trait PermissionRepository {
    /// Attaches a permission to a role.
    fn create_permission(
        &mut self,
        new_permission: NewRolePermission,
    ) -> impl Future<Output = PgResult<RolePermission>> + Send;

    /// Lists the permissions attached to any of `role_ids`.
    fn list_permissions_for_roles(
        &mut self,
        role_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<RolePermission>>> + Send;

    /// Removes every permission attached to a role. Returns the number of
    /// removed permissions.
    fn drop_role_permissions(
        &mut self,
        role_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl PermissionRepository for PgConnection {
    async fn create_permission(
        &mut self,
        new_permission: NewRolePermission,
    ) -> PgResult<RolePermission> {
        use schema::permissions;

        diesel::insert_into(permissions::table)
            .values(&new_permission)
            .returning(RolePermission::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_permissions_for_roles(
        &mut self,
        role_ids: &[Uuid],
    ) -> PgResult<Vec<RolePermission>> {
        use schema::permissions::{self, dsl};

        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        permissions::table
            .filter(dsl::role_id.eq_any(role_ids))
            .order(dsl::created_at.asc())
            .select(RolePermission::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn drop_role_permissions(&mut self, role_id: Uuid) -> PgResult<usize> {
        use schema::permissions::{self, dsl};

        diesel::delete(permissions::table.filter(dsl::role_id.eq(role_id)))
            .execute(self)
            .await
            .map_err(PgError::from)
    }
}
