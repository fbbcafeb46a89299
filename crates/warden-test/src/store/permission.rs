use uuid::Uuid;
use warden_postgres::PgResult;
use warden_postgres::model::{NewRolePermission, RolePermission};
use warden_postgres::query::PermissionRepository;

use super::{MemoryStore, Operation, now, violation};

const TABLE: &str = "permissions";

impl PermissionRepository for MemoryStore {
    async fn create_permission(
        &mut self,
        new_permission: NewRolePermission,
    ) -> PgResult<RolePermission> {
        let mut shared = self.enter(Operation::CreatePermission)?;
        let tables = &mut shared.tables;

        if new_permission.service.is_empty() {
            return Err(violation::check(TABLE, "permissions_service_not_empty"));
        }
        if new_permission.action.is_empty() {
            return Err(violation::check(TABLE, "permissions_action_not_empty"));
        }
        if new_permission.resource.is_empty() {
            return Err(violation::check(TABLE, "permissions_resource_not_empty"));
        }
        if !tables.roles.iter().any(|r| r.id == new_permission.role_id) {
            return Err(violation::foreign_key(TABLE, "permissions_role_id_fkey"));
        }

        let row = RolePermission {
            id: Uuid::new_v4(),
            role_id: new_permission.role_id,
            service: new_permission.service,
            ownership_level: new_permission.ownership_level,
            action: new_permission.action,
            resource: new_permission.resource,
            alias: new_permission.alias,
            created_at: now(),
        };

        tables.permissions.push(row.clone());
        Ok(row)
    }

    async fn list_permissions_for_roles(
        &mut self,
        role_ids: &[Uuid],
    ) -> PgResult<Vec<RolePermission>> {
        let shared = self.enter(Operation::ListPermissionsForRoles)?;
        Ok(shared
            .tables
            .permissions
            .iter()
            .filter(|row| role_ids.contains(&row.role_id))
            .cloned()
            .collect())
    }

    async fn drop_role_permissions(&mut self, role_id: Uuid) -> PgResult<usize> {
        let mut shared = self.enter(Operation::DropRolePermissions)?;
        let permissions = &mut shared.tables.permissions;

        let before = permissions.len();
        permissions.retain(|row| row.role_id != role_id);
        Ok(before - permissions.len())
    }
}
