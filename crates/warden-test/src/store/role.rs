use uuid::Uuid;
use warden_postgres::PgResult;
use warden_postgres::model::{NewRole, NewRoleBinding, Role, RoleBinding};
use warden_postgres::query::RoleRepository;

use super::{MemoryStore, Operation, now, violation};

impl RoleRepository for MemoryStore {
    async fn create_role(&mut self, new_role: NewRole) -> PgResult<Role> {
        let mut shared = self.enter(Operation::CreateRole)?;

        let name = new_role.name.trim().to_owned();
        if name.is_empty() {
            return Err(violation::check("roles", "roles_name_not_empty"));
        }

        let created_at = now();
        let role = Role {
            id: Uuid::new_v4(),
            name,
            is_base_role: new_role.is_base_role,
            created_at,
            updated_at: created_at,
        };

        shared.tables.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role_by_id(&mut self, role_id: Uuid) -> PgResult<Option<Role>> {
        let shared = self.enter(Operation::FindRoleById)?;
        Ok(shared.tables.roles.iter().find(|r| r.id == role_id).cloned())
    }

    async fn bind_role(&mut self, binding: NewRoleBinding) -> PgResult<RoleBinding> {
        let mut shared = self.enter(Operation::BindRole)?;
        let tables = &mut shared.tables;

        if !tables
            .service_accounts
            .iter()
            .any(|a| a.id == binding.service_account_id)
        {
            return Err(violation::foreign_key(
                "role_bindings",
                "role_bindings_service_account_id_fkey",
            ));
        }
        if !tables.roles.iter().any(|r| r.id == binding.role_id) {
            return Err(violation::foreign_key(
                "role_bindings",
                "role_bindings_role_id_fkey",
            ));
        }
        if tables.role_bindings.iter().any(|b| {
            b.service_account_id == binding.service_account_id && b.role_id == binding.role_id
        }) {
            return Err(violation::unique("role_bindings", "role_bindings_unique_idx"));
        }

        let row = RoleBinding {
            id: Uuid::new_v4(),
            service_account_id: binding.service_account_id,
            role_id: binding.role_id,
            created_at: now(),
        };

        tables.role_bindings.push(row.clone());
        Ok(row)
    }

    async fn list_role_bindings(&mut self, service_account_id: Uuid) -> PgResult<Vec<RoleBinding>> {
        let shared = self.enter(Operation::ListRoleBindings)?;
        Ok(shared
            .tables
            .role_bindings
            .iter()
            .filter(|b| b.service_account_id == service_account_id)
            .cloned()
            .collect())
    }

    async fn list_roles_for_service_account(
        &mut self,
        service_account_id: Uuid,
    ) -> PgResult<Vec<Role>> {
        let shared = self.enter(Operation::ListRolesForServiceAccount)?;
        let tables = &shared.tables;

        let mut roles: Vec<Role> = tables
            .role_bindings
            .iter()
            .filter(|b| b.service_account_id == service_account_id)
            .filter_map(|b| tables.roles.iter().find(|r| r.id == b.role_id))
            .cloned()
            .collect();

        roles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(roles)
    }

    async fn drop_non_base_role_bindings(
        &mut self,
        service_account_id: Uuid,
        base_role_id: Uuid,
    ) -> PgResult<usize> {
        let mut shared = self.enter(Operation::DropNonBaseRoleBindings)?;
        let bindings = &mut shared.tables.role_bindings;

        let before = bindings.len();
        bindings.retain(|b| b.service_account_id != service_account_id || b.role_id == base_role_id);
        Ok(before - bindings.len())
    }
}

#[cfg(test)]
mod tests {
    use warden_postgres::model::NewServiceAccount;
    use warden_postgres::query::ServiceAccountRepository;
    use warden_postgres::types::AuthenticationType;

    use super::*;

    async fn key_pair_account(store: &mut MemoryStore) -> (Uuid, Uuid) {
        let id = Uuid::new_v4();
        let base = store.create_role(NewRole::base_for(id)).await.unwrap();
        store
            .create_service_account(NewServiceAccount {
                id,
                name: "robot".to_owned(),
                email: None,
                picture: None,
                authentication_type: AuthenticationType::KeyPair,
                base_role_id: base.id,
                key_id: Some(Uuid::new_v4().to_string()),
                key_secret_digest: Some("digest".to_owned()),
            })
            .await
            .unwrap();
        store
            .bind_role(NewRoleBinding {
                service_account_id: id,
                role_id: base.id,
            })
            .await
            .unwrap();
        (id, base.id)
    }

    #[tokio::test]
    async fn duplicate_binding_is_rejected() {
        let mut store = MemoryStore::new();
        let (account_id, base_role_id) = key_pair_account(&mut store).await;

        let error = store
            .bind_role(NewRoleBinding {
                service_account_id: account_id,
                role_id: base_role_id,
            })
            .await
            .unwrap_err();
        assert!(error.is_unique_violation());
        assert_eq!(error.constraint(), Some("role_bindings_unique_idx"));
    }

    #[tokio::test]
    async fn binding_unknown_role_is_rejected() {
        let mut store = MemoryStore::new();
        let (account_id, _) = key_pair_account(&mut store).await;

        let error = store
            .bind_role(NewRoleBinding {
                service_account_id: account_id,
                role_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_eq!(error.constraint(), Some("role_bindings_role_id_fkey"));
    }

    #[tokio::test]
    async fn dropping_bindings_keeps_base_role() {
        let mut store = MemoryStore::new();
        let (account_id, base_role_id) = key_pair_account(&mut store).await;

        for name in ["ops", "audit"] {
            let role = store.create_role(NewRole::new(name)).await.unwrap();
            store
                .bind_role(NewRoleBinding {
                    service_account_id: account_id,
                    role_id: role.id,
                })
                .await
                .unwrap();
        }

        let roles = store.list_roles_for_service_account(account_id).await.unwrap();
        assert_eq!(roles.len(), 3);
        assert_eq!(roles[0].name, "audit");

        let dropped = store
            .drop_non_base_role_bindings(account_id, base_role_id)
            .await
            .unwrap();
        assert_eq!(dropped, 2);

        let bindings = store.list_role_bindings(account_id).await.unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].role_id, base_role_id);
    }
}
