use uuid::Uuid;
use warden_core::Permission;
use warden_postgres::PgResult;
use warden_postgres::model::{NewServiceAccount, ServiceAccount, UpdateServiceAccount};
use warden_postgres::query::{Pagination, ServiceAccountRepository};
use warden_postgres::types::AuthenticationType;

use super::{MemoryStore, Operation, Tables, now, violation};

const TABLE: &str = "service_accounts";

fn page(mut accounts: Vec<ServiceAccount>, pagination: Pagination) -> Vec<ServiceAccount> {
    accounts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    accounts
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect()
}

fn matches_term(account: &ServiceAccount, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    account.name.to_lowercase().contains(&term)
        || account
            .email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().contains(&term))
}

fn check_row(tables: &Tables, account: &ServiceAccount) -> PgResult<()> {
    if account.name.trim().is_empty() {
        return Err(violation::check(TABLE, "service_accounts_name_not_empty"));
    }

    if account.authentication_type == AuthenticationType::OAuth2 && account.email.is_none() {
        return Err(violation::check(
            TABLE,
            "service_accounts_oauth2_requires_email",
        ));
    }

    if account.authentication_type == AuthenticationType::KeyPair && account.email.is_some() {
        return Err(violation::check(
            TABLE,
            "service_accounts_keypair_forbids_email",
        ));
    }

    if account.authentication_type == AuthenticationType::KeyPair
        && (account.key_id.is_none() || account.key_secret_digest.is_none())
    {
        return Err(violation::check(TABLE, "service_accounts_keypair_requires_key"));
    }

    let others = tables
        .service_accounts
        .iter()
        .filter(|other| other.id != account.id);

    for other in others {
        if account.email.is_some() && other.email == account.email {
            return Err(violation::unique(TABLE, "service_accounts_email_unique_idx"));
        }
        if account.key_id.is_some() && other.key_id == account.key_id {
            return Err(violation::unique(TABLE, "service_accounts_key_id_unique_idx"));
        }
        if other.base_role_id == account.base_role_id {
            return Err(violation::unique(
                TABLE,
                "service_accounts_base_role_unique_idx",
            ));
        }
    }

    Ok(())
}

/// Returns whether `account` holds `permission` through any bound role.
fn holds(tables: &Tables, account: &ServiceAccount, permission: &Permission) -> bool {
    tables
        .role_bindings
        .iter()
        .filter(|binding| binding.service_account_id == account.id)
        .flat_map(|binding| {
            tables
                .permissions
                .iter()
                .filter(move |row| row.role_id == binding.role_id)
        })
        .filter_map(|row| row.to_permission().ok())
        .any(|held| permission.is_satisfied_by(&held))
}

impl ServiceAccountRepository for MemoryStore {
    async fn create_service_account(
        &mut self,
        new_account: NewServiceAccount,
    ) -> PgResult<ServiceAccount> {
        let mut shared = self.enter(Operation::CreateServiceAccount)?;
        let tables = &mut shared.tables;

        if tables.service_accounts.iter().any(|a| a.id == new_account.id) {
            return Err(violation::unique(TABLE, "service_accounts_pkey"));
        }
        if !tables.roles.iter().any(|r| r.id == new_account.base_role_id) {
            return Err(violation::foreign_key(
                TABLE,
                "service_accounts_base_role_id_fkey",
            ));
        }

        let created_at = now();
        let account = ServiceAccount {
            id: new_account.id,
            name: new_account.name.trim().to_owned(),
            email: new_account.email.map(|email| email.trim().to_owned()),
            picture: new_account.picture,
            authentication_type: new_account.authentication_type,
            base_role_id: new_account.base_role_id,
            key_id: new_account.key_id,
            key_secret_digest: new_account.key_secret_digest,
            created_at,
            updated_at: created_at,
        };

        check_row(tables, &account)?;
        tables.service_accounts.push(account.clone());
        Ok(account)
    }

    async fn find_service_account_by_id(
        &mut self,
        service_account_id: Uuid,
    ) -> PgResult<Option<ServiceAccount>> {
        let shared = self.enter(Operation::FindServiceAccountById)?;
        Ok(shared
            .tables
            .service_accounts
            .iter()
            .find(|a| a.id == service_account_id)
            .cloned())
    }

    async fn find_service_account_by_email(
        &mut self,
        email: &str,
    ) -> PgResult<Option<ServiceAccount>> {
        let shared = self.enter(Operation::FindServiceAccountByEmail)?;
        let email = email.trim();
        Ok(shared
            .tables
            .service_accounts
            .iter()
            .find(|a| {
                a.authentication_type == AuthenticationType::OAuth2
                    && a.email.as_deref() == Some(email)
            })
            .cloned())
    }

    async fn find_service_account_by_key_pair(
        &mut self,
        key_id: &str,
        key_secret_digest: &str,
    ) -> PgResult<Option<ServiceAccount>> {
        let shared = self.enter(Operation::FindServiceAccountByKeyPair)?;
        Ok(shared
            .tables
            .service_accounts
            .iter()
            .find(|a| {
                a.key_id.as_deref() == Some(key_id)
                    && a.key_secret_digest.as_deref() == Some(key_secret_digest)
            })
            .cloned())
    }

    async fn update_service_account(
        &mut self,
        service_account_id: Uuid,
        updates: UpdateServiceAccount,
    ) -> PgResult<ServiceAccount> {
        let mut shared = self.enter(Operation::UpdateServiceAccount)?;
        let tables = &mut shared.tables;

        let Some(index) = tables
            .service_accounts
            .iter()
            .position(|a| a.id == service_account_id)
        else {
            return Err(violation::not_found());
        };

        if updates.is_empty() {
            return Ok(tables.service_accounts[index].clone());
        }

        let mut account = tables.service_accounts[index].clone();
        if let Some(name) = updates.name {
            account.name = name.trim().to_owned();
        }
        if let Some(email) = updates.email {
            account.email = email.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty());
        }
        if let Some(picture) = updates.picture {
            account.picture = picture;
        }
        account.updated_at = now();

        check_row(tables, &account)?;
        tables.service_accounts[index] = account.clone();
        Ok(account)
    }

    async fn list_service_accounts(
        &mut self,
        pagination: Pagination,
    ) -> PgResult<Vec<ServiceAccount>> {
        let shared = self.enter(Operation::ListServiceAccounts)?;
        Ok(page(shared.tables.service_accounts.clone(), pagination))
    }

    async fn count_service_accounts(&mut self) -> PgResult<i64> {
        let shared = self.enter(Operation::CountServiceAccounts)?;
        Ok(shared.tables.service_accounts.len() as i64)
    }

    async fn search_service_accounts(
        &mut self,
        term: &str,
        pagination: Pagination,
    ) -> PgResult<Vec<ServiceAccount>> {
        let shared = self.enter(Operation::SearchServiceAccounts)?;
        let found = shared
            .tables
            .service_accounts
            .iter()
            .filter(|a| matches_term(a, term))
            .cloned()
            .collect();
        Ok(page(found, pagination))
    }

    async fn count_search_service_accounts(&mut self, term: &str) -> PgResult<i64> {
        let shared = self.enter(Operation::CountSearchServiceAccounts)?;
        let count = shared
            .tables
            .service_accounts
            .iter()
            .filter(|a| matches_term(a, term))
            .count();
        Ok(count as i64)
    }

    async fn list_service_accounts_with_permission(
        &mut self,
        permission: &Permission,
        pagination: Pagination,
    ) -> PgResult<Vec<ServiceAccount>> {
        let shared = self.enter(Operation::ListServiceAccountsWithPermission)?;
        let tables = &shared.tables;
        let found = tables
            .service_accounts
            .iter()
            .filter(|a| holds(tables, a, permission))
            .cloned()
            .collect();
        Ok(page(found, pagination))
    }

    async fn count_service_accounts_with_permission(
        &mut self,
        permission: &Permission,
    ) -> PgResult<i64> {
        let shared = self.enter(Operation::CountServiceAccountsWithPermission)?;
        let tables = &shared.tables;
        let count = tables
            .service_accounts
            .iter()
            .filter(|a| holds(tables, a, permission))
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{PermissionGrant, build_permission};
    use warden_postgres::model::{NewRole, NewRoleBinding, NewRolePermission};
    use warden_postgres::query::{PermissionRepository, RoleRepository};

    use super::*;

    async fn oauth2_account(store: &mut MemoryStore, name: &str, email: &str) -> ServiceAccount {
        let id = Uuid::new_v4();
        let role = store.create_role(NewRole::base_for(id)).await.unwrap();
        let account = store
            .create_service_account(NewServiceAccount {
                id,
                name: name.to_owned(),
                email: Some(email.to_owned()),
                picture: None,
                authentication_type: AuthenticationType::OAuth2,
                base_role_id: role.id,
                key_id: None,
                key_secret_digest: None,
            })
            .await
            .unwrap();
        store
            .bind_role(NewRoleBinding {
                service_account_id: id,
                role_id: role.id,
            })
            .await
            .unwrap();
        account
    }

    #[tokio::test]
    async fn email_is_unique() {
        let mut store = MemoryStore::new();
        oauth2_account(&mut store, "first", "a@example.com").await;

        let id = Uuid::new_v4();
        let role = store.create_role(NewRole::base_for(id)).await.unwrap();
        let error = store
            .create_service_account(NewServiceAccount {
                id,
                name: "second".to_owned(),
                email: Some(" a@example.com ".to_owned()),
                picture: None,
                authentication_type: AuthenticationType::OAuth2,
                base_role_id: role.id,
                key_id: None,
                key_secret_digest: None,
            })
            .await
            .unwrap_err();

        assert!(error.is_unique_violation());
        assert_eq!(error.constraint(), Some("service_accounts_email_unique_idx"));
    }

    #[tokio::test]
    async fn key_pair_rows_cannot_hold_an_email() {
        let mut store = MemoryStore::new();
        let id = Uuid::new_v4();
        let role = store.create_role(NewRole::base_for(id)).await.unwrap();
        let error = store
            .create_service_account(NewServiceAccount {
                id,
                name: "robot".to_owned(),
                email: Some("someone@example.com".to_owned()),
                picture: None,
                authentication_type: AuthenticationType::KeyPair,
                base_role_id: role.id,
                key_id: Some("key".to_owned()),
                key_secret_digest: Some("digest".to_owned()),
            })
            .await
            .unwrap_err();
        assert_eq!(
            error.constraint(),
            Some("service_accounts_keypair_forbids_email")
        );
        assert!(
            store
                .find_service_account_by_email("someone@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn missing_base_role_is_rejected() {
        let mut store = MemoryStore::new();
        let error = store
            .create_service_account(NewServiceAccount {
                id: Uuid::new_v4(),
                name: "orphan".to_owned(),
                email: Some("o@example.com".to_owned()),
                picture: None,
                authentication_type: AuthenticationType::OAuth2,
                base_role_id: Uuid::new_v4(),
                key_id: None,
                key_secret_digest: None,
            })
            .await
            .unwrap_err();
        assert_eq!(error.constraint(), Some("service_accounts_base_role_id_fkey"));
    }

    #[tokio::test]
    async fn update_missing_account_is_not_found() {
        let mut store = MemoryStore::new();
        let error = store
            .update_service_account(Uuid::new_v4(), UpdateServiceAccount::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            warden_postgres::PgError::Query(diesel::result::Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_ordered() {
        let mut store = MemoryStore::new();
        oauth2_account(&mut store, "zeta", "z@Example.com").await;
        oauth2_account(&mut store, "alpha", "a@example.com").await;
        oauth2_account(&mut store, "other", "o@elsewhere.org").await;

        let found = store
            .search_service_accounts("EXAMPLE", Pagination::default())
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(store.count_search_service_accounts("example").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn with_permission_follows_bindings() {
        let mut store = MemoryStore::new();
        let holder = oauth2_account(&mut store, "holder", "h@example.com").await;
        oauth2_account(&mut store, "bystander", "b@example.com").await;

        let grant = PermissionGrant::new(build_permission("dc::Owner::read::*").unwrap());
        store
            .create_permission(NewRolePermission::new(holder.base_role_id, &grant))
            .await
            .unwrap();

        let requested = build_permission("dc::Lender::read::rack/1").unwrap();
        let found = store
            .list_service_accounts_with_permission(&requested, Pagination::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, holder.id);
        assert_eq!(
            store
                .count_service_accounts_with_permission(&requested)
                .await
                .unwrap(),
            1
        );
    }
}
