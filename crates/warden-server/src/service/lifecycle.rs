//! Service account creation, update and lookup.
//!
//! Nested writes run inside one unit of work. The caller is authorized
//! against the unit's own view of storage before anything is validated or
//! written, and any failure rolls the whole unit back.

use std::borrow::Cow;
use std::collections::HashMap;

use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};
use warden_core::{AuthenticationType, Identity, KeyPair, PermissionGrant};
use warden_postgres::model::{
    NewRole, NewRoleBinding, NewRolePermission, NewServiceAccount, Role, ServiceAccount,
    UpdateServiceAccount,
};
use warden_postgres::query::{AccessStore, Pagination};

use super::authz::{first_missing_owner, get_permissions, require_service_account, roles_permissions};
use crate::{Error, Result, TRACING_TARGET_LIFECYCLE};

/// Submitted state of a service account and everything nested in it.
#[derive(Debug, Clone, Default, Validate)]
pub struct ServiceAccountInput {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(max = 2048, message = "Picture URL is too long"))]
    pub picture: Option<String>,
    /// Required on create; must match the stored type on update.
    pub authentication_type: Option<AuthenticationType>,
    /// Grants attached to the account's base role.
    pub permissions: Vec<PermissionGrant>,
    /// Shared roles bound to the account.
    pub role_ids: Vec<Uuid>,
}

impl ServiceAccountInput {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_owned();
        self.email = non_blank(self.email.take());
        self.picture = non_blank(self.picture.take());

        let mut seen = Vec::with_capacity(self.role_ids.len());
        self.role_ids.retain(|role_id| {
            if seen.contains(role_id) {
                return false;
            }
            seen.push(*role_id);
            true
        });
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// A freshly created account.
///
/// `key_pair` holds the only plaintext copy of a key-pair secret.
#[derive(Debug, Clone)]
pub struct CreatedServiceAccount {
    pub service_account: ServiceAccount,
    pub key_pair: Option<KeyPair>,
}

/// An account with its base-role grants and bound shared roles.
#[derive(Debug, Clone)]
pub struct ServiceAccountWithNested {
    pub service_account: ServiceAccount,
    pub permissions: Vec<PermissionGrant>,
    pub roles: Vec<Role>,
}

impl ServiceAccountWithNested {
    /// Returns the alias of every aliased grant, keyed by permission string.
    pub fn permission_aliases(&self) -> HashMap<String, String> {
        self.permissions
            .iter()
            .filter_map(|grant| {
                grant
                    .alias
                    .as_ref()
                    .map(|alias| (grant.permission.to_string(), alias.clone()))
            })
            .collect()
    }
}

/// Builds an unsaved key-pair account with a fresh key pair.
///
/// Only the digest of the secret ends up in the returned row.
pub fn build_key_pair_service_account(
    id: Uuid,
    name: impl Into<String>,
    base_role_id: Uuid,
) -> (NewServiceAccount, KeyPair) {
    let key_pair = KeyPair::generate();
    let account = NewServiceAccount {
        id,
        name: name.into(),
        email: None,
        picture: None,
        authentication_type: AuthenticationType::KeyPair.into(),
        base_role_id,
        key_id: Some(key_pair.key_id.clone()),
        key_secret_digest: Some(key_pair.digest()),
    };

    (account, key_pair)
}

/// Commits on success, rolls back on failure.
async fn finish<C, T>(store: &mut C, result: Result<T>) -> Result<T>
where
    C: AccessStore,
{
    match result {
        Ok(value) => {
            store.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = store.rollback().await {
                tracing::error!(
                    target: TRACING_TARGET_LIFECYCLE,
                    error = %rollback_error,
                    "Failed to roll back unit of work"
                );
            }
            Err(error)
        }
    }
}

/// Inserts the base role, the account and the base-role binding.
async fn insert_service_account<C: AccessStore>(
    store: &mut C,
    name: String,
    email: Option<String>,
    picture: Option<String>,
    authentication_type: AuthenticationType,
) -> Result<CreatedServiceAccount> {
    let id = Uuid::new_v4();
    let base_role = store.create_role(NewRole::base_for(id)).await?;

    // Email lookups resolve OAuth2 logins, so key-pair rows never carry one.
    let (new_account, key_pair) = match authentication_type {
        AuthenticationType::KeyPair => {
            let (account, key_pair) = build_key_pair_service_account(id, name, base_role.id);
            (NewServiceAccount { picture, ..account }, Some(key_pair))
        }
        AuthenticationType::OAuth2 => (
            NewServiceAccount {
                id,
                name,
                email,
                picture,
                authentication_type: AuthenticationType::OAuth2.into(),
                base_role_id: base_role.id,
                key_id: None,
                key_secret_digest: None,
            },
            None,
        ),
    };

    let service_account = store.create_service_account(new_account).await?;
    store
        .bind_role(NewRoleBinding {
            service_account_id: service_account.id,
            role_id: base_role.id,
        })
        .await?;

    tracing::info!(
        target: TRACING_TARGET_LIFECYCLE,
        service_account_id = %service_account.id,
        authentication_type = %authentication_type,
        "Service account created"
    );

    Ok(CreatedServiceAccount {
        service_account,
        key_pair,
    })
}

/// Requires the caller to own every grant it hands out.
async fn authorize_delegation<C: AccessStore>(
    store: &mut C,
    caller: &Identity,
    input: &ServiceAccountInput,
) -> Result<()> {
    let held = get_permissions(store, caller.service_account_id).await?;
    let from_roles = roles_permissions(store, &input.role_ids).await?;
    let inline = input.permissions.iter().map(|grant| &grant.permission);

    if let Some(missing) = first_missing_owner(&held, from_roles.iter().chain(inline)) {
        tracing::warn!(
            target: TRACING_TARGET_LIFECYCLE,
            caller = %caller.service_account_id,
            permission = %missing,
            "Delegation denied"
        );
        return Err(Error::insufficient_permission(&missing));
    }

    Ok(())
}

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Checks the input against field rules and the stored roles.
async fn validate_input<C: AccessStore>(
    store: &mut C,
    input: &ServiceAccountInput,
    current: Option<&ServiceAccount>,
) -> Result<()> {
    let mut errors = input.validate().err().unwrap_or_else(ValidationErrors::new);

    let stored_type = current.map(|account| AuthenticationType::from(account.authentication_type));
    match (input.authentication_type, stored_type) {
        (None, None) => errors.add(
            "authenticationType",
            field_error("required", "Authentication type must be oauth2 or keypair"),
        ),
        (Some(requested), Some(stored)) if requested != stored => errors.add(
            "authenticationType",
            field_error("immutable", "Authentication type cannot be changed"),
        ),
        _ => {}
    }

    match (stored_type.or(input.authentication_type), &input.email) {
        (Some(AuthenticationType::OAuth2), None) => errors.add(
            "email",
            field_error("required", "Email is required for oauth2 accounts"),
        ),
        (Some(AuthenticationType::KeyPair), Some(_)) => errors.add(
            "email",
            field_error("key_pair_email", "Key-pair accounts cannot have an email"),
        ),
        _ => {}
    }

    for role_id in &input.role_ids {
        match store.find_role_by_id(*role_id).await? {
            None => errors.add(
                "roleIds",
                field_error("not_found", format!("Role {role_id} does not exist")),
            ),
            Some(role) if role.is_base_role => errors.add(
                "roleIds",
                field_error("base_role", format!("Role {role_id} cannot be bound")),
            ),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::validation_failed(errors))
    }
}

async fn attach_nested<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
    base_role_id: Uuid,
    input: &ServiceAccountInput,
) -> Result<()> {
    for role_id in &input.role_ids {
        store
            .bind_role(NewRoleBinding {
                service_account_id,
                role_id: *role_id,
            })
            .await?;
    }

    for grant in &input.permissions {
        store
            .create_permission(NewRolePermission::new(base_role_id, grant))
            .await?;
    }

    Ok(())
}

/// Creates an account with its roles and base-role grants in one unit.
#[tracing::instrument(
    skip_all,
    target = TRACING_TARGET_LIFECYCLE,
    fields(caller = %caller.service_account_id)
)]
pub async fn create_with_nested<C: AccessStore>(
    store: &mut C,
    caller: &Identity,
    mut input: ServiceAccountInput,
) -> Result<CreatedServiceAccount> {
    input.normalize();

    store.begin().await?;
    let result = create_nested(store, caller, input).await;
    finish(store, result).await
}

async fn create_nested<C: AccessStore>(
    store: &mut C,
    caller: &Identity,
    input: ServiceAccountInput,
) -> Result<CreatedServiceAccount> {
    authorize_delegation(store, caller, &input).await?;
    validate_input(store, &input, None).await?;

    let Some(authentication_type) = input.authentication_type else {
        return Err(Error::internal("Authentication type missing after validation"));
    };

    let created = insert_service_account(
        store,
        input.name.clone(),
        input.email.clone(),
        input.picture.clone(),
        authentication_type,
    )
    .await?;

    let account = &created.service_account;
    attach_nested(store, account.id, account.base_role_id, &input).await?;

    Ok(created)
}

/// Replaces an account's fields, bindings and base-role grants in one unit.
///
/// An omitted picture keeps the stored one.
#[tracing::instrument(
    skip_all,
    target = TRACING_TARGET_LIFECYCLE,
    fields(caller = %caller.service_account_id, service_account_id = %service_account_id)
)]
pub async fn update_with_nested<C: AccessStore>(
    store: &mut C,
    caller: &Identity,
    service_account_id: Uuid,
    mut input: ServiceAccountInput,
) -> Result<ServiceAccountWithNested> {
    input.normalize();

    store.begin().await?;
    let result = update_nested(store, caller, service_account_id, input).await;
    finish(store, result).await
}

async fn update_nested<C: AccessStore>(
    store: &mut C,
    caller: &Identity,
    service_account_id: Uuid,
    mut input: ServiceAccountInput,
) -> Result<ServiceAccountWithNested> {
    let account = require_service_account(store, service_account_id).await?;
    input.role_ids.retain(|role_id| *role_id != account.base_role_id);

    authorize_delegation(store, caller, &input).await?;
    validate_input(store, &input, Some(&account)).await?;

    let changes = UpdateServiceAccount {
        name: Some(input.name.clone()),
        email: Some(input.email.clone()),
        picture: input.picture.clone().map(Some),
    };
    store
        .update_service_account(service_account_id, changes)
        .await?;

    let unbound = store
        .drop_non_base_role_bindings(service_account_id, account.base_role_id)
        .await?;
    let dropped = store.drop_role_permissions(account.base_role_id).await?;
    attach_nested(store, service_account_id, account.base_role_id, &input).await?;

    tracing::info!(
        target: TRACING_TARGET_LIFECYCLE,
        unbound,
        dropped,
        roles = input.role_ids.len(),
        permissions = input.permissions.len(),
        "Service account updated"
    );

    load_nested(store, service_account_id).await
}

async fn load_nested<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
) -> Result<ServiceAccountWithNested> {
    let service_account = require_service_account(store, service_account_id).await?;

    let permissions = store
        .list_permissions_for_roles(&[service_account.base_role_id])
        .await?
        .iter()
        .map(|row| {
            row.to_grant()
                .map_err(|error| Error::internal("Stored permission is malformed").with_source(error))
        })
        .collect::<Result<Vec<_>>>()?;

    let roles = store
        .list_roles_for_service_account(service_account_id)
        .await?
        .into_iter()
        .filter(|role| !role.is_base_role)
        .collect();

    Ok(ServiceAccountWithNested {
        service_account,
        permissions,
        roles,
    })
}

/// Returns an account with its base-role grants and bound shared roles.
pub async fn get_with_nested<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
) -> Result<ServiceAccountWithNested> {
    load_nested(store, service_account_id).await
}

/// Returns one page of accounts and the total count.
pub async fn list<C: AccessStore>(
    store: &mut C,
    pagination: Pagination,
) -> Result<(Vec<ServiceAccount>, i64)> {
    let accounts = store.list_service_accounts(pagination).await?;
    let count = store.count_service_accounts().await?;
    Ok((accounts, count))
}

/// Returns one page of accounts whose name or email contains `term`.
pub async fn search<C: AccessStore>(
    store: &mut C,
    term: &str,
    pagination: Pagination,
) -> Result<(Vec<ServiceAccount>, i64)> {
    let term = term.trim();
    let accounts = store.search_service_accounts(term, pagination).await?;
    let count = store.count_search_service_accounts(term).await?;
    Ok((accounts, count))
}

/// Creates a bare key-pair account.
pub async fn create_key_pair_type<C: AccessStore>(
    store: &mut C,
    name: &str,
) -> Result<CreatedServiceAccount> {
    store.begin().await?;
    let result = insert_service_account(
        store,
        name.trim().to_owned(),
        None,
        None,
        AuthenticationType::KeyPair,
    )
    .await;
    finish(store, result).await
}

/// Creates a bare OAuth2 account.
pub async fn create_oauth2_type<C: AccessStore>(
    store: &mut C,
    name: &str,
    email: &str,
    picture: Option<String>,
) -> Result<ServiceAccount> {
    store.begin().await?;
    let result = insert_service_account(
        store,
        name.trim().to_owned(),
        Some(email.to_owned()),
        non_blank(picture),
        AuthenticationType::OAuth2,
    )
    .await;
    finish(store, result)
        .await
        .map(|created| created.service_account)
}

#[cfg(test)]
mod tests {
    use warden_core::{Permission, build_permission, digest_secret};
    use warden_postgres::query::{PermissionRepository, RoleRepository, ServiceAccountRepository};
    use warden_test::{MemoryStore, Operation};

    use super::*;
    use crate::ErrorKind;
    use crate::service::authz::has_permissions_strings;

    fn permission(s: &str) -> Permission {
        build_permission(s).unwrap()
    }

    fn grants(strings: &[&str]) -> Vec<PermissionGrant> {
        strings
            .iter()
            .map(|s| PermissionGrant::new(permission(s)))
            .collect()
    }

    fn key_pair_input(name: &str, permissions: &[&str]) -> ServiceAccountInput {
        ServiceAccountInput {
            name: name.to_owned(),
            authentication_type: Some(AuthenticationType::KeyPair),
            permissions: grants(permissions),
            ..Default::default()
        }
    }

    /// Creates an account holding `permissions` on its base role.
    async fn root(store: &mut MemoryStore, permissions: &[&str]) -> Identity {
        let created = create_key_pair_type(store, "root").await.unwrap();
        let account = created.service_account;
        for grant in grants(permissions) {
            store
                .create_permission(NewRolePermission::new(account.base_role_id, &grant))
                .await
                .unwrap();
        }
        account.to_identity()
    }

    fn field_codes(error: &Error, field: &str) -> Vec<String> {
        error
            .validation()
            .and_then(|errors| errors.field_errors().get(field).cloned())
            .map(|errors| errors.iter().map(|e| e.code.to_string()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn delegation_chain() {
        let mut store = MemoryStore::new();
        let a = root(&mut store, &["iam::Owner::read::dc", "iam::Owner::write::dc"]).await;

        let b = create_with_nested(
            &mut store,
            &a,
            key_pair_input("b", &["iam::Owner::read::dc/region"]),
        )
        .await
        .unwrap();
        assert!(b.key_pair.is_some());
        let b = b.service_account.to_identity();

        let c = create_with_nested(
            &mut store,
            &b,
            key_pair_input("c", &["iam::Lender::read::dc/region/zone"]),
        )
        .await
        .unwrap()
        .service_account;

        let error = create_with_nested(
            &mut store,
            &b,
            key_pair_input("d", &["iam::Lender::write::dc/region"]),
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InsufficientPermission);
        assert_eq!(error.permission(), Some("iam::Owner::write::dc/region"));

        let results = has_permissions_strings(
            &mut store,
            c.id,
            &["iam::Lender::read::dc/region/zone/x", "iam::Owner::read::dc/region/zone"],
        )
        .await
        .unwrap();
        assert_eq!(results, vec![true, false]);
    }

    #[tokio::test]
    async fn lender_cannot_delegate_what_it_only_borrows() {
        let mut store = MemoryStore::new();
        let lender = root(&mut store, &["iam::Lender::read::*"]).await;
        let before = store.service_account_count();

        let error = create_with_nested(
            &mut store,
            &lender,
            key_pair_input("x", &["iam::Lender::read::dc"]),
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InsufficientPermission);
        assert_eq!(store.service_account_count(), before);
        assert!(!store.in_unit_of_work());
    }

    #[tokio::test]
    async fn delegating_a_role_requires_owning_its_grants() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &["iam::Owner::read::dc"]).await;
        let role = store.create_role(NewRole::new("writers")).await.unwrap();
        store
            .create_permission(NewRolePermission::new(
                role.id,
                &PermissionGrant::new(permission("iam::Lender::write::dc")),
            ))
            .await
            .unwrap();

        let input = ServiceAccountInput {
            role_ids: vec![role.id],
            ..key_pair_input("x", &[])
        };
        let error = create_with_nested(&mut store, &caller, input).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InsufficientPermission);
    }

    #[tokio::test]
    async fn create_is_atomic() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &["iam::Owner::read::*"]).await;
        let roles = store.role_count();
        let accounts = store.service_account_count();
        let bindings = store.role_binding_count();
        let permissions = store.permission_count();

        // The first two grants are written before the third one fails.
        store.fail_after(Operation::CreatePermission, 2);
        let error = create_with_nested(
            &mut store,
            &caller,
            key_pair_input("x", &["iam::Owner::read::a", "iam::Owner::read::b", "iam::Owner::read::c"]),
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Storage);

        assert_eq!(store.role_count(), roles);
        assert_eq!(store.service_account_count(), accounts);
        assert_eq!(store.role_binding_count(), bindings);
        assert_eq!(store.permission_count(), permissions);
        assert!(!store.in_unit_of_work());
    }

    #[tokio::test]
    async fn validation_reports_fields() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &[]).await;

        let input = ServiceAccountInput {
            name: "   ".to_owned(),
            authentication_type: Some(AuthenticationType::OAuth2),
            role_ids: vec![Uuid::new_v4()],
            ..Default::default()
        };
        let error = create_with_nested(&mut store, &caller, input).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(field_codes(&error, "name"), vec!["length"]);
        assert_eq!(field_codes(&error, "email"), vec!["required"]);
        assert_eq!(field_codes(&error, "roleIds"), vec!["not_found"]);

        let input = ServiceAccountInput {
            name: "x".to_owned(),
            ..Default::default()
        };
        let error = create_with_nested(&mut store, &caller, input).await.unwrap_err();
        assert_eq!(field_codes(&error, "authenticationType"), vec!["required"]);
    }

    #[tokio::test]
    async fn key_pair_accounts_reject_an_email() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &[]).await;
        let before = store.service_account_count();

        let input = ServiceAccountInput {
            email: Some("someone@example.com".to_owned()),
            ..key_pair_input("x", &[])
        };
        let error = create_with_nested(&mut store, &caller, input).await.unwrap_err();
        assert_eq!(field_codes(&error, "email"), vec!["key_pair_email"]);
        assert_eq!(store.service_account_count(), before);

        let created = create_key_pair_type(&mut store, "robot").await.unwrap();
        let error = update_with_nested(
            &mut store,
            &caller,
            created.service_account.id,
            ServiceAccountInput {
                name: "robot".to_owned(),
                email: Some("someone@example.com".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(field_codes(&error, "email"), vec!["key_pair_email"]);
    }

    #[tokio::test]
    async fn base_roles_cannot_be_bound() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &[]).await;
        let other = create_key_pair_type(&mut store, "other").await.unwrap();

        let input = ServiceAccountInput {
            role_ids: vec![other.service_account.base_role_id],
            ..key_pair_input("x", &[])
        };
        let error = create_with_nested(&mut store, &caller, input).await.unwrap_err();
        assert_eq!(field_codes(&error, "roleIds"), vec!["base_role"]);
    }

    #[tokio::test]
    async fn key_pair_secret_is_only_stored_as_digest() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &[]).await;
        let created = create_with_nested(&mut store, &caller, key_pair_input("x", &[]))
            .await
            .unwrap();
        let key_pair = created.key_pair.unwrap();
        let account = created.service_account;

        assert_eq!(account.key_id.as_deref(), Some(key_pair.key_id.as_str()));
        assert_eq!(
            account.key_secret_digest.as_deref(),
            Some(digest_secret(&key_pair.key_secret).as_str())
        );

        let found = store
            .find_service_account_by_key_pair(&key_pair.key_id, &key_pair.digest())
            .await
            .unwrap();
        assert_eq!(found.map(|found| found.id), Some(account.id));
    }

    #[tokio::test]
    async fn update_replaces_instead_of_merging() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &["iam::Owner::read::*", "iam::Owner::write::*"]).await;
        let r1 = store.create_role(NewRole::new("r1")).await.unwrap();
        let r2 = store.create_role(NewRole::new("r2")).await.unwrap();
        let r3 = store.create_role(NewRole::new("r3")).await.unwrap();

        let created = create_with_nested(
            &mut store,
            &caller,
            ServiceAccountInput {
                role_ids: vec![r1.id, r2.id],
                permissions: vec![
                    PermissionGrant::new(permission("iam::Owner::read::dc")).with_alias("reader"),
                    PermissionGrant::new(permission("iam::Owner::write::dc")),
                ],
                ..key_pair_input("x", &[])
            },
        )
        .await
        .unwrap()
        .service_account;

        let updated = update_with_nested(
            &mut store,
            &caller,
            created.id,
            ServiceAccountInput {
                name: "renamed".to_owned(),
                role_ids: vec![r2.id, created.base_role_id, r3.id, r2.id],
                permissions: grants(&["iam::Lender::read::dc/a"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.service_account.name, "renamed");
        let mut role_ids: Vec<_> = updated.roles.iter().map(|role| role.id).collect();
        role_ids.sort();
        let mut expected = vec![r2.id, r3.id];
        expected.sort();
        assert_eq!(role_ids, expected);
        assert_eq!(updated.permissions, grants(&["iam::Lender::read::dc/a"]));
        assert!(updated.permission_aliases().is_empty());

        let mut bound: Vec<_> = store
            .list_role_bindings(created.id)
            .await
            .unwrap()
            .into_iter()
            .map(|binding| binding.role_id)
            .collect();
        bound.sort();
        let mut expected = vec![created.base_role_id, r2.id, r3.id];
        expected.sort();
        assert_eq!(bound, expected);
    }

    #[tokio::test]
    async fn update_rejects_authentication_type_change() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &[]).await;
        let created = create_key_pair_type(&mut store, "x").await.unwrap();

        let error = update_with_nested(
            &mut store,
            &caller,
            created.service_account.id,
            ServiceAccountInput {
                name: "x".to_owned(),
                email: Some("x@example.com".to_owned()),
                authentication_type: Some(AuthenticationType::OAuth2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(field_codes(&error, "authenticationType"), vec!["immutable"]);
    }

    #[tokio::test]
    async fn update_of_unknown_account_is_not_found() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &[]).await;
        let error = update_with_nested(&mut store, &caller, Uuid::new_v4(), key_pair_input("x", &[]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(!store.in_unit_of_work());
    }

    #[tokio::test]
    async fn nested_view_exposes_aliases() {
        let mut store = MemoryStore::new();
        let caller = root(&mut store, &["iam::Owner::read::*"]).await;
        let created = create_with_nested(
            &mut store,
            &caller,
            ServiceAccountInput {
                permissions: vec![
                    PermissionGrant::new(permission("iam::Lender::read::dc")).with_alias("dc reader"),
                ],
                ..key_pair_input("x", &[])
            },
        )
        .await
        .unwrap();

        let nested = get_with_nested(&mut store, created.service_account.id)
            .await
            .unwrap();
        assert!(nested.roles.is_empty());
        assert_eq!(
            nested.permission_aliases().get("iam::Lender::read::dc").map(String::as_str),
            Some("dc reader")
        );

        let error = get_with_nested(&mut store, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_and_search_count_everything() {
        let mut store = MemoryStore::new();
        create_oauth2_type(&mut store, "Alice", "alice@example.com", None)
            .await
            .unwrap();
        create_oauth2_type(&mut store, "Bob", "bob@example.com", Some(" ".to_owned()))
            .await
            .unwrap();
        create_key_pair_type(&mut store, "robot").await.unwrap();

        let (page, count) = list(&mut store, Pagination::new(2, 0)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(count, 3);

        let (found, count) = search(&mut store, "example", Pagination::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(count, 2);
        assert!(found.iter().all(|account| account.picture.is_none()));
    }

    #[test]
    fn key_pair_builder_keeps_only_the_digest() {
        let id = Uuid::new_v4();
        let base_role_id = Uuid::new_v4();
        let (account, key_pair) = build_key_pair_service_account(id, "robot", base_role_id);
        assert_eq!(account.id, id);
        assert_eq!(account.base_role_id, base_role_id);
        assert_eq!(account.key_secret_digest, Some(key_pair.digest()));
        assert_ne!(account.key_secret_digest, Some(key_pair.key_secret));
    }
}
