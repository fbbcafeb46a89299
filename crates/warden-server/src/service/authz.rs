//! Permission aggregation and checks.
//!
//! An account's effective permissions are the grants attached to its base
//! role plus those of every role bound to it. Checks are evaluated per
//! requested permission against that set; there are no deny rules.

use uuid::Uuid;
use warden_core::{Permission, build_permission, build_permissions, effective_permissions, is_present};
use warden_postgres::model::{RolePermission, ServiceAccount};
use warden_postgres::query::{AccessStore, Pagination};

use crate::{Error, Result, TRACING_TARGET_AUTHORIZATION};

/// Loads a service account or fails with [`crate::ErrorKind::NotFound`].
pub(crate) async fn require_service_account<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
) -> Result<ServiceAccount> {
    store
        .find_service_account_by_id(service_account_id)
        .await?
        .ok_or_else(|| Error::not_found("Service account not found"))
}

/// Converts stored rows into permissions paired with their role.
pub(crate) fn attachments(rows: &[RolePermission]) -> Result<Vec<(Uuid, Permission)>> {
    rows.iter()
        .map(|row| {
            row.to_permission()
                .map(|permission| (row.role_id, permission))
                .map_err(|error| {
                    Error::internal("Stored permission is malformed").with_source(error)
                })
        })
        .collect()
}

/// Returns every permission the account holds through any of its roles.
///
/// The result is neither deduplicated nor ordered.
pub async fn get_permissions<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
) -> Result<Vec<Permission>> {
    let account = require_service_account(store, service_account_id).await?;
    let bound_role_ids: Vec<Uuid> = store
        .list_role_bindings(service_account_id)
        .await?
        .into_iter()
        .map(|binding| binding.role_id)
        .collect();

    let mut role_ids = bound_role_ids.clone();
    if !role_ids.contains(&account.base_role_id) {
        role_ids.push(account.base_role_id);
    }

    let rows = store.list_permissions_for_roles(&role_ids).await?;
    let permissions =
        effective_permissions(account.base_role_id, &bound_role_ids, attachments(&rows)?);

    tracing::trace!(
        target: TRACING_TARGET_AUTHORIZATION,
        service_account_id = %service_account_id,
        roles = role_ids.len(),
        permissions = permissions.len(),
        "Resolved effective permissions"
    );

    Ok(permissions)
}

/// Returns one boolean per requested permission, in order.
pub async fn has_permissions<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
    requested: &[Permission],
) -> Result<Vec<bool>> {
    let held = get_permissions(store, service_account_id).await?;
    Ok(requested
        .iter()
        .map(|permission| is_present(&held, permission))
        .collect())
}

/// Parses `permission` and checks it against the account's grants.
pub async fn has_permission_string<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
    permission: &str,
) -> Result<bool> {
    let permission = build_permission(permission)?;
    let results = has_permissions(store, service_account_id, std::slice::from_ref(&permission)).await?;
    Ok(results.first().copied().unwrap_or(false))
}

/// Parses every string and checks each against the account's grants.
///
/// A single malformed entry fails the whole call.
pub async fn has_permissions_strings<C, S>(
    store: &mut C,
    service_account_id: Uuid,
    permissions: &[S],
) -> Result<Vec<bool>>
where
    C: AccessStore,
    S: AsRef<str>,
{
    let requested = build_permissions(permissions)?;
    has_permissions(store, service_account_id, &requested).await
}

/// Returns the first permission of `requested` that `held` does not grant
/// at `Owner` level.
pub(crate) fn first_missing_owner<'a, I>(held: &[Permission], requested: I) -> Option<Permission>
where
    I: IntoIterator<Item = &'a Permission>,
{
    requested
        .into_iter()
        .map(Permission::to_owner)
        .find(|owner| !is_present(held, owner))
}

/// Returns whether the account owns every requested permission.
pub async fn has_all_owner_permissions<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
    requested: &[Permission],
) -> Result<bool> {
    let held = get_permissions(store, service_account_id).await?;
    Ok(first_missing_owner(&held, requested).is_none())
}

/// Returns the permissions attached to the given roles.
pub(crate) async fn roles_permissions<C: AccessStore>(
    store: &mut C,
    role_ids: &[Uuid],
) -> Result<Vec<Permission>> {
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = store.list_permissions_for_roles(role_ids).await?;
    Ok(attachments(&rows)?
        .into_iter()
        .map(|(_, permission)| permission)
        .collect())
}

/// Returns whether the account owns every permission of every given role.
pub async fn has_all_owner_roles_permissions<C: AccessStore>(
    store: &mut C,
    service_account_id: Uuid,
    role_ids: &[Uuid],
) -> Result<bool> {
    let requested = roles_permissions(store, role_ids).await?;
    has_all_owner_permissions(store, service_account_id, &requested).await
}

/// Lists the accounts holding `permission`.
///
/// The caller must own `permission`, otherwise the call fails with
/// [`crate::ErrorKind::MissingPermission`] carrying the owner-level
/// permission.
pub async fn list_with_permission<C: AccessStore>(
    store: &mut C,
    caller_id: Uuid,
    permission: &Permission,
    pagination: Pagination,
) -> Result<(Vec<ServiceAccount>, i64)> {
    let owner = permission.to_owner();
    let held = get_permissions(store, caller_id).await?;
    if !is_present(&held, &owner) {
        tracing::warn!(
            target: TRACING_TARGET_AUTHORIZATION,
            service_account_id = %caller_id,
            permission = %owner,
            "Listing by permission denied"
        );
        return Err(Error::missing_permission(&owner));
    }

    let accounts = store
        .list_service_accounts_with_permission(permission, pagination)
        .await?;
    let count = store
        .count_service_accounts_with_permission(permission)
        .await?;

    Ok((accounts, count))
}

#[cfg(test)]
mod tests {
    use warden_core::{OwnershipLevel, PermissionGrant};
    use warden_postgres::model::NewRole;
    use warden_postgres::query::{PermissionRepository, RoleRepository};
    use warden_postgres::model::{NewRoleBinding, NewRolePermission};
    use warden_test::MemoryStore;

    use super::*;
    use crate::ErrorKind;
    use crate::service::lifecycle::create_key_pair_type;

    fn permission(s: &str) -> Permission {
        build_permission(s).unwrap()
    }

    async fn attach(store: &mut MemoryStore, role_id: Uuid, s: &str) {
        store
            .create_permission(NewRolePermission::new(
                role_id,
                &PermissionGrant::new(permission(s)),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn effective_set_spans_base_and_bound_roles() {
        let mut store = MemoryStore::new();
        let account = create_key_pair_type(&mut store, "machine").await.unwrap();
        let account = account.service_account;

        attach(&mut store, account.base_role_id, "iam::Lender::read::dc/a").await;
        let shared = store.create_role(NewRole::new("ops")).await.unwrap();
        attach(&mut store, shared.id, "iam::Owner::write::*").await;

        let unbound = store.create_role(NewRole::new("other")).await.unwrap();
        attach(&mut store, unbound.id, "iam::Owner::delete::*").await;

        store
            .bind_role(NewRoleBinding {
                service_account_id: account.id,
                role_id: shared.id,
            })
            .await
            .unwrap();

        let held = get_permissions(&mut store, account.id).await.unwrap();
        assert_eq!(held.len(), 2);

        let results = has_permissions_strings(
            &mut store,
            account.id,
            &[
                "iam::Lender::read::dc/a/b",
                "iam::Lender::read::dc/ab",
                "iam::Owner::write::anything",
                "iam::Owner::delete::x",
            ],
        )
        .await
        .unwrap();
        assert_eq!(results, vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn malformed_entry_fails_the_batch() {
        let mut store = MemoryStore::new();
        let account = create_key_pair_type(&mut store, "machine").await.unwrap();
        let error = has_permissions_strings(
            &mut store,
            account.service_account.id,
            &["iam::Owner::read::*", "iam::Boss::read::*"],
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedPermission);

        let error = has_permission_string(&mut store, account.service_account.id, "nope")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedPermission);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let mut store = MemoryStore::new();
        let error = get_permissions(&mut store, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn owner_checks_force_owner_level() {
        let mut store = MemoryStore::new();
        let account = create_key_pair_type(&mut store, "machine").await.unwrap();
        let account = account.service_account;
        attach(&mut store, account.base_role_id, "iam::Lender::read::*").await;

        let lender = permission("iam::Lender::read::dc");
        assert!(
            has_permissions(&mut store, account.id, std::slice::from_ref(&lender))
                .await
                .unwrap()[0]
        );
        assert!(
            !has_all_owner_permissions(&mut store, account.id, &[lender])
                .await
                .unwrap()
        );

        let role = store.create_role(NewRole::new("readers")).await.unwrap();
        attach(&mut store, role.id, "iam::Lender::read::dc").await;
        assert!(
            !has_all_owner_roles_permissions(&mut store, account.id, &[role.id])
                .await
                .unwrap()
        );

        attach(&mut store, account.base_role_id, "iam::Owner::read::dc").await;
        assert!(
            has_all_owner_roles_permissions(&mut store, account.id, &[role.id])
                .await
                .unwrap()
        );
        assert!(
            has_all_owner_roles_permissions(&mut store, account.id, &[])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn listing_by_permission_requires_ownership() {
        let mut store = MemoryStore::new();
        let caller = create_key_pair_type(&mut store, "caller").await.unwrap();
        let caller = caller.service_account;
        let holder = create_key_pair_type(&mut store, "holder").await.unwrap();
        let holder = holder.service_account;
        attach(&mut store, holder.base_role_id, "iam::Lender::read::dc/a").await;

        let wanted = permission("iam::Lender::read::dc/a");
        let error = list_with_permission(&mut store, caller.id, &wanted, Pagination::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingPermission);
        assert_eq!(error.permission(), Some("iam::Owner::read::dc/a"));

        attach(&mut store, caller.base_role_id, "iam::Owner::read::*").await;
        let (accounts, count) =
            list_with_permission(&mut store, caller.id, &wanted, Pagination::default())
                .await
                .unwrap();
        assert_eq!(count, 2);
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().any(|account| account.id == holder.id));
    }

    #[test]
    fn first_missing_owner_reports_owner_level() {
        let held = vec![permission("iam::Owner::read::dc")];
        let requested = [
            permission("iam::Lender::read::dc/a"),
            permission("iam::Lender::write::dc"),
        ];
        let missing = first_missing_owner(&held, &requested).unwrap();
        assert_eq!(missing.ownership_level(), OwnershipLevel::Owner);
        assert_eq!(missing.action(), "write");
    }
}
