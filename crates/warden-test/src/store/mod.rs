//! In-memory implementation of every storage repository.
//!
//! [`MemoryStore`] mirrors the Postgres schema closely enough for service
//! tests: the same uniqueness and foreign key rules are enforced and the
//! same constraint names are reported. A unit of work is a snapshot of the
//! tables taken on `begin` and restored on `rollback`; clones share the
//! tables, so a store cannot isolate concurrent units of work.

mod permission;
mod role;
mod service_account;
mod violation;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jiff_diesel::Timestamp;
use strum::{Display, EnumIter};
use warden_postgres::model::{Role, RoleBinding, RolePermission, ServiceAccount};
use warden_postgres::query::UnitOfWork;
use warden_postgres::{PgError, PgResult};

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Begin,
    Commit,
    Rollback,
    CreateServiceAccount,
    FindServiceAccountById,
    FindServiceAccountByEmail,
    FindServiceAccountByKeyPair,
    UpdateServiceAccount,
    ListServiceAccounts,
    CountServiceAccounts,
    SearchServiceAccounts,
    CountSearchServiceAccounts,
    ListServiceAccountsWithPermission,
    CountServiceAccountsWithPermission,
    CreateRole,
    FindRoleById,
    BindRole,
    ListRoleBindings,
    ListRolesForServiceAccount,
    DropNonBaseRoleBindings,
    CreatePermission,
    ListPermissionsForRoles,
    DropRolePermissions,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    roles: Vec<Role>,
    service_accounts: Vec<ServiceAccount>,
    role_bindings: Vec<RoleBinding>,
    permissions: Vec<RolePermission>,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Tables,
    /// Calls of each failing operation still allowed to succeed.
    failures: HashMap<Operation, usize>,
}

/// In-memory store implementing every repository plus [`UnitOfWork`].
#[derive(Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
    snapshot: Option<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `operation` fail.
    pub fn fail_on(&self, operation: Operation) {
        self.fail_after(operation, 0);
    }

    /// Lets the next `successes` calls of `operation` through, then fails
    /// every later one.
    pub fn fail_after(&self, operation: Operation, successes: usize) {
        self.lock().failures.insert(operation, successes);
    }

    /// Stops failing `operation`.
    pub fn recover(&self, operation: Operation) {
        self.lock().failures.remove(&operation);
    }

    /// Returns whether a unit of work is open on this handle.
    pub fn in_unit_of_work(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Number of stored roles.
    pub fn role_count(&self) -> usize {
        self.lock().tables.roles.len()
    }

    /// Number of stored service accounts.
    pub fn service_account_count(&self) -> usize {
        self.lock().tables.service_accounts.len()
    }

    /// Number of stored role bindings.
    pub fn role_binding_count(&self) -> usize {
        self.lock().tables.role_bindings.len()
    }

    /// Number of stored permissions.
    pub fn permission_count(&self) -> usize {
        self.lock().tables.permissions.len()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the tables for `operation`, or fails if it was told to.
    fn enter(&self, operation: Operation) -> PgResult<MutexGuard<'_, Shared>> {
        let mut shared = self.lock();
        if let Some(remaining) = shared.failures.get_mut(&operation) {
            if *remaining == 0 {
                return Err(PgError::Unexpected(
                    format!("injected failure in {operation}").into(),
                ));
            }
            *remaining -= 1;
        }

        Ok(shared)
    }
}

impl Clone for MemoryStore {
    /// Returns a new handle on the same tables, outside any unit of work.
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            snapshot: None,
        }
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("in_unit_of_work", &self.in_unit_of_work())
            .finish_non_exhaustive()
    }
}

fn now() -> Timestamp {
    jiff::Timestamp::now().into()
}

impl UnitOfWork for MemoryStore {
    async fn begin(&mut self) -> PgResult<()> {
        let snapshot = self.enter(Operation::Begin)?.tables.clone();
        if self.snapshot.is_some() {
            return Err(PgError::Unexpected("unit of work already open".into()));
        }

        self.snapshot = Some(snapshot);
        Ok(())
    }

    async fn commit(&mut self) -> PgResult<()> {
        drop(self.enter(Operation::Commit)?);
        match self.snapshot.take() {
            Some(_) => Ok(()),
            None => Err(PgError::Unexpected("no unit of work to commit".into())),
        }
    }

    async fn rollback(&mut self) -> PgResult<()> {
        let Some(snapshot) = self.snapshot.take() else {
            return Err(PgError::Unexpected("no unit of work to roll back".into()));
        };

        let mut shared = self.enter(Operation::Rollback)?;
        shared.tables = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use warden_postgres::model::NewRole;
    use warden_postgres::query::RoleRepository;

    use super::*;

    #[tokio::test]
    async fn rollback_restores_tables() {
        let mut store = MemoryStore::new();
        store.create_role(NewRole::new("kept")).await.unwrap();

        store.begin().await.unwrap();
        store.create_role(NewRole::new("discarded")).await.unwrap();
        assert_eq!(store.role_count(), 2);
        store.rollback().await.unwrap();

        assert_eq!(store.role_count(), 1);
        assert!(!store.in_unit_of_work());
    }

    #[tokio::test]
    async fn commit_keeps_writes() {
        let mut store = MemoryStore::new();
        store.begin().await.unwrap();
        store.create_role(NewRole::new("kept")).await.unwrap();
        store.commit().await.unwrap();
        assert_eq!(store.role_count(), 1);
        assert!(store.commit().await.is_err());
    }

    #[tokio::test]
    async fn injected_failures() {
        let mut store = MemoryStore::new();
        store.fail_on(Operation::CreateRole);
        assert!(matches!(
            store.create_role(NewRole::new("ops")).await,
            Err(PgError::Unexpected(_))
        ));

        store.recover(Operation::CreateRole);
        assert!(store.create_role(NewRole::new("ops")).await.is_ok());
    }

    #[tokio::test]
    async fn failures_after_a_number_of_successes() {
        let mut store = MemoryStore::new();
        store.fail_after(Operation::CreateRole, 2);
        assert!(store.create_role(NewRole::new("first")).await.is_ok());
        assert!(store.create_role(NewRole::new("second")).await.is_ok());
        assert!(store.create_role(NewRole::new("third")).await.is_err());
        assert!(store.create_role(NewRole::new("fourth")).await.is_err());
        assert_eq!(store.role_count(), 2);
    }

    #[tokio::test]
    async fn clones_share_tables() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        store.create_role(NewRole::new("ops")).await.unwrap();
        assert_eq!(observer.role_count(), 1);
    }
}
