//! Role and role binding repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewRole, NewRoleBinding, Role, RoleBinding};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for roles and the bindings between accounts and roles.
pub trait RoleRepository {
    /// Creates a new role.
    fn create_role(&mut self, new_role: NewRole) -> impl Future<Output = PgResult<Role>> + Send;

    /// Finds a role by its unique identifier.
    fn find_role_by_id(
        &mut self,
        role_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Role>>> + Send;

    /// Binds a service account to a role.
    ///
    /// Binding the same pair twice violates `role_bindings_unique_idx`.
    fn bind_role(
        &mut self,
        binding: NewRoleBinding,
    ) -> impl Future<Output = PgResult<RoleBinding>> + Send;

    /// Lists every binding of a service account, base role included.
    fn list_role_bindings(
        &mut self,
        service_account_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<RoleBinding>>> + Send;

    /// Lists every role a service account is bound to, base role included.
    fn list_roles_for_service_account(
        &mut self,
        service_account_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Role>>> + Send;

    /// Removes every binding of a service account except the one to
    /// `base_role_id`. Returns the number of removed bindings.
    fn drop_non_base_role_bindings(
        &mut self,
        service_account_id: Uuid,
        base_role_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl RoleRepository for PgConnection {
    async fn create_role(&mut self, mut new_role: NewRole) -> PgResult<Role> {
        use schema::roles;

        new_role.name = new_role.name.trim().to_owned();

        diesel::insert_into(roles::table)
            .values(&new_role)
            .returning(Role::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_role_by_id(&mut self, role_id: Uuid) -> PgResult<Option<Role>> {
        use schema::roles::{self, dsl};

        roles::table
            .filter(dsl::id.eq(role_id))
            .select(Role::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn bind_role(&mut self, binding: NewRoleBinding) -> PgResult<RoleBinding> {
        use schema::role_bindings;

        diesel::insert_into(role_bindings::table)
            .values(&binding)
            .returning(RoleBinding::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_role_bindings(&mut self, service_account_id: Uuid) -> PgResult<Vec<RoleBinding>> {
        use schema::role_bindings::{self, dsl};

        role_bindings::table
            .filter(dsl::service_account_id.eq(service_account_id))
            .order(dsl::created_at.asc())
            .select(RoleBinding::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_roles_for_service_account(
        &mut self,
        service_account_id: Uuid,
    ) -> PgResult<Vec<Role>> {
        use schema::role_bindings::dsl as rb;
        use schema::roles::{self, dsl};

        roles::table
            .inner_join(schema::role_bindings::table)
            .filter(rb::service_account_id.eq(service_account_id))
            .order((dsl::name.asc(), dsl::id.asc()))
            .select(Role::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn drop_non_base_role_bindings(
        &mut self,
        service_account_id: Uuid,
        base_role_id: Uuid,
    ) -> PgResult<usize> {
        use schema::role_bindings::{self, dsl};

        diesel::delete(
            role_bindings::table
                .filter(dsl::service_account_id.eq(service_account_id))
                .filter(dsl::role_id.ne(base_role_id)),
        )
        .execute(self)
        .await
        .map_err(PgError::from)
    }
}
