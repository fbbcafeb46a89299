//! Service account repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;
use warden_core::{Permission, Resource};

use super::Pagination;
use crate::model::{NewServiceAccount, ServiceAccount, UpdateServiceAccount};
use crate::types::{AuthenticationType, OwnershipLevel};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for service account database operations.
pub trait ServiceAccountRepository {
    /// Inserts a new service account.
    ///
    /// The base role referenced by the account must already exist.
    fn create_service_account(
        &mut self,
        new_account: NewServiceAccount,
    ) -> impl Future<Output = PgResult<ServiceAccount>> + Send;

    /// Finds a service account by its unique identifier.
    fn find_service_account_by_id(
        &mut self,
        service_account_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<ServiceAccount>>> + Send;

    /// Finds the OAuth2 service account with an exact email address.
    ///
    /// Key-pair accounts never match, whatever their email.
    fn find_service_account_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = PgResult<Option<ServiceAccount>>> + Send;

    /// Finds a key-pair account by key id and secret digest.
    ///
    /// Both halves must match; callers cannot tell which one did not.
    fn find_service_account_by_key_pair(
        &mut self,
        key_id: &str,
        key_secret_digest: &str,
    ) -> impl Future<Output = PgResult<Option<ServiceAccount>>> + Send;

    /// Applies a partial update to a service account.
    fn update_service_account(
        &mut self,
        service_account_id: Uuid,
        updates: UpdateServiceAccount,
    ) -> impl Future<Output = PgResult<ServiceAccount>> + Send;

    /// Lists service accounts ordered by name.
    fn list_service_accounts(
        &mut self,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<ServiceAccount>>> + Send;

    /// Counts all service accounts.
    fn count_service_accounts(&mut self) -> impl Future<Output = PgResult<i64>> + Send;

    /// Lists service accounts whose name or email contains `term`,
    /// case-insensitively.
    fn search_service_accounts(
        &mut self,
        term: &str,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<ServiceAccount>>> + Send;

    /// Counts service accounts whose name or email contains `term`.
    fn count_search_service_accounts(
        &mut self,
        term: &str,
    ) -> impl Future<Output = PgResult<i64>> + Send;

    /// Lists service accounts holding `permission` through any bound role.
    fn list_service_accounts_with_permission(
        &mut self,
        permission: &Permission,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<ServiceAccount>>> + Send;

    /// Counts service accounts holding `permission` through any bound role.
    fn count_service_accounts_with_permission(
        &mut self,
        permission: &Permission,
    ) -> impl Future<Output = PgResult<i64>> + Send;
}

/// Returns every held resource that would cover `resource`.
///
/// That is the wildcard, the resource itself, and each `/`-delimited
/// ancestor of it.
pub fn resource_ancestors(resource: &Resource) -> Vec<String> {
    let path = resource.as_str();
    let mut candidates = vec![Resource::WILDCARD.to_owned(), path.to_owned()];
    candidates.extend(
        path.match_indices(Resource::DELIMITER)
            .map(|(index, _)| path[..index].to_owned())
            .filter(|prefix| !prefix.is_empty()),
    );
    candidates
}

fn search_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

impl ServiceAccountRepository for PgConnection {
    async fn create_service_account(
        &mut self,
        mut new_account: NewServiceAccount,
    ) -> PgResult<ServiceAccount> {
        use schema::service_accounts;

        new_account.name = new_account.name.trim().to_owned();
        if let Some(email) = new_account.email.as_mut() {
            *email = email.trim().to_owned();
        }

        diesel::insert_into(service_accounts::table)
            .values(&new_account)
            .returning(ServiceAccount::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_service_account_by_id(
        &mut self,
        service_account_id: Uuid,
    ) -> PgResult<Option<ServiceAccount>> {
        use schema::service_accounts::{self, dsl};

        service_accounts::table
            .filter(dsl::id.eq(service_account_id))
            .select(ServiceAccount::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_service_account_by_email(
        &mut self,
        email: &str,
    ) -> PgResult<Option<ServiceAccount>> {
        use schema::service_accounts::{self, dsl};

        service_accounts::table
            .filter(dsl::email.eq(email.trim()))
            .filter(dsl::authentication_type.eq(AuthenticationType::OAuth2))
            .select(ServiceAccount::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_service_account_by_key_pair(
        &mut self,
        key_id: &str,
        key_secret_digest: &str,
    ) -> PgResult<Option<ServiceAccount>> {
        use schema::service_accounts::{self, dsl};

        service_accounts::table
            .filter(dsl::key_id.eq(key_id))
            .filter(dsl::key_secret_digest.eq(key_secret_digest))
            .select(ServiceAccount::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn update_service_account(
        &mut self,
        service_account_id: Uuid,
        mut updates: UpdateServiceAccount,
    ) -> PgResult<ServiceAccount> {
        use schema::service_accounts::{self, dsl};

        if updates.is_empty() {
            return service_accounts::table
                .filter(dsl::id.eq(service_account_id))
                .select(ServiceAccount::as_select())
                .first(self)
                .await
                .map_err(PgError::from);
        }

        if let Some(name) = updates.name.as_mut() {
            *name = name.trim().to_owned();
        }
        updates.email = updates
            .email
            .map(|email| email.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty()));

        diesel::update(service_accounts::table.filter(dsl::id.eq(service_account_id)))
            .set((&updates, dsl::updated_at.eq(diesel::dsl::now)))
            .returning(ServiceAccount::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_service_accounts(
        &mut self,
        pagination: Pagination,
    ) -> PgResult<Vec<ServiceAccount>> {
        use schema::service_accounts::{self, dsl};

        service_accounts::table
            .order((dsl::name.asc(), dsl::id.asc()))
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(ServiceAccount::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn count_service_accounts(&mut self) -> PgResult<i64> {
        use diesel::dsl::count_star;
        use schema::service_accounts;

        service_accounts::table
            .select(count_star())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn search_service_accounts(
        &mut self,
        term: &str,
        pagination: Pagination,
    ) -> PgResult<Vec<ServiceAccount>> {
        use schema::service_accounts::{self, dsl};

        let pattern = search_pattern(term);

        service_accounts::table
            .filter(dsl::name.ilike(&pattern).or(dsl::email.ilike(&pattern)))
            .order((dsl::name.asc(), dsl::id.asc()))
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(ServiceAccount::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn count_search_service_accounts(&mut self, term: &str) -> PgResult<i64> {
        use diesel::dsl::count_star;
        use schema::service_accounts::{self, dsl};

        let pattern = search_pattern(term);

        service_accounts::table
            .filter(dsl::name.ilike(&pattern).or(dsl::email.ilike(&pattern)))
            .select(count_star())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_service_accounts_with_permission(
        &mut self,
        permission: &Permission,
        pagination: Pagination,
    ) -> PgResult<Vec<ServiceAccount>> {
        use schema::permissions::dsl as p;
        use schema::role_bindings::dsl as rb;
        use schema::service_accounts::{self, dsl};
        use schema::{permissions, role_bindings};

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            permission = %permission,
            limit = pagination.limit,
            offset = pagination.offset,
            "Listing service accounts with permission"
        );

        let granting_roles = permissions::table
            .filter(p::service.eq(permission.service()))
            .filter(p::action.eq(permission.action()))
            .filter(p::ownership_level.eq_any(OwnershipLevel::implying(
                permission.ownership_level(),
            )))
            .filter(p::resource.eq_any(resource_ancestors(permission.resource())))
            .select(p::role_id);

        let holders = role_bindings::table
            .filter(rb::role_id.eq_any(granting_roles))
            .select(rb::service_account_id);

        service_accounts::table
            .filter(dsl::id.eq_any(holders))
            .order((dsl::name.asc(), dsl::id.asc()))
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(ServiceAccount::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn count_service_accounts_with_permission(
        &mut self,
        permission: &Permission,
    ) -> PgResult<i64> {
        use diesel::dsl::count_star;
        use schema::permissions::dsl as p;
        use schema::role_bindings::dsl as rb;
        use schema::service_accounts::{self, dsl};
        use schema::{permissions, role_bindings};

        let granting_roles = permissions::table
            .filter(p::service.eq(permission.service()))
            .filter(p::action.eq(permission.action()))
            .filter(p::ownership_level.eq_any(OwnershipLevel::implying(
                permission.ownership_level(),
            )))
            .filter(p::resource.eq_any(resource_ancestors(permission.resource())))
            .select(p::role_id);

        let holders = role_bindings::table
            .filter(rb::role_id.eq_any(granting_roles))
            .select(rb::service_account_id);

        service_accounts::table
            .filter(dsl::id.eq_any(holders))
            .select(count_star())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }
}
