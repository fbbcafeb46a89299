//! Database errors raised by the in-memory store.

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error};
use warden_postgres::PgError;

/// Details of a violated constraint, shaped like a Postgres error report.
#[derive(Debug)]
struct Violation {
    message: String,
    table: &'static str,
    constraint: &'static str,
}

impl DatabaseErrorInformation for Violation {
    fn message(&self) -> &str {
        &self.message
    }

    fn details(&self) -> Option<&str> {
        None
    }

    fn hint(&self) -> Option<&str> {
        None
    }

    fn table_name(&self) -> Option<&str> {
        Some(self.table)
    }

    fn column_name(&self) -> Option<&str> {
        None
    }

    fn constraint_name(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn statement_position(&self) -> Option<i32> {
        None
    }
}

fn violation(kind: DatabaseErrorKind, table: &'static str, constraint: &'static str) -> PgError {
    let message = format!("violates constraint \"{constraint}\" on table \"{table}\"");
    PgError::Query(Error::DatabaseError(
        kind,
        Box::new(Violation {
            message,
            table,
            constraint,
        }),
    ))
}

pub(super) fn unique(table: &'static str, constraint: &'static str) -> PgError {
    violation(DatabaseErrorKind::UniqueViolation, table, constraint)
}

pub(super) fn foreign_key(table: &'static str, constraint: &'static str) -> PgError {
    violation(DatabaseErrorKind::ForeignKeyViolation, table, constraint)
}

pub(super) fn check(table: &'static str, constraint: &'static str) -> PgError {
    violation(DatabaseErrorKind::CheckViolation, table, constraint)
}

pub(super) fn not_found() -> PgError {
    PgError::Query(Error::NotFound)
}

#[cfg(test)]
mod tests {
    use warden_postgres::types::{ConstraintViolation, ServiceAccountConstraints};

    use super::*;

    #[test]
    fn violations_carry_constraint_names() {
        let error = unique("service_accounts", "service_accounts_email_unique_idx");
        assert!(error.is_unique_violation());
        assert_eq!(
            error.constraint_violation(),
            Some(ConstraintViolation::ServiceAccount(
                ServiceAccountConstraints::EmailUnique
            ))
        );

        let error = foreign_key("role_bindings", "role_bindings_role_id_fkey");
        assert!(!error.is_unique_violation());
        assert_eq!(error.constraint(), Some("role_bindings_role_id_fkey"));
    }
}
