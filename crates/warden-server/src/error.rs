//! Service layer error types.
//!
//! Every service operation fails with [`Error`]. Its [`ErrorKind`] decides
//! how the HTTP layer renders it; see `handler::error` for the mapping.

use std::borrow::Cow;
use std::error::Error as StdError;

use strum::{Display, IntoStaticStr};
use validator::ValidationErrors;
use warden_core::Permission;
use warden_postgres::PgError;
use warden_postgres::error::DieselError;
use warden_postgres::types::{ConstraintCategory, ConstraintViolation, ServiceAccountConstraints};

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing service layer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A permission string does not parse.
    MalformedPermission,
    /// One or more fields failed validation.
    Validation,
    /// The caller tried to delegate grants it does not own.
    InsufficientPermission,
    /// The caller lacks one specific grant.
    MissingPermission,
    /// A lookup found nothing.
    NotFound,
    /// The `Authorization` header uses an unknown scheme.
    InvalidAuthorizationScheme,
    /// Credentials are missing, malformed or rejected.
    Unauthenticated,
    /// A write conflicts with existing state.
    Conflict,
    /// An external identity provider failed.
    #[strum(serialize = "external_service")]
    External,
    /// The database failed.
    Storage,
    /// Invalid configuration.
    Config,
    /// A broken internal invariant.
    #[strum(serialize = "internal_service")]
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns whether the caller can fix the error by changing the request.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        !matches!(
            self,
            Self::External | Self::Storage | Self::Config | Self::Internal
        )
    }
}

/// Service layer error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    /// Permission the caller is missing, for the permission kinds.
    permission: Option<String>,
    /// Field-level failures, for [`ErrorKind::Validation`].
    validation: Option<ValidationErrors>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            permission: None,
            validation: None,
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the serialized permission the caller is missing, if any.
    #[must_use]
    #[inline]
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Returns the field-level validation failures, if any.
    #[must_use]
    #[inline]
    pub fn validation(&self) -> Option<&ValidationErrors> {
        self.validation.as_ref()
    }

    /// Consumes the error and returns its validation failures, if any.
    pub fn into_validation(self) -> Option<ValidationErrors> {
        self.validation
    }

    /// Creates a new malformed permission error.
    #[inline]
    pub fn malformed_permission(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::MalformedPermission, message)
    }

    /// Creates a new validation error from field-level failures.
    pub fn validation_failed(errors: ValidationErrors) -> Self {
        let mut error = Self::new(ErrorKind::Validation, "Validation failed");
        error.validation = Some(errors);
        error
    }

    /// Creates an error for a delegation the caller does not own.
    pub fn insufficient_permission(permission: &Permission) -> Self {
        let mut error = Self::new(
            ErrorKind::InsufficientPermission,
            "Cannot grant permissions the caller does not own",
        );
        error.permission = Some(permission.to_string());
        error
    }

    /// Creates an error for a single grant the caller lacks.
    pub fn missing_permission(permission: &Permission) -> Self {
        let mut error = Self::new(ErrorKind::MissingPermission, "Missing required permission");
        error.permission = Some(permission.to_string());
        error
    }

    /// Creates a new not found error.
    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates an error for an unrecognized `Authorization` scheme.
    pub fn invalid_authorization_scheme(scheme: &str) -> Self {
        Self::new(
            ErrorKind::InvalidAuthorizationScheme,
            format!("Unsupported authorization scheme '{scheme}'"),
        )
    }

    /// Creates a new authentication error.
    #[inline]
    pub fn unauthenticated(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Creates a new conflict error.
    #[inline]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates a new external service error.
    #[inline]
    pub fn external(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::External, message)
    }

    /// Creates a new storage error.
    #[inline]
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a new internal service error.
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation_failed(errors)
    }
}

impl From<PgError> for Error {
    fn from(error: PgError) -> Self {
        if matches!(error, PgError::Query(DieselError::NotFound)) {
            return Self::not_found("Record not found").with_source(error);
        }

        match error.constraint_violation() {
            Some(ConstraintViolation::ServiceAccount(ServiceAccountConstraints::EmailUnique)) => {
                Self::conflict("A service account with this email already exists")
                    .with_source(error)
            }
            Some(violation) if violation.categorize() == ConstraintCategory::Uniqueness => {
                Self::conflict(format!("Conflicting {} record", violation.table_name()))
                    .with_source(error)
            }
            _ => Self::storage("Database operation failed").with_source(error),
        }
    }
}

impl From<warden_core::Error> for Error {
    fn from(error: warden_core::Error) -> Self {
        use warden_core::ErrorKind as CoreErrorKind;

        match error.kind() {
            CoreErrorKind::MalformedPermission => {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| "Malformed permission".to_owned());
                Self::malformed_permission(message).with_source(error)
            }
            CoreErrorKind::InvalidCredentials => {
                Self::unauthenticated("Invalid access token").with_source(error)
            }
            CoreErrorKind::Forbidden => {
                Self::unauthenticated("Access token owner is not allowed").with_source(error)
            }
            CoreErrorKind::ExternalError => {
                Self::external("Identity provider unavailable").with_source(error)
            }
        }
    }
}
