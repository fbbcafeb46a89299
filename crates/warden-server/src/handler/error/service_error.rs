//! Service error to HTTP error conversion.
//!
//! Client-caused failures keep their message; infrastructure failures are
//! logged here and answered with a bare 500.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::handler::response::ValidationErrorDetail;

/// Tracing target for service error conversions.
const TRACING_TARGET: &str = "warden_server::handler::service";

impl From<crate::Error> for HttpError<'static> {
    fn from(error: crate::Error) -> Self {
        use crate::ErrorKind as ServiceErrorKind;

        if error.kind().is_client_error() {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                error_kind = %error.kind(),
                "Service operation rejected"
            );
        } else {
            tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                error_kind = %error.kind(),
                source = ?std::error::Error::source(&error),
                "Service operation failed"
            );
        }

        match error.kind() {
            ServiceErrorKind::MalformedPermission => ErrorKind::MalformedPermission
                .with_message(error.message().to_owned()),

            ServiceErrorKind::Validation => {
                let message = error.message().to_owned();
                let details = error
                    .into_validation()
                    .map(|errors| ValidationErrorDetail::from_errors(&errors))
                    .unwrap_or_default();

                ErrorKind::ValidationError
                    .with_message(message)
                    .with_validation(details)
            }

            ServiceErrorKind::InsufficientPermission | ServiceErrorKind::MissingPermission => {
                let forbidden = ErrorKind::Forbidden.with_message(error.message().to_owned());
                match error.permission() {
                    Some(permission) => forbidden.with_resource(permission.to_owned()),
                    None => forbidden,
                }
            }

            ServiceErrorKind::NotFound => {
                ErrorKind::NotFound.with_message(error.message().to_owned())
            }

            ServiceErrorKind::InvalidAuthorizationScheme => {
                ErrorKind::InvalidAuthScheme.with_message(error.message().to_owned())
            }

            ServiceErrorKind::Unauthenticated => {
                ErrorKind::Unauthorized.with_message(error.message().to_owned())
            }

            ServiceErrorKind::Conflict => {
                ErrorKind::Conflict.with_message(error.message().to_owned())
            }

            ServiceErrorKind::External
            | ServiceErrorKind::Storage
            | ServiceErrorKind::Config
            | ServiceErrorKind::Internal => ErrorKind::InternalServerError.into_error(),
        }
    }
}
