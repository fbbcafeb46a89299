//! Request extractors that answer rejections with [`Error`] bodies.
//!
//! Drop-in replacements for their axum counterparts; each maps the axum
//! rejection onto an [`ErrorKind`] so clients always get the same JSON
//! error shape.
//!
//! [`Error`]: crate::handler::Error
//! [`ErrorKind`]: crate::handler::ErrorKind

mod enhanced_json;
mod enhanced_path;
mod enhanced_query;
mod validated_json;

pub use self::enhanced_json::Json;
pub use self::enhanced_path::Path;
pub use self::enhanced_query::Query;
pub use self::validated_json::ValidateJson;

/// Trims a rejection message to something safe to log and return.
fn sanitize_error_message(message: &str) -> String {
    message
        .lines()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(200)
        .collect()
}
