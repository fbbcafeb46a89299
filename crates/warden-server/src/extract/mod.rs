//! Request extractors.
//!
//! - [`AuthIdentity`] hands handlers the [`Identity`] resolved by the
//!   authentication middleware.
//! - [`PgPool`] acquires a pooled database connection.
//! - [`Json`], [`ValidateJson`], [`Path`] and [`Query`] replace their axum
//!   counterparts with JSON error rejections.
//!
//! [`Identity`]: warden_core::Identity

mod identity;
mod pg_connection;
pub mod reject;

pub use crate::extract::identity::AuthIdentity;
pub use crate::extract::pg_connection::PgPool;
pub use crate::extract::reject::{Json, Path, Query, ValidateJson};
