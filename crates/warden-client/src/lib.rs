#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for remote permission checks.
pub const TRACING_TARGET_CLIENT: &str = "warden_client::client";

/// Tracing target for the guarding middleware.
pub const TRACING_TARGET_MIDDLEWARE: &str = "warden_client::middleware";

mod client;
mod config;
mod error;
mod middleware;

pub use crate::client::{Decision, HEADER_ACCESS_TOKEN, HEADER_EMAIL, PermissionClient};
pub use crate::config::{DEFAULT_SERVICE, DEFAULT_TIMEOUT, DEFAULT_URL, PermissionCheckConfig};
pub use crate::error::{ClientError, Result};
pub use crate::middleware::{PermissionGuard, RouterPermissionExt, require_permission};
