#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};

/// Tracing target for authentication events.
pub const TRACING_TARGET_AUTHENTICATION: &str = "warden_server::authentication";

/// Tracing target for authorization decisions.
pub const TRACING_TARGET_AUTHORIZATION: &str = "warden_server::authorization";

/// Tracing target for service account lifecycle changes.
pub const TRACING_TARGET_LIFECYCLE: &str = "warden_server::lifecycle";
