#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for permission parsing and matching.
pub const TRACING_TARGET_PERMISSION: &str = "warden_core::permission";

/// Tracing target for OAuth2 provider operations.
pub const TRACING_TARGET_PROVIDER: &str = "warden_core::provider";

mod effective;
mod error;
mod identity;
mod key_pair;

pub mod permission;
pub mod provider;

pub use effective::effective_permissions;
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use identity::{AccessTokenAuth, AuthenticationType, Identity};
pub use key_pair::{KEY_SECRET_LENGTH, KeyPair, digest_secret};
pub use permission::{
    OwnershipLevel, Permission, PermissionGrant, Resource, build_permission, build_permissions,
    is_present,
};
pub use provider::{OAuth2Identity, OAuth2Provider, OAuth2Service};
