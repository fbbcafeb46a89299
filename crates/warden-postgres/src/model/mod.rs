//! Database models for all tables.

mod role;
mod role_binding;
mod role_permission;
mod service_account;

pub use role::{NewRole, Role};
pub use role_binding::{NewRoleBinding, RoleBinding};
pub use role_permission::{NewRolePermission, RolePermission};
pub use service_account::{NewServiceAccount, ServiceAccount, UpdateServiceAccount};
