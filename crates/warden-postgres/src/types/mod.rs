//! Contains constraints, enumerations and other custom types.

mod constraints;
mod enums;

pub use constraints::{
    ConstraintCategory, ConstraintViolation, PermissionConstraints, RoleBindingConstraints,
    RoleConstraints, ServiceAccountConstraints,
};
pub use enums::{AuthenticationType, OwnershipLevel};
