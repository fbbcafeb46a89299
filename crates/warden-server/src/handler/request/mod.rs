//! Request types for HTTP handlers.

mod paginations;
mod paths;
mod permissions;
mod service_accounts;

pub use paginations::*;
pub use paths::*;
pub use permissions::*;
pub use service_accounts::*;
