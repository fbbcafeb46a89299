//! Database enumerations mirroring the domain enums of `warden-core`.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Corresponds to the `AUTHENTICATION_TYPE` PostgreSQL enum.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::AuthenticationType"]
pub enum AuthenticationType {
    /// Human operator authenticated through an OAuth2 provider.
    #[db_rename = "oauth2"]
    #[serde(rename = "oauth2")]
    #[strum(serialize = "oauth2")]
    OAuth2,

    /// Machine client authenticated with a key id and secret.
    #[db_rename = "keypair"]
    #[serde(rename = "keypair")]
    #[strum(serialize = "keypair")]
    KeyPair,
}

impl From<warden_core::AuthenticationType> for AuthenticationType {
    fn from(value: warden_core::AuthenticationType) -> Self {
        match value {
            warden_core::AuthenticationType::OAuth2 => Self::OAuth2,
            warden_core::AuthenticationType::KeyPair => Self::KeyPair,
        }
    }
}

impl From<AuthenticationType> for warden_core::AuthenticationType {
    fn from(value: AuthenticationType) -> Self {
        match value {
            AuthenticationType::OAuth2 => Self::OAuth2,
            AuthenticationType::KeyPair => Self::KeyPair,
        }
    }
}

/// Corresponds to the `OWNERSHIP_LEVEL` PostgreSQL enum.
///
/// Variants are declared weakest first, in the same order as the SQL type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::OwnershipLevel"]
pub enum OwnershipLevel {
    /// May use the grant but not delegate it.
    #[db_rename = "lender"]
    #[serde(rename = "Lender")]
    #[strum(serialize = "Lender")]
    Lender,

    /// May use and delegate the grant.
    #[db_rename = "owner"]
    #[serde(rename = "Owner")]
    #[strum(serialize = "Owner")]
    Owner,
}

impl OwnershipLevel {
    /// Returns every stored level that satisfies a request at `requested`.
    pub fn implying(requested: warden_core::OwnershipLevel) -> Vec<Self> {
        use strum::IntoEnumIterator;

        warden_core::OwnershipLevel::iter()
            .filter(|level| level.implies(requested))
            .map(Self::from)
            .collect()
    }
}

impl From<warden_core::OwnershipLevel> for OwnershipLevel {
    fn from(value: warden_core::OwnershipLevel) -> Self {
        match value {
            warden_core::OwnershipLevel::Lender => Self::Lender,
            warden_core::OwnershipLevel::Owner => Self::Owner,
        }
    }
}

impl From<OwnershipLevel> for warden_core::OwnershipLevel {
    fn from(value: OwnershipLevel) -> Self {
        match value {
            OwnershipLevel::Lender => Self::Lender,
            OwnershipLevel::Owner => Self::Owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn ownership_levels_mirror_core() {
        for level in warden_core::OwnershipLevel::iter() {
            let stored = OwnershipLevel::from(level);
            assert_eq!(warden_core::OwnershipLevel::from(stored), level);
            assert_eq!(stored.to_string(), level.to_string());
        }
    }

    #[test]
    fn declaration_order_matches_core() {
        let stored: Vec<_> = OwnershipLevel::iter()
            .map(warden_core::OwnershipLevel::from)
            .collect();
        let core: Vec<_> = warden_core::OwnershipLevel::iter().collect();
        assert_eq!(stored, core);
    }

    #[test]
    fn implying_levels() {
        assert_eq!(
            OwnershipLevel::implying(warden_core::OwnershipLevel::Owner),
            vec![OwnershipLevel::Owner]
        );
        assert_eq!(
            OwnershipLevel::implying(warden_core::OwnershipLevel::Lender),
            vec![OwnershipLevel::Lender, OwnershipLevel::Owner]
        );
    }

    #[test]
    fn authentication_types_mirror_core() {
        for kind in warden_core::AuthenticationType::iter() {
            let stored = AuthenticationType::from(kind);
            assert_eq!(warden_core::AuthenticationType::from(stored), kind);
            assert_eq!(stored.to_string(), kind.to_string());
        }
    }
}
