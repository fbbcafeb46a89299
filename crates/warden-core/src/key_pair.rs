//! Key-pair credentials for machine clients.

use std::fmt;

use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of a generated key secret.
pub const KEY_SECRET_LENGTH: usize = 40;

/// A key id and its secret, as handed to a machine client once.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Public identifier of the key.
    pub key_id: String,
    /// Secret half of the key, never persisted in clear.
    pub key_secret: String,
}

impl KeyPair {
    /// Creates a key pair from its parts.
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    /// Generates a fresh key pair: a UUID v4 id and an alphanumeric secret.
    pub fn generate() -> Self {
        Self {
            key_id: Uuid::new_v4().to_string(),
            key_secret: Alphanumeric.sample_string(&mut rand::rng(), KEY_SECRET_LENGTH),
        }
    }

    /// Returns the digest of the secret, as stored and compared by storage.
    pub fn digest(&self) -> String {
        digest_secret(&self.key_secret)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish()
    }
}

/// Hex-encoded SHA-256 digest of a key secret.
pub fn digest_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
