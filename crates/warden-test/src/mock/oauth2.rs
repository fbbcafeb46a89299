//! Mock OAuth2 provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use warden_core::{Error, OAuth2Identity, OAuth2Provider, Result};

#[derive(Debug, Clone)]
enum Outcome {
    Accept(OAuth2Identity),
    Forbid,
}

/// OAuth2 provider answering from a fixed table of access tokens.
///
/// Unknown tokens are rejected as invalid credentials. Clones share the
/// token table and the call counter.
#[derive(Debug, Clone, Default)]
pub struct MockOAuth2Provider {
    tokens: Arc<RwLock<HashMap<String, Outcome>>>,
    unavailable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockOAuth2Provider {
    /// Creates a provider that knows no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `access_token` as belonging to `email`.
    pub fn with_user(self, access_token: &str, email: &str) -> Self {
        self.with_identity(
            access_token,
            OAuth2Identity {
                email: email.to_owned(),
                access_token: access_token.to_owned(),
                picture: None,
            },
        )
    }

    /// Accepts `access_token` and reports `identity` for it.
    ///
    /// An identity whose token differs from `access_token` simulates a
    /// refresh by the provider.
    pub fn with_identity(self, access_token: &str, identity: OAuth2Identity) -> Self {
        self.insert(access_token, Outcome::Accept(identity));
        self
    }

    /// Rejects `access_token` as forbidden.
    pub fn with_forbidden(self, access_token: &str) -> Self {
        self.insert(access_token, Outcome::Forbid);
        self
    }

    /// Makes every call fail as if the provider were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns how many tokens were presented so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn insert(&self, access_token: &str, outcome: Outcome) {
        let mut tokens = self
            .tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tokens.insert(access_token.to_owned(), outcome);
    }
}

#[async_trait::async_trait]
impl OAuth2Provider for MockOAuth2Provider {
    async fn authenticate(&self, access_token: &str) -> Result<OAuth2Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::external_error().with_message("mock provider is unavailable"));
        }

        let tokens = self
            .tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match tokens.get(access_token) {
            Some(Outcome::Accept(identity)) => Ok(identity.clone()),
            Some(Outcome::Forbid) => Err(Error::forbidden()),
            None => Err(Error::invalid_credentials()),
        }
    }
}
