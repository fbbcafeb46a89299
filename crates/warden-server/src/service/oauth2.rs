//! OAuth2 access token verification against an OpenID userinfo endpoint.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;
use warden_core::{OAuth2Identity, OAuth2Provider};

use crate::{Error, Result, TRACING_TARGET_AUTHENTICATION};

/// Default userinfo endpoint.
const DEFAULT_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 60;

/// Identity provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OAuth2Config {
    /// OpenID userinfo endpoint queried with the presented bearer token.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "oauth2-userinfo-url",
            env = "OAUTH2_USERINFO_URL",
            default_value = DEFAULT_USERINFO_URL
        )
    )]
    pub oauth2_userinfo_url: String,

    /// Timeout of a single userinfo request in seconds (1-60).
    #[cfg_attr(
        feature = "config",
        arg(long = "oauth2-timeout-secs", env = "OAUTH2_TIMEOUT_SECS", default_value = "5")
    )]
    pub oauth2_timeout_secs: u64,

    /// Email domains allowed to log in; empty allows every domain.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "oauth2-allowed-domains",
            env = "OAUTH2_ALLOWED_DOMAINS",
            value_delimiter = ','
        )
    )]
    pub oauth2_allowed_domains: Vec<String>,
}

impl OAuth2Config {
    /// Creates a configuration for the given userinfo endpoint.
    pub fn new(userinfo_url: impl Into<String>) -> Self {
        Self {
            oauth2_userinfo_url: userinfo_url.into(),
            oauth2_timeout_secs: 5,
            oauth2_allowed_domains: Vec::new(),
        }
    }

    /// Restricts logins to the given email domains.
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.oauth2_allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the request timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.oauth2_timeout_secs)
    }

    /// Parses the userinfo endpoint.
    pub fn userinfo_url(&self) -> Result<Url> {
        let url = Url::parse(&self.oauth2_userinfo_url)
            .map_err(|error| Error::config("Invalid OAuth2 userinfo URL").with_source(error))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config("OAuth2 userinfo URL must use http or https"));
        }

        Ok(url)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.userinfo_url()?;

        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.oauth2_timeout_secs) {
            return Err(Error::config(format!(
                "OAuth2 timeout must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds"
            )));
        }

        Ok(())
    }

    /// Returns whether `email` belongs to an allowed domain.
    pub fn is_allowed(&self, email: &str) -> bool {
        if self.oauth2_allowed_domains.is_empty() {
            return true;
        }

        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };

        self.oauth2_allowed_domains
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(domain))
    }
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self::new(DEFAULT_USERINFO_URL)
    }
}

/// Claims read from the userinfo response.
#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    picture: Option<String>,
}

/// [`OAuth2Provider`] calling an OpenID userinfo endpoint.
///
/// Any non-success status rejects the token. Transport failures and
/// timeouts are reported as an unavailable provider.
#[derive(Debug, Clone)]
pub struct UserInfoProvider {
    client: reqwest::Client,
    userinfo_url: Url,
    config: OAuth2Config,
}

impl UserInfoProvider {
    /// Creates a provider from validated configuration.
    pub fn new(config: OAuth2Config) -> Result<Self> {
        config.validate()?;
        let userinfo_url = config.userinfo_url()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|error| Error::config("Failed to build HTTP client").with_source(error))?;

        Ok(Self {
            client,
            userinfo_url,
            config,
        })
    }
}

#[async_trait::async_trait]
impl OAuth2Provider for UserInfoProvider {
    async fn authenticate(&self, access_token: &str) -> warden_core::Result<OAuth2Identity> {
        let response = self
            .client
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_AUTHENTICATION,
                    error = %error,
                    timeout = error.is_timeout(),
                    "Userinfo request failed"
                );
                warden_core::Error::external_error().with_source(error)
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(warden_core::Error::invalid_credentials());
            }
            status if status.is_server_error() => {
                return Err(warden_core::Error::external_error()
                    .with_message(format!("Userinfo endpoint answered {status}")));
            }
            status => {
                return Err(warden_core::Error::invalid_credentials()
                    .with_message(format!("Userinfo endpoint answered {status}")));
            }
        }

        let user_info: UserInfo = response.json().await.map_err(|error| {
            warden_core::Error::external_error()
                .with_message("Malformed userinfo response")
                .with_source(error)
        })?;

        if user_info.email_verified == Some(false) || !self.config.is_allowed(&user_info.email) {
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                email = %user_info.email,
                "Identity rejected by provider policy"
            );
            return Err(warden_core::Error::forbidden());
        }

        Ok(OAuth2Identity {
            email: user_info.email,
            access_token: access_token.to_owned(),
            picture: user_info.picture.filter(|picture| !picture.is_empty()),
        })
    }
}
