//! Configuration for the remote permission check.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

/// Default address of the Warden server.
pub const DEFAULT_URL: &str = "http://localhost:4040";

/// Default timeout for a single permission check: 500 milliseconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default service namespace of guarded permissions.
pub const DEFAULT_SERVICE: &str = "service";

/// Configuration of [`PermissionClient`] and [`PermissionGuard`].
///
/// [`PermissionClient`]: crate::PermissionClient
/// [`PermissionGuard`]: crate::PermissionGuard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct PermissionCheckConfig {
    /// Whether requests are checked at all
    #[cfg_attr(
        feature = "config",
        arg(long = "warden-enabled", env = "WARDEN_ENABLED", default_value_t = false)
    )]
    pub enabled: bool,

    /// Base URL of the Warden server
    #[cfg_attr(
        feature = "config",
        arg(long = "warden-url", env = "WARDEN_URL", default_value = DEFAULT_URL)
    )]
    pub url: String,

    /// Timeout of one permission check in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "warden-timeout-ms", env = "WARDEN_TIMEOUT_MS", default_value_t = 500)
    )]
    pub timeout_ms: u64,

    /// Service namespace of the permissions this process checks
    #[cfg_attr(
        feature = "config",
        arg(long = "warden-service", env = "WARDEN_SERVICE", default_value = DEFAULT_SERVICE)
    )]
    pub service: String,
}

impl Default for PermissionCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: DEFAULT_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            service: DEFAULT_SERVICE.to_owned(),
        }
    }
}

impl PermissionCheckConfig {
    /// Creates an enabled configuration pointing at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets whether requests are checked.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the timeout of one permission check.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the service namespace of guarded permissions.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Returns the timeout, falling back to the default when zero.
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.service.is_empty() {
            return Err(ClientError::Config("service cannot be empty".to_owned()));
        }

        let url = url::Url::parse(&self.url)
            .map_err(|err| ClientError::Config(format!("invalid url '{}': {err}", self.url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "url scheme must be http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PermissionCheckConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.url, "http://localhost:4040");
        assert_eq!(config.timeout(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_uses_default() {
        let config = PermissionCheckConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn validation() {
        assert!(PermissionCheckConfig::new("not a url").validate().is_err());
        assert!(PermissionCheckConfig::new("ftp://iam").validate().is_err());
        assert!(
            PermissionCheckConfig::new("https://iam.internal")
                .with_service("")
                .validate()
                .is_err()
        );
    }
}
