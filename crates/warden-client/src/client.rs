//! HTTP client asking a Warden server whether a caller holds a permission.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Client, StatusCode};
use url::Url;
use warden_core::Permission;

use crate::{ClientError, PermissionCheckConfig, Result, TRACING_TARGET_CLIENT};

/// Response header carrying an access token reissued by the provider.
pub const HEADER_ACCESS_TOKEN: &str = "x-access-token";

/// Response header carrying the email of an OAuth2 caller.
pub const HEADER_EMAIL: &str = "x-email";

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The caller holds the permission.
    Granted {
        /// Access token reissued during authentication, if any.
        access_token: Option<String>,
        /// Email of the caller when authenticated through OAuth2.
        email: Option<String>,
    },
    /// The caller does not hold the permission, or its credentials were
    /// rejected (`401`).
    Denied {
        /// Status Warden answered with.
        status: StatusCode,
    },
}

impl Decision {
    /// Returns whether the permission was granted.
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

struct PermissionClientInner {
    http: Client,
    endpoint: Url,
    config: PermissionCheckConfig,
}

/// Client for `GET /permissions/has` on a Warden server.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Clone)]
pub struct PermissionClient {
    inner: Arc<PermissionClientInner>,
}

impl fmt::Debug for PermissionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl PermissionClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: PermissionCheckConfig) -> Result<Self> {
        config.validate()?;

        let base = config.url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/permissions/has"))
            .map_err(|err| ClientError::Config(format!("invalid url '{}': {err}", config.url)))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("warden-client/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            endpoint = %endpoint,
            timeout_ms = config.timeout().as_millis(),
            "Permission client created"
        );

        let inner = PermissionClientInner {
            http,
            endpoint,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &PermissionCheckConfig {
        &self.inner.config
    }

    /// Asks Warden whether the owner of `authorization` holds `permission`.
    ///
    /// `authorization` is the caller's full `Authorization` header value,
    /// forwarded unchanged.
    pub async fn has_permission(
        &self,
        authorization: &str,
        permission: &Permission,
    ) -> Result<Decision> {
        let started_at = Instant::now();
        let mut endpoint = self.inner.endpoint.clone();
        endpoint
            .query_pairs_mut()
            .append_pair("permission", &permission.to_string());

        let response = self
            .inner
            .http
            .get(endpoint)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .inspect_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET_CLIENT,
                    error = %err,
                    timeout = err.is_timeout(),
                    permission = %permission,
                    "Permission check failed"
                );
            })?;

        let status = response.status();
        let decision = decide(status, response.headers())?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            permission = %permission,
            status = status.as_u16(),
            granted = decision.is_granted(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "Permission checked"
        );

        Ok(decision)
    }
}

/// Interprets the status and headers of a `/permissions/has` response.
fn decide(status: StatusCode, headers: &HeaderMap) -> Result<Decision> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    match status {
        StatusCode::OK => Ok(Decision::Granted {
            access_token: header(HEADER_ACCESS_TOKEN),
            email: header(HEADER_EMAIL),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(Decision::Denied { status }),
        other => {
            tracing::warn!(
                target: TRACING_TARGET_CLIENT,
                status = other.as_u16(),
                "Unexpected permission check status"
            );
            Err(ClientError::UnexpectedStatus(other))
        }
    }
}
