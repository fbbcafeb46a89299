//! HTTP and HTTPS serving with graceful shutdown.

mod error;
mod http_server;
#[cfg(feature = "tls")]
mod https_server;
mod lifecycle;
mod shutdown;

use axum::Router;
pub use error::{ServerError, ServerResult};
use shutdown::shutdown_signal;

use crate::config::ServerConfig;

/// Serves `app`, over HTTPS when the `tls` feature is on and both TLS paths
/// are configured.
pub async fn serve(app: Router, config: ServerConfig) -> ServerResult<()> {
    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) =
        (config.tls_cert_path.clone(), config.tls_key_path.clone())
    {
        return https_server::serve_https(app, config, &cert_path, &key_path).await;
    }

    http_server::serve_http(app, config).await
}
