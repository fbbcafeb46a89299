//! HTTPS server backed by rustls.

use std::path::Path;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::{ServerError, ServerResult, shutdown_signal};

/// Serves `app` over HTTPS until a shutdown signal arrives.
///
/// In-flight requests get the configured shutdown timeout to finish.
pub async fn serve_https(
    app: Router,
    server_config: ServerConfig,
    cert_path: &Path,
    key_path: &Path,
) -> ServerResult<()> {
    validate_tls_file(cert_path, "Certificate")?;
    validate_tls_file(key_path, "Private key")?;

    let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|err| ServerError::TlsCertificate(format!("Failed to load TLS files: {err}")))?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        cert_path = %cert_path.display(),
        "TLS certificates loaded"
    );

    let server_addr = server_config.server_addr();
    let shutdown_timeout = server_config.shutdown_timeout();

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(shutdown_timeout));
    });

    serve_with_shutdown(&server_config, || async move {
        axum_server::bind_rustls(server_addr, tls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
    })
    .await
}

fn validate_tls_file(path: &Path, file_type: &str) -> ServerResult<()> {
    let metadata = std::fs::metadata(path).map_err(|err| {
        ServerError::TlsCertificate(format!(
            "Cannot read {file_type} file {}: {err}",
            path.display()
        ))
    })?;

    if !metadata.is_file() || metadata.len() == 0 {
        return Err(ServerError::TlsCertificate(format!(
            "{file_type} file is empty or not a file: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tls_files_are_rejected() {
        let result = validate_tls_file(Path::new("nonexistent_cert.pem"), "Certificate");
        assert!(matches!(result, Err(ServerError::TlsCertificate(msg)) if msg.contains("Certificate")));
    }
}
