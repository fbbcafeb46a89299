//! Guarded routes against a stand-in Warden server.

use std::collections::HashMap;

use axum::Router;
use axum::extract::Query;
use axum::http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_test::TestServer;
use warden_client::{
    Decision, PermissionCheckConfig, PermissionClient, PermissionGuard, RouterPermissionExt,
};
use warden_core::{OwnershipLevel, build_permission};

/// Grants `reports::Lender::read::reports/1` to `Bearer good`, echoing a
/// refreshed token, and rejects every other token.
async fn has_permission(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let permission = query.get("permission").map(String::as_str);

    match (authorization, permission) {
        (Some("Bearer good"), Some("reports::Lender::read::reports/1")) => (
            StatusCode::OK,
            [("x-access-token", "refreshed"), ("x-email", "ana@example.com")],
        )
            .into_response(),
        (Some("Bearer good"), _) => StatusCode::FORBIDDEN.into_response(),
        (Some("Bearer broken"), _) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn spawn_warden() -> anyhow::Result<String> {
    let app = Router::new().route("/permissions/has", get(has_permission));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });
    Ok(format!("http://{address}"))
}

fn guarded_server(config: PermissionCheckConfig) -> anyhow::Result<TestServer> {
    let client = PermissionClient::new(config)?;
    let guard = PermissionGuard::new(client, OwnershipLevel::Lender, "read", |request| {
        request.uri().path().trim_start_matches('/').to_owned()
    });

    let app = Router::new()
        .route("/reports/{id}", get(|| async { "report" }))
        .with_permission(guard);

    Ok(TestServer::new(app)?)
}

#[tokio::test]
async fn client_reports_decisions() -> anyhow::Result<()> {
    let url = spawn_warden().await?;
    let client = PermissionClient::new(PermissionCheckConfig::new(url).with_service("reports"))?;
    let permission = build_permission("reports::Lender::read::reports/1")?;

    let decision = client.has_permission("Bearer good", &permission).await?;
    assert_eq!(
        decision,
        Decision::Granted {
            access_token: Some("refreshed".to_owned()),
            email: Some("ana@example.com".to_owned()),
        }
    );

    let other = build_permission("reports::Lender::read::reports/2")?;
    let decision = client.has_permission("Bearer good", &other).await?;
    assert_eq!(
        decision,
        Decision::Denied {
            status: StatusCode::FORBIDDEN
        }
    );

    let decision = client.has_permission("Bearer bad", &permission).await?;
    assert!(!decision.is_granted());

    assert!(client.has_permission("Bearer broken", &permission).await.is_err());
    Ok(())
}

#[tokio::test]
async fn granted_requests_reach_the_handler() -> anyhow::Result<()> {
    let url = spawn_warden().await?;
    let server = guarded_server(PermissionCheckConfig::new(url).with_service("reports"))?;

    let response = server
        .get("/reports/1")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer good"))
        .await;

    response.assert_status_ok();
    response.assert_text("report");
    assert_eq!(response.header("x-access-token"), "refreshed");
    assert_eq!(response.header("x-email"), "ana@example.com");
    Ok(())
}

#[tokio::test]
async fn denied_requests_are_rejected() -> anyhow::Result<()> {
    let url = spawn_warden().await?;
    let server = guarded_server(PermissionCheckConfig::new(url).with_service("reports"))?;

    let response = server
        .get("/reports/2")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer good"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .get("/reports/1")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer bad"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server.get("/reports/1").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/reports/1")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer broken"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn unreachable_warden_is_a_server_error() -> anyhow::Result<()> {
    let server = guarded_server(PermissionCheckConfig::new("http://127.0.0.1:1"))?;

    let response = server
        .get("/reports/1")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer good"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn disabled_config_passes_through() -> anyhow::Result<()> {
    let server = guarded_server(PermissionCheckConfig::default())?;

    let response = server.get("/reports/1").await;
    response.assert_status_ok();
    response.assert_text("report");
    Ok(())
}
