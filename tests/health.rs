mod common;

use anyhow::Result;
use axum::http::StatusCode;

use listings::config::AuthConfig;
use listings::create_app;

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let (_dir, pool) = common::test_pool().await?;
    let app = create_app(pool.clone(), AuthConfig::default());

    let (status, v) = common::send(&app, "GET", "/api/health", None, None).await?;
    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");

    let db_ok = v.get("db_ok").and_then(|b| b.as_bool()).unwrap_or(false);
    assert!(db_ok, "expected db_ok: true, got: {}", v);

    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let (_dir, pool) = common::test_pool().await?;
    let app = create_app(pool, AuthConfig::default());

    let (status, v) = common::send(&app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(v["paths"]["/user/{id}"]["delete"].is_object(), "missing delete_user: {}", v);

    Ok(())
}
