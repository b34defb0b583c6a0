//! Liveness, readiness and metrics endpoint tests.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use drinks_test_utils::{MockJwksServer, TestDrinksServer};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_health_returns_ok() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    let server = TestDrinksServer::spawn(&jwks.jwks_url()).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_ready_tracks_store_availability() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    let server = TestDrinksServer::spawn(&jwks.jwks_url()).await?;
    let url = format!("{}/ready", server.url());

    let response = reqwest::get(&url).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"], "healthy");
    assert!(body.get("error").is_none());

    server.store().set_failing(true);

    let response = reqwest::get(&url).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["store"], "unhealthy");

    server.store().set_failing(false);

    let response = reqwest::get(&url).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_probes_do_not_touch_key_set() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    let server = TestDrinksServer::spawn(&jwks.jwks_url()).await?;

    reqwest::get(format!("{}/health", server.url())).await?;
    reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(jwks.fetch_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    let server = TestDrinksServer::spawn(&jwks.jwks_url()).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
