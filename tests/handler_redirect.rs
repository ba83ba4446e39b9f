mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use common::MockConnectInfoLayer;
use sqlx::PgPool;
use tinylinks::api::handlers::redirect_handler;

fn server(pool: PgPool) -> TestServer {
    let state = common::create_test_state(pool);
    let app = Router::new()
        .route("/{slug}", get(redirect_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state);

    TestServer::new(app).unwrap()
}

#[sqlx::test]
async fn test_redirect_success(pool: PgPool) {
    common::insert_link(&pool, "redir1", "https://example.com/target", "active").await;
    let server = server(pool.clone());

    let response = server.get("/redir1").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/target");
    assert_eq!(common::click_counter(&pool, "redir1").await, 1);
}

#[sqlx::test]
async fn test_first_click_activates_pending_link(pool: PgPool) {
    common::insert_link(&pool, "pend01", "https://example.com", "pending").await;
    let server = server(pool.clone());

    let response = server.get("/pend01").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(
        common::link_status(&pool, "pend01").await.as_deref(),
        Some("active")
    );
}

#[sqlx::test]
async fn test_click_enqueues_geo_job_with_peer_address(pool: PgPool) {
    common::insert_link(&pool, "geo001", "https://example.com", "active").await;
    let server = server(pool.clone());

    server.get("/geo001").await;

    let payload: serde_json::Value =
        sqlx::query_scalar("SELECT payload FROM jobs WHERE kind = 'ParseGeoRequestJob'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(payload["slug"], "geo001");
    assert_eq!(payload["ip"], "127.0.0.1");
}

#[sqlx::test]
async fn test_unknown_slug_redirects_home(pool: PgPool) {
    let server = server(pool.clone());

    let response = server.get("/nope42").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(
        response.header("location"),
        "http://sho.rt/?not-found=nope42"
    );
    assert!(common::queued_kinds(&pool).await.is_empty());
}

#[sqlx::test]
async fn test_expired_link_redirects_home(pool: PgPool) {
    common::insert_expiring_link(&pool, "old001", "https://example.com", "active", -1).await;
    let server = server(pool);

    let response = server.get("/old001").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "http://sho.rt/?expired=old001");
}

#[sqlx::test]
async fn test_flagged_link_redirects_to_warning(pool: PgPool) {
    common::insert_link(&pool, "bad001", "https://bad.example", "MALWARE").await;
    let server = server(pool);

    let response = server.get("/bad001").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(
        response.header("location"),
        "http://sho.rt/?threat=MALWARE&slug=bad001"
    );
}

#[sqlx::test]
async fn test_password_protected_link(pool: PgPool) {
    common::insert_protected_link(&pool, "lock01", "https://secret.example", "hunter2").await;
    let server = server(pool);

    let missing = server.get("/lock01").await;
    assert_eq!(missing.status_code(), 401);
    assert_eq!(missing.json::<serde_json::Value>()["password_required"], true);

    let wrong = server.get("/lock01").add_query_param("password", "nope").await;
    assert_eq!(wrong.status_code(), 401);

    let right = server
        .get("/lock01")
        .add_query_param("password", "hunter2")
        .await;
    assert_eq!(right.status_code(), 302);
    assert_eq!(right.header("location"), "https://secret.example");
}

#[sqlx::test]
async fn test_mindful_link_returns_interstitial(pool: PgPool) {
    sqlx::query(
        "INSERT INTO links (slug, url, status, mindful) VALUES ('mind01', 'https://example.com', 'active', TRUE)",
    )
    .execute(&pool)
    .await
    .unwrap();
    let server = server(pool);

    let response = server.get("/mind01").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["url"], "https://example.com");
    assert_eq!(json["mindful"], true);
}
