//! HTTP-level tests for the home page, catalog pages, and health checks.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use slate_integration_tests::{body_text, get as get_req, seed_notebook, test_app, test_config};
use slate_storefront::db::Store;
use slate_storefront::routes::{cart_routes, product_routes};
use slate_storefront::state::AppState;

#[tokio::test]
async fn home_page_renders_latest_products() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    let response = get_req(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Notebook test-slug"));
    assert!(body.contains("$50000.00"));
}

#[tokio::test]
async fn home_page_renders_with_empty_catalog() {
    let app = test_app(Store::memory());

    let response = get_req(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn products_index_lists_products() {
    let store = Store::memory();
    seed_notebook(&store, "alpha", 10000).await;
    seed_notebook(&store, "beta", 20000).await;
    let app = test_app(store);

    let response = get_req(&app, "/products").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Notebook alpha"));
    assert!(body.contains("Notebook beta"));
}

#[tokio::test]
async fn product_detail_shows_specs() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    let response = get_req(&app, "/products/notebook/test-slug").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Notebook test-slug"));
    assert!(body.contains("16 GB"));
    assert!(body.contains("/cart/add/notebook/test-slug"));
}

#[tokio::test]
async fn unknown_product_kind_is_not_found() {
    let app = test_app(Store::memory());

    let response = get_req(&app, "/products/smartphone/test-slug").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = test_app(Store::memory());

    let live = get_req(&app, "/health").await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = get_req(&app, "/health/ready").await;
    assert_eq!(ready.status(), StatusCode::OK);
}

// A router can swap the home handler for a stub while keeping the real
// catalog and cart sub-routers; dispatch must surface the stub's status
// untouched.
#[tokio::test]
async fn stubbed_home_status_passes_through_dispatch() {
    async fn stub_home() -> (StatusCode, Json<&'static str>) {
        (StatusCode::from_u16(444).unwrap(), Json("stub"))
    }

    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;

    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    let state = AppState::new(test_config(), store);

    let app = Router::new()
        .route("/", get(stub_home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .layer(session_layer)
        .with_state(state);

    let response = get_req(&app, "/").await;
    assert_eq!(response.status().as_u16(), 444);

    // The real sub-routers still answer alongside the stub
    let detail = get_req(&app, "/products/notebook/test-slug").await;
    assert_eq!(detail.status(), StatusCode::OK);
}
