//! HTTP-level tests for the cart flow.
//!
//! These drive the real router (routing, session cookies, form extractors)
//! over the in-memory store, so they run with plain `cargo test`.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use rust_decimal::Decimal;

use slate_integration_tests::{
    body_text, get, get_with_cookie, only_cart, post_form, seed_notebook, session_cookie, test_app,
};
use slate_storefront::db::Store;

#[tokio::test]
async fn add_to_cart_redirects_to_cart_page() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    let response = get(&app, "/cart/add/notebook/test-slug").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get(header::LOCATION).unwrap();
    assert_eq!(location, "/cart/");
}

#[tokio::test]
async fn add_to_cart_recalculates_final_price() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store.clone());

    let response = get(&app, "/cart/add/notebook/test-slug").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let cart = only_cart(&store).await;
    assert_eq!(cart.final_price, Decimal::from(50000));
}

#[tokio::test]
async fn adding_same_product_twice_increments_quantity() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store.clone());

    let first = get(&app, "/cart/add/notebook/test-slug").await;
    assert_eq!(first.status(), StatusCode::FOUND);
    let cookie = session_cookie(&first).expect("first add should set a session cookie");

    let second = get_with_cookie(&app, "/cart/add/notebook/test-slug", &cookie).await;
    assert_eq!(second.status(), StatusCode::FOUND);

    let cart = only_cart(&store).await;
    let items = store.cart_items(cart.id).await.unwrap();
    assert_eq!(items.len(), 1, "no duplicate line item");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(cart.final_price, Decimal::from(100_000));
}

#[tokio::test]
async fn add_with_unknown_kind_is_not_found() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    let response = get(&app, "/cart/add/smartphone/test-slug").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_with_unknown_slug_is_not_found() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    let response = get(&app, "/cart/add/notebook/no-such-product").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_page_renders_empty_without_creating_records() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store.clone());

    let response = get(&app, "/cart/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Your cart is empty"));

    // Viewing the cart must not create a customer or cart row
    assert!(store.cart_for_customer(slate_core::types::CustomerId::new(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn cart_page_shows_added_items() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    let added = get(&app, "/cart/add/notebook/test-slug").await;
    let cookie = session_cookie(&added).unwrap();

    let response = get_with_cookie(&app, "/cart/", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Notebook test-slug"));
    assert!(body.contains("$50000.00"));
}

#[tokio::test]
async fn update_quantity_recalculates_total() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store.clone());

    let added = get(&app, "/cart/add/notebook/test-slug").await;
    let cookie = session_cookie(&added).unwrap();

    let cart = only_cart(&store).await;
    let items = store.cart_items(cart.id).await.unwrap();
    let item_id = i32::from(items[0].id);

    let response = post_form(
        &app,
        "/cart/update",
        &cookie,
        &format!("item_id={item_id}&quantity=3"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let cart = store.cart_by_id(cart.id).await.unwrap().unwrap();
    assert_eq!(cart.final_price, Decimal::from(150_000));
}

#[tokio::test]
async fn remove_item_empties_cart_and_zeroes_total() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store.clone());

    let added = get(&app, "/cart/add/notebook/test-slug").await;
    let cookie = session_cookie(&added).unwrap();

    let cart = only_cart(&store).await;
    let items = store.cart_items(cart.id).await.unwrap();
    let item_id = i32::from(items[0].id);

    let response = post_form(&app, "/cart/remove", &cookie, &format!("item_id={item_id}")).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let cart = store.cart_by_id(cart.id).await.unwrap().unwrap();
    assert_eq!(cart.final_price, Decimal::ZERO);
    assert!(store.cart_items(cart.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_without_session_is_not_found() {
    let store = Store::memory();
    seed_notebook(&store, "test-slug", 50000).await;
    let app = test_app(store);

    // No session cookie: there is no cart to mutate
    let response = post_form(&app, "/cart/update", "", "item_id=1&quantity=3").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
