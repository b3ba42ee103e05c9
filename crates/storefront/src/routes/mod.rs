//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check
//!
//! # Catalog
//! GET  /products                - Product listing (paginated)
//! GET  /products/{kind}/{slug}  - Product detail
//!
//! # Cart
//! GET  /cart                    - Cart page
//! GET  /cart/add/{kind}/{slug}  - Add to cart, 302 -> /cart/
//! POST /cart/update             - Set line item quantity, 302 -> /cart/
//! POST /cart/remove             - Remove line item, 302 -> /cart/
//! ```

pub mod cart;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{kind}/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{kind}/{slug}", get(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // axum's `nest` registers the inner "/" route as exactly "/cart";
        // mutations redirect to CART_PATH ("/cart/"), so wire that path too.
        .route("/cart/", get(cart::show))
}
