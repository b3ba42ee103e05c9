//! Persistence layer for the storefront.
//!
//! # Tables
//!
//! - `category` - product groupings
//! - `product` - polymorphic products (`kind` tag + JSON spec payload)
//! - `customer` - commerce customers (session-scoped identity)
//! - `cart` - one active cart per customer, cached aggregate price
//! - `cart_item` - line items, cascade-deleted with their cart
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p slate-cli -- migrate
//! ```
//!
//! # Backends
//!
//! [`Store`] dispatches over two backends with identical semantics: the
//! Postgres backend used in production and an in-memory backend used by
//! tests and the CLI dry runs. Handlers receive the store by reference
//! through [`crate::state::AppState`]; there is no thread- or request-local
//! persistence state.

pub mod memory;
pub mod pg;

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use slate_core::{CartId, CustomerId, LineItemId, ProductId, ProductKind};

use crate::models::{
    Cart, CartItem, Category, Customer, NewCartItem, NewCategory, NewCustomer, NewProduct,
    Product, ProductRef,
};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data could not be decoded into a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Result type alias for repository operations.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Storage backend for the storefront.
///
/// Every method has identical semantics across backends; tests exercise the
/// in-memory variant, production uses Postgres.
#[derive(Clone)]
pub enum Store {
    Pg(PgStore),
    Memory(MemoryStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $body:expr) => {
        match $self {
            Self::Pg($store) => $body,
            Self::Memory($store) => $body,
        }
    };
}

impl Store {
    /// Wrap a Postgres pool.
    #[must_use]
    pub const fn pg(pool: PgPool) -> Self {
        Self::Pg(PgStore::new(pool))
    }

    /// Create an empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::default())
    }

    /// Verify the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the backend cannot be reached.
    pub async fn healthcheck(&self) -> RepoResult<()> {
        dispatch!(self, s => s.healthcheck().await)
    }

    // -- categories ----------------------------------------------------------

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    pub async fn create_category(&self, new: NewCategory) -> RepoResult<Category> {
        dispatch!(self, s => s.create_category(new).await)
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        dispatch!(self, s => s.category_by_slug(slug).await)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        dispatch!(self, s => s.list_categories().await)
    }

    // -- products ------------------------------------------------------------

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `(kind, slug)` already exists.
    pub async fn create_product(&self, new: NewProduct) -> RepoResult<Product> {
        dispatch!(self, s => s.create_product(new).await)
    }

    /// Look up a product by its external `(kind, slug)` identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored spec payload is
    /// invalid.
    pub async fn product_by_handle(
        &self,
        kind: ProductKind,
        slug: &str,
    ) -> RepoResult<Option<Product>> {
        dispatch!(self, s => s.product_by_handle(kind, slug).await)
    }

    /// Look up a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_by_id(&self, id: ProductId) -> RepoResult<Option<Product>> {
        dispatch!(self, s => s.product_by_id(id).await)
    }

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self, limit: i64, offset: i64) -> RepoResult<Vec<Product>> {
        dispatch!(self, s => s.list_products(limit, offset).await)
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_products(&self) -> RepoResult<i64> {
        dispatch!(self, s => s.count_products().await)
    }

    /// Update a product's unit price.
    ///
    /// Line item caches referencing the product stay stale until the next
    /// recalculation of their cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update_product_price(&self, id: ProductId, price: Decimal) -> RepoResult<()> {
        dispatch!(self, s => s.update_product_price(id, price).await)
    }

    // -- customers -----------------------------------------------------------

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_customer(&self, new: NewCustomer) -> RepoResult<Customer> {
        dispatch!(self, s => s.create_customer(new).await)
    }

    /// Look up a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        dispatch!(self, s => s.customer_by_id(id).await)
    }

    // -- carts ---------------------------------------------------------------

    /// Create a cart for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer already has a
    /// cart.
    pub async fn create_cart(&self, customer_id: CustomerId) -> RepoResult<Cart> {
        dispatch!(self, s => s.create_cart(customer_id).await)
    }

    /// Get the customer's active cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_for_customer(&self, customer_id: CustomerId) -> RepoResult<Option<Cart>> {
        dispatch!(self, s => s.cart_for_customer(customer_id).await)
    }

    /// Look up a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_by_id(&self, id: CartId) -> RepoResult<Option<Cart>> {
        dispatch!(self, s => s.cart_by_id(id).await)
    }

    // -- line items ----------------------------------------------------------

    /// List a cart's line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_items(&self, cart_id: CartId) -> RepoResult<Vec<CartItem>> {
        dispatch!(self, s => s.cart_items(cart_id).await)
    }

    /// Find the cart's line item for a product reference, if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_cart_item(
        &self,
        cart_id: CartId,
        product: ProductRef,
    ) -> RepoResult<Option<CartItem>> {
        dispatch!(self, s => s.find_cart_item(cart_id, product).await)
    }

    /// Insert a new line item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart already has a line
    /// for the same product reference.
    pub async fn create_cart_item(&self, new: NewCartItem) -> RepoResult<CartItem> {
        dispatch!(self, s => s.create_cart_item(new).await)
    }

    /// Set a line item's quantity. A quantity of zero or less deletes the
    /// line item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line item does not exist.
    pub async fn set_cart_item_quantity(
        &self,
        item_id: LineItemId,
        quantity: i32,
    ) -> RepoResult<()> {
        dispatch!(self, s => s.set_cart_item_quantity(item_id, quantity).await)
    }

    /// Delete a line item.
    ///
    /// # Returns
    ///
    /// Returns `true` if the line item was deleted, `false` if it didn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_cart_item(&self, item_id: LineItemId) -> RepoResult<bool> {
        dispatch!(self, s => s.delete_cart_item(item_id).await)
    }

    // -- recalculation -------------------------------------------------------

    /// Recalculate and persist the cart's cached totals.
    ///
    /// Reads every line item with the referenced product's current unit
    /// price, writes each line's `final_price` and the cart's aggregate
    /// `final_price`, and returns the new aggregate. Idempotent: a second
    /// call with no intervening mutation changes nothing. The Postgres
    /// backend serializes concurrent recalculations of one cart with a row
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist.
    pub async fn recalc_cart(&self, cart_id: CartId) -> RepoResult<Decimal> {
        dispatch!(self, s => s.recalc_cart(cart_id).await)
    }
}
