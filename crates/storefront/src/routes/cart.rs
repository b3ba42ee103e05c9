//! Cart route handlers.
//!
//! The customer id lives in the session; it is created on the first cart
//! mutation. Every mutation recalculates the cart before redirecting back
//! to the cart page, so the rendered totals are never stale.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use slate_core::{CustomerId, LineItemId, ProductKind};

use super::home::format_price;
use crate::error::{AppError, Result};
use crate::models::{CartItem, Customer, NewCustomer, session_keys};
use crate::services;
use crate::state::AppState;

/// The cart page path mutations redirect to.
pub const CART_PATH: &str = "/cart/";

/// Cart line item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub item_id: i32,
    pub kind: String,
    pub slug: String,
    pub title: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: usize,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: format_price(rust_decimal::Decimal::ZERO),
            item_count: 0,
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the customer ID from the session.
async fn get_customer_id(session: &Session) -> Option<CustomerId> {
    session
        .get::<CustomerId>(session_keys::CUSTOMER_ID)
        .await
        .ok()
        .flatten()
}

/// Resolve the session's customer, creating one on first interaction.
async fn resolve_customer(state: &AppState, session: &Session) -> Result<Customer> {
    if let Some(id) = get_customer_id(session).await
        && let Some(customer) = state.store().customer_by_id(id).await?
    {
        return Ok(customer);
    }

    let customer = state.store().create_customer(NewCustomer::default()).await?;
    session
        .insert(session_keys::CUSTOMER_ID, customer.id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist session: {e}")))?;

    Ok(customer)
}

/// 302 redirect to the cart page.
fn redirect_to_cart() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, CART_PATH)]).into_response()
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: i32,
    pub quantity: i32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
///
/// A session without a customer (or a customer without a cart) renders the
/// empty cart; viewing never creates records.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let Some(customer_id) = get_customer_id(&session).await else {
        return Ok(CartShowTemplate {
            cart: CartView::empty(),
        });
    };

    let Some(cart) = state.store().cart_for_customer(customer_id).await? else {
        return Ok(CartShowTemplate {
            cart: CartView::empty(),
        });
    };

    let items = state.store().cart_items(cart.id).await?;
    let mut views = Vec::with_capacity(items.len());
    for item in &items {
        views.push(item_view(&state, item).await?);
    }

    Ok(CartShowTemplate {
        cart: CartView {
            items: views,
            total: format_price(cart.final_price),
            item_count: items.len(),
        },
    })
}

/// Build the display row for one line item.
async fn item_view(state: &AppState, item: &CartItem) -> Result<CartItemView> {
    let product = state
        .store()
        .product_by_id(item.product.product_id)
        .await?
        .ok_or_else(|| {
            // The schema forbids deleting a referenced product.
            AppError::Internal(format!(
                "line item {} references missing product {}",
                item.id, item.product.product_id
            ))
        })?;

    Ok(CartItemView {
        item_id: item.id.as_i32(),
        kind: item.product.kind.to_string(),
        slug: product.slug,
        title: product.title,
        quantity: item.quantity,
        unit_price: format_price(product.price),
        line_price: format_price(item.final_price),
    })
}

/// Add a product to the cart.
///
/// Resolves the product by its `(kind, slug)` pair, resolves or creates the
/// session's customer and cart, increments or inserts the line item,
/// recalculates, and answers `302 Found` to `/cart/`.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<Response> {
    let kind: ProductKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("product kind {kind}")))?;

    let product = state
        .store()
        .product_by_handle(kind, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {kind}/{slug}")))?;

    let customer = resolve_customer(&state, &session).await?;
    let cart = services::cart::get_or_create_cart(state.store(), customer.id).await?;
    let total = services::cart::add_product(state.store(), &cart, customer.id, &product).await?;

    tracing::debug!(cart_id = %cart.id, %total, "added product to cart");

    Ok(redirect_to_cart())
}

/// Set a line item's quantity.
///
/// Quantity zero or less removes the line. Recalculates and redirects to
/// the cart page.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let cart = mutable_cart(&state, &session).await?;
    services::cart::set_quantity(
        state.store(),
        &cart,
        LineItemId::new(form.item_id),
        form.quantity,
    )
    .await?;

    Ok(redirect_to_cart())
}

/// Remove a line item from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let cart = mutable_cart(&state, &session).await?;
    services::cart::remove_item(state.store(), &cart, LineItemId::new(form.item_id)).await?;

    Ok(redirect_to_cart())
}

/// The session's existing cart, for mutations that require one.
async fn mutable_cart(state: &AppState, session: &Session) -> Result<crate::models::Cart> {
    let customer_id = get_customer_id(session)
        .await
        .ok_or_else(|| AppError::NotFound("cart".to_owned()))?;

    state
        .store()
        .cart_for_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart".to_owned()))
}
