//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use rust_decimal::Decimal;
use tracing::instrument;

use slate_core::{CurrencyCode, Price};

use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub kind: String,
    pub slug: String,
    pub title: String,
    pub price: String,
    pub image: String,
}

/// Format a decimal amount as a store-currency price string.
pub(crate) fn format_price(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            kind: product.kind().to_string(),
            slug: product.slug.clone(),
            title: product.title.clone(),
            price: format_price(product.price),
            image: product.image.clone(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Latest products for the grid.
    pub products: Vec<ProductView>,
}

/// Number of products to show on the home page.
const HOME_PRODUCT_LIMIT: i64 = 8;

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let products = state.store().list_products(HOME_PRODUCT_LIMIT, 0).await?;

    Ok(HomeTemplate {
        products: products.iter().map(ProductView::from).collect(),
    })
}
