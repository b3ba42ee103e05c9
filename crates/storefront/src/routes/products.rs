//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use slate_core::ProductKind;

use super::home::{ProductView, format_price};
use crate::error::{AppError, Result};
use crate::models::{Product, ProductDetails};
use crate::state::AppState;

/// One label/value row in the specs table.
#[derive(Clone)]
pub struct SpecRow {
    pub label: String,
    pub value: String,
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub kind: String,
    pub slug: String,
    pub title: String,
    pub price: String,
    pub image: String,
    pub specs: Vec<SpecRow>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let specs = match &product.details {
            ProductDetails::Notebook(specs) => specs
                .rows()
                .into_iter()
                .map(|(label, value)| SpecRow {
                    label: label.to_owned(),
                    value: value.to_owned(),
                })
                .collect(),
        };

        Self {
            kind: product.kind().to_string(),
            slug: product.slug.clone(),
            title: product.title.clone(),
            price: format_price(product.price),
            image: product.image.clone(),
            specs,
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_more_pages: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

/// Products per listing page.
const PER_PAGE: i64 = 12;

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<ProductsIndexTemplate> {
    let current_page = query.page.unwrap_or(1).max(1);
    let offset = i64::from(current_page - 1) * PER_PAGE;

    let products = state.store().list_products(PER_PAGE, offset).await?;
    let total = state.store().count_products().await?;
    let total_pages = u32::try_from((total + PER_PAGE - 1) / PER_PAGE).unwrap_or(u32::MAX).max(1);

    Ok(ProductsIndexTemplate {
        products: products.iter().map(ProductView::from).collect(),
        current_page,
        total_pages,
        has_more_pages: current_page < total_pages,
    })
}

/// Display product detail page.
///
/// An unknown kind segment and an unknown slug are both 404s.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<ProductShowTemplate> {
    let kind: ProductKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("product kind {kind}")))?;

    let product = state
        .store()
        .product_by_handle(kind, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {kind}/{slug}")))?;

    Ok(ProductShowTemplate {
        product: ProductDetailView::from(&product),
    })
}
