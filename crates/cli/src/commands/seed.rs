//! Seed the catalog with demo data.
//!
//! Creates a "Notebooks" category and a handful of notebook products so a
//! fresh install has something to render. Safe to run repeatedly: products
//! that already exist are skipped.

use rust_decimal::Decimal;
use tracing::info;

use slate_storefront::db::{RepositoryError, Store, create_pool};
use slate_storefront::models::{NewCategory, NewProduct, NotebookSpecs, ProductDetails};

use super::CommandError;

/// Seed demo catalog data.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a write fails for a
/// reason other than the row already existing.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;
    let store = Store::pg(pool);

    let category = match store.category_by_slug("notebooks").await? {
        Some(existing) => {
            info!("Category 'notebooks' already exists");
            existing
        }
        None => {
            store
                .create_category(NewCategory {
                    name: "Notebooks".to_string(),
                    slug: "notebooks".to_string(),
                })
                .await?
        }
    };

    let mut created = 0u32;
    for product in demo_notebooks(&category) {
        let slug = product.slug.clone();
        match store.create_product(product).await {
            Ok(_) => {
                info!(%slug, "Created product");
                created += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                info!(%slug, "Product already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(created, "Seed complete");
    Ok(())
}

fn demo_notebooks(category: &slate_storefront::models::Category) -> Vec<NewProduct> {
    vec![
        NewProduct {
            category_id: category.id,
            title: "Aspect 14".to_string(),
            slug: "aspect-14".to_string(),
            image: "/static/img/aspect-14.jpg".to_string(),
            price: Decimal::from(50000),
            details: ProductDetails::Notebook(NotebookSpecs {
                diagonal: "14\"".to_string(),
                display_type: "IPS".to_string(),
                processor_freq: "3.4 GHz".to_string(),
                ram: "16 GB".to_string(),
                video_card: "Integrated".to_string(),
                time_without_charge: "10 hours".to_string(),
            }),
        },
        NewProduct {
            category_id: category.id,
            title: "Aspect 16 Pro".to_string(),
            slug: "aspect-16-pro".to_string(),
            image: "/static/img/aspect-16-pro.jpg".to_string(),
            price: Decimal::from(82000),
            details: ProductDetails::Notebook(NotebookSpecs {
                diagonal: "16\"".to_string(),
                display_type: "OLED".to_string(),
                processor_freq: "4.1 GHz".to_string(),
                ram: "32 GB".to_string(),
                video_card: "GeForce RTX 4060".to_string(),
                time_without_charge: "7 hours".to_string(),
            }),
        },
        NewProduct {
            category_id: category.id,
            title: "Fieldbook 13".to_string(),
            slug: "fieldbook-13".to_string(),
            image: "/static/img/fieldbook-13.jpg".to_string(),
            price: Decimal::from(36500),
            details: ProductDetails::Notebook(NotebookSpecs {
                diagonal: "13.3\"".to_string(),
                display_type: "IPS".to_string(),
                processor_freq: "2.8 GHz".to_string(),
                ram: "8 GB".to_string(),
                video_card: "Integrated".to_string(),
                time_without_charge: "14 hours".to_string(),
            }),
        },
    ]
}
