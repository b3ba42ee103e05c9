//! Cart mutation logic.
//!
//! Every mutation here ends with [`Store::recalc_cart`], so the cached
//! aggregate a handler renders afterwards is never stale. Callers resolve
//! the customer first (the session side of that lives in the cart routes).

use rust_decimal::Decimal;

use slate_core::{CustomerId, LineItemId};

use crate::db::{RepositoryError, Store};
use crate::error::{AppError, Result};
use crate::models::cart;
use crate::models::{Cart, NewCartItem, Product, ProductRef};

/// Get the customer's active cart, creating one if none exists.
///
/// # Errors
///
/// Returns `AppError::Repository` if the store fails.
pub async fn get_or_create_cart(store: &Store, customer_id: CustomerId) -> Result<Cart> {
    if let Some(existing) = store.cart_for_customer(customer_id).await? {
        return Ok(existing);
    }

    match store.create_cart(customer_id).await {
        Ok(created) => Ok(created),
        // Another request for the same customer may have created the cart
        // between our lookup and insert.
        Err(RepositoryError::Conflict(_)) => store
            .cart_for_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::Internal("cart vanished after conflict".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Add a product to the cart and recalculate.
///
/// The product reference is the identity key within a cart: if a line item
/// for it already exists its quantity is incremented, otherwise a new line
/// with quantity 1 is inserted. Returns the new aggregate total.
///
/// # Errors
///
/// Returns `AppError::Repository` if the store fails.
pub async fn add_product(
    store: &Store,
    cart: &Cart,
    customer_id: CustomerId,
    product: &Product,
) -> Result<Decimal> {
    let product_ref = ProductRef {
        kind: product.kind(),
        product_id: product.id,
    };

    match store.find_cart_item(cart.id, product_ref).await? {
        Some(existing) => {
            store
                .set_cart_item_quantity(existing.id, existing.quantity + 1)
                .await?;
        }
        None => {
            store
                .create_cart_item(NewCartItem {
                    cart_id: cart.id,
                    customer_id,
                    product: product_ref,
                    quantity: 1,
                    final_price: cart::line_total(product.price, 1),
                })
                .await?;
        }
    }

    Ok(store.recalc_cart(cart.id).await?)
}

/// Set a line item's quantity and recalculate.
///
/// A quantity of zero or less removes the line item.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the line item is not in this cart.
pub async fn set_quantity(
    store: &Store,
    cart: &Cart,
    item_id: LineItemId,
    quantity: i32,
) -> Result<Decimal> {
    ensure_item_in_cart(store, cart, item_id).await?;
    store.set_cart_item_quantity(item_id, quantity).await?;
    Ok(store.recalc_cart(cart.id).await?)
}

/// Remove a line item and recalculate.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the line item is not in this cart.
pub async fn remove_item(store: &Store, cart: &Cart, item_id: LineItemId) -> Result<Decimal> {
    ensure_item_in_cart(store, cart, item_id).await?;
    store.delete_cart_item(item_id).await?;
    Ok(store.recalc_cart(cart.id).await?)
}

/// Reject line item ids that belong to someone else's cart.
async fn ensure_item_in_cart(store: &Store, cart: &Cart, item_id: LineItemId) -> Result<()> {
    let owned = store
        .cart_items(cart.id)
        .await?
        .iter()
        .any(|i| i.id == item_id);
    if owned {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("line item {item_id}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::{NewCategory, NewProduct, NotebookSpecs, ProductDetails};

    async fn seed_product(store: &Store, slug: &str, price: i64) -> Product {
        let category = match store.category_by_slug("notebooks").await.unwrap() {
            Some(c) => c,
            None => store
                .create_category(NewCategory {
                    name: "Notebooks".to_owned(),
                    slug: "notebooks".to_owned(),
                })
                .await
                .unwrap(),
        };

        store
            .create_product(NewProduct {
                category_id: category.id,
                title: format!("Notebook {slug}"),
                slug: slug.to_owned(),
                image: format!("/static/images/{slug}.jpg"),
                price: Decimal::from(price),
                details: ProductDetails::Notebook(NotebookSpecs {
                    diagonal: "17.3".to_owned(),
                    display_type: "IPS".to_owned(),
                    processor_freq: "3.4 GHz".to_owned(),
                    ram: "6 GB".to_owned(),
                    video_card: "GeForce GTX 1050ti".to_owned(),
                    time_without_charge: "8 hours".to_owned(),
                }),
            })
            .await
            .unwrap()
    }

    async fn customer(store: &Store) -> CustomerId {
        store
            .create_customer(crate::models::NewCustomer::default())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_recalc_single_item_equals_unit_price() {
        let store = Store::memory();
        let product = seed_product(&store, "test-slug", 50_000).await;
        let customer_id = customer(&store).await;
        let cart = get_or_create_cart(&store, customer_id).await.unwrap();

        let total = add_product(&store, &cart, customer_id, &product)
            .await
            .unwrap();
        assert_eq!(total, Decimal::from(50_000));

        let cart = store.cart_by_id(cart.id).await.unwrap().unwrap();
        assert_eq!(cart.final_price, Decimal::from(50_000));
        assert_eq!(store.cart_items(cart.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_add_increments_quantity() {
        let store = Store::memory();
        let product = seed_product(&store, "test-slug", 50_000).await;
        let customer_id = customer(&store).await;
        let cart = get_or_create_cart(&store, customer_id).await.unwrap();

        add_product(&store, &cart, customer_id, &product)
            .await
            .unwrap();
        let total = add_product(&store, &cart, customer_id, &product)
            .await
            .unwrap();

        let items = store.cart_items(cart.id).await.unwrap();
        assert_eq!(items.len(), 1, "same product must not duplicate the line");
        let item = items.first().unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.final_price, Decimal::from(100_000));
        assert_eq!(total, Decimal::from(100_000));
    }

    #[tokio::test]
    async fn test_recalc_is_idempotent() {
        let store = Store::memory();
        let product = seed_product(&store, "test-slug", 50_000).await;
        let customer_id = customer(&store).await;
        let cart = get_or_create_cart(&store, customer_id).await.unwrap();
        add_product(&store, &cart, customer_id, &product)
            .await
            .unwrap();

        let first = store.recalc_cart(cart.id).await.unwrap();
        let second = store.recalc_cart(cart.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            store.cart_by_id(cart.id).await.unwrap().unwrap().final_price,
            first
        );
    }

    #[tokio::test]
    async fn test_recalc_refreshes_after_price_change() {
        let store = Store::memory();
        let product = seed_product(&store, "test-slug", 50_000).await;
        let customer_id = customer(&store).await;
        let cart = get_or_create_cart(&store, customer_id).await.unwrap();
        add_product(&store, &cart, customer_id, &product)
            .await
            .unwrap();

        store
            .update_product_price(product.id, Decimal::from(45_000))
            .await
            .unwrap();

        // Cache is stale until recalculation.
        let stale = store.cart_by_id(cart.id).await.unwrap().unwrap();
        assert_eq!(stale.final_price, Decimal::from(50_000));

        let total = store.recalc_cart(cart.id).await.unwrap();
        assert_eq!(total, Decimal::from(45_000));
        let item = store.cart_items(cart.id).await.unwrap();
        assert_eq!(item.first().unwrap().final_price, Decimal::from(45_000));
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let store = Store::memory();
        let product = seed_product(&store, "test-slug", 50_000).await;
        let customer_id = customer(&store).await;
        let cart = get_or_create_cart(&store, customer_id).await.unwrap();
        add_product(&store, &cart, customer_id, &product)
            .await
            .unwrap();

        let items = store.cart_items(cart.id).await.unwrap();
        let total = set_quantity(&store, &cart, items.first().unwrap().id, 0)
            .await
            .unwrap();

        assert_eq!(total, Decimal::ZERO);
        assert!(store.cart_items(cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_item_recalculates() {
        let store = Store::memory();
        let keep = seed_product(&store, "keep", 1_000).await;
        let drop = seed_product(&store, "drop", 2_000).await;
        let customer_id = customer(&store).await;
        let cart = get_or_create_cart(&store, customer_id).await.unwrap();
        add_product(&store, &cart, customer_id, &keep).await.unwrap();
        add_product(&store, &cart, customer_id, &drop).await.unwrap();

        let items = store.cart_items(cart.id).await.unwrap();
        let to_remove = items.iter().find(|i| i.product.product_id == drop.id);
        let total = remove_item(&store, &cart, to_remove.unwrap().id)
            .await
            .unwrap();

        assert_eq!(total, Decimal::from(1_000));
        assert_eq!(store.cart_items(cart.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_line_item_is_not_found() {
        let store = Store::memory();
        let product = seed_product(&store, "test-slug", 50_000).await;

        let first = customer(&store).await;
        let first_cart = get_or_create_cart(&store, first).await.unwrap();
        add_product(&store, &first_cart, first, &product)
            .await
            .unwrap();
        let foreign_item = store.cart_items(first_cart.id).await.unwrap();

        let second = customer(&store).await;
        let second_cart = get_or_create_cart(&store, second).await.unwrap();

        let err = remove_item(&store, &second_cart, foreign_item.first().unwrap().id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_or_create_cart_reuses_existing() {
        let store = Store::memory();
        let customer_id = customer(&store).await;

        let first = get_or_create_cart(&store, customer_id).await.unwrap();
        let second = get_or_create_cart(&store, customer_id).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
