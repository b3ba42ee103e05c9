//! In-memory storage backend.
//!
//! Hash maps behind a single mutex, with monotonic id counters. Semantics
//! mirror the Postgres backend exactly, including uniqueness conflicts and
//! delete-on-zero-quantity. Used by tests and available wherever a database
//! is not.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use slate_core::{CartId, CategoryId, CustomerId, LineItemId, ProductId, ProductKind};

use super::{RepoResult, RepositoryError};
use crate::models::cart::{self, CartLine};
use crate::models::{
    Cart, CartItem, Category, Customer, NewCartItem, NewCategory, NewCustomer, NewProduct,
    Product, ProductRef,
};

/// In-memory store. Cheap to clone; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    categories: HashMap<i32, Category>,
    products: HashMap<i32, Product>,
    customers: HashMap<i32, Customer>,
    carts: HashMap<i32, Cart>,
    items: HashMap<i32, CartItem>,
    next_id: i32,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panic elsewhere; the data is still
        // usable for the remaining requests.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) async fn healthcheck(&self) -> RepoResult<()> {
        Ok(())
    }

    // -- categories ----------------------------------------------------------

    pub(super) async fn create_category(&self, new: NewCategory) -> RepoResult<Category> {
        let mut inner = self.lock();
        if inner.categories.values().any(|c| c.slug == new.slug) {
            return Err(RepositoryError::Conflict(
                "category slug already exists".to_owned(),
            ));
        }

        let id = inner.next_id();
        let category = Category {
            id: CategoryId::new(id),
            name: new.name,
            slug: new.slug,
        };
        inner.categories.insert(id, category.clone());
        Ok(category)
    }

    pub(super) async fn category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    pub(super) async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.lock().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    // -- products ------------------------------------------------------------

    pub(super) async fn create_product(&self, new: NewProduct) -> RepoResult<Product> {
        let mut inner = self.lock();
        let kind = new.details.kind();
        if inner
            .products
            .values()
            .any(|p| p.kind() == kind && p.slug == new.slug)
        {
            return Err(RepositoryError::Conflict(
                "product (kind, slug) already exists".to_owned(),
            ));
        }

        let id = inner.next_id();
        let product = Product {
            id: ProductId::new(id),
            category_id: new.category_id,
            title: new.title,
            slug: new.slug,
            image: new.image,
            price: new.price,
            details: new.details,
            created_at: Utc::now(),
        };
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    pub(super) async fn product_by_handle(
        &self,
        kind: ProductKind,
        slug: &str,
    ) -> RepoResult<Option<Product>> {
        Ok(self
            .lock()
            .products
            .values()
            .find(|p| p.kind() == kind && p.slug == slug)
            .cloned())
    }

    pub(super) async fn product_by_id(&self, id: ProductId) -> RepoResult<Option<Product>> {
        Ok(self.lock().products.get(&id.as_i32()).cloned())
    }

    pub(super) async fn list_products(&self, limit: i64, offset: i64) -> RepoResult<Vec<Product>> {
        let mut products: Vec<Product> = self.lock().products.values().cloned().collect();
        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(products
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    pub(super) async fn count_products(&self) -> RepoResult<i64> {
        Ok(self.lock().products.len() as i64)
    }

    pub(super) async fn update_product_price(
        &self,
        id: ProductId,
        price: Decimal,
    ) -> RepoResult<()> {
        let mut inner = self.lock();
        let product = inner
            .products
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        product.price = price;
        Ok(())
    }

    // -- customers -----------------------------------------------------------

    pub(super) async fn create_customer(&self, new: NewCustomer) -> RepoResult<Customer> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let customer = Customer {
            id: CustomerId::new(id),
            phone: new.phone,
            address: new.address,
            created_at: Utc::now(),
        };
        inner.customers.insert(id, customer.clone());
        Ok(customer)
    }

    pub(super) async fn customer_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        Ok(self.lock().customers.get(&id.as_i32()).cloned())
    }

    // -- carts ---------------------------------------------------------------

    pub(super) async fn create_cart(&self, customer_id: CustomerId) -> RepoResult<Cart> {
        let mut inner = self.lock();
        if inner.carts.values().any(|c| c.customer_id == customer_id) {
            return Err(RepositoryError::Conflict(
                "customer already has a cart".to_owned(),
            ));
        }

        let id = inner.next_id();
        let cart = Cart {
            id: CartId::new(id),
            customer_id,
            final_price: Decimal::ZERO,
            created_at: Utc::now(),
        };
        inner.carts.insert(id, cart.clone());
        Ok(cart)
    }

    pub(super) async fn cart_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> RepoResult<Option<Cart>> {
        Ok(self
            .lock()
            .carts
            .values()
            .find(|c| c.customer_id == customer_id)
            .cloned())
    }

    pub(super) async fn cart_by_id(&self, id: CartId) -> RepoResult<Option<Cart>> {
        Ok(self.lock().carts.get(&id.as_i32()).cloned())
    }

    // -- line items ----------------------------------------------------------

    pub(super) async fn cart_items(&self, cart_id: CartId) -> RepoResult<Vec<CartItem>> {
        let mut items: Vec<CartItem> = self
            .lock()
            .items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id.as_i32());
        Ok(items)
    }

    pub(super) async fn find_cart_item(
        &self,
        cart_id: CartId,
        product: ProductRef,
    ) -> RepoResult<Option<CartItem>> {
        Ok(self
            .lock()
            .items
            .values()
            .find(|i| i.cart_id == cart_id && i.product == product)
            .cloned())
    }

    pub(super) async fn create_cart_item(&self, new: NewCartItem) -> RepoResult<CartItem> {
        let mut inner = self.lock();
        if inner
            .items
            .values()
            .any(|i| i.cart_id == new.cart_id && i.product == new.product)
        {
            return Err(RepositoryError::Conflict(
                "cart already has a line for this product".to_owned(),
            ));
        }

        let id = inner.next_id();
        let item = CartItem {
            id: LineItemId::new(id),
            cart_id: new.cart_id,
            customer_id: new.customer_id,
            product: new.product,
            quantity: new.quantity,
            final_price: new.final_price,
        };
        inner.items.insert(id, item.clone());
        Ok(item)
    }

    pub(super) async fn set_cart_item_quantity(
        &self,
        item_id: LineItemId,
        quantity: i32,
    ) -> RepoResult<()> {
        let mut inner = self.lock();
        if quantity <= 0 {
            return inner
                .items
                .remove(&item_id.as_i32())
                .map(|_| ())
                .ok_or(RepositoryError::NotFound);
        }

        let item = inner
            .items
            .get_mut(&item_id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        Ok(())
    }

    pub(super) async fn delete_cart_item(&self, item_id: LineItemId) -> RepoResult<bool> {
        Ok(self.lock().items.remove(&item_id.as_i32()).is_some())
    }

    // -- recalculation -------------------------------------------------------

    pub(super) async fn recalc_cart(&self, cart_id: CartId) -> RepoResult<Decimal> {
        let mut inner = self.lock();
        if !inner.carts.contains_key(&cart_id.as_i32()) {
            return Err(RepositoryError::NotFound);
        }

        let lines: Vec<CartLine> = inner
            .items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .map(|i| {
                let unit_price = inner
                    .products
                    .get(&i.product.product_id.as_i32())
                    .map(|p| p.price)
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!(
                            "line item {} references missing product {}",
                            i.id, i.product.product_id
                        ))
                    })?;
                Ok(CartLine {
                    item_id: i.id,
                    unit_price,
                    quantity: i.quantity,
                })
            })
            .collect::<RepoResult<_>>()?;

        for line in &lines {
            if let Some(item) = inner.items.get_mut(&line.item_id.as_i32()) {
                item.final_price = cart::line_total(line.unit_price, line.quantity);
            }
        }

        let total = cart::cart_total(&lines);
        if let Some(stored) = inner.carts.get_mut(&cart_id.as_i32()) {
            stored.final_price = total;
        }

        Ok(total)
    }
}
