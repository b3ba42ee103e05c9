//! Postgres storage backend.
//!
//! Queries use the runtime sqlx API with bind parameters; rows are decoded
//! into private row structs and converted into domain types, with invalid
//! stored data surfaced as `RepositoryError::DataCorruption`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use slate_core::{CartId, CategoryId, CustomerId, LineItemId, ProductId, ProductKind};

use super::{RepoResult, RepositoryError};
use crate::models::cart::{self, CartLine};
use crate::models::{
    Cart, CartItem, Category, Customer, NewCartItem, NewCategory, NewCustomer, NewProduct,
    Product, ProductDetails, ProductRef,
};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    kind: String,
    title: String,
    slug: String,
    image: String,
    price: Decimal,
    specs: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let kind: ProductKind = row.kind.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product kind in database: {e}"))
        })?;
        let details = ProductDetails::from_parts(kind, &row.specs).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product specs in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            title: row.title,
            slug: row.slug,
            image: row.image,
            price: row.price,
            details,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    customer_id: i32,
    final_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            final_price: row.final_price,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    customer_id: i32,
    product_id: i32,
    kind: String,
    quantity: i32,
    final_price: Decimal,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let kind: ProductKind = row.kind.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product kind in database: {e}"))
        })?;

        Ok(Self {
            id: LineItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            customer_id: CustomerId::new(row.customer_id),
            product: ProductRef {
                kind,
                product_id: ProductId::new(row.product_id),
            },
            quantity: row.quantity,
            final_price: row.final_price,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    price: Decimal,
    quantity: i32,
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
fn map_insert_error(e: sqlx::Error, conflict_msg: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(conflict_msg.to_owned());
    }
    RepositoryError::Database(e)
}

impl PgStore {
    /// Create a new Postgres store over a pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(super) async fn healthcheck(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // -- categories ----------------------------------------------------------

    pub(super) async fn create_category(&self, new: NewCategory) -> RepoResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO category (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug
            ",
        )
        .bind(&new.name)
        .bind(&new.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "category slug already exists"))?;

        Ok(row.into())
    }

    pub(super) async fn category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug
            FROM category
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub(super) async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug
            FROM category
            ORDER BY name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // -- products ------------------------------------------------------------

    pub(super) async fn create_product(&self, new: NewProduct) -> RepoResult<Product> {
        let specs = new.details.to_json().map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize product specs: {e}"))
        })?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO product (category_id, kind, title, slug, image, price, specs)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, category_id, kind, title, slug, image, price, specs, created_at
            ",
        )
        .bind(new.category_id.as_i32())
        .bind(new.details.kind().as_str())
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.image)
        .bind(new.price)
        .bind(&specs)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "product (kind, slug) already exists"))?;

        row.try_into()
    }

    pub(super) async fn product_by_handle(
        &self,
        kind: ProductKind,
        slug: &str,
    ) -> RepoResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, kind, title, slug, image, price, specs, created_at
            FROM product
            WHERE kind = $1 AND slug = $2
            ",
        )
        .bind(kind.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub(super) async fn product_by_id(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, kind, title, slug, image, price, specs, created_at
            FROM product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub(super) async fn list_products(&self, limit: i64, offset: i64) -> RepoResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, kind, title, slug, image, price, specs, created_at
            FROM product
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub(super) async fn count_products(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub(super) async fn update_product_price(
        &self,
        id: ProductId,
        price: Decimal,
    ) -> RepoResult<()> {
        let result = sqlx::query("UPDATE product SET price = $1 WHERE id = $2")
            .bind(price)
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // -- customers -----------------------------------------------------------

    pub(super) async fn create_customer(&self, new: NewCustomer) -> RepoResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customer (phone, address)
            VALUES ($1, $2)
            RETURNING id, phone, address, created_at
            ",
        )
        .bind(&new.phone)
        .bind(&new.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub(super) async fn customer_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, phone, address, created_at
            FROM customer
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    // -- carts ---------------------------------------------------------------

    pub(super) async fn create_cart(&self, customer_id: CustomerId) -> RepoResult<Cart> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO cart (customer_id)
            VALUES ($1)
            RETURNING id, customer_id, final_price, created_at
            ",
        )
        .bind(customer_id.as_i32())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "customer already has a cart"))?;

        Ok(row.into())
    }

    pub(super) async fn cart_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> RepoResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, customer_id, final_price, created_at
            FROM cart
            WHERE customer_id = $1
            ",
        )
        .bind(customer_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub(super) async fn cart_by_id(&self, id: CartId) -> RepoResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, customer_id, final_price, created_at
            FROM cart
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    // -- line items ----------------------------------------------------------

    pub(super) async fn cart_items(&self, cart_id: CartId) -> RepoResult<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, customer_id, product_id, kind, quantity, final_price
            FROM cart_item
            WHERE cart_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(cart_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub(super) async fn find_cart_item(
        &self,
        cart_id: CartId,
        product: ProductRef,
    ) -> RepoResult<Option<CartItem>> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, customer_id, product_id, kind, quantity, final_price
            FROM cart_item
            WHERE cart_id = $1 AND kind = $2 AND product_id = $3
            ",
        )
        .bind(cart_id.as_i32())
        .bind(product.kind.as_str())
        .bind(product.product_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub(super) async fn create_cart_item(&self, new: NewCartItem) -> RepoResult<CartItem> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_item (cart_id, customer_id, product_id, kind, quantity, final_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, cart_id, customer_id, product_id, kind, quantity, final_price
            ",
        )
        .bind(new.cart_id.as_i32())
        .bind(new.customer_id.as_i32())
        .bind(new.product.product_id.as_i32())
        .bind(new.product.kind.as_str())
        .bind(new.quantity)
        .bind(new.final_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "cart already has a line for this product"))?;

        row.try_into()
    }

    pub(super) async fn set_cart_item_quantity(
        &self,
        item_id: LineItemId,
        quantity: i32,
    ) -> RepoResult<()> {
        // Quantity dropping to zero deletes the line instead of storing a
        // zero-quantity item.
        let result = if quantity <= 0 {
            sqlx::query("DELETE FROM cart_item WHERE id = $1")
                .bind(item_id.as_i32())
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query("UPDATE cart_item SET quantity = $1 WHERE id = $2")
                .bind(quantity)
                .bind(item_id.as_i32())
                .execute(&self.pool)
                .await?
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    pub(super) async fn delete_cart_item(&self, item_id: LineItemId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM cart_item WHERE id = $1")
            .bind(item_id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -- recalculation -------------------------------------------------------

    pub(super) async fn recalc_cart(&self, cart_id: CartId) -> RepoResult<Decimal> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the cart serializes concurrent recalculations and
        // closes the lost-update window on the cached aggregate.
        let locked = sqlx::query_scalar::<_, i32>("SELECT id FROM cart WHERE id = $1 FOR UPDATE")
            .bind(cart_id.as_i32())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, p.price, ci.quantity
            FROM cart_item ci
            JOIN product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id ASC
            ",
        )
        .bind(cart_id.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        let lines: Vec<CartLine> = rows
            .into_iter()
            .map(|r| CartLine {
                item_id: LineItemId::new(r.id),
                unit_price: r.price,
                quantity: r.quantity,
            })
            .collect();

        for line in &lines {
            sqlx::query("UPDATE cart_item SET final_price = $1 WHERE id = $2")
                .bind(cart::line_total(line.unit_price, line.quantity))
                .bind(line.item_id.as_i32())
                .execute(&mut *tx)
                .await?;
        }

        let total = cart::cart_total(&lines);
        sqlx::query("UPDATE cart SET final_price = $1 WHERE id = $2")
            .bind(total)
            .bind(cart_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(total)
    }
}
