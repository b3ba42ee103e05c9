//! Cart domain types and the pure total arithmetic.
//!
//! The cart caches an aggregate `final_price` and each line item caches its
//! own `final_price`. Both caches are stale between a mutation and the next
//! recalculation; every mutation path recalculates before responding. The
//! arithmetic itself lives here as pure functions so both store backends
//! share exactly one definition of "the cart total".

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use slate_core::{CartId, CustomerId, LineItemId, ProductId, ProductKind};

/// A customer's in-progress collection of intended purchases.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning customer. One active cart per customer.
    pub customer_id: CustomerId,
    /// Cached aggregate price. Equals the sum of line totals after
    /// recalculation.
    pub final_price: Decimal,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// Polymorphic product reference: type tag + stable identifier.
///
/// The identity key for a line item within a cart - adding the same
/// reference twice increments quantity instead of duplicating the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductRef {
    pub kind: ProductKind,
    pub product_id: ProductId,
}

/// One line item within a cart (product reference + quantity).
#[derive(Debug, Clone)]
pub struct CartItem {
    /// Unique line item ID.
    pub id: LineItemId,
    /// Owning cart. Deleted with the cart.
    pub cart_id: CartId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// The referenced product. Non-owning: many carts may reference one
    /// product, and the product is never deleted while referenced.
    pub product: ProductRef,
    /// Number of units. Always positive; a line whose quantity drops to
    /// zero is deleted instead.
    pub quantity: i32,
    /// Cached line total (unit price x quantity).
    pub final_price: Decimal,
}

/// Data for creating a new line item.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub cart_id: CartId,
    pub customer_id: CustomerId,
    pub product: ProductRef,
    pub quantity: i32,
    pub final_price: Decimal,
}

/// The inputs recalculation needs for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: LineItemId,
    /// The referenced product's current unit price.
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Compute one line item's total.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Compute a cart's aggregate total from its lines.
///
/// An empty cart totals to zero. Calling this twice over the same lines
/// yields the same result; recalculation is a pure function of current
/// state.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line_total(line.unit_price, line.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, unit_price: i64, quantity: i32) -> CartLine {
        CartLine {
            item_id: LineItemId::new(id),
            unit_price: Decimal::from(unit_price),
            quantity,
        }
    }

    #[test]
    fn test_single_line_matches_unit_price() {
        // One line item for a product priced 50000, quantity 1.
        let lines = vec![line(1, 50_000, 1)];
        assert_eq!(cart_total(&lines), Decimal::from(50_000));
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let lines = vec![line(1, 50_000, 2), line(2, 1_250, 4)];
        assert_eq!(cart_total(&lines), Decimal::from(105_000));
        assert_eq!(line_total(Decimal::from(1_250), 4), Decimal::from(5_000));
    }

    #[test]
    fn test_empty_cart_totals_to_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_total_is_idempotent() {
        let lines = vec![line(1, 50_000, 1), line(2, 300, 3)];
        assert_eq!(cart_total(&lines), cart_total(&lines));
    }

    #[test]
    fn test_fractional_prices_sum_exactly() {
        // Decimal arithmetic, not float: 0.10 + 0.20 == 0.30 exactly.
        let a = CartLine {
            item_id: LineItemId::new(1),
            unit_price: Decimal::new(10, 2),
            quantity: 1,
        };
        let b = CartLine {
            item_id: LineItemId::new(2),
            unit_price: Decimal::new(20, 2),
            quantity: 1,
        };
        assert_eq!(cart_total(&[a, b]), Decimal::new(30, 2));
    }
}
