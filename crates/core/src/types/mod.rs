//! Shared domain types.

pub mod id;
pub mod kind;
pub mod price;

pub use id::{CartId, CategoryId, CustomerId, LineItemId, ProductId};
pub use kind::{ProductKind, UnknownKindError};
pub use price::{CurrencyCode, Price};
