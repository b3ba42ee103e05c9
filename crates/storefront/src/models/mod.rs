//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types. Row-to-domain conversion (and its failure mode,
//! `RepositoryError::DataCorruption`) lives in the `db` module.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod session_keys;

pub use cart::{Cart, CartItem, CartLine, NewCartItem, ProductRef};
pub use catalog::{Category, NewCategory, NewProduct, NotebookSpecs, Product, ProductDetails};
pub use customer::{Customer, NewCustomer};
