//! Catalog domain types: categories and polymorphic products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use slate_core::{CategoryId, ProductId, ProductKind};

/// A product grouping (e.g., "Notebooks").
///
/// Created by an administrator and immutable in normal operation.
#[derive(Debug, Clone)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Unique URL slug.
    pub slug: String,
}

/// Data for creating a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

/// A purchasable product (domain type).
///
/// Every product carries the same base identity plus a variant-specific
/// attribute set in [`ProductDetails`]. Externally a product is identified
/// by its `(kind, slug)` pair.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Category this product belongs to.
    pub category_id: CategoryId,
    /// Display title.
    pub title: String,
    /// URL slug, unique within the product's kind.
    pub slug: String,
    /// Path to the product image.
    pub image: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Variant-specific attributes (also determines the product's kind).
    pub details: ProductDetails,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The type tag of this product.
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        self.details.kind()
    }
}

/// Data for creating a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub title: String,
    pub slug: String,
    pub image: String,
    pub price: Decimal,
    pub details: ProductDetails,
}

/// Variant-specific product attributes.
///
/// The tagged-union counterpart of the `kind` column: the tag is stored
/// separately and the variant payload is stored as JSON text next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductDetails {
    Notebook(NotebookSpecs),
}

impl ProductDetails {
    /// The type tag for this variant.
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        match self {
            Self::Notebook(_) => ProductKind::Notebook,
        }
    }

    /// Serialize the variant payload to JSON text for storage.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Notebook(specs) => serde_json::to_string(specs),
        }
    }

    /// Rebuild the variant from a stored `(kind, payload)` pair.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the payload does not match the kind's
    /// attribute set.
    pub fn from_parts(kind: ProductKind, json: &str) -> Result<Self, serde_json::Error> {
        match kind {
            ProductKind::Notebook => Ok(Self::Notebook(serde_json::from_str(json)?)),
        }
    }
}

/// Notebook-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookSpecs {
    /// Display diagonal (e.g., "17.3").
    pub diagonal: String,
    /// Display panel type (e.g., "IPS").
    pub display_type: String,
    /// Processor frequency (e.g., "3.4 GHz").
    pub processor_freq: String,
    /// RAM size (e.g., "6 GB").
    pub ram: String,
    /// Video card model.
    pub video_card: String,
    /// Battery life (e.g., "8 hours").
    pub time_without_charge: String,
}

impl NotebookSpecs {
    /// Label/value rows for the product detail page.
    #[must_use]
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Diagonal", self.diagonal.as_str()),
            ("Display type", self.display_type.as_str()),
            ("Processor frequency", self.processor_freq.as_str()),
            ("RAM", self.ram.as_str()),
            ("Video card", self.video_card.as_str()),
            ("Battery life", self.time_without_charge.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> NotebookSpecs {
        NotebookSpecs {
            diagonal: "17.3".to_owned(),
            display_type: "IPS".to_owned(),
            processor_freq: "3.4 GHz".to_owned(),
            ram: "6 GB".to_owned(),
            video_card: "GeForce GTX 1050ti".to_owned(),
            time_without_charge: "8 hours".to_owned(),
        }
    }

    #[test]
    fn test_details_json_roundtrip() {
        let details = ProductDetails::Notebook(specs());
        let json = details.to_json().unwrap();
        let back = ProductDetails::from_parts(ProductKind::Notebook, &json).unwrap();
        assert_eq!(back, details);
    }

    #[test]
    fn test_details_rejects_malformed_payload() {
        assert!(ProductDetails::from_parts(ProductKind::Notebook, "{}").is_err());
        assert!(ProductDetails::from_parts(ProductKind::Notebook, "not json").is_err());
    }

    #[test]
    fn test_details_kind_tag() {
        assert_eq!(
            ProductDetails::Notebook(specs()).kind(),
            ProductKind::Notebook
        );
    }
}
