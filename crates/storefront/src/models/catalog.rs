//! Catalog types: products and categories.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{CategoryId, Price, ProductId};

use crate::gateway::{Record, Table};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL-friendly unique name.
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Current catalog price.
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Current price in the store currency.
    #[must_use]
    pub const fn display_price(&self) -> Price {
        Price::usd(self.price)
    }
}

impl Record for Product {
    const TABLE: Table = Table::Products;
    type Id = ProductId;
    type Draft = NewProduct;
}

/// Insert payload for a [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

/// Partial update for a [`Product`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Category {
    const TABLE: Table = Table::Categories;
    type Id = CategoryId;
    type Draft = NewCategory;
}

/// Insert payload for a [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}
