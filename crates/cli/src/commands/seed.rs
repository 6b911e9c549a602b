//! Seed the catalog from a YAML file.
//!
//! # File format
//!
//! ```yaml
//! categories:
//!   - name: Mugs
//!     slug: mugs
//! products:
//!   - name: Enamel Mug
//!     slug: enamel-mug
//!     price: "12.50"
//!     category: mugs
//!     description: Stoneware, 350 ml
//!     image_url: https://cdn.example.com/mug.jpg
//!     in_stock: true
//! ```
//!
//! `category` refers to a category slug in the same file. Rows whose slug
//! already exists are left untouched, so seeding twice is harmless.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use shopfront_core::CategoryId;
use shopfront_storefront::gateway::{Filter, Gateway, GatewayError};
use shopfront_storefront::models::{Category, NewCategory, NewProduct, Product};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{count} validation errors found")]
    Invalid {
        count: usize,
        errors: Vec<String>,
    },

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Parsed seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<NewCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A product entry, referring to its category by slug.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

/// Rows written by a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub products_created: usize,
    pub skipped: usize,
}

/// Read and validate a seed file.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read, parsed or validated.
pub async fn load(path: &Path) -> Result<SeedFile, SeedError> {
    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        for err in &errors {
            warn!("  - {err}");
        }
        return Err(SeedError::Invalid {
            count: errors.len(),
            errors,
        });
    }

    info!(
        categories = file.categories.len(),
        products = file.products.len(),
        "Parsed seed file"
    );
    Ok(file)
}

/// Check a seed file for problems the database would reject.
#[must_use]
pub fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_slugs = HashSet::new();
    for category in &file.categories {
        if category.slug.trim().is_empty() {
            errors.push(format!("category '{}' has an empty slug", category.name));
        }
        if !category_slugs.insert(category.slug.as_str()) {
            errors.push(format!("duplicate category slug '{}'", category.slug));
        }
    }

    let mut product_slugs = HashSet::new();
    for product in &file.products {
        if product.slug.trim().is_empty() {
            errors.push(format!("product '{}' has an empty slug", product.name));
        }
        if !product_slugs.insert(product.slug.as_str()) {
            errors.push(format!("duplicate product slug '{}'", product.slug));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("product '{}' has a negative price", product.slug));
        }
        if let Some(category) = &product.category
            && !category_slugs.contains(category.as_str())
        {
            errors.push(format!(
                "product '{}' refers to unknown category '{category}'",
                product.slug
            ));
        }
    }

    errors
}

/// Insert the file's categories, then its products.
///
/// # Errors
///
/// Returns `SeedError::Gateway` if a backend write fails for a reason
/// other than the row already existing.
pub async fn apply<G: Gateway>(gateway: &G, file: &SeedFile) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();
    let mut category_ids: HashMap<&str, CategoryId> = HashMap::new();

    for draft in &file.categories {
        let category = match gateway.insert::<Category>(draft).await {
            Ok(category) => {
                summary.categories_created += 1;
                category
            }
            Err(GatewayError::Conflict(_)) => {
                summary.skipped += 1;
                gateway
                    .select_one::<Category>(&Filter::new().eq("slug", &draft.slug))
                    .await?
            }
            Err(e) => return Err(e.into()),
        };
        category_ids.insert(draft.slug.as_str(), category.id);
    }

    for product in &file.products {
        let draft = NewProduct {
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            category_id: product
                .category
                .as_deref()
                .and_then(|slug| category_ids.get(slug).copied()),
            image_url: product.image_url.clone(),
            in_stock: product.in_stock,
        };
        match gateway.insert::<Product>(&draft).await {
            Ok(created) => {
                info!(slug = %created.slug, price = %created.price, "Product created");
                summary.products_created += 1;
            }
            Err(GatewayError::Conflict(_)) => {
                info!(slug = %draft.slug, "Product exists, skipping");
                summary.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(summary)
}
