//! Display data for a cart.

use shopfront_core::{CartItemId, Price, ProductId};

use super::CartTotals;
use crate::catalog::Catalog;
use crate::gateway::{Gateway, GatewayError};
use crate::models::CartItem;

/// Name shown for a line whose product has left the catalog.
pub const UNAVAILABLE_PRODUCT: &str = "Unavailable product";

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: Option<String>,
    pub quantity: i32,
    /// Unit price the line was added at, formatted.
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
    /// False when the product no longer exists in the catalog.
    pub available: bool,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: i64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Price::usd(rust_decimal::Decimal::ZERO).display(),
            item_count: 0,
        }
    }

    /// Join cart lines with their products for display.
    ///
    /// Lines keep their snapshot prices. A line whose product was deleted
    /// stays in the view marked unavailable, so the subtotal still matches
    /// the cart's totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a product lookup fails for a reason other than
    /// the product being gone.
    pub async fn build<G: Gateway>(
        items: &[CartItem],
        catalog: &Catalog<G>,
    ) -> Result<Self, GatewayError> {
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let product = match catalog.product(item.product_id).await {
                Ok(product) => Some(product),
                Err(GatewayError::NotFound) => {
                    tracing::debug!(product_id = %item.product_id, "Cart line product missing");
                    None
                }
                Err(e) => return Err(e),
            };

            lines.push(CartLineView {
                item_id: item.id,
                product_id: item.product_id,
                name: product
                    .as_ref()
                    .map_or_else(|| UNAVAILABLE_PRODUCT.to_string(), |p| p.name.clone()),
                slug: product.as_ref().map(|p| p.slug.clone()),
                quantity: item.quantity,
                price: Price::usd(item.unit_price).display(),
                line_price: Price::usd(item.line_total()).display(),
                image_url: product.as_ref().and_then(|p| p.image_url.clone()),
                available: product.is_some(),
            });
        }

        let totals = CartTotals::from_items(items);
        Ok(Self {
            items: lines,
            subtotal: totals.subtotal().display(),
            item_count: totals.total_items,
        })
    }
}
