//! Cart line types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{CartItemId, OwnerKey, ProductId};

use crate::gateway::{Record, Table};

/// One line of a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Backend-generated line ID.
    pub id: CartItemId,
    /// Shopper the line belongs to (`user_id` or `session_id` column).
    #[serde(flatten)]
    pub owner: OwnerKey,
    /// Product on this line. Read-only reference into the catalog.
    pub product_id: ProductId,
    /// Number of units, always at least 1.
    pub quantity: i32,
    /// Product price when the line was created. Never repriced.
    pub unit_price: Decimal,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// `quantity * unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl Record for CartItem {
    const TABLE: Table = Table::CartItems;
    type Id = CartItemId;
    type Draft = NewCartItem;
}

/// Insert payload for a [`CartItem`].
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    #[serde(flatten)]
    pub owner: OwnerKey,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Partial update for a [`CartItem`].
///
/// There is deliberately no way to change `unit_price` or `product_id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    /// Writes both owner columns, clearing the previous one.
    #[serde(flatten)]
    pub owner: Option<OwnerKey>,
}

impl CartItemPatch {
    /// Patch that only sets the quantity.
    #[must_use]
    pub const fn quantity(quantity: i32) -> Self {
        Self {
            quantity: Some(quantity),
            owner: None,
        }
    }

    /// Patch that only moves the line to another owner.
    #[must_use]
    pub const fn reown(owner: OwnerKey) -> Self {
        Self {
            quantity: None,
            owner: Some(owner),
        }
    }
}
