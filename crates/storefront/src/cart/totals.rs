//! Derived cart totals.

use rust_decimal::Decimal;

use shopfront_core::Price;

use crate::models::CartItem;

/// Item count and subtotal computed from one read of the cart lines.
///
/// Never stored; build one from the current items whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub total_items: i64,
    /// Sum of `quantity * unit_price`.
    pub total_price: Decimal,
}

impl CartTotals {
    /// Compute totals over `items`. Both are zero for an empty cart.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            total_items: acc.total_items + i64::from(item.quantity),
            total_price: acc.total_price + item.line_total(),
        })
    }

    /// Subtotal in the store currency.
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        Price::usd(self.total_price)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shopfront_core::{CartItemId, OwnerKey, ProductId, SessionId};
    use uuid::Uuid;

    use super::*;

    fn line(quantity: i32, unit_price: Decimal) -> CartItem {
        CartItem {
            id: CartItemId::from_uuid(Uuid::new_v4()),
            owner: OwnerKey::Session(SessionId::generate()),
            product_id: ProductId::from_uuid(Uuid::new_v4()),
            quantity,
            unit_price,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let totals = CartTotals::from_items(&[]);
        assert_eq!(totals.total_items, 0);
        assert_eq!(totals.total_price, Decimal::ZERO);
        assert!(totals.is_empty());
    }

    #[test]
    fn test_totals_sum_lines() {
        let items = [line(2, Decimal::new(1000, 2)), line(3, Decimal::new(199, 2))];
        let totals = CartTotals::from_items(&items);
        assert_eq!(totals.total_items, 5);
        assert_eq!(totals.total_price, Decimal::new(2597, 2));
        assert_eq!(totals.subtotal().display(), "$25.97");
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let items: Vec<_> = (0..10).map(|_| line(1, Decimal::new(10, 2))).collect();
        assert_eq!(CartTotals::from_items(&items).total_price, Decimal::ONE);
    }
}
