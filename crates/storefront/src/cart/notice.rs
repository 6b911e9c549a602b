//! Shopper-facing cart notifications.

use std::fmt;

use shopfront_core::ProductId;

/// A notification for the shopper, emitted after each cart operation.
///
/// Delivered on the engine's broadcast channel. Surfaces render these as
/// toasts or status lines; they carry no internal error details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    /// A product was added, or its existing line increased.
    ItemAdded {
        /// Product added.
        product_id: ProductId,
        /// Units added by this call, not the line's new total.
        quantity: i32,
    },
    /// A line's quantity was set.
    QuantityUpdated {
        /// The line's new quantity.
        quantity: i32,
    },
    /// A line was removed.
    ItemRemoved,
    /// Every line was removed.
    Cleared,
    /// Anonymous lines were taken over after sign-in.
    CartAdopted {
        /// Lines re-owned to the user.
        moved: usize,
        /// Lines folded into an existing user line.
        merged: usize,
    },
    /// An operation failed.
    Failed {
        /// Shopper-facing text, free of internal details.
        message: String,
    },
}

impl CartNotice {
    /// Whether this notice reports a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for CartNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemAdded { quantity, .. } => write!(f, "Added {quantity} to cart"),
            Self::QuantityUpdated { quantity } => write!(f, "Quantity updated to {quantity}"),
            Self::ItemRemoved => write!(f, "Item removed from cart"),
            Self::Cleared => write!(f, "Cart cleared"),
            Self::CartAdopted { moved, merged } => {
                write!(f, "Kept {} items from your previous cart", moved + merged)
            }
            Self::Failed { message } => f.write_str(message),
        }
    }
}
