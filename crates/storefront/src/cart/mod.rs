//! Cart engine.
//!
//! Keeps the current shopper's cart lines in memory and consistent with the
//! backend. Every mutation goes to the [`Gateway`] first and is followed by
//! a refresh, so the in-memory list is only ever a copy of what the backend
//! holds for the current owner.
//!
//! The owner (signed-in user or anonymous session) is resolved from the
//! injected [`OwnerKeyProvider`] at the start of each operation.

mod error;
mod notice;
mod totals;
mod view;

pub use error::CartError;
pub use notice::CartNotice;
pub use totals::CartTotals;
pub use view::{CartLineView, CartView};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, instrument};

use shopfront_core::{CartItemId, OwnerKey, ProductId, SessionId};

use crate::error::add_breadcrumb;
use crate::gateway::{Direction, Filter, Gateway, GatewayError, Table};
use crate::models::{CartItem, CartItemPatch, NewCartItem, Product};
use crate::owner::OwnerKeyProvider;

const NOTICE_CAPACITY: usize = 64;

/// Result of [`CartEngine::adopt_anonymous_cart`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdoptionSummary {
    /// Anonymous lines re-owned to the user unchanged.
    pub moved: usize,
    /// Anonymous lines folded into a user line for the same product.
    pub merged: usize,
}

impl AdoptionSummary {
    /// Whether nothing was adopted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.moved == 0 && self.merged == 0
    }
}

/// Marks the engine as loading while alive.
///
/// A counter rather than a flag, so overlapping operations keep the engine
/// loading until the last one finishes.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The current shopper's cart.
pub struct CartEngine<G, O> {
    gateway: Arc<G>,
    owner: O,
    items: RwLock<Vec<CartItem>>,
    in_flight: AtomicUsize,
    notices: broadcast::Sender<CartNotice>,
}

impl<G: Gateway, O: OwnerKeyProvider> CartEngine<G, O> {
    /// Create an engine with an empty item list. Call [`refresh`](Self::refresh)
    /// to load the owner's cart.
    #[must_use]
    pub fn new(gateway: Arc<G>, owner: O) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            gateway,
            owner,
            items: RwLock::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            notices,
        }
    }

    /// Snapshot of the cart lines, oldest first.
    pub async fn items(&self) -> Vec<CartItem> {
        self.items.read().await.clone()
    }

    /// Item count and subtotal from one consistent read.
    pub async fn totals(&self) -> CartTotals {
        CartTotals::from_items(&self.items.read().await)
    }

    /// Sum of line quantities.
    pub async fn total_items(&self) -> i64 {
        self.totals().await.total_items
    }

    /// Sum of `quantity * unit_price` over all lines.
    pub async fn total_price(&self) -> Decimal {
        self.totals().await.total_price
    }

    /// Whether an operation is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The owner cart operations are scoped to right now.
    #[must_use]
    pub fn owner(&self) -> OwnerKey {
        self.owner.owner_key()
    }

    /// Receive shopper notifications for subsequent operations.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartNotice> {
        self.notices.subscribe()
    }

    /// Reload the owner's lines from the backend.
    ///
    /// On failure the current items are kept and a failure notice is sent.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Gateway` if the backend read fails.
    #[instrument(skip(self), fields(owner = %self.owner.owner_key()))]
    pub async fn refresh(&self) -> Result<(), CartError> {
        let owner = self.owner.owner_key();
        let _loading = LoadingGuard::enter(&self.in_flight);

        match self.fetch(&owner).await {
            Ok(items) => {
                debug!(count = items.len(), "Cart refreshed");
                *self.items.write().await = items;
                Ok(())
            }
            Err(e) => Err(self.fail("refresh", e.into())),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the owner already has a line for the product its quantity is
    /// increased; otherwise a new line is created at the product's current
    /// price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if `quantity` is below 1,
    /// `CartError::NotFound` if the product does not exist, or
    /// `CartError::Gateway` if a backend write fails.
    #[instrument(skip(self), fields(owner = %self.owner.owner_key()))]
    pub async fn add_item(&self, product_id: ProductId, quantity: i32) -> Result<(), CartError> {
        let owner = self.owner.owner_key();
        let _loading = LoadingGuard::enter(&self.in_flight);

        if quantity < 1 {
            return Err(self.fail(
                "add_item",
                CartError::Validation("Quantity must be at least 1".to_string()),
            ));
        }

        match self.add_line(&owner, product_id, quantity).await {
            Ok(()) => {
                tracing::info!(quantity, "Added to cart");
                let product_id_str = product_id.to_string();
                add_breadcrumb(
                    "cart",
                    "Added item",
                    Some(&[("product_id", product_id_str.as_str())]),
                );
                self.settle().await;
                self.notify(CartNotice::ItemAdded {
                    product_id,
                    quantity,
                });
                Ok(())
            }
            Err(e) => Err(self.fail("add_item", e)),
        }
    }

    /// Set a line's quantity. A quantity of zero or less removes the line.
    ///
    /// The line's unit price is never changed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the owner has no line with this ID,
    /// or `CartError::Gateway` if the backend write fails.
    #[instrument(skip(self), fields(owner = %self.owner.owner_key()))]
    pub async fn update_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(item_id).await;
        }

        let owner = self.owner.owner_key();
        let _loading = LoadingGuard::enter(&self.in_flight);

        match self.set_quantity(&owner, item_id, quantity).await {
            Ok(()) => {
                tracing::info!(quantity, "Cart quantity updated");
                let item_id_str = item_id.to_string();
                add_breadcrumb(
                    "cart",
                    "Updated quantity",
                    Some(&[("item_id", item_id_str.as_str())]),
                );
                self.settle().await;
                self.notify(CartNotice::QuantityUpdated { quantity });
                Ok(())
            }
            Err(e) => Err(self.fail("update_quantity", e)),
        }
    }

    /// Remove a line. Removing a line that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Gateway` if the backend delete fails.
    #[instrument(skip(self), fields(owner = %self.owner.owner_key()))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<(), CartError> {
        let owner = self.owner.owner_key();
        let _loading = LoadingGuard::enter(&self.in_flight);

        let filter = Filter::owned_by(&owner).eq("id", item_id);
        match self.gateway.delete(Table::CartItems, &filter).await {
            Ok(removed) => {
                if removed == 0 {
                    debug!("Cart line already absent");
                } else {
                    tracing::info!("Removed from cart");
                }
                let item_id_str = item_id.to_string();
                add_breadcrumb(
                    "cart",
                    "Removed item",
                    Some(&[("item_id", item_id_str.as_str())]),
                );
                self.settle().await;
                self.notify(CartNotice::ItemRemoved);
                Ok(())
            }
            Err(e) => Err(self.fail("remove_item", e.into())),
        }
    }

    /// Remove every line for the current owner.
    ///
    /// Idempotent. The item list is emptied directly without a reload.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Gateway` if the backend delete fails.
    #[instrument(skip(self), fields(owner = %self.owner.owner_key()))]
    pub async fn clear(&self) -> Result<(), CartError> {
        let owner = self.owner.owner_key();
        let _loading = LoadingGuard::enter(&self.in_flight);

        match self
            .gateway
            .delete(Table::CartItems, &Filter::owned_by(&owner))
            .await
        {
            Ok(removed) => {
                tracing::info!(removed, "Cart cleared");
                add_breadcrumb("cart", "Cleared cart", None);
                self.items.write().await.clear();
                self.notify(CartNotice::Cleared);
                Ok(())
            }
            Err(e) => Err(self.fail("clear", e.into())),
        }
    }

    /// Take over the lines of an anonymous session after sign-in.
    ///
    /// Does nothing while the current owner is still anonymous. Otherwise
    /// each of the session's lines is folded into the user's line for the
    /// same product (quantities summed, the user's unit price kept) or, if
    /// the user has none, moved to the user with its unit price unchanged.
    ///
    /// Lines are adopted one at a time. If a write fails part-way, the
    /// lines already adopted stay with the user and calling this again
    /// adopts the rest. A merged line is removed from the session before
    /// the user's line grows, so no line is ever counted twice.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if a merged quantity would overflow,
    /// or `CartError::Gateway` if a backend read or write fails.
    #[instrument(skip(self), fields(owner = %self.owner.owner_key()))]
    pub async fn adopt_anonymous_cart(
        &self,
        session_id: SessionId,
    ) -> Result<AdoptionSummary, CartError> {
        let owner = self.owner.owner_key();
        if owner.is_anonymous() {
            debug!("Still anonymous, nothing to adopt");
            return Ok(AdoptionSummary::default());
        }
        let _loading = LoadingGuard::enter(&self.in_flight);

        match self.adopt_lines(&owner, session_id).await {
            Ok(summary) => {
                if !summary.is_empty() {
                    tracing::info!(
                        moved = summary.moved,
                        merged = summary.merged,
                        "Adopted anonymous cart"
                    );
                    add_breadcrumb("cart", "Adopted anonymous cart", None);
                }
                self.settle().await;
                if !summary.is_empty() {
                    self.notify(CartNotice::CartAdopted {
                        moved: summary.moved,
                        merged: summary.merged,
                    });
                }
                Ok(summary)
            }
            Err(e) => Err(self.fail("adopt_anonymous_cart", e)),
        }
    }

    async fn fetch(&self, owner: &OwnerKey) -> Result<Vec<CartItem>, GatewayError> {
        self.gateway
            .select(&Filter::owned_by(owner).order_by("created_at", Direction::Asc))
            .await
    }

    async fn add_line(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CartError> {
        // Price from the backend, never from a display cache.
        let product: Product = self
            .gateway
            .select_one(&Filter::by_id(product_id))
            .await
            .map_err(CartError::not_found_as("Product"))?;

        if let Some(line) = self.line_for(owner, product_id).await? {
            return self.increase(&line, quantity).await;
        }

        let draft = NewCartItem {
            owner: *owner,
            product_id,
            quantity,
            unit_price: product.price,
        };
        match self.gateway.insert::<CartItem>(&draft).await {
            Ok(line) => {
                debug!(item_id = %line.id, unit_price = %line.unit_price, "Cart line created");
                Ok(())
            }
            // Another writer created the line since we looked.
            Err(GatewayError::Conflict(reason)) => match self.line_for(owner, product_id).await? {
                Some(line) => self.increase(&line, quantity).await,
                None => Err(GatewayError::Conflict(reason).into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn line_for(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, GatewayError> {
        let mut lines: Vec<CartItem> = self
            .gateway
            .select(&Filter::owned_by(owner).eq("product_id", product_id))
            .await?;
        Ok(lines.pop())
    }

    async fn increase(&self, line: &CartItem, extra: i32) -> Result<(), CartError> {
        let quantity = checked_quantity(line.quantity, extra)?;
        self.gateway
            .update::<CartItem, _>(line.id, &CartItemPatch::quantity(quantity))
            .await
            .map_err(CartError::not_found_as("Cart item"))?;
        debug!(item_id = %line.id, quantity, "Cart line coalesced");
        Ok(())
    }

    async fn set_quantity(
        &self,
        owner: &OwnerKey,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        // Scope the write to the owner: an ID alone could name someone else's line.
        let line: CartItem = self
            .gateway
            .select_one(&Filter::owned_by(owner).eq("id", item_id))
            .await
            .map_err(CartError::not_found_as("Cart item"))?;

        self.gateway
            .update::<CartItem, _>(line.id, &CartItemPatch::quantity(quantity))
            .await
            .map_err(CartError::not_found_as("Cart item"))?;
        Ok(())
    }

    async fn adopt_lines(
        &self,
        owner: &OwnerKey,
        session_id: SessionId,
    ) -> Result<AdoptionSummary, CartError> {
        let anonymous = self.fetch(&OwnerKey::Session(session_id)).await?;
        if anonymous.is_empty() {
            return Ok(AdoptionSummary::default());
        }

        let mut held: HashMap<ProductId, (CartItemId, i32)> = self
            .fetch(owner)
            .await?
            .into_iter()
            .map(|line| (line.product_id, (line.id, line.quantity)))
            .collect();

        let mut summary = AdoptionSummary::default();
        for line in anonymous {
            if let Some((held_id, held_quantity)) = held.get_mut(&line.product_id) {
                let quantity = checked_quantity(*held_quantity, line.quantity)?;
                // Drop the anonymous row first so a retry can never count it twice.
                let deleted = self
                    .gateway
                    .delete(Table::CartItems, &Filter::by_id(line.id))
                    .await?;
                if deleted == 0 {
                    debug!(item_id = %line.id, "Anonymous line already gone, skipping");
                    continue;
                }
                self.gateway
                    .update::<CartItem, _>(*held_id, &CartItemPatch::quantity(quantity))
                    .await?;
                *held_quantity = quantity;
                summary.merged += 1;
            } else {
                self.gateway
                    .update::<CartItem, _>(line.id, &CartItemPatch::reown(*owner))
                    .await?;
                held.insert(line.product_id, (line.id, line.quantity));
                summary.moved += 1;
            }
        }

        Ok(summary)
    }

    /// Trailing refresh after a successful write.
    ///
    /// The write already landed, so a failed reload is reported through
    /// [`refresh`](Self::refresh) and not returned.
    async fn settle(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Cart reload after write failed");
        }
    }

    fn fail(&self, operation: &'static str, err: CartError) -> CartError {
        if err.is_server_error() {
            let event_id = sentry::capture_error(&err);
            tracing::error!(
                operation,
                error = %err,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::warn!(operation, error = %err, "Cart operation rejected");
        }
        self.notify(CartNotice::Failed {
            message: err.user_message(),
        });
        err
    }

    fn notify(&self, notice: CartNotice) {
        if self.notices.send(notice).is_err() {
            debug!("No cart notice subscribers");
        }
    }
}

fn checked_quantity(current: i32, extra: i32) -> Result<i32, CartError> {
    current
        .checked_add(extra)
        .ok_or_else(|| CartError::Validation("Quantity is too large".to_string()))
}
