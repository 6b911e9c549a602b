//! Cart commands.
//!
//! Every command prints the resulting cart, followed by any notices the
//! cart engine emitted.

use tokio::sync::broadcast;

use shopfront_core::{CartItemId, ProductId};
use shopfront_storefront::{AppError, CartNotice, CartView};

use super::{Cart, Context};

/// A cart action requested on the command line.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Show,
    Add { product_id: ProductId, quantity: i32 },
    Update { item_id: CartItemId, quantity: i32 },
    Remove { item_id: CartItemId },
    Clear,
}

/// Run a cart action for the current shopper.
///
/// # Errors
///
/// Returns an error if the cart operation fails.
pub async fn run(ctx: &Context, action: Action) -> Result<(), AppError> {
    let cart = ctx.cart();
    let mut notices = cart.subscribe();

    match action {
        Action::Show => cart.refresh().await?,
        Action::Add {
            product_id,
            quantity,
        } => cart.add_item(product_id, quantity).await?,
        Action::Update { item_id, quantity } => cart.update_quantity(item_id, quantity).await?,
        Action::Remove { item_id } => cart.remove_item(item_id).await?,
        Action::Clear => cart.clear().await?,
    }

    print_cart(ctx, &cart).await?;
    print_notices(&mut notices);
    Ok(())
}

/// Print the cart as a table.
///
/// # Errors
///
/// Returns an error if a product lookup fails.
pub async fn print_cart(ctx: &Context, cart: &Cart) -> Result<(), AppError> {
    let items = cart.items().await;
    let view = if items.is_empty() {
        CartView::empty()
    } else {
        CartView::build(&items, &ctx.catalog()).await?
    };

    #[allow(clippy::print_stdout)]
    {
        println!("Cart for {}", cart.owner());
        if view.items.is_empty() {
            println!("  (empty)");
        }
        for line in &view.items {
            println!(
                "  {}  {:<32} x{:<4} {:>10} {:>10}",
                line.item_id, line.name, line.quantity, line.price, line.line_price
            );
        }
        println!("  {} items, subtotal {}", view.item_count, view.subtotal);
    }
    Ok(())
}

/// Print notices received so far.
pub fn print_notices(notices: &mut broadcast::Receiver<CartNotice>) {
    while let Ok(notice) = notices.try_recv() {
        if notice.is_failure() {
            tracing::warn!("{notice}");
        } else {
            #[allow(clippy::print_stdout)]
            {
                println!("{notice}");
            }
        }
    }
}
