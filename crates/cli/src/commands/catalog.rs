//! Catalog listing.

use shopfront_storefront::models::Product;
use shopfront_storefront::{AppError, GatewayError};

use super::Context;

/// List products, optionally limited to one category.
///
/// # Errors
///
/// Returns an error if the category does not exist or a backend read fails.
pub async fn list(ctx: &Context, category: Option<&str>) -> Result<(), AppError> {
    let catalog = ctx.catalog();
    let products = match category {
        Some(slug) => {
            let category = catalog.category_by_slug(slug).await.map_err(|e| match e {
                GatewayError::NotFound => {
                    AppError::NotFound(format!("category '{slug}'"))
                }
                other => other.into(),
            })?;
            catalog.products_in_category(category.id).await?
        }
        None => catalog.products().await?,
    };

    if products.is_empty() {
        tracing::info!("No products found");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!("{}", product_line(product));
        }
    }
    Ok(())
}

fn product_line(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { "  (out of stock)" };
    format!(
        "{}  {:<32}  {:>10}{stock}",
        product.id,
        product.name,
        product.display_price().display()
    )
}
