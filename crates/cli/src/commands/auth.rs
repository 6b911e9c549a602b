//! Account commands.
//!
//! Signing in (or up) takes over the anonymous cart built on this machine.

use shopfront_storefront::gateway::{Filter, Gateway};
use shopfront_storefront::models::User;
use shopfront_storefront::{AppError, IdentityProvider};

use super::Context;
use super::cart::{print_cart, print_notices};

/// Create an account, sign it in and adopt the anonymous cart.
///
/// # Errors
///
/// Returns an error if sign-up fails or the cart cannot be adopted.
pub async fn sign_up(ctx: &Context, email: &str, password: &str) -> Result<(), AppError> {
    let user = ctx.identity.sign_up(email, password).await?;
    tracing::info!(email = %user.email, "Account created");
    adopt(ctx).await
}

/// Sign in and adopt the anonymous cart.
///
/// # Errors
///
/// Returns an error if the credentials are wrong or the cart cannot be
/// adopted.
pub async fn sign_in(ctx: &Context, email: &str, password: &str) -> Result<(), AppError> {
    let user = ctx.identity.sign_in(email, password).await?;
    tracing::info!(email = %user.email, "Signed in");
    adopt(ctx).await
}

/// Sign out. The anonymous session is kept.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub async fn sign_out(ctx: &Context) -> Result<(), AppError> {
    ctx.identity.sign_out().await?;
    tracing::info!("Signed out");
    Ok(())
}

/// Show who the cart belongs to.
///
/// # Errors
///
/// Returns an error if the user lookup fails.
pub async fn whoami(ctx: &Context) -> Result<(), AppError> {
    let line = match ctx.identity.current_user_id() {
        Some(user_id) => {
            let user: User = ctx.gateway.select_one(&Filter::by_id(user_id)).await?;
            format!("{} (user {})", user.email, user.id)
        }
        None => format!("anonymous (session {})", ctx.session_id),
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{line}");
    }
    Ok(())
}

async fn adopt(ctx: &Context) -> Result<(), AppError> {
    let cart = ctx.cart();
    let mut notices = cart.subscribe();

    let summary = cart.adopt_anonymous_cart(ctx.session_id).await?;
    if summary.is_empty() {
        cart.refresh().await?;
    }

    print_cart(ctx, &cart).await?;
    print_notices(&mut notices);
    Ok(())
}
