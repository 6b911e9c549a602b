//! Shopfront CLI - migrations, catalog seeding, cart and account.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema
//! shop-cli migrate
//!
//! # Load categories and products
//! shop-cli seed catalog.yaml
//!
//! # Shop anonymously
//! shop-cli catalog list
//! shop-cli cart add 67e55044-10b1-426f-9247-bb680e5fe0c8 -q 2
//! shop-cli cart show
//!
//! # Sign in; the anonymous cart comes along
//! shop-cli auth sign-in shopper@example.com 'correct horse'
//! ```
//!
//! Local shopper state (anonymous session, signed-in user) lives in the
//! file named by `SHOPFRONT_STATE_PATH`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shopfront_core::{CartItemId, ProductId};
use shopfront_storefront::{AppError, StorefrontConfig, telemetry};

mod commands;

use commands::Context;
use commands::cart::Action;

const DEFAULT_LOG_FILTER: &str = "shopfront_storefront=info,shopfront_cli=info";

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign up, sign in and out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products with prices
    List {
        /// Only products in this category (slug)
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        product_id: ProductId,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        /// Cart line ID
        item_id: CartItemId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        item_id: CartItemId,
    },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account and sign in
    SignUp { email: String, password: String },
    /// Sign in
    SignIn { email: String, password: String },
    /// Sign out
    SignOut,
    /// Show the current shopper
    Whoami,
}

impl From<CartAction> for Action {
    fn from(action: CartAction) -> Self {
        match action {
            CartAction::Show => Self::Show,
            CartAction::Add {
                product_id,
                quantity,
            } => Self::Add {
                product_id,
                quantity,
            },
            CartAction::Update { item_id, quantity } => Self::Update { item_id, quantity },
            CartAction::Remove { item_id } => Self::Remove { item_id },
            CartAction::Clear => Self::Clear,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing(DEFAULT_LOG_FILTER);
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = telemetry::init_sentry(&config.sentry);
    telemetry::init_tracing(DEFAULT_LOG_FILTER);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(&config).await?,
        Commands::Seed { file } => {
            // Validate before connecting
            let seed = commands::seed::load(&file).await?;
            let ctx = connect(config).await?;
            let summary = commands::seed::apply(ctx.gateway.as_ref(), &seed).await?;
            tracing::info!(
                categories = summary.categories_created,
                products = summary.products_created,
                skipped = summary.skipped,
                "Seeding complete"
            );
        }
        Commands::Catalog { action } => {
            let ctx = connect(config).await?;
            match action {
                CatalogAction::List { category } => {
                    commands::catalog::list(&ctx, category.as_deref())
                        .await
                        .map_err(present)?;
                }
            }
        }
        Commands::Cart { action } => {
            let ctx = connect(config).await?;
            commands::cart::run(&ctx, action.into())
                .await
                .map_err(present)?;
        }
        Commands::Auth { action } => {
            let ctx = connect(config).await?;
            match action {
                AuthAction::SignUp { email, password } => {
                    commands::auth::sign_up(&ctx, &email, &password).await
                }
                AuthAction::SignIn { email, password } => {
                    commands::auth::sign_in(&ctx, &email, &password).await
                }
                AuthAction::SignOut => commands::auth::sign_out(&ctx).await,
                AuthAction::Whoami => commands::auth::whoami(&ctx).await,
            }
            .map_err(present)?;
        }
    }
    Ok(())
}

async fn connect(config: StorefrontConfig) -> Result<Context, Box<dyn std::error::Error>> {
    Context::connect(config).await.map_err(present)
}

/// Report a failure and reduce it to the message a shopper should see.
fn present(err: AppError) -> Box<dyn std::error::Error> {
    err.report();
    err.user_message().into()
}
