//! Storefront CLI - Browse the catalog, manage a session, and edit the cart.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! sf-cli products list --param category=shirts --param page=2
//!
//! # Sign in; credentials are kept in the state file
//! sf-cli login -e ana@example.com -p hunter2
//!
//! # Add two units of a product in size M to the local cart
//! sf-cli cart add 65f1 --qty 2 --size M
//!
//! # Replace the local cart with the server-side one
//! sf-cli cart sync
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_API_URL` - Backend origin
//! - `STOREFRONT_STATE_FILE` - JSON file holding session and cart state
//! - `RUST_LOG` - Log filter (default: `storefront_client=info,sf_cli=info`);
//!   logs go to stderr
//!
//! Command output is JSON on stdout.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "storefront_client=info,sf_cli=info";

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Storefront command-line client")]
struct Cli {
    /// Backend origin, overriding `STOREFRONT_API_URL`
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List categories
    Categories {
        /// Print full category records instead of names
        #[arg(long)]
        full: bool,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign in
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Edit the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Read and write product reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Query parameter as `key=value` (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// List products in a category
    Category {
        /// Category id or name
        id: String,

        /// Query parameter as `key=value` (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show rows, unit count, and total
    Show,
    /// Add a product
    Add {
        /// Product id
        id: String,

        /// Units to add; values below 1 count as 1
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        qty: String,

        /// Variant (size)
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Remove a row
    Remove {
        /// Product id
        id: String,

        /// Variant (size)
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Set the quantity of a row
    SetQty {
        /// Product id
        id: String,

        /// New quantity; values below 1 count as 1
        #[arg(allow_hyphen_values = true)]
        qty: String,

        /// Variant (size)
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Set the variant on every row of a product
    SetSize {
        /// Product id
        id: String,

        /// New variant; omit to clear it
        size: Option<String>,
    },
    /// Remove every row
    Clear,
    /// Replace the local cart with the server-side cart
    Sync,
}

#[derive(Subcommand)]
enum ReviewsAction {
    /// List reviews for a product
    List {
        /// Product id
        product_id: String,
    },
    /// Create or replace your review of a product
    Submit {
        /// Product id
        product_id: String,

        /// Rating, 1 to 5
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Review text
        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// Delete your review of a product
    Delete {
        /// Product id
        product_id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env(cli.api_url.as_deref())?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List { params } => commands::catalog::list(&ctx, &params).await?,
            ProductsAction::Show { id } => commands::catalog::show(&ctx, &id).await?,
            ProductsAction::Category { id, params } => {
                commands::catalog::by_category(&ctx, &id, &params).await?;
            }
        },
        Commands::Categories { full } => commands::catalog::categories(&ctx, full).await?,
        Commands::Register {
            name,
            email,
            password,
        } => commands::account::register(&ctx, &name, &email, password.into()).await?,
        Commands::Login { email, password } => {
            commands::account::login(&ctx, &email, password.into()).await?;
        }
        Commands::Logout => commands::account::logout(&ctx).await,
        Commands::Whoami => commands::account::whoami(&ctx)?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx)?,
            CartAction::Add { id, qty, size } => {
                commands::cart::add(&ctx, &id, &qty, size.as_deref()).await?;
            }
            CartAction::Remove { id, size } => commands::cart::remove(&ctx, &id, size.as_deref())?,
            CartAction::SetQty { id, qty, size } => {
                commands::cart::set_qty(&ctx, &id, &qty, size.as_deref())?;
            }
            CartAction::SetSize { id, size } => {
                commands::cart::set_size(&ctx, &id, size.as_deref())?;
            }
            CartAction::Clear => commands::cart::clear(&ctx)?,
            CartAction::Sync => commands::cart::sync(&ctx).await?,
        },
        Commands::Reviews { action } => match action {
            ReviewsAction::List { product_id } => {
                commands::reviews::list(&ctx, &product_id).await?;
            }
            ReviewsAction::Submit {
                product_id,
                rating,
                comment,
            } => commands::reviews::submit(&ctx, &product_id, rating, &comment).await?,
            ReviewsAction::Delete { product_id } => {
                commands::reviews::delete(&ctx, &product_id).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_log_filter_parses() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("storefront_client=info"));
        assert!(rendered.contains("sf_cli=info"));
    }

    #[test]
    fn test_negative_quantity_is_accepted_as_text() {
        let cli = Cli::try_parse_from(["sf-cli", "cart", "set-qty", "p1", "-3"]).unwrap();
        match cli.command {
            Commands::Cart {
                action: CartAction::SetQty { id, qty, size },
            } => {
                assert_eq!(id, "p1");
                assert_eq!(qty, "-3");
                assert!(size.is_none());
            }
            _ => panic!("parsed into the wrong subcommand"),
        }
    }
}
