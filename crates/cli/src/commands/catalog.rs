//! Catalog commands.

use std::error::Error;

use super::{Context, parse_params, print_json};

/// Print products matching the query parameters.
///
/// # Errors
///
/// Returns an error if a parameter is malformed or the request fails.
pub async fn list(ctx: &Context, params: &[String]) -> Result<(), Box<dyn Error>> {
    let params = parse_params(params)?;
    let products = ctx.api.get_products(&params).await?;
    tracing::info!(count = products.len(), "Fetched products");
    print_json(&products)
}

/// Print one product.
///
/// # Errors
///
/// Returns an error if the request fails or the product does not exist.
pub async fn show(ctx: &Context, id: &str) -> Result<(), Box<dyn Error>> {
    let product = ctx
        .api
        .get_product(id)
        .await?
        .ok_or_else(|| format!("Product not found: {id}"))?;
    print_json(&product)
}

/// Print products in a category.
///
/// # Errors
///
/// Returns an error if a parameter is malformed or the request fails.
pub async fn by_category(
    ctx: &Context,
    category: &str,
    params: &[String],
) -> Result<(), Box<dyn Error>> {
    let params = parse_params(params)?;
    let products = ctx.api.get_by_category(category, &params).await?;
    print_json(&products)
}

/// Print category names, or full records with `full`.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn categories(ctx: &Context, full: bool) -> Result<(), Box<dyn Error>> {
    if full {
        print_json(&ctx.api.get_categories_full().await?)
    } else {
        print_json(&ctx.api.get_categories().await?)
    }
}
