//! Local cart commands.
//!
//! These edit the cart persisted in the state file. `add` fetches the product
//! first so the row carries a title, price, and image. `sync` pulls the
//! server-side cart of the signed-in user and replaces the local one.

use std::error::Error;

use serde_json::json;
use storefront_core::CartProduct;
use storefront_core::cart::parse_quantity;

use super::{Context, print_json};

/// Print rows, unit count, and total.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn show(ctx: &Context) -> Result<(), Box<dyn Error>> {
    print_json(&json!({
        "items": ctx.cart.items(),
        "count": ctx.cart.cart_count(),
        "total": ctx.cart.cart_total(),
    }))
}

/// Add a product to the local cart.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn add(
    ctx: &Context,
    id: &str,
    qty: &str,
    size: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let product = ctx
        .api
        .get_product(id)
        .await?
        .ok_or_else(|| format!("Product not found: {id}"))?;

    let mut item = CartProduct::from(&product);
    if let Some(size) = size {
        item = item.with_size(size);
    }
    ctx.cart.add_to_cart(item, parse_quantity(qty));
    show(ctx)
}

/// Remove a row.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn remove(ctx: &Context, id: &str, size: Option<&str>) -> Result<(), Box<dyn Error>> {
    ctx.cart.remove_from_cart(id, size);
    show(ctx)
}

/// Set the quantity of a row.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn set_qty(
    ctx: &Context,
    id: &str,
    qty: &str,
    size: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    ctx.cart.set_qty(id, parse_quantity(qty), size);
    show(ctx)
}

/// Set the variant on every row of a product.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn set_size(ctx: &Context, id: &str, size: Option<&str>) -> Result<(), Box<dyn Error>> {
    ctx.cart.set_size(id, size);
    show(ctx)
}

/// Remove every row.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn clear(ctx: &Context) -> Result<(), Box<dyn Error>> {
    ctx.cart.clear_cart();
    show(ctx)
}

/// Replace the local cart with the server-side cart.
///
/// # Errors
///
/// Returns an error if the server cart cannot be fetched.
pub async fn sync(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let server_items = ctx.api.get_cart().await?;
    tracing::info!(rows = server_items.len(), "Fetched server cart");
    ctx.cart.sync_cart(&server_items);
    show(ctx)
}
