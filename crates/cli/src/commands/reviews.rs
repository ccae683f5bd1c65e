//! Review commands.

use std::error::Error;

use super::{Context, print_json};

/// Print reviews for a product.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn list(ctx: &Context, product_id: &str) -> Result<(), Box<dyn Error>> {
    print_json(&ctx.api.get_reviews(product_id).await?)
}

/// Create or replace the signed-in user's review.
///
/// # Errors
///
/// Returns an error if the request fails or the session has expired.
pub async fn submit(
    ctx: &Context,
    product_id: &str,
    rating: u8,
    comment: &str,
) -> Result<(), Box<dyn Error>> {
    let response = ctx.api.submit_review(product_id, rating, comment).await?;
    print_json(&response)
}

/// Delete the signed-in user's review.
///
/// # Errors
///
/// Returns an error if the request fails or the session has expired.
pub async fn delete(ctx: &Context, product_id: &str) -> Result<(), Box<dyn Error>> {
    let response = ctx.api.delete_review(product_id).await?;
    print_json(&response)
}
