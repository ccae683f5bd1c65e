//! Server-side cart endpoints.
//!
//! These mirror the local cart for signed-in users. Rows are keyed by
//! product id plus an optional `size`, sent as a query parameter on the
//! per-row routes.

use serde_json::{Map, Value, json};
use storefront_core::ServerCartItem;
use tracing::instrument;

use super::{ApiClient, RequestOptions, list_from, with_query};
use crate::error::Result;

impl ApiClient {
    /// The server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the body is not a list.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Vec<ServerCartItem>> {
        let data = self.get("/cart").await?;
        list_from(data)
    }

    /// Add units of a product to the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn add_cart_item(
        &self,
        product_id: &str,
        quantity: u32,
        size: Option<&str>,
    ) -> Result<Option<Value>> {
        let mut body = Map::new();
        body.insert("productId".into(), json!(product_id));
        body.insert("quantity".into(), json!(quantity));
        if let Some(size) = size.filter(|s| !s.is_empty()) {
            body.insert("size".into(), json!(size));
        }

        self.request("/cart", &RequestOptions::post(Value::Object(body)), true)
            .await
    }

    /// Set the quantity of a server-side cart row.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        product_id: &str,
        quantity: u32,
        size: Option<&str>,
    ) -> Result<Option<Value>> {
        let body = json!({ "quantity": quantity });
        self.request(
            &cart_row_path(product_id, size),
            &RequestOptions::patch(body),
            true,
        )
        .await
    }

    /// Delete a server-side cart row.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(
        &self,
        product_id: &str,
        size: Option<&str>,
    ) -> Result<Option<Value>> {
        self.request(
            &cart_row_path(product_id, size),
            &RequestOptions::delete(),
            true,
        )
        .await
    }

    /// Empty the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_server_cart(&self) -> Result<Option<Value>> {
        self.request("/cart", &RequestOptions::delete(), true).await
    }
}

fn cart_row_path(product_id: &str, size: Option<&str>) -> String {
    let path = format!("/cart/{}", urlencoding::encode(product_id));
    match size.filter(|s| !s.is_empty()) {
        Some(size) => with_query(&path, &[("size", size)]),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_row_path() {
        assert_eq!(cart_row_path("p1", None), "/cart/p1");
        assert_eq!(cart_row_path("p1", Some("")), "/cart/p1");
        assert_eq!(cart_row_path("p 1", Some("X L")), "/cart/p%201?size=X+L");
    }
}
