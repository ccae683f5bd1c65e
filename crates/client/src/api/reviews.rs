//! Review endpoints.

use serde_json::{Value, json};
use tracing::instrument;

use super::{ApiClient, RequestOptions};
use crate::error::Result;

impl ApiClient {
    /// Reviews for a product, as the backend returns them.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_reviews(&self, product_id: &str) -> Result<Value> {
        Ok(self.get(&review_path(product_id)).await?.unwrap_or(Value::Null))
    }

    /// Create or replace the signed-in user's review of a product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self, comment))]
    pub async fn submit_review(
        &self,
        product_id: &str,
        rating: u8,
        comment: &str,
    ) -> Result<Option<Value>> {
        let body = json!({
            "rating": rating,
            "comment": comment,
        });
        self.request(&review_path(product_id), &RequestOptions::post(body), true)
            .await
    }

    /// Delete the signed-in user's review of a product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_review(&self, product_id: &str) -> Result<Option<Value>> {
        self.request(&review_path(product_id), &RequestOptions::delete(), true)
            .await
    }
}

fn review_path(product_id: &str) -> String {
    format!("/reviews/{}", urlencoding::encode(product_id))
}
