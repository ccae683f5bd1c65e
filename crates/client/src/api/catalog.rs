//! Catalog endpoints.

use serde_json::Value;
use storefront_core::{Category, Product};
use tracing::instrument;

use super::{ApiClient, list_from, with_query};
use crate::error::Result;

impl ApiClient {
    /// List products, optionally filtered by query parameters.
    ///
    /// Each record is normalized, so both backend naming conventions come
    /// back in the same shape.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the body is not a list.
    #[instrument(skip(self))]
    pub async fn get_products(&self, params: &[(&str, &str)]) -> Result<Vec<Product>> {
        let data = self.get(&with_query("/products", params)).await?;
        list_from(data)
    }

    /// Fetch a single product. `None` when the backend returns no record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` with status 404 for unknown ids.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        let path = format!("/products/{}", urlencoding::encode(id));
        Ok(match self.get(&path).await? {
            None | Some(Value::Null) => None,
            Some(value) => Some(Product::normalize(&value)),
        })
    }

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the body is not a list.
    #[instrument(skip(self))]
    pub async fn get_by_category(
        &self,
        category: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<Product>> {
        let path = format!("/products/category/{}", urlencoding::encode(category));
        let data = self.get(&with_query(&path, params)).await?;
        list_from(data)
    }

    /// Category names. Records are reduced to their `name`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the body is not a list.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<String>> {
        Ok(self
            .get_categories_full()
            .await?
            .into_iter()
            .map(|category| category.name)
            .collect())
    }

    /// Category records, with ids where the backend supplies them.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the body is not a list.
    #[instrument(skip(self))]
    pub async fn get_categories_full(&self) -> Result<Vec<Category>> {
        let data = self.get("/products/categories").await?;
        list_from(data)
    }
}
