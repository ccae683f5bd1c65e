//! Server-side cart rows, as returned by `GET /cart`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::line_item::{CartProduct, LineItem, clamp_quantity};
use crate::catalog::Product;
use crate::types::ProductId;

/// One row of the server-side cart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartItem {
    /// Product reference, when the server sends it separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Populated product record (normalized on deserialize).
    #[serde(default)]
    pub product: Option<Product>,
    /// Variant selector.
    #[serde(default)]
    pub size: Option<String>,
    /// Quantity.
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Any other fields on the row.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerCartItem {
    /// Convert into a local cart row.
    ///
    /// The id comes from `productId`, falling back to the populated
    /// product; the snapshot fields come from the populated product.
    #[must_use]
    pub fn to_line_item(&self) -> LineItem {
        let product = self.product.as_ref();
        let id = self
            .product_id
            .clone()
            .or_else(|| product.map(|p| p.id.clone()))
            .unwrap_or_default();

        let snapshot = CartProduct {
            id,
            title: product.map(|p| p.title.clone()).unwrap_or_default(),
            price: product.map(|p| p.price).unwrap_or_default(),
            image: product.map(|p| p.image.clone()).unwrap_or_default(),
            size: self.size.clone(),
        };

        LineItem::new(snapshot, clamp_quantity(self.quantity.unwrap_or(1)))
    }
}
