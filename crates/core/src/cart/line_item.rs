//! Cart line items and the cart aggregate.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// Clamp a requested quantity to the valid range (at least 1).
#[must_use]
pub fn clamp_quantity(raw: i64) -> u32 {
    u32::try_from(raw.max(1)).unwrap_or(u32::MAX)
}

/// Parse free-form quantity input.
///
/// Fractions are truncated. Anything that is not a number parses as 1, so
/// the result can always be fed to [`clamp_quantity`].
#[must_use]
#[allow(clippy::cast_possible_truncation)] // saturating float-to-int cast is the intent
pub fn parse_quantity(raw: &str) -> i64 {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        })
        .unwrap_or(1)
}

/// An empty variant selector means "no variant".
pub(crate) fn normalize_size(size: Option<String>) -> Option<String> {
    size.filter(|s| !s.is_empty())
}

/// Snapshot of a product taken when it is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartProduct {
    /// Product identifier.
    pub id: ProductId,
    /// Title at add time.
    pub title: String,
    /// Unit price at add time.
    pub price: Price,
    /// Image at add time.
    pub image: String,
    /// Variant selector (e.g. size).
    pub size: Option<String>,
}

impl CartProduct {
    /// Attach a variant selector.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = normalize_size(Some(size.into()));
        self
    }
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            size: None,
        }
    }
}

/// A single cart row.
///
/// Rows are unique by `(id, size)`; a missing size only matches another
/// missing size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier.
    pub id: ProductId,
    /// Title snapshot.
    #[serde(default)]
    pub title: String,
    /// Unit price snapshot.
    #[serde(default)]
    pub price: Price,
    /// Image snapshot.
    #[serde(default)]
    pub image: String,
    /// Variant selector.
    #[serde(default)]
    pub size: Option<String>,
    /// Quantity, always at least 1.
    #[serde(default = "default_qty")]
    pub qty: u32,
}

const fn default_qty() -> u32 {
    1
}

impl LineItem {
    /// Create a row from a product snapshot.
    #[must_use]
    pub fn new(product: CartProduct, qty: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            size: normalize_size(product.size),
            qty: qty.max(1),
        }
    }

    /// Whether this row has the given `(id, size)` key.
    #[must_use]
    pub fn matches(&self, id: &ProductId, size: Option<&str>) -> bool {
        self.id == *id && self.size.as_deref() == size
    }

    /// `price × qty` for this row.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.qty)
    }

    fn sanitized(mut self) -> Self {
        self.size = normalize_size(self.size);
        self.qty = self.qty.max(1);
        self
    }
}

/// The cart: line items in display order.
///
/// `count` and `total` are computed on every read and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from rows, clamping quantities and empty sizes.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self {
            items: items.into_iter().map(LineItem::sanitized).collect(),
        }
    }

    /// Parse a persisted cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the snapshot is not a list of line items.
    pub fn from_json(snapshot: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<LineItem> = serde_json::from_str(snapshot)?;
        Ok(Self::from_items(items))
    }

    /// Serialize for persistence.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Rows in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Take the rows out of the cart.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Find the row with the given key.
    #[must_use]
    pub fn find(&self, id: &ProductId, size: Option<&str>) -> Option<&LineItem> {
        self.items.iter().find(|item| item.matches(id, size))
    }

    /// Total number of units (Σ qty).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }

    /// Total value (Σ price × qty).
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<LineItem> {
        &mut self.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(id: &str, price: i64, qty: u32) -> LineItem {
        LineItem::new(
            CartProduct {
                id: ProductId::from(id),
                price: Price::from(price),
                ..CartProduct::default()
            },
            qty,
        )
    }

    #[test]
    fn test_aggregates() {
        let cart = Cart::from_items(vec![row("a", 10, 2), row("b", 5, 3)]);
        assert_eq!(cart.count(), 5);
        assert_eq!(cart.total(), Price::from(35));
    }

    #[test]
    fn test_empty_aggregates() {
        let cart = Cart::new();
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(-5), 1);
        assert_eq!(clamp_quantity(7), 7);
        assert_eq!(clamp_quantity(i64::MAX), u32::MAX);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity(" 4 "), 4);
        assert_eq!(parse_quantity("2.9"), 2);
        assert_eq!(parse_quantity("-2"), -2);
        assert_eq!(parse_quantity("lots"), 1);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("NaN"), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut shirt = row("shirt", 20, 1);
        shirt.size = Some("M".to_string());
        let cart = Cart::from_items(vec![row("mug", 12, 2), shirt]);

        let restored = Cart::from_json(&cart.to_json().unwrap()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_snapshot_sanitizes_rows() {
        let restored =
            Cart::from_json(r#"[{"id":"a","price":"4","size":"","qty":0},{"id":7}]"#).unwrap();
        assert_eq!(restored.items()[0].qty, 1);
        assert_eq!(restored.items()[0].size, None);
        assert_eq!(restored.items()[1].id, "7");
        assert_eq!(restored.items()[1].qty, 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        assert!(Cart::from_json("{not json").is_err());
        assert!(Cart::from_json(r#"{"items": 3}"#).is_err());
    }

    #[test]
    fn test_cart_product_with_empty_size() {
        let product = CartProduct::default().with_size("");
        assert_eq!(product.size, None);
    }
}
