//! Normalized product records.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{first_present, str_field};
use crate::types::id::id_from_value;
use crate::types::{Price, ProductId};

/// Keys consumed by normalization; everything else is carried in `extra`.
const NORMALIZED_KEYS: &[&str] = &[
    "id",
    "_id",
    "title",
    "price",
    "image",
    "imageUrl",
    "category",
    "categoryObj",
    "rating",
];

/// Average rating and review count.
///
/// Serialized with both naming conventions: `rate`/`count` and
/// `avg`/`total` carry the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rating {
    /// Average rating value.
    pub average: f64,
    /// Number of ratings.
    pub count: u64,
}

impl Rating {
    fn from_json(value: Option<&Value>) -> Self {
        let Some(Value::Object(rating)) = value else {
            return Self::default();
        };

        let average = first_present(rating, &["avg", "rate"])
            .and_then(number_as_f64)
            .unwrap_or(0.0);
        let count = first_present(rating, &["total", "count"])
            .and_then(number_as_u64)
            .unwrap_or(0);

        Self { average, count }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr {
            rate: f64,
            count: u64,
            avg: f64,
            total: u64,
        }

        Repr {
            rate: self.average,
            count: self.count,
            avg: self.average,
            total: self.count,
        }
        .serialize(serializer)
    }
}

/// A catalog product after normalization.
///
/// Build one with [`Product::normalize`] or by deserializing any
/// product-shaped JSON; both paths run the same normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Product {
    /// Product identifier (from `_id`, falling back to `id`).
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL (from `imageUrl`, falling back to `image`).
    pub image: String,
    /// Category display name.
    pub category: String,
    /// The rich category record, when the backend sent one.
    pub category_obj: Option<Map<String, Value>>,
    /// Rating aggregate.
    pub rating: Rating,
    /// Fields the normalizer does not interpret, passed through untouched.
    pub extra: Map<String, Value>,
}

impl Product {
    /// Normalize a product-shaped JSON value.
    ///
    /// Non-object input normalizes to an empty product.
    #[must_use]
    pub fn normalize(value: &Value) -> Self {
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);

        let id = first_present(object, &["_id", "id"])
            .and_then(id_from_value)
            .map(ProductId::from)
            .unwrap_or_default();

        let image = str_field(first_present(object, &["imageUrl", "image"]))
            .unwrap_or_default()
            .to_string();

        let (category, category_obj) = match object.get("category") {
            Some(Value::Object(rich)) => (
                str_field(rich.get("name")).unwrap_or_default().to_string(),
                Some(rich.clone()),
            ),
            other => (
                other.map(scalar_to_string).unwrap_or_default(),
                object.get("categoryObj").and_then(Value::as_object).cloned(),
            ),
        };

        let extra = object
            .iter()
            .filter(|(key, _)| !NORMALIZED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            id,
            title: str_field(object.get("title")).unwrap_or_default().to_string(),
            price: Price::from_json(object.get("price")),
            image,
            category,
            category_obj,
            rating: Rating::from_json(object.get("rating")),
            extra,
        }
    }

    /// Serialize to a JSON value carrying both naming conventions.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Repr<'a> {
            #[serde(flatten)]
            extra: &'a Map<String, Value>,
            id: &'a ProductId,
            #[serde(rename = "_id")]
            legacy_id: &'a ProductId,
            title: &'a str,
            price: &'a Price,
            image: &'a str,
            image_url: &'a str,
            category: &'a str,
            category_obj: Option<&'a Map<String, Value>>,
            rating: &'a Rating,
        }

        Repr {
            extra: &self.extra,
            id: &self.id,
            legacy_id: &self.id,
            title: &self.title,
            price: &self.price,
            image: &self.image,
            image_url: &self.image,
            category: &self.category,
            category_obj: self.category_obj.as_ref(),
            rating: &self.rating,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::normalize(&value))
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Non-finite values are rejected: they serialize as `null`.
fn number_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss // negative and fractional counts are clamped/truncated on purpose
)]
fn number_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
