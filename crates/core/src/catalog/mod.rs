//! Catalog types and response normalization.
//!
//! The backend has used two field-naming conventions over time (`_id` vs
//! `id`, `imageUrl` vs `image`, `avg`/`total` vs `rate`/`count` ratings).
//! These types accept either and serialize both, so normalizing an already
//! normalized record is a no-op.

pub mod category;
pub mod product;

pub use category::Category;
pub use product::{Product, Rating};

use serde_json::Value;

/// Read a string field, treating non-strings as absent.
pub(crate) fn str_field<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value.and_then(Value::as_str)
}

/// First non-null value among the given keys, mirroring `a ?? b`.
pub(crate) fn first_present<'a>(
    object: &'a serde_json::Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}
