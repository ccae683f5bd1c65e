//! Product categories.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{first_present, str_field};
use crate::types::CategoryId;
use crate::types::id::id_from_value;

/// A product category.
///
/// The categories endpoint returns either bare names or full records; both
/// deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Category {
    /// Category identifier, when the backend sent a record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// Any other fields on the record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    /// Build a category from a bare name or a category record.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(record) => Self {
                id: first_present(record, &["_id", "id"])
                    .and_then(id_from_value)
                    .map(CategoryId::from),
                name: str_field(record.get("name")).unwrap_or_default().to_string(),
                extra: record
                    .iter()
                    .filter(|(key, _)| !matches!(key.as_str(), "_id" | "id" | "name"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            },
            Value::String(name) => Self {
                name: name.clone(),
                ..Self::default()
            },
            Value::Null => Self::default(),
            other => Self {
                name: other.to_string(),
                ..Self::default()
            },
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_from_mixed_list() {
        let categories: Vec<Category> = serde_json::from_value(json!([
            "electronics",
            {"_id": "c2", "name": "Jewelery", "slug": "jewelery"}
        ]))
        .unwrap();

        assert_eq!(categories[0].name, "electronics");
        assert!(categories[0].id.is_none());
        assert_eq!(categories[1].name, "Jewelery");
        assert_eq!(categories[1].id.as_ref().unwrap(), "c2");
        assert_eq!(categories[1].extra.get("slug"), Some(&json!("jewelery")));
    }

    #[test]
    fn test_category_record_without_name() {
        let category = Category::from_json(&json!({"id": 4}));
        assert_eq!(category.name, "");
        assert_eq!(category.id.unwrap(), "4");
    }
}
