//! The stored unit and the criteria used to query it.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Criteria value that matches any `type`.
pub const WILDCARD: &str = "*";

/// A complete, atomically replaced snapshot.
///
/// On disk a document looks like:
///
/// ```json
/// {
///   "id": "Documentation",
///   "type": "Documentation",
///   "content": [ { "text": "..." } ]
/// }
/// ```
///
/// Any other top-level fields (prompt templates carry several) are kept in
/// `extra` and written back next to the three fixed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Create a document whose `id` and `type` are both `key`.
    pub fn keyed(key: impl Into<String>, content: Vec<Value>) -> Self {
        let key = key.into();
        Self {
            id: key.clone(),
            doc_type: key,
            content,
            extra: Map::new(),
        }
    }

    /// Decode a raw JSON value.
    ///
    /// `id` must be a non-empty string. A missing `type` defaults to the id,
    /// a missing `content` to an empty list.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(StoreError::validation("document must be a JSON object"));
        };

        let id = match map.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(StoreError::validation("document must include an 'id' field"));
            }
            Some(other) => {
                return Err(StoreError::validation(format!(
                    "document 'id' must be a string, got {}",
                    other
                )));
            }
        };

        if !map.contains_key("type") {
            map.insert("type".to_string(), Value::String(id));
        }

        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Look up a top-level field by its serialized name.
    pub fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            "id" => Some(Cow::Owned(Value::String(self.id.clone()))),
            "type" => Some(Cow::Owned(Value::String(self.doc_type.clone()))),
            "content" => Some(Cow::Owned(Value::Array(self.content.clone()))),
            other => self.extra.get(other).map(Cow::Borrowed),
        }
    }

    /// Reject documents that cannot be keyed.
    pub fn validate(&self) -> StoreResult<()> {
        validate_key("document id", &self.id)
    }
}

/// Field→value equality filter, combined with logical AND.
///
/// An empty criteria set matches every document. A `type` criterion equal
/// to [`WILDCARD`] matches every type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: BTreeMap<String, Value>,
}

impl Criteria {
    /// Match-all criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria selecting one document type.
    pub fn by_type(doc_type: impl Into<String>) -> Self {
        Self::new().and("type", Value::String(doc_type.into()))
    }

    /// Add an equality condition.
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.effective().next().is_none()
    }

    /// Conditions that actually constrain results (wildcards removed).
    pub fn effective(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(field, value)| {
                !(field.as_str() == "type" && value.as_str() == Some(WILDCARD))
            })
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Whether every condition holds for `doc`.
    ///
    /// A `null` condition also matches a field the document does not have.
    pub fn matches(&self, doc: &Document) -> bool {
        self.effective().all(|(field, expected)| match doc.field(field) {
            Some(actual) => actual.as_ref() == expected,
            None => expected.is_null(),
        })
    }
}

impl From<Map<String, Value>> for Criteria {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Criteria::new(), |criteria, (k, v)| criteria.and(k, v))
    }
}

/// Validate a string used as a file name or partition name.
pub fn validate_key(what: &str, key: &str) -> StoreResult<()> {
    if key.trim().is_empty() {
        return Err(StoreError::validation(format!("{} is required", what)));
    }
    if key.starts_with('.') || key.contains(['/', '\\', '\0']) {
        return Err(StoreError::validation(format!(
            "{} '{}' is not a valid key",
            what, key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_defaults_type_to_id() {
        let doc = Document::from_value(json!({"id": "Questionnaire", "content": [{"a": 1}]})).unwrap();
        assert_eq!(doc.doc_type, "Questionnaire");
        assert_eq!(doc.content, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_from_value_requires_id() {
        let err = Document::from_value(json!({"type": "Documentation"})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = Document::from_value(json!({"id": 7})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_extra_fields_survive_serialization() {
        let doc = Document::from_value(json!({
            "id": "doc-template",
            "type": "Documentation",
            "project_id": "demo",
            "objects": ["Questionnaire"]
        }))
        .unwrap();

        assert_eq!(doc.field("project_id").unwrap().as_ref(), &json!("demo"));

        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_criteria_matching() {
        let doc = Document::keyed("Documentation", vec![]);

        assert!(Criteria::new().matches(&doc));
        assert!(Criteria::by_type("Documentation").matches(&doc));
        assert!(Criteria::by_type(WILDCARD).matches(&doc));
        assert!(!Criteria::by_type("Questionnaire").matches(&doc));
        assert!(!Criteria::by_type("Documentation").and("project_id", "demo").matches(&doc));
        assert!(Criteria::new().and("project_id", Value::Null).matches(&doc));
    }

    #[test]
    fn test_wildcard_criteria_is_empty() {
        assert!(Criteria::by_type(WILDCARD).is_empty());
        assert!(!Criteria::by_type("Documentation").is_empty());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("id", "Documentation").is_ok());
        assert!(validate_key("id", "Test Project").is_ok());
        assert!(validate_key("id", "").is_err());
        assert!(validate_key("id", "../etc").is_err());
        assert!(validate_key("id", "a/b").is_err());
        assert!(validate_key("id", ".hidden").is_err());
    }
}
