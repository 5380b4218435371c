//! Document and chunk types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Loader metadata; values may be arbitrary JSON
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Metadata that the vector index accepts: scalar values only
pub type ScalarMetadata = BTreeMap<String, MetadataValue>;

/// A scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl MetadataValue {
    /// Convert a JSON value, returning `None` for null, arrays and objects
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    /// String contents, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// A logical document produced by a loader: one PDF page or one sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text
    pub text: String,
    /// Loader metadata (page number, sheet name, ...)
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style metadata insertion
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded slice of a document, the unit stored in the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text, at most `chunk_size` characters
    pub text: String,
    /// Parent metadata, unfiltered until persistence
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(MetadataValue::from_json(&json!(3)), Some(MetadataValue::Int(3)));
        assert_eq!(
            MetadataValue::from_json(&json!(0.5)),
            Some(MetadataValue::Float(0.5))
        );
        assert_eq!(
            MetadataValue::from_json(&json!("Sheet1")),
            Some(MetadataValue::from("Sheet1"))
        );
        assert_eq!(MetadataValue::from_json(&json!(null)), None);
        assert_eq!(MetadataValue::from_json(&json!([1, 2])), None);
        assert_eq!(MetadataValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_untagged_round_trip_keeps_ints() {
        let mut meta = ScalarMetadata::new();
        meta.insert("page".into(), MetadataValue::Int(2));
        meta.insert("title".into(), "report".into());

        let encoded = serde_json::to_string(&meta).unwrap();
        assert_eq!(encoded, r#"{"page":2,"title":"report"}"#);

        let decoded: ScalarMetadata = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, meta);
    }
}
