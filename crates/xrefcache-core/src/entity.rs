//! Entity and collection records.
//!
//! Entities are schema-tagged bags of properties. Every property holds one or
//! many values; a scalar on the wire is normalised to a one-element list so
//! readers never branch on shape.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Properties consulted, in order, when an entity has no title.
const CAPTION_PROPERTIES: &[&str] = &["name", "title", "fileName"];

/// A typed record (person, company, document, ...) identified by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Opaque entity id
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Schema tag (e.g., "Person", "Company", "Document")
    #[serde(default)]
    pub schema: String,

    /// Property name to values
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: BTreeMap<String, Vec<Value>>,
}

impl Entity {
    /// Create an entity with no properties.
    pub fn new(id: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema: schema.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Add string values for a property.
    pub fn with_property<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|v| Value::String(v.into()))
            .collect();
        self.properties.insert(name.into(), values);
        self
    }

    /// All values of a property (empty if unset).
    pub fn values(&self, prop: &str) -> &[Value] {
        self.properties.get(prop).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First non-empty value of a property rendered as text.
    pub fn first(&self, prop: &str) -> Option<String> {
        self.values(prop).iter().find_map(value_text)
    }

    /// First caption-bearing property value.
    pub fn caption(&self) -> Option<String> {
        CAPTION_PROPERTIES.iter().find_map(|prop| self.first(prop))
    }

    /// Display label.
    ///
    /// In document mode the file name wins over the title. `None` means the
    /// entity is untitled.
    pub fn label(&self, document_mode: bool) -> Option<String> {
        let title = self.first("title").or_else(|| self.caption());
        let file_name = self.first("fileName").or_else(|| title.clone());
        if document_mode {
            file_name
        } else {
            title.or(file_name)
        }
    }
}

/// Truncate a label to `max` characters, appending an ellipsis when cut.
pub fn truncate_label(label: &str, max: usize) -> String {
    match label.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &label[..cut]),
        None => label.to_string(),
    }
}

/// Links attached to a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionLinks {
    /// UI path of the collection
    #[serde(default)]
    pub ui: Option<String>,
}

/// A collection of entities (a dataset or an investigation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection id; numeric ids on the wire are read as text
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Human readable label
    #[serde(default)]
    pub label: String,

    /// Related links
    #[serde(default)]
    pub links: CollectionLinks,
}

impl Collection {
    /// Create a collection with a label and no links.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            links: CollectionLinks::default(),
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let values = match value {
                Value::Array(values) => values,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            (name, values)
        })
        .collect())
}

/// Deserialize an identifier that may arrive as a string or an integer.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or integer id, got {}",
            other
        ))),
    }
}
