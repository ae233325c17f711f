//! Normalization of caller-supplied content into [`BatchItem`]s
//!
//! Callers hand the manager either bare strings or structured records.
//! Bare strings get a synthesized id (`{batch_id}_item_{index}`) plus the
//! submission defaults; records override whichever defaults they set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::BatchItem;
use crate::error::{Error, Result};

/// Structured content record; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub frameworks: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// One submitted content item
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(String),
    Record(ContentRecord),
}

impl ContentItem {
    /// Classify a JSON value, rejecting anything but strings and objects
    pub fn from_value(index: usize, value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(ContentItem::Text(text)),
            Value::Object(_) => serde_json::from_value(value)
                .map(ContentItem::Record)
                .map_err(|e| Error::InvalidContentItem(format!("item {}: {}", index, e))),
            other => Err(Error::InvalidContentItem(format!(
                "item {}: expected string or object, got {}",
                index,
                value_kind(&other)
            ))),
        }
    }

    fn into_batch_item(self, id: String, defaults: &SubmissionDefaults<'_>) -> BatchItem {
        match self {
            ContentItem::Text(content) => BatchItem {
                id,
                content,
                frameworks: defaults.frameworks.map(<[String]>::to_vec),
                metadata: HashMap::new(),
                priority: defaults.priority,
            },
            ContentItem::Record(record) => BatchItem {
                id: record.id.unwrap_or(id),
                content: record.content.unwrap_or_default(),
                frameworks: record
                    .frameworks
                    .or_else(|| defaults.frameworks.map(<[String]>::to_vec)),
                metadata: record.metadata.unwrap_or_default(),
                priority: record.priority.unwrap_or(defaults.priority),
            },
        }
    }
}

impl From<&str> for ContentItem {
    fn from(text: &str) -> Self {
        ContentItem::Text(text.to_string())
    }
}

impl From<String> for ContentItem {
    fn from(text: String) -> Self {
        ContentItem::Text(text)
    }
}

impl From<ContentRecord> for ContentItem {
    fn from(record: ContentRecord) -> Self {
        ContentItem::Record(record)
    }
}

/// Values applied to items that do not set their own
#[derive(Debug, Clone, Copy)]
pub struct SubmissionDefaults<'a> {
    pub frameworks: Option<&'a [String]>,
    pub priority: i64,
}

/// Synthesized id for the item at `index`
pub fn item_id(batch_id: &str, index: usize) -> String {
    format!("{}_item_{}", batch_id, index)
}

/// Build batch items from typed content
pub fn normalize(
    batch_id: &str,
    items: Vec<ContentItem>,
    defaults: SubmissionDefaults<'_>,
) -> Vec<BatchItem> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| item.into_batch_item(item_id(batch_id, index), &defaults))
        .collect()
}

/// Build batch items from raw JSON, failing on the first malformed entry
pub fn normalize_values(
    batch_id: &str,
    values: Vec<Value>,
    defaults: SubmissionDefaults<'_>,
) -> Result<Vec<BatchItem>> {
    let items = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| ContentItem::from_value(index, value))
        .collect::<Result<Vec<_>>>()?;
    Ok(normalize(batch_id, items, defaults))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
