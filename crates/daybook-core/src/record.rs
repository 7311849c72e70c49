//! Report records as served by the backend.
//!
//! The backend contract is loose, so decoding is lenient: any JSON object
//! becomes a [`Record`], with missing fields defaulted rather than rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Payload field that holds a report's line items unless a view says otherwise.
pub const DEFAULT_ITEMS_FIELD: &str = "items";

/// One line item inside a report payload.
pub type Item = Map<String, Value>;

/// One backend-persisted report document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub report_type: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new(
        id: Option<String>,
        report_type: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            report_type: report_type.into(),
            created_at: None,
            payload,
        }
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: Value) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Decode a record from whatever object shape the backend returned.
    ///
    /// # Errors
    /// Returns [`ParseError::NotAnObject`] when `value` is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let Some(object) = value.as_object() else {
            return Err(ParseError::NotAnObject(json_kind(value)));
        };

        let id = object
            .get("id")
            .or_else(|| object.get("_id"))
            .and_then(id_string);
        let report_type = object
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let created_at = object
            .get("createdAt")
            .or_else(|| object.get("created_at"))
            .filter(|value| !value.is_null())
            .cloned();
        let payload = match object.get("payload") {
            Some(Value::Object(payload)) => payload.clone(),
            _ => Map::new(),
        };

        Ok(Self {
            id,
            report_type,
            created_at,
            payload,
        })
    }

    /// Line items stored under `field`; empty when absent or not an array.
    ///
    /// Non-object entries are skipped.
    #[must_use]
    pub fn items(&self, field: &str) -> Vec<Item> {
        match self.payload.get(field) {
            Some(Value::Array(entries)) => {
                entries
                    .iter()
                    .filter_map(|entry| entry.as_object().cloned())
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// True when `field` holds entries [`Record::items`] cannot show: a
    /// non-array value, or an array with non-object entries. Replacing such a
    /// list wholesale would drop them.
    #[must_use]
    pub fn has_uneditable_items(&self, field: &str) -> bool {
        match self.payload.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Array(entries)) => entries.iter().any(|entry| !entry.is_object()),
            Some(_) => true,
        }
    }

    /// Copy of this record whose item list under `field` is replaced wholesale.
    #[must_use]
    pub fn with_items(&self, field: &str, items: &[Item]) -> Self {
        let mut next = self.clone();
        next.payload.insert(
            field.to_string(),
            Value::Array(items.iter().cloned().map(Value::Object).collect()),
        );
        next
    }

    #[must_use]
    pub fn id_str(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        // Extended JSON: { "$oid": "..." }
        Value::Object(object) => object
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// True when a field value counts as "filled in" for display and validation.
#[must_use]
pub fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Array(entries)) => !entries.is_empty(),
        Some(Value::Object(object)) => !object.is_empty(),
        Some(_) => true,
    }
}
