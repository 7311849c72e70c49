//! Response-shape normalization.
//!
//! The service answers lists as a bare array or wrapped under one of a few
//! conventional keys, and single records either bare or wrapped. All shape
//! branching happens here, once.

use daybook_core::{ParseError, Record};
use serde_json::Value;

use crate::error::ClientError;

/// Wrapper keys accepted around a list, in lookup order.
pub const LIST_KEYS: [&str; 3] = ["items", "reports", "data"];

/// Wrapper keys accepted around a single record, in lookup order.
pub const SINGLE_KEYS: [&str; 2] = ["item", "report"];

#[derive(Debug, Clone, PartialEq)]
pub enum ListEnvelope<'a> {
    Bare(&'a [Value]),
    Wrapped {
        key: &'static str,
        entries: &'a [Value],
    },
    Unrecognized,
}

impl<'a> ListEnvelope<'a> {
    #[must_use]
    pub fn classify(body: &'a Value) -> Self {
        match body {
            Value::Array(entries) => Self::Bare(entries),
            Value::Object(object) => LIST_KEYS
                .iter()
                .find_map(|&key| match object.get(key) {
                    Some(Value::Array(entries)) => Some(Self::Wrapped { key, entries }),
                    _ => None,
                })
                .unwrap_or(Self::Unrecognized),
            _ => Self::Unrecognized,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &'a [Value] {
        match self {
            Self::Bare(entries) | Self::Wrapped { entries, .. } => entries,
            Self::Unrecognized => &[],
        }
    }
}

/// Decode a list body. Never fails: unknown shapes, malformed JSON and
/// non-object entries degrade to fewer (or no) records.
#[must_use]
pub fn unwrap_list(body: &str) -> Vec<Record> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, bytes = body.len(), "list response is not JSON");
            return Vec::new();
        }
    };

    let envelope = ListEnvelope::classify(&value);
    if envelope == ListEnvelope::Unrecognized {
        tracing::warn!("list response has no recognizable array; treating as empty");
    }

    envelope
        .entries()
        .iter()
        .filter_map(|entry| match Record::from_value(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(error = %err, "skipping list entry");
                None
            }
        })
        .collect()
}

/// Decode a single-record body. An empty body is `Ok(None)`.
///
/// # Errors
/// Returns [`ClientError::Parse`] for malformed JSON or a non-object record.
pub fn unwrap_single(body: &str) -> Result<Option<Record>, ClientError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|err| ParseError::Json(err.to_string()))?;

    let record = SINGLE_KEYS
        .iter()
        .find_map(|key| value.get(*key).filter(|inner| inner.is_object()))
        .unwrap_or(&value);
    Ok(Some(Record::from_value(record)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(records: &[Record]) -> Vec<Option<&str>> {
        records.iter().map(Record::id_str).collect()
    }

    #[test]
    fn test_bare_array() {
        let records = unwrap_list(r#"[{"id":"1","type":"t"},{"_id":"2","type":"t"}]"#);
        assert_eq!(ids(&records), vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_wrapped_lists() {
        for key in LIST_KEYS {
            let body = json!({ key: [{ "id": "9", "type": "t" }] }).to_string();
            assert_eq!(
                ids(&unwrap_list(&body)),
                vec![Some("9")],
                "wrapper key {key}"
            );
        }
    }

    #[test]
    fn test_wrapper_key_priority() {
        let body = json!({ "data": [{ "id": "d" }], "items": [{ "id": "i" }] });
        match ListEnvelope::classify(&body) {
            ListEnvelope::Wrapped { key, entries } => {
                assert_eq!(key, "items");
                assert_eq!(entries, &[json!({ "id": "i" })]);
            }
            other => panic!("expected a wrapped list, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch_is_empty() {
        assert!(unwrap_list(r#"{"total": 3}"#).is_empty());
        assert!(unwrap_list(r#"{"items": "nope"}"#).is_empty());
        assert!(unwrap_list("<html>502</html>").is_empty());
        assert!(unwrap_list("").is_empty());
    }

    #[test]
    fn test_non_object_entries_skipped() {
        let records = unwrap_list(r#"[1, {"id":"ok"}, null]"#);
        assert_eq!(ids(&records), vec![Some("ok")]);
    }

    #[test]
    fn test_single_shapes() {
        let bare = unwrap_single(r#"{"id":"1","type":"t"}"#)
            .unwrap_or_else(|err| panic!("bare record should decode: {err}"));
        assert_eq!(bare.as_ref().and_then(Record::id_str), Some("1"));

        let wrapped = unwrap_single(r#"{"report":{"id":"2","type":"t"}}"#)
            .unwrap_or_else(|err| panic!("wrapped record should decode: {err}"));
        assert_eq!(wrapped.as_ref().and_then(Record::id_str), Some("2"));

        let empty = unwrap_single("  ").unwrap_or_else(|err| panic!("empty body is fine: {err}"));
        assert!(empty.is_none());
    }

    #[test]
    fn test_single_malformed_is_parse_error() {
        assert!(matches!(unwrap_single("{"), Err(ClientError::Parse(ParseError::Json(_)))));
        assert!(matches!(
            unwrap_single("[1]"),
            Err(ClientError::Parse(ParseError::NotAnObject("array")))
        ));
    }
}
