//! Pre-save checks on a draft's rows.
//! A flagged row (out-of-range reading, failed check...) must carry its
//! remediation before the draft may be saved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::{is_filled, Item};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{message} (row {row}: `{field}` is empty)")]
    MissingRemediation {
        row: usize,
        field: String,
        message: String,
    },
}

/// One "flagged rows need a remediation" rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationRule {
    /// Row field holding the status.
    pub status_field: String,
    /// Status values that flag a row; compared case-insensitively.
    pub flagged_values: Vec<String>,
    /// Field that must be filled on a flagged row.
    pub required_field: String,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "A corrective action is required for every flagged row".to_string()
}

impl RemediationRule {
    pub fn new<I, S>(
        status_field: impl Into<String>,
        flagged_values: I,
        required_field: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status_field: status_field.into(),
            flagged_values: flagged_values.into_iter().map(Into::into).collect(),
            required_field: required_field.into(),
            message: default_message(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn is_flagged(&self, item: &Item) -> bool {
        let status = match item.get(&self.status_field) {
            Some(Value::String(status)) => status.trim().to_string(),
            Some(Value::Bool(flag)) => flag.to_string(),
            Some(Value::Number(number)) => number.to_string(),
            _ => return false,
        };
        self.flagged_values
            .iter()
            .any(|flagged| flagged.eq_ignore_ascii_case(&status))
    }

    fn violation(&self, row: usize, item: &Item) -> Option<ValidationError> {
        if self.is_flagged(item) && !is_filled(item.get(&self.required_field)) {
            return Some(ValidationError::MissingRemediation {
                row,
                field: self.required_field.clone(),
                message: self.message.clone(),
            });
        }
        None
    }
}

/// Report the first violation: lowest row first, then rule order.
///
/// # Errors
/// Returns [`ValidationError::MissingRemediation`] for the first flagged row
/// whose required field is empty.
pub fn check_rows(items: &[Item], rules: &[RemediationRule]) -> Result<(), ValidationError> {
    for (row, item) in items.iter().enumerate() {
        if let Some(violation) = rules.iter().find_map(|rule| rule.violation(row, item)) {
            return Err(violation);
        }
    }
    Ok(())
}
