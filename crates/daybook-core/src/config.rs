//! Per-view configuration.
//!
//! Every browse screen differs only in which fields carry the date, where
//! unparseable days go, how rows are grouped and which rows need remediation.

use serde::{Deserialize, Serialize};

use crate::date_key::{DateSource, RawPlacement};
use crate::draft::EditGate;
use crate::grouping::GroupSpec;
use crate::record::DEFAULT_ITEMS_FIELD;
use crate::validation::RemediationRule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Report `type` discriminator listed by this view.
    pub report_type: String,
    /// Date candidates, highest priority first.
    pub date_fields: Vec<String>,
    pub raw_placement: RawPlacement,
    /// Payload field holding the editable line items.
    pub items_field: String,
    pub group: Option<GroupSpec>,
    pub remediation: Vec<RemediationRule>,
    /// Phrase the user must type before editing; `None` disables the step.
    pub edit_phrase: Option<String>,
    /// Sent as `reporter` when creating reports.
    pub reporter: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            report_type: String::new(),
            date_fields: DateSource::default().fields,
            raw_placement: RawPlacement::default(),
            items_field: DEFAULT_ITEMS_FIELD.to_string(),
            group: None,
            remediation: Vec::new(),
            edit_phrase: None,
            reporter: None,
        }
    }
}

impl ViewConfig {
    pub fn for_type(report_type: impl Into<String>) -> Self {
        Self {
            report_type: report_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn date_source(&self) -> DateSource {
        DateSource {
            fields: self.date_fields.clone(),
        }
    }

    #[must_use]
    pub fn edit_gate(&self) -> EditGate {
        match &self.edit_phrase {
            Some(phrase) if !phrase.is_empty() => EditGate::with_phrase(phrase.clone()),
            _ => EditGate::open(),
        }
    }
}
