//! Draft editing of one report's line items.
//!
//! The last-fetched snapshot and the working copy are two separately owned
//! values. The working copy is created by cloning the snapshot, is thrown away
//! whole on discard, and is only replaced by a fresh snapshot once the server
//! accepted it and the report was re-fetched.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::{DraftError, Notice};
use crate::record::Item;
use crate::validation::{check_rows, RemediationRule, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    ReadOnly,
    Editing,
    Saving,
}

impl DraftState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::Editing => "editing",
            Self::Saving => "saving",
        }
    }
}

/// Confirmation step in front of edit mode.
///
/// Compares a shared phrase typed by the user. It keeps accidental edits out;
/// it does not authenticate anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditGate {
    phrase: Option<String>,
}

impl EditGate {
    #[must_use]
    pub fn open() -> Self {
        Self { phrase: None }
    }

    pub fn with_phrase(phrase: impl Into<String>) -> Self {
        Self {
            phrase: Some(phrase.into()),
        }
    }

    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        self.phrase.is_some()
    }

    #[must_use]
    pub fn admits(&self, confirmation: Option<&str>) -> bool {
        match (&self.phrase, confirmation) {
            (None, _) => true,
            (Some(expected), Some(given)) => expected == given.trim(),
            (Some(_), None) => false,
        }
    }
}

/// Items as last fetched from the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub record_id: Option<String>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Draft {
    pub base_record_id: String,
    pub working_items: Vec<Item>,
}

/// What the caller must persist; the full item list, never a diff.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub record_id: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveBlocked {
    #[error(transparent)]
    State(#[from] DraftError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<SaveBlocked> for Notice {
    fn from(e: SaveBlocked) -> Self {
        match e {
            SaveBlocked::State(e) => e.into(),
            SaveBlocked::Invalid(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DraftEditManager {
    state: DraftState,
    source: Option<Snapshot>,
    draft: Option<Draft>,
    gate: EditGate,
    rules: Vec<RemediationRule>,
    last_error: Option<String>,
}

impl Default for DraftEditManager {
    fn default() -> Self {
        Self::new(EditGate::open(), Vec::new())
    }
}

impl DraftEditManager {
    #[must_use]
    pub fn new(gate: EditGate, rules: Vec<RemediationRule>) -> Self {
        Self {
            state: DraftState::ReadOnly,
            source: None,
            draft: None,
            gate,
            rules,
            last_error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> DraftState {
        self.state
    }

    #[must_use]
    pub fn source(&self) -> Option<&Snapshot> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Rows to display: the working copy while editing, else the snapshot.
    #[must_use]
    pub fn visible_items(&self) -> &[Item] {
        match (&self.draft, &self.source) {
            (Some(draft), _) => &draft.working_items,
            (None, Some(source)) => &source.items,
            (None, None) => &[],
        }
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn gate(&self) -> &EditGate {
        &self.gate
    }

    /// Replace the last-fetched snapshot. Only allowed outside edit mode.
    ///
    /// # Errors
    /// [`DraftError::InvalidTransition`] while editing or saving.
    pub fn load(&mut self, record_id: Option<String>, items: Vec<Item>) -> Result<(), DraftError> {
        self.require(DraftState::ReadOnly, "load a report")?;
        self.source = Some(Snapshot { record_id, items });
        self.last_error = None;
        Ok(())
    }

    /// Forget the snapshot, e.g. when the report disappeared from the server.
    pub fn unload(&mut self) {
        self.state = DraftState::ReadOnly;
        self.source = None;
        self.draft = None;
    }

    /// `ReadOnly → Editing`, cloning the snapshot into a fresh working copy.
    ///
    /// # Errors
    /// Fails when not read-only, when nothing is loaded, when the loaded report
    /// has no id, or when the confirmation does not match.
    pub fn begin_edit(&mut self, confirmation: Option<&str>) -> Result<(), DraftError> {
        self.require(DraftState::ReadOnly, "start editing")?;
        let source = self.source.as_ref().ok_or(DraftError::NothingLoaded)?;
        let record_id = source.record_id.clone().ok_or(DraftError::MissingRecordId)?;
        if !self.gate.admits(confirmation) {
            return Err(DraftError::ConfirmationRejected);
        }

        self.draft = Some(Draft {
            base_record_id: record_id,
            working_items: source.items.clone(),
        });
        self.state = DraftState::Editing;
        self.last_error = None;
        Ok(())
    }

    /// Set `key` on row `index` of the working copy only.
    ///
    /// # Errors
    /// Fails outside edit mode or when `index` is out of range.
    pub fn update_field(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), DraftError> {
        let row = self.working_row(index)?;
        row.insert(key.into(), value);
        Ok(())
    }

    /// Remove row `index` from the working copy and return it.
    ///
    /// # Errors
    /// Fails outside edit mode or when `index` is out of range.
    pub fn delete_row(&mut self, index: usize) -> Result<Item, DraftError> {
        let rows = self.working_rows("delete a row")?;
        if index >= rows.len() {
            return Err(DraftError::RowOutOfRange {
                index,
                len: rows.len(),
            });
        }
        Ok(rows.remove(index))
    }

    /// Append a manual row and return its index.
    ///
    /// # Errors
    /// Fails outside edit mode.
    pub fn append_row(&mut self, item: Item) -> Result<usize, DraftError> {
        let rows = self.working_rows("add a row")?;
        rows.push(item);
        Ok(rows.len() - 1)
    }

    /// True when the working copy differs from the snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match (&self.draft, &self.source) {
            (Some(draft), Some(source)) => draft.working_items != source.items,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// `Editing → ReadOnly`, dropping every working-copy mutation.
    ///
    /// # Errors
    /// Fails outside edit mode.
    pub fn discard(&mut self) -> Result<(), DraftError> {
        self.require(DraftState::Editing, "discard changes")?;
        self.draft = None;
        self.state = DraftState::ReadOnly;
        self.last_error = None;
        Ok(())
    }

    /// `Editing → Saving` after the remediation rules pass.
    ///
    /// A validation failure leaves the manager in `Editing`.
    ///
    /// # Errors
    /// [`SaveBlocked::Invalid`] when a flagged row lacks its remediation,
    /// [`SaveBlocked::State`] outside edit mode.
    pub fn begin_save(&mut self) -> Result<SaveRequest, SaveBlocked> {
        self.require(DraftState::Editing, "save")?;
        let draft = self.draft.as_ref().ok_or(DraftError::NothingLoaded)?;
        if let Err(err) = check_rows(&draft.working_items, &self.rules) {
            self.last_error = Some(err.to_string());
            return Err(err.into());
        }

        let request = SaveRequest {
            record_id: draft.base_record_id.clone(),
            items: draft.working_items.clone(),
        };
        self.state = DraftState::Saving;
        Ok(request)
    }

    /// `Saving → Editing`; the working copy is kept untouched.
    ///
    /// # Errors
    /// Fails unless a save is in flight.
    pub fn save_failed(&mut self, message: impl Into<String>) -> Result<(), DraftError> {
        self.require(DraftState::Saving, "report a failed save")?;
        self.state = DraftState::Editing;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// `Saving → ReadOnly` with the re-fetched report as the new snapshot.
    ///
    /// # Errors
    /// Fails unless a save is in flight.
    pub fn save_succeeded(&mut self, fresh: Snapshot) -> Result<(), DraftError> {
        self.require(DraftState::Saving, "finish a save")?;
        self.source = Some(fresh);
        self.draft = None;
        self.state = DraftState::ReadOnly;
        self.last_error = None;
        Ok(())
    }

    fn require(&self, expected: DraftState, action: &'static str) -> Result<(), DraftError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DraftError::InvalidTransition {
                action,
                state: self.state.as_str(),
            })
        }
    }

    fn working_rows(&mut self, action: &'static str) -> Result<&mut Vec<Item>, DraftError> {
        self.require(DraftState::Editing, action)?;
        self.draft
            .as_mut()
            .map(|draft| &mut draft.working_items)
            .ok_or(DraftError::NothingLoaded)
    }

    fn working_row(&mut self, index: usize) -> Result<&mut Item, DraftError> {
        let rows = self.working_rows("edit a field")?;
        let len = rows.len();
        rows.get_mut(index)
            .ok_or(DraftError::RowOutOfRange { index, len })
    }
}
