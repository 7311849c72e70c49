//! One browse screen: fetched records, the day tree, the selected day, the
//! open report and its draft.
//!
//! Every mutation re-fetches the whole list before the screen shows anything
//! new; local edits never become the source of truth on their own. Mutating
//! methods take `&mut self`, so a save and a delete issued through the same
//! browser cannot interleave.

use serde_json::{Map, Value};

use crate::backend::ReportBackend;
use crate::config::ViewConfig;
use crate::date_key::{DateKey, DateSource};
use crate::draft::{DraftEditManager, DraftState, Snapshot};
use crate::error::{DraftError, Notice};
use crate::grouping::{aggregate, Group};
use crate::hierarchy::DateHierarchy;
use crate::record::{Item, Record};
use crate::selection::SelectionController;

pub struct ReportBrowser<B> {
    backend: B,
    view: ViewConfig,
    source: DateSource,
    records: Vec<Record>,
    hierarchy: DateHierarchy,
    selection: SelectionController,
    drafts: DraftEditManager,
    notice: Option<Notice>,
}

impl<B: ReportBackend> ReportBrowser<B> {
    pub fn new(backend: B, view: ViewConfig) -> Self {
        let source = view.date_source();
        let drafts = DraftEditManager::new(view.edit_gate(), view.remediation.clone());
        let hierarchy = DateHierarchy::from_source(&[], &source, view.raw_placement);
        Self {
            backend,
            view,
            source,
            records: Vec::new(),
            hierarchy,
            selection: SelectionController::new(),
            drafts,
            notice: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn hierarchy(&self) -> &DateHierarchy {
        &self.hierarchy
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn drafts(&self) -> &DraftEditManager {
        &self.drafts
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// First load: fetch, build, select the newest day.
    ///
    /// # Errors
    /// Returns the notice for a failed fetch; the screen stays empty.
    pub async fn load(&mut self) -> Result<(), Notice> {
        let records = self.fetch().await?;
        self.replace_records(records);
        self.selection.on_initial_load(&self.hierarchy);
        Ok(())
    }

    /// Re-fetch without a local mutation behind it.
    ///
    /// # Errors
    /// Returns the notice for a failed fetch; previous data stays visible.
    pub async fn refresh(&mut self) -> Result<(), Notice> {
        let records = self.fetch().await?;
        self.replace_records(records);
        self.selection.after_refresh(&self.hierarchy);
        Ok(())
    }

    /// # Errors
    /// Fails when the hierarchy has no such day.
    pub fn select_day(&mut self, key: &DateKey) -> Result<(), Notice> {
        if self.selection.select(key, &self.hierarchy) {
            Ok(())
        } else {
            self.fail(Notice::unknown_day(&key.label()))
        }
    }

    /// Records of the selected day, in fetch order.
    pub fn selected_records(&self) -> &[Record] {
        match self.selection.selected() {
            Some(key) => self.hierarchy.records_for(key),
            None => &[],
        }
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.id_str() == Some(id))
    }

    /// Open a report for viewing and select its day.
    ///
    /// # Errors
    /// Fails for unknown ids or while another draft is being edited.
    pub fn open_record(&mut self, id: &str) -> Result<(), Notice> {
        let Some(record) = self.record(id).cloned() else {
            return self.fail(Notice::unknown_record(id));
        };
        let items = record.items(&self.view.items_field);
        if let Err(err) = self.drafts.load(record.id.clone(), items) {
            return self.fail(err.into());
        }
        if let Some(day) = self.hierarchy.day_of_record(id).cloned() {
            self.selection.select(&day, &self.hierarchy);
        }
        Ok(())
    }

    pub fn open_record_id(&self) -> Option<&str> {
        self.drafts
            .source()
            .and_then(|source| source.record_id.as_deref())
    }

    /// Rows of the open report: the working copy while editing.
    pub fn visible_items(&self) -> &[Item] {
        self.drafts.visible_items()
    }

    /// Visible rows grouped per the view's group spec; one singleton group
    /// per row when the view does not group.
    pub fn groups(&self) -> Vec<Group> {
        let items = self.drafts.visible_items();
        match &self.view.group {
            Some(spec) => spec.aggregate(items),
            None => aggregate(items, &[], |_| None),
        }
    }

    /// # Errors
    /// Fails when nothing is open, when already editing, when the open report
    /// holds line items the draft cannot show, or when the confirmation phrase
    /// does not match.
    pub fn begin_edit(&mut self, confirmation: Option<&str>) -> Result<(), Notice> {
        let uneditable = self
            .open_record_id()
            .and_then(|id| self.record(id))
            .is_some_and(|record| record.has_uneditable_items(&self.view.items_field));
        if uneditable {
            let err = self.uneditable_items();
            return self.fail(err.into());
        }
        let result = self.drafts.begin_edit(confirmation);
        self.check(result)
    }

    /// # Errors
    /// Fails outside edit mode or for an unknown row.
    pub fn update_field(&mut self, index: usize, key: &str, value: Value) -> Result<(), Notice> {
        let result = self.drafts.update_field(index, key, value);
        self.check(result)
    }

    /// # Errors
    /// Fails outside edit mode or for an unknown row.
    pub fn delete_row(&mut self, index: usize) -> Result<Item, Notice> {
        let result = self.drafts.delete_row(index);
        self.check(result)
    }

    /// # Errors
    /// Fails outside edit mode.
    pub fn append_row(&mut self, item: Item) -> Result<usize, Notice> {
        let result = self.drafts.append_row(item);
        self.check(result)
    }

    /// # Errors
    /// Fails outside edit mode.
    pub fn discard(&mut self) -> Result<(), Notice> {
        let result = self.drafts.discard();
        self.check(result)
    }

    /// Validate, persist the full working copy, then re-fetch and re-select
    /// the saved day.
    ///
    /// On a blocked or failed save the draft stays in `Editing`.
    ///
    /// # Errors
    /// Validation failures, backend failures (a vanished record is a
    /// conflict), and a failed re-fetch after the server accepted the save.
    pub async fn save(&mut self) -> Result<(), Notice> {
        let request = match self.drafts.begin_save() {
            Ok(request) => request,
            Err(err) => return self.fail(err.into()),
        };
        let Some(base) = self.record(&request.record_id).cloned() else {
            let notice = Notice::unknown_record(&request.record_id);
            self.abort_save(&notice);
            return self.fail(notice);
        };
        if base.has_uneditable_items(&self.view.items_field) {
            let notice = Notice::from(self.uneditable_items());
            self.abort_save(&notice);
            return self.fail(notice);
        }
        let saved_day = self.source.key_for(&base);
        let updated = base.with_items(&self.view.items_field, &request.items);

        if let Err(err) = self
            .backend
            .update_report(&request.record_id, &base.report_type, &updated.payload)
            .await
        {
            tracing::warn!(record_id = %request.record_id, error = %err, "save failed");
            let notice = Notice::from(err);
            self.abort_save(&notice);
            return self.fail(notice);
        }
        tracing::info!(record_id = %request.record_id, rows = request.items.len(), "report saved");

        let records = match self.fetch().await {
            Ok(records) => records,
            Err(notice) => {
                // Accepted by the server but not re-read: drop the stale copy.
                self.drafts.unload();
                return Err(notice);
            }
        };
        self.replace_records(records);

        match self.record(&request.record_id).cloned() {
            Some(fresh) => {
                let snapshot = Snapshot {
                    record_id: fresh.id.clone(),
                    items: fresh.items(&self.view.items_field),
                };
                let result = self.drafts.save_succeeded(snapshot);
                self.check(result)?;
                let day = self
                    .hierarchy
                    .day_of_record(&request.record_id)
                    .cloned()
                    .unwrap_or(saved_day);
                self.selection.after_save(&day, &self.hierarchy);
            }
            None => {
                self.drafts.unload();
                self.selection.after_delete(&self.hierarchy);
            }
        }
        Ok(())
    }

    /// Delete a report, re-fetch, and move the selection if its day emptied.
    ///
    /// Passes the same confirmation gate as [`ReportBrowser::begin_edit`].
    ///
    /// # Errors
    /// A rejected confirmation, backend failures, and a failed re-fetch after
    /// the delete.
    pub async fn delete_record(
        &mut self,
        id: &str,
        confirmation: Option<&str>,
    ) -> Result<(), Notice> {
        if !self.drafts.gate().admits(confirmation) {
            return self.fail(DraftError::ConfirmationRejected.into());
        }
        if let Err(err) = self.backend.delete_report(id).await {
            tracing::warn!(record_id = %id, error = %err, "delete failed");
            return self.fail(err.into());
        }
        tracing::info!(record_id = %id, "report deleted");

        if self.open_record_id() == Some(id) {
            self.drafts.unload();
        }
        let records = self.fetch().await?;
        self.replace_records(records);
        self.selection.after_delete(&self.hierarchy);
        Ok(())
    }

    /// Create a report of this view's type, re-fetch, and select its day.
    ///
    /// # Errors
    /// Backend failures and a failed re-fetch.
    pub async fn create_record(
        &mut self,
        payload: Map<String, Value>,
    ) -> Result<Option<Record>, Notice> {
        let created = match self
            .backend
            .create_report(&self.view.report_type, &payload, self.view.reporter.as_deref())
            .await
        {
            Ok(created) => created,
            Err(err) => return self.fail(err.into()),
        };

        let records = self.fetch().await?;
        self.replace_records(records);

        let day = created
            .as_ref()
            .and_then(|record| record.id_str())
            .and_then(|id| self.hierarchy.day_of_record(id).cloned())
            .unwrap_or_else(|| {
                self.source
                    .key_for(&Record::new(None, self.view.report_type.clone(), payload))
            });
        if !self.selection.select(&day, &self.hierarchy) {
            self.selection.after_refresh(&self.hierarchy);
        }
        Ok(created)
    }

    async fn fetch(&mut self) -> Result<Vec<Record>, Notice> {
        match self.backend.list_reports(&self.view.report_type).await {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(report_type = %self.view.report_type, error = %err, "fetch failed");
                self.fail(err.into())
            }
        }
    }

    /// Swap in a fresh record list and keep the open snapshot in step with it
    /// (unless a draft is being edited).
    fn replace_records(&mut self, records: Vec<Record>) {
        self.hierarchy =
            DateHierarchy::from_source(&records, &self.source, self.view.raw_placement);
        self.records = records;

        if self.drafts.state() != DraftState::ReadOnly {
            return;
        }
        let Some(open_id) = self.open_record_id().map(str::to_string) else {
            return;
        };
        match self.record(&open_id).cloned() {
            Some(record) => {
                let items = record.items(&self.view.items_field);
                if let Err(err) = self.drafts.load(record.id, items) {
                    tracing::error!(error = %err, "could not refresh open report");
                }
            }
            None => self.drafts.unload(),
        }
    }

    fn uneditable_items(&self) -> DraftError {
        DraftError::UneditableItems {
            field: self.view.items_field.clone(),
        }
    }

    fn abort_save(&mut self, notice: &Notice) {
        if let Err(err) = self.drafts.save_failed(notice.message.clone()) {
            tracing::error!(error = %err, "draft was not saving");
        }
    }

    fn check<T, E>(&mut self, result: Result<T, E>) -> Result<T, Notice>
    where
        E: Into<Notice>,
    {
        result.or_else(|err| self.fail(err.into()))
    }

    fn fail<T>(&mut self, notice: Notice) -> Result<T, Notice> {
        self.notice = Some(notice.clone());
        Err(notice)
    }
}
