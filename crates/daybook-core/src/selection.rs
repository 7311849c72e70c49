//! Which day is selected, and where selection lands after the data changes.

use serde::Serialize;

use crate::date_key::DateKey;
use crate::hierarchy::DateHierarchy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionController {
    selected: Option<DateKey>,
    expanded_year: Option<i32>,
    expanded_month: Option<(i32, u8)>,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&DateKey> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn expanded_year(&self) -> Option<i32> {
        self.expanded_year
    }

    #[must_use]
    pub fn expanded_month(&self) -> Option<(i32, u8)> {
        self.expanded_month
    }

    /// Expand the most recent year and month, select the newest day.
    pub fn on_initial_load(&mut self, hierarchy: &DateHierarchy) {
        self.expanded_year = hierarchy.tree.first().map(|year| year.year);
        self.expanded_month = hierarchy
            .tree
            .first()
            .and_then(|year| year.months.first().map(|month| (year.year, month.month)));
        self.selected = hierarchy.newest_day().cloned();
        self.expand_selected();
    }

    /// Select `key` if the hierarchy has it. Returns whether it did.
    pub fn select(&mut self, key: &DateKey, hierarchy: &DateHierarchy) -> bool {
        if !hierarchy.contains(key) {
            return false;
        }
        self.selected = Some(key.clone());
        self.expand_selected();
        true
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Keep the selection if its day survived, else fall back to the newest
    /// remaining day, else clear.
    pub fn after_delete(&mut self, hierarchy: &DateHierarchy) {
        self.retain_or_fallback(hierarchy);
    }

    /// Re-select the saved day on the re-fetched data.
    pub fn after_save(&mut self, saved_day: &DateKey, hierarchy: &DateHierarchy) {
        if !self.select(saved_day, hierarchy) {
            self.retain_or_fallback(hierarchy);
        }
    }

    /// Refresh without a user mutation behind it.
    pub fn after_refresh(&mut self, hierarchy: &DateHierarchy) {
        if self.selected.is_none() {
            self.on_initial_load(hierarchy);
        } else {
            self.retain_or_fallback(hierarchy);
        }
    }

    fn retain_or_fallback(&mut self, hierarchy: &DateHierarchy) {
        let keep = self.selected
            .as_ref()
            .is_some_and(|key| hierarchy.contains(key));
        if !keep {
            self.selected = hierarchy.newest_day().cloned();
        }
        self.expand_selected();
    }

    fn expand_selected(&mut self) {
        if let Some(DateKey::Iso(day)) = &self.selected {
            self.expanded_year = Some(day.year);
            self.expanded_month = Some((day.year, day.month));
        }
    }
}
