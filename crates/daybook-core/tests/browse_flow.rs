//! End-to-end browse/edit/save flows
//!
//! Drives `ReportBrowser` against the in-memory backend: initial selection,
//! draft round-trips, failed saves, deletes, and creates.

mod common;

use common::{item, report, MemoryBackend};
use daybook_core::{
    BackendError, DateKey, DraftState, ErrorCategory, GroupKey, GroupSpec, IsoDay, Record,
    RemediationRule, ReportBrowser, ViewConfig,
};
use serde_json::{json, Map};

fn iso(year: i32, month: u8, day: u8) -> DateKey {
    match IsoDay::new(year, month, day) {
        Some(day) => DateKey::Iso(day),
        None => panic!("invalid fixture day {year}-{month}-{day}"),
    }
}

fn view() -> ViewConfig {
    let mut view = ViewConfig::for_type("receiving");
    view.date_fields = vec!["reportDate".into(), "createdAt".into()];
    view.group = Some(GroupSpec::new("boxCode").with_metadata(["boxName"]));
    view.remediation = vec![RemediationRule::new("status", ["fail"], "correctiveAction")
        .with_message("Say what was done")];
    view
}

fn seeded() -> MemoryBackend {
    MemoryBackend::with_records(vec![
        report(
            "r1",
            "2025-06-01",
            vec![
                json!({ "boxCode": "B1", "boxName": "Dairy", "product": "milk", "status": "ok" }),
                json!({ "boxCode": "B2", "product": "fish", "status": "ok" }),
                json!({ "boxCode": "B1", "product": "cheese", "status": "ok" }),
            ],
        ),
        report("r2", "01/06/2025", vec![json!({ "product": "bread", "status": "ok" })]),
        report("r3", "sometime in june", vec![]),
        report("r4", "2025-05-20", vec![json!({ "product": "eggs", "status": "ok" })]),
    ])
}

async fn loaded() -> ReportBrowser<MemoryBackend> {
    let mut browser = ReportBrowser::new(seeded(), view());
    browser
        .load()
        .await
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));
    browser
}

#[tokio::test]
async fn test_initial_load_builds_tree_and_selects_newest_day() {
    let browser = loaded().await;
    let hierarchy = browser.hierarchy();

    assert_eq!(hierarchy.total_records(), 4);
    assert_eq!(hierarchy.tree[0].year, 2025);
    assert_eq!(hierarchy.tree[0].months[0].month, 6);
    assert_eq!(hierarchy.tree[0].months[0].days[0].count, 2);
    assert_eq!(hierarchy.unparsed.len(), 1);
    assert_eq!(hierarchy.unparsed[0].count, 1);

    assert_eq!(browser.selection().selected(), Some(&iso(2025, 6, 1)));
    assert_eq!(browser.selected_records().len(), 2);
}

#[tokio::test]
async fn test_failed_initial_load_surfaces_notice() {
    let backend = seeded();
    backend.fail_next(BackendError::network("GET /api/reports?type=receiving -> HTTP 502"));
    let mut browser = ReportBrowser::new(backend, view());

    let err = browser.load().await.err();
    assert_eq!(
        err.map(|notice| notice.category),
        Some(ErrorCategory::Network)
    );
    assert!(browser.notice().is_some_and(|notice| notice.retryable));
    assert!(browser.hierarchy().is_empty());

    browser.dismiss_notice();
    assert!(browser.notice().is_none());
}

#[tokio::test]
async fn test_open_record_groups_items_by_box() {
    let mut browser = loaded().await;
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));

    let groups = browser.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, GroupKey::Shared("B1".into()));
    assert_eq!(groups[0].original_indexes, vec![0, 2]);
    assert_eq!(groups[0].metadata.get("boxName"), Some(&json!("Dairy")));
    assert_eq!(groups[1].original_indexes, vec![1]);
}

#[tokio::test]
async fn test_save_round_trip_reflects_deleted_rows() {
    let mut browser = loaded().await;
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));

    // Edit through a group's original index, then drop a row.
    let cheese = browser.groups()[0].original_indexes[1];
    browser
        .update_field(cheese, "product", json!("brie"))
        .unwrap_or_else(|err| panic!("update should succeed: {err}"));
    browser
        .delete_row(1)
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
    let working = browser.visible_items().to_vec();
    assert_eq!(working.len(), 2);

    let lists_before = browser.backend().count_calls("list");
    browser
        .save()
        .await
        .unwrap_or_else(|err| panic!("save should succeed: {err}"));

    assert_eq!(browser.backend().count_calls("list"), lists_before + 1);
    assert_eq!(browser.drafts().state(), DraftState::ReadOnly);
    assert_eq!(browser.visible_items(), working.as_slice());
    let stored = browser
        .backend()
        .stored("r1")
        .map(|record| record.items("items"));
    assert_eq!(stored, Some(working));
    assert_eq!(browser.selection().selected(), Some(&iso(2025, 6, 1)));
}

#[tokio::test]
async fn test_failed_save_keeps_draft_editing() {
    let mut browser = loaded().await;
    browser
        .open_record("r4")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
    browser
        .append_row(item(json!({ "product": "flour", "status": "ok" })))
        .unwrap_or_else(|err| panic!("append should succeed: {err}"));

    browser
        .backend()
        .fail_next(BackendError::network("PATCH /api/reports?id=r4 -> HTTP 500"));
    let err = browser.save().await.err();

    assert_eq!(
        err.map(|notice| notice.category),
        Some(ErrorCategory::Network)
    );
    assert_eq!(browser.drafts().state(), DraftState::Editing);
    assert_eq!(browser.visible_items().len(), 2);
    let stored = browser.backend().stored("r4");
    assert_eq!(stored.map(|record| record.items("items").len()), Some(1));
    assert!(browser.drafts().last_error().is_some());
}

#[tokio::test]
async fn test_validation_blocks_save_before_any_request() {
    let mut browser = loaded().await;
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
    browser
        .update_field(0, "status", json!("FAIL"))
        .unwrap_or_else(|err| panic!("update should succeed: {err}"));

    let err = browser.save().await.err();
    assert_eq!(
        err.as_ref().map(|notice| notice.category),
        Some(ErrorCategory::Validation)
    );
    assert_eq!(
        err.map(|notice| notice.message),
        Some("Say what was done".to_string())
    );
    assert_eq!(browser.backend().count_calls("update"), 0);
    assert_eq!(browser.drafts().state(), DraftState::Editing);

    browser
        .update_field(0, "correctiveAction", json!("returned to supplier"))
        .unwrap_or_else(|err| panic!("update should succeed: {err}"));
    browser
        .save()
        .await
        .unwrap_or_else(|err| panic!("save should succeed: {err}"));
}

#[tokio::test]
async fn test_save_after_external_delete_is_a_conflict() {
    let mut browser = loaded().await;
    browser
        .open_record("r4")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
    browser.backend().remove_externally("r4");

    let err = browser.save().await.err();
    assert_eq!(
        err.map(|notice| notice.category),
        Some(ErrorCategory::Conflict)
    );
    assert_eq!(browser.drafts().state(), DraftState::Editing);
}

#[tokio::test]
async fn test_discard_then_reedit_restores_fetched_items() {
    let mut browser = loaded().await;
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    let fetched = browser.visible_items().to_vec();

    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
    browser
        .delete_row(0)
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
    browser
        .discard()
        .unwrap_or_else(|err| panic!("discard should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should restart: {err}"));

    assert_eq!(browser.visible_items(), fetched.as_slice());
}

#[tokio::test]
async fn test_edit_phrase_is_checked() {
    let mut view = view();
    view.edit_phrase = Some("2468".into());
    let mut browser = ReportBrowser::new(seeded(), view);
    browser
        .load()
        .await
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));

    assert!(browser.begin_edit(Some("1357")).is_err());
    assert_eq!(browser.drafts().state(), DraftState::ReadOnly);
    browser
        .begin_edit(Some("2468"))
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
}

#[tokio::test]
async fn test_delete_moves_selection_to_newest_remaining_day() {
    let mut browser = loaded().await;
    browser
        .open_record("r4")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    assert_eq!(browser.selection().selected(), Some(&iso(2025, 5, 20)));

    browser
        .delete_record("r4", None)
        .await
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
    assert_eq!(browser.selection().selected(), Some(&iso(2025, 6, 1)));
    assert_eq!(browser.open_record_id(), None);

    for id in ["r1", "r2", "r3"] {
        browser
            .delete_record(id, None)
            .await
            .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
    }
    assert_eq!(browser.selection().selected(), None);
    assert!(browser.hierarchy().is_empty());
}

#[tokio::test]
async fn test_delete_keeps_selection_when_day_survives() {
    let mut browser = loaded().await;
    browser
        .delete_record("r2", None)
        .await
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
    assert_eq!(browser.selection().selected(), Some(&iso(2025, 6, 1)));
    assert_eq!(browser.selected_records().len(), 1);
}

#[tokio::test]
async fn test_create_selects_new_day() {
    let mut browser = loaded().await;
    let mut payload = Map::new();
    payload.insert("reportDate".into(), json!("2025-07-04"));

    let created = browser
        .create_record(payload)
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));
    assert!(created.is_some());
    assert_eq!(browser.selection().selected(), Some(&iso(2025, 7, 4)));
    assert_eq!(browser.hierarchy().total_records(), 5);
}

#[tokio::test]
async fn test_refresh_while_editing_keeps_draft() {
    let mut browser = loaded().await;
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
    browser
        .delete_row(0)
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));

    browser
        .refresh()
        .await
        .unwrap_or_else(|err| panic!("refresh should succeed: {err}"));
    assert_eq!(browser.drafts().state(), DraftState::Editing);
    assert_eq!(browser.visible_items().len(), 2);
}

#[tokio::test]
async fn test_select_unknown_day_reports_notice() {
    let mut browser = loaded().await;
    assert!(browser.select_day(&iso(1999, 1, 1)).is_err());
    assert!(browser.notice().is_some());
    browser
        .select_day(&DateKey::raw("sometime in june"))
        .unwrap_or_else(|err| panic!("raw day should be selectable: {err}"));
    assert_eq!(browser.selected_records().len(), 1);
}

#[tokio::test]
async fn test_delete_requires_edit_phrase() {
    let mut view = view();
    view.edit_phrase = Some("2468".into());
    let mut browser = ReportBrowser::new(seeded(), view);
    browser
        .load()
        .await
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));

    let rejected = browser.delete_record("r1", None).await.err();
    assert_eq!(
        rejected.map(|notice| notice.code),
        Some("STATE_CONFIRMATION_REJECTED".to_string())
    );
    assert!(browser.delete_record("r1", Some("1357")).await.is_err());
    assert_eq!(browser.backend().count_calls("delete"), 0);
    assert!(browser.backend().stored("r1").is_some());

    browser
        .delete_record("r1", Some("2468"))
        .await
        .unwrap_or_else(|err| panic!("confirmed delete should succeed: {err}"));
    assert!(browser.backend().stored("r1").is_none());
    assert_eq!(browser.hierarchy().total_records(), 3);
}

fn legacy_report(id: &str) -> Record {
    let mut payload = Map::new();
    payload.insert("reportDate".into(), json!("2025-06-02"));
    payload.insert("items".into(), json!(["legacy note", { "product": "milk" }]));
    Record::new(Some(id.into()), "receiving", payload)
}

#[tokio::test]
async fn test_report_with_non_object_items_is_not_editable() {
    let backend = seeded();
    backend.put_externally(legacy_report("r5"));
    let mut browser = ReportBrowser::new(backend, view());
    browser
        .load()
        .await
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));

    browser
        .open_record("r5")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    assert_eq!(browser.visible_items().len(), 1);

    let err = browser.begin_edit(None).err();
    assert_eq!(
        err.map(|notice| notice.category),
        Some(ErrorCategory::State)
    );
    assert_eq!(browser.drafts().state(), DraftState::ReadOnly);
    assert!(browser.update_field(0, "qty", json!(2)).is_err());
    assert!(browser.save().await.is_err());

    assert_eq!(browser.backend().count_calls("update"), 0);
    let stored = browser.backend().stored("r5").map(|record| record.payload);
    assert_eq!(
        stored.and_then(|payload| payload.get("items").cloned()),
        Some(json!(["legacy note", { "product": "milk" }]))
    );
}

#[tokio::test]
async fn test_save_refuses_to_overwrite_non_object_items() {
    let mut browser = loaded().await;
    browser
        .open_record("r1")
        .unwrap_or_else(|err| panic!("open should succeed: {err}"));
    browser
        .begin_edit(None)
        .unwrap_or_else(|err| panic!("edit should start: {err}"));
    browser
        .update_field(0, "qty", json!(2))
        .unwrap_or_else(|err| panic!("update should succeed: {err}"));

    browser.backend().put_externally(legacy_report("r1"));
    browser
        .refresh()
        .await
        .unwrap_or_else(|err| panic!("refresh should succeed: {err}"));

    assert!(browser.save().await.is_err());
    assert_eq!(browser.drafts().state(), DraftState::Editing);
    assert_eq!(browser.backend().count_calls("update"), 0);
    let stored = browser.backend().stored("r1").map(|record| record.payload);
    assert_eq!(
        stored.and_then(|payload| payload.get("items").cloned()),
        Some(json!(["legacy note", { "product": "milk" }]))
    );
}
