use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use daybook_core::{DateKey, ReportBackend, ReportBrowser};
use serde_json::{json, Map, Value};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the Year → Month → Day tree and the unparsed buckets
    Tree,
    /// Reports of one day (the newest day when omitted)
    Day(DayArgs),
    /// Line items of one report, grouped per the view
    Groups(RecordArgs),
    /// Set one field on one row and save the report
    SetField(SetFieldArgs),
    /// Remove one row and save the report
    DeleteRow(RowArgs),
    /// Delete a whole report; passes the same confirmation as edits
    Delete(RecordArgs),
    /// Create a report from a JSON payload object
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct DayArgs {
    /// `YYYY-MM-DD`, or the literal label of an unparsed bucket
    pub key: Option<String>,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    pub record_id: String,
}

#[derive(Debug, Args)]
pub struct RowArgs {
    pub record_id: String,
    pub row: usize,
}

#[derive(Debug, Args)]
pub struct SetFieldArgs {
    pub record_id: String,
    pub row: usize,
    pub key: String,
    /// JSON value; anything that is not valid JSON is stored as a string
    pub value: String,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub payload: String,
}

/// Run one command against a loaded browser and describe the result as JSON.
pub async fn execute<B: ReportBackend>(
    browser: &mut ReportBrowser<B>,
    command: Command,
    confirmation: Option<&str>,
) -> Result<Value> {
    match command {
        Command::Tree => Ok(json!({
            "hierarchy": browser.hierarchy(),
            "total_records": browser.hierarchy().total_records(),
            "selected": browser.selection().selected(),
        })),
        Command::Day(args) => {
            if let Some(label) = &args.key {
                browser.select_day(&DateKey::from_label(label))?;
            }
            Ok(json!({
                "day": browser.selection().selected(),
                "records": browser.selected_records(),
            }))
        }
        Command::Groups(args) => {
            browser.open_record(&args.record_id)?;
            Ok(json!({ "record_id": args.record_id, "groups": browser.groups() }))
        }
        Command::SetField(args) => {
            let value = parse_value(&args.value);
            edit_and_save(browser, &args.record_id, confirmation, |browser| {
                browser.update_field(args.row, &args.key, value)
            })
            .await
        }
        Command::DeleteRow(args) => {
            edit_and_save(browser, &args.record_id, confirmation, |browser| {
                browser.delete_row(args.row).map(|_| ())
            })
            .await
        }
        Command::Delete(args) => {
            browser
                .delete_record(&args.record_id, confirmation)
                .await
                .context("delete failed")?;
            Ok(json!({
                "deleted": args.record_id,
                "selected": browser.selection().selected(),
            }))
        }
        Command::Create(args) => {
            let payload = parse_payload(&args.payload)?;
            let created = browser
                .create_record(payload)
                .await
                .context("create failed")?;
            Ok(json!({ "created": created, "selected": browser.selection().selected() }))
        }
    }
}

async fn edit_and_save<B, F>(
    browser: &mut ReportBrowser<B>,
    record_id: &str,
    confirmation: Option<&str>,
    edit: F,
) -> Result<Value>
where
    B: ReportBackend,
    F: FnOnce(&mut ReportBrowser<B>) -> Result<(), daybook_core::Notice>,
{
    browser.open_record(record_id)?;
    browser.begin_edit(confirmation)?;
    edit(browser)?;
    browser.save().await.context("save failed")?;
    Ok(json!({
        "saved": record_id,
        "items": browser.visible_items(),
        "selected": browser.selection().selected(),
    }))
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_payload(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("payload is not valid JSON")? {
        Value::Object(payload) => Ok(payload),
        other => bail!("payload must be a JSON object, got {}", kind(&other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
