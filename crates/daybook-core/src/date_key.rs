//! Canonical day keys for heterogeneous date values.
//!
//! Backends store report dates as ISO strings, day-first strings, RFC
//! timestamps, epoch numbers, or only implicitly through a Mongo-style object
//! id. Everything resolves to a [`DateKey`]: a calendar day when some format
//! matches, or the literal text in a RAW bucket when nothing does.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::record::Record;

/// RAW label for records that carry no date value at all.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Epoch values at or above this are read as milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// A calendar day. Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IsoDay {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl IsoDay {
    /// Build a day after checking it exists on the calendar.
    #[must_use]
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        let month_enum = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month_enum, day).ok()?;
        Some(Self { year, month, day })
    }

    fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
            day: date.day(),
        }
    }
}

impl fmt::Display for IsoDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Sortable day bucket key.
///
/// The derived ordering (ISO before RAW, each ascending) is only used for map
/// storage. Display order comes from [`sort_day_keys`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateKey {
    Iso(IsoDay),
    Raw(String),
}

impl DateKey {
    #[must_use]
    pub fn raw(label: impl Into<String>) -> Self {
        Self::Raw(label.into())
    }

    #[must_use]
    pub fn is_iso(&self) -> bool {
        matches!(self, Self::Iso(_))
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Iso(day) => day.to_string(),
            Self::Raw(label) => label.clone(),
        }
    }

    /// Inverse of [`DateKey::label`]: a strict `YYYY-MM-DD` label is ISO,
    /// anything else names a RAW bucket.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match parse_year_first(label.trim()) {
            Some(day) if label.trim().len() == 10 => Self::Iso(day),
            _ => Self::Raw(label.to_string()),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iso(day) => write!(f, "{day}"),
            Self::Raw(label) => write!(f, "{label}"),
        }
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            kind: &'a str,
            value: String,
        }
        let kind = if self.is_iso() { "iso" } else { "raw" };
        Wire {
            kind,
            value: self.label(),
        }
        .serialize(serializer)
    }
}

/// Where RAW buckets go relative to calendar days. Views differ on this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawPlacement {
    First,
    #[default]
    Last,
}

/// Display ordering: newest day first, RAW labels descending among themselves,
/// RAW as a block before or after the calendar days.
#[must_use]
pub fn compare_for_display(a: &DateKey, b: &DateKey, placement: RawPlacement) -> Ordering {
    match (a, b) {
        (DateKey::Iso(a), DateKey::Iso(b)) => b.cmp(a),
        (DateKey::Raw(a), DateKey::Raw(b)) => b.cmp(a),
        (DateKey::Iso(_), DateKey::Raw(_)) => match placement {
            RawPlacement::Last => Ordering::Less,
            RawPlacement::First => Ordering::Greater,
        },
        (DateKey::Raw(_), DateKey::Iso(_)) => match placement {
            RawPlacement::Last => Ordering::Greater,
            RawPlacement::First => Ordering::Less,
        },
    }
}

pub fn sort_day_keys(keys: &mut [DateKey], placement: RawPlacement) {
    keys.sort_by(|a, b| compare_for_display(a, b, placement));
}

/// Resolve a single raw value into a day key.
#[must_use]
pub fn parse_date_value(value: Option<&Value>) -> DateKey {
    match value {
        None | Some(Value::Null) => DateKey::raw(UNKNOWN_LABEL),
        Some(value) => match parse_iso_day(value) {
            Some(day) => DateKey::Iso(day),
            None => DateKey::Raw(raw_label(value)),
        },
    }
}

/// Try every known representation, in order, without falling back to RAW.
#[must_use]
pub fn parse_iso_day(value: &Value) -> Option<IsoDay> {
    match value {
        Value::String(text) => parse_date_str(text),
        Value::Number(number) => number.as_f64().and_then(from_epoch),
        // Extended JSON: { "$date": "..." } or { "$date": { "$numberLong": "..." } }
        Value::Object(object) => match object.get("$date") {
            Some(Value::Object(inner)) => inner.get("$numberLong").and_then(parse_iso_day),
            Some(inner) => parse_iso_day(inner),
            None => None,
        },
        _ => None,
    }
}

/// String parse chain: offset timestamps, year-first, day-first, generic
/// timestamps, object id, numeric epoch.
#[must_use]
pub fn parse_date_str(text: &str) -> Option<IsoDay> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_offset_timestamp(text)
        .or_else(|| parse_year_first(text))
        .or_else(|| parse_day_first(text))
        .or_else(|| parse_generic(text))
        .or_else(|| parse_object_id(text))
        .or_else(|| parse_numeric(text))
}

fn raw_label(value: &Value) -> String {
    match value {
        Value::String(text) if text.trim().is_empty() => UNKNOWN_LABEL.to_string(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

fn year_first_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:$|[T\s])").ok())
        .as_ref()
}

fn day_first_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4}|\d{2})(?:$|\s)").ok())
        .as_ref()
}

fn object_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9a-fA-F]{24}$").ok())
        .as_ref()
}

fn numeric_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^-?\d+(?:\.\d+)?$").ok())
        .as_ref()
}

/// RFC 3339 with an explicit offset, also with a space in place of the `T`.
/// The day is taken after converting to UTC.
fn parse_offset_timestamp(text: &str) -> Option<IsoDay> {
    if let Ok(moment) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(utc_day(moment));
    }
    if text.as_bytes().get(10) != Some(&b' ') {
        return None;
    }
    let (date, time) = (text.get(..10)?, text.get(11..)?);
    OffsetDateTime::parse(&format!("{date}T{time}"), &Rfc3339)
        .ok()
        .map(utc_day)
}

/// `YYYY-MM-DD` / `YYYY/MM/DD`, optionally followed by a time part without
/// an offset, which is read as UTC.
fn parse_year_first(text: &str) -> Option<IsoDay> {
    let caps = year_first_pattern()?.captures(text)?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u8>().ok()?;
    let day = caps.get(3)?.as_str().parse::<u8>().ok()?;
    IsoDay::new(year, month, day)
}

/// `DD/MM/YYYY` / `DD-MM-YYYY`; two-digit years land in 20xx.
fn parse_day_first(text: &str) -> Option<IsoDay> {
    let caps = day_first_pattern()?.captures(text)?;
    let day = caps.get(1)?.as_str().parse::<u8>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u8>().ok()?;
    let year_text = caps.get(3)?.as_str();
    let mut year = year_text.parse::<i32>().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    IsoDay::new(year, month, day)
}

fn parse_generic(text: &str) -> Option<IsoDay> {
    if let Ok(moment) = OffsetDateTime::parse(text, &Rfc2822) {
        return Some(utc_day(moment));
    }
    const LONG_FORMS: [&str; 4] = [
        "[month repr:long case_sensitive:false] [day padding:none], [year]",
        "[month repr:short case_sensitive:false] [day padding:none], [year]",
        "[day padding:none] [month repr:long case_sensitive:false] [year]",
        "[day padding:none] [month repr:short case_sensitive:false] [year]",
    ];
    LONG_FORMS.iter().find_map(|form| {
        let description = time::format_description::parse(form).ok()?;
        Date::parse(text, &description).ok().map(IsoDay::from_date)
    })
}

/// The leading 4 bytes of an object id are its creation time in seconds.
fn parse_object_id(text: &str) -> Option<IsoDay> {
    if !object_id_pattern()?.is_match(text) {
        return None;
    }
    let seconds = u32::from_str_radix(text.get(..8)?, 16).ok()?;
    let moment = OffsetDateTime::from_unix_timestamp(i64::from(seconds)).ok()?;
    Some(utc_day(moment))
}

fn parse_numeric(text: &str) -> Option<IsoDay> {
    if !numeric_pattern()?.is_match(text) {
        return None;
    }
    from_epoch(text.parse::<f64>().ok()?)
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch(value: f64) -> Option<IsoDay> {
    if !value.is_finite() {
        return None;
    }
    let seconds = if value.abs() >= EPOCH_MILLIS_THRESHOLD { value / 1000.0 } else { value };
    let moment = OffsetDateTime::from_unix_timestamp(seconds.floor() as i64).ok()?;
    Some(utc_day(moment))
}

fn utc_day(moment: OffsetDateTime) -> IsoDay {
    IsoDay::from_date(moment.to_offset(UtcOffset::UTC).date())
}

/// Candidate date fields for a view, highest priority first.
///
/// Names resolve against the payload, except `createdAt` and `id` which read
/// the record's own fields when the payload has no such key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSource {
    pub fields: Vec<String>,
}

impl Default for DateSource {
    fn default() -> Self {
        Self {
            fields: vec![
                "reportDate".to_string(),
                "date".to_string(),
                "createdAt".to_string(),
                "id".to_string(),
            ],
        }
    }
}

impl DateSource {
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// First candidate that parses wins; otherwise the first present value
    /// becomes the RAW label.
    #[must_use]
    pub fn key_for(&self, record: &Record) -> DateKey {
        let mut first_present: Option<Value> = None;
        for field in &self.fields {
            let Some(value) = resolve_field(record, field) else {
                continue;
            };
            if let Some(day) = parse_iso_day(&value) {
                return DateKey::Iso(day);
            }
            if first_present.is_none() {
                first_present = Some(value);
            }
        }
        parse_date_value(first_present.as_ref())
    }
}

fn resolve_field(record: &Record, field: &str) -> Option<Value> {
    if let Some(value) = record.payload.get(field).filter(|value| !is_blank(value)) {
        return Some(value.clone());
    }
    match field {
        "createdAt" => record.created_at.clone().filter(|value| !is_blank(value)),
        "id" => record.id.clone().map(Value::String),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
