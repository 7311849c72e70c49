//! Year → Month → Day navigation tree over a flat record list.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::date_key::{sort_day_keys, DateKey, DateSource, RawPlacement};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayNode {
    pub day: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthNode {
    pub month: u8,
    pub days: Vec<DayNode>,
}

impl MonthNode {
    #[must_use]
    pub fn count(&self) -> usize {
        self.days.iter().map(|day| day.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearNode {
    pub year: i32,
    pub months: Vec<MonthNode>,
}

impl YearNode {
    #[must_use]
    pub fn count(&self) -> usize {
        self.months.iter().map(MonthNode::count).sum()
    }
}

/// A bucket of records whose date could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawDayNode {
    pub label: String,
    pub count: usize,
}

/// Derived, immutable view of one record list. Rebuild on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateHierarchy {
    /// Years, months and days all newest first.
    pub tree: Vec<YearNode>,
    /// RAW buckets, ordered like their keys in `flat_day_keys`.
    pub unparsed: Vec<RawDayNode>,
    pub flat_day_keys: Vec<DateKey>,
    #[serde(skip)]
    day_index: BTreeMap<DateKey, Vec<Record>>,
}

impl DateHierarchy {
    /// Bucket `records` by the key `key_fn` assigns them. Never drops a record:
    /// anything without a usable date lands in a RAW bucket.
    pub fn build<F>(records: &[Record], placement: RawPlacement, mut key_fn: F) -> Self
    where
        F: FnMut(&Record) -> DateKey,
    {
        let mut day_index: BTreeMap<DateKey, Vec<Record>> = BTreeMap::new();
        for record in records {
            day_index
                .entry(key_fn(record))
                .or_default()
                .push(record.clone());
        }

        // BTreeMap iteration is ascending; reversing gives newest first at
        // every level.
        let mut years: BTreeMap<i32, BTreeMap<u8, BTreeMap<u8, usize>>> = BTreeMap::new();
        for (key, bucket) in &day_index {
            if let DateKey::Iso(day) = key {
                *years
                    .entry(day.year)
                    .or_default()
                    .entry(day.month)
                    .or_default()
                    .entry(day.day)
                    .or_default() += bucket.len();
            }
        }
        let tree = years
            .into_iter()
            .rev()
            .map(|(year, months)| YearNode {
                year,
                months: months
                    .into_iter()
                    .rev()
                    .map(|(month, days)| MonthNode {
                        month,
                        days: days
                            .into_iter()
                            .rev()
                            .map(|(day, count)| DayNode { day, count })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let mut flat_day_keys: Vec<DateKey> = day_index.keys().cloned().collect();
        sort_day_keys(&mut flat_day_keys, placement);

        let unparsed = flat_day_keys
            .iter()
            .filter_map(|key| match key {
                DateKey::Raw(label) => Some(RawDayNode {
                    label: label.clone(),
                    count: day_index.get(key).map_or(0, Vec::len),
                }),
                DateKey::Iso(_) => None,
            })
            .collect();

        tracing::debug!(
            records = records.len(),
            days = flat_day_keys.len(),
            "rebuilt date hierarchy"
        );

        Self {
            tree,
            unparsed,
            flat_day_keys,
            day_index,
        }
    }

    /// Build using a view's candidate date fields.
    #[must_use]
    pub fn from_source(records: &[Record], source: &DateSource, placement: RawPlacement) -> Self {
        Self::build(records, placement, |record| source.key_for(record))
    }

    #[must_use]
    pub fn records_for(&self, key: &DateKey) -> &[Record] {
        self.day_index.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, key: &DateKey) -> bool {
        self.day_index.contains_key(key)
    }

    #[must_use]
    pub fn day_count(&self, key: &DateKey) -> usize {
        self.records_for(key).len()
    }

    /// Newest calendar day, else the first RAW bucket in display order.
    #[must_use]
    pub fn newest_day(&self) -> Option<&DateKey> {
        self.flat_day_keys
            .iter()
            .find(|key| key.is_iso())
            .or_else(|| self.flat_day_keys.first())
    }

    #[must_use]
    pub fn total_records(&self) -> usize {
        self.tree.iter().map(YearNode::count).sum::<usize>()
            + self.unparsed.iter().map(|raw| raw.count).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flat_day_keys.is_empty()
    }

    /// Day key that holds the record with `id`, if any.
    #[must_use]
    pub fn day_of_record(&self, id: &str) -> Option<&DateKey> {
        self.day_index
            .iter()
            .find(|(_, bucket)| bucket.iter().any(|record| record.id_str() == Some(id)))
            .map(|(key, _)| key)
    }
}
