//! Sub-grouping of one report's line items by a secondary key (box code,
//! container, batch...).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{is_filled, Item};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroupKey {
    Shared(String),
    /// Keyless item, addressed by its position in the flat list.
    Singleton(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: GroupKey,
    /// First filled value of each metadata field across the members.
    pub metadata: Map<String, Value>,
    pub items: Vec<Item>,
    /// `original_indexes[i]` is the flat-list position of `items[i]`.
    pub original_indexes: Vec<usize>,
}

impl Group {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            metadata: Map::new(),
            items: Vec::new(),
            original_indexes: Vec::new(),
        }
    }

    fn push(&mut self, index: usize, item: &Item, metadata_fields: &[String]) {
        for field in metadata_fields {
            if self.metadata.contains_key(field) {
                continue;
            }
            if let Some(value) = item.get(field).filter(|value| is_filled(Some(value))) {
                self.metadata.insert(field.clone(), value.clone());
            }
        }
        self.items.push(item.clone());
        self.original_indexes.push(index);
    }
}

/// Group `items` in order of first appearance of their key.
///
/// Items for which `key_fn` yields `None` each get their own singleton group,
/// so manual entries without a key never merge.
pub fn aggregate<F>(items: &[Item], metadata_fields: &[String], key_fn: F) -> Vec<Group>
where
    F: Fn(&Item) -> Option<String>,
{
    let mut groups: Vec<Group> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let key = key_fn(item)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let slot = match key {
            Some(key) => *positions.entry(key.clone()).or_insert_with(|| {
                groups.push(Group::new(GroupKey::Shared(key)));
                groups.len() - 1
            }),
            None => {
                groups.push(Group::new(GroupKey::Singleton(index)));
                groups.len() - 1
            }
        };
        groups[slot].push(index, item, metadata_fields);
    }

    groups
}

/// Configuration form of a grouping: key field plus metadata to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub key_field: String,
    #[serde(default)]
    pub metadata_fields: Vec<String>,
}

impl GroupSpec {
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            metadata_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_metadata<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn key_of(&self, item: &Item) -> Option<String> {
        match item.get(&self.key_field)? {
            Value::String(key) => Some(key.clone()),
            Value::Number(key) => Some(key.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn aggregate(&self, items: &[Item]) -> Vec<Group> {
        aggregate(items, &self.metadata_fields, |item| self.key_of(item))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture item must be an object, got {other}"),
        }
    }

    fn spec() -> GroupSpec {
        GroupSpec::new("boxCode").with_metadata(["boxName", "supplier"])
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let items = vec![
            item(json!({ "boxCode": "B2", "product": "milk" })),
            item(json!({ "boxCode": "A1", "product": "eggs" })),
            item(json!({ "boxCode": "B2", "product": "butter" })),
        ];
        let groups = spec().aggregate(&items);

        let keys: Vec<&GroupKey> = groups.iter().map(|group| &group.key).collect();
        assert_eq!(
            keys,
            vec![&GroupKey::Shared("B2".into()), &GroupKey::Shared("A1".into())]
        );
        assert_eq!(groups[0].original_indexes, vec![0, 2]);
        assert_eq!(groups[1].original_indexes, vec![1]);
    }

    #[test]
    fn test_metadata_takes_first_filled_value() {
        let items = vec![
            item(json!({ "boxCode": "B2", "boxName": "" })),
            item(json!({ "boxCode": "B2", "boxName": "Dairy", "supplier": null })),
            item(json!({ "boxCode": "B2", "boxName": "Other", "supplier": "Acme" })),
        ];
        let groups = spec().aggregate(&items);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].metadata.get("boxName"), Some(&json!("Dairy")));
        assert_eq!(groups[0].metadata.get("supplier"), Some(&json!("Acme")));
    }

    #[test]
    fn test_keyless_items_stay_separate() {
        let items = vec![
            item(json!({ "product": "manual 1" })),
            item(json!({ "boxCode": "  ", "product": "manual 2" })),
            item(json!({ "boxCode": 7, "product": "numeric" })),
        ];
        let groups = spec().aggregate(&items);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].key, GroupKey::Singleton(0));
        assert_eq!(groups[1].key, GroupKey::Singleton(1));
        assert_eq!(groups[2].key, GroupKey::Shared("7".into()));
    }

    #[test]
    fn test_closure_key_fn() {
        let items = vec![item(json!({ "code": "x-1" })), item(json!({ "code": "x-2" }))];
        let groups = aggregate(&items, &[], |item| {
            item.get("code")
                .and_then(Value::as_str)
                .and_then(|code| code.split('-').next())
                .map(str::to_string)
        });
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);
    }

    fn box_item() -> impl Strategy<Value = Item> {
        prop_oneof![
            "[A-C]".prop_map(|code| item(json!({ "boxCode": code }))),
            Just(item(json!({ "product": "manual" }))),
        ]
    }

    proptest! {
        #[test]
        fn property_group_sizes_sum_to_input(items in prop::collection::vec(box_item(), 0..30)) {
            let groups = spec().aggregate(&items);
            let total: usize = groups.iter().map(|group| group.items.len()).sum();
            prop_assert_eq!(total, items.len());

            for group in &groups {
                prop_assert_eq!(group.items.len(), group.original_indexes.len());
                for (member, index) in group.items.iter().zip(&group.original_indexes) {
                    prop_assert_eq!(member, &items[*index]);
                }
            }
            prop_assert_eq!(spec().aggregate(&items), groups);
        }
    }
}
