use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Record;

/// A value list exactly as it appears in a response body.
///
/// Every field named in `fields` shares the same `items` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawValueList {
    /// Names of the record fields this list describes.
    #[serde(default)]
    fields: Vec<String>,

    /// The coded ids and their descriptions.
    #[serde(default)]
    items: Vec<RawValueListItem>,
}

/// A single `id => description` entry of a [`RawValueList`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawValueListItem {
    id: Value,
    description: String,
}

/// Lookup table from field name to coded id to description.
///
/// Ids are keyed by their string rendering, so `3` and `"3"` resolve to the
/// same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueLists {
    fields: HashMap<String, HashMap<String, String>>,
}

/// Renders a coded id as a table key. Only scalars can be ids.
fn id_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl ValueLists {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from the `value_lists` array of a response body.
    pub fn from_wire(lists: &[RawValueList]) -> Self {
        let mut table = Self::new();
        for list in lists {
            let items: HashMap<String, String> = list
                .items
                .iter()
                .filter_map(|item| id_key(&item.id).map(|k| (k, item.description.clone())))
                .collect();
            for field in &list.fields {
                table
                    .fields
                    .entry(field.clone())
                    .or_default()
                    .extend(items.clone());
            }
        }
        table
    }

    /// Adds a single entry to the table.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        id: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.fields
            .entry(field.into())
            .or_default()
            .insert(id.into(), description.into());
    }

    /// Merges `other` into this table. Entries from `other` win on conflict.
    pub fn merge(&mut self, other: ValueLists) {
        for (field, items) in other.fields {
            self.fields.entry(field).or_default().extend(items);
        }
    }

    /// Returns the description for `id` in `field`'s list (if any).
    pub fn get(&self, field: &str, id: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|items| items.get(id))
            .map(String::as_str)
    }

    /// Returns the id table for `field` (if any).
    pub fn field(&self, field: &str) -> Option<&HashMap<String, String>> {
        self.fields.get(field)
    }

    /// Returns an iterator over the field names that have a list.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns true if no field has a list.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields that have a list.
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Replaces coded values in `records` with their descriptions from `value_lists`.
///
/// Only scalar values whose id is present in the field's list are replaced;
/// nulls, arrays, objects and unknown ids are left as they are.
///
/// Returns how many values were substituted.
pub fn apply_value_lists(records: &mut [Record], value_lists: &ValueLists) -> usize {
    let mut substituted = 0;
    for record in records.iter_mut() {
        for (field, items) in &value_lists.fields {
            let Some(value) = record.get_mut(field) else {
                continue;
            };
            let Some(description) = id_key(value).and_then(|k| items.get(&k)) else {
                continue;
            };
            *value = Value::String(description.clone());
            substituted += 1;
        }
    }
    log::debug!("substituted {substituted} coded values");
    substituted
}

#[cfg(feature = "display")]
impl std::fmt::Display for ValueLists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<_> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, items) in fields {
            writeln!(f, "{field}:")?;
            let mut items: Vec<_> = items.iter().collect();
            items.sort();
            for (id, description) in items {
                writeln!(f, "  {id} => {description}")?;
            }
        }
        Ok(())
    }
}
